//! In-memory `ExpenseApi` for controller and dispatcher tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::{
    domain::{Amount, ExpenseId, ExpenseRecord, UserIdentity},
    protocol::NewExpenseRequest,
};
use tokio::sync::oneshot;

use crate::{
    controller::ExpenseController,
    gateway::{ExpenseApi, GatewayError},
    requests::Operation,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApiCall {
    FetchAll,
    Create(ExpenseId, String, Amount, String),
    UpdateAmount(ExpenseId, Amount),
    Delete(ExpenseId),
}

struct Gate {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Handle for a request held open by [`FakeExpenseApi::hold_next`].
pub(crate) struct HeldRequest {
    pub started: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

#[derive(Default)]
pub(crate) struct FakeExpenseApi {
    records: Mutex<Vec<ExpenseRecord>>,
    calls: Mutex<Vec<ApiCall>>,
    failures: Mutex<HashMap<Operation, Option<String>>>,
    gates: Mutex<HashMap<Operation, VecDeque<Gate>>>,
    omit_owner_on_create: Mutex<bool>,
}

impl FakeExpenseApi {
    pub fn with_records(records: Vec<ExpenseRecord>) -> Arc<Self> {
        let api = Self::default();
        *api.records.lock().expect("records lock") = records;
        Arc::new(api)
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next calls of `operation` fail with a server status error.
    pub fn fail(&self, operation: Operation, server_message: Option<&str>) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(operation, server_message.map(str::to_string));
    }

    pub fn omit_owner_on_create(&self) {
        *self.omit_owner_on_create.lock().expect("owner lock") = true;
    }

    /// Holds the next call of `operation` open until the returned sender fires.
    pub fn hold_next(&self, operation: Operation) -> HeldRequest {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates
            .lock()
            .expect("gates lock")
            .entry(operation)
            .or_default()
            .push_back(Gate {
                started: started_tx,
                release: release_rx,
            });
        HeldRequest {
            started: started_rx,
            release: release_tx,
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    async fn enter(&self, operation: Operation, call: ApiCall) -> Result<(), GatewayError> {
        self.calls.lock().expect("calls lock").push(call);
        let gate = self
            .gates
            .lock()
            .expect("gates lock")
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.started.send(());
            let _ = gate.release.await;
        }
        match self.failures.lock().expect("failures lock").get(&operation) {
            Some(message) => Err(GatewayError::Status {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExpenseApi for FakeExpenseApi {
    async fn fetch_all(&self, _user: &UserIdentity) -> Result<Vec<ExpenseRecord>, GatewayError> {
        self.enter(Operation::FetchAll, ApiCall::FetchAll).await?;
        Ok(self.records.lock().expect("records lock").clone())
    }

    async fn create(&self, expense: &NewExpenseRequest) -> Result<ExpenseRecord, GatewayError> {
        self.enter(
            Operation::Create,
            ApiCall::Create(
                expense.id.clone(),
                expense.title.clone(),
                expense.amount,
                expense.category.clone(),
            ),
        )
        .await?;
        let omit_owner = *self.omit_owner_on_create.lock().expect("owner lock");
        let record = ExpenseRecord {
            id: expense.id.clone(),
            title: expense.title.clone(),
            amount: expense.amount,
            category: expense.category.clone(),
            owner_id: (!omit_owner).then(|| expense.user_id.clone()),
        };
        self.records
            .lock()
            .expect("records lock")
            .push(record.clone());
        Ok(record)
    }

    async fn update_amount(
        &self,
        _user: &UserIdentity,
        id: &ExpenseId,
        value: Amount,
    ) -> Result<Amount, GatewayError> {
        self.enter(Operation::UpdateAmount, ApiCall::UpdateAmount(id.clone(), value))
            .await?;
        Ok(value)
    }

    async fn delete(&self, _user: &UserIdentity, id: &ExpenseId) -> Result<(), GatewayError> {
        self.enter(Operation::Delete, ApiCall::Delete(id.clone()))
            .await?;
        self.records
            .lock()
            .expect("records lock")
            .retain(|record| &record.id != id);
        Ok(())
    }
}

pub(crate) fn test_user() -> UserIdentity {
    UserIdentity::new("user_1700000000000_7")
}

pub(crate) fn record(id: i64, title: &str, amount: f64, category: &str) -> ExpenseRecord {
    ExpenseRecord {
        id: ExpenseId::from(id),
        title: title.to_string(),
        amount: Amount(amount),
        category: category.to_string(),
        owner_id: None,
    }
}

pub(crate) async fn mounted_controller(api: Arc<FakeExpenseApi>) -> Arc<ExpenseController> {
    let controller = ExpenseController::new(api, test_user());
    controller.mount().await.expect("initial load");
    controller
}
