use std::sync::Arc;

use chrono::Utc;
use shared::{
    domain::{Amount, ExpenseId, ExpenseRecord, UserIdentity},
    protocol::NewExpenseRequest,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info};

use crate::{
    error::{
        ControllerError, ALERT_INVALID_ADD, ALERT_INVALID_ID, ALERT_INVALID_UPDATE,
        ALERT_UNKNOWN_SERVER_ERROR, BANNER_ADD_FAILED, BANNER_ASSISTANT_FAILED,
        BANNER_LOAD_FAILED,
    },
    gateway::{ExpenseApi, GatewayError},
    requests::{Operation, PendingRequest},
    store::{ExpenseStore, ExpenseView},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    StateChanged,
    /// Blocking, user-visible message for a single failed operation.
    Alert(String),
    ErrorBanner(String),
}

/// Owns the expense state and routes UI and assistant operations through
/// the gateway. The store lock is never held across a gateway call.
pub struct ExpenseController {
    api: Arc<dyn ExpenseApi>,
    user: UserIdentity,
    inner: Mutex<ExpenseStore>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ExpenseController {
    pub fn new(api: Arc<dyn ExpenseApi>, user: UserIdentity) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            inner: Mutex::new(ExpenseStore::new(user.clone())),
            user,
            events,
        })
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn view(&self) -> ExpenseView {
        self.inner.lock().await.view()
    }

    pub async fn selected(&self) -> Option<ExpenseId> {
        self.inner.lock().await.selected().cloned()
    }

    pub async fn records(&self) -> Vec<ExpenseRecord> {
        self.inner.lock().await.records().to_vec()
    }

    pub async fn categories(&self) -> Vec<String> {
        self.inner.lock().await.categories().to_vec()
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }

    /// The returned guard releases the request even if the caller's future
    /// is dropped mid-flight.
    async fn begin(&self, operation: Operation) -> PendingRequest {
        let request = self.inner.lock().await.requests.begin(operation);
        self.emit(ControllerEvent::StateChanged);
        request
    }

    fn reject(&self, message: &'static str) -> ControllerError {
        self.emit(ControllerEvent::Alert(message.to_string()));
        ControllerError::Validation(message)
    }

    /// Marks the view mounted and performs the initial load.
    pub async fn mount(&self) -> Result<(), ControllerError> {
        self.inner.lock().await.set_mounted(true);
        self.load().await
    }

    /// Later completions stop writing state; in-flight calls still run.
    pub async fn unmount(&self) {
        self.inner.lock().await.set_mounted(false);
    }

    pub async fn load(&self) -> Result<(), ControllerError> {
        let request = self.begin(Operation::FetchAll).await;
        let outcome = self.api.fetch_all(&self.user).await;

        let mut store = self.inner.lock().await;
        let _ = request.finish();
        let mounted = store.is_mounted();
        match outcome {
            Ok(records) => {
                if mounted {
                    store.replace_records(records);
                    info!(count = store.records().len(), "expenses loaded");
                } else {
                    debug!("discarding expense list fetched after unmount");
                }
                drop(store);
                self.emit(ControllerEvent::StateChanged);
                Ok(())
            }
            Err(err) => {
                error!(user_id = %self.user, "failed to load expenses: {err}");
                if mounted {
                    store.set_error_banner(BANNER_LOAD_FAILED);
                }
                drop(store);
                self.emit(ControllerEvent::StateChanged);
                if mounted {
                    self.emit(ControllerEvent::ErrorBanner(BANNER_LOAD_FAILED.to_string()));
                }
                Err(ControllerError::Gateway {
                    notice: BANNER_LOAD_FAILED.to_string(),
                    source: err,
                })
            }
        }
    }

    pub async fn add_expense(
        &self,
        title: &str,
        amount: Option<Amount>,
        category: &str,
    ) -> Result<ExpenseRecord, ControllerError> {
        let amount = match amount {
            Some(amount) if amount.is_truthy() && !title.trim().is_empty() => amount,
            _ => return Err(self.reject(ALERT_INVALID_ADD)),
        };

        let new_expense = NewExpenseRequest {
            id: ExpenseId::from_timestamp(Utc::now()),
            title: title.to_string(),
            amount,
            category: category.to_string(),
            user_id: self.user.clone(),
        };

        let request = self.begin(Operation::Create).await;
        let outcome = self.api.create(&new_expense).await;

        let mut store = self.inner.lock().await;
        let _ = request.finish();
        let mounted = store.is_mounted();
        match outcome {
            Ok(created) => {
                if mounted {
                    if store.append_record(created.clone()).is_some() {
                        info!(expense_id = %created.id, "expense added");
                    }
                } else {
                    debug!(expense_id = %created.id, "discarding created expense after unmount");
                }
                drop(store);
                self.emit(ControllerEvent::StateChanged);
                Ok(created)
            }
            Err(err) => {
                error!(expense_id = %new_expense.id, "failed to add expense: {err}");
                if mounted {
                    store.set_error_banner(BANNER_ADD_FAILED);
                }
                drop(store);
                self.emit(ControllerEvent::StateChanged);
                if mounted {
                    self.emit(ControllerEvent::ErrorBanner(BANNER_ADD_FAILED.to_string()));
                }
                Err(ControllerError::Gateway {
                    notice: BANNER_ADD_FAILED.to_string(),
                    source: err,
                })
            }
        }
    }

    pub async fn update_amount(
        &self,
        id: Option<ExpenseId>,
        value: Option<Amount>,
    ) -> Result<(), ControllerError> {
        let (id, value) = match (id, value) {
            (Some(id), Some(value)) if id.is_valid() && value.is_truthy() => (id, value),
            _ => return Err(self.reject(ALERT_INVALID_UPDATE)),
        };

        let request = self.begin(Operation::UpdateAmount).await;
        let outcome = self.api.update_amount(&self.user, &id, value).await;

        let mut store = self.inner.lock().await;
        let _ = request.finish();
        let mounted = store.is_mounted();
        match outcome {
            Ok(amount) => {
                if mounted {
                    store.set_amount(&id, amount);
                    info!(expense_id = %id, %amount, "expense amount updated");
                }
                drop(store);
                self.emit(ControllerEvent::StateChanged);
                Ok(())
            }
            Err(err) => {
                drop(store);
                Err(self.fail_with_alert("Ошибка обновления суммы", mounted, err))
            }
        }
    }

    pub async fn delete_expense(&self, id: Option<ExpenseId>) -> Result<(), ControllerError> {
        let Some(id) = id.filter(ExpenseId::is_valid) else {
            return Err(self.reject(ALERT_INVALID_ID));
        };

        let request = self.begin(Operation::Delete).await;
        let outcome = self.api.delete(&self.user, &id).await;

        let mut store = self.inner.lock().await;
        let _ = request.finish();
        let mounted = store.is_mounted();
        match outcome {
            Ok(()) => {
                if mounted {
                    store.remove_record(&id);
                    info!(expense_id = %id, "expense deleted");
                }
                drop(store);
                self.emit(ControllerEvent::StateChanged);
                Ok(())
            }
            Err(err) => {
                drop(store);
                Err(self.fail_with_alert("Ошибка удаления", mounted, err))
            }
        }
    }

    fn fail_with_alert(&self, prefix: &str, mounted: bool, err: GatewayError) -> ControllerError {
        error!("{prefix}: {err}");
        let notice = format!(
            "{prefix}: {}",
            err.server_message().unwrap_or(ALERT_UNKNOWN_SERVER_ERROR)
        );
        self.emit(ControllerEvent::StateChanged);
        if mounted {
            self.emit(ControllerEvent::Alert(notice.clone()));
        }
        ControllerError::Gateway {
            notice,
            source: err,
        }
    }

    pub async fn select_expense(&self, id: Option<ExpenseId>) {
        self.inner.lock().await.select(id);
        self.emit(ControllerEvent::StateChanged);
    }

    pub async fn add_category(&self, category: &str) -> bool {
        let added = self.inner.lock().await.add_category(category);
        if added {
            self.emit(ControllerEvent::StateChanged);
        }
        added
    }

    pub async fn dismiss_error(&self) {
        self.inner.lock().await.dismiss_error();
        self.emit(ControllerEvent::StateChanged);
    }

    pub async fn report_assistant_error(&self, reason: &str) {
        error!("assistant runtime error: {reason}");
        let mut store = self.inner.lock().await;
        if !store.is_mounted() {
            return;
        }
        store.set_error_banner(BANNER_ASSISTANT_FAILED);
        drop(store);
        self.emit(ControllerEvent::StateChanged);
        self.emit(ControllerEvent::ErrorBanner(BANNER_ASSISTANT_FAILED.to_string()));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
