//! Maps assistant runtime signals onto controller operations.

use std::sync::Arc;

use shared::{
    domain::{ExpenseId, DEFAULT_CATEGORY},
    protocol::{
        AssistantAction, AssistantEvent, AssistantSignal, AssistantState, ItemSelector,
        SelectorItem, IGNORED_WORDS,
    },
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{controller::ExpenseController, error::ControllerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    /// The operation ran and failed; carries the notice shown to the user.
    Failed(String),
    /// Events that carry no intent (character, insets, start, empty action).
    Ignored,
    Unrecognized(String),
}

impl From<Result<(), ControllerError>> for DispatchOutcome {
    fn from(result: Result<(), ControllerError>) -> Self {
        match result {
            Ok(()) => Self::Applied,
            Err(err) => Self::Failed(err.notice().to_string()),
        }
    }
}

pub struct IntentDispatcher {
    controller: Arc<ExpenseController>,
}

impl IntentDispatcher {
    pub fn new(controller: Arc<ExpenseController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &Arc<ExpenseController> {
        &self.controller
    }

    pub async fn handle_signal(&self, signal: AssistantSignal) -> DispatchOutcome {
        match signal {
            AssistantSignal::Data(event) => self.handle_event(event).await,
            AssistantSignal::Start => {
                let state = self.assistant_state().await;
                info!(items = state.item_selector.items.len(), "assistant started");
                DispatchOutcome::Ignored
            }
            AssistantSignal::Error(payload) => {
                let reason = AssistantSignal::error_reason(&payload);
                self.controller.report_assistant_error(&reason).await;
                DispatchOutcome::Ignored
            }
        }
    }

    pub async fn handle_event(&self, event: AssistantEvent) -> DispatchOutcome {
        match event {
            AssistantEvent::Character { id } => {
                debug!(character = id.as_deref().unwrap_or("unknown"), "assistant character");
                DispatchOutcome::Ignored
            }
            AssistantEvent::Insets(_) => {
                debug!("assistant insets");
                DispatchOutcome::Ignored
            }
            AssistantEvent::Action(action) => self.dispatch(action).await,
        }
    }

    pub async fn dispatch(&self, action: Option<AssistantAction>) -> DispatchOutcome {
        let Some(action) = action else {
            return DispatchOutcome::Ignored;
        };
        info!(?action, "dispatching assistant action");

        match action {
            AssistantAction::AddNote {
                note,
                summ,
                category,
            } => {
                let category = category
                    .filter(|category| !category.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
                self.controller
                    .add_expense(note.as_deref().unwrap_or_default(), summ, &category)
                    .await
                    .map(|_| ())
                    .into()
            }
            AssistantAction::DeleteNote { id } => {
                // A missing, blank or zero id targets the selection; any other
                // id, "undefined" included, goes through validation as given.
                let target = match id.filter(ExpenseId::is_present) {
                    Some(id) => Some(id),
                    None => self.controller.selected().await,
                };
                self.controller.delete_expense(target).await.into()
            }
            AssistantAction::UpdateNote { id, newsumm } => {
                self.controller.update_amount(id, newsumm).await.into()
            }
            AssistantAction::Unrecognized { kind, raw } => {
                warn!(kind = %kind, %raw, "unrecognized assistant action");
                DispatchOutcome::Unrecognized(kind)
            }
        }
    }

    /// Snapshot the assistant uses to resolve spoken references.
    pub async fn assistant_state(&self) -> AssistantState {
        let view = self.controller.view().await;
        AssistantState {
            item_selector: ItemSelector {
                items: view
                    .records
                    .iter()
                    .enumerate()
                    .map(|(index, record)| SelectorItem {
                        number: index + 1,
                        id: record.id.clone(),
                        title: record.display_title(),
                        category: record.category.clone(),
                    })
                    .collect(),
                ignored_words: IGNORED_WORDS.iter().map(|word| word.to_string()).collect(),
            },
            current_selected: view.selected,
            categories: view.categories,
        }
    }
}

/// Feeds runtime signals to the dispatcher, in order, until the sender side
/// closes. Each outcome is reported on `outcomes` while its receiver lives.
pub fn spawn_assistant_bridge(
    dispatcher: Arc<IntentDispatcher>,
    mut signals: mpsc::Receiver<AssistantSignal>,
    outcomes: mpsc::Sender<DispatchOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            let outcome = dispatcher.handle_signal(signal).await;
            debug!(?outcome, "assistant signal handled");
            if !outcomes.is_closed() {
                let _ = outcomes.send(outcome).await;
            }
        }
        info!("assistant signal stream closed");
    })
}

#[cfg(test)]
#[path = "tests/intent_tests.rs"]
mod tests;
