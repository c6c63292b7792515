//! Headless client core for the voice-assisted expense tracker.

pub mod assistant;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod intent;
pub mod requests;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use assistant::{AssistantMode, DebuggerOptions, NativePanel};
pub use controller::{ControllerEvent, ExpenseController};
pub use error::ControllerError;
pub use gateway::{ExpenseApi, GatewayError, HttpExpenseApi, DEFAULT_API_BASE_URL};
pub use intent::{spawn_assistant_bridge, DispatchOutcome, IntentDispatcher};
pub use requests::{Operation, PendingRequest, RequestId, RequestTracker};
pub use store::{ExpenseStore, ExpenseView};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
