use thiserror::Error;

use crate::gateway::GatewayError;

pub const ALERT_INVALID_ADD: &str = "Ошибка: некорректные данные для добавления";
pub const ALERT_INVALID_UPDATE: &str = "Ошибка: некорректные данные для обновления";
pub const ALERT_INVALID_ID: &str = "Ошибка: некорректный ID задачи";
pub const ALERT_UNKNOWN_SERVER_ERROR: &str = "Unknown error";

pub const BANNER_LOAD_FAILED: &str = "Ошибка загрузки данных";
pub const BANNER_ADD_FAILED: &str = "Не удалось добавить задачу";
pub const BANNER_ASSISTANT_FAILED: &str = "Ошибка в работе ассистента";

#[derive(Debug, Error)]
pub enum ControllerError {
    /// Rejected locally; no request was sent.
    #[error("{0}")]
    Validation(&'static str),
    /// The gateway call failed; `notice` is what the user was shown.
    #[error("{notice}")]
    Gateway {
        notice: String,
        #[source]
        source: GatewayError,
    },
}

impl ControllerError {
    pub fn notice(&self) -> &str {
        match self {
            Self::Validation(message) => message,
            Self::Gateway { notice, .. } => notice,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
