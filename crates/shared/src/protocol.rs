use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Amount, ExpenseId, UserIdentity};

/// Words the assistant strips before matching spoken item titles.
pub const IGNORED_WORDS: [&str; 11] = [
    "добавить",
    "установить",
    "запиши",
    "поставь",
    "закинь",
    "удалить",
    "удали",
    "выбери",
    "выбрать",
    "покажи",
    "прибавь",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpenseRequest {
    pub id: ExpenseId,
    pub title: String,
    pub amount: Amount,
    pub category: String,
    #[serde(rename = "userId")]
    pub user_id: UserIdentity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAmountRequest {
    #[serde(rename = "userId")]
    pub user_id: UserIdentity,
    pub value: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedExpense {
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAmountResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "updatedExpense", default, skip_serializing_if = "Option::is_none")]
    pub updated_expense: Option<UpdatedExpense>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserQuery<'a> {
    #[serde(rename = "userId")]
    pub user_id: &'a UserIdentity,
}

/// Signals pushed by the voice-assistant runtime, framed as
/// `{"event": "data" | "start" | "error", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SignalFrame", into = "SignalFrame")]
pub enum AssistantSignal {
    Data(AssistantEvent),
    Start,
    /// Runtime failure; the payload is whatever the runtime attached, or null.
    Error(Value),
}

impl AssistantSignal {
    /// Human-readable reason for an `Error` signal.
    pub fn error_reason(payload: &Value) -> String {
        match payload {
            Value::Null => "unspecified".to_string(),
            Value::String(text) => text.clone(),
            other => other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SignalFrame {
    event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    payload: Value,
}

impl TryFrom<SignalFrame> for AssistantSignal {
    type Error = serde_json::Error;

    fn try_from(frame: SignalFrame) -> Result<Self, serde_json::Error> {
        match frame.event.as_str() {
            "data" => AssistantEvent::try_from(frame.payload).map(Self::Data),
            "start" => Ok(Self::Start),
            "error" => Ok(Self::Error(frame.payload)),
            other => Err(serde::de::Error::custom(format!(
                "unknown assistant event '{other}'"
            ))),
        }
    }
}

impl From<AssistantSignal> for SignalFrame {
    fn from(signal: AssistantSignal) -> Self {
        let (event, payload) = match signal {
            AssistantSignal::Data(event) => ("data", Value::from(event)),
            AssistantSignal::Start => ("start", Value::Null),
            AssistantSignal::Error(payload) => ("error", payload),
        };
        Self {
            event: event.to_string(),
            payload,
        }
    }
}

/// Payload of an assistant `data` signal, keyed on its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum AssistantEvent {
    Character { id: Option<String> },
    Insets(Value),
    Action(Option<AssistantAction>),
}

impl TryFrom<Value> for AssistantEvent {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.get("type").and_then(Value::as_str) {
            Some("character") => Ok(Self::Character {
                id: value
                    .pointer("/character/id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            Some("insets") => Ok(Self::Insets(
                value.get("insets").cloned().unwrap_or(Value::Null),
            )),
            _ => match value.get("action") {
                None | Some(Value::Null) => Ok(Self::Action(None)),
                Some(action) => {
                    AssistantAction::try_from(action.clone()).map(|a| Self::Action(Some(a)))
                }
            },
        }
    }
}

impl From<AssistantEvent> for Value {
    fn from(event: AssistantEvent) -> Self {
        match event {
            AssistantEvent::Character { id } => {
                serde_json::json!({ "type": "character", "character": { "id": id } })
            }
            AssistantEvent::Insets(insets) => serde_json::json!({ "type": "insets", "insets": insets }),
            AssistantEvent::Action(action) => serde_json::json!({
                "type": "smart_app_data",
                "action": action.map(Value::from),
            }),
        }
    }
}

/// Intent recognised by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum AssistantAction {
    AddNote {
        note: Option<String>,
        summ: Option<Amount>,
        category: Option<String>,
    },
    /// `delete_note` and its alias `remove_note`.
    DeleteNote {
        id: Option<ExpenseId>,
    },
    UpdateNote {
        id: Option<ExpenseId>,
        newsumm: Option<Amount>,
    },
    Unrecognized {
        kind: String,
        raw: Value,
    },
}

#[derive(Deserialize)]
struct AddNoteFields {
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    summ: Option<Amount>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Deserialize)]
struct DeleteNoteFields {
    #[serde(default)]
    id: Option<ExpenseId>,
}

#[derive(Deserialize)]
struct UpdateNoteFields {
    #[serde(default)]
    id: Option<ExpenseId>,
    #[serde(default)]
    newsumm: Option<Amount>,
}

impl TryFrom<Value> for AssistantAction {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match kind.as_str() {
            "add_note" => {
                let fields: AddNoteFields = serde_json::from_value(value)?;
                Ok(Self::AddNote {
                    note: fields.note,
                    summ: fields.summ,
                    category: fields.category,
                })
            }
            "delete_note" | "remove_note" => {
                let fields: DeleteNoteFields = serde_json::from_value(value)?;
                Ok(Self::DeleteNote { id: fields.id })
            }
            "update_note" => {
                let fields: UpdateNoteFields = serde_json::from_value(value)?;
                Ok(Self::UpdateNote {
                    id: fields.id,
                    newsumm: fields.newsumm,
                })
            }
            _ => Ok(Self::Unrecognized { kind, raw: value }),
        }
    }
}

impl From<AssistantAction> for Value {
    fn from(action: AssistantAction) -> Self {
        match action {
            AssistantAction::AddNote {
                note,
                summ,
                category,
            } => serde_json::json!({
                "type": "add_note",
                "note": note,
                "summ": summ,
                "category": category,
            }),
            AssistantAction::DeleteNote { id } => {
                serde_json::json!({ "type": "delete_note", "id": id })
            }
            AssistantAction::UpdateNote { id, newsumm } => {
                serde_json::json!({ "type": "update_note", "id": id, "newsumm": newsumm })
            }
            AssistantAction::Unrecognized { raw, .. } => raw,
        }
    }
}

/// State handed to the assistant to ground its language understanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantState {
    pub item_selector: ItemSelector,
    pub current_selected: Option<ExpenseId>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSelector {
    pub items: Vec<SelectorItem>,
    pub ignored_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorItem {
    pub number: usize,
    pub id: ExpenseId,
    pub title: String,
    pub category: String,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
