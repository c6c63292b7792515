use std::{
    fmt,
    hash::{Hash, Hasher},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_CATEGORY: &str = "Другое";

pub const DEFAULT_CATEGORIES: [&str; 5] = ["продукты", "транспорт", "жкх", "развлечения", "одежда"];

/// Opaque expense identifier.
///
/// The client mints ids from a millisecond timestamp, but the server is free
/// to hand back either JSON numbers or strings, so both decode. An id is
/// written back in the JSON kind it arrived as; equality compares the text
/// only, so a typed `"7"` still names the record the server sent as `7`.
#[derive(Debug, Clone)]
pub struct ExpenseId {
    raw: String,
    numeric: bool,
}

impl ExpenseId {
    /// Text id, serialized as a JSON string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            numeric: false,
        }
    }

    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self::from(at.timestamp_millis())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    /// False for blank text and numeric zero, the ids that mean "none given".
    pub fn is_present(&self) -> bool {
        let trimmed = self.raw.trim();
        !trimmed.is_empty() && trimmed != "0"
    }

    /// Blank, `"undefined"` and numeric zero never name a stored record.
    pub fn is_valid(&self) -> bool {
        self.is_present() && self.raw.trim() != "undefined"
    }
}

impl PartialEq for ExpenseId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ExpenseId {}

impl Hash for ExpenseId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<i64> for ExpenseId {
    fn from(value: i64) -> Self {
        Self {
            raw: value.to_string(),
            numeric: true,
        }
    }
}

impl From<&str> for ExpenseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for ExpenseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.numeric {
            if let Ok(number) = self.raw.parse::<i64>() {
                return serializer.serialize_i64(number);
            }
            if let Ok(number) = self.raw.parse::<f64>() {
                return serializer.serialize_f64(number);
            }
        }
        serializer.serialize_str(&self.raw)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExpenseId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for ExpenseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawExpenseId::deserialize(deserializer)? {
            RawExpenseId::Int(value) => Self::from(value),
            RawExpenseId::Float(value) => Self {
                raw: value.to_string(),
                numeric: true,
            },
            RawExpenseId::Text(value) => Self::new(value),
        })
    }
}

/// Spending amount in roubles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Amount(pub f64);

impl Amount {
    /// Zero, NaN and infinities count as "no amount".
    pub fn is_truthy(self) -> bool {
        self.0 != 0.0 && self.0.is_finite()
    }

    /// Accepts a comma as the decimal separator. Overflowing or non-finite
    /// text such as `inf` or `1e999` is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().replace(',', ".");
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(value) => Ok(Self(value)),
            // Non-numeric text decodes as NaN, which is then rejected as falsy.
            RawAmount::Text(value) => Ok(Self::parse(&value).unwrap_or(Self(f64::NAN))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Mints `user_<unix-millis>_<n>` with `n` in `0..1000`.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = uuid::Uuid::new_v4().as_u128() % 1000;
        Self(format!("user_{}_{suffix}", at.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub title: String,
    pub amount: Amount,
    pub category: String,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserIdentity>,
}

impl ExpenseRecord {
    /// Display line used by the assistant item selector and the text view.
    pub fn display_title(&self) -> String {
        format!("{} - {} руб.", self.title, self.amount)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
