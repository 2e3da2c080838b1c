use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl ConfigValue {
    // Anything that is not a JSON scalar is kept verbatim as text, and so are
    // integers too wide for i64/u64.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Bool(flag)) => Self::Bool(flag),
            Ok(Value::Number(number)) if number.is_f64() && !raw.contains(['.', 'e', 'E']) => {
                Self::Text(raw.to_string())
            }
            Ok(Value::Number(number)) => Self::Number(number),
            Ok(Value::String(text)) => Self::Text(text),
            _ => Self::Text(raw.to_string()),
        }
    }

    #[must_use]
    pub fn from_stored(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(Self::Bool(flag)),
            Value::Number(number) => Some(Self::Number(number)),
            Value::String(text) => Some(Self::Text(text)),
            other => Some(Self::Text(other.to_string())),
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(number) => number.as_u64(),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}
