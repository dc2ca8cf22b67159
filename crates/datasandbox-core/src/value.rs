use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// A single field value of a generated record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
        }
    }

    /// Render the value as a partition directory segment.
    ///
    /// Keys holding a path separator are rejected, so distinct values never
    /// share a directory below the output root.
    pub fn partition_key(&self) -> Result<String> {
        let key = self.to_string();
        if key.contains(['/', '\\', '\0']) {
            return Err(Error::Composition(format!(
                "partition key '{}' contains a path separator",
                key.escape_debug()
            )));
        }
        Ok(key)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(value) => f.write_str(value),
            Value::Int(value) => write!(f, "{value}"),
            Value::UInt(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_key_renders_numbers_and_text() {
        assert_eq!(Value::Int(42).partition_key().unwrap(), "42");
        assert_eq!(
            Value::Text("Suborganisation 3".to_string())
                .partition_key()
                .unwrap(),
            "Suborganisation 3"
        );
    }

    #[test]
    fn partition_key_rejects_separators() {
        for raw in ["a/b", "a\\b", "../up"] {
            assert!(
                matches!(Value::from(raw).partition_key(), Err(Error::Composition(_))),
                "{raw}"
            );
        }
        assert_eq!(Value::from("a_b").partition_key().unwrap(), "a_b");
    }

    #[test]
    fn date_renders_iso() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        assert_eq!(Value::Date(date).partition_key().unwrap(), "2021-03-01");
    }
}
