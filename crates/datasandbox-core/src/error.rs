use std::fmt;
use std::path::Path;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Core error type shared across datasandbox crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A count, divisor, batch size or other setting is out of range.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The record layout cannot be represented as a columnar schema.
    #[error("schema error: {0}")]
    Schema(String),
    /// Filesystem failure while creating, writing or closing output.
    #[error("io error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    /// Partition bookkeeping invariant violated.
    #[error("composition error: {0}")]
    Composition(String),
    /// A record value does not fit the column it is appended to.
    #[error("cannot convert value for column '{column}': {reason}")]
    Conversion { column: String, reason: String },
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),
    /// Several independent failures, e.g. from closing many partitions.
    #[error("{} errors occurred: {}", .0.len(), JoinedErrors(.0))]
    Multiple(Vec<Error>),
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn io_at(action: &str, path: &Path, source: std::io::Error) -> Self {
        Error::io(format!("{action} {}", path.display()), source)
    }

    pub fn conversion(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Conversion {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Collapse a list of failures: none is success, one is returned as-is.
    pub fn from_many(mut errors: Vec<Error>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Multiple(errors)),
        }
    }
}

struct JoinedErrors<'a>(&'a [Error]);

impl fmt::Display for JoinedErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

/// Convenience alias for results returned by datasandbox crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_many_keeps_single_error() {
        let err = Error::from_many(vec![Error::Composition("x".to_string())]).unwrap_err();
        assert!(matches!(err, Error::Composition(_)));
    }

    #[test]
    fn multiple_lists_every_member() {
        let err = Error::from_many(vec![
            Error::Schema("first".to_string()),
            Error::Configuration("second".to_string()),
        ])
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("2 errors occurred"));
        assert!(message.contains("first"));
        assert!(message.contains("second"));
    }

    #[test]
    fn from_many_empty_is_ok() {
        assert!(Error::from_many(Vec::new()).is_ok());
    }
}
