//! Core contracts and helpers for datasandbox.
//!
//! This crate defines the record value model, field declarations, schema
//! derivation and the error taxonomy shared by the generator and the CLI.

pub mod error;
pub mod schema;
pub mod types;
pub mod validation;
pub mod value;

pub use error::{Error, Result};
pub use schema::{TIMESTAMP_TZ, derive_schema};
pub use types::{DeclaredType, FieldDecl};
pub use validation::validate_schema;
pub use value::Value;
