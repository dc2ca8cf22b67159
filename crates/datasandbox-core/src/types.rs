use serde::{Deserialize, Serialize};

/// Record-level type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Text,
    /// Calendar date or point in time, depending on the field's date flag.
    DateTime,
    /// Raw bytes; accepted as a declaration but has no column mapping.
    Bytes,
}

/// One field of a record layout, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub ty: DeclaredType,
    /// Store a `DateTime` field as a calendar date instead of a timestamp.
    pub date: bool,
}

impl FieldDecl {
    pub const fn new(name: &'static str, ty: DeclaredType) -> Self {
        Self {
            name,
            ty,
            date: false,
        }
    }

    pub const fn date(name: &'static str) -> Self {
        Self {
            name,
            ty: DeclaredType::DateTime,
            date: true,
        }
    }
}
