use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};

use crate::error::{Error, Result};
use crate::types::{DeclaredType, FieldDecl};
use crate::validation::validate_schema;

/// Timezone attached to every derived timestamp column.
pub const TIMESTAMP_TZ: &str = "UTC";

/// Build the columnar schema for an ordered list of field declarations.
///
/// Every column is non-nullable. Fails when the list is empty, when a field
/// type has no column mapping, or when two fields share a name.
pub fn derive_schema(fields: &[FieldDecl]) -> Result<SchemaRef> {
    if fields.is_empty() {
        return Err(Error::Schema("record declares no fields".to_string()));
    }

    let columns = fields
        .iter()
        .map(|field| Ok(Field::new(field.name, data_type_for(field)?, false)))
        .collect::<Result<Vec<_>>>()?;

    let schema = Schema::new(columns);
    validate_schema(&schema)?;
    Ok(Arc::new(schema))
}

fn data_type_for(field: &FieldDecl) -> Result<DataType> {
    let data_type = match field.ty {
        DeclaredType::Bool => DataType::Boolean,
        DeclaredType::I8 => DataType::Int8,
        DeclaredType::I16 => DataType::Int16,
        DeclaredType::I32 => DataType::Int32,
        DeclaredType::I64 => DataType::Int64,
        DeclaredType::U8 => DataType::UInt8,
        DeclaredType::U16 => DataType::UInt16,
        DeclaredType::U32 => DataType::UInt32,
        DeclaredType::U64 => DataType::UInt64,
        DeclaredType::F32 => DataType::Float32,
        DeclaredType::F64 => DataType::Float64,
        DeclaredType::Text => DataType::Utf8,
        DeclaredType::DateTime if field.date => DataType::Date32,
        DeclaredType::DateTime => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TZ.into()))
        }
        DeclaredType::Bytes => {
            return Err(Error::Schema(format!(
                "unsupported type for field {}: {:?}",
                field.name, field.ty
            )));
        }
    };
    Ok(data_type)
}
