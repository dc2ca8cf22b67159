use std::collections::BTreeSet;

use arrow::datatypes::Schema;

use crate::error::{Error, Result};

/// Validate internal consistency of a columnar schema.
///
/// This checks:
/// - at least one column
/// - no duplicate column names
/// - no nullable columns (generated data never carries nulls)
pub fn validate_schema(schema: &Schema) -> Result<()> {
    if schema.fields().is_empty() {
        return Err(Error::Schema("schema has no columns".to_string()));
    }

    let mut names = BTreeSet::new();
    for field in schema.fields() {
        if !names.insert(field.name().as_str()) {
            return Err(Error::Schema(format!(
                "duplicate column name: {}",
                field.name()
            )));
        }
        if field.is_nullable() {
            return Err(Error::Schema(format!(
                "column {} must not be nullable",
                field.name()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{DataType, Field};

    use super::*;

    #[test]
    fn rejects_duplicate_columns() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("id", DataType::Utf8, false),
        ]);
        assert!(matches!(validate_schema(&schema), Err(Error::Schema(_))));
    }

    #[test]
    fn rejects_nullable_columns() {
        let schema = Schema::new(vec![Field::new("id", DataType::Int64, true)]);
        assert!(matches!(validate_schema(&schema), Err(Error::Schema(_))));
    }
}
