use arrow::datatypes::DataType;

use datasandbox_core::{DeclaredType, Error, FieldDecl, derive_schema};

#[test]
fn every_scalar_type_maps_to_one_column_type() {
    let cases = [
        (DeclaredType::Bool, DataType::Boolean),
        (DeclaredType::I8, DataType::Int8),
        (DeclaredType::I16, DataType::Int16),
        (DeclaredType::I32, DataType::Int32),
        (DeclaredType::I64, DataType::Int64),
        (DeclaredType::U8, DataType::UInt8),
        (DeclaredType::U16, DataType::UInt16),
        (DeclaredType::U32, DataType::UInt32),
        (DeclaredType::U64, DataType::UInt64),
        (DeclaredType::F32, DataType::Float32),
        (DeclaredType::F64, DataType::Float64),
        (DeclaredType::Text, DataType::Utf8),
    ];
    for (ty, expected) in cases {
        let schema = derive_schema(&[FieldDecl::new("value", ty)]).expect("schema");
        assert_eq!(schema.field(0).data_type(), &expected, "{ty:?}");
    }
}

#[test]
fn duplicate_field_names_are_rejected() {
    let result = derive_schema(&[
        FieldDecl::new("id", DeclaredType::I64),
        FieldDecl::new("id", DeclaredType::Text),
    ]);
    assert!(matches!(result, Err(Error::Schema(_))));
}

#[test]
fn declared_types_use_snake_case_names() {
    let encoded = serde_json::to_string(&DeclaredType::DateTime).expect("encode");
    assert_eq!(encoded, "\"date_time\"");
}
