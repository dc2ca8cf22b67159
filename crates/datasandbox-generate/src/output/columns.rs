//! Typed column builders used by the partitioned writer.

use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{
    ArrayBuilder, ArrayRef, BooleanBuilder, Date32Builder, Float32Builder, Float64Builder,
    Int8Builder, Int16Builder, Int32Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder, TimestampMillisecondBuilder, TimestampNanosecondBuilder,
    TimestampSecondBuilder, UInt8Builder, UInt16Builder, UInt32Builder, UInt64Builder,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use datasandbox_core::{Error, Result, Value};

/// Check that every column of `schema` has a builder.
pub fn check_supported(schema: &Schema) -> Result<()> {
    for field in schema.fields() {
        if !is_supported(field.data_type()) {
            return Err(Error::Schema(format!(
                "unsupported data type for column {}: {}",
                field.name(),
                field.data_type()
            )));
        }
    }
    Ok(())
}

fn is_supported(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
            | DataType::Timestamp(_, _)
            | DataType::Date32
    )
}

/// One builder per schema column, appended to row by row.
pub struct RowBuilders {
    columns: Vec<(String, ColumnBuilder)>,
}

impl RowBuilders {
    pub fn new(schema: &Schema) -> Result<Self> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| Ok((field.name().clone(), ColumnBuilder::new(field)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Append one row.
    ///
    /// Every value is converted before any builder is touched, so a failed
    /// row leaves the buffered rows as they were.
    pub fn append_row(&mut self, values: &[Value]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::Schema(format!(
                "record has {} values, schema has {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        let cells = self
            .columns
            .iter()
            .zip(values)
            .map(|((name, builder), value)| builder.convert(name, value))
            .collect::<Result<Vec<_>>>()?;
        for ((name, builder), cell) in self.columns.iter_mut().zip(cells) {
            builder.push(name, cell)?;
        }
        Ok(())
    }

    /// Number of rows currently buffered.
    pub fn len(&self) -> usize {
        self.columns
            .first()
            .map(|(_, builder)| builder.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the buffered rows as arrays, leaving the builders empty.
    pub fn finish(&mut self) -> Vec<ArrayRef> {
        self.columns
            .iter_mut()
            .map(|(_, builder)| builder.finish())
            .collect()
    }
}

/// A value already converted to the physical type of its column.
enum Cell {
    Text(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
}

enum ColumnBuilder {
    Utf8(StringBuilder),
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    UInt8(UInt8Builder),
    UInt16(UInt16Builder),
    UInt32(UInt32Builder),
    UInt64(UInt64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Boolean(BooleanBuilder),
    TimestampSecond(TimestampSecondBuilder),
    TimestampMillisecond(TimestampMillisecondBuilder),
    TimestampMicrosecond(TimestampMicrosecondBuilder),
    TimestampNanosecond(TimestampNanosecondBuilder),
    Date32(Date32Builder),
}

impl ColumnBuilder {
    // Builders grow on demand; nothing is reserved per partition up front.
    fn new(field: &Field) -> Result<Self> {
        let builder = match field.data_type() {
            DataType::Utf8 => Self::Utf8(StringBuilder::new()),
            DataType::Int8 => Self::Int8(Int8Builder::new()),
            DataType::Int16 => Self::Int16(Int16Builder::new()),
            DataType::Int32 => Self::Int32(Int32Builder::new()),
            DataType::Int64 => Self::Int64(Int64Builder::new()),
            DataType::UInt8 => Self::UInt8(UInt8Builder::new()),
            DataType::UInt16 => Self::UInt16(UInt16Builder::new()),
            DataType::UInt32 => Self::UInt32(UInt32Builder::new()),
            DataType::UInt64 => Self::UInt64(UInt64Builder::new()),
            DataType::Float32 => Self::Float32(Float32Builder::new()),
            DataType::Float64 => Self::Float64(Float64Builder::new()),
            DataType::Boolean => Self::Boolean(BooleanBuilder::new()),
            DataType::Timestamp(unit, tz) => {
                let tz = tz.clone();
                match unit {
                    TimeUnit::Second => Self::TimestampSecond(
                        TimestampSecondBuilder::new().with_timezone_opt(tz),
                    ),
                    TimeUnit::Millisecond => Self::TimestampMillisecond(
                        TimestampMillisecondBuilder::new().with_timezone_opt(tz),
                    ),
                    TimeUnit::Microsecond => Self::TimestampMicrosecond(
                        TimestampMicrosecondBuilder::new().with_timezone_opt(tz),
                    ),
                    TimeUnit::Nanosecond => Self::TimestampNanosecond(
                        TimestampNanosecondBuilder::new().with_timezone_opt(tz),
                    ),
                }
            }
            DataType::Date32 => Self::Date32(Date32Builder::new()),
            other => {
                return Err(Error::Schema(format!(
                    "unsupported data type for column {}: {other}",
                    field.name()
                )));
            }
        };
        Ok(builder)
    }

    fn convert(&self, column: &str, value: &Value) -> Result<Cell> {
        let cell = match self {
            Self::Utf8(_) => Cell::Text(value.to_string()),
            Self::Int8(_) => Cell::I8(narrow(column, to_i64(column, value)?)?),
            Self::Int16(_) => Cell::I16(narrow(column, to_i64(column, value)?)?),
            Self::Int32(_) => Cell::I32(narrow(column, to_i64(column, value)?)?),
            Self::Int64(_) => Cell::I64(to_i64(column, value)?),
            Self::UInt8(_) => Cell::U8(narrow(column, to_u64(column, value)?)?),
            Self::UInt16(_) => Cell::U16(narrow(column, to_u64(column, value)?)?),
            Self::UInt32(_) => Cell::U32(narrow(column, to_u64(column, value)?)?),
            Self::UInt64(_) => Cell::U64(to_u64(column, value)?),
            Self::Float32(_) => Cell::F32(to_f64(column, value)? as f32),
            Self::Float64(_) => Cell::F64(to_f64(column, value)?),
            Self::Boolean(_) => Cell::Bool(to_bool(column, value)?),
            Self::TimestampSecond(_) => {
                Cell::I64(to_timestamp(column, value)?.and_utc().timestamp())
            }
            Self::TimestampMillisecond(_) => {
                Cell::I64(to_timestamp(column, value)?.and_utc().timestamp_millis())
            }
            Self::TimestampMicrosecond(_) => {
                Cell::I64(to_timestamp(column, value)?.and_utc().timestamp_micros())
            }
            Self::TimestampNanosecond(_) => Cell::I64(
                to_timestamp(column, value)?
                    .and_utc()
                    .timestamp_nanos_opt()
                    .ok_or_else(|| {
                        Error::conversion(column, "timestamp out of nanosecond range")
                    })?,
            ),
            Self::Date32(_) => Cell::I32(days_since_epoch(column, to_date(column, value)?)?),
        };
        Ok(cell)
    }

    fn push(&mut self, column: &str, cell: Cell) -> Result<()> {
        match (self, cell) {
            (Self::Utf8(b), Cell::Text(v)) => b.append_value(v),
            (Self::Int8(b), Cell::I8(v)) => b.append_value(v),
            (Self::Int16(b), Cell::I16(v)) => b.append_value(v),
            (Self::Int32(b), Cell::I32(v)) => b.append_value(v),
            (Self::Int64(b), Cell::I64(v)) => b.append_value(v),
            (Self::UInt8(b), Cell::U8(v)) => b.append_value(v),
            (Self::UInt16(b), Cell::U16(v)) => b.append_value(v),
            (Self::UInt32(b), Cell::U32(v)) => b.append_value(v),
            (Self::UInt64(b), Cell::U64(v)) => b.append_value(v),
            (Self::Float32(b), Cell::F32(v)) => b.append_value(v),
            (Self::Float64(b), Cell::F64(v)) => b.append_value(v),
            (Self::Boolean(b), Cell::Bool(v)) => b.append_value(v),
            (Self::TimestampSecond(b), Cell::I64(v)) => b.append_value(v),
            (Self::TimestampMillisecond(b), Cell::I64(v)) => b.append_value(v),
            (Self::TimestampMicrosecond(b), Cell::I64(v)) => b.append_value(v),
            (Self::TimestampNanosecond(b), Cell::I64(v)) => b.append_value(v),
            (Self::Date32(b), Cell::I32(v)) => b.append_value(v),
            _ => {
                return Err(Error::conversion(
                    column,
                    "converted value does not match the column builder",
                ));
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        match self {
            Self::Utf8(b) => b.len(),
            Self::Int8(b) => b.len(),
            Self::Int16(b) => b.len(),
            Self::Int32(b) => b.len(),
            Self::Int64(b) => b.len(),
            Self::UInt8(b) => b.len(),
            Self::UInt16(b) => b.len(),
            Self::UInt32(b) => b.len(),
            Self::UInt64(b) => b.len(),
            Self::Float32(b) => b.len(),
            Self::Float64(b) => b.len(),
            Self::Boolean(b) => b.len(),
            Self::TimestampSecond(b) => b.len(),
            Self::TimestampMillisecond(b) => b.len(),
            Self::TimestampMicrosecond(b) => b.len(),
            Self::TimestampNanosecond(b) => b.len(),
            Self::Date32(b) => b.len(),
        }
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            Self::Utf8(b) => Arc::new(b.finish()),
            Self::Int8(b) => Arc::new(b.finish()),
            Self::Int16(b) => Arc::new(b.finish()),
            Self::Int32(b) => Arc::new(b.finish()),
            Self::Int64(b) => Arc::new(b.finish()),
            Self::UInt8(b) => Arc::new(b.finish()),
            Self::UInt16(b) => Arc::new(b.finish()),
            Self::UInt32(b) => Arc::new(b.finish()),
            Self::UInt64(b) => Arc::new(b.finish()),
            Self::Float32(b) => Arc::new(b.finish()),
            Self::Float64(b) => Arc::new(b.finish()),
            Self::Boolean(b) => Arc::new(b.finish()),
            Self::TimestampSecond(b) => Arc::new(b.finish()),
            Self::TimestampMillisecond(b) => Arc::new(b.finish()),
            Self::TimestampMicrosecond(b) => Arc::new(b.finish()),
            Self::TimestampNanosecond(b) => Arc::new(b.finish()),
            Self::Date32(b) => Arc::new(b.finish()),
        }
    }
}

fn mismatch(column: &str, value: &Value, target: &str) -> Error {
    Error::conversion(column, format!("{} value does not fit {target}", value.kind()))
}

fn parse<T: FromStr>(column: &str, text: &str, target: &str) -> Result<T> {
    text.trim()
        .parse::<T>()
        .map_err(|_| Error::conversion(column, format!("'{text}' is not a valid {target}")))
}

fn narrow<S, T: TryFrom<S>>(column: &str, value: S) -> Result<T>
where
    S: Copy + std::fmt::Display,
{
    T::try_from(value)
        .map_err(|_| Error::conversion(column, format!("{value} is out of range for the column")))
}

fn to_i64(column: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::UInt(v) => narrow(column, *v),
        Value::Text(text) => parse(column, text, "integer"),
        other => Err(mismatch(column, other, "an integer column")),
    }
}

fn to_u64(column: &str, value: &Value) -> Result<u64> {
    match value {
        Value::UInt(v) => Ok(*v),
        Value::Int(v) => narrow(column, *v),
        Value::Text(text) => parse(column, text, "unsigned integer"),
        other => Err(mismatch(column, other, "an unsigned integer column")),
    }
}

fn to_f64(column: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Text(text) => parse(column, text, "float"),
        other => Err(mismatch(column, other, "a float column")),
    }
}

fn to_bool(column: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(v) => Ok(*v),
        Value::Text(text) => parse(column, text, "boolean"),
        other => Err(mismatch(column, other, "a boolean column")),
    }
}

fn to_timestamp(column: &str, value: &Value) -> Result<NaiveDateTime> {
    match value {
        Value::Timestamp(v) => Ok(*v),
        Value::Date(date) => Ok(date.and_time(chrono::NaiveTime::MIN)),
        Value::Text(text) => NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|_| Error::conversion(column, format!("'{text}' is not a valid timestamp"))),
        other => Err(mismatch(column, other, "a timestamp column")),
    }
}

fn to_date(column: &str, value: &Value) -> Result<NaiveDate> {
    match value {
        Value::Date(v) => Ok(*v),
        Value::Timestamp(v) => Ok(v.date()),
        Value::Text(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|_| Error::conversion(column, format!("'{text}' is not a valid date"))),
        other => Err(mismatch(column, other, "a date column")),
    }
}

fn days_since_epoch(column: &str, date: NaiveDate) -> Result<i32> {
    let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
    narrow(column, date.signed_duration_since(epoch).num_days())
}

#[cfg(test)]
mod tests {
    use arrow::array::{Array, Date32Array, Int8Array, StringArray, TimestampMicrosecondArray};

    use super::*;

    fn schema(fields: Vec<Field>) -> Schema {
        Schema::new(fields)
    }

    #[test]
    fn binary_columns_are_unsupported() {
        let schema = schema(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("blob", DataType::Binary, false),
        ]);
        assert!(matches!(check_supported(&schema), Err(Error::Schema(_))));
        assert!(matches!(RowBuilders::new(&schema), Err(Error::Schema(_))));
    }

    #[test]
    fn appends_and_finishes_rows() {
        let schema = schema(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("small", DataType::Int8, false),
            Field::new("day", DataType::Date32, false),
            Field::new(
                "at",
                DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
                false,
            ),
        ]);
        let mut builders = RowBuilders::new(&schema).expect("builders");
        let day = NaiveDate::from_ymd_opt(1970, 1, 3).unwrap();
        builders
            .append_row(&[
                Value::Int(7),
                Value::Text("12".to_string()),
                Value::Date(day),
                Value::Date(day),
            ])
            .expect("append");
        assert_eq!(builders.len(), 1);

        let arrays = builders.finish();
        assert!(builders.is_empty());
        let names = arrays[0].as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(0), "7");
        let small = arrays[1].as_any().downcast_ref::<Int8Array>().unwrap();
        assert_eq!(small.value(0), 12);
        let days = arrays[2].as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(days.value(0), 2);
        let at = arrays[3]
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(at.value(0), 2 * 86_400 * 1_000_000);
        assert_eq!(at.timezone(), Some("UTC"));
    }

    #[test]
    fn out_of_range_integer_fails() {
        let schema = schema(vec![Field::new("small", DataType::Int8, false)]);
        let mut builders = RowBuilders::new(&schema).unwrap();
        let err = builders.append_row(&[Value::Int(300)]).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn unparsable_text_fails() {
        let schema = schema(vec![Field::new("n", DataType::UInt32, false)]);
        let mut builders = RowBuilders::new(&schema).unwrap();
        let err = builders
            .append_row(&[Value::Text("abc".to_string())])
            .unwrap_err();
        match err {
            Error::Conversion { column, .. } => assert_eq!(column, "n"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn float_into_integer_column_fails() {
        let schema = schema(vec![Field::new("n", DataType::Int64, false)]);
        let mut builders = RowBuilders::new(&schema).unwrap();
        assert!(builders.append_row(&[Value::Float(1.5)]).is_err());
    }

    #[test]
    fn failed_row_leaves_buffered_rows_intact() {
        let schema = schema(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("n", DataType::Int64, false),
        ]);
        let mut builders = RowBuilders::new(&schema).unwrap();
        builders
            .append_row(&[Value::from("a"), Value::Int(1)])
            .unwrap();
        assert!(
            builders
                .append_row(&[Value::from("b"), Value::from("x")])
                .is_err()
        );
        assert_eq!(builders.len(), 1);

        let arrays = builders.finish();
        assert!(arrays.iter().all(|array| array.len() == 1));
        let names = arrays[0].as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(0), "a");
    }

    #[test]
    fn row_width_must_match_schema() {
        let schema = schema(vec![Field::new("n", DataType::Int64, false)]);
        let mut builders = RowBuilders::new(&schema).unwrap();
        assert!(matches!(
            builders.append_row(&[Value::Int(1), Value::Int(2)]),
            Err(Error::Schema(_))
        ));
    }
}
