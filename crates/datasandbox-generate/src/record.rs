use datasandbox_core::Value;
use tracing::debug;

use crate::cursor::{Cursor, ValueCursor};

/// One generated row: one value per field, in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeRecord {
    values: Vec<Value>,
}

impl CompositeRecord {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// A named value cursor feeding one field of the record stream.
pub struct FieldCursor {
    pub name: String,
    pub cursor: ValueCursor,
}

impl FieldCursor {
    pub fn new(name: impl Into<String>, cursor: ValueCursor) -> Self {
        Self {
            name: name.into(),
            cursor,
        }
    }
}

/// Zips independently grouped field cursors into records.
///
/// Each field advances at its own cadence. The first exhausted field ends
/// the stream; a partially pulled row is discarded.
pub struct RecordGenerator {
    fields: Vec<FieldCursor>,
    exhausted: bool,
}

impl RecordGenerator {
    pub fn new(fields: Vec<FieldCursor>) -> Self {
        Self {
            fields,
            exhausted: false,
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn next(&mut self) -> Option<CompositeRecord> {
        if self.exhausted {
            return None;
        }

        let mut values = Vec::with_capacity(self.fields.len());
        for field in &mut self.fields {
            match field.cursor.next() {
                Some(value) => values.push(value),
                None => {
                    debug!(field = %field.name, "field cursor exhausted");
                    self.exhausted = true;
                    return None;
                }
            }
        }

        Some(CompositeRecord::new(values))
    }

    /// Lazily yield up to `n` records, stopping early if a field exhausts.
    pub fn produce(&mut self, n: u64) -> Records<'_> {
        Records {
            generator: self,
            remaining: n,
        }
    }

    /// Close every field cursor. Safe to call more than once.
    pub fn close(&mut self) {
        for field in &mut self.fields {
            field.cursor.close();
        }
        self.exhausted = true;
    }

    pub fn is_closed(&self) -> bool {
        self.exhausted && self.fields.iter().all(|field| field.cursor.is_closed())
    }
}

impl Drop for RecordGenerator {
    fn drop(&mut self) {
        self.close();
    }
}

/// Bounded iterator returned by [`RecordGenerator::produce`].
pub struct Records<'a> {
    generator: &'a mut RecordGenerator,
    remaining: u64,
}

impl Iterator for Records<'_> {
    type Item = CompositeRecord;

    fn next(&mut self) -> Option<CompositeRecord> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let record = self.generator.next();
        if record.is_none() {
            self.remaining = 0;
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::MappedCursor;
    use crate::indexer::GroupIndexer;

    fn ints(n: u64, div: u64) -> ValueCursor {
        let indexer = GroupIndexer::new(n, div).unwrap();
        MappedCursor::new(indexer.cursor(), |id| (id + 1) as i64).into_values()
    }

    #[test]
    fn zips_fields_at_independent_cadences() {
        let mut generator = RecordGenerator::new(vec![
            FieldCursor::new("id", ints(6, 1)),
            FieldCursor::new("group", ints(6, 3)),
        ]);
        let rows: Vec<Vec<Value>> = generator.produce(6).map(|r| r.into_values()).collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], vec![Value::Int(1), Value::Int(1)]);
        assert_eq!(rows[2], vec![Value::Int(3), Value::Int(1)]);
        assert_eq!(rows[3], vec![Value::Int(4), Value::Int(2)]);
        assert_eq!(rows[5], vec![Value::Int(6), Value::Int(2)]);
    }

    #[test]
    fn shorter_field_ends_stream_without_error() {
        let mut generator = RecordGenerator::new(vec![
            FieldCursor::new("long", ints(10, 1)),
            FieldCursor::new("short", ints(4, 1)),
        ]);
        let rows: Vec<CompositeRecord> = generator.produce(10).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(generator.next(), None);
    }

    #[test]
    fn produce_is_bounded_by_n() {
        let mut generator = RecordGenerator::new(vec![FieldCursor::new("id", ints(10, 1))]);
        assert_eq!(generator.produce(3).count(), 3);
        let next = generator.next().expect("fourth record");
        assert_eq!(next.values(), &[Value::Int(4)]);
    }

    #[test]
    fn close_closes_all_fields() {
        let mut generator = RecordGenerator::new(vec![
            FieldCursor::new("a", ints(3, 1)),
            FieldCursor::new("b", ints(3, 1)),
        ]);
        assert!(generator.next().is_some());
        generator.close();
        generator.close();
        assert!(generator.is_closed());
        assert_eq!(generator.next(), None);
    }

    #[test]
    fn field_names_follow_order() {
        let generator = RecordGenerator::new(vec![
            FieldCursor::new("b", ints(1, 1)),
            FieldCursor::new("a", ints(1, 1)),
        ]);
        assert_eq!(generator.field_names(), vec!["b", "a"]);
    }
}
