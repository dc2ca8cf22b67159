//! Pull-style cursors over lazy sequences.
//!
//! A cursor hands out one value per [`Cursor::next`] call until the sequence
//! is exhausted or the cursor is closed. Closing releases whatever the
//! cursor holds, is idempotent, and never affects other cursors created from
//! the same source.

use datasandbox_core::Value;

/// Pull protocol with explicit release.
///
/// `next` returns `None` once the sequence is exhausted or after `close`,
/// and keeps returning `None` on every later call.
pub trait Cursor {
    type Item;

    fn next(&mut self) -> Option<Self::Item>;

    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    type Item = C::Item;

    fn next(&mut self) -> Option<Self::Item> {
        (**self).next()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Type-erased cursor producing record values.
pub type ValueCursor = Box<dyn Cursor<Item = Value>>;

/// Cursor adapter over any iterator.
///
/// The iterator is dropped on close or on exhaustion.
#[derive(Debug)]
pub struct IterCursor<I> {
    inner: Option<I>,
}

impl<I: Iterator> IterCursor<I> {
    pub fn new(iter: I) -> Self {
        Self { inner: Some(iter) }
    }
}

impl<I> Default for IterCursor<I> {
    /// A cursor that is already exhausted.
    fn default() -> Self {
        Self { inner: None }
    }
}

impl<I: Iterator> Cursor for IterCursor<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let value = self.inner.as_mut()?.next();
        if value.is_none() {
            self.inner = None;
        }
        value
    }

    fn close(&mut self) {
        self.inner = None;
    }

    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

/// Maps group ids to values, computing each value once per group.
///
/// Only the most recent `(group id, value)` pair is kept; consecutive pulls
/// inside the same group replay it.
pub struct MappedCursor<C, F, T> {
    inner: C,
    map: F,
    last: Option<(u64, T)>,
}

impl<C, F, T> MappedCursor<C, F, T>
where
    C: Cursor<Item = u64>,
    F: FnMut(u64) -> T,
    T: Clone,
{
    pub fn new(inner: C, map: F) -> Self {
        Self {
            inner,
            map,
            last: None,
        }
    }
}

impl<C, F, T> MappedCursor<C, F, T>
where
    C: Cursor<Item = u64> + 'static,
    F: FnMut(u64) -> T + 'static,
    T: Clone + Into<Value> + 'static,
{
    /// Erase the concrete type so the cursor can sit next to cursors of other
    /// field types inside a record generator.
    pub fn into_values(self) -> ValueCursor {
        Box::new(IntoValues(self))
    }
}

impl<C, F, T> Cursor for MappedCursor<C, F, T>
where
    C: Cursor<Item = u64>,
    F: FnMut(u64) -> T,
    T: Clone,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let id = self.inner.next()?;
        match &self.last {
            Some((last_id, value)) if *last_id == id => Some(value.clone()),
            _ => {
                let value = (self.map)(id);
                self.last = Some((id, value.clone()));
                Some(value)
            }
        }
    }

    fn close(&mut self) {
        self.inner.close();
        self.last = None;
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

struct IntoValues<C>(C);

impl<C> Cursor for IntoValues<C>
where
    C: Cursor,
    C::Item: Into<Value>,
{
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.0.next().map(Into::into)
    }

    fn close(&mut self) {
        self.0.close()
    }

    fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::indexer::GroupIndexer;

    fn drain<C: Cursor>(cursor: &mut C) -> Vec<C::Item> {
        let mut out = Vec::new();
        while let Some(value) = cursor.next() {
            out.push(value);
        }
        out
    }

    #[test]
    fn cursor_yields_indexer_sequence() {
        let mut cursor = GroupIndexer::new(7, 3).unwrap().cursor();
        assert_eq!(drain(&mut cursor), vec![0, 0, 0, 1, 1, 1, 2]);
        assert!(cursor.is_closed());
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn close_before_pull_is_safe_and_idempotent() {
        let mut cursor = GroupIndexer::new(3, 1).unwrap().cursor();
        cursor.close();
        cursor.close();
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn default_cursor_is_exhausted() {
        let mut cursor: IterCursor<std::vec::IntoIter<u64>> = IterCursor::default();
        assert_eq!(cursor.next(), None);
        cursor.close();
    }

    #[test]
    fn early_close_does_not_affect_fresh_cursor() {
        let indexer = GroupIndexer::new(3, 1).unwrap();
        let mut first = indexer.cursor();
        assert_eq!(first.next(), Some(0));
        assert_eq!(first.next(), Some(1));
        first.close();
        assert_eq!(first.next(), None);

        let mut fresh = indexer.cursor();
        assert_eq!(drain(&mut fresh), vec![0, 1, 2]);
    }

    #[test]
    fn independent_cursors_interleave() {
        let indexer = GroupIndexer::new(4, 2).unwrap();
        let mut a = indexer.cursor();
        let mut b = indexer.cursor();
        assert_eq!(a.next(), Some(0));
        a.close();
        assert_eq!(drain(&mut b), vec![0, 0, 1, 1]);
    }

    #[test]
    fn mapped_cursor_calls_map_once_per_group() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let indexer = GroupIndexer::new(7, 3).unwrap();
        let mut cursor = MappedCursor::new(indexer.cursor(), move |id| {
            counter.set(counter.get() + 1);
            format!("Item {}", id + 1)
        });

        let values = drain(&mut cursor);
        assert_eq!(
            values,
            vec!["Item 1", "Item 1", "Item 1", "Item 2", "Item 2", "Item 2", "Item 3"]
        );
        assert_eq!(calls.get(), 3);
        assert_eq!(calls.get() as u64, indexer.distinct_groups());
    }

    #[test]
    fn mapped_cursor_replays_stateful_map() {
        let labels = ["A", "B", "C"];
        let mut pos = 0;
        let indexer = GroupIndexer::new(7, 3).unwrap();
        let mut cursor = MappedCursor::new(indexer.cursor(), move |_| {
            let label = labels[pos];
            pos += 1;
            label
        });
        assert_eq!(drain(&mut cursor), vec!["A", "A", "A", "B", "B", "B", "C"]);
    }

    #[test]
    fn mapped_cursor_close_stops_values() {
        let indexer = GroupIndexer::new(5, 2).unwrap();
        let mut cursor = MappedCursor::new(indexer.cursor(), |id| id * 10);
        assert_eq!(cursor.next(), Some(0));
        cursor.close();
        assert!(cursor.is_closed());
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn into_values_erases_type() {
        let indexer = GroupIndexer::new(2, 1).unwrap();
        let mut cursor = MappedCursor::new(indexer.cursor(), |id| (id + 1) as i64).into_values();
        assert_eq!(cursor.next(), Some(Value::Int(1)));
        assert_eq!(cursor.next(), Some(Value::Int(2)));
        assert_eq!(cursor.next(), None);
    }
}
