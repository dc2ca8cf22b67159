//! Deterministic position-to-group mapping.
//!
//! A [`GroupIndexer`] splits `n` positions into consecutive groups of a
//! requested size and yields, for every position, the id of the group it
//! belongs to. Leftover positions form one final partial group whose id is
//! one past the last full group.

use std::iter::FusedIterator;

use datasandbox_core::{Error, Result};

use crate::cursor::IterCursor;

/// Immutable description of how `count` positions are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpec {
    pub count: u64,
    pub group_size: u64,
    pub group_count: u64,
    pub remainder: u64,
}

impl GroupSpec {
    /// Number of distinct ids produced over a full traversal.
    pub fn distinct_groups(&self) -> u64 {
        self.group_count + u64::from(self.remainder > 0)
    }

    fn group_of(&self, position: u64) -> u64 {
        // Positions past the full groups all belong to the partial group.
        (position / self.group_size).min(self.group_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupIndexer {
    spec: GroupSpec,
}

impl GroupIndexer {
    pub fn new(n: u64, div: u64) -> Result<Self> {
        if n < 1 || div < 1 {
            return Err(Error::Configuration(format!(
                "n={n} and div={div} must be positive"
            )));
        }

        let spec = if n <= div {
            GroupSpec {
                count: n,
                group_size: 1,
                group_count: n,
                remainder: 0,
            }
        } else {
            GroupSpec {
                count: n,
                group_size: div,
                group_count: n / div,
                remainder: n % div,
            }
        };

        Ok(Self { spec })
    }

    pub fn spec(&self) -> GroupSpec {
        self.spec
    }

    pub fn distinct_groups(&self) -> u64 {
        self.spec.distinct_groups()
    }

    /// Lazy sequence of group ids, one per position.
    pub fn produce(&self) -> GroupIds {
        GroupIds {
            spec: self.spec,
            position: 0,
        }
    }

    /// Fresh pull cursor over [`GroupIndexer::produce`].
    pub fn cursor(&self) -> IterCursor<GroupIds> {
        IterCursor::new(self.produce())
    }
}

/// Iterator over the group id of each position.
#[derive(Debug, Clone)]
pub struct GroupIds {
    spec: GroupSpec,
    position: u64,
}

impl GroupIds {
    /// Positions not yet yielded.
    pub fn remaining(&self) -> u64 {
        self.spec.count.saturating_sub(self.position)
    }
}

impl Iterator for GroupIds {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.position >= self.spec.count {
            return None;
        }
        let id = self.spec.group_of(self.position);
        self.position += 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(left) => (left, Some(left)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for GroupIds {}
