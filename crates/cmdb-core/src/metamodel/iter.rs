use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::{Entity, EntityId};
use crate::errors::CoreError;
use crate::store::RecordIter;

/// Lazy, finite sequence of entities read from a `MetaStore`.
///
/// `next()` returns `None` once the underlying scan is exhausted and keeps
/// returning `None` afterwards. To start over, call the `find_*` method again.
pub struct EntityIter<T> {
    records: Option<RecordIter>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityIter<T> {
    #[must_use]
    pub fn new(records: RecordIter) -> Self {
        Self {
            records: Some(records),
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self {
            records: None,
            _entity: PhantomData,
        }
    }

    /// Drain the remaining entities, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first read or decode error.
    pub fn collect_all(self) -> Result<Vec<T>, CoreError> {
        self.collect()
    }
}

impl<T: Entity> Iterator for EntityIter<T> {
    type Item = Result<T, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.records.as_mut()?;
        match records.next() {
            Some(Ok((id, record))) => Some(T::from_record(id, &record)),
            Some(Err(e)) => Some(Err(e)),
            None => {
                self.records = None;
                None
            }
        }
    }
}

impl<T: Entity> FusedIterator for EntityIter<T> {}

impl<T> std::fmt::Debug for EntityIter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityIter")
            .field("exhausted", &self.records.is_none())
            .finish()
    }
}
