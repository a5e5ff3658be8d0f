//! Staging area between the builder and a [`Store`] transaction.

use std::collections::BTreeMap;

use moviebind_core::{Catalog, Entity, EntityId, EntityKind, Record};

use crate::errors::GenerationError;
use crate::store::{Store, StoreError};

/// Handle to a staged record.
///
/// The handle resolves to an [`EntityId`] once the record has been flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staged {
    kind: EntityKind,
    slot: usize,
}

#[derive(Debug)]
enum Slot {
    Pending,
    Flushed(Option<EntityId>),
}

/// One open transaction on a store.
///
/// Records are validated when staged and written in staging order on
/// [`Session::flush`]. The session is consumed by `commit` or `rollback`.
pub struct Session<'a, S: Store + ?Sized> {
    store: &'a mut S,
    catalog: &'a Catalog,
    pending: Vec<(usize, Record)>,
    slots: Vec<Slot>,
    written: BTreeMap<EntityKind, u64>,
}

impl<'a, S: Store + ?Sized> Session<'a, S> {
    /// Open a transaction on `store`.
    pub fn begin(store: &'a mut S, catalog: &'a Catalog) -> Result<Self, GenerationError> {
        store.begin()?;
        Ok(Self {
            store,
            catalog,
            pending: Vec::new(),
            slots: Vec::new(),
            written: BTreeMap::new(),
        })
    }

    /// Validate `entity` and queue it for the next flush.
    pub fn stage<E: Entity>(&mut self, entity: E) -> Result<Staged, GenerationError> {
        let record = Record::validated(self.catalog, entity)?;
        let slot = self.slots.len();
        self.slots.push(Slot::Pending);
        self.pending.push((slot, record));
        Ok(Staged {
            kind: E::KIND,
            slot,
        })
    }

    /// Write every pending record, returning how many were written.
    pub fn flush(&mut self) -> Result<usize, GenerationError> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let pending = std::mem::take(&mut self.pending);
        let records: Vec<Record> = pending.iter().map(|(_, record)| record.clone()).collect();
        let ids = self.store.flush(&records)?;
        if ids.len() != records.len() {
            return Err(StoreError::Backend(format!(
                "flush returned {} identifiers for {} records",
                ids.len(),
                records.len()
            ))
            .into());
        }

        for ((slot, record), id) in pending.into_iter().zip(ids) {
            if let Some(entry) = self.slots.get_mut(slot) {
                *entry = Slot::Flushed(id);
            }
            *self.written.entry(record.kind()).or_insert(0) += 1;
        }
        Ok(records.len())
    }

    /// Identifier of a flushed record.
    pub fn id(&self, handle: Staged) -> Result<EntityId, GenerationError> {
        let table = handle.kind.table_name();
        match self.slots.get(handle.slot) {
            Some(Slot::Flushed(Some(id))) => Ok(*id),
            Some(Slot::Flushed(None)) => Err(GenerationError::Referential {
                table: table.to_string(),
                detail: "record has no identifier".to_string(),
            }),
            Some(Slot::Pending) => Err(GenerationError::Referential {
                table: table.to_string(),
                detail: "record referenced before it was flushed".to_string(),
            }),
            None => Err(GenerationError::Referential {
                table: table.to_string(),
                detail: format!("unknown handle #{}", handle.slot),
            }),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Rows of `kind` written during this transaction.
    pub fn written(&self, kind: EntityKind) -> u64 {
        self.written.get(&kind).copied().unwrap_or(0)
    }

    /// Flush what is left and commit.
    ///
    /// On failure the session is handed back still open, so the caller can
    /// roll it back.
    #[allow(clippy::result_large_err)]
    pub fn commit(mut self) -> Result<(), (GenerationError, Self)> {
        if let Err(err) = self.flush() {
            return Err((err, self));
        }
        match self.store.commit() {
            Ok(()) => Ok(()),
            Err(err) => Err((err.into(), self)),
        }
    }

    /// Discard everything written in this transaction.
    pub fn rollback(self) -> Result<(), StoreError> {
        self.store.rollback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use moviebind_core::{Genre, Keyword, MovieGenre};

    #[test]
    fn resolves_ids_only_after_flush() {
        let catalog = Catalog::moviebind();
        let mut store = InMemoryStore::new();
        let mut session = Session::begin(&mut store, &catalog).expect("begin");

        let drama = session
            .stage(Genre {
                name: "drama".to_string(),
            })
            .expect("stage genre");
        let err = session.id(drama).expect_err("not flushed yet");
        assert!(matches!(err, GenerationError::Referential { .. }));

        assert_eq!(session.flush().expect("flush"), 1);
        assert_eq!(session.id(drama).expect("resolved"), EntityId(1));
        assert_eq!(session.written(EntityKind::Genre), 1);
        assert_eq!(session.pending_len(), 0);
    }

    #[test]
    fn failed_flush_leaves_handles_unresolved() {
        let catalog = Catalog::moviebind();
        let mut store = InMemoryStore::new();
        let mut session = Session::begin(&mut store, &catalog).expect("begin");
        session
            .stage(Keyword {
                term: "heist".to_string(),
            })
            .expect("stage keyword");
        session.flush().expect("flush keyword");

        let link = session
            .stage(MovieGenre {
                movie_id: EntityId(1),
                genre_id: EntityId(1),
            })
            .expect("stage link");
        let err = session.flush().expect_err("movie 1 does not exist");
        assert!(matches!(err, GenerationError::Store(_)));
        assert!(session.id(link).is_err());
        session.rollback().expect("rollback");
        assert!(store.is_empty());
    }

    #[test]
    fn commit_flushes_pending_rows() {
        let catalog = Catalog::moviebind();
        let mut store = InMemoryStore::new();
        let mut session = Session::begin(&mut store, &catalog).expect("begin");
        session
            .stage(Genre {
                name: "comedy".to_string(),
            })
            .expect("stage genre");
        session.commit().map_err(|(err, _)| err).expect("commit");
        assert_eq!(store.count(EntityKind::Genre), 1);
    }
}
