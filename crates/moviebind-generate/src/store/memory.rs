use std::collections::BTreeMap;

use moviebind_core::{Catalog, EntityId, EntityKind, FieldValue, Record, Table};

use super::{Store, StoreError};

/// A row held by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: Option<EntityId>,
    pub record: Record,
}

impl StoredRow {
    /// Value of `column`, the identity column included.
    pub fn value(&self, table: &Table, column: &str) -> Option<FieldValue> {
        match (table.identity_column(), self.id) {
            (Some(identity), Some(id)) if identity.name == column => Some(id.into()),
            _ => self.record.get(column).cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Flush { kind: EntityKind, nth: u64 },
    Commit,
}

/// Store that keeps rows in memory and enforces the catalog's keys.
///
/// Unique and foreign-key constraints are checked on every flush, the way a
/// relational backend would. Faults can be injected to exercise rollback.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    catalog: Catalog,
    committed: BTreeMap<EntityKind, Vec<StoredRow>>,
    working: Option<BTreeMap<EntityKind, Vec<StoredRow>>>,
    sequences: BTreeMap<EntityKind, i64>,
    flushed: BTreeMap<EntityKind, u64>,
    faults: Vec<Fault>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_catalog(Catalog::moviebind())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            committed: BTreeMap::new(),
            working: None,
            sequences: BTreeMap::new(),
            flushed: BTreeMap::new(),
            faults: Vec::new(),
        }
    }

    /// Reject the `nth` (1-based) flushed row of `kind` in a transaction.
    pub fn fail_on_flush(mut self, kind: EntityKind, nth: u64) -> Self {
        self.faults.push(Fault::Flush { kind, nth });
        self
    }

    /// Reject the next commit.
    pub fn fail_on_commit(mut self) -> Self {
        self.faults.push(Fault::Commit);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Committed rows of `kind`.
    pub fn rows(&self, kind: EntityKind) -> &[StoredRow] {
        self.committed.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.rows(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.values().all(Vec::is_empty)
    }

    pub fn in_transaction(&self) -> bool {
        self.working.is_some()
    }

    fn insert(&mut self, record: &Record) -> Result<Option<EntityId>, StoreError> {
        let kind = record.kind();
        let table = self
            .catalog
            .table(kind)
            .ok_or_else(|| StoreError::Backend(format!("unknown table {kind}")))?;
        let working = self.working.as_mut().ok_or(StoreError::NoTransaction)?;

        let flushed = self.flushed.entry(kind).or_insert(0);
        *flushed += 1;
        if self
            .faults
            .contains(&Fault::Flush {
                kind,
                nth: *flushed,
            })
        {
            return Err(StoreError::Rejected {
                table: table.name.clone(),
                reason: format!("injected fault on flush #{flushed}"),
            });
        }

        for fk in table.foreign_keys() {
            let Some(parent_kind) = EntityKind::from_table_name(&fk.referenced_table) else {
                continue;
            };
            let Some(parent_table) = self.catalog.table(parent_kind) else {
                continue;
            };
            let wanted: Vec<Option<&FieldValue>> =
                fk.columns.iter().map(|column| record.get(column)).collect();
            if wanted.iter().any(|value| value.is_none_or(FieldValue::is_null)) {
                continue;
            }
            let exists = working.get(&parent_kind).is_some_and(|rows| {
                rows.iter().any(|row| {
                    fk.referenced_columns
                        .iter()
                        .zip(&wanted)
                        .all(|(column, value)| row.value(parent_table, column).as_ref() == *value)
                })
            });
            if !exists {
                return Err(StoreError::ForeignKeyViolation {
                    table: table.name.clone(),
                    constraint: fk.name.clone().unwrap_or_else(|| fk.columns.join("_")),
                });
            }
        }

        let rows = working.entry(kind).or_default();
        for columns in table.unique_sets() {
            if columns
                .iter()
                .any(|column| table.column(column).is_some_and(|c| c.identity))
            {
                continue;
            }
            let key: Vec<Option<&FieldValue>> =
                columns.iter().map(|column| record.get(column)).collect();
            if key.iter().any(|value| value.is_none_or(FieldValue::is_null)) {
                continue;
            }
            let duplicate = rows.iter().any(|row| {
                columns
                    .iter()
                    .zip(&key)
                    .all(|(column, value)| row.record.get(column) == *value)
            });
            if duplicate {
                return Err(StoreError::UniqueViolation {
                    table: table.name.clone(),
                    constraint: columns.join("_"),
                });
            }
        }

        let id = if table.identity_column().is_some() {
            let next = self.sequences.entry(kind).or_insert(0);
            *next += 1;
            Some(EntityId(*next))
        } else {
            None
        };

        rows.push(StoredRow {
            id,
            record: record.clone(),
        });
        Ok(id)
    }
}

impl Store for InMemoryStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        if self.working.is_some() {
            return Err(StoreError::TransactionOpen);
        }
        self.working = Some(self.committed.clone());
        self.flushed.clear();
        Ok(())
    }

    fn flush(&mut self, pending: &[Record]) -> Result<Vec<Option<EntityId>>, StoreError> {
        pending.iter().map(|record| self.insert(record)).collect()
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.working.is_none() {
            return Err(StoreError::NoTransaction);
        }
        if let Some(index) = self.faults.iter().position(|fault| *fault == Fault::Commit) {
            self.faults.remove(index);
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }
        if let Some(working) = self.working.take() {
            self.committed = working;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.working
            .take()
            .map(|_| ())
            .ok_or(StoreError::NoTransaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviebind_core::{Genre, MovieGenre};

    fn genre(catalog: &Catalog, name: &str) -> Record {
        Record::validated(
            catalog,
            Genre {
                name: name.to_string(),
            },
        )
        .expect("valid genre")
    }

    #[test]
    fn rejects_duplicate_unique_value() {
        let mut store = InMemoryStore::new();
        let catalog = store.catalog().clone();
        store.begin().expect("begin");
        store.flush(&[genre(&catalog, "drama")]).expect("first insert");

        let err = store
            .flush(&[genre(&catalog, "drama")])
            .expect_err("duplicate name");
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }

    #[test]
    fn rejects_dangling_reference() {
        let mut store = InMemoryStore::new();
        let catalog = store.catalog().clone();
        store.begin().expect("begin");
        let link = Record::validated(
            &catalog,
            MovieGenre {
                movie_id: EntityId(1),
                genre_id: EntityId(1),
            },
        )
        .expect("valid link");

        let err = store.flush(&[link]).expect_err("no such movie");
        assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));
    }

    #[test]
    fn rollback_discards_working_rows() {
        let mut store = InMemoryStore::new();
        let catalog = store.catalog().clone();
        store.begin().expect("begin");
        let ids = store.flush(&[genre(&catalog, "noir")]).expect("insert");
        assert_eq!(ids, vec![Some(EntityId(1))]);
        assert_eq!(store.count(EntityKind::Genre), 0);

        store.rollback().expect("rollback");
        assert!(store.is_empty());
        assert!(!store.in_transaction());
        assert!(matches!(store.rollback(), Err(StoreError::NoTransaction)));
    }
}
