//! Persistent store contract consumed by the seeding run.

mod memory;

use thiserror::Error;

use moviebind_core::{EntityId, Record};

pub use memory::{InMemoryStore, StoredRow};

/// Errors reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no open transaction")]
    NoTransaction,
    #[error("a transaction is already open")]
    TransactionOpen,
    #[error("unique constraint {constraint} violated on {table}")]
    UniqueViolation { table: String, constraint: String },
    #[error("foreign key {constraint} on {table} references a missing row")]
    ForeignKeyViolation { table: String, constraint: String },
    #[error("{table} rejected the write: {reason}")]
    Rejected { table: String, reason: String },
    #[error("backend error: {0}")]
    Backend(String),
}

/// Transactional sink for validated records.
///
/// A run calls `begin` once, any number of `flush`es, then exactly one of
/// `commit` or `rollback`. Flushed rows are visible to later flushes of the
/// same transaction only.
pub trait Store {
    fn begin(&mut self) -> Result<(), StoreError>;

    /// Write `pending` inside the open transaction, in order.
    ///
    /// Returns the identifier assigned to each record; join rows get `None`.
    fn flush(&mut self, pending: &[Record]) -> Result<Vec<Option<EntityId>>, StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for &mut S {
    fn begin(&mut self) -> Result<(), StoreError> {
        (**self).begin()
    }

    fn flush(&mut self, pending: &[Record]) -> Result<Vec<Option<EntityId>>, StoreError> {
        (**self).flush(pending)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        (**self).rollback()
    }
}
