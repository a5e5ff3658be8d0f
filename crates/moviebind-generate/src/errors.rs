use thiserror::Error;

use moviebind_core::ValidationError;
use moviebind_core::Error as SchemaError;

use crate::store::StoreError;

/// Errors emitted while seeding.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Options rejected before any transaction was opened.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// The catalog itself is unusable (bad definition or FK cycle).
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// A generated or supplied value violates the catalog.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// A uniqueness scope kept colliding.
    #[error("unique values exhausted for {scope} after {attempts} attempts")]
    Exhausted { scope: String, attempts: u32 },
    /// A dependent record was built before its parent had an identifier.
    #[error("referential error on {table}: {detail}")]
    Referential { table: String, detail: String },
    /// The backing store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
