use thiserror::Error;

/// Core error type shared across MovieBind crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The catalog violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A record value violates its column's constraints.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Convenience alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A field value that does not fit the column it targets.
///
/// `table` and `column` always name the offending field so callers can report
/// it without inspecting the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for {table}.{column}: {reason}")]
pub struct ValidationError {
    pub table: String,
    pub column: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(table: &str, column: &str, reason: ValidationReason) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            reason,
        }
    }

    /// Qualified field name, `table.column`.
    pub fn field(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

/// Why a value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("column does not exist")]
    UnknownColumn,
    #[error("identity columns are assigned by the store")]
    IdentityAssigned,
    #[error("required value is missing")]
    Missing,
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("length {actual} exceeds maximum {max}")]
    TooLong { max: u32, actual: usize },
    #[error("value {value} is out of range for {column_type}")]
    OutOfRange {
        value: String,
        column_type: &'static str,
    },
    #[error("scale {actual} exceeds maximum {max}")]
    Scale { max: u32, actual: u32 },
    #[error("value must be non-negative")]
    Negative,
    #[error("value must be positive")]
    NotPositive,
}
