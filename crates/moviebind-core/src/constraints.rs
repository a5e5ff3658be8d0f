//! Table-level constraints of the catalog.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ValidationReason;

/// Key columns of a table, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Columns whose combined values may appear at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Sign rule for a single numeric column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckRule {
    NonNegative,
    Positive,
}

impl CheckRule {
    /// Operator comparing the column against zero in SQL.
    pub fn sql_operator(self) -> &'static str {
        match self {
            CheckRule::NonNegative => ">=",
            CheckRule::Positive => ">",
        }
    }

    /// Reason a value whose sign is `sign` breaks the rule, if it does.
    pub fn violation(self, sign: Ordering) -> Option<ValidationReason> {
        match (self, sign) {
            (CheckRule::NonNegative, Ordering::Less) => Some(ValidationReason::Negative),
            (CheckRule::Positive, Ordering::Less | Ordering::Equal) => {
                Some(ValidationReason::NotPositive)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConstraint {
    pub name: Option<String>,
    pub column: String,
    pub rule: CheckRule,
}

/// `columns` of the owning table point at `referenced_columns` of
/// `referenced_table`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    PrimaryKey(PrimaryKey),
    ForeignKey(ForeignKey),
    Unique(UniqueConstraint),
    Check(CheckConstraint),
}

impl Constraint {
    pub fn name(&self) -> Option<&str> {
        match self {
            Constraint::PrimaryKey(pk) => pk.name.as_deref(),
            Constraint::ForeignKey(fk) => fk.name.as_deref(),
            Constraint::Unique(unique) => unique.name.as_deref(),
            Constraint::Check(check) => check.name.as_deref(),
        }
    }

    /// Human label of the constraint kind.
    pub fn label(&self) -> &'static str {
        match self {
            Constraint::PrimaryKey(_) => "primary key",
            Constraint::ForeignKey(_) => "foreign key",
            Constraint::Unique(_) => "unique",
            Constraint::Check(_) => "check",
        }
    }

    /// Columns of the owning table the constraint covers.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Constraint::PrimaryKey(PrimaryKey { columns, .. })
            | Constraint::ForeignKey(ForeignKey { columns, .. })
            | Constraint::Unique(UniqueConstraint { columns, .. }) => {
                columns.iter().map(String::as_str).collect()
            }
            Constraint::Check(check) => vec![check.column.as_str()],
        }
    }
}
