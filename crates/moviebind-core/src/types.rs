use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    /// 64-bit integer, used for surrogate keys and references to them.
    BigInt,
    /// 32-bit integer.
    Integer,
    Boolean,
    /// Bounded text; `max_length` counts characters.
    Varchar { max_length: u32 },
    /// Unbounded text.
    Text,
    /// Fixed-point decimal.
    Numeric { precision: u32, scale: u32 },
    Date,
    /// Timestamp without time zone.
    Timestamp,
}

impl ColumnType {
    /// Short type name used in messages and DDL.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "bigint",
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
            ColumnType::Varchar { .. } => "varchar",
            ColumnType::Text => "text",
            ColumnType::Numeric { .. } => "numeric",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
        }
    }

    pub fn max_length(&self) -> Option<u32> {
        match self {
            ColumnType::Varchar { max_length } => Some(*max_length),
            _ => None,
        }
    }
}

/// Store-assigned surrogate identifier of an entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityId> for FieldValue {
    fn from(value: EntityId) -> Self {
        FieldValue::Int(value.0)
    }
}

/// Value of a single record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Int(i64),
    Bool(bool),
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Name of the value's variant, for type mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Int(_) => "integer",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Text(_) => "text",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Date(_) => "date",
            FieldValue::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<EntityId> {
        self.as_i64().map(EntityId)
    }

    /// Stable string form used for uniqueness bookkeeping.
    pub fn key(&self) -> String {
        match self {
            FieldValue::Null => "<null>".to_string(),
            FieldValue::Int(value) => value.to_string(),
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Text(value) => value.clone(),
            FieldValue::Decimal(value) => value.to_string(),
            FieldValue::Date(value) => value.format("%Y-%m-%d").to_string(),
            FieldValue::Timestamp(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::Timestamp(value)
    }
}
