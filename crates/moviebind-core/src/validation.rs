use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::constraints::Constraint;
use crate::error::{Error, Result, ValidationError, ValidationReason};
use crate::schema::{Catalog, Column, Table};
use crate::types::{ColumnType, FieldValue};

/// Validate internal consistency of a catalog.
///
/// This checks:
/// - duplicate tables/columns
/// - key, unique and check columns exist
/// - foreign key columns and referenced targets exist
pub fn validate_catalog(catalog: &Catalog) -> Result<()> {
    let mut tables: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for table in &catalog.tables {
        if tables.contains_key(table.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name
            )));
        }
        if table.name != table.kind.table_name() {
            return Err(Error::InvalidSchema(format!(
                "table {} does not match entity kind {:?}",
                table.name, table.kind
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.name, column.name
                )));
            }
        }

        tables.insert(table.name.as_str(), columns);
    }

    for table in &catalog.tables {
        let columns = tables.get(table.name.as_str()).ok_or_else(|| {
            Error::InvalidSchema(format!("missing table in catalog: {}", table.name))
        })?;
        let require = |kind: &str, column: &str| -> Result<()> {
            if columns.contains(column) {
                Ok(())
            } else {
                Err(Error::InvalidSchema(format!(
                    "{kind} column not found: {}.{}",
                    table.name, column
                )))
            }
        };

        for constraint in &table.constraints {
            for column in constraint.columns() {
                require(constraint.label(), column)?;
            }

            if let Constraint::ForeignKey(fk) = constraint {
                let ref_columns = tables
                    .get(fk.referenced_table.as_str())
                    .ok_or_else(|| {
                        Error::InvalidSchema(format!(
                            "referenced table not found: {}",
                            fk.referenced_table
                        ))
                    })?;

                if let Some(missing) = fk
                    .referenced_columns
                    .iter()
                    .find(|column| !ref_columns.contains(column.as_str()))
                {
                    return Err(Error::InvalidSchema(format!(
                        "referenced column not found: {}.{}",
                        fk.referenced_table, missing
                    )));
                }
            }
        }

        for relationship in &table.relationships {
            if let Some(through) = relationship.through
                && !tables.contains_key(through.table_name())
            {
                return Err(Error::InvalidSchema(format!(
                    "join table not found for {}.{}: {}",
                    table.name, relationship.name, through
                )));
            }
        }
    }

    Ok(())
}

/// Check record values against a table definition.
///
/// Every supplied column must exist and must not be store-assigned; every
/// required column must be present and non-null; values must match the
/// column type, length, scale and check rules.
pub fn validate_values(
    table: &Table,
    values: &[(&'static str, FieldValue)],
) -> std::result::Result<(), ValidationError> {
    for (name, value) in values {
        let column = table
            .column(name)
            .ok_or_else(|| ValidationError::new(&table.name, name, ValidationReason::UnknownColumn))?;
        if column.identity {
            return Err(ValidationError::new(
                &table.name,
                name,
                ValidationReason::IdentityAssigned,
            ));
        }
        validate_value(table, column, value)?;
    }

    for column in table.required_columns() {
        let present = values
            .iter()
            .any(|(name, value)| *name == column.name && !value.is_null());
        if !present {
            return Err(ValidationError::new(
                &table.name,
                &column.name,
                ValidationReason::Missing,
            ));
        }
    }

    for check in table.checks() {
        let Some((_, value)) = values.iter().find(|(name, _)| *name == check.column) else {
            continue;
        };
        let sign = match value {
            FieldValue::Int(value) => value.cmp(&0),
            FieldValue::Decimal(value) => value.cmp(&Decimal::ZERO),
            _ => continue,
        };
        let reason = check.rule.violation(sign);
        if let Some(reason) = reason {
            return Err(ValidationError::new(&table.name, &check.column, reason));
        }
    }

    Ok(())
}

fn validate_value(
    table: &Table,
    column: &Column,
    value: &FieldValue,
) -> std::result::Result<(), ValidationError> {
    let error = |reason| ValidationError::new(&table.name, &column.name, reason);
    let mismatch = || {
        error(ValidationReason::TypeMismatch {
            expected: column.column_type.name(),
            found: value.kind_name(),
        })
    };

    match (&column.column_type, value) {
        (_, FieldValue::Null) if column.is_nullable => Ok(()),
        (_, FieldValue::Null) => Err(error(ValidationReason::Missing)),
        (ColumnType::BigInt, FieldValue::Int(_)) => Ok(()),
        (ColumnType::Integer, FieldValue::Int(value)) => {
            if i32::try_from(*value).is_ok() {
                Ok(())
            } else {
                Err(error(ValidationReason::OutOfRange {
                    value: value.to_string(),
                    column_type: "integer",
                }))
            }
        }
        (ColumnType::Boolean, FieldValue::Bool(_)) => Ok(()),
        (ColumnType::Text, FieldValue::Text(_)) => Ok(()),
        (ColumnType::Varchar { max_length }, FieldValue::Text(text)) => {
            let actual = text.chars().count();
            if actual > *max_length as usize {
                Err(error(ValidationReason::TooLong {
                    max: *max_length,
                    actual,
                }))
            } else {
                Ok(())
            }
        }
        (ColumnType::Numeric { precision, scale }, FieldValue::Decimal(value)) => {
            if value.scale() > *scale {
                return Err(error(ValidationReason::Scale {
                    max: *scale,
                    actual: value.scale(),
                }));
            }
            let integer_digits = precision.saturating_sub(*scale).min(18);
            let limit = Decimal::from(10_i64.pow(integer_digits));
            if value.abs().trunc() >= limit {
                return Err(error(ValidationReason::OutOfRange {
                    value: value.to_string(),
                    column_type: "numeric",
                }));
            }
            Ok(())
        }
        (ColumnType::Date, FieldValue::Date(_)) => Ok(()),
        (ColumnType::Timestamp, FieldValue::Timestamp(_)) => Ok(()),
        _ => Err(mismatch()),
    }
}
