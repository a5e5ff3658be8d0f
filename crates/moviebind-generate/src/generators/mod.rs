//! Random field generation.
//!
//! [`FieldGenerator`] turns a semantic [`FieldKind`] into a value that fits the
//! target catalog column. Uniqueness-scoped requests remember every value
//! issued for their column during the run; the state is dropped with the
//! generator at the end of the run.

mod faker;

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta};
use rand::Rng;
use rust_decimal::Decimal;

use moviebind_core::{Catalog, EntityKind, ValidationError, ValidationReason};

use crate::errors::GenerationError;
use crate::model::IntRange;

/// Semantic kind of a generated text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Handle,
    Credential,
    Email,
    FirstName,
    Surname,
    FullName,
    CastList,
    Phone,
    NationalId,
    Word,
    Title,
    ContractType,
    StreetAddress,
    City,
    PostalCode,
    Country,
    Language,
    AspectRatio,
    AgeRating,
    ImdbLink,
}

/// Per-run field generator.
#[derive(Debug)]
pub struct FieldGenerator {
    limits: HashMap<String, Option<u32>>,
    issued: HashMap<String, HashSet<String>>,
    max_attempts: u32,
    now: NaiveDateTime,
}

impl FieldGenerator {
    pub fn new(catalog: &Catalog, max_attempts: u32, now: NaiveDateTime) -> Self {
        let mut limits = HashMap::new();
        for table in &catalog.tables {
            for column in &table.columns {
                limits.insert(
                    scope_key(table.kind, &column.name),
                    column.column_type.max_length(),
                );
            }
        }

        Self {
            limits,
            issued: HashMap::new(),
            max_attempts,
            now,
        }
    }

    /// Reference "now" of the run.
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Text for `entity.column`, cut to the column's maximum length.
    pub fn text<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        kind: FieldKind,
        entity: EntityKind,
        column: &str,
    ) -> Result<String, GenerationError> {
        let limit = self.limit(entity, column)?;
        Ok(truncate(faker::text(kind, rng), limit))
    }

    /// Text never issued before for `entity.column` during this run.
    pub fn unique_text<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        kind: FieldKind,
        entity: EntityKind,
        column: &str,
    ) -> Result<String, GenerationError> {
        let limit = self.limit(entity, column)?;
        let scope = scope_key(entity, column);
        let issued = self.issued.entry(scope.clone()).or_default();

        for _ in 0..self.max_attempts {
            let value = truncate(faker::text(kind, rng), limit);
            if !value.is_empty() && issued.insert(value.clone()) {
                return Ok(value);
            }
        }

        Err(GenerationError::Exhausted {
            scope,
            attempts: self.max_attempts,
        })
    }

    /// Number of values issued so far in a uniqueness scope.
    pub fn issued_count(&self, entity: EntityKind, column: &str) -> usize {
        self.issued
            .get(&scope_key(entity, column))
            .map(HashSet::len)
            .unwrap_or(0)
    }

    pub fn int_in<R: Rng + ?Sized>(&self, rng: &mut R, range: IntRange) -> i64 {
        rng.random_range(range.min..=range.max)
    }

    pub fn flag<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.random_bool(0.5)
    }

    /// Amount with exactly two decimal places, drawn as whole cents.
    pub fn money<R: Rng + ?Sized>(&self, rng: &mut R, range: IntRange) -> Decimal {
        let cents = rng.random_range(range.min * 100..=range.max * 100);
        Decimal::new(cents, 2)
    }

    /// Birth date of someone exactly `age` years old at the run's reference date.
    pub fn birth_date<R: Rng + ?Sized>(&self, rng: &mut R, age: i64) -> NaiveDate {
        let today = self.now.date();
        let months = |years: i64| Months::new(u32::try_from(years.max(0) * 12).unwrap_or(0));
        let latest = today.checked_sub_months(months(age)).unwrap_or(today);
        let earliest = today
            .checked_sub_months(months(age + 1))
            .and_then(|date| date.succ_opt())
            .unwrap_or(latest);
        let span = (latest - earliest).num_days().max(0);
        earliest + TimeDelta::days(rng.random_range(0..=span))
    }

    /// Timestamp in `[start, end]`, second precision.
    pub fn timestamp_between<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> NaiveDateTime {
        let span = (end - start).num_seconds().max(0);
        start + TimeDelta::seconds(rng.random_range(0..=span))
    }

    /// Timestamp between the start of the current year and now.
    pub fn timestamp_this_year<R: Rng + ?Sized>(&self, rng: &mut R) -> NaiveDateTime {
        self.timestamp_between(rng, self.year_start(), self.now)
    }

    pub fn year_start(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(self.now.year(), 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or(self.now)
    }

    pub fn year_end(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(self.now.year(), 12, 31)
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .unwrap_or(self.now)
    }

    fn limit(&self, entity: EntityKind, column: &str) -> Result<Option<u32>, GenerationError> {
        self.limits
            .get(&scope_key(entity, column))
            .copied()
            .ok_or_else(|| {
                GenerationError::Validation(ValidationError::new(
                    entity.table_name(),
                    column,
                    ValidationReason::UnknownColumn,
                ))
            })
    }
}

fn scope_key(entity: EntityKind, column: &str) -> String {
    format!("{}.{}", entity.table_name(), column)
}

fn truncate(value: String, limit: Option<u32>) -> String {
    match limit {
        Some(max) if value.chars().count() > max as usize => {
            value.chars().take(max as usize).collect::<String>().trim_end().to_string()
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_characters() {
        assert_eq!(truncate("ééééé".to_string(), Some(3)), "ééé");
        assert_eq!(truncate("abc".to_string(), Some(10)), "abc");
        assert_eq!(truncate("ab cd".to_string(), Some(3)), "ab");
        assert_eq!(truncate("long text".to_string(), None), "long text");
    }
}
