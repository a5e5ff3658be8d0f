use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use moviebind_core::EntityKind;

use crate::errors::GenerationError;

/// Largest whole amount that fits `numeric(15, 2)`.
const MONEY_MAX: i64 = 9_999_999_999_999;

/// Inclusive count range drawn uniformly per parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: usize) -> bool {
        (self.min as usize..=self.max as usize).contains(&value)
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Options for a seeding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedOptions {
    /// Number of users to create.
    pub users: u32,
    pub contracts_per_user: CountRange,
    pub movies_per_contract: CountRange,
    /// Distinct genres linked to each movie.
    pub genres_per_movie: CountRange,
    /// Distinct keywords linked to each movie.
    pub keywords_per_movie: CountRange,
    pub genre_pool: u32,
    pub keyword_pool: u32,
    pub duration_minutes: IntRange,
    pub release_year: IntRange,
    pub age: IntRange,
    /// Movie budget in whole currency units.
    pub budget: IntRange,
    /// Movie gross revenue in whole currency units.
    pub revenue: IntRange,
    /// Consecutive collisions tolerated per unique value.
    pub max_unique_attempts: u32,
    /// RNG seed; a random one is drawn and reported when absent.
    pub seed: Option<u64>,
    /// "Now" for the run; defaults to the current UTC time.
    pub reference_time: Option<NaiveDateTime>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            users: 10,
            contracts_per_user: CountRange::new(1, 3),
            movies_per_contract: CountRange::new(1, 5),
            genres_per_movie: CountRange::new(1, 3),
            keywords_per_movie: CountRange::new(1, 3),
            genre_pool: 5,
            keyword_pool: 10,
            duration_minutes: IntRange::new(80, 180),
            release_year: IntRange::new(1980, 2023),
            age: IntRange::new(18, 60),
            budget: IntRange::new(1_000_000, 100_000_000),
            revenue: IntRange::new(1_000_000, 200_000_000),
            max_unique_attempts: 50,
            seed: None,
            reference_time: None,
        }
    }
}

impl SeedOptions {
    /// Parse options from TOML; missing keys keep their defaults.
    ///
    /// Only the syntax is checked here. Callers apply their overrides and
    /// then run [`SeedOptions::validate`].
    pub fn from_toml_str(contents: &str) -> Result<Self, GenerationError> {
        toml::from_str(contents).map_err(|err| GenerationError::InvalidOptions(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.users == 0 {
            return invalid("users must be >= 1");
        }
        if self.genre_pool == 0 || self.keyword_pool == 0 {
            return invalid("genre_pool and keyword_pool must be >= 1");
        }
        if self.max_unique_attempts == 0 {
            return invalid("max_unique_attempts must be >= 1");
        }

        check_count("contracts_per_user", self.contracts_per_user, None)?;
        check_count("movies_per_contract", self.movies_per_contract, None)?;
        check_count("genres_per_movie", self.genres_per_movie, Some(self.genre_pool))?;
        check_count(
            "keywords_per_movie",
            self.keywords_per_movie,
            Some(self.keyword_pool),
        )?;

        check_range("duration_minutes", self.duration_minutes, 1, i64::from(i32::MAX))?;
        check_range("release_year", self.release_year, 1, 9999)?;
        check_range("age", self.age, 1, 150)?;
        check_range("budget", self.budget, 0, MONEY_MAX)?;
        check_range("revenue", self.revenue, 0, MONEY_MAX)?;
        Ok(())
    }
}

fn invalid(message: &str) -> Result<(), GenerationError> {
    Err(GenerationError::InvalidOptions(message.to_string()))
}

fn check_count(name: &str, range: CountRange, pool: Option<u32>) -> Result<(), GenerationError> {
    if range.min == 0 {
        return Err(GenerationError::InvalidOptions(format!(
            "{name}: min must be >= 1"
        )));
    }
    if range.min > range.max {
        return Err(GenerationError::InvalidOptions(format!(
            "{name}: min must be <= max"
        )));
    }
    if let Some(pool) = pool
        && range.max > pool
    {
        return Err(GenerationError::InvalidOptions(format!(
            "{name}: max {} exceeds pool size {pool}",
            range.max
        )));
    }
    Ok(())
}

fn check_range(name: &str, range: IntRange, floor: i64, ceiling: i64) -> Result<(), GenerationError> {
    if range.min > range.max {
        return Err(GenerationError::InvalidOptions(format!(
            "{name}: min must be <= max"
        )));
    }
    if range.min < floor || range.max > ceiling {
        return Err(GenerationError::InvalidOptions(format!(
            "{name}: must stay within {floor}..={ceiling}"
        )));
    }
    Ok(())
}

/// Rows created for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows: u64,
}

/// Rows created by a single builder step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    created: BTreeMap<EntityKind, u64>,
}

impl StepOutcome {
    pub fn record(&mut self, kind: EntityKind) {
        *self.created.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: EntityKind) -> u64 {
        self.created.get(&kind).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: StepOutcome) {
        for (kind, rows) in other.created {
            *self.created.entry(kind).or_insert(0) += rows;
        }
    }
}

/// Report for a committed seeding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedReport {
    pub run_id: String,
    pub seed: u64,
    pub reference_time: NaiveDateTime,
    pub steps: usize,
    /// Row counts in creation order.
    pub tables: Vec<TableReport>,
    pub duration_ms: u64,
}

impl SeedReport {
    pub fn rows(&self, table: &str) -> u64 {
        self.tables
            .iter()
            .find(|report| report.table == table)
            .map(|report| report.rows)
            .unwrap_or(0)
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|report| report.rows).sum()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
