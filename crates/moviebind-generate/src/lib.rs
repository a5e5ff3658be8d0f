//! Synthetic data seeding for the MovieBind catalog.
//!
//! A [`BatchRunner`] plans the run, builds users, profiles, contracts, movies,
//! their genre/keyword links and viewings in dependency order, and writes
//! them through a [`Store`] inside a single transaction.

pub mod builder;
pub mod errors;
pub mod generators;
pub mod model;
pub mod planner;
pub mod progress;
pub mod runner;
pub mod session;
pub mod store;

pub use builder::{RunContext, sample_distinct};
pub use errors::GenerationError;
pub use generators::{FieldGenerator, FieldKind};
pub use model::{CountRange, IntRange, SeedOptions, SeedReport, StepOutcome, TableReport};
pub use planner::{Step, plan_steps};
pub use progress::{Milestone, ProgressReporter, RecordingReporter, TracingReporter};
pub use runner::BatchRunner;
pub use session::{Session, Staged};
pub use store::{InMemoryStore, Store, StoreError, StoredRow};
