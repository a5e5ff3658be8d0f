//! Core contracts for the MovieBind seeder.
//!
//! This crate defines the entity catalog (tables, columns, keys and
//! relationships), the typed entity records built against it, and the
//! validation that every record passes before it can be staged in a store.

pub mod catalog;
pub mod constraints;
pub mod error;
pub mod graph;
pub mod record;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{
    CheckConstraint, CheckRule, Constraint, ForeignKey, PrimaryKey, UniqueConstraint,
};
pub use error::{Error, Result, ValidationError, ValidationReason};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report, creation_order};
pub use record::{
    Contract, Entity, Genre, Keyword, Movie, MovieGenre, MovieKeyword, Profile, Record, User,
    Viewing,
};
pub use schema::{Cardinality, Catalog, Column, EntityKind, Relationship, Table};
pub use types::{ColumnType, EntityId, FieldValue};
pub use validation::{validate_catalog, validate_values};

/// Version of the catalog layout rendered by `moviebind schema`.
pub const CATALOG_VERSION: &str = "0.1";
