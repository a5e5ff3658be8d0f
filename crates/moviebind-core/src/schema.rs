use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constraints::{CheckConstraint, Constraint, ForeignKey};
use crate::types::ColumnType;

/// The entity sets of the movie-subscription domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Profile,
    Contract,
    Movie,
    Genre,
    Keyword,
    Viewing,
    MovieGenre,
    MovieKeyword,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::User,
        EntityKind::Profile,
        EntityKind::Contract,
        EntityKind::Movie,
        EntityKind::Genre,
        EntityKind::Keyword,
        EntityKind::Viewing,
        EntityKind::MovieGenre,
        EntityKind::MovieKeyword,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Profile => "profiles",
            EntityKind::Contract => "contracts",
            EntityKind::Movie => "movies",
            EntityKind::Genre => "genres",
            EntityKind::Keyword => "keywords",
            EntityKind::Viewing => "viewings",
            EntityKind::MovieGenre => "movie_genres",
            EntityKind::MovieKeyword => "movie_keywords",
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.table_name() == name)
    }

    /// Join tables carry no surrogate identifier.
    pub fn is_association(self) -> bool {
        matches!(self, EntityKind::MovieGenre | EntityKind::MovieKeyword)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Cardinality of a relationship seen from its owning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// Outgoing relationship of a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub target: EntityKind,
    pub cardinality: Cardinality,
    /// Join table for many-to-many relationships.
    pub through: Option<EntityKind>,
}

/// The full set of tables seeded by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    pub name: String,
    pub tables: Vec<Table>,
}

impl Catalog {
    pub fn table(&self, kind: EntityKind) -> Option<&Table> {
        self.tables.iter().find(|table| table.kind == kind)
    }

    pub fn table_named(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }
}

/// Table metadata for one entity kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub kind: EntityKind,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub relationships: Vec<Relationship>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn identity_column(&self) -> Option<&Column> {
        self.columns.iter().find(|column| column.identity)
    }

    /// Columns a record must supply: non-nullable and not store-assigned.
    pub fn required_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|column| !column.is_nullable && !column.identity)
    }

    /// Column sets that must be unique, primary key included.
    pub fn unique_sets(&self) -> Vec<&[String]> {
        self.constraints
            .iter()
            .filter_map(|constraint| match constraint {
                Constraint::PrimaryKey(pk) => Some(pk.columns.as_slice()),
                Constraint::Unique(unique) => Some(unique.columns.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.constraints.iter().filter_map(|constraint| match constraint {
            Constraint::ForeignKey(fk) => Some(fk),
            _ => None,
        })
    }

    pub fn checks(&self) -> impl Iterator<Item = &CheckConstraint> {
        self.constraints.iter().filter_map(|constraint| match constraint {
            Constraint::Check(check) => Some(check),
            _ => None,
        })
    }

    /// Entity kinds whose rows must exist before a row of this table.
    pub fn prerequisites(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self
            .foreign_keys()
            .filter_map(|fk| EntityKind::from_table_name(&fk.referenced_table))
            .filter(|target| *target != self.kind)
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub ordinal_position: i16,
    pub name: String,
    pub column_type: ColumnType,
    pub is_nullable: bool,
    /// Value assigned by the store on insert.
    pub identity: bool,
}
