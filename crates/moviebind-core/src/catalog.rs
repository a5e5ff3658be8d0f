//! The MovieBind catalog.
//!
//! Column lengths and nullability mirror the production database the seeder
//! targets. Every many-to-one relationship is backed by a foreign key, which is
//! what the creation order is derived from.

use crate::CATALOG_VERSION;
use crate::constraints::{
    CheckConstraint, CheckRule, Constraint, ForeignKey, PrimaryKey, UniqueConstraint,
};
use crate::schema::{Cardinality, Catalog, Column, EntityKind, Relationship, Table};
use crate::types::ColumnType;

/// Name of the seeded database.
pub const CATALOG_NAME: &str = "moviebind";

const fn varchar(max_length: u32) -> ColumnType {
    ColumnType::Varchar { max_length }
}

const MONEY: ColumnType = ColumnType::Numeric {
    precision: 15,
    scale: 2,
};

impl Catalog {
    /// Build the catalog of the movie-subscription schema.
    pub fn moviebind() -> Self {
        let users = TableBuilder::new(EntityKind::User, "Subscriber accounts.")
            .identity("id")
            .column("handle", varchar(50), false)
            .column("credential", varchar(255), false)
            .column("email", varchar(100), false)
            .unique(&["handle"])
            .unique(&["email"])
            .relationship("profile", EntityKind::Profile, Cardinality::OneToOne, None)
            .relationship("contracts", EntityKind::Contract, Cardinality::OneToMany, None)
            .build();

        let profiles = TableBuilder::new(EntityKind::Profile, "Personal data, one per user.")
            .identity("id")
            .references("user_id", EntityKind::User)
            .column("name", varchar(50), true)
            .column("surname", varchar(100), true)
            .column("age", ColumnType::Integer, true)
            .column("phone", varchar(15), true)
            .column("national_id", varchar(20), false)
            .column("birth_date", ColumnType::Date, true)
            .unique(&["user_id"])
            .unique(&["national_id"])
            .check("age", CheckRule::Positive)
            .relationship("user", EntityKind::User, Cardinality::OneToOne, None)
            .build();

        let contracts = TableBuilder::new(EntityKind::Contract, "Subscription contracts.")
            .identity("id")
            .references("user_id", EntityKind::User)
            .column("contract_type", varchar(50), true)
            .column("postal_address", varchar(255), true)
            .column("city", varchar(100), true)
            .column("postal_code", varchar(10), true)
            .column("country", varchar(50), true)
            .column("starts_at", ColumnType::Timestamp, true)
            .column("ends_at", ColumnType::Timestamp, true)
            .relationship("user", EntityKind::User, Cardinality::ManyToOne, None)
            .relationship("viewings", EntityKind::Viewing, Cardinality::OneToMany, None)
            .build();

        let movies = TableBuilder::new(EntityKind::Movie, "Movie catalogue.")
            .identity("id")
            .column("title", varchar(255), false)
            .column("director", varchar(100), true)
            .column("cast_members", ColumnType::Text, true)
            .column("duration_minutes", ColumnType::Integer, true)
            .column("is_color", ColumnType::Boolean, true)
            .column("aspect_ratio", varchar(10), true)
            .column("release_year", ColumnType::Integer, true)
            .column("age_rating", varchar(20), true)
            .column("country", varchar(50), true)
            .column("original_language", varchar(50), true)
            .column("budget", MONEY, true)
            .column("gross_revenue", MONEY, true)
            .column("imdb_link", varchar(255), true)
            .check("duration_minutes", CheckRule::Positive)
            .check("budget", CheckRule::NonNegative)
            .check("gross_revenue", CheckRule::NonNegative)
            .relationship(
                "genres",
                EntityKind::Genre,
                Cardinality::ManyToMany,
                Some(EntityKind::MovieGenre),
            )
            .relationship(
                "keywords",
                EntityKind::Keyword,
                Cardinality::ManyToMany,
                Some(EntityKind::MovieKeyword),
            )
            .relationship("viewings", EntityKind::Viewing, Cardinality::OneToMany, None)
            .build();

        let genres = TableBuilder::new(EntityKind::Genre, "Genre vocabulary.")
            .identity("id")
            .column("name", varchar(50), false)
            .unique(&["name"])
            .relationship(
                "movies",
                EntityKind::Movie,
                Cardinality::ManyToMany,
                Some(EntityKind::MovieGenre),
            )
            .build();

        let keywords = TableBuilder::new(EntityKind::Keyword, "Keyword vocabulary.")
            .identity("id")
            .column("term", varchar(50), false)
            .unique(&["term"])
            .relationship(
                "movies",
                EntityKind::Movie,
                Cardinality::ManyToMany,
                Some(EntityKind::MovieKeyword),
            )
            .build();

        let viewings = TableBuilder::new(EntityKind::Viewing, "Movies watched under a contract.")
            .identity("id")
            .references("contract_id", EntityKind::Contract)
            .references("movie_id", EntityKind::Movie)
            .column("viewed_at", ColumnType::Timestamp, true)
            .relationship("contract", EntityKind::Contract, Cardinality::ManyToOne, None)
            .relationship("movie", EntityKind::Movie, Cardinality::ManyToOne, None)
            .build();

        let movie_genres = TableBuilder::new(EntityKind::MovieGenre, "Movie to genre links.")
            .references("movie_id", EntityKind::Movie)
            .references("genre_id", EntityKind::Genre)
            .primary_key(&["movie_id", "genre_id"])
            .build();

        let movie_keywords = TableBuilder::new(EntityKind::MovieKeyword, "Movie to keyword links.")
            .references("movie_id", EntityKind::Movie)
            .references("keyword_id", EntityKind::Keyword)
            .primary_key(&["movie_id", "keyword_id"])
            .build();

        Catalog {
            version: CATALOG_VERSION.to_string(),
            name: CATALOG_NAME.to_string(),
            tables: vec![
                users,
                profiles,
                contracts,
                movies,
                genres,
                keywords,
                viewings,
                movie_genres,
                movie_keywords,
            ],
        }
    }
}

struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    fn new(kind: EntityKind, comment: &str) -> Self {
        Self {
            table: Table {
                name: kind.table_name().to_string(),
                kind,
                comment: Some(comment.to_string()),
                columns: Vec::new(),
                constraints: Vec::new(),
                relationships: Vec::new(),
            },
        }
    }

    fn push_column(&mut self, name: &str, column_type: ColumnType, nullable: bool, identity: bool) {
        let ordinal_position = i16::try_from(self.table.columns.len() + 1).unwrap_or(i16::MAX);
        self.table.columns.push(Column {
            ordinal_position,
            name: name.to_string(),
            column_type,
            is_nullable: nullable,
            identity,
        });
    }

    fn identity(mut self, name: &str) -> Self {
        self.push_column(name, ColumnType::BigInt, false, true);
        self.primary_key(&[name])
    }

    fn column(mut self, name: &str, column_type: ColumnType, nullable: bool) -> Self {
        self.push_column(name, column_type, nullable, false);
        self
    }

    fn references(mut self, name: &str, target: EntityKind) -> Self {
        self.push_column(name, ColumnType::BigInt, false, false);
        let fk_name = format!("fk_{}_{}", self.table.name, name);
        self.table.constraints.push(Constraint::ForeignKey(ForeignKey {
            name: Some(fk_name),
            columns: vec![name.to_string()],
            referenced_table: target.table_name().to_string(),
            referenced_columns: vec!["id".to_string()],
        }));
        self
    }

    fn primary_key(mut self, columns: &[&str]) -> Self {
        self.table.constraints.push(Constraint::PrimaryKey(PrimaryKey {
            name: Some(format!("pk_{}", self.table.name)),
            columns: columns.iter().map(|column| column.to_string()).collect(),
        }));
        self
    }

    fn unique(mut self, columns: &[&str]) -> Self {
        let name = format!("uq_{}_{}", self.table.name, columns.join("_"));
        self.table.constraints.push(Constraint::Unique(UniqueConstraint {
            name: Some(name),
            columns: columns.iter().map(|column| column.to_string()).collect(),
        }));
        self
    }

    fn check(mut self, column: &str, rule: CheckRule) -> Self {
        let name = format!("ck_{}_{}", self.table.name, column);
        self.table.constraints.push(Constraint::Check(CheckConstraint {
            name: Some(name),
            column: column.to_string(),
            rule,
        }));
        self
    }

    fn relationship(
        mut self,
        name: &str,
        target: EntityKind,
        cardinality: Cardinality,
        through: Option<EntityKind>,
    ) -> Self {
        self.table.relationships.push(Relationship {
            name: name.to_string(),
            target,
            cardinality,
            through,
        });
        self
    }

    fn build(self) -> Table {
        self.table
    }
}
