//! Typed entity records.
//!
//! Children carry their parents' resolved [`EntityId`]s as plain values. A
//! [`Record`] can only be obtained through [`Record::validated`], so anything
//! handed to a store has already been checked against the catalog.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::{ValidationError, ValidationReason};
use crate::schema::{Catalog, EntityKind};
use crate::types::{EntityId, FieldValue};
use crate::validation::validate_values;

/// A typed entity that can be flattened into catalog columns.
pub trait Entity {
    const KIND: EntityKind;

    fn into_values(self) -> Vec<(&'static str, FieldValue)>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub handle: String,
    pub credential: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: EntityId,
    pub name: String,
    pub surname: String,
    pub age: i64,
    pub phone: String,
    pub national_id: String,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub user_id: EntityId,
    pub contract_type: String,
    pub postal_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub title: String,
    pub director: String,
    pub cast_members: String,
    pub duration_minutes: i64,
    pub is_color: bool,
    pub aspect_ratio: String,
    pub release_year: i64,
    pub age_rating: String,
    pub country: String,
    pub original_language: String,
    pub budget: Decimal,
    pub gross_revenue: Decimal,
    pub imdb_link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub term: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewing {
    pub contract_id: EntityId,
    pub movie_id: EntityId,
    pub viewed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieGenre {
    pub movie_id: EntityId,
    pub genre_id: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieKeyword {
    pub movie_id: EntityId,
    pub keyword_id: EntityId,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("handle", self.handle.into()),
            ("credential", self.credential.into()),
            ("email", self.email.into()),
        ]
    }
}

impl Entity for Profile {
    const KIND: EntityKind = EntityKind::Profile;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("user_id", self.user_id.into()),
            ("name", self.name.into()),
            ("surname", self.surname.into()),
            ("age", self.age.into()),
            ("phone", self.phone.into()),
            ("national_id", self.national_id.into()),
            ("birth_date", self.birth_date.into()),
        ]
    }
}

impl Entity for Contract {
    const KIND: EntityKind = EntityKind::Contract;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("user_id", self.user_id.into()),
            ("contract_type", self.contract_type.into()),
            ("postal_address", self.postal_address.into()),
            ("city", self.city.into()),
            ("postal_code", self.postal_code.into()),
            ("country", self.country.into()),
            ("starts_at", self.starts_at.into()),
            ("ends_at", self.ends_at.into()),
        ]
    }
}

impl Entity for Movie {
    const KIND: EntityKind = EntityKind::Movie;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("title", self.title.into()),
            ("director", self.director.into()),
            ("cast_members", self.cast_members.into()),
            ("duration_minutes", self.duration_minutes.into()),
            ("is_color", self.is_color.into()),
            ("aspect_ratio", self.aspect_ratio.into()),
            ("release_year", self.release_year.into()),
            ("age_rating", self.age_rating.into()),
            ("country", self.country.into()),
            ("original_language", self.original_language.into()),
            ("budget", self.budget.into()),
            ("gross_revenue", self.gross_revenue.into()),
            ("imdb_link", self.imdb_link.into()),
        ]
    }
}

impl Entity for Genre {
    const KIND: EntityKind = EntityKind::Genre;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![("name", self.name.into())]
    }
}

impl Entity for Keyword {
    const KIND: EntityKind = EntityKind::Keyword;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![("term", self.term.into())]
    }
}

impl Entity for Viewing {
    const KIND: EntityKind = EntityKind::Viewing;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("contract_id", self.contract_id.into()),
            ("movie_id", self.movie_id.into()),
            ("viewed_at", self.viewed_at.into()),
        ]
    }
}

impl Entity for MovieGenre {
    const KIND: EntityKind = EntityKind::MovieGenre;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("movie_id", self.movie_id.into()),
            ("genre_id", self.genre_id.into()),
        ]
    }
}

impl Entity for MovieKeyword {
    const KIND: EntityKind = EntityKind::MovieKeyword;

    fn into_values(self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("movie_id", self.movie_id.into()),
            ("keyword_id", self.keyword_id.into()),
        ]
    }
}

/// A validated row ready to be written to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: EntityKind,
    values: Vec<(&'static str, FieldValue)>,
}

impl Record {
    /// Flatten `entity` and check every value against its catalog column.
    pub fn validated<E: Entity>(catalog: &Catalog, entity: E) -> Result<Self, ValidationError> {
        let table = catalog.table(E::KIND).ok_or_else(|| {
            ValidationError::new(E::KIND.table_name(), "*", ValidationReason::UnknownColumn)
        })?;
        let values = entity.into_values();
        validate_values(table, &values)?;
        Ok(Self {
            kind: E::KIND,
            values,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn values(&self) -> &[(&'static str, FieldValue)] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn get_id(&self, column: &str) -> Option<EntityId> {
        self.get(column).and_then(FieldValue::as_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlong_handle() {
        let catalog = Catalog::moviebind();
        let user = User {
            handle: "h".repeat(51),
            credential: "secret".to_string(),
            email: "a@example.com".to_string(),
        };

        let err = Record::validated(&catalog, user).expect_err("handle is too long");
        assert_eq!(err.field(), "users.handle");
        assert_eq!(
            err.reason,
            ValidationReason::TooLong {
                max: 50,
                actual: 51
            }
        );
    }

    #[test]
    fn accepts_join_row() {
        let catalog = Catalog::moviebind();
        let link = MovieGenre {
            movie_id: EntityId(3),
            genre_id: EntityId(1),
        };

        let record = Record::validated(&catalog, link).expect("valid join row");
        assert_eq!(record.kind(), EntityKind::MovieGenre);
        assert_eq!(record.get_id("genre_id"), Some(EntityId(1)));
    }
}
