use chrono::NaiveDate;
use rust_decimal::Decimal;

use moviebind_core::{
    Catalog, ColumnType, EntityId, EntityKind, Error, FieldValue, Genre, Movie, Profile, Record,
    ValidationReason, validate_catalog, validate_values,
};

fn movie() -> Movie {
    Movie {
        title: "The Quiet Harbor".to_string(),
        director: "Ada Brooks".to_string(),
        cast_members: "Lena Ortiz".to_string(),
        duration_minutes: 112,
        is_color: true,
        aspect_ratio: "16:9".to_string(),
        release_year: 1999,
        age_rating: "general".to_string(),
        country: "Canada".to_string(),
        original_language: "English".to_string(),
        budget: Decimal::new(1_250_000_00, 2),
        gross_revenue: Decimal::new(9_870_000_55, 2),
        imdb_link: "https://www.imdb.com/title/tt0000001/".to_string(),
    }
}

#[test]
fn moviebind_catalog_is_consistent() {
    let catalog = Catalog::moviebind();
    validate_catalog(&catalog).expect("catalog validates");
    assert_eq!(catalog.tables.len(), EntityKind::ALL.len());

    for kind in EntityKind::ALL {
        let table = catalog.table(kind).expect("table for every kind");
        assert_eq!(table.name, kind.table_name());
        assert_eq!(table.identity_column().is_none(), kind.is_association());
    }
}

#[test]
fn exposes_prerequisites_and_required_fields() {
    let catalog = Catalog::moviebind();

    let viewings = catalog.table(EntityKind::Viewing).expect("viewings");
    assert_eq!(
        viewings.prerequisites(),
        vec![EntityKind::Contract, EntityKind::Movie]
    );

    let users = catalog.table(EntityKind::User).expect("users");
    assert!(users.prerequisites().is_empty());
    let required: Vec<&str> = users
        .required_columns()
        .map(|column| column.name.as_str())
        .collect();
    assert_eq!(required, vec!["handle", "credential", "email"]);

    let profiles = catalog.table(EntityKind::Profile).expect("profiles");
    assert_eq!(
        profiles.column("national_id").map(|c| c.column_type),
        Some(ColumnType::Varchar { max_length: 20 })
    );
    assert!(
        profiles
            .unique_sets()
            .iter()
            .any(|set| *set == ["user_id".to_string()])
    );
}

#[test]
fn detects_dangling_foreign_key() {
    let mut catalog = Catalog::moviebind();
    catalog.tables.retain(|table| table.kind != EntityKind::Genre);

    let err = validate_catalog(&catalog).expect_err("genres table is missing");
    assert!(matches!(err, Error::InvalidSchema(message) if message.contains("genres")));
}

#[test]
fn accepts_well_formed_movie() {
    let catalog = Catalog::moviebind();
    let record = Record::validated(&catalog, movie()).expect("valid movie");
    assert_eq!(record.kind(), EntityKind::Movie);
    assert_eq!(
        record.get("duration_minutes"),
        Some(&FieldValue::Int(112))
    );
}

#[test]
fn rejects_negative_budget_and_extra_scale() {
    let catalog = Catalog::moviebind();

    let mut negative = movie();
    negative.budget = Decimal::new(-1, 2);
    let err = Record::validated(&catalog, negative).expect_err("negative budget");
    assert_eq!(err.field(), "movies.budget");
    assert_eq!(err.reason, ValidationReason::Negative);

    let mut precise = movie();
    precise.gross_revenue = Decimal::new(1_000_001, 3);
    let err = Record::validated(&catalog, precise).expect_err("three decimals");
    assert_eq!(err.field(), "movies.gross_revenue");
    assert_eq!(err.reason, ValidationReason::Scale { max: 2, actual: 3 });
}

#[test]
fn rejects_non_positive_duration() {
    let catalog = Catalog::moviebind();
    let mut movie = movie();
    movie.duration_minutes = 0;

    let err = Record::validated(&catalog, movie).expect_err("zero duration");
    assert_eq!(err.field(), "movies.duration_minutes");
    assert_eq!(err.reason, ValidationReason::NotPositive);
}

#[test]
fn rejects_type_mismatch_and_missing_values() {
    let catalog = Catalog::moviebind();
    let genres = catalog.table(EntityKind::Genre).expect("genres");

    let err = validate_values(genres, &[("name", FieldValue::Int(4))]).expect_err("int name");
    assert_eq!(
        err.reason,
        ValidationReason::TypeMismatch {
            expected: "varchar",
            found: "integer"
        }
    );

    let err = validate_values(genres, &[]).expect_err("name missing");
    assert_eq!(err.field(), "genres.name");
    assert_eq!(err.reason, ValidationReason::Missing);

    let err = validate_values(genres, &[("id", FieldValue::Int(1))]).expect_err("identity");
    assert_eq!(err.reason, ValidationReason::IdentityAssigned);

    let err = validate_values(genres, &[("colour", FieldValue::Null)]).expect_err("unknown");
    assert_eq!(err.reason, ValidationReason::UnknownColumn);
}

#[test]
fn counts_characters_not_bytes() {
    let catalog = Catalog::moviebind();
    let genre = Genre {
        name: "é".repeat(50),
    };
    Record::validated(&catalog, genre).expect("fifty characters fit");

    let profile = Profile {
        user_id: EntityId(1),
        name: "Zoë".to_string(),
        surname: "Brontë".to_string(),
        age: 30,
        phone: "5551234567".to_string(),
        national_id: "123-45-6789".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1994, 5, 17).expect("valid date"),
    };
    Record::validated(&catalog, profile).expect("valid profile");
}

#[test]
fn serializes_catalog_with_tagged_types() {
    let catalog = Catalog::moviebind();
    let json = serde_json::to_value(&catalog).expect("serialize catalog");

    let users = &json["tables"][0];
    assert_eq!(users["name"], "users");
    assert_eq!(users["kind"], "user");
    assert_eq!(users["columns"][1]["name"], "handle");
    assert_eq!(users["columns"][1]["column_type"]["kind"], "varchar");
    assert_eq!(users["columns"][1]["column_type"]["max_length"], 50);
    assert_eq!(users["constraints"][0]["kind"], "primary_key");
}
