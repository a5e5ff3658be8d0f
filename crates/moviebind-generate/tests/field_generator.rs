use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use moviebind_core::{Catalog, EntityKind};
use moviebind_generate::{
    CountRange, FieldGenerator, FieldKind, GenerationError, IntRange, SeedOptions,
};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 10)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .expect("valid timestamp")
}

fn generator(max_attempts: u32) -> FieldGenerator {
    FieldGenerator::new(&Catalog::moviebind(), max_attempts, now())
}

#[test]
fn text_fits_column_length() {
    let fields = generator(50);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let cases = [
        (FieldKind::Handle, EntityKind::User, "handle", 50),
        (FieldKind::Phone, EntityKind::Profile, "phone", 15),
        (FieldKind::NationalId, EntityKind::Profile, "national_id", 20),
        (FieldKind::PostalCode, EntityKind::Contract, "postal_code", 10),
        (FieldKind::AspectRatio, EntityKind::Movie, "aspect_ratio", 10),
        (FieldKind::AgeRating, EntityKind::Movie, "age_rating", 20),
        (FieldKind::Word, EntityKind::Genre, "name", 50),
    ];

    for _ in 0..100 {
        for (kind, entity, column, max) in cases {
            let value = fields
                .text(&mut rng, kind, entity, column)
                .expect("generate text");
            assert!(value.chars().count() <= max, "{entity}.{column}: {value}");
        }
    }
}

#[test]
fn unknown_column_is_a_validation_error() {
    let fields = generator(50);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let err = fields
        .text(&mut rng, FieldKind::Word, EntityKind::Genre, "slug")
        .expect_err("genres.slug does not exist");
    assert!(matches!(err, GenerationError::Validation(_)));
}

#[test]
fn unique_scope_exhausts_small_pool() {
    let mut fields = generator(50);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let mut failure = None;
    for _ in 0..10 {
        if let Err(err) =
            fields.unique_text(&mut rng, FieldKind::AgeRating, EntityKind::Movie, "age_rating")
        {
            failure = Some(err);
            break;
        }
    }

    let err = failure.expect("five ratings cannot yield ten unique values");
    match err {
        GenerationError::Exhausted { scope, attempts } => {
            assert_eq!(scope, "movies.age_rating");
            assert_eq!(attempts, 50);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fields.issued_count(EntityKind::Movie, "age_rating") <= 5);
}

#[test]
fn unique_scopes_are_per_column() {
    let mut fields = generator(50);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    fields
        .unique_text(&mut rng, FieldKind::Word, EntityKind::Genre, "name")
        .expect("genre name");
    fields
        .unique_text(&mut rng, FieldKind::Word, EntityKind::Keyword, "term")
        .expect("keyword term");

    assert_eq!(fields.issued_count(EntityKind::Genre, "name"), 1);
    assert_eq!(fields.issued_count(EntityKind::Keyword, "term"), 1);
    assert_eq!(fields.issued_count(EntityKind::User, "handle"), 0);
}

#[test]
fn numbers_and_money_stay_in_range() {
    let fields = generator(50);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let duration = IntRange::new(80, 180);
    let budget = IntRange::new(1_000_000, 100_000_000);

    for _ in 0..500 {
        assert!(duration.contains(fields.int_in(&mut rng, duration)));
        let amount = fields.money(&mut rng, budget);
        assert_eq!(amount.scale(), 2);
        assert!(amount >= rust_decimal::Decimal::new(1_000_000, 0));
        assert!(amount <= rust_decimal::Decimal::new(100_000_000, 0));
    }
}

#[test]
fn birth_date_matches_age() {
    let fields = generator(50);
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    for age in 18..=60 {
        let born = fields.birth_date(&mut rng, age);
        assert_eq!(now().date().years_since(born), Some(age as u32), "age {age}");
    }
}

#[test]
fn timestamps_fall_in_current_year() {
    let fields = generator(50);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    assert_eq!(fields.year_start().year(), 2024);
    assert_eq!(fields.year_end().ordinal(), 366);

    for _ in 0..200 {
        let at = fields.timestamp_this_year(&mut rng);
        assert!(fields.year_start() <= at && at <= now());
    }
}

#[test]
fn default_options_are_valid() {
    let options = SeedOptions::default();
    options.validate().expect("defaults validate");
    assert_eq!(options.users, 10);
    assert_eq!(options.genres_per_movie, CountRange::new(1, 3));
    assert_eq!(options.max_unique_attempts, 50);
}

#[test]
fn options_reject_sample_larger_than_pool() {
    let options = SeedOptions {
        genre_pool: 2,
        ..SeedOptions::default()
    };
    let err = options.validate().expect_err("three genres from a pool of two");
    assert!(err.to_string().contains("genres_per_movie"));

    let options = SeedOptions {
        contracts_per_user: CountRange::new(0, 2),
        ..SeedOptions::default()
    };
    assert!(options.validate().is_err());

    let options = SeedOptions {
        age: IntRange::new(60, 18),
        ..SeedOptions::default()
    };
    assert!(options.validate().is_err());
}

#[test]
fn options_load_from_toml() {
    let options = SeedOptions::from_toml_str(
        r#"
users = 3
seed = 42
reference_time = "2024-06-15T12:00:00"

[keywords_per_movie]
min = 2
max = 2
"#,
    )
    .expect("parse options");

    assert_eq!(options.users, 3);
    assert_eq!(options.seed, Some(42));
    assert_eq!(options.keywords_per_movie, CountRange::new(2, 2));
    assert_eq!(options.genre_pool, 5);
    assert!(options.reference_time.is_some());

    let zero = SeedOptions::from_toml_str("users = 0").expect("parse zero users");
    let err = zero.validate().expect_err("zero users");
    assert!(matches!(err, GenerationError::InvalidOptions(_)));

    let mut overridden = SeedOptions::from_toml_str("users = 0").expect("parse zero users");
    overridden.users = 4;
    overridden.validate().expect("override fixes user count");
    assert!(SeedOptions::from_toml_str("users = \"many\"").is_err());
}
