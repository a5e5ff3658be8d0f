use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, CountryName, StreetName, ZipCode};
use fake::faker::internet::en::{Password, SafeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use rand::Rng;

use super::FieldKind;

const CONTRACT_TYPES: &[&str] = &["monthly", "annual", "family", "student", "premium"];
const ASPECT_RATIOS: &[&str] = &["16:9", "4:3", "1.85:1", "2.39:1"];
const AGE_RATINGS: &[&str] = &["G", "PG", "PG-13", "R", "NC-17"];
const LANGUAGES: &[&str] = &[
    "English", "Spanish", "French", "German", "Italian", "Japanese", "Korean", "Portuguese",
    "Mandarin", "Hindi", "Swedish", "Danish",
];

/// Raw text for a field kind, before column limits are applied.
pub(super) fn text<R: Rng + ?Sized>(kind: FieldKind, rng: &mut R) -> String {
    match kind {
        FieldKind::Handle => Username().fake_with_rng(rng),
        FieldKind::Credential => Password(12..25).fake_with_rng(rng),
        FieldKind::Email => SafeEmail().fake_with_rng(rng),
        FieldKind::FirstName => FirstName().fake_with_rng(rng),
        FieldKind::Surname => LastName().fake_with_rng(rng),
        FieldKind::FullName => Name().fake_with_rng(rng),
        FieldKind::CastList => {
            let count = rng.random_range(2..=4);
            (0..count)
                .map(|_| Name().fake_with_rng::<String, _>(rng))
                .collect::<Vec<_>>()
                .join(", ")
        }
        FieldKind::Phone => digits(rng, 11),
        FieldKind::NationalId => format!(
            "{}-{}-{}",
            digits(rng, 3),
            digits(rng, 2),
            digits(rng, 4)
        ),
        FieldKind::Word => Word().fake_with_rng(rng),
        FieldKind::Title => {
            let sentence: String = Sentence(2..5).fake_with_rng(rng);
            sentence.trim_end_matches('.').to_string()
        }
        FieldKind::ContractType => pick(CONTRACT_TYPES, rng),
        FieldKind::StreetAddress => {
            let number: String = BuildingNumber().fake_with_rng(rng);
            let street: String = StreetName().fake_with_rng(rng);
            format!("{number} {street}")
        }
        FieldKind::City => CityName().fake_with_rng(rng),
        FieldKind::PostalCode => ZipCode().fake_with_rng(rng),
        FieldKind::Country => CountryName().fake_with_rng(rng),
        FieldKind::Language => pick(LANGUAGES, rng),
        FieldKind::AspectRatio => pick(ASPECT_RATIOS, rng),
        FieldKind::AgeRating => pick(AGE_RATINGS, rng),
        FieldKind::ImdbLink => format!("https://www.imdb.com/title/tt{}/", digits(rng, 7)),
    }
}

fn digits<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10_u8)))
        .collect()
}

fn pick<R: Rng + ?Sized>(values: &[&str], rng: &mut R) -> String {
    let index = rng.random_range(0..values.len());
    values.get(index).copied().unwrap_or_default().to_string()
}
