//! Dependency-ordered construction of the MovieBind graph.
//!
//! Every step stages records through the run's [`Session`] and flushes before
//! a child needs its parent's identifier. Steps return what they created and
//! never swallow errors.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use moviebind_core::{
    Contract, EntityId, EntityKind, Genre, Keyword, Movie, MovieGenre, MovieKeyword, Profile,
    User, Viewing,
};

use crate::errors::GenerationError;
use crate::generators::{FieldGenerator, FieldKind};
use crate::model::{CountRange, SeedOptions, StepOutcome};
use crate::planner::Step;
use crate::progress::{Milestone, ProgressReporter};
use crate::session::Session;
use crate::store::Store;

/// Everything a run needs, built at run start and dropped at its end.
pub struct RunContext<'a, S: Store + ?Sized> {
    pub session: Session<'a, S>,
    pub fields: FieldGenerator,
    pub rng: ChaCha8Rng,
    pub reporter: &'a mut dyn ProgressReporter,
    pub options: &'a SeedOptions,
    vocabulary: Option<Vocabulary>,
}

/// Identifiers of the shared genre and keyword pool.
#[derive(Debug, Clone, Default)]
struct Vocabulary {
    genres: Vec<EntityId>,
    keywords: Vec<EntityId>,
}

impl<'a, S: Store + ?Sized> RunContext<'a, S> {
    pub fn new(
        session: Session<'a, S>,
        fields: FieldGenerator,
        rng: ChaCha8Rng,
        reporter: &'a mut dyn ProgressReporter,
        options: &'a SeedOptions,
    ) -> Self {
        Self {
            session,
            fields,
            rng,
            reporter,
            options,
            vocabulary: None,
        }
    }

    /// Run one planned step.
    pub fn execute(&mut self, step: Step) -> Result<StepOutcome, GenerationError> {
        match step {
            Step::Vocabulary => self.build_vocabulary(),
            Step::Subscriber { index } => self.build_subscriber(index),
        }
    }

    /// Tear the context down, handing back the open session and reporter.
    pub fn into_parts(self) -> (Session<'a, S>, &'a mut dyn ProgressReporter) {
        (self.session, self.reporter)
    }

    fn build_vocabulary(&mut self) -> Result<StepOutcome, GenerationError> {
        let mut outcome = StepOutcome::default();

        let mut genres = Vec::with_capacity(self.options.genre_pool as usize);
        for _ in 0..self.options.genre_pool {
            let name =
                self.fields
                    .unique_text(&mut self.rng, FieldKind::Word, EntityKind::Genre, "name")?;
            genres.push(self.session.stage(Genre { name })?);
        }

        let mut keywords = Vec::with_capacity(self.options.keyword_pool as usize);
        for _ in 0..self.options.keyword_pool {
            let term = self.fields.unique_text(
                &mut self.rng,
                FieldKind::Word,
                EntityKind::Keyword,
                "term",
            )?;
            keywords.push(self.session.stage(Keyword { term })?);
        }

        self.session.flush()?;

        let vocabulary = Vocabulary {
            genres: genres
                .into_iter()
                .map(|handle| self.session.id(handle))
                .collect::<Result<_, _>>()?,
            keywords: keywords
                .into_iter()
                .map(|handle| self.session.id(handle))
                .collect::<Result<_, _>>()?,
        };
        for _ in &vocabulary.genres {
            outcome.record(EntityKind::Genre);
        }
        for _ in &vocabulary.keywords {
            outcome.record(EntityKind::Keyword);
        }

        self.reporter.report(&Milestone::VocabularyCreated {
            genres: outcome.count(EntityKind::Genre),
            keywords: outcome.count(EntityKind::Keyword),
        });
        self.vocabulary = Some(vocabulary);
        Ok(outcome)
    }

    fn build_subscriber(&mut self, index: u32) -> Result<StepOutcome, GenerationError> {
        let mut outcome = StepOutcome::default();

        let user = User {
            handle: self.fields.unique_text(
                &mut self.rng,
                FieldKind::Handle,
                EntityKind::User,
                "handle",
            )?,
            credential: self.fields.text(
                &mut self.rng,
                FieldKind::Credential,
                EntityKind::User,
                "credential",
            )?,
            email: self.fields.unique_text(
                &mut self.rng,
                FieldKind::Email,
                EntityKind::User,
                "email",
            )?,
        };
        let user = self.session.stage(user)?;
        self.session.flush()?;
        let user_id = self.session.id(user)?;
        outcome.record(EntityKind::User);
        self.reporter
            .report(&Milestone::UserCreated { index, user_id });

        let profile = self.profile(user_id)?;
        self.session.stage(profile)?;
        outcome.record(EntityKind::Profile);

        let contracts = draw_count(&mut self.rng, self.options.contracts_per_user);
        for _ in 0..contracts {
            let contract = self.contract(user_id)?;
            let starts_at = contract.starts_at;
            let contract = self.session.stage(contract)?;
            self.session.flush()?;
            let contract_id = self.session.id(contract)?;
            outcome.record(EntityKind::Contract);
            self.reporter.report(&Milestone::ContractCreated {
                user_id,
                contract_id,
            });

            let movies = draw_count(&mut self.rng, self.options.movies_per_contract);
            for _ in 0..movies {
                let movie = self.movie()?;
                let movie = self.session.stage(movie)?;
                self.session.flush()?;
                let movie_id = self.session.id(movie)?;
                outcome.record(EntityKind::Movie);

                let vocabulary = self.vocabulary.as_ref().ok_or_else(|| {
                    GenerationError::Referential {
                        table: EntityKind::MovieGenre.table_name().to_string(),
                        detail: "vocabulary has not been created".to_string(),
                    }
                })?;
                let genre_count = draw_count(&mut self.rng, self.options.genres_per_movie);
                let genres = sample_distinct(&mut self.rng, &vocabulary.genres, genre_count);
                let keyword_count = draw_count(&mut self.rng, self.options.keywords_per_movie);
                let keywords = sample_distinct(&mut self.rng, &vocabulary.keywords, keyword_count);

                for genre_id in genres {
                    self.session.stage(MovieGenre { movie_id, genre_id })?;
                    outcome.record(EntityKind::MovieGenre);
                }
                for keyword_id in keywords {
                    self.session.stage(MovieKeyword {
                        movie_id,
                        keyword_id,
                    })?;
                    outcome.record(EntityKind::MovieKeyword);
                }

                let viewed_at =
                    self.fields
                        .timestamp_between(&mut self.rng, starts_at, self.fields.now());
                self.session.stage(Viewing {
                    contract_id,
                    movie_id,
                    viewed_at,
                })?;
                self.session.flush()?;
                outcome.record(EntityKind::Viewing);
                self.reporter.report(&Milestone::ViewingCreated {
                    contract_id,
                    movie_id,
                });
            }
        }

        self.session.flush()?;
        Ok(outcome)
    }

    fn profile(&mut self, user_id: EntityId) -> Result<Profile, GenerationError> {
        let kind = EntityKind::Profile;
        let age = self.fields.int_in(&mut self.rng, self.options.age);
        Ok(Profile {
            user_id,
            name: self
                .fields
                .text(&mut self.rng, FieldKind::FirstName, kind, "name")?,
            surname: self
                .fields
                .text(&mut self.rng, FieldKind::Surname, kind, "surname")?,
            age,
            phone: self.fields.text(&mut self.rng, FieldKind::Phone, kind, "phone")?,
            national_id: self.fields.unique_text(
                &mut self.rng,
                FieldKind::NationalId,
                kind,
                "national_id",
            )?,
            birth_date: self.fields.birth_date(&mut self.rng, age),
        })
    }

    fn contract(&mut self, user_id: EntityId) -> Result<Contract, GenerationError> {
        let kind = EntityKind::Contract;
        let starts_at = self.fields.timestamp_this_year(&mut self.rng);
        let ends_at = self
            .fields
            .timestamp_between(&mut self.rng, starts_at, self.fields.year_end());
        Ok(Contract {
            user_id,
            contract_type: self.fields.text(
                &mut self.rng,
                FieldKind::ContractType,
                kind,
                "contract_type",
            )?,
            postal_address: self.fields.text(
                &mut self.rng,
                FieldKind::StreetAddress,
                kind,
                "postal_address",
            )?,
            city: self.fields.text(&mut self.rng, FieldKind::City, kind, "city")?,
            postal_code: self
                .fields
                .text(&mut self.rng, FieldKind::PostalCode, kind, "postal_code")?,
            country: self
                .fields
                .text(&mut self.rng, FieldKind::Country, kind, "country")?,
            starts_at,
            ends_at,
        })
    }

    fn movie(&mut self) -> Result<Movie, GenerationError> {
        let kind = EntityKind::Movie;
        let rng = &mut self.rng;
        let fields = &self.fields;
        let options = self.options;
        Ok(Movie {
            title: fields.text(rng, FieldKind::Title, kind, "title")?,
            director: fields.text(rng, FieldKind::FullName, kind, "director")?,
            cast_members: fields.text(rng, FieldKind::CastList, kind, "cast_members")?,
            duration_minutes: fields.int_in(rng, options.duration_minutes),
            is_color: fields.flag(rng),
            aspect_ratio: fields.text(rng, FieldKind::AspectRatio, kind, "aspect_ratio")?,
            release_year: fields.int_in(rng, options.release_year),
            age_rating: fields.text(rng, FieldKind::AgeRating, kind, "age_rating")?,
            country: fields.text(rng, FieldKind::Country, kind, "country")?,
            original_language: fields.text(rng, FieldKind::Language, kind, "original_language")?,
            budget: fields.money(rng, options.budget),
            gross_revenue: fields.money(rng, options.revenue),
            imdb_link: fields.text(rng, FieldKind::ImdbLink, kind, "imdb_link")?,
        })
    }
}

/// Uniform draw from an inclusive count range.
pub fn draw_count<R: Rng + ?Sized>(rng: &mut R, range: CountRange) -> usize {
    rng.random_range(range.min..=range.max) as usize
}

/// `count` distinct items of `pool`, sampled without replacement.
///
/// Runs the first `count` rounds of a Fisher-Yates shuffle over a copy of the
/// pool, so the result depends only on the pool order and the rng state.
pub fn sample_distinct<T: Copy, R: Rng + ?Sized>(rng: &mut R, pool: &[T], count: usize) -> Vec<T> {
    let mut items = pool.to_vec();
    let count = count.min(items.len());
    for i in 0..count {
        let j = rng.random_range(i..items.len());
        items.swap(i, j);
    }
    items.truncate(count);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn sample_is_distinct_and_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let pool: Vec<u32> = (1..=5).collect();
        for count in 0..=7 {
            let sample = sample_distinct(&mut rng, &pool, count);
            assert_eq!(sample.len(), count.min(pool.len()));
            let unique: HashSet<_> = sample.iter().collect();
            assert_eq!(unique.len(), sample.len());
            assert!(sample.iter().all(|item| pool.contains(item)));
        }
    }

    #[test]
    fn sample_is_reproducible() {
        let pool: Vec<u32> = (0..10).collect();
        let first = sample_distinct(&mut ChaCha8Rng::seed_from_u64(42), &pool, 3);
        let second = sample_distinct(&mut ChaCha8Rng::seed_from_u64(42), &pool, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn draw_count_stays_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let range = CountRange::new(1, 3);
        for _ in 0..200 {
            assert!(range.contains(draw_count(&mut rng, range)));
        }
    }
}
