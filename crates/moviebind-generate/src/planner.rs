use moviebind_core::{Catalog, EntityKind, Error, creation_order};

use crate::errors::GenerationError;
use crate::model::SeedOptions;

/// Order in which the builder first emits each entity kind.
pub const EMISSION_ORDER: [EntityKind; 9] = [
    EntityKind::Genre,
    EntityKind::Keyword,
    EntityKind::User,
    EntityKind::Profile,
    EntityKind::Contract,
    EntityKind::Movie,
    EntityKind::MovieGenre,
    EntityKind::MovieKeyword,
    EntityKind::Viewing,
];

/// Unit of work executed inside the run's transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The shared genre and keyword pool.
    Vocabulary,
    /// One user with its profile, contracts, movies and viewings.
    Subscriber { index: u32 },
}

/// Build the ordered step list for a run.
///
/// Fails when the catalog's foreign keys are cyclic or when a kind would be
/// emitted before one of the tables it references.
pub fn plan_steps(catalog: &Catalog, options: &SeedOptions) -> Result<Vec<Step>, GenerationError> {
    let order = creation_order(catalog)?;
    for kind in &order {
        if !EMISSION_ORDER.contains(kind) {
            return Err(GenerationError::Schema(Error::InvalidSchema(format!(
                "catalog table {kind} has no builder"
            ))));
        }
    }

    for (position, kind) in EMISSION_ORDER.iter().enumerate() {
        let table = catalog.table(*kind).ok_or_else(|| GenerationError::Referential {
            table: kind.table_name().to_string(),
            detail: "table missing from catalog".to_string(),
        })?;
        for parent in table.prerequisites() {
            let emitted_before = EMISSION_ORDER[..position].contains(&parent);
            if !emitted_before {
                return Err(GenerationError::Referential {
                    table: table.name.clone(),
                    detail: format!("emitted before its prerequisite {parent}"),
                });
            }
        }
    }

    let mut steps = Vec::with_capacity(options.users as usize + 1);
    steps.push(Step::Vocabulary);
    steps.extend((0..options.users).map(|index| Step::Subscriber { index }));
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviebind_core::{Constraint, ForeignKey};

    #[test]
    fn vocabulary_comes_first() {
        let options = SeedOptions {
            users: 3,
            ..SeedOptions::default()
        };
        let steps = plan_steps(&Catalog::moviebind(), &options).expect("plan");
        assert_eq!(
            steps,
            vec![
                Step::Vocabulary,
                Step::Subscriber { index: 0 },
                Step::Subscriber { index: 1 },
                Step::Subscriber { index: 2 },
            ]
        );
    }

    #[test]
    fn rejects_parent_emitted_late() {
        let mut catalog = Catalog::moviebind();
        let genres = catalog
            .tables
            .iter_mut()
            .find(|table| table.kind == EntityKind::Genre)
            .expect("genres table");
        genres.constraints.push(Constraint::ForeignKey(ForeignKey {
            name: Some("fk_genres_movie".to_string()),
            columns: vec!["name".to_string()],
            referenced_table: "movies".to_string(),
            referenced_columns: vec!["title".to_string()],
        }));

        let err = plan_steps(&catalog, &SeedOptions::default()).expect_err("genres before movies");
        assert!(matches!(err, GenerationError::Referential { .. }));
    }
}
