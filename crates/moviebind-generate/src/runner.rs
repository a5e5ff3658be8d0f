use std::time::Instant;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, info_span, warn};

use moviebind_core::{Catalog, validate_catalog};

use crate::builder::RunContext;
use crate::errors::GenerationError;
use crate::generators::FieldGenerator;
use crate::model::{SeedOptions, SeedReport, StepOutcome, TableReport};
use crate::planner::{EMISSION_ORDER, plan_steps};
use crate::progress::{Milestone, ProgressReporter};
use crate::session::Session;
use crate::store::Store;

/// Runs a whole seeding batch inside one store transaction.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    options: SeedOptions,
    catalog: Catalog,
}

impl BatchRunner {
    pub fn new(options: SeedOptions) -> Self {
        Self::with_catalog(options, Catalog::moviebind())
    }

    pub fn with_catalog(options: SeedOptions, catalog: Catalog) -> Self {
        Self { options, catalog }
    }

    /// Build every record and commit them together.
    ///
    /// Any step failure rolls the transaction back, so the store ends up as it
    /// was before the call. The original error is returned even when the
    /// rollback itself fails.
    pub fn run<S: Store + ?Sized>(
        &self,
        store: &mut S,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<SeedReport, GenerationError> {
        self.options.validate()?;
        validate_catalog(&self.catalog)?;
        let steps = plan_steps(&self.catalog, &self.options)?;

        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let seed = self.options.seed.unwrap_or_else(rand::random);
        let now = self.options.reference_time.unwrap_or_else(reference_now);
        let _span = info_span!("seed_run", run_id = %run_id).entered();

        info!(
            run_id = %run_id,
            seed,
            users = self.options.users,
            steps = steps.len(),
            "seeding started"
        );

        let session = match Session::begin(store, &self.catalog) {
            Ok(session) => session,
            Err(err) => {
                reporter.report(&Milestone::Failed {
                    error: err.to_string(),
                });
                warn!(run_id = %run_id, error = %err, "seeding failed");
                return Err(err);
            }
        };

        let fields = FieldGenerator::new(&self.catalog, self.options.max_unique_attempts, now);
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ctx = RunContext::new(session, fields, rng, reporter, &self.options);

        let mut totals = StepOutcome::default();
        let outcome = steps.iter().try_for_each(|step| {
            let created = ctx.execute(*step)?;
            totals.merge(created);
            Ok::<_, GenerationError>(())
        });

        let (session, reporter) = ctx.into_parts();
        let (err, session) = match outcome {
            Ok(()) => match session.commit() {
                Ok(()) => {
                    let report = SeedReport {
                        run_id,
                        seed,
                        reference_time: now,
                        steps: steps.len(),
                        tables: EMISSION_ORDER
                            .iter()
                            .map(|kind| TableReport {
                                table: kind.table_name().to_string(),
                                rows: totals.count(*kind),
                            })
                            .collect(),
                        duration_ms: start.elapsed().as_millis() as u64,
                    };
                    reporter.report(&Milestone::Committed {
                        rows: report.total_rows(),
                    });
                    info!(
                        run_id = %report.run_id,
                        rows = report.total_rows(),
                        duration_ms = report.duration_ms,
                        "seeding completed"
                    );
                    return Ok(report);
                }
                Err(failure) => failure,
            },
            Err(err) => (err, session),
        };

        match session.rollback() {
            Ok(()) => reporter.report(&Milestone::RolledBack),
            Err(rollback_err) => {
                warn!(run_id = %run_id, error = %rollback_err, "rollback failed");
                reporter.report(&Milestone::RollbackFailed {
                    error: rollback_err.to_string(),
                });
            }
        }
        reporter.report(&Milestone::Failed {
            error: err.to_string(),
        });
        warn!(
            run_id = %run_id,
            error = %err,
            duration_ms = start.elapsed().as_millis() as u64,
            "seeding failed"
        );
        Err(err)
    }
}

fn reference_now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}
