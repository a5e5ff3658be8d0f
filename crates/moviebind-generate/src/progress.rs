//! Observational progress reporting for seeding runs.

use serde::Serialize;
use tracing::{debug, info, warn};

use moviebind_core::EntityId;

/// Notable point reached by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Milestone {
    VocabularyCreated { genres: u64, keywords: u64 },
    UserCreated { index: u32, user_id: EntityId },
    ContractCreated { user_id: EntityId, contract_id: EntityId },
    ViewingCreated { contract_id: EntityId, movie_id: EntityId },
    Committed { rows: u64 },
    RolledBack,
    RollbackFailed { error: String },
    Failed { error: String },
}

/// Receives milestones; must not influence the run.
pub trait ProgressReporter {
    fn report(&mut self, milestone: &Milestone);
}

/// Emits each milestone as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for TracingReporter {
    fn report(&mut self, milestone: &Milestone) {
        match milestone {
            Milestone::VocabularyCreated { genres, keywords } => {
                info!(genres, keywords, "vocabulary created");
            }
            Milestone::UserCreated { index, user_id } => {
                info!(index, user_id = %user_id, "user created");
            }
            Milestone::ContractCreated {
                user_id,
                contract_id,
            } => {
                debug!(user_id = %user_id, contract_id = %contract_id, "contract created");
            }
            Milestone::ViewingCreated {
                contract_id,
                movie_id,
            } => {
                debug!(contract_id = %contract_id, movie_id = %movie_id, "viewing created");
            }
            Milestone::Committed { rows } => info!(rows, "run committed"),
            Milestone::RolledBack => warn!("run rolled back"),
            Milestone::RollbackFailed { error } => warn!(error = %error, "rollback failed"),
            Milestone::Failed { error } => warn!(error = %error, "run failed"),
        }
    }
}

/// Keeps every milestone in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    milestones: Vec<Milestone>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn count(&self, matches: impl Fn(&Milestone) -> bool) -> usize {
        self.milestones.iter().filter(|m| matches(m)).count()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&mut self, milestone: &Milestone) {
        self.milestones.push(milestone.clone());
    }
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for &mut R {
    fn report(&mut self, milestone: &Milestone) {
        (**self).report(milestone);
    }
}
