//! Stage transition engine
//!
//! Moves cases between the stages of their category's catalog and closes
//! them with an outcome. The engine never mutates the caller's record: each
//! operation builds a `CasePatch`, sends it through the `CaseStore` in a
//! single update, and returns the record the store reports back.
//!
//! # Policies
//!
//! - `Advisory` (default): any stage may be targeted, a case may be closed
//!   from any stage. `can_end` and `is_mandatory` are display hints only.
//! - `Strict`: closing requires the current stage to have `can_end`, and a
//!   forward move may not jump over a mandatory stage.

use crate::models::{CaseOutcome, CasePatch, CaseRecord, CaseStatus};
use crate::pipeline::catalog::{CatalogRegistry, PipelineCatalog};
use crate::pipeline::store::CaseStore;
use crate::pipeline::tracker::resolve_stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransitionError {
    #[error("stage '{stage}' is not defined for category '{category}'")]
    InvalidStage { stage: String, category: String },

    #[error("an end reason is required to close a case")]
    MissingEndReason,

    #[error("'{outcome}' is not a final outcome (use won, lost or settled)")]
    InvalidOutcome { outcome: String },

    #[error("case cannot be closed while in stage '{stage}'")]
    EndNotAllowed { stage: String },

    #[error("cannot skip mandatory stage '{stage}'")]
    MandatoryStageSkipped { stage: String },

    #[error("case has not been saved yet")]
    Unsaved,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl TransitionError {
    /// Rejected by validation rather than by the store
    pub fn is_user_error(&self) -> bool {
        !matches!(self, TransitionError::Store(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    #[default]
    Advisory,
    Strict,
}

/// Input of the end-case transition.
/// `Default` is the reset dialog state: settled, no reason, no amount.
#[derive(Debug, Clone, PartialEq)]
pub struct EndCaseRequest {
    pub outcome: CaseOutcome,
    pub reason: String,
    pub final_amount: Option<f64>,
    pub notes: String,
}

impl Default for EndCaseRequest {
    fn default() -> Self {
        Self {
            outcome: CaseOutcome::Settled,
            reason: String::new(),
            final_amount: None,
            notes: String::new(),
        }
    }
}

pub struct TransitionEngine<'a, S: CaseStore + ?Sized> {
    store: &'a S,
    registry: &'a CatalogRegistry,
    policy: TransitionPolicy,
    now: Option<i64>,
}

impl<'a, S: CaseStore + ?Sized> TransitionEngine<'a, S> {
    pub fn new(store: &'a S, registry: &'a CatalogRegistry) -> Self {
        Self { store, registry, policy: TransitionPolicy::Advisory, now: None }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pin the clock used for `stage_entered_ts` / `end_ts`
    pub fn at(mut self, now: i64) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> i64 {
        self.now.unwrap_or_else(|| chrono::Utc::now().timestamp())
    }

    pub fn catalog_for(&self, case: &CaseRecord) -> &'a PipelineCatalog {
        self.registry.get(&case.category)
    }

    /// Move a case to any stage of its catalog. No ordering constraint applies
    /// under the advisory policy.
    pub fn move_to_stage(&self, case: &CaseRecord, target: &str) -> Result<CaseRecord, TransitionError> {
        let id = case.id.ok_or(TransitionError::Unsaved)?;
        let catalog = self.catalog_for(case);
        let target_index = catalog.index_of(target).ok_or_else(|| TransitionError::InvalidStage {
            stage: target.to_string(),
            category: case.category.clone(),
        })?;

        if self.policy == TransitionPolicy::Strict {
            let (current_index, _) = resolve_stage(catalog, case);
            if target_index > current_index + 1 {
                if let Some(skipped) = catalog.stages()[current_index + 1..target_index]
                    .iter()
                    .find(|s| s.is_mandatory)
                {
                    return Err(TransitionError::MandatoryStageSkipped { stage: skipped.id.clone() });
                }
            }
        }

        let patch = CasePatch {
            current_stage: Some(target.to_string()),
            stage_entered_ts: Some(self.now()),
            ..Default::default()
        };
        let updated = self.store.update_case(id, &patch)?;
        log::info!(
            "case {} moved {} -> {}",
            id,
            case.current_stage.as_deref().unwrap_or("-"),
            target
        );
        Ok(updated)
    }

    /// Move to the following stage; `Ok(None)` at the last stage
    pub fn move_next(&self, case: &CaseRecord) -> Result<Option<CaseRecord>, TransitionError> {
        let catalog = self.catalog_for(case);
        let (index, _) = resolve_stage(catalog, case);
        match catalog.get(index + 1) {
            Some(next) => self.move_to_stage(case, &next.id).map(Some),
            None => {
                log::debug!("case {:?} already at last stage", case.id);
                Ok(None)
            }
        }
    }

    /// Move to the preceding stage; `Ok(None)` at the first stage
    pub fn move_previous(&self, case: &CaseRecord) -> Result<Option<CaseRecord>, TransitionError> {
        let catalog = self.catalog_for(case);
        let (index, _) = resolve_stage(catalog, case);
        if index == 0 {
            log::debug!("case {:?} already at first stage", case.id);
            return Ok(None);
        }
        let previous = &catalog.stages()[index - 1];
        self.move_to_stage(case, &previous.id).map(Some)
    }

    /// Close a case with an outcome. The current stage is left as is.
    pub fn end_case(&self, case: &CaseRecord, request: &EndCaseRequest) -> Result<CaseRecord, TransitionError> {
        let id = case.id.ok_or(TransitionError::Unsaved)?;
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(TransitionError::MissingEndReason);
        }
        if !request.outcome.is_decided() {
            return Err(TransitionError::InvalidOutcome { outcome: request.outcome.as_str().to_string() });
        }

        if self.policy == TransitionPolicy::Strict {
            let (_, stage) = resolve_stage(self.catalog_for(case), case);
            if !stage.can_end {
                return Err(TransitionError::EndNotAllowed { stage: stage.id.clone() });
            }
        }

        let patch = CasePatch {
            status: Some(CaseStatus::Closed),
            outcome: Some(request.outcome),
            end_reason: Some(reason.to_string()),
            end_notes: Some(request.notes.clone()),
            final_amount: request.final_amount,
            end_ts: Some(self.now()),
            ..Default::default()
        };
        let updated = self.store.update_case(id, &patch)?;
        log::info!("case {} closed as {} ({})", id, request.outcome.as_str(), reason);
        Ok(updated)
    }
}
