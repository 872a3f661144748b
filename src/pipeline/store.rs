use crate::models::{CasePatch, CaseRecord, CaseStatus};
use anyhow::Result;

/// Server-side narrowing applied when fetching cases
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub category: Option<String>,
    pub status: Option<CaseStatus>,
}

impl CaseFilter {
    pub fn category(category: &str) -> Self {
        Self { category: Some(category.to_string()), status: None }
    }

    pub fn matches(&self, case: &CaseRecord) -> bool {
        self.category.as_deref().map_or(true, |c| case.category == c)
            && self.status.map_or(true, |s| case.status == s)
    }
}

/// Persistence collaborator the transition engine writes through.
///
/// Every engine operation issues at most one `update_case`; the returned
/// record is the authoritative post-update state.
pub trait CaseStore {
    fn fetch_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseRecord>>;
    fn fetch_case(&self, id: i64) -> Result<Option<CaseRecord>>;
    fn update_case(&self, id: i64, patch: &CasePatch) -> Result<CaseRecord>;
}
