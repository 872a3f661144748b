// Derived stage state for a single case: current stage, dwell time, progress

use crate::models::{CaseRecord, StageDefinition, StageTransition};
use crate::pipeline::catalog::PipelineCatalog;
use std::collections::HashMap;

pub const SECS_PER_DAY: i64 = 86_400;

/// Resolve a case's current stage against its catalog.
/// An unset or unknown stage id resolves to the first stage.
pub fn resolve_stage<'a>(catalog: &'a PipelineCatalog, case: &CaseRecord) -> (usize, &'a StageDefinition) {
    let index = case
        .current_stage
        .as_deref()
        .and_then(|id| catalog.index_of(id))
        .unwrap_or(0);
    (index, catalog.get(index).unwrap_or_else(|| catalog.first()))
}

/// Timestamp the case's time-in-stage is measured from:
/// stage entry, else last modification, else creation
pub fn stage_reference_ts(case: &CaseRecord) -> i64 {
    case.stage_entered_ts.unwrap_or(if case.modified_ts > 0 {
        case.modified_ts
    } else {
        case.created_ts
    })
}

/// Whole days between two timestamps, truncated toward zero
pub fn days_between(from_ts: i64, to_ts: i64) -> i64 {
    (to_ts - from_ts) / SECS_PER_DAY
}

pub fn days_in_stage(case: &CaseRecord, now: i64) -> i64 {
    days_between(stage_reference_ts(case), now)
}

/// A case is stale once it has sat in its stage for more than `threshold_days`
pub fn is_stale(case: &CaseRecord, now: i64, threshold_days: u32) -> bool {
    days_in_stage(case, now) > threshold_days as i64
}

/// Position in the pipeline as a percentage (first stage 0, last stage 100).
/// A single-stage catalog is complete by definition.
pub fn progress_percent(catalog: &PipelineCatalog, index: usize) -> f64 {
    if catalog.len() <= 1 {
        return 100.0;
    }
    let index = index.min(catalog.len() - 1);
    index as f64 / (catalog.len() - 1) as f64 * 100.0
}

/// Stage has an SLA target and `days` exceeds it
pub fn is_over_sla(stage: &StageDefinition, days: i64) -> bool {
    stage
        .max_duration_days
        .map(|max| days > max as i64)
        .unwrap_or(false)
}

/// Seconds spent in each stage, from the transition history.
///
/// `history` must be ordered by timestamp. Time before the first recorded move
/// is credited to that move's `from_stage` starting at case creation; the
/// current stage accrues until `now`.
pub fn stage_dwell(history: &[StageTransition], case: &CaseRecord, now: i64) -> HashMap<String, i64> {
    let mut dwell: HashMap<String, i64> = HashMap::new();
    let mut cursor = case.created_ts;
    let mut current: Option<String> = history
        .first()
        .and_then(|t| t.from_stage.clone());

    for transition in history {
        if let Some(stage) = &current {
            *dwell.entry(stage.clone()).or_insert(0) += (transition.ts - cursor).max(0);
        }
        cursor = transition.ts;
        current = Some(transition.to_stage.clone());
    }

    let current = current.or_else(|| case.current_stage.clone());
    if let Some(stage) = current {
        *dwell.entry(stage).or_insert(0) += (now - cursor).max(0);
    }

    dwell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::catalog::get_catalog;

    const NOW: i64 = 1_760_000_000;

    fn case_in(stage: Option<&str>) -> CaseRecord {
        let mut case = CaseRecord::new("Test".to_string(), "labor".to_string());
        case.current_stage = stage.map(|s| s.to_string());
        case.created_ts = NOW - 100 * SECS_PER_DAY;
        case.modified_ts = NOW - 50 * SECS_PER_DAY;
        case
    }

    #[test]
    fn test_resolve_known_stage() {
        let catalog = get_catalog("labor");
        let (index, stage) = resolve_stage(catalog, &case_in(Some("hearing")));
        assert_eq!(index, 3);
        assert_eq!(stage.id, "hearing");
    }

    #[test]
    fn test_resolve_unknown_or_missing_stage_uses_first() {
        let catalog = get_catalog("labor");
        assert_eq!(resolve_stage(catalog, &case_in(Some("nonsense"))).1.id, "filing");
        assert_eq!(resolve_stage(catalog, &case_in(None)).0, 0);
    }

    #[test]
    fn test_reference_timestamp_preference() {
        let mut case = case_in(Some("filing"));
        assert_eq!(stage_reference_ts(&case), NOW - 50 * SECS_PER_DAY);

        case.stage_entered_ts = Some(NOW - 3 * SECS_PER_DAY);
        assert_eq!(days_in_stage(&case, NOW), 3);

        case.stage_entered_ts = None;
        case.modified_ts = 0;
        assert_eq!(days_in_stage(&case, NOW), 100);
    }

    #[test]
    fn test_days_truncate() {
        assert_eq!(days_between(0, SECS_PER_DAY - 1), 0);
        assert_eq!(days_between(0, SECS_PER_DAY), 1);
        assert_eq!(days_between(0, 2 * SECS_PER_DAY + 5), 2);
    }

    #[test]
    fn test_staleness_thresholds() {
        let mut case = case_in(Some("hearing"));
        case.stage_entered_ts = Some(NOW - 20 * SECS_PER_DAY);
        assert!(is_stale(&case, NOW, 14));
        assert!(!is_stale(&case, NOW, 30));
        // Exactly at the threshold is not stale
        assert!(!is_stale(&case, NOW, 20));
    }

    #[test]
    fn test_progress_percent() {
        let catalog = get_catalog("labor");
        assert_eq!(progress_percent(catalog, 0), 0.0);
        assert_eq!(progress_percent(catalog, 3), 50.0);
        assert_eq!(progress_percent(catalog, catalog.len() - 1), 100.0);

        let single = PipelineCatalog::new("one", vec![StageDefinition::new("only", "Only", "Only", 0)]).unwrap();
        assert_eq!(progress_percent(&single, 0), 100.0);
    }

    #[test]
    fn test_sla() {
        let catalog = get_catalog("labor");
        let settlement = catalog.stage("friendly_settlement").unwrap();
        assert!(!is_over_sla(settlement, 21));
        assert!(is_over_sla(settlement, 22));
        assert!(!is_over_sla(catalog.first(), 1000));
    }

    #[test]
    fn test_stage_dwell_from_history() {
        let mut case = case_in(Some("hearing"));
        case.created_ts = 0;
        let history = vec![
            StageTransition { id: None, case_id: 1, from_stage: Some("filing".to_string()), to_stage: "labor_court".to_string(), ts: 100 },
            StageTransition { id: None, case_id: 1, from_stage: Some("labor_court".to_string()), to_stage: "hearing".to_string(), ts: 250 },
        ];
        let dwell = stage_dwell(&history, &case, 400);
        assert_eq!(dwell["filing"], 100);
        assert_eq!(dwell["labor_court"], 150);
        assert_eq!(dwell["hearing"], 150);
    }

    #[test]
    fn test_stage_dwell_without_history() {
        let mut case = case_in(Some("filing"));
        case.created_ts = 10;
        let dwell = stage_dwell(&[], &case, 70);
        assert_eq!(dwell.len(), 1);
        assert_eq!(dwell["filing"], 60);
    }
}
