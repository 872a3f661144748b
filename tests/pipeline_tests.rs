// Pipeline behaviour against a real (in-memory) ledger

use casetrack::db::DbConnection;
use casetrack::models::{CaseOutcome, CaseRecord, CaseStatus, StageDefinition};
use casetrack::pipeline::tracker::{is_stale, SECS_PER_DAY};
use casetrack::pipeline::{
    compute_board_stats, get_catalog, win_rate, CaseStore, CatalogRegistry, EndCaseRequest,
    PipelineCatalog, StatsOptions, TransitionEngine, TransitionError, TransitionPolicy,
};
use casetrack::repo::CaseRepo;
use rusqlite::Connection;

const NOW: i64 = 1_760_000_000;

fn three_stage_registry() -> CatalogRegistry {
    let labor = PipelineCatalog::new("labor", vec![
        StageDefinition::new("filing", "Filing", "قيد", 0),
        StageDefinition::new("hearing", "Hearing", "جلسة", 1),
        StageDefinition::new("judgment", "Judgment", "حكم", 2).can_end(),
    ]).unwrap();
    CatalogRegistry::new(vec![labor], "labor").unwrap()
}

fn open_case(conn: &Connection, category: &str, stage: &str) -> CaseRecord {
    let mut case = CaseRecord::new(format!("{} case", category), category.to_string());
    case.current_stage = Some(stage.to_string());
    case.stage_entered_ts = Some(case.created_ts);
    CaseRepo::create(conn, &case).unwrap()
}

fn with_outcome(outcome: CaseOutcome) -> CaseRecord {
    let mut case = CaseRecord::new("Outcome".to_string(), "labor".to_string());
    case.outcome = outcome;
    case
}

#[test]
fn test_every_category_has_stages() {
    let registry = CatalogRegistry::builtin();
    for category in registry.categories() {
        assert!(!registry.get(category).is_empty(), "{} has no stages", category);
    }
    assert!(!get_catalog("unheard-of").is_empty());
}

#[test]
fn test_unknown_category_uses_default_catalog() {
    let registry = CatalogRegistry::builtin();
    let default = registry.get(registry.default_category());
    for category in ["maritime", "tax", "", "LABOR"] {
        assert_eq!(registry.get(category), default);
    }
}

#[test]
fn test_next_then_previous_restores_stage() {
    let conn = DbConnection::connect_in_memory().unwrap();
    let registry = CatalogRegistry::builtin();
    let engine = TransitionEngine::new(&conn, &registry);

    let case = open_case(&conn, "labor", "labor_court");
    let moved = engine.move_next(&case).unwrap().unwrap();
    assert_eq!(moved.current_stage.as_deref(), Some("hearing"));
    let back = engine.move_previous(&moved).unwrap().unwrap();
    assert_eq!(back.current_stage, case.current_stage);
}

#[test]
fn test_boundaries_are_noops() {
    let conn = DbConnection::connect_in_memory().unwrap();
    let registry = CatalogRegistry::builtin();
    let engine = TransitionEngine::new(&conn, &registry);

    let last = open_case(&conn, "labor", "execution");
    assert!(engine.move_next(&last).unwrap().is_none());
    let first = open_case(&conn, "labor", "filing");
    assert!(engine.move_previous(&first).unwrap().is_none());

    // Neither call wrote a history row beyond the initial entry
    assert_eq!(CaseRepo::history(&conn, last.id.unwrap()).unwrap().len(), 1);
    assert_eq!(CaseRepo::history(&conn, first.id.unwrap()).unwrap().len(), 1);
}

#[test]
fn test_end_case_closes_and_keeps_stage() {
    let conn = DbConnection::connect_in_memory().unwrap();
    let registry = CatalogRegistry::builtin();
    let engine = TransitionEngine::new(&conn, &registry);

    let case = open_case(&conn, "commercial", "mediation");
    let request = EndCaseRequest {
        outcome: CaseOutcome::Settled,
        reason: "settlement".to_string(),
        final_amount: Some(40_000.0),
        notes: String::new(),
    };
    engine.end_case(&case, &request).unwrap();

    let stored = conn.fetch_case(case.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.status, CaseStatus::Closed);
    assert_eq!(stored.outcome, CaseOutcome::Settled);
    assert_eq!(stored.current_stage.as_deref(), Some("mediation"));
    assert_eq!(stored.final_amount, Some(40_000.0));
    assert!(stored.end_ts.is_some());
}

#[test]
fn test_board_counts_every_case_once() {
    let catalog = get_catalog("labor");
    let mut cases = Vec::new();
    for stage in [Some("filing"), Some("hearing"), Some("retired_stage"), None, Some("execution")] {
        let mut case = CaseRecord::new("Board".to_string(), "labor".to_string());
        case.current_stage = stage.map(|s| s.to_string());
        cases.push(case);
    }

    let stats = compute_board_stats(&cases, catalog, &StatsOptions::at(NOW));
    let total: usize = stats.per_stage.iter().map(|s| s.count).sum();
    assert_eq!(total, cases.len());
    assert_eq!(stats.stage("filing").unwrap().count, 3);

    let empty = compute_board_stats(&[], catalog, &StatsOptions::at(NOW));
    assert_eq!(empty.per_stage.iter().map(|s| s.count).sum::<usize>(), 0);
    assert_eq!(empty.per_stage.len(), catalog.len());
}

#[test]
fn test_win_rate_bounds() {
    let ongoing = vec![with_outcome(CaseOutcome::Ongoing); 4];
    assert_eq!(win_rate(&ongoing), 0);
    assert_eq!(win_rate(&[]), 0);

    let favorable = vec![
        with_outcome(CaseOutcome::Won),
        with_outcome(CaseOutcome::Settled),
        with_outcome(CaseOutcome::Ongoing),
    ];
    assert_eq!(win_rate(&favorable), 100);
}

#[test]
fn test_three_stage_walkthrough() {
    let conn = DbConnection::connect_in_memory().unwrap();
    let registry = three_stage_registry();
    let engine = TransitionEngine::new(&conn, &registry).at(NOW);

    let mut case = CaseRecord::new("Walkthrough".to_string(), "labor".to_string());
    case.created_ts = NOW - 10 * SECS_PER_DAY;
    case.current_stage = Some("filing".to_string());
    let case = CaseRepo::create(&conn, &case).unwrap();

    let case = engine.move_next(&case).unwrap().unwrap();
    let case = engine.move_next(&case).unwrap().unwrap();
    assert_eq!(case.current_stage.as_deref(), Some("judgment"));
    let case = engine.move_previous(&case).unwrap().unwrap();
    assert_eq!(case.current_stage.as_deref(), Some("hearing"));
    assert_eq!(case.stage_entered_ts, Some(NOW));

    let history = CaseRepo::history(&conn, case.id.unwrap()).unwrap();
    let route: Vec<&str> = history.iter().map(|t| t.to_stage.as_str()).collect();
    assert_eq!(route, ["filing", "hearing", "judgment", "hearing"]);
}

#[test]
fn test_win_rate_example() {
    let mut cases = Vec::new();
    cases.extend(vec![with_outcome(CaseOutcome::Won); 3]);
    cases.push(with_outcome(CaseOutcome::Lost));
    cases.push(with_outcome(CaseOutcome::Settled));
    cases.extend(vec![with_outcome(CaseOutcome::Ongoing); 5]);
    assert_eq!(cases.len(), 10);

    assert_eq!(win_rate(&cases), 80);
    let stats = compute_board_stats(&cases, get_catalog("labor"), &StatsOptions::at(NOW));
    assert_eq!(stats.totals.win_rate, 80);
    assert_eq!(stats.totals.active, 5);
}

#[test]
fn test_staleness_threshold() {
    let mut case = CaseRecord::new("Stale".to_string(), "labor".to_string());
    case.stage_entered_ts = Some(NOW - 20 * SECS_PER_DAY);

    assert!(is_stale(&case, NOW, 14));
    assert!(!is_stale(&case, NOW, 30));
}

#[test]
fn test_invalid_target_is_rejected_and_nothing_changes() {
    let conn = DbConnection::connect_in_memory().unwrap();
    let registry = CatalogRegistry::builtin();
    let engine = TransitionEngine::new(&conn, &registry);

    let case = open_case(&conn, "family", "reconciliation");
    let err = engine.move_to_stage(&case, "investigation").unwrap_err();
    assert!(matches!(err, TransitionError::InvalidStage { .. }));

    let stored = conn.fetch_case(case.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.current_stage.as_deref(), Some("reconciliation"));
    assert_eq!(stored.modified_ts, case.modified_ts);
}

#[test]
fn test_strict_policy_against_ledger() {
    let conn = DbConnection::connect_in_memory().unwrap();
    let registry = CatalogRegistry::builtin();
    let engine = TransitionEngine::new(&conn, &registry).with_policy(TransitionPolicy::Strict);

    // labor: filing -> friendly_settlement (mandatory) -> labor_court
    let case = open_case(&conn, "labor", "filing");
    assert!(matches!(
        engine.move_to_stage(&case, "labor_court"),
        Err(TransitionError::MandatoryStageSkipped { .. })
    ));

    let request = EndCaseRequest { reason: "withdrawal".to_string(), ..Default::default() };
    assert!(matches!(engine.end_case(&case, &request), Err(TransitionError::EndNotAllowed { .. })));

    let case = engine.move_next(&case).unwrap().unwrap();
    let closed = engine.end_case(&case, &request).unwrap();
    assert_eq!(closed.status, CaseStatus::Closed);
}
