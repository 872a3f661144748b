//! Board and list analytics
//!
//! Everything here is a pure scan over an in-memory case set. Results do not
//! depend on input order.

use crate::models::{CaseOutcome, CaseRecord, StageDefinition};
use crate::pipeline::catalog::PipelineCatalog;
use crate::pipeline::tracker::{days_in_stage, is_stale, resolve_stage};
use serde::Serialize;

/// Board column threshold: cases sitting longer than this are overdue
pub const DEFAULT_OVERDUE_DAYS: u32 = 30;
/// Pipeline threshold: cases sitting longer than this are stale
pub const DEFAULT_STALE_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsOptions {
    pub now: i64,
    pub overdue_days: u32,
    pub stale_days: u32,
}

impl StatsOptions {
    pub fn at(now: i64) -> Self {
        Self { now, overdue_days: DEFAULT_OVERDUE_DAYS, stale_days: DEFAULT_STALE_DAYS }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStats {
    pub stage_id: String,
    pub count: usize,
    pub total_claim_value: f64,
    pub overdue_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardTotals {
    pub count: usize,
    pub total_claim_value: f64,
    pub urgent_count: usize,
    pub stale_count: usize,
    pub won: usize,
    pub lost: usize,
    pub settled: usize,
    pub active: usize,
    pub win_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardStats {
    pub per_stage: Vec<StageStats>,
    pub totals: BoardTotals,
}

impl BoardStats {
    pub fn stage(&self, stage_id: &str) -> Option<&StageStats> {
        self.per_stage.iter().find(|s| s.stage_id == stage_id)
    }
}

/// Bucket cases by stage in catalog order. Cases whose stage is unset or not in
/// the catalog land in the first stage, so every case appears exactly once.
pub fn group_by_stage<'c, 'r>(
    cases: &'r [CaseRecord],
    catalog: &'c PipelineCatalog,
) -> Vec<(&'c StageDefinition, Vec<&'r CaseRecord>)> {
    let mut groups: Vec<(&StageDefinition, Vec<&CaseRecord>)> =
        catalog.stages().iter().map(|s| (s, Vec::new())).collect();
    for case in cases {
        let (index, _) = resolve_stage(catalog, case);
        groups[index].1.push(case);
    }
    groups
}

/// `(won + settled) / (won + lost + settled)` as a rounded percentage, 0 when nothing is decided
pub fn win_rate(cases: &[CaseRecord]) -> u32 {
    let (favorable, decided) = cases.iter().fold((0usize, 0usize), |(fav, dec), c| {
        if c.outcome.is_decided() {
            (fav + c.outcome.is_favorable() as usize, dec + 1)
        } else {
            (fav, dec)
        }
    });
    percent(favorable, decided)
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

pub fn compute_board_stats(cases: &[CaseRecord], catalog: &PipelineCatalog, options: &StatsOptions) -> BoardStats {
    let per_stage = group_by_stage(cases, catalog)
        .into_iter()
        .map(|(stage, members)| StageStats {
            stage_id: stage.id.clone(),
            count: members.len(),
            total_claim_value: members.iter().map(|c| c.claim_amount).sum(),
            overdue_count: members
                .iter()
                .filter(|c| days_in_stage(c, options.now) > options.overdue_days as i64)
                .count(),
        })
        .collect();

    let mut totals = BoardTotals::default();
    for case in cases {
        totals.count += 1;
        totals.total_claim_value += case.claim_amount;
        if case.priority.is_urgent() {
            totals.urgent_count += 1;
        }
        if is_stale(case, options.now, options.stale_days) {
            totals.stale_count += 1;
        }
        if case.is_active() {
            totals.active += 1;
        }
        match case.outcome {
            CaseOutcome::Won => totals.won += 1,
            CaseOutcome::Lost => totals.lost += 1,
            CaseOutcome::Settled => totals.settled += 1,
            CaseOutcome::Ongoing => {}
        }
    }
    totals.win_rate = percent(totals.won + totals.settled, totals.won + totals.lost + totals.settled);

    BoardStats { per_stage, totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CasePriority;
    use crate::pipeline::catalog::get_catalog;
    use crate::pipeline::tracker::SECS_PER_DAY;

    const NOW: i64 = 1_760_000_000;

    fn case(stage: Option<&str>, claim: f64, days_in: i64) -> CaseRecord {
        let mut c = CaseRecord::new("Case".to_string(), "labor".to_string());
        c.current_stage = stage.map(|s| s.to_string());
        c.claim_amount = claim;
        c.stage_entered_ts = Some(NOW - days_in * SECS_PER_DAY);
        c
    }

    fn with_outcome(outcome: CaseOutcome) -> CaseRecord {
        let mut c = case(Some("judgment"), 0.0, 0);
        c.outcome = outcome;
        c
    }

    #[test]
    fn test_counts_sum_to_case_total_with_unknown_stages() {
        let catalog = get_catalog("labor");
        let cases = vec![
            case(Some("filing"), 100.0, 1),
            case(Some("hearing"), 200.0, 1),
            case(Some("not-a-stage"), 50.0, 1),
            case(None, 25.0, 1),
        ];
        let stats = compute_board_stats(&cases, catalog, &StatsOptions::at(NOW));

        let total: usize = stats.per_stage.iter().map(|s| s.count).sum();
        assert_eq!(total, cases.len());
        assert_eq!(stats.per_stage.len(), catalog.len());

        let filing = stats.stage("filing").unwrap();
        assert_eq!(filing.count, 3);
        assert_eq!(filing.total_claim_value, 175.0);
        assert_eq!(stats.totals.total_claim_value, 375.0);
    }

    #[test]
    fn test_empty_input() {
        let stats = compute_board_stats(&[], get_catalog("civil"), &StatsOptions::at(NOW));
        assert!(stats.per_stage.iter().all(|s| s.count == 0));
        assert_eq!(stats.totals, BoardTotals::default());
    }

    #[test]
    fn test_overdue_and_stale_use_their_own_thresholds() {
        let catalog = get_catalog("labor");
        let cases = vec![
            case(Some("hearing"), 0.0, 20),
            case(Some("hearing"), 0.0, 40),
            case(Some("hearing"), 0.0, 5),
        ];
        let stats = compute_board_stats(&cases, catalog, &StatsOptions::at(NOW));
        assert_eq!(stats.stage("hearing").unwrap().overdue_count, 1);
        assert_eq!(stats.totals.stale_count, 2);

        let relaxed = StatsOptions { stale_days: 30, overdue_days: 60, ..StatsOptions::at(NOW) };
        let stats = compute_board_stats(&cases, catalog, &relaxed);
        assert_eq!(stats.stage("hearing").unwrap().overdue_count, 0);
        assert_eq!(stats.totals.stale_count, 1);
    }

    #[test]
    fn test_urgent_count() {
        let mut high = case(Some("filing"), 0.0, 0);
        high.priority = CasePriority::High;
        let mut critical = case(Some("filing"), 0.0, 0);
        critical.priority = CasePriority::Critical;
        let low = case(Some("filing"), 0.0, 0);

        let stats = compute_board_stats(&[high, critical, low], get_catalog("labor"), &StatsOptions::at(NOW));
        assert_eq!(stats.totals.urgent_count, 2);
    }

    #[test]
    fn test_win_rate_example() {
        let mut cases = Vec::new();
        cases.extend((0..3).map(|_| with_outcome(CaseOutcome::Won)));
        cases.push(with_outcome(CaseOutcome::Lost));
        cases.push(with_outcome(CaseOutcome::Settled));
        cases.extend((0..5).map(|_| with_outcome(CaseOutcome::Ongoing)));

        assert_eq!(win_rate(&cases), 80);
        let stats = compute_board_stats(&cases, get_catalog("labor"), &StatsOptions::at(NOW));
        assert_eq!(stats.totals.win_rate, 80);
        assert_eq!(stats.totals.won, 3);
        assert_eq!(stats.totals.active, 5);
    }

    #[test]
    fn test_win_rate_edges() {
        let ongoing = vec![with_outcome(CaseOutcome::Ongoing)];
        assert_eq!(win_rate(&ongoing), 0);
        assert_eq!(win_rate(&[]), 0);

        let all_good = vec![with_outcome(CaseOutcome::Won), with_outcome(CaseOutcome::Settled)];
        assert_eq!(win_rate(&all_good), 100);

        let thirds = vec![
            with_outcome(CaseOutcome::Won),
            with_outcome(CaseOutcome::Settled),
            with_outcome(CaseOutcome::Lost),
        ];
        assert_eq!(win_rate(&thirds), 67);
    }

    #[test]
    fn test_order_independent() {
        let catalog = get_catalog("labor");
        let mut cases = vec![
            case(Some("filing"), 10.0, 3),
            case(Some("judgment"), 20.0, 40),
            with_outcome(CaseOutcome::Lost),
        ];
        let a = compute_board_stats(&cases, catalog, &StatsOptions::at(NOW));
        cases.reverse();
        let b = compute_board_stats(&cases, catalog, &StatsOptions::at(NOW));
        assert_eq!(a, b);
    }
}
