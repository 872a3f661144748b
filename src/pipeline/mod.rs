//! Case pipeline core: stage catalogs, per-case stage tracking, the
//! transition engine and board analytics.

pub mod aggregate;
pub mod catalog;
pub mod engine;
pub mod store;
pub mod tracker;

pub use aggregate::{compute_board_stats, group_by_stage, win_rate, BoardStats, BoardTotals, StageStats, StatsOptions};
pub use catalog::{builtin_registry, get_catalog, CatalogError, CatalogRegistry, PipelineCatalog, DEFAULT_CATEGORY};
pub use engine::{EndCaseRequest, TransitionEngine, TransitionError, TransitionPolicy};
pub use store::{CaseFilter, CaseStore};
