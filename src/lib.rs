//! Casetrack - a command-line ledger for legal cases moving through staged pipelines
//!
//! This library provides the core functionality for Casetrack, including:
//! - Stage catalogs per case category, built in or loaded from JSON
//! - Per-case stage tracking (dwell time, staleness, progress)
//! - The transition engine (stage moves and case closure)
//! - Board and portfolio analytics
//! - Database operations, migrations and the case repository
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use casetrack::db::DbConnection;
//! use casetrack::models::CaseRecord;
//! use casetrack::pipeline::{builtin_registry, TransitionEngine};
//! use casetrack::repo::CaseRepo;
//!
//! fn main() -> anyhow::Result<()> {
//!     let conn = DbConnection::connect_in_memory()?;
//!     let mut case = CaseRecord::new("Unpaid wages".to_string(), "labor".to_string());
//!     case.current_stage = Some("filing".to_string());
//!     let case = CaseRepo::create(&conn, &case)?;
//!
//!     let engine = TransitionEngine::new(&conn, builtin_registry());
//!     let moved = engine.move_next(&case)?;
//!     println!("{:?}", moved.and_then(|c| c.current_stage));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod models;
pub mod repo;
pub mod cli;
pub mod utils;
pub mod filter;
pub mod pipeline;
