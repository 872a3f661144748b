use clap::{Parser, Subcommand};
use rusqlite::Connection;
use crate::config::Config;
use crate::db::DbConnection;
use crate::models::{CaseOutcome, CasePriority, CaseRecord};
use crate::repo::CaseRepo;
use crate::filter::parse_query;
use crate::pipeline::{
    compute_board_stats, group_by_stage, win_rate, CaseFilter, CaseStore, CatalogRegistry,
    EndCaseRequest, PipelineCatalog, StatsOptions, TransitionEngine, TransitionError,
};
use crate::pipeline::tracker::{days_in_stage, is_over_sla, is_stale, progress_percent, resolve_stage};
use crate::cli::output::{
    format_amount, format_board, format_case_list_table, format_case_summary, format_history,
    format_stage_list, format_stats_dashboard, is_tty,
};
use crate::cli::error::{parse_amount, user_error, validate_case_id, validate_case_number, validate_non_empty};
use crate::cli::abbrev;
use crate::utils::{fuzzy, parse_date_expr};
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "casetrack")]
#[command(about = "Case pipeline tracker - move legal cases through the stages of their category")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Stage name language
    #[arg(long, global = true, default_value = "en", value_parser = ["en", "ar"])]
    pub lang: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a new case in the first stage of its category
    Add {
        /// Case title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        /// Case category (labor, commercial, civil, ...)
        #[arg(short, long)]
        category: Option<String>,
        /// Court case number
        #[arg(short, long)]
        number: Option<String>,
        /// Priority: low, medium, high, critical
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Claimed amount
        #[arg(long)]
        claim: Option<String>,
        #[arg(long)]
        plaintiff: Option<String>,
        #[arg(long)]
        defendant: Option<String>,
        #[arg(long)]
        court: Option<String>,
        /// Start in this stage instead of the first one
        #[arg(long)]
        stage: Option<String>,
        /// Date the case was opened (YYYY-MM-DD, yesterday, -30d)
        #[arg(long, allow_hyphen_values = true)]
        since: Option<String>,
    },
    /// List cases (e.g. "wages category=labor status=active sort=claim")
    List {
        /// Search text and key=value filters
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show detailed summary of a case
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Move a case to any stage of its catalog
    Move {
        id: String,
        stage: String,
    },
    /// Move a case to the following stage
    Next {
        id: String,
    },
    /// Move a case back to the preceding stage
    Prev {
        id: String,
    },
    /// Close a case with an outcome
    End {
        id: String,
        /// Outcome: won, lost, settled
        #[arg(short, long, default_value = "settled")]
        outcome: String,
        /// Why the case ended (required)
        #[arg(short, long, default_value = "")]
        reason: String,
        /// Final awarded or agreed amount
        #[arg(short, long, default_value = "")]
        amount: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Board of active cases grouped by stage
    Board {
        /// Category (defaults to the default catalog)
        category: Option<String>,
        /// Include closed cases
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Portfolio statistics
    Stats {
        /// Restrict to one category and show its stage distribution
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List categories, or the stages of one category
    Stages {
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Stage transition history of a case
    History {
        id: String,
    },
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let args = match abbrev::expand_command_abbreviations(args) {
        Ok(expanded) => expanded,
        Err(e) => {
            user_error(&e);
        }
    };

    let clap_args = std::iter::once("casetrack".to_string())
        .chain(args)
        .collect::<Vec<_>>();
    let cli = match Cli::try_parse_from(clap_args) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    let lang = cli.lang.as_str();
    match cli.command {
        Commands::Add { title, category, number, priority, claim, plaintiff, defendant, court, stage, since } => {
            let details = NewCaseArgs { category, number, priority, claim, plaintiff, defendant, court, stage, since };
            handle_add(title.join(" "), details, lang)
        }
        Commands::List { query, json } => handle_list(query, json, lang),
        Commands::Show { id, json } => handle_show(&id, json, lang),
        Commands::Move { id, stage } => handle_move(&id, &stage, lang),
        Commands::Next { id } => handle_step(&id, Direction::Next, lang),
        Commands::Prev { id } => handle_step(&id, Direction::Previous, lang),
        Commands::End { id, outcome, reason, amount, notes } => handle_end(&id, &outcome, reason, &amount, notes),
        Commands::Board { category, all, json } => handle_board(category, all, json, lang),
        Commands::Stats { category, json } => handle_stats(category, json, lang),
        Commands::Stages { category, json } => handle_stages(category, json, lang),
        Commands::History { id } => handle_history(&id, lang),
    }
}

/// Configuration, catalogs and the open ledger for one invocation
struct AppContext {
    config: Config,
    registry: CatalogRegistry,
    conn: Connection,
}

impl AppContext {
    fn open() -> Result<Self> {
        let config = Config::load()?;
        let registry = load_registry(&config)?;
        let conn = DbConnection::connect(&config)
            .context("Failed to connect to database")?;
        Ok(Self { config, registry, conn })
    }

    fn engine(&self) -> TransitionEngine<'_, Connection> {
        TransitionEngine::new(&self.conn, &self.registry).with_policy(self.config.policy())
    }

    fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            now: chrono::Utc::now().timestamp(),
            overdue_days: self.config.overdue_days,
            stale_days: self.config.stale_days,
        }
    }

    /// Fetch a case or exit with a user error
    fn case(&self, id_str: &str) -> Result<CaseRecord> {
        let id = validate_case_id(id_str).unwrap_or_else(|e| user_error(&e));
        match self.conn.fetch_case(id)? {
            Some(case) => Ok(case),
            None => user_error(&format!("Case {} not found", id)),
        }
    }

    /// Registered category, or exit with a suggestion
    fn category(&self, category: &str) -> String {
        if self.registry.is_registered(category) {
            return category.to_string();
        }
        match fuzzy::closest_match(category, self.registry.categories(), 3) {
            Some(suggestion) => user_error(&format!(
                "Unknown category '{}'. Did you mean '{}'?",
                category, suggestion
            )),
            None => user_error(&format!(
                "Unknown category '{}'. Known categories: {}",
                category,
                self.registry.categories().collect::<Vec<_>>().join(", ")
            )),
        }
    }
}

fn load_registry(config: &Config) -> Result<CatalogRegistry> {
    match &config.catalog_location {
        Some(path) => CatalogRegistry::load(path),
        None => Ok(CatalogRegistry::builtin()),
    }
}

/// Exit with the rejected transition explained; store failures propagate
fn transition_failed(err: TransitionError, catalog: &PipelineCatalog) -> anyhow::Error {
    if !err.is_user_error() {
        return err.into();
    }
    if let TransitionError::InvalidStage { stage, .. } = &err {
        let ids = catalog.stages().iter().map(|s| s.id.as_str());
        if let Some(suggestion) = fuzzy::closest_match(stage, ids, 3) {
            user_error(&format!("{}. Did you mean '{}'?", err, suggestion));
        }
    }
    user_error(&err.to_string());
}

struct NewCaseArgs {
    category: Option<String>,
    number: Option<String>,
    priority: String,
    claim: Option<String>,
    plaintiff: Option<String>,
    defendant: Option<String>,
    court: Option<String>,
    stage: Option<String>,
    since: Option<String>,
}

fn handle_add(title: String, details: NewCaseArgs, lang: &str) -> Result<()> {
    validate_non_empty(&title, "Case title").unwrap_or_else(|e| user_error(&e));
    let ctx = AppContext::open()?;

    let category = match &details.category {
        Some(category) => ctx.category(category),
        None => ctx.registry.default_category().to_string(),
    };
    let catalog = ctx.registry.get(&category);

    let mut case = CaseRecord::new(title.trim().to_string(), category);
    case.priority = CasePriority::from_str(&details.priority).unwrap_or_else(|| {
        user_error(&format!(
            "Invalid priority: '{}'. Use low, medium, high or critical.",
            details.priority
        ))
    });
    if let Some(number) = details.number {
        validate_case_number(&number).unwrap_or_else(|e| user_error(&e));
        case.case_number = Some(number);
    }
    if let Some(claim) = details.claim {
        case.claim_amount = parse_amount(&claim)
            .unwrap_or_else(|e| user_error(&e))
            .unwrap_or(0.0);
    }
    case.plaintiff_name = details.plaintiff.filter(|s| !s.trim().is_empty());
    case.defendant_name = details.defendant.filter(|s| !s.trim().is_empty());
    case.court = details.court.filter(|s| !s.trim().is_empty());

    if let Some(since) = details.since {
        let ts = parse_date_expr(&since).unwrap_or_else(|e| user_error(&e.to_string()));
        case.created_ts = ts;
    }

    let stage = match details.stage {
        Some(stage_id) => match catalog.stage(&stage_id) {
            Some(stage) => stage,
            None => {
                let err = TransitionError::InvalidStage { stage: stage_id, category: case.category.clone() };
                return Err(transition_failed(err, catalog));
            }
        },
        None => catalog.first(),
    };
    case.current_stage = Some(stage.id.clone());
    case.stage_entered_ts = Some(case.created_ts);

    let created = CaseRepo::create(&ctx.conn, &case)?;
    println!(
        "Created case {}: {} ({}, {})",
        created.id.map(|id| id.to_string()).unwrap_or_default(),
        created.title,
        created.category,
        stage.display_name(lang)
    );
    Ok(())
}

fn handle_list(tokens: Vec<String>, json: bool, lang: &str) -> Result<()> {
    let query = parse_query(tokens).unwrap_or_else(|e| user_error(&e));
    let ctx = AppContext::open()?;

    let fetched = ctx.conn.fetch_cases(&CaseFilter::default())
        .context("Failed to list cases")?;
    let cases = query.apply(&fetched);
    let options = ctx.stats_options();

    if json {
        let mut rows = Vec::with_capacity(cases.len());
        for case in &cases {
            let catalog = ctx.registry.get(&case.category);
            let (_, stage) = resolve_stage(catalog, case);
            let mut value = serde_json::to_value(case)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("stage".to_string(), serde_json::json!(stage.id));
                obj.insert("days_in_stage".to_string(), serde_json::json!(days_in_stage(case, options.now)));
                obj.insert("stale".to_string(), serde_json::json!(is_stale(case, options.now, options.stale_days)));
            }
            rows.push(value);
        }
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    print!("{}", format_case_list_table(&cases, &ctx.registry, &options, lang, is_tty()));
    if query.has_active_filters() {
        println!("(filtered: {} of {} case(s))", cases.len(), fetched.len());
    }
    if cases.iter().any(|c| c.outcome.is_decided()) {
        println!("Win rate: {}%", win_rate(&cases));
    }
    Ok(())
}

fn handle_show(id_str: &str, json: bool, lang: &str) -> Result<()> {
    let ctx = AppContext::open()?;
    let case = ctx.case(id_str)?;
    let id = case.id.unwrap_or_default();
    let history = CaseRepo::history(&ctx.conn, id)?;
    let catalog = ctx.registry.get(&case.category);
    let options = ctx.stats_options();

    if json {
        let (index, stage) = resolve_stage(catalog, &case);
        let days = days_in_stage(&case, options.now);
        let output = serde_json::json!({
            "case": case,
            "stage": stage,
            "stage_index": index,
            "progress": progress_percent(catalog, index),
            "days_in_stage": days,
            "stale": is_stale(&case, options.now, options.stale_days),
            "over_target": is_over_sla(stage, days),
            "history": history,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", format_case_summary(&case, catalog, &history, options.now, lang, is_tty()));
    Ok(())
}

fn handle_move(id_str: &str, target: &str, lang: &str) -> Result<()> {
    let ctx = AppContext::open()?;
    let case = ctx.case(id_str)?;
    let catalog = ctx.registry.get(&case.category);

    let updated = ctx.engine()
        .move_to_stage(&case, target)
        .map_err(|e| transition_failed(e, catalog))?;
    report_move(&updated, catalog, lang);
    Ok(())
}

enum Direction {
    Next,
    Previous,
}

fn handle_step(id_str: &str, direction: Direction, lang: &str) -> Result<()> {
    let ctx = AppContext::open()?;
    let case = ctx.case(id_str)?;
    let catalog = ctx.registry.get(&case.category);
    let engine = ctx.engine();

    let result = match direction {
        Direction::Next => engine.move_next(&case),
        Direction::Previous => engine.move_previous(&case),
    };

    match result.map_err(|e| transition_failed(e, catalog))? {
        Some(updated) => report_move(&updated, catalog, lang),
        None => {
            let (edge, stage) = match direction {
                Direction::Next => ("last", catalog.last()),
                Direction::Previous => ("first", catalog.first()),
            };
            println!(
                "Case {} is already at the {} stage ({}).",
                case.label(),
                edge,
                stage.display_name(lang)
            );
        }
    }
    Ok(())
}

fn report_move(updated: &CaseRecord, catalog: &PipelineCatalog, lang: &str) {
    let (index, stage) = resolve_stage(catalog, updated);
    println!(
        "Moved case {} to {} ({}/{}).",
        updated.label(),
        stage.display_name(lang),
        index + 1,
        catalog.len()
    );
}

fn handle_end(id_str: &str, outcome: &str, reason: String, amount: &str, notes: String) -> Result<()> {
    let outcome = CaseOutcome::from_str(outcome).unwrap_or_else(|| {
        user_error(&format!("Invalid outcome: '{}'. Use won, lost or settled.", outcome))
    });
    let final_amount = parse_amount(amount).unwrap_or_else(|e| user_error(&e));

    let ctx = AppContext::open()?;
    let case = ctx.case(id_str)?;
    let catalog = ctx.registry.get(&case.category);

    let request = EndCaseRequest { outcome, reason, final_amount, notes };
    let closed = ctx.engine()
        .end_case(&case, &request)
        .map_err(|e| transition_failed(e, catalog))?;

    match closed.final_amount {
        Some(amount) => println!(
            "Closed case {} as {} ({}).",
            closed.label(),
            closed.outcome.as_str(),
            format_amount(amount)
        ),
        None => println!("Closed case {} as {}.", closed.label(), closed.outcome.as_str()),
    }
    Ok(())
}

fn handle_board(category: Option<String>, all: bool, json: bool, lang: &str) -> Result<()> {
    let ctx = AppContext::open()?;
    let category = match category {
        Some(category) => ctx.category(&category),
        None => ctx.registry.default_category().to_string(),
    };
    let catalog = ctx.registry.get(&category);

    let mut cases = ctx.conn.fetch_cases(&CaseFilter::category(&category))
        .context("Failed to load board")?;
    if !all {
        cases.retain(|c| c.is_active());
    }

    let options = ctx.stats_options();
    let groups = group_by_stage(&cases, catalog);
    let stats = compute_board_stats(&cases, catalog, &options);

    if json {
        let columns: Vec<serde_json::Value> = groups
            .iter()
            .map(|(stage, members)| {
                let stage_stats = stats.stage(&stage.id);
                serde_json::json!({
                    "stage": stage,
                    "count": members.len(),
                    "total_claim_value": stage_stats.map(|s| s.total_claim_value).unwrap_or(0.0),
                    "overdue_count": stage_stats.map(|s| s.overdue_count).unwrap_or(0),
                    "case_ids": members.iter().filter_map(|c| c.id).collect::<Vec<_>>(),
                })
            })
            .collect();
        let output = serde_json::json!({
            "category": catalog.category(),
            "columns": columns,
            "totals": stats.totals,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", format_board(catalog, &groups, &stats, &options, lang, is_tty()));
    Ok(())
}

fn handle_stats(category: Option<String>, json: bool, lang: &str) -> Result<()> {
    let ctx = AppContext::open()?;
    let category = category.map(|c| ctx.category(&c));

    let filter = CaseFilter { category: category.clone(), status: None };
    let cases = ctx.conn.fetch_cases(&filter)
        .context("Failed to load statistics")?;

    let catalog = ctx.registry.get(category.as_deref().unwrap_or(ctx.registry.default_category()));
    let stats = compute_board_stats(&cases, catalog, &ctx.stats_options());

    if json {
        let output = match &category {
            Some(_) => serde_json::to_value(&stats)?,
            None => serde_json::json!({ "totals": stats.totals }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let shown_catalog = category.as_ref().map(|_| catalog);
    print!("{}", format_stats_dashboard(shown_catalog, &stats, lang, is_tty()));
    Ok(())
}

fn handle_stages(category: Option<String>, json: bool, lang: &str) -> Result<()> {
    let config = Config::load()?;
    let registry = load_registry(&config)?;

    let Some(category) = category else {
        if json {
            let output: Vec<serde_json::Value> = registry
                .categories()
                .map(|c| serde_json::json!({
                    "category": c,
                    "stages": registry.get(c).len(),
                    "default": c == registry.default_category(),
                }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for c in registry.categories() {
                let marker = if c == registry.default_category() { " (default)" } else { "" };
                println!("{:<16} {} stages{}", c, registry.get(c).len(), marker);
            }
        }
        return Ok(());
    };

    if !registry.is_registered(&category) {
        let suggestion = fuzzy::closest_match(&category, registry.categories(), 3)
            .map(|s| format!(" Did you mean '{}'?", s))
            .unwrap_or_default();
        user_error(&format!("Unknown category '{}'.{}", category, suggestion));
    }
    let catalog = registry.get(&category);

    if json {
        println!("{}", serde_json::to_string_pretty(catalog.stages())?);
        return Ok(());
    }

    print!("{}", format_stage_list(catalog, lang, is_tty()));
    Ok(())
}

fn handle_history(id_str: &str, lang: &str) -> Result<()> {
    let ctx = AppContext::open()?;
    let case = ctx.case(id_str)?;
    let history = CaseRepo::history(&ctx.conn, case.id.unwrap_or_default())?;
    let catalog = ctx.registry.get(&case.category);
    let now = chrono::Utc::now().timestamp();

    print!("{}", format_history(&case, catalog, &history, now, lang));
    Ok(())
}
