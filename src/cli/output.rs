// Output formatting utilities

use crate::models::{CaseRecord, StageDefinition, StageTransition};
use crate::pipeline::aggregate::{BoardStats, StatsOptions};
use crate::pipeline::catalog::{CatalogRegistry, PipelineCatalog};
use crate::pipeline::tracker::{days_in_stage, is_over_sla, is_stale, progress_percent, resolve_stage, stage_dwell};
use crate::utils::{format_date, format_dwell, format_timestamp};
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RESET: &str = "\x1b[0m";

const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";

/// Map a color name string to its ANSI foreground code
fn color_name_to_fg(name: &str) -> Option<&'static str> {
    match name {
        "black" => Some("\x1b[30m"),
        "red" => Some(ANSI_FG_RED),
        "green" => Some(ANSI_FG_GREEN),
        "yellow" => Some(ANSI_FG_YELLOW),
        "blue" => Some("\x1b[34m"),
        "magenta" => Some("\x1b[35m"),
        "cyan" => Some("\x1b[36m"),
        "white" => Some("\x1b[37m"),
        "bright_black" => Some("\x1b[90m"),
        "bright_red" => Some("\x1b[91m"),
        "bright_green" => Some("\x1b[92m"),
        "bright_yellow" => Some("\x1b[93m"),
        "bright_blue" => Some("\x1b[94m"),
        "bright_magenta" => Some("\x1b[95m"),
        "bright_cyan" => Some("\x1b[96m"),
        "bright_white" => Some("\x1b[97m"),
        _ => None,
    }
}

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate, then the COLUMNS environment variable,
/// then a fixed default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn dim_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_DIM, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Wrap text in the stage's color (TTY only, unknown colors stay plain)
fn stage_colored(text: &str, stage: &StageDefinition, is_tty: bool) -> String {
    match stage.color.as_deref().and_then(color_name_to_fg) {
        Some(fg) if is_tty => format!("{}{}{}", fg, text, ANSI_RESET),
        _ => text.to_string(),
    }
}

fn fg_if_tty(text: &str, fg: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", fg, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Truncate by character count so multi-byte names are never split
fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let truncated: String = value.chars().take(width.saturating_sub(2)).collect();
        format!("{}..", truncated)
    } else {
        value.to_string()
    }
}

/// Pad by character count; `{:<width$}` would miscount non-ASCII names
fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        value.to_string()
    } else {
        format!("{}{}", value, " ".repeat(width - len))
    }
}

fn column_width(values: impl Iterator<Item = usize>, header: &str) -> usize {
    values.max().unwrap_or(0).max(header.chars().count())
}

/// Money with thousands separators and two decimals, e.g. "12,500.00"
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac)
}

/// Text progress bar, e.g. "[######----] 60%"
pub fn format_progress_bar(percent: f64, width: usize) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled)),
        percent
    )
}

/// Case list table: one row per case, title column takes what the terminal leaves
pub fn format_case_list_table(
    cases: &[CaseRecord],
    registry: &CatalogRegistry,
    options: &StatsOptions,
    locale: &str,
    tty: bool,
) -> String {
    if cases.is_empty() {
        return "No cases found.\n".to_string();
    }

    struct Row<'a> {
        id: String,
        number: String,
        title: String,
        category: String,
        stage: &'a StageDefinition,
        days: i64,
        priority: String,
        claim: String,
        status: String,
        stale: bool,
    }

    let rows: Vec<Row> = cases
        .iter()
        .map(|case| {
            let (_, stage) = resolve_stage(registry.get(&case.category), case);
            let status = if case.outcome.is_decided() {
                format!("{}/{}", case.status.as_str(), case.outcome.as_str())
            } else {
                case.status.as_str().to_string()
            };
            Row {
                id: case.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
                number: case.case_number.clone().unwrap_or_default(),
                title: case.title.clone(),
                category: case.category.clone(),
                stage,
                days: days_in_stage(case, options.now),
                priority: case.priority.as_str().to_string(),
                claim: format_amount(case.claim_amount),
                status,
                stale: case.is_active() && is_stale(case, options.now, options.stale_days),
            }
        })
        .collect();

    let headers = ["ID", "Number", "Title", "Category", "Stage", "Days", "Priority", "Claim", "Status"];
    let w_id = column_width(rows.iter().map(|r| r.id.len()), headers[0]);
    let w_number = column_width(rows.iter().map(|r| r.number.chars().count()), headers[1]);
    let w_category = column_width(rows.iter().map(|r| r.category.chars().count()), headers[3]);
    let w_stage = column_width(rows.iter().map(|r| r.stage.display_name(locale).chars().count()), headers[4]);
    let w_days = column_width(rows.iter().map(|r| r.days.to_string().len() + 1), headers[5]);
    let w_priority = column_width(rows.iter().map(|r| r.priority.len()), headers[6]);
    let w_claim = column_width(rows.iter().map(|r| r.claim.len()), headers[7]);
    let w_status = column_width(rows.iter().map(|r| r.status.len()), headers[8]);

    // Title gets the remainder of the terminal width, within limits
    let fixed = w_id + w_number + w_category + w_stage + w_days + w_priority + w_claim + w_status + 8;
    let natural_title = column_width(rows.iter().map(|r| r.title.chars().count()), headers[2]);
    let w_title = natural_title.min(get_terminal_width().saturating_sub(fixed).max(12));

    let mut output = String::new();
    let header = format!(
        "{} {} {} {} {} {:>w_days$} {} {:>w_claim$} {}",
        pad(headers[0], w_id),
        pad(headers[1], w_number),
        pad(headers[2], w_title),
        pad(headers[3], w_category),
        pad(headers[4], w_stage),
        headers[5],
        pad(headers[6], w_priority),
        headers[7],
        headers[8],
        w_days = w_days,
        w_claim = w_claim,
    );
    output.push_str(&bold_if_tty(header.trim_end(), tty));
    output.push('\n');
    output.push_str(&"-".repeat(fixed + w_title));
    output.push('\n');

    for row in &rows {
        let stage_cell = stage_colored(&pad(row.stage.display_name(locale), w_stage), row.stage, tty);
        let days_cell = format!("{:>w$}", format!("{}d", row.days), w = w_days);
        let days_cell = if row.stale { fg_if_tty(&days_cell, ANSI_FG_RED, tty) } else { days_cell };
        let line = format!(
            "{} {} {} {} {} {} {} {:>w_claim$} {}",
            bold_if_tty(&pad(&row.id, w_id), tty),
            pad(&row.number, w_number),
            pad(&truncate(&row.title, w_title), w_title),
            pad(&row.category, w_category),
            stage_cell,
            days_cell,
            pad(&row.priority, w_priority),
            row.claim,
            row.status,
            w_claim = w_claim,
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output.push_str(&format!("\n{} case(s)\n", rows.len()));
    output
}

/// Detailed view of one case
pub fn format_case_summary(
    case: &CaseRecord,
    catalog: &PipelineCatalog,
    history: &[StageTransition],
    now: i64,
    locale: &str,
    tty: bool,
) -> String {
    let mut output = String::new();

    let header = format!("Case {}: {}", case.label(), case.title);
    output.push_str(&bold_if_tty(&header, tty));
    output.push('\n');
    output.push_str(&"=".repeat(header.chars().count().max(60)));
    output.push_str("\n\n");

    let (index, stage) = resolve_stage(catalog, case);
    let days = days_in_stage(case, now);

    output.push_str(&format!("Category:    {}\n", case.category));
    output.push_str(&format!("Priority:    {}\n", case.priority.as_str()));
    output.push_str(&format!("Status:      {}\n", case.status.as_str()));
    output.push_str(&format!("Outcome:     {}\n", case.outcome.as_str()));
    if let Some(number) = &case.case_number {
        output.push_str(&format!("Number:      {}\n", number));
    }
    if let Some(court) = &case.court {
        output.push_str(&format!("Court:       {}\n", court));
    }
    output.push_str(&format!(
        "Parties:     {} v. {}\n",
        case.plaintiff_name.as_deref().unwrap_or("(none)"),
        case.defendant_name.as_deref().unwrap_or("(none)")
    ));
    output.push_str(&format!("Claim:       {}\n", format_amount(case.claim_amount)));
    output.push_str(&format!("Created:     {}\n", format_timestamp(case.created_ts)));
    output.push_str(&format!("Modified:    {}\n\n", format_timestamp(case.modified_ts)));

    // Pipeline position
    output.push_str("Pipeline:\n");
    let mut sla_note = String::new();
    if let Some(max) = stage.max_duration_days {
        sla_note = format!(" (target {}d)", max);
        if is_over_sla(stage, days) {
            sla_note = fg_if_tty(&format!(" (over target of {}d)", max), ANSI_FG_YELLOW, tty);
        }
    }
    output.push_str(&format!(
        "  Stage:     {} [{}/{}] for {} day(s){}\n",
        stage_colored(stage.display_name(locale), stage, tty),
        index + 1,
        catalog.len(),
        days,
        sla_note
    ));
    output.push_str(&format!("  Progress:  {}\n", format_progress_bar(progress_percent(catalog, index), 20)));

    let chain: Vec<String> = catalog
        .stages()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i == index {
                bold_if_tty(&format!("[{}]", s.id), tty)
            } else if i < index {
                s.id.clone()
            } else {
                dim_if_tty(&s.id, tty)
            }
        })
        .collect();
    output.push_str(&format!("  Route:     {}\n", chain.join(" > ")));

    if case.outcome.is_decided() || case.end_ts.is_some() {
        output.push_str("\nClosure:\n");
        output.push_str(&format!("  Outcome:   {}\n", case.outcome.as_str()));
        output.push_str(&format!("  Reason:    {}\n", case.end_reason.as_deref().unwrap_or("(none)")));
        if let Some(amount) = case.final_amount {
            output.push_str(&format!("  Amount:    {}\n", format_amount(amount)));
        }
        if let Some(notes) = case.end_notes.as_deref().filter(|n| !n.is_empty()) {
            output.push_str(&format!("  Notes:     {}\n", notes));
        }
        if let Some(ts) = case.end_ts {
            output.push_str(&format!("  Closed:    {}\n", format_timestamp(ts)));
        }
    }

    if !history.is_empty() {
        output.push_str("\nRecent moves:\n");
        for transition in history.iter().rev().take(5) {
            output.push_str(&format!(
                "  {}  {} -> {}\n",
                format_date(transition.ts),
                transition.from_stage.as_deref().unwrap_or("(new)"),
                transition.to_stage
            ));
        }
    }

    output
}

/// Stage transition log plus time spent per stage
pub fn format_history(
    case: &CaseRecord,
    catalog: &PipelineCatalog,
    history: &[StageTransition],
    now: i64,
    locale: &str,
) -> String {
    let mut output = format!("Stage history for case {}: {}\n\n", case.label(), case.title);

    if history.is_empty() {
        output.push_str("No stage moves recorded.\n");
    } else {
        for transition in history {
            output.push_str(&format!(
                "{}  {:<22} -> {}\n",
                format_timestamp(transition.ts),
                transition.from_stage.as_deref().unwrap_or("(new)"),
                transition.to_stage
            ));
        }
    }

    let dwell = stage_dwell(history, case, now);
    if !dwell.is_empty() {
        output.push_str("\nTime in stage:\n");
        // Catalog order first, then stage ids no longer in the catalog
        for stage in catalog.stages() {
            if let Some(secs) = dwell.get(&stage.id) {
                output.push_str(&format!("  {:<28} {}\n", stage.display_name(locale), format_dwell(*secs)));
            }
        }
        let mut unknown: Vec<(&String, &i64)> = dwell.iter().filter(|(id, _)| !catalog.contains(id)).collect();
        unknown.sort();
        for (id, secs) in unknown {
            output.push_str(&format!("  {:<28} {}\n", format!("{} (retired)", id), format_dwell(*secs)));
        }
    }

    output
}

/// Board: one section per stage in catalog order
pub fn format_board(
    catalog: &PipelineCatalog,
    groups: &[(&StageDefinition, Vec<&CaseRecord>)],
    stats: &BoardStats,
    options: &StatsOptions,
    locale: &str,
    tty: bool,
) -> String {
    let mut output = String::new();
    let width = get_terminal_width().min(100);

    output.push_str(&bold_if_tty(&format!("Board: {}", catalog.category()), tty));
    output.push_str(&format!(
        "  ({} case(s), {} claimed)\n\n",
        stats.totals.count,
        format_amount(stats.totals.total_claim_value)
    ));

    for (stage, members) in groups {
        let stage_stats = stats.stage(&stage.id);
        let count = stage_stats.map(|s| s.count).unwrap_or(0);
        let total = stage_stats.map(|s| s.total_claim_value).unwrap_or(0.0);
        let overdue = stage_stats.map(|s| s.overdue_count).unwrap_or(0);

        let mut title = format!("{} ({})", stage.display_name(locale), count);
        if count > 0 {
            title.push_str(&format!("  {}", format_amount(total)));
        }
        output.push_str(&format!("=== {} ===", stage_colored(&title, stage, tty)));
        if overdue > 0 {
            output.push_str(&fg_if_tty(&format!("  {} overdue", overdue), ANSI_FG_RED, tty));
        }
        output.push('\n');

        if members.is_empty() {
            output.push_str(&dim_if_tty("  (empty)", tty));
            output.push('\n');
        }
        for case in members {
            let days = days_in_stage(case, options.now);
            let marker = if days > options.overdue_days as i64 { "!" } else { " " };
            let prefix = format!(
                "  {}{:>4} {:>4}d ",
                marker,
                case.id.map(|id| id.to_string()).unwrap_or_default(),
                days
            );
            let suffix = format!(" {:>14}", format_amount(case.claim_amount));
            let room = width.saturating_sub(prefix.len() + suffix.len()).max(10);
            let line = format!("{}{}{}", prefix, pad(&truncate(&case.title, room), room), suffix);
            if marker == "!" {
                output.push_str(&fg_if_tty(&line, ANSI_FG_RED, tty));
            } else {
                output.push_str(&line);
            }
            output.push('\n');
        }
        output.push('\n');
    }

    output
}

/// Statistics dashboard: totals plus stage distribution
pub fn format_stats_dashboard(
    catalog: Option<&PipelineCatalog>,
    stats: &BoardStats,
    locale: &str,
    tty: bool,
) -> String {
    let mut output = String::new();
    let totals = &stats.totals;

    output.push_str("=== Portfolio ===\n");
    output.push_str(&format!("Cases:         {}\n", totals.count));
    output.push_str(&format!("Active:        {}\n", totals.active));
    output.push_str(&format!("Claimed:       {}\n", format_amount(totals.total_claim_value)));
    output.push_str(&format!("Urgent:        {}\n", totals.urgent_count));
    let stale = format!("Stale:         {}\n", totals.stale_count);
    if totals.stale_count > 0 {
        output.push_str(&fg_if_tty(&stale, ANSI_FG_YELLOW, tty));
    } else {
        output.push_str(&stale);
    }
    output.push('\n');

    output.push_str("=== Outcomes ===\n");
    output.push_str(&format!("Won:           {}\n", totals.won));
    output.push_str(&format!("Lost:          {}\n", totals.lost));
    output.push_str(&format!("Settled:       {}\n", totals.settled));
    output.push_str(&format!("Win rate:      {}%\n", totals.win_rate));

    if let Some(catalog) = catalog {
        output.push_str(&format!("\n=== Stages ({}) ===\n", catalog.category()));
        let max_count = stats.per_stage.iter().map(|s| s.count).max().unwrap_or(0).max(1);
        for stage_stats in &stats.per_stage {
            let Some(stage) = catalog.stage(&stage_stats.stage_id) else {
                continue;
            };
            let bar_len = (stage_stats.count * 20).div_ceil(max_count);
            let bar = stage_colored(&"#".repeat(bar_len), stage, tty);
            output.push_str(&format!(
                "{} {:>4} {}\n",
                pad(&truncate(stage.display_name(locale), 28), 28),
                stage_stats.count,
                bar
            ));
        }
    }

    output
}

/// Stage catalog listing
pub fn format_stage_list(catalog: &PipelineCatalog, locale: &str, tty: bool) -> String {
    let mut output = String::new();
    output.push_str(&bold_if_tty(&format!("Stages for {}", catalog.category()), tty));
    output.push('\n');

    let w_id = catalog.stages().iter().map(|s| s.id.len()).max().unwrap_or(2).max(2);
    let w_name = catalog
        .stages()
        .iter()
        .map(|s| s.display_name(locale).chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    output.push_str(&format!(
        "{:>3}  {}  {}  {:<9} {:<7} {}\n",
        "#",
        pad("ID", w_id),
        pad("Name", w_name),
        "Mandatory",
        "Can end",
        "Target"
    ));
    for stage in catalog.stages() {
        let line = format!(
            "{:>3}  {}  {}  {:<9} {:<7} {}",
            stage.order,
            pad(&stage.id, w_id),
            pad(stage.display_name(locale), w_name),
            if stage.is_mandatory { "yes" } else { "" },
            if stage.can_end { "yes" } else { "" },
            stage.max_duration_days.map(|d| format!("{}d", d)).unwrap_or_default()
        );
        output.push_str(&stage_colored(line.trim_end(), stage, tty));
        output.push('\n');
    }

    output
}
