// Date expression parsing and display helpers

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use anyhow::Result;

/// Parse a date expression and return a Unix timestamp (UTC)
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM`, `today`, `yesterday` and
/// day offsets into the past such as `-20d`.
pub fn parse_date_expr(expr: &str) -> Result<i64> {
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        let datetime = date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
        return local_to_ts(&datetime);
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(expr, "%Y-%m-%dT%H:%M") {
        return local_to_ts(&datetime);
    }

    let now = Local::now();
    match expr {
        "now" => Ok(now.timestamp()),
        "today" | "yesterday" => {
            let offset = if expr == "today" { 0 } else { 1 };
            let day = (now.date_naive() - chrono::Duration::days(offset))
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
            local_to_ts(&day)
        }
        _ => {
            if let Some(days) = expr.strip_prefix('-').and_then(|rest| rest.strip_suffix('d')) {
                let days: i64 = days.parse()
                    .map_err(|_| anyhow::anyhow!("Invalid day offset: {}", expr))?;
                if days < 0 {
                    anyhow::bail!("Invalid day offset: {}", expr);
                }
                return days
                    .checked_mul(86_400)
                    .and_then(|secs| now.timestamp().checked_sub(secs))
                    .ok_or_else(|| anyhow::anyhow!("Invalid day offset: {}", expr));
            }
            anyhow::bail!("Unsupported date expression: {}. Use YYYY-MM-DD, today, yesterday or -Nd.", expr)
        }
    }
}

fn local_to_ts(datetime: &NaiveDateTime) -> Result<i64> {
    let local_dt = Local.from_local_datetime(datetime)
        .single()
        .ok_or_else(|| anyhow::anyhow!("Ambiguous local time"))?;
    Ok(local_dt.timestamp())
}

/// Format timestamp as a local date (YYYY-MM-DD)
pub fn format_date(ts: i64) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}

/// Format timestamp as local date and time
pub fn format_timestamp(ts: i64) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Compact duration for dwell times, e.g. "12d 4h", "3h 20m", "45m"
pub fn format_dwell(secs: i64) -> String {
    let secs = secs.max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
