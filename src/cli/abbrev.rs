// Command abbreviation matching ("bo" -> "board", "hist" -> "history")

/// Top-level commands of casetrack
pub const TOP_LEVEL_COMMANDS: &[&str] = &[
    "add", "list", "show", "move", "next", "prev", "end", "board", "stats", "stages", "history",
];

/// Find a unique command for the given prefix.
/// An exact match wins over prefix matches; `Err` carries the candidates
/// (empty when nothing matches).
pub fn find_unique_command<'a>(prefix: &str, commands: &'a [&str]) -> Result<&'a str, Vec<&'a str>> {
    let prefix_lower = prefix.to_lowercase();
    if let Some(exact) = commands.iter().find(|cmd| cmd.to_lowercase() == prefix_lower) {
        return Ok(*exact);
    }

    let matches: Vec<&str> = commands
        .iter()
        .filter(|cmd| cmd.to_lowercase().starts_with(&prefix_lower))
        .copied()
        .collect();

    if matches.len() == 1 {
        Ok(matches[0])
    } else {
        Err(matches)
    }
}

/// Expand an abbreviated command in first position.
/// Flags, numbers and unknown words pass through for clap to report.
pub fn expand_command_abbreviations(mut args: Vec<String>) -> Result<Vec<String>, String> {
    let Some(first) = args.first() else {
        return Ok(args);
    };
    if first.starts_with('-') || first.parse::<i64>().is_ok() {
        return Ok(args);
    }

    match find_unique_command(first, TOP_LEVEL_COMMANDS) {
        Ok(full) => args[0] = full.to_string(),
        Err(matches) if matches.len() > 1 => {
            return Err(format!(
                "Ambiguous command '{}'. Did you mean one of: {}?",
                first,
                matches.join(", ")
            ));
        }
        Err(_) => {}
    }

    Ok(args)
}
