//! List argument parser
//!
//! Turns `list` arguments into a `CaseQuery`.
//!
//! # Grammar
//!
//! ```text
//! args     := token*
//! token    := category=<name> | status=<all|active|closed> | sort=<updated|created|title|claim> | word
//! ```
//!
//! `key:value` is accepted as well as `key=value`. Bare words are joined with a
//! single space and used as the search text.
//!
//! # Example
//!
//! ```
//! use casetrack::filter::parse_query;
//!
//! let query = parse_query(vec!["category=labor".to_string(), "wages".to_string()]).unwrap();
//! assert_eq!(query.category.as_deref(), Some("labor"));
//! assert_eq!(query.search.as_deref(), Some("wages"));
//! ```

use crate::filter::query::{CaseQuery, SortKey, StatusFilter};

pub fn parse_query(tokens: Vec<String>) -> Result<CaseQuery, String> {
    let mut query = CaseQuery::default();
    let mut words: Vec<String> = Vec::new();

    for token in tokens {
        let Some((key, value)) = split_field(&token) else {
            words.push(token);
            continue;
        };

        match key {
            "category" | "cat" => {
                if value.is_empty() {
                    return Err("category filter requires a value".to_string());
                }
                query.category = if value == "all" { None } else { Some(value.to_string()) };
            }
            "status" => {
                query.status = StatusFilter::from_str(value)
                    .ok_or_else(|| format!("Invalid status filter: '{}'. Use all, active or closed.", value))?;
            }
            "sort" => {
                query.sort = SortKey::from_str(value)
                    .ok_or_else(|| format!("Invalid sort key: '{}'. Use updated, created, title or claim.", value))?;
            }
            // Not a known field: treat as search text (e.g. "10:30")
            _ => words.push(token.clone()),
        }
    }

    if !words.is_empty() {
        query.search = Some(words.join(" "));
    }

    Ok(query)
}

fn split_field(token: &str) -> Option<(&str, &str)> {
    let pos = token.find(['=', ':'])?;
    Some((&token[..pos], &token[pos + 1..]))
}
