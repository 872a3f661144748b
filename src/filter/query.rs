//! Case list query
//!
//! A `CaseQuery` carries everything a list view narrows and orders by:
//! free-text search, category, status bucket and sort key. `apply` is a pure
//! function over an already-fetched case set.

use crate::models::CaseRecord;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Not terminal and no decided outcome
    Active,
    /// Closed/completed status or a decided outcome
    Closed,
}

impl StatusFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(StatusFilter::All),
            "active" | "open" => Some(StatusFilter::Active),
            "closed" => Some(StatusFilter::Closed),
            _ => None,
        }
    }

    pub fn matches(&self, case: &CaseRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => case.is_active(),
            StatusFilter::Closed => case.is_closed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Most recently modified first
    #[default]
    Updated,
    /// Most recently created first
    Created,
    /// Title, ascending
    Title,
    /// Largest claim first
    Claim,
}

impl SortKey {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "updated" | "modified" => Some(SortKey::Updated),
            "created" => Some(SortKey::Created),
            "title" => Some(SortKey::Title),
            "claim" | "amount" => Some(SortKey::Claim),
            _ => None,
        }
    }

    fn compare(&self, a: &CaseRecord, b: &CaseRecord) -> Ordering {
        match self {
            SortKey::Updated => b.modified_ts.cmp(&a.modified_ts),
            SortKey::Created => b.created_ts.cmp(&a.created_ts),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Claim => b.claim_amount.partial_cmp(&a.claim_amount).unwrap_or(Ordering::Equal),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl CaseQuery {
    /// Any narrowing in effect (sort order alone does not count)
    pub fn has_active_filters(&self) -> bool {
        self.search.is_some() || self.category.is_some() || self.status != StatusFilter::All
    }

    pub fn matches(&self, case: &CaseRecord) -> bool {
        if let Some(category) = &self.category {
            if &case.category != category {
                return false;
            }
        }
        if !self.status.matches(case) {
            return false;
        }
        match &self.search {
            Some(text) => matches_search(case, text),
            None => true,
        }
    }

    /// Filter then sort. The sort is stable, so ties keep fetch order.
    pub fn apply(&self, cases: &[CaseRecord]) -> Vec<CaseRecord> {
        let mut matched: Vec<CaseRecord> = cases.iter().filter(|c| self.matches(c)).cloned().collect();
        matched.sort_by(|a, b| self.sort.compare(a, b));
        matched
    }
}

/// Case-insensitive substring match over title, case number and party names
fn matches_search(case: &CaseRecord, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let contains = |field: Option<&str>| {
        field.map_or(false, |value| value.to_lowercase().contains(&needle))
    };
    contains(Some(&case.title))
        || contains(case.case_number.as_deref())
        || contains(case.plaintiff_name.as_deref())
        || contains(case.defendant_name.as_deref())
}
