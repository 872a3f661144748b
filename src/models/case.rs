use serde::{Deserialize, Serialize};

/// Case status (lifecycle state)
///
/// - Active / OnHold / Appeal: case is alive and can move through its pipeline
/// - Closed / Completed / Archived: terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Active,
    OnHold,
    Appeal,
    Closed,
    Completed,
    Archived,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Active => "active",
            CaseStatus::OnHold => "on_hold",
            CaseStatus::Appeal => "appeal",
            CaseStatus::Closed => "closed",
            CaseStatus::Completed => "completed",
            CaseStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CaseStatus::Active),
            "on_hold" | "on-hold" => Some(CaseStatus::OnHold),
            "appeal" => Some(CaseStatus::Appeal),
            "closed" => Some(CaseStatus::Closed),
            "completed" => Some(CaseStatus::Completed),
            "archived" => Some(CaseStatus::Archived),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Completed | Self::Archived)
    }
}

/// How a case ended. `Ongoing` until the case is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    Ongoing,
    Won,
    Lost,
    Settled,
}

impl CaseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseOutcome::Ongoing => "ongoing",
            CaseOutcome::Won => "won",
            CaseOutcome::Lost => "lost",
            CaseOutcome::Settled => "settled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ongoing" => Some(CaseOutcome::Ongoing),
            "won" => Some(CaseOutcome::Won),
            "lost" => Some(CaseOutcome::Lost),
            "settled" => Some(CaseOutcome::Settled),
            _ => None,
        }
    }

    /// Won, lost or settled
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    /// Counts towards the win rate numerator
    pub fn is_favorable(&self) -> bool {
        matches!(self, Self::Won | Self::Settled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl CasePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasePriority::Low => "low",
            CasePriority::Medium => "medium",
            CasePriority::High => "high",
            CasePriority::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(CasePriority::Low),
            "medium" => Some(CasePriority::Medium),
            "high" => Some(CasePriority::High),
            "critical" => Some(CasePriority::Critical),
            _ => None,
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

/// Case model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: Option<i64>,
    pub uuid: String,
    pub case_number: Option<String>,
    pub title: String,
    pub category: String,
    pub priority: CasePriority,
    pub status: CaseStatus,
    pub outcome: CaseOutcome,
    pub current_stage: Option<String>,
    pub stage_entered_ts: Option<i64>,
    pub claim_amount: f64,
    pub plaintiff_name: Option<String>,
    pub defendant_name: Option<String>,
    pub court: Option<String>,
    pub end_reason: Option<String>,
    pub end_notes: Option<String>,
    pub final_amount: Option<f64>,
    pub end_ts: Option<i64>,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl CaseRecord {
    /// Create a new active case in the given category
    pub fn new(title: String, category: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            case_number: None,
            title,
            category,
            priority: CasePriority::Medium,
            status: CaseStatus::Active,
            outcome: CaseOutcome::Ongoing,
            current_stage: None,
            stage_entered_ts: None,
            claim_amount: 0.0,
            plaintiff_name: None,
            defendant_name: None,
            court: None,
            end_reason: None,
            end_notes: None,
            final_amount: None,
            end_ts: None,
            created_ts: now,
            modified_ts: now,
        }
    }

    /// Still moving through the pipeline: status not terminal and no decided outcome
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal() && !self.outcome.is_decided()
    }

    /// Closed by status or by a decided outcome
    pub fn is_closed(&self) -> bool {
        matches!(self.status, CaseStatus::Closed | CaseStatus::Completed) || self.outcome.is_decided()
    }

    /// Case number when present, otherwise the numeric id
    pub fn label(&self) -> String {
        match (&self.case_number, self.id) {
            (Some(number), _) if !number.is_empty() => number.clone(),
            (_, Some(id)) => format!("#{}", id),
            _ => self.uuid.chars().take(8).collect(),
        }
    }
}

/// Partial update applied by the persistence collaborator.
/// `None` leaves the stored field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_entered_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CaseOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<i64>,
}

impl CasePatch {
    pub fn is_empty(&self) -> bool {
        *self == CasePatch::default()
    }

    /// Copy every set field onto `case`
    pub fn apply_to(&self, case: &mut CaseRecord) {
        if let Some(stage) = &self.current_stage {
            case.current_stage = Some(stage.clone());
        }
        if let Some(ts) = self.stage_entered_ts {
            case.stage_entered_ts = Some(ts);
        }
        if let Some(status) = self.status {
            case.status = status;
        }
        if let Some(outcome) = self.outcome {
            case.outcome = outcome;
        }
        if let Some(reason) = &self.end_reason {
            case.end_reason = Some(reason.clone());
        }
        if let Some(notes) = &self.end_notes {
            case.end_notes = Some(notes.clone());
        }
        if let Some(amount) = self.final_amount {
            case.final_amount = Some(amount);
        }
        if let Some(ts) = self.end_ts {
            case.end_ts = Some(ts);
        }
    }
}

/// A recorded stage move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub id: Option<i64>,
    pub case_id: i64,
    pub from_stage: Option<String>,
    pub to_stage: String,
    pub ts: i64,
}
