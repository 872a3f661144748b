use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::{CaseOutcome, CasePatch, CasePriority, CaseRecord, CaseStatus, StageTransition};
use crate::pipeline::store::{CaseFilter, CaseStore};
use anyhow::{Context, Result};

const CASE_COLUMNS: &str =
    "id, uuid, case_number, title, category, priority, status, outcome, current_stage,
     stage_entered_ts, claim_amount, plaintiff_name, defendant_name, court, end_reason,
     end_notes, final_amount, end_ts, created_ts, modified_ts";

/// Case repository for database operations
pub struct CaseRepo;

impl CaseRepo {
    /// Insert a new case. When it starts in a stage, the entry is recorded
    /// in the transition history in the same transaction.
    pub fn create(conn: &Connection, case: &CaseRecord) -> Result<CaseRecord> {
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO cases (uuid, case_number, title, category, priority, status, outcome,
                    current_stage, stage_entered_ts, claim_amount, plaintiff_name, defendant_name,
                    court, end_reason, end_notes, final_amount, end_ts, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            rusqlite::params![
                case.uuid,
                case.case_number,
                case.title,
                case.category,
                case.priority.as_str(),
                case.status.as_str(),
                case.outcome.as_str(),
                case.current_stage,
                case.stage_entered_ts,
                case.claim_amount,
                case.plaintiff_name,
                case.defendant_name,
                case.court,
                case.end_reason,
                case.end_notes,
                case.final_amount,
                case.end_ts,
                case.created_ts,
                case.modified_ts,
            ],
        )
        .with_context(|| format!("Failed to create case: {}", case.title))?;

        let id = tx.last_insert_rowid();

        if let Some(stage) = &case.current_stage {
            let ts = case.stage_entered_ts.unwrap_or(case.created_ts);
            record_transition(&tx, id, None, stage, ts)?;
        }

        tx.commit()?;

        Ok(CaseRecord {
            id: Some(id),
            ..case.clone()
        })
    }

    /// Get case by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<CaseRecord>> {
        let sql = format!("SELECT {} FROM cases WHERE id = ?1", CASE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let case = stmt.query_row([id], row_to_case).optional()?;
        Ok(case)
    }

    /// List cases narrowed by category and status, most recently modified first
    pub fn list(conn: &Connection, filter: &CaseFilter) -> Result<Vec<CaseRecord>> {
        let mut clauses = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(category) = &filter.category {
            params.push(Box::new(category.clone()));
            clauses.push(format!("category = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(Box::new(status.as_str()));
            clauses.push(format!("status = ?{}", params.len()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM cases{} ORDER BY modified_ts DESC, id DESC",
            CASE_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_case)?;

        let mut cases = Vec::new();
        for row in rows {
            cases.push(row?);
        }
        Ok(cases)
    }

    /// Apply a partial update and return the stored record.
    ///
    /// A change of `current_stage` appends a row to `stage_transitions`
    /// within the same transaction.
    pub fn update(conn: &Connection, id: i64, patch: &CasePatch) -> Result<CaseRecord> {
        let tx = conn.unchecked_transaction()?;

        let before = Self::get_by_id(&tx, id)?
            .with_context(|| format!("Case {} not found", id))?;
        if patch.is_empty() {
            return Ok(before);
        }

        let now = chrono::Utc::now().timestamp();
        let mut sets = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(stage) = &patch.current_stage {
            sets.push("current_stage = ?");
            params.push(Box::new(stage.clone()));
        }
        if let Some(ts) = patch.stage_entered_ts {
            sets.push("stage_entered_ts = ?");
            params.push(Box::new(ts));
        }
        if let Some(status) = patch.status {
            sets.push("status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(outcome) = patch.outcome {
            sets.push("outcome = ?");
            params.push(Box::new(outcome.as_str()));
        }
        if let Some(reason) = &patch.end_reason {
            sets.push("end_reason = ?");
            params.push(Box::new(reason.clone()));
        }
        if let Some(notes) = &patch.end_notes {
            sets.push("end_notes = ?");
            params.push(Box::new(notes.clone()));
        }
        if let Some(amount) = patch.final_amount {
            sets.push("final_amount = ?");
            params.push(Box::new(amount));
        }
        if let Some(ts) = patch.end_ts {
            sets.push("end_ts = ?");
            params.push(Box::new(ts));
        }
        sets.push("modified_ts = ?");
        params.push(Box::new(now));

        // Number the parameters
        let numbered_sets: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, set)| set.replace('?', &format!("?{}", i + 1)))
            .collect();
        let sql = format!(
            "UPDATE cases SET {} WHERE id = ?{}",
            numbered_sets.join(", "),
            params.len() + 1
        );
        params.push(Box::new(id));

        let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        tx.execute(&sql, param_refs.as_slice())
            .with_context(|| format!("Failed to update case {}", id))?;

        if let Some(stage) = &patch.current_stage {
            if before.current_stage.as_deref() != Some(stage.as_str()) {
                let ts = patch.stage_entered_ts.unwrap_or(now);
                record_transition(&tx, id, before.current_stage.as_deref(), stage, ts)?;
            }
        }

        let after = Self::get_by_id(&tx, id)?
            .with_context(|| format!("Case {} vanished during update", id))?;
        tx.commit()?;

        Ok(after)
    }

    /// Stage history for a case, oldest first
    pub fn history(conn: &Connection, case_id: i64) -> Result<Vec<StageTransition>> {
        let mut stmt = conn.prepare(
            "SELECT id, case_id, from_stage, to_stage, ts
             FROM stage_transitions WHERE case_id = ?1 ORDER BY ts, id"
        )?;

        let rows = stmt.query_map([case_id], |row| {
            Ok(StageTransition {
                id: Some(row.get(0)?),
                case_id: row.get(1)?,
                from_stage: row.get(2)?,
                to_stage: row.get(3)?,
                ts: row.get(4)?,
            })
        })?;

        let mut history = Vec::new();
        for row in rows {
            history.push(row?);
        }
        Ok(history)
    }
}

fn record_transition(conn: &Connection, case_id: i64, from: Option<&str>, to: &str, ts: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO stage_transitions (case_id, from_stage, to_stage, ts) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![case_id, from, to, ts],
    )
    .with_context(|| format!("Failed to record stage transition for case {}", case_id))?;
    log::debug!("case {}: {} -> {}", case_id, from.unwrap_or("(new)"), to);
    Ok(())
}

fn row_to_case(row: &Row) -> rusqlite::Result<CaseRecord> {
    Ok(CaseRecord {
        id: Some(row.get(0)?),
        uuid: row.get(1)?,
        case_number: row.get(2)?,
        title: row.get(3)?,
        category: row.get(4)?,
        priority: CasePriority::from_str(&row.get::<_, String>(5)?)
            .unwrap_or(CasePriority::Medium),
        status: CaseStatus::from_str(&row.get::<_, String>(6)?)
            .unwrap_or(CaseStatus::Active),
        outcome: CaseOutcome::from_str(&row.get::<_, String>(7)?)
            .unwrap_or(CaseOutcome::Ongoing),
        current_stage: row.get(8)?,
        stage_entered_ts: row.get(9)?,
        claim_amount: row.get(10)?,
        plaintiff_name: row.get(11)?,
        defendant_name: row.get(12)?,
        court: row.get(13)?,
        end_reason: row.get(14)?,
        end_notes: row.get(15)?,
        final_amount: row.get(16)?,
        end_ts: row.get(17)?,
        created_ts: row.get(18)?,
        modified_ts: row.get(19)?,
    })
}

/// A SQLite connection is the production case store
impl CaseStore for Connection {
    fn fetch_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseRecord>> {
        CaseRepo::list(self, filter)
    }

    fn fetch_case(&self, id: i64) -> Result<Option<CaseRecord>> {
        CaseRepo::get_by_id(self, id)
    }

    fn update_case(&self, id: i64, patch: &CasePatch) -> Result<CaseRecord> {
        CaseRepo::update(self, id, patch)
    }
}
