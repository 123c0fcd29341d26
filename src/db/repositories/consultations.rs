use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{parse_agent, parse_datetime, parse_optional_datetime, parse_status, to_i64, to_u64},
    models::{Consultation, ConsultationStatus},
    Database,
};

const COLUMNS: &str = "id, user_id, agent, agent_session_id, started_at, ended_at, status, \
                       duration_secs, created_at, updated_at";

fn row_to_consultation(row: &Row) -> Result<Consultation> {
    let agent: String = row.get("agent")?;
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let status: String = row.get("status")?;
    let duration_secs: i64 = row.get("duration_secs")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Consultation {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        agent: parse_agent(&agent)?,
        agent_session_id: row.get("agent_session_id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        status: parse_status(&status)?,
        duration_secs: to_u64(duration_secs, "duration_secs")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn insert_consultation(&self, consultation: &Consultation) -> Result<()> {
        let record = consultation.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO consultations (id, user_id, agent, agent_session_id, started_at, ended_at, status, duration_secs, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.user_id,
                    record.agent.as_str(),
                    record.agent_session_id,
                    record.started_at.to_rfc3339(),
                    record.ended_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.status.as_str(),
                    to_i64(record.duration_secs)?,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert consultation")?;
            Ok(())
        })
        .await
    }

    pub async fn finish_consultation(
        &self,
        consultation_id: &str,
        status: ConsultationStatus,
        duration_secs: u64,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        let consultation_id = consultation_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE consultations
                 SET status = ?1,
                     duration_secs = ?2,
                     ended_at = ?3,
                     updated_at = ?3
                 WHERE id = ?4",
                params![
                    status.as_str(),
                    to_i64(duration_secs)?,
                    ended_at.to_rfc3339(),
                    consultation_id,
                ],
            )
            .with_context(|| "failed to update consultation status")?;
            Ok(())
        })
        .await
    }

    pub async fn get_consultation(&self, consultation_id: &str) -> Result<Option<Consultation>> {
        let consultation_id = consultation_id.to_string();
        self.execute(move |conn| {
            let sql = format!("SELECT {COLUMNS} FROM consultations WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt
                .query_row(params![consultation_id], |row| {
                    Ok(row_to_consultation(row))
                })
                .optional()?;
            row.transpose()
        })
        .await
    }

    /// A user's consultations, newest first.
    pub async fn list_consultations(&self, user_id: &str) -> Result<Vec<Consultation>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {COLUMNS} FROM consultations WHERE user_id = ?1 ORDER BY started_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![user_id])?;
            let mut consultations = Vec::new();
            while let Some(row) = rows.next()? {
                consultations.push(row_to_consultation(row)?);
            }
            Ok(consultations)
        })
        .await
    }

    /// Closes consultations left `Active` by a previous process. Returns how
    /// many were closed.
    pub async fn cancel_stale_consultations(&self, now: DateTime<Utc>) -> Result<usize> {
        self.execute(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE consultations
                     SET status = 'Cancelled',
                         ended_at = COALESCE(ended_at, ?1),
                         updated_at = ?1
                     WHERE status = 'Active'",
                    params![now.to_rfc3339()],
                )
                .with_context(|| "failed to cancel stale consultations")?;
            Ok(changed)
        })
        .await
    }
}
