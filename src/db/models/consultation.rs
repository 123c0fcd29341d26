use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConsultationStatus {
    Active,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Active => "Active",
            ConsultationStatus::Completed => "Completed",
            ConsultationStatus::Cancelled => "Cancelled",
        }
    }
}

/// One simulated consultation, from start until it ends or is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: String,
    pub user_id: String,
    pub agent: AgentKind,
    pub agent_session_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: ConsultationStatus,
    pub duration_secs: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consultation {
    /// Duration as shown in the history list: `1h 5m` or `12m`.
    pub fn duration_label(&self) -> String {
        let minutes = self.duration_secs / 60;
        let hours = minutes / 60;
        if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }
}
