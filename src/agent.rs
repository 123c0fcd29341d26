//! Video-agent provisioning.
//!
//! The live agent backend is an external collaborator. Callers go through
//! [`AgentProvider`]; [`FallbackAgentProvider`] hides backend failures behind
//! the same mock payloads the rest of the crate is tested against.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    #[default]
    Doctor,
    Nurse,
    Specialist,
}

impl AgentKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::Doctor => "Dr. Aarogya",
            AgentKind::Nurse => "Nurse Priya",
            AgentKind::Specialist => "Dr. Specialist",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Doctor => "doctor",
            AgentKind::Nurse => "nurse",
            AgentKind::Specialist => "specialist",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentSessionStatus {
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSession {
    pub id: String,
    pub status: AgentSessionStatus,
    pub duration: u64,
    pub participant_count: u32,
    pub created_at: DateTime<Utc>,
    pub agent_type: AgentKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub specialization: Vec<String>,
    pub languages: Vec<String>,
    pub is_active: bool,
}

#[async_trait]
pub trait AgentProvider: Send + Sync {
    async fn create_session(&self, agent: AgentKind, user_id: &str) -> Result<AgentSession>;

    async fn end_session(&self, session_id: &str) -> Result<()>;

    async fn available_agents(&self) -> Result<Vec<AgentProfile>>;
}

/// Answers every call locally with the development payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockAgentProvider;

#[async_trait]
impl AgentProvider for MockAgentProvider {
    async fn create_session(&self, agent: AgentKind, _user_id: &str) -> Result<AgentSession> {
        Ok(AgentSession {
            id: format!("mock_session_{}", Uuid::new_v4().simple()),
            status: AgentSessionStatus::Active,
            duration: 0,
            participant_count: 1,
            created_at: Utc::now(),
            agent_type: agent,
        })
    }

    async fn end_session(&self, _session_id: &str) -> Result<()> {
        Ok(())
    }

    async fn available_agents(&self) -> Result<Vec<AgentProfile>> {
        Ok(vec![AgentProfile {
            id: "dr-aarogya".into(),
            name: AgentKind::Doctor.display_name().into(),
            kind: AgentKind::Doctor,
            specialization: vec!["general_medicine".into(), "preventive_care".into()],
            languages: vec!["en".into(), "hi".into()],
            is_active: true,
        }])
    }
}

/// Tries `primary` first and substitutes the mock payload on any failure.
pub struct FallbackAgentProvider<P> {
    primary: P,
    mock: MockAgentProvider,
}

impl<P: AgentProvider> FallbackAgentProvider<P> {
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            mock: MockAgentProvider,
        }
    }
}

#[async_trait]
impl<P: AgentProvider> AgentProvider for FallbackAgentProvider<P> {
    async fn create_session(&self, agent: AgentKind, user_id: &str) -> Result<AgentSession> {
        match self.primary.create_session(agent, user_id).await {
            Ok(session) => Ok(session),
            Err(err) => {
                log_warn!("Agent session provisioning failed, using mock session: {err:#}");
                self.mock.create_session(agent, user_id).await
            }
        }
    }

    async fn end_session(&self, session_id: &str) -> Result<()> {
        if let Err(err) = self.primary.end_session(session_id).await {
            log_warn!("Failed to end agent session {session_id}: {err:#}");
        }
        Ok(())
    }

    async fn available_agents(&self) -> Result<Vec<AgentProfile>> {
        match self.primary.available_agents().await {
            Ok(agents) => Ok(agents),
            Err(err) => {
                log_warn!("Agent listing failed, using mock agents: {err:#}");
                self.mock.available_agents().await
            }
        }
    }
}
