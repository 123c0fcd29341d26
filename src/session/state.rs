use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// What a single clock tick did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session was not connected; nothing changed.
    Ignored,
    Advanced {
        elapsed_secs: u64,
        script_advanced: bool,
    },
    /// The duration limit was reached and the state has been reset.
    Expired { elapsed_secs: u64 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: ConnectionPhase,
    pub elapsed_secs: u64,
    pub script_index: usize,
    pub muted: bool,
    pub camera_on: bool,
    /// Consultation record id for the current run.
    pub session_id: Option<String>,
    /// Provider-side session id for the current run.
    pub agent_session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Bumped on every start; scheduled work carries the value it was
    /// spawned with and is discarded if it no longer matches.
    #[serde(skip)]
    pub run: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.phase != ConnectionPhase::Disconnected
    }

    /// Enters `Connecting` for a new run and returns its run number.
    pub fn begin_connecting(
        &mut self,
        session_id: String,
        agent_session_id: String,
        started_at: DateTime<Utc>,
    ) -> u64 {
        let run = self.run.wrapping_add(1);
        *self = Self {
            phase: ConnectionPhase::Connecting,
            elapsed_secs: 0,
            script_index: 0,
            muted: false,
            camera_on: true,
            session_id: Some(session_id),
            agent_session_id: Some(agent_session_id),
            started_at: Some(started_at),
            run,
        };
        run
    }

    /// `Connecting` -> `Connected` for the given run. Returns `false` when the
    /// run is stale or the session already left `Connecting`.
    pub fn connect(&mut self, run: u64) -> bool {
        if self.run != run || self.phase != ConnectionPhase::Connecting {
            return false;
        }
        self.phase = ConnectionPhase::Connected;
        true
    }

    /// One clock tick for `run`. A stale run or a session that is not
    /// connected is left untouched.
    pub fn tick(&mut self, run: u64, script_len: usize, config: &SessionConfig) -> TickOutcome {
        if self.run != run || self.phase != ConnectionPhase::Connected {
            return TickOutcome::Ignored;
        }

        self.elapsed_secs += 1;

        let mut script_advanced = false;
        if script_len > 1 && self.elapsed_secs % config.rotation_period_ticks == 0 {
            self.script_index = (self.script_index + 1) % script_len;
            script_advanced = true;
        }

        if self.elapsed_secs >= config.max_duration_secs {
            let elapsed_secs = self.elapsed_secs;
            self.reset();
            return TickOutcome::Expired { elapsed_secs };
        }

        TickOutcome::Advanced {
            elapsed_secs: self.elapsed_secs,
            script_advanced,
        }
    }

    /// Flips mute; only honoured while connected.
    pub fn toggle_mute(&mut self) -> bool {
        if self.phase != ConnectionPhase::Connected {
            return false;
        }
        self.muted = !self.muted;
        true
    }

    /// Flips the camera; only honoured while connected.
    pub fn toggle_camera(&mut self) -> bool {
        if self.phase != ConnectionPhase::Connected {
            return false;
        }
        self.camera_on = !self.camera_on;
        true
    }

    /// Back to the initial disconnected values. The run counter survives so
    /// that callbacks from the finished run stay stale.
    pub fn reset(&mut self) {
        let run = self.run;
        *self = Self {
            run,
            ..Self::default()
        };
    }
}

/// `m:ss`, as shown on the session clock.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
