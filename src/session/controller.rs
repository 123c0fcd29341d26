use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    agent::{AgentKind, AgentProvider, AgentSessionStatus, MockAgentProvider},
    auth::User,
    avatar::AnimationLoop,
    config::{AnimationConfig, SessionConfig},
    db::{Consultation, ConsultationStatus, Database},
};

use super::{
    script::Script,
    state::{format_clock, ConnectionPhase, SessionState, TickOutcome},
    SessionError,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: ConnectionPhase,
    pub agent: AgentKind,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    /// `m:ss` of the elapsed time.
    pub clock: String,
    pub script_index: usize,
    pub script_line: Option<String>,
    pub muted: bool,
    pub camera_on: bool,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    UserEnded,
    DurationLimit,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub status: ConsultationStatus,
    pub reason: EndReason,
    pub elapsed_secs: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    Tick { elapsed_secs: u64, remaining_secs: u64 },
    ScriptAdvanced { index: usize, line: String },
    Ended(SessionSummary),
}

struct RunHandle {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Everything the per-session task needs, cloned into it at start.
#[derive(Clone)]
struct RunContext {
    state: Arc<Mutex<SessionState>>,
    config: SessionConfig,
    script: Arc<Script>,
    agent_kind: AgentKind,
    agent: Arc<dyn AgentProvider>,
    history: Option<Database>,
    events: broadcast::Sender<SessionEvent>,
    animation: Arc<Mutex<AnimationLoop>>,
}

impl RunContext {
    fn emit(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn snapshot_of(&self, state: &SessionState) -> SessionSnapshot {
        SessionSnapshot {
            phase: state.phase,
            agent: self.agent_kind,
            elapsed_secs: state.elapsed_secs,
            remaining_secs: self.config.max_duration_secs.saturating_sub(state.elapsed_secs),
            clock: format_clock(state.elapsed_secs),
            script_index: state.script_index,
            script_line: self.script.line(state.script_index).map(str::to_string),
            muted: state.muted,
            camera_on: state.camera_on,
            session_id: state.session_id.clone(),
            started_at: state.started_at,
        }
    }

    async fn snapshot(&self) -> SessionSnapshot {
        let guard = self.state.lock().await;
        self.snapshot_of(&guard)
    }

    /// Closes out a run whose state has already been reset and whose task
    /// has been cancelled.
    async fn finish(&self, ended: EndedRun, status: ConsultationStatus, reason: EndReason) -> SessionSummary {
        self.animation_stop().await;

        if let Some(db) = &self.history {
            if let Err(err) = db
                .finish_consultation(&ended.session_id, status, ended.elapsed_secs, Utc::now())
                .await
            {
                log_error!("Failed to record end of consultation {}: {err:#}", ended.session_id);
            }
        }

        if let Some(agent_session_id) = &ended.agent_session_id {
            if let Err(err) = self.agent.end_session(agent_session_id).await {
                log_warn!("Failed to end agent session {agent_session_id}: {err:#}");
            }
        }

        log_info!(
            "Session {} ended after {}s ({:?})",
            ended.session_id,
            ended.elapsed_secs,
            reason
        );

        let summary = SessionSummary {
            session_id: ended.session_id,
            status,
            reason,
            elapsed_secs: ended.elapsed_secs,
        };
        self.emit(SessionEvent::Ended(summary.clone()));
        let snapshot = self.snapshot().await;
        self.emit(SessionEvent::StateChanged(snapshot));
        summary
    }

    async fn animation_stop(&self) {
        if let Err(err) = self.animation.lock().await.stop().await {
            log_error!("Failed to stop avatar animation: {err:#}");
        }
    }
}

/// Identity of a run captured just before its state was reset.
struct EndedRun {
    session_id: String,
    agent_session_id: Option<String>,
    elapsed_secs: u64,
}

impl EndedRun {
    fn capture(state: &SessionState) -> Option<Self> {
        Some(Self {
            session_id: state.session_id.clone()?,
            agent_session_id: state.agent_session_id.clone(),
            elapsed_secs: state.elapsed_secs,
        })
    }
}

/// Owns one simulated consultation at a time.
///
/// A run is a single task: wait out the connect delay, then tick once per
/// interval until ended. Ending, expiry and dropping the controller all cancel
/// that task's token before the state is reset, and every scheduled step
/// re-checks the token under the state lock, so nothing from a finished run
/// can touch the state afterwards.
pub struct SessionController {
    ctx: RunContext,
    run: Mutex<Option<RunHandle>>,
}

impl SessionController {
    pub fn new(config: SessionConfig, script: Script) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            ctx: RunContext {
                state: Arc::new(Mutex::new(SessionState::new())),
                config,
                script: Arc::new(script),
                agent_kind: AgentKind::default(),
                agent: Arc::new(MockAgentProvider),
                history: None,
                events,
                animation: Arc::new(Mutex::new(AnimationLoop::new(AnimationConfig::default()))),
            },
            run: Mutex::new(None),
        })
    }

    pub fn with_agent(mut self, kind: AgentKind, provider: Arc<dyn AgentProvider>) -> Self {
        self.ctx.agent_kind = kind;
        self.ctx.agent = provider;
        self
    }

    /// Record every run in the consultation history.
    pub fn with_history(mut self, db: Database) -> Self {
        self.ctx.history = Some(db);
        self
    }

    pub fn with_animation(mut self, config: AnimationConfig) -> Result<Self> {
        config.validate()?;
        self.ctx.animation = Arc::new(Mutex::new(AnimationLoop::new(config)));
        Ok(self)
    }

    pub fn agent_kind(&self) -> AgentKind {
        self.ctx.agent_kind
    }

    pub fn script(&self) -> &Script {
        &self.ctx.script
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.ctx.events.subscribe()
    }

    /// The avatar frame counter; advances only while connected.
    pub async fn frames(&self) -> watch::Receiver<f64> {
        self.ctx.animation.lock().await.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.ctx.snapshot().await
    }

    /// Begins connecting on behalf of `user`. Without a signed-in user
    /// nothing changes.
    pub async fn start(&self, user: Option<&User>) -> Result<SessionSnapshot, SessionError> {
        let user = user.ok_or_else(|| {
            log_warn!("Session start refused: no signed-in user");
            SessionError::NotAuthenticated
        })?;

        let mut run_guard = self.run.lock().await;
        if self.ctx.state.lock().await.is_active() {
            return Err(SessionError::AlreadyActive);
        }

        // A run that hit its limit may still be recording its end; let it
        // finish so its `Ended` event and provider teardown go out first.
        if let Some(previous) = run_guard.take() {
            previous.cancel_token.cancel();
            if let Err(err) = previous.handle.await {
                log_error!("Previous session task failed to join: {err}");
            }
        }

        let agent_session = self
            .ctx
            .agent
            .create_session(self.ctx.agent_kind, &user.id)
            .await
            .map_err(SessionError::Provisioning)?;
        if agent_session.status != AgentSessionStatus::Active {
            return Err(SessionError::Provisioning(anyhow!(
                "agent session {} is {:?}, not active",
                agent_session.id,
                agent_session.status
            )));
        }

        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let (run, snapshot) = {
            let mut state = self.ctx.state.lock().await;
            let run = state.begin_connecting(session_id.clone(), agent_session.id.clone(), started_at);
            (run, self.ctx.snapshot_of(&state))
        };

        if let Some(db) = &self.ctx.history {
            let record = Consultation {
                id: session_id.clone(),
                user_id: user.id.clone(),
                agent: self.ctx.agent_kind,
                agent_session_id: Some(agent_session.id.clone()),
                started_at,
                ended_at: None,
                status: ConsultationStatus::Active,
                duration_secs: 0,
                created_at: started_at,
                updated_at: started_at,
            };
            if let Err(err) = db.insert_consultation(&record).await {
                log_error!("Failed to record consultation {session_id}: {err:#}");
            }
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_session(self.ctx.clone(), run, cancel_token.clone()));
        *run_guard = Some(RunHandle {
            cancel_token,
            handle,
        });

        log_info!(
            "Session {session_id} connecting to {} for user {}",
            self.ctx.agent_kind.display_name(),
            user.id
        );
        self.ctx.emit(SessionEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// Ends the current run. A run still connecting is recorded as
    /// cancelled, a connected one as completed.
    pub async fn end(&self) -> Result<SessionSummary, SessionError> {
        let mut run_guard = self.run.lock().await;

        let (ended, was_connected) = {
            let mut state = self.ctx.state.lock().await;
            if !state.is_active() {
                return Err(SessionError::NotActive);
            }
            if let Some(run) = run_guard.as_ref() {
                run.cancel_token.cancel();
            }
            let was_connected = state.phase == ConnectionPhase::Connected;
            let ended = EndedRun::capture(&state);
            state.reset();
            (ended, was_connected)
        };

        if let Some(run) = run_guard.take() {
            if let Err(err) = run.handle.await {
                log_error!("Session task failed to join: {err}");
            }
        }

        let ended = ended.ok_or(SessionError::NotActive)?;
        let status = if was_connected {
            ConsultationStatus::Completed
        } else {
            ConsultationStatus::Cancelled
        };
        Ok(self.ctx.finish(ended, status, EndReason::UserEnded).await)
    }

    /// Returns whether the toggle took effect; controls are disabled unless
    /// connected.
    pub async fn toggle_mute(&self) -> bool {
        self.apply_control(SessionState::toggle_mute).await
    }

    pub async fn toggle_camera(&self) -> bool {
        self.apply_control(SessionState::toggle_camera).await
    }

    async fn apply_control(&self, control: fn(&mut SessionState) -> bool) -> bool {
        let snapshot = {
            let mut state = self.ctx.state.lock().await;
            if !control(&mut *state) {
                return false;
            }
            self.ctx.snapshot_of(&state)
        };
        self.ctx.emit(SessionEvent::StateChanged(snapshot));
        true
    }

    /// Waits until the current run is over, by either path.
    pub async fn wait_until_ended(&self) {
        let mut events = self.subscribe();
        let running = self
            .run
            .lock()
            .await
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished());
        if !running {
            return;
        }
        loop {
            match events.recv().await {
                Ok(SessionEvent::Ended(_)) | Err(broadcast::error::RecvError::Closed) => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(run) = self.run.get_mut().take() {
            run.cancel_token.cancel();
            run.handle.abort();
        }
        if let Ok(mut state) = self.ctx.state.try_lock() {
            state.reset();
        }
    }
}

async fn run_session(ctx: RunContext, run: u64, cancel_token: CancellationToken) {
    tokio::select! {
        _ = time::sleep(ctx.config.connect_delay) => {}
        _ = cancel_token.cancelled() => return,
    }

    let snapshot = {
        let mut state = ctx.state.lock().await;
        if cancel_token.is_cancelled() || !state.connect(run) {
            return;
        }
        ctx.snapshot_of(&state)
    };
    log_info!("Session {} connected", snapshot.session_id.as_deref().unwrap_or_default());
    ctx.emit(SessionEvent::StateChanged(snapshot));

    if let Err(err) = ctx.animation.lock().await.start(&cancel_token) {
        log_warn!("Avatar animation not started: {err:#}");
    }

    let period = ctx.config.tick_interval;
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (outcome, ended, script_index) = {
                    let mut state = ctx.state.lock().await;
                    if cancel_token.is_cancelled() {
                        break;
                    }
                    let before = EndedRun::capture(&state);
                    let outcome = state.tick(run, ctx.script.len(), &ctx.config);
                    if matches!(outcome, TickOutcome::Expired { .. }) {
                        cancel_token.cancel();
                    }
                    (outcome, before, state.script_index)
                };

                match outcome {
                    TickOutcome::Ignored => break,
                    TickOutcome::Advanced { elapsed_secs, script_advanced } => {
                        ctx.emit(SessionEvent::Tick {
                            elapsed_secs,
                            remaining_secs: ctx.config.max_duration_secs.saturating_sub(elapsed_secs),
                        });
                        if script_advanced {
                            if let Some(line) = ctx.script.line(script_index) {
                                ctx.emit(SessionEvent::ScriptAdvanced {
                                    index: script_index,
                                    line: line.to_string(),
                                });
                            }
                        }
                    }
                    TickOutcome::Expired { elapsed_secs } => {
                        if let Some(mut ended) = ended {
                            ended.elapsed_secs = elapsed_secs;
                            ctx.finish(ended, ConsultationStatus::Completed, EndReason::DurationLimit).await;
                        }
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SubscriptionTier;
    use std::time::Duration;

    fn user() -> User {
        User {
            id: "user_test".into(),
            email: "test@example.com".into(),
            name: "Test".into(),
            subscription: SubscriptionTier::Basic,
            created_at: Utc::now(),
            phone: None,
            city: None,
            language: None,
        }
    }

    fn script() -> Script {
        Script::new(vec!["one".into(), "two".into(), "three".into(), "four".into()])
    }

    fn controller(max_duration_secs: u64) -> SessionController {
        let config = SessionConfig {
            max_duration_secs,
            ..SessionConfig::default()
        };
        SessionController::new(config, script())
            .unwrap()
            .with_animation(AnimationConfig {
                frame_increment: 0.1,
                frame_interval: Duration::from_millis(100),
            })
            .unwrap()
    }

    async fn sleep_ms(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn start_requires_a_user() {
        let session = controller(180);
        let mut events = session.subscribe();
        let before = session.snapshot().await;

        assert!(matches!(session.start(None).await, Err(SessionError::NotAuthenticated)));
        assert_eq!(session.snapshot().await, before);
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn connects_after_the_delay_then_ticks() {
        let session = controller(180);
        let started = session.start(Some(&user())).await.unwrap();
        assert_eq!(started.phase, ConnectionPhase::Connecting);
        assert!(started.camera_on);

        sleep_ms(1_400).await;
        assert_eq!(session.snapshot().await.phase, ConnectionPhase::Connecting);

        sleep_ms(200).await;
        let connected = session.snapshot().await;
        assert_eq!(connected.phase, ConnectionPhase::Connected);
        assert_eq!(connected.elapsed_secs, 0);

        // connected at 1.5s, ticks at 2.5s, 3.5s, ...
        sleep_ms(10_400).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.elapsed_secs, 10);
        assert_eq!(snapshot.clock, "0:10");
        assert_eq!(snapshot.remaining_secs, 170);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_rejected() {
        let session = controller(180);
        session.start(Some(&user())).await.unwrap();
        assert!(matches!(
            session.start(Some(&user())).await,
            Err(SessionError::AlreadyActive)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn script_rotates_every_fifteen_ticks() {
        let session = controller(180);
        let mut events = session.subscribe();
        session.start(Some(&user())).await.unwrap();

        sleep_ms(1_500 + 46_000 + 500).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.elapsed_secs, 46);
        assert_eq!(snapshot.script_index, 3);
        assert_eq!(snapshot.script_line.as_deref(), Some("four"));

        let advanced: Vec<usize> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::ScriptAdvanced { index, .. } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(advanced, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn duration_limit_resets_and_stops_everything() {
        let session = controller(5);
        let mut events = session.subscribe();
        let mut frames = session.frames().await;
        session.start(Some(&user())).await.unwrap();

        sleep_ms(1_500 + 5_000 + 500).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.phase, ConnectionPhase::Disconnected);
        assert_eq!(snapshot.elapsed_secs, 0);
        assert_eq!(snapshot.script_index, 0);

        let seen = drain(&mut events);
        let ticks = seen
            .iter()
            .filter(|e| matches!(e, SessionEvent::Tick { .. }))
            .count();
        assert_eq!(ticks, 4);
        assert!(seen.iter().any(|e| matches!(
            e,
            SessionEvent::Ended(SessionSummary {
                reason: EndReason::DurationLimit,
                status: ConsultationStatus::Completed,
                elapsed_secs: 5,
                ..
            })
        )));

        let frame = *frames.borrow_and_update();
        sleep_ms(5_000).await;
        assert_eq!(*frames.borrow(), frame);
        assert!(drain(&mut events).is_empty());
        assert!(matches!(session.end().await, Err(SessionError::NotActive)));
    }

    #[tokio::test(start_paused = true)]
    async fn end_while_connected_completes_and_silences_ticks() {
        let session = controller(180);
        session.start(Some(&user())).await.unwrap();
        sleep_ms(1_500 + 3_000 + 500).await;

        let mut events = session.subscribe();
        let summary = session.end().await.unwrap();
        assert_eq!(summary.status, ConsultationStatus::Completed);
        assert_eq!(summary.reason, EndReason::UserEnded);
        assert_eq!(summary.elapsed_secs, 3);

        let after_end = session.snapshot().await;
        assert_eq!(after_end.phase, ConnectionPhase::Disconnected);
        assert_eq!(after_end.elapsed_secs, 0);
        drain(&mut events);

        sleep_ms(10_000).await;
        assert_eq!(session.snapshot().await, after_end);
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn end_while_connecting_cancels_the_connection() {
        let session = controller(180);
        session.start(Some(&user())).await.unwrap();
        sleep_ms(500).await;

        let summary = session.end().await.unwrap();
        assert_eq!(summary.status, ConsultationStatus::Cancelled);

        sleep_ms(5_000).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.phase, ConnectionPhase::Disconnected);
        assert_eq!(snapshot.elapsed_secs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_mid_connecting_never_connects() {
        let session = controller(180);
        let mut events = session.subscribe();
        session.start(Some(&user())).await.unwrap();
        sleep_ms(1_000).await;

        drop(session);
        sleep_ms(5_000).await;

        let mut phases = Vec::new();
        loop {
            match events.recv().await {
                Ok(SessionEvent::StateChanged(snapshot)) => phases.push(snapshot.phase),
                Ok(other) => panic!("unexpected event after teardown: {other:?}"),
                Err(broadcast::error::RecvError::Closed) => break,
                Err(err) => panic!("{err}"),
            }
        }
        assert_eq!(phases, vec![ConnectionPhase::Connecting]);
    }

    #[tokio::test(start_paused = true)]
    async fn controls_only_work_while_connected() {
        let session = controller(180);
        assert!(!session.toggle_mute().await);

        session.start(Some(&user())).await.unwrap();
        assert!(!session.toggle_mute().await);
        assert!(!session.toggle_camera().await);

        sleep_ms(1_600).await;
        assert!(session.toggle_mute().await);
        assert!(session.toggle_camera().await);
        let snapshot = session.snapshot().await;
        assert!(snapshot.muted);
        assert!(!snapshot.camera_on);

        session.end().await.unwrap();
        assert!(!session.toggle_mute().await);
    }

    #[tokio::test(start_paused = true)]
    async fn avatar_animates_only_while_connected() {
        let session = controller(180);
        let frames = session.frames().await;
        session.start(Some(&user())).await.unwrap();
        sleep_ms(1_000).await;
        assert_eq!(*frames.borrow(), 0.0);

        sleep_ms(1_550).await;
        assert!(*frames.borrow() > 0.0);
    }

    #[test]
    fn zero_rotation_period_is_rejected_up_front() {
        let config = SessionConfig {
            rotation_period_ticks: 0,
            ..SessionConfig::default()
        };
        assert!(SessionController::new(config, script()).is_err());

        let zero_tick = SessionConfig {
            tick_interval: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert!(SessionController::new(zero_tick, script()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_limit_keeps_the_previous_end() {
        let session = controller(5);
        let mut events = session.subscribe();
        session.start(Some(&user())).await.unwrap();

        sleep_ms(1_500 + 5_000).await;
        while session.snapshot().await.phase != ConnectionPhase::Disconnected {
            tokio::task::yield_now().await;
        }
        session.start(Some(&user())).await.unwrap();

        let seen = drain(&mut events);
        let ended = seen
            .iter()
            .position(|e| matches!(e, SessionEvent::Ended(s) if s.reason == EndReason::DurationLimit))
            .expect("limit end was emitted");
        let reconnecting = seen
            .iter()
            .rposition(|e| matches!(e, SessionEvent::StateChanged(s) if s.phase == ConnectionPhase::Connecting))
            .unwrap();
        assert!(ended < reconnecting);
    }

    struct FailedSessions;

    #[async_trait::async_trait]
    impl AgentProvider for FailedSessions {
        async fn create_session(
            &self,
            agent: AgentKind,
            user_id: &str,
        ) -> Result<crate::agent::AgentSession> {
            let mut session = MockAgentProvider.create_session(agent, user_id).await?;
            session.status = AgentSessionStatus::Failed;
            Ok(session)
        }

        async fn end_session(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }

        async fn available_agents(&self) -> Result<Vec<crate::agent::AgentProfile>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_agent_session_is_not_started() {
        let session = controller(180).with_agent(AgentKind::Nurse, Arc::new(FailedSessions));
        assert!(matches!(
            session.start(Some(&user())).await,
            Err(SessionError::Provisioning(_))
        ));
        assert_eq!(session.snapshot().await.phase, ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn history_records_each_outcome() {
        let db = Database::in_memory().unwrap();
        let config = SessionConfig {
            max_duration_secs: 2,
            tick_interval: Duration::from_millis(20),
            rotation_period_ticks: 15,
            connect_delay: Duration::from_millis(10),
        };
        let session = SessionController::new(config.clone(), script())
            .unwrap()
            .with_history(db.clone());
        let user = user();

        session.start(Some(&user)).await.unwrap();
        session.wait_until_ended().await;

        let slow = SessionController::new(
            SessionConfig {
                connect_delay: Duration::from_secs(30),
                ..config
            },
            script(),
        )
        .unwrap()
        .with_history(db.clone());
        slow.start(Some(&user)).await.unwrap();
        slow.end().await.unwrap();

        let history = db.list_consultations(&user.id).await.unwrap();
        assert_eq!(history.len(), 2);
        let mut statuses: Vec<_> = history.iter().map(|c| c.status).collect();
        statuses.sort_by_key(|s| s.as_str());
        assert_eq!(
            statuses,
            vec![ConsultationStatus::Cancelled, ConsultationStatus::Completed]
        );
        assert!(history.iter().all(|c| c.ended_at.is_some()));
    }
}
