pub mod agent;
pub mod auth;
pub mod avatar;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod search;
pub mod session;
pub mod settings;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use agent::{AgentKind, AgentProvider, FallbackAgentProvider, MockAgentProvider};
use auth::AuthService;
use catalog::{Catalog, DirectorySource};
use config::AppConfig;
use db::Database;
use session::{Script, SessionController};
use settings::LocalStore;

/// Long-lived services shared by every command.
pub struct AppState {
    pub config: AppConfig,
    pub catalog: Catalog,
    pub store: Arc<LocalStore>,
    pub auth: AuthService,
    pub db: Database,
    pub agent: Arc<dyn AgentProvider>,
}

impl AppState {
    pub async fn open(config: AppConfig) -> Result<Self> {
        config.validate()?;

        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;

        let db = Database::new(config.history_db_path())?;

        let store = Arc::new(LocalStore::new(config.store_path())?);
        let auth = AuthService::new(store.clone())?;

        let catalog = match &config.catalog_dir {
            Some(dir) => Catalog::load(&DirectorySource::new(dir))?,
            None => Catalog::builtin()?,
        };

        Ok(Self {
            config,
            catalog,
            store,
            auth,
            db,
            agent: Arc::new(FallbackAgentProvider::new(MockAgentProvider)),
        })
    }

    /// Closes consultations still marked active by a process that died
    /// mid-session. Only run by commands that read or write history, so a
    /// directory search never touches a session live in another process.
    pub async fn recover_interrupted_consultations(&self) -> Result<usize> {
        let recovered = self.db.cancel_stale_consultations(Utc::now()).await?;
        if recovered > 0 {
            log::warn!("Marked {recovered} interrupted consultation(s) as cancelled");
        }
        Ok(recovered)
    }

    /// A controller for one session view, recording into the history
    /// database. `max_secs` overrides the configured duration limit.
    pub fn session_controller(
        &self,
        agent: AgentKind,
        script: Script,
        max_secs: Option<u64>,
    ) -> Result<SessionController> {
        let mut session_config = self.config.session.clone();
        if let Some(secs) = max_secs {
            anyhow::ensure!(secs > 0, "session length must be greater than zero");
            session_config.max_duration_secs = secs;
        }

        Ok(SessionController::new(session_config, script)?
            .with_agent(agent, self.agent.clone())
            .with_animation(self.config.animation.clone())?
            .with_history(self.db.clone()))
    }
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = cli::Cli::parse();
    let config = AppConfig::from_env()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let app = AppState::open(config).await?;
        log::info!("Aarogya ready ({} doctors loaded)", app.catalog.doctors().len());
        cli::execute(cli, app).await
    })
}
