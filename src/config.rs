use std::{env, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};

use crate::search::geo::GeoPoint;

/// Timing knobs for the simulated consultation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session ends on its own once the clock reaches this many ticks.
    pub max_duration_secs: u64,
    pub tick_interval: Duration,
    /// Script line advances every this many ticks.
    pub rotation_period_ticks: u64,
    /// Simulated time spent in `Connecting` before the first tick.
    pub connect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 180,
            tick_interval: Duration::from_secs(1),
            rotation_period_ticks: 15,
            connect_delay: Duration::from_millis(1500),
        }
    }
}

impl SessionConfig {
    /// A zero limit, period or interval would stall or panic the run task.
    pub fn validate(&self) -> Result<()> {
        if self.max_duration_secs == 0 {
            bail!("session max duration must be greater than zero");
        }
        if self.rotation_period_ticks == 0 {
            bail!("script rotation period must be greater than zero");
        }
        if self.tick_interval.is_zero() {
            bail!("session tick interval must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// Added to the frame counter on every animation tick.
    pub frame_increment: f64,
    pub frame_interval: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_increment: 0.1,
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frame_interval.is_zero() {
            bail!("animation frame interval must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub default_radius_km: f64,
    pub default_origin: GeoPoint,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 5.0,
            default_origin: GeoPoint::new(12.9716, 77.5946),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub animation: AnimationConfig,
    pub search: SearchConfig,
    /// Holds the local key/value store and the consultation history database.
    pub data_dir: PathBuf,
    /// Directory of `<collection>.json` files preferred over the embedded data.
    pub catalog_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            animation: AnimationConfig::default(),
            search: SearchConfig::default(),
            data_dir: PathBuf::from(".aarogya"),
            catalog_dir: None,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `AAROGYA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        let debug_mode = env::var("AAROGYA_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            config.session.connect_delay = Duration::ZERO;
            config.session.max_duration_secs = 30;
        }

        if let Ok(dir) = env::var("AAROGYA_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("AAROGYA_CATALOG_DIR") {
            config.catalog_dir = Some(PathBuf::from(dir));
        }
        if let Ok(raw) = env::var("AAROGYA_MAX_SESSION_SECS") {
            config.session.max_duration_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("AAROGYA_MAX_SESSION_SECS is not a number: {raw}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        self.animation.validate()?;
        if !(self.search.default_radius_km > 0.0) {
            bail!("default search radius must be positive");
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("local_store.json")
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.data_dir.join("consultations.sqlite3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timings() {
        let config = AppConfig::default();
        assert_eq!(config.session.max_duration_secs, 180);
        assert_eq!(config.session.rotation_period_ticks, 15);
        assert_eq!(config.session.tick_interval, Duration::from_secs(1));
        assert!((config.animation.frame_increment - 0.1).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_rotation_period_is_rejected() {
        let mut config = AppConfig::default();
        config.session.rotation_period_ticks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let session = SessionConfig {
            tick_interval: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert!(session.validate().is_err());

        let mut config = AppConfig::default();
        config.animation.frame_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut config = AppConfig::default();
        config.session.max_duration_secs = 0;
        assert!(config.validate().is_err());
    }
}
