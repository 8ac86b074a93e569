//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use alerting::{ReportWindows, DEFAULT_ALERT_THRESHOLD};
use chrono::Duration;

/// Cards web server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Minimum aggregated report count to alert a region.
    pub alert_threshold: u32,
    /// Per-category rolling aggregation windows.
    pub windows: ReportWindows,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CARDS_ADDR` | Server bind address | `127.0.0.1:8787` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:cards.db?mode=rwc` |
    /// | `ALERT_THRESHOLD` | Report count that alerts a region | `3` |
    /// | `FLOOD_WINDOW_SECS` | Flood aggregation window | `21600` |
    /// | `EQ_WINDOW_SECS` | Earthquake aggregation window | `7200` |
    /// | `WIND_WINDOW_SECS` | Wind aggregation window | `21600` |
    /// | `HAZE_WINDOW_SECS` | Haze aggregation window | `21600` |
    /// | `VOLCANO_WINDOW_SECS` | Volcano aggregation window | `43200` |
    /// | `FIRE_WINDOW_SECS` | Fire aggregation window | `21600` |
    /// | `TYPHOON_WINDOW_SECS` | Typhoon aggregation window | `21600` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("CARDS_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:cards.db?mode=rwc".to_string());

        let alert_threshold = match env::var("ALERT_THRESHOLD") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidWindow("ALERT_THRESHOLD"))?,
            Err(_) => DEFAULT_ALERT_THRESHOLD,
        };

        let defaults = ReportWindows::default();
        let windows = ReportWindows {
            flood: window_from_env("FLOOD_WINDOW_SECS", defaults.flood)?,
            earthquake: window_from_env("EQ_WINDOW_SECS", defaults.earthquake)?,
            wind: window_from_env("WIND_WINDOW_SECS", defaults.wind)?,
            haze: window_from_env("HAZE_WINDOW_SECS", defaults.haze)?,
            volcano: window_from_env("VOLCANO_WINDOW_SECS", defaults.volcano)?,
            fire: window_from_env("FIRE_WINDOW_SECS", defaults.fire)?,
            typhoon: window_from_env("TYPHOON_WINDOW_SECS", defaults.typhoon)?,
        };

        Ok(Self {
            addr,
            database_url,
            alert_threshold,
            windows,
        })
    }
}

fn window_from_env(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(var) {
        Ok(value) => {
            let secs: i64 = value.parse().map_err(|_| ConfigError::InvalidWindow(var))?;
            Ok(Duration::seconds(secs))
        }
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CARDS_ADDR format")]
    InvalidAddr,

    #[error("{0} must be an integer number of seconds")]
    InvalidWindow(&'static str),
}
