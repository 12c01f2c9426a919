// ⚙️ Configuration - read once from the environment (.env honoured)

use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "subtrack.db";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DISPLAY_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file. `SUBTRACK_DB`, defaults to `subtrack.db`.
    pub db_path: PathBuf,

    /// API bind address. `SUBTRACK_ADDR`, defaults to `0.0.0.0:3000`.
    pub addr: SocketAddr,

    /// Currency label for CLI/TUI totals. `SUBTRACK_CURRENCY`, defaults to `USD`.
    pub currency: String,
}

impl Config {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank and unparseable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let addr = match get("SUBTRACK_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid SUBTRACK_ADDR, using default");
                default_addr()
            }),
            None => default_addr(),
        };

        Config {
            db_path: get("SUBTRACK_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            addr,
            currency: get("SUBTRACK_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| DEFAULT_DISPLAY_CURRENCY.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}
