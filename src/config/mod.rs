//! Configuration module for the grievance portal backend.
//!
//! Loaded from `HP_*` environment variables (and a `.env` file, if present).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "./data/portal.sqlite";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ASSISTANT_DELAY_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for `/api`; `None` disables the check
    pub api_psk: Option<String>,
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    /// How long HP Assist "types" before a bot reply lands
    pub assistant_delay: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Milliseconds to a delay. Unparseable values fall back to the default.
fn parse_delay(raw: Option<&str>) -> Duration {
    let millis = match raw.map(str::trim) {
        Some(value) => value.parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!(
                "Ignoring invalid HP_ASSISTANT_DELAY_MS '{}', using {}ms",
                value,
                DEFAULT_ASSISTANT_DELAY_MS
            );
            DEFAULT_ASSISTANT_DELAY_MS
        }),
        None => DEFAULT_ASSISTANT_DELAY_MS,
    };
    Duration::from_millis(millis)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            api_psk: env::var("HP_API_PSK").ok().filter(|k| !k.is_empty()),
            db_path: env_or("HP_DB_PATH", DEFAULT_DB_PATH).into(),
            bind_addr: env_or("HP_BIND_ADDR", DEFAULT_BIND_ADDR)
                .parse()
                .expect("Invalid HP_BIND_ADDR format"),
            log_level: env_or("HP_LOG_LEVEL", DEFAULT_LOG_LEVEL),
            assistant_delay: parse_delay(env::var("HP_ASSISTANT_DELAY_MS").ok().as_deref()),
        }
    }
}
