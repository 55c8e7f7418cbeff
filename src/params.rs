//! Crate-wide constants and runtime configurables.
//!
//! Configurables are read once from the process environment (after loading an
//! optional `.env` file) and cached for the lifetime of the process.

use log::warn;
use std::sync::OnceLock;
use std::time::Duration;

/// Name of the unique identifier field carried by every record.
pub const ID_FIELD: &str = "_id";

/// Write acknowledgement requested by default: the primary must acknowledge.
pub const DEFAULT_WRITE_ACK_NODES: u32 = 1;

/// Journal confirmation requested by default.
pub const DEFAULT_JOURNAL: bool = true;

/// Database pinged to verify a freshly opened connection.
pub const PING_DATABASE: &str = "admin";

pub mod env {
    pub const SHUTDOWN_GRACE_MS: &str = "MONGOCRUD_SHUTDOWN_GRACE_MS";
    pub const HANDLE_SIGNALS: &str = "MONGOCRUD_HANDLE_SIGNALS";
}

const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct Configurables {
    /// How long a closing client may wait for in-flight operations before
    /// being force-closed.
    pub shutdown_grace: Duration,

    /// Install the termination signal listener on first initialization.
    pub handle_signals: bool,
}

impl Default for Configurables {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_millis(DEFAULT_SHUTDOWN_GRACE_MS),
            handle_signals: true,
        }
    }
}

impl Configurables {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configurables using `lookup` to resolve variables, falling back
    /// to defaults for missing or malformed values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut conf = Self::default();

        if let Some(raw) = lookup(env::SHUTDOWN_GRACE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => conf.shutdown_grace = Duration::from_millis(ms),
                Err(e) => warn!(
                    "ignoring invalid {} value `{}` ({})",
                    env::SHUTDOWN_GRACE_MS,
                    raw,
                    e
                ),
            }
        }

        if let Some(raw) = lookup(env::HANDLE_SIGNALS) {
            match parse_flag(&raw) {
                Some(flag) => conf.handle_signals = flag,
                None => warn!("ignoring invalid {} value `{}`", env::HANDLE_SIGNALS, raw),
            }
        }

        conf
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

static CONFIGURABLES: OnceLock<Configurables> = OnceLock::new();

/// Process-wide configurables, loaded from the environment on first access.
pub fn configurables() -> &'static Configurables {
    CONFIGURABLES.get_or_init(Configurables::from_env)
}
