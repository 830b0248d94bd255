//! Runtime configuration for the sync engine: polling cadences, retry policy,
//! and the per-call network timeout.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the engine looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/sync.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RINGSIDE_SYNC_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the engine's services.
pub struct SyncConfig {
    /// Phase-driven fallback polling intervals.
    pub cadence: CadenceConfig,
    /// Retry bound and backoff schedule for the resync pass.
    pub retry: RetryConfig,
    /// Upper bound applied to every remote call.
    pub request_timeout: Duration,
}

impl SyncConfig {
    /// Load the configuration from disk, falling back to built-in defaults
    /// when the file is missing or malformed. Never fatal.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded sync configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse sync config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "sync config not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read sync config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cadence: CadenceConfig::default(),
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
/// Fallback polling intervals per round phase.
///
/// The exact numbers are tunable, not a protocol guarantee; only the ordering
/// (break fastest, then live, then the unknown-phase fallback, then pre-fight)
/// is relied upon.
pub struct CadenceConfig {
    /// Interval during the contested scoring window.
    pub round_break: Duration,
    /// Interval while a round is in progress.
    pub round_live: Duration,
    /// Interval before the bout starts.
    pub pre_fight: Duration,
    /// Conservative interval for phases this client does not know.
    pub fallback: Duration,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            round_break: Duration::from_millis(3_000),
            round_live: Duration::from_millis(10_000),
            pre_fight: Duration::from_millis(60_000),
            fallback: Duration::from_millis(15_000),
        }
    }
}

#[derive(Debug, Clone)]
/// Retry bound and exponential backoff schedule for queued submissions.
pub struct RetryConfig {
    /// Maximum attempts per queued entry during a resync pass.
    pub max_retries: u32,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Ceiling on the doubled backoff delay.
    pub max_backoff: Duration,
}

impl RetryConfig {
    /// Backoff delay after the given zero-based failed attempt (1s, 2s, 4s, …
    /// with the default settings, capped at `max_backoff`).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let doubled = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt));
        doubled.min(self.max_backoff)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file. Every field is optional;
/// omitted fields keep their defaults.
struct RawConfig {
    #[serde(default)]
    cadence: RawCadence,
    #[serde(default)]
    retry: RawRetry,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCadence {
    round_break_ms: Option<u64>,
    round_live_ms: Option<u64>,
    pre_fight_ms: Option<u64>,
    fallback_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRetry {
    max_retries: Option<u32>,
    initial_backoff_ms: Option<u64>,
    max_backoff_ms: Option<u64>,
}

impl From<RawConfig> for SyncConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = SyncConfig::default();
        let cadence = CadenceConfig {
            round_break: millis_or(raw.cadence.round_break_ms, defaults.cadence.round_break),
            round_live: millis_or(raw.cadence.round_live_ms, defaults.cadence.round_live),
            pre_fight: millis_or(raw.cadence.pre_fight_ms, defaults.cadence.pre_fight),
            fallback: millis_or(raw.cadence.fallback_ms, defaults.cadence.fallback),
        };
        let retry = RetryConfig {
            max_retries: raw.retry.max_retries.unwrap_or(defaults.retry.max_retries),
            initial_backoff: millis_or(
                raw.retry.initial_backoff_ms,
                defaults.retry.initial_backoff,
            ),
            max_backoff: millis_or(raw.retry.max_backoff_ms, defaults.retry.max_backoff),
        };
        Self {
            cadence,
            retry,
            request_timeout: millis_or(raw.request_timeout_ms, defaults.request_timeout),
        }
    }
}

fn millis_or(value: Option<u64>, fallback: Duration) -> Duration {
    value.map(Duration::from_millis).unwrap_or(fallback)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
