use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled value: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_opt(lookup: &impl Fn(&str) -> Option<String>, profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed) {
            return Some(v);
        }
    }
    lookup(key)
}

fn profiled_parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    profile: &str,
    key: &str,
    default: T,
) -> T {
    match profiled_opt(lookup, profile, key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Unparseable config value, using default");
                default
            }
        },
        None => default,
    }
}

// ── Priority order ────────────────────────────────────────────

/// Direction in which priority keys are iterated.
///
/// The last key in iteration order is the "highest" priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Ascending => write!(f, "ascending"),
            OrderKind::Descending => write!(f, "descending"),
        }
    }
}

impl FromStr for OrderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(OrderKind::Ascending),
            "desc" | "descending" => Ok(OrderKind::Descending),
            other => Err(format!("unknown priority order: {other}")),
        }
    }
}

// ── Map config ────────────────────────────────────────────────

/// Construction-time settings for a priority bucket map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Priority iteration order.
    #[serde(default)]
    pub order: OrderKind,
    /// Initial capacity of newly created buckets. 0 = grow on demand.
    #[serde(default = "default_bucket_capacity")]
    pub bucket_capacity: usize,
}

fn default_bucket_capacity() -> usize { 0 }

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            order: OrderKind::default(),
            bucket_capacity: default_bucket_capacity(),
        }
    }
}

impl MapConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PRIO_PROFILE`. When set (e.g. `BATCH`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("PRIO_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        Self::from_lookup(profile, env_opt)
    }

    fn from_lookup(profile: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let p = profile.to_uppercase();
        let defaults = Self::default();
        Self {
            order: profiled_parse(&lookup, &p, "PRIO_ORDER", defaults.order),
            bucket_capacity: profiled_parse(
                &lookup,
                &p,
                "PRIO_BUCKET_CAPACITY",
                defaults.bucket_capacity,
            ),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            order = %self.order,
            bucket_capacity = self.bucket_capacity,
            "Map config loaded"
        );
    }
}
