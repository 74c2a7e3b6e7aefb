//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ScorelineSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::ScorelineSettings;

/// Resolve the default settings file path (`~/.scoreline/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".scoreline").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ScorelineSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields the defaults; a file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ScorelineSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Defaults merged with the settings file, without env overrides.
fn load_file_layer(path: &Path) -> Result<ScorelineSettings> {
    let defaults = serde_json::to_value(ScorelineSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides, reading variables through `lookup`.
///
/// `SCORELINE_*` names win over the legacy unprefixed names. Values that fail
/// to parse or fall outside their range are ignored with a warning.
pub fn apply_env_overrides<F>(settings: &mut ScorelineSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string(&["SCORELINE_HOST"]) {
        settings.server.host = v;
    }
    if let Some(v) = env.u64_in(&["SCORELINE_PORT", "PORT"], 1, 65_535) {
        settings.server.port = v as u16;
    }
    if let Some(v) = env.string(&["SCORELINE_FRONTEND_URL", "FRONTEND_URL"]) {
        settings.server.frontend_url = v;
    }
    if let Some(v) = env.u64_in(&["SCORELINE_HEARTBEAT_INTERVAL_SECS"], 1, 3_600) {
        settings.server.heartbeat_interval_secs = v;
    }

    // ── Auth ────────────────────────────────────────────────────────
    if let Some(v) = env.string(&["SCORELINE_JWT_SECRET", "JWT_SECRET"]) {
        settings.auth.jwt_secret = v;
    }
    if let Some(v) = env.u64_in(&["SCORELINE_TOKEN_TTL_SECS"], 60, 31_536_000) {
        settings.auth.token_ttl_secs = v;
    }
    if let Some(v) = env.u64_in(&["SCORELINE_PASSWORD_COST"], 4, 31) {
        settings.auth.password_cost = u32::try_from(v).unwrap_or(12);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string(&["SCORELINE_LOG_LEVEL"]) {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool(&["SCORELINE_LOG_JSON"]) {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    /// First non-empty value among `names`, with the name it came from.
    fn first(&self, names: &[&'static str]) -> Option<(&'static str, String)> {
        names.iter().find_map(|name| {
            (self.lookup)(name)
                .filter(|v| !v.is_empty())
                .map(|v| (*name, v))
        })
    }

    fn string(&self, names: &[&'static str]) -> Option<String> {
        self.first(names).map(|(_, v)| v)
    }

    fn u64_in(&self, names: &[&'static str], min: u64, max: u64) -> Option<u64> {
        let (name, val) = self.first(names)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid integer env var, ignoring");
        }
        result
    }

    fn bool(&self, names: &[&'static str]) -> Option<bool> {
        let (name, val) = self.first(names)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }
}
