//! # scoreline-settings
//!
//! Configuration with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`ScorelineSettings::default()`]
//! 2. **Settings file** — `~/.scoreline/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `SCORELINE_*` plus the legacy `PORT`,
//!    `JWT_SECRET` and `FRONTEND_URL` names (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{AuthSettings, LoggingSettings, ScorelineSettings, ServerSettings};
