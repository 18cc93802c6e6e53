//! Configuration for MailDock sessions.
//!
//! Values come from `MAILDOCK_*` environment variables, optionally backed
//! by a `KEY=VALUE` envfile (the same shape the desktop client persists its
//! console options into). Unknown or malformed values fall back to the
//! defaults with a warning; configuration loading never fails.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::models::UiLocation;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Use the high-contrast console palette.
    pub console_high_contrast: bool,
    /// Show context-sensitive key hints in menus.
    pub console_key_hints: bool,
    /// Entitlement seed used until the user store is populated by the
    /// entitlement service.
    pub sleep_entitlement_default: bool,
    /// Location newly added services are pinned to.
    pub default_ui_location: UiLocation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            console_high_contrast: false,
            console_key_hints: true,
            sleep_entitlement_default: false,
            default_ui_location: UiLocation::Sidebar,
        }
    }
}

impl Config {
    /// Load from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an envfile, with the process environment taking
    /// precedence over the file.
    #[must_use]
    pub fn from_env_file(path: &Path) -> Self {
        let file = load_env_file(path);
        Self::from_lookup(|key| env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let default_ui_location = lookup("MAILDOCK_DEFAULT_UI_LOCATION").map_or(
            defaults.default_ui_location,
            |value| match UiLocation::parse(&value) {
                Ok(location) => location,
                Err(err) => {
                    tracing::warn!(target: "maildock::config", %err, "ignoring bad location");
                    defaults.default_ui_location
                }
            },
        );

        Self {
            console_high_contrast: lookup_bool(
                &lookup,
                "MAILDOCK_HIGH_CONTRAST",
                defaults.console_high_contrast,
            ),
            console_key_hints: lookup_bool(
                &lookup,
                "MAILDOCK_KEY_HINTS",
                defaults.console_key_hints,
            ),
            sleep_entitlement_default: lookup_bool(
                &lookup,
                "MAILDOCK_SLEEPABLE",
                defaults.sleep_entitlement_default,
            ),
            default_ui_location,
        }
    }
}

fn lookup_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    lookup(key).map_or(default, |value| parse_bool(&value, default))
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a `KEY=VALUE` envfile. Missing files read as empty; `#` comments
/// and blank lines are skipped.
fn load_env_file(path: &Path) -> HashMap<String, String> {
    let Ok(contents) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}
