// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./repairdesk.toml` > `~/.config/repairdesk/repairdesk.toml`
//! > `/etc/repairdesk/repairdesk.toml` with environment variable overrides via
//! the `REPAIRDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed here

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::RepairDeskConfig;

const SYSTEM_CONFIG_PATH: &str = "/etc/repairdesk/repairdesk.toml";
const LOCAL_CONFIG_PATH: &str = "repairdesk.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/repairdesk/repairdesk.toml` (system-wide)
/// 3. `~/.config/repairdesk/repairdesk.toml` (user XDG config)
/// 4. `./repairdesk.toml` (local directory)
/// 5. `REPAIRDESK_*` environment variables
pub fn load_config() -> Result<RepairDeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<RepairDeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RepairDeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RepairDeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RepairDeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for standard config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RepairDeskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// `<config_dir>/repairdesk/repairdesk.toml`, or an empty path when the
/// platform has no config directory.
pub(crate) fn user_config_path() -> std::path::PathBuf {
    dirs::config_dir()
        .map(|d| d.join("repairdesk/repairdesk.toml"))
        .unwrap_or_default()
}

/// The files consulted by [`load_config`], highest precedence last.
pub(crate) fn hierarchy_paths() -> Vec<std::path::PathBuf> {
    vec![
        std::path::PathBuf::from(SYSTEM_CONFIG_PATH),
        user_config_path(),
        std::path::PathBuf::from(LOCAL_CONFIG_PATH),
    ]
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` and not `Env::split("_")`: `REPAIRDESK_GATEWAY_BEARER_TOKEN`
/// must map to `gateway.bearer_token`, not `gateway.bearer.token`.
fn env_provider() -> Env {
    Env::prefixed("REPAIRDESK_").map(|key| section_key(key.as_str()).into())
}

const SECTIONS: [&str; 3] = ["service", "storage", "gateway"];

/// Map a prefix-stripped env var name to its dotted config key.
///
/// `key` arrives in the case it was set in, so it is lowercased first. Only a
/// leading section name is split off; anything else passes through and is
/// rejected by `deny_unknown_fields`.
fn section_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(field) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{field}");
        }
    }
    key
}
