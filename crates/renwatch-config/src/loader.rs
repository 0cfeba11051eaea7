// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./renwatch.toml` > `~/.config/renwatch/renwatch.toml` >
//! `/etc/renwatch/renwatch.toml` with environment variable overrides via `RENWATCH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::RenwatchConfig;

/// Top-level sections, used to map `RENWATCH_SECTION_KEY` onto `section.key`.
const SECTIONS: &[&str] = &[
    "translation",
    "rate_limit",
    "retention",
    "anthropic",
    "delivery",
    "discord",
    "storage",
    "gemini",
    "poller",
    "cache",
    "riot",
    "bot",
];

pub const SYSTEM_CONFIG_PATH: &str = "/etc/renwatch/renwatch.toml";
pub const LOCAL_CONFIG_PATH: &str = "renwatch.toml";

/// The per-user config file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("renwatch/renwatch.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/renwatch/renwatch.toml` (system-wide)
/// 3. `~/.config/renwatch/renwatch.toml` (user XDG config)
/// 4. `./renwatch.toml` (local directory)
/// 5. `RIOT_API_KEY`, `DISCORD_TOKEN`, `ANTHROPIC_API_KEY`, `GOOGLE_API_KEY`/`GEMINI_API_KEY`
/// 6. `RENWATCH_*` environment variables
pub fn load_config() -> Result<RenwatchConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<RenwatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RenwatchConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RenwatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RenwatchConfig::default()))
        .merge(Toml::file(path))
        .merge(credential_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RenwatchConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(credential_env_provider())
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env key onto its dotted config path.
///
/// Section names are matched as whole prefixes so keys containing underscores
/// stay intact: `rate_limit_max_commands` becomes `rate_limit.max_commands`.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

/// `RENWATCH_*` overrides with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`, which would turn
/// `RENWATCH_DISCORD_BOT_TOKEN` into `discord.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("RENWATCH_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Conventional un-prefixed credential variables.
///
/// `GOOGLE_API_KEY` wins over `GEMINI_API_KEY` when both are set.
fn credential_env_provider() -> Figment {
    let google = |name: &'static str| {
        Env::raw()
            .only(&[name])
            .map(|_| "gemini.api_key".into())
    };
    Figment::new()
        .merge(google("GEMINI_API_KEY"))
        .merge(google("GOOGLE_API_KEY"))
        .merge(
            Env::raw()
                .only(&["RIOT_API_KEY", "DISCORD_TOKEN", "ANTHROPIC_API_KEY"])
                .map(|key| match key.as_str().to_ascii_lowercase().as_str() {
                    "riot_api_key" => "riot.api_key".into(),
                    "discord_token" => "discord.bot_token".into(),
                    "anthropic_api_key" => "anthropic.api_key".into(),
                    other => other.to_string().into(),
                }),
        )
}
