// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! non-zero intervals, backend-specific settings, and retention ordering.

use crate::diagnostic::ConfigError;
use crate::model::{RenwatchConfig, StorageBackend, TranslationProvider};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &RenwatchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "bot.log_level `{}` is not one of {}",
                config.bot.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    match config.storage.backend {
        StorageBackend::Sqlite => {
            if config.storage.database_path.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "storage.database_path must not be empty".to_string(),
                });
            }
        }
        StorageBackend::Postgres => {
            let missing = config
                .storage
                .database_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty());
            if missing {
                errors.push(ConfigError::Validation {
                    message: "storage.database_url is required when storage.backend = \"postgres\""
                        .to_string(),
                });
            }
        }
    }

    let non_zero: [(&str, u64); 16] = [
        (
            "bot.max_subscriptions_per_server",
            config.bot.max_subscriptions_per_server.into(),
        ),
        ("storage.max_connections", config.storage.max_connections.into()),
        ("poller.interval_secs", config.poller.interval_secs),
        ("poller.cycle_timeout_secs", config.poller.cycle_timeout_secs),
        (
            "poller.subscription_batch_limit",
            config.poller.subscription_batch_limit.into(),
        ),
        (
            "poller.max_concurrent_lookups",
            config.poller.max_concurrent_lookups as u64,
        ),
        ("delivery.queue_capacity", config.delivery.queue_capacity as u64),
        ("delivery.workers", config.delivery.workers as u64),
        ("delivery.offer_timeout_secs", config.delivery.offer_timeout_secs),
        ("delivery.send_timeout_secs", config.delivery.send_timeout_secs),
        (
            "retention.eval_sweep_interval_secs",
            config.retention.eval_sweep_interval_secs,
        ),
        (
            "retention.subscription_sweep_interval_secs",
            config.retention.subscription_sweep_interval_secs,
        ),
        (
            "retention.cache_sweep_interval_secs",
            config.retention.cache_sweep_interval_secs,
        ),
        ("cache.match_ttl_secs", config.cache.match_ttl_secs),
        ("rate_limit.max_commands", config.rate_limit.max_commands as u64),
        ("rate_limit.window_secs", config.rate_limit.window_secs),
    ];
    for (key, value) in non_zero {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than zero"),
            });
        }
    }

    if config.retention.offline_activity_threshold_hours == 0 {
        errors.push(ConfigError::Validation {
            message: "retention.offline_activity_threshold_hours must be greater than zero"
                .to_string(),
        });
    }

    // Pruning evals faster than the inactivity window would erase the
    // activity the subscription sweep depends on.
    if config.retention.eval_expiration_hours < config.retention.offline_activity_threshold_hours {
        errors.push(ConfigError::Validation {
            message: format!(
                "retention.eval_expiration_hours ({}) must be at least \
                 retention.offline_activity_threshold_hours ({})",
                config.retention.eval_expiration_hours,
                config.retention.offline_activity_threshold_hours
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that every credential `serve` needs is present.
///
/// Only the selected translation provider's key is required.
pub fn validate_credentials(config: &RenwatchConfig) -> Result<(), Vec<ConfigError>> {
    let translator = match config.translation.provider {
        TranslationProvider::Anthropic => {
            ("anthropic.api_key", "ANTHROPIC_API_KEY", &config.anthropic.api_key)
        }
        TranslationProvider::Gemini => ("gemini.api_key", "GOOGLE_API_KEY", &config.gemini.api_key),
    };
    let required = [
        ("riot.api_key", "RIOT_API_KEY", &config.riot.api_key),
        ("discord.bot_token", "DISCORD_TOKEN", &config.discord.bot_token),
        translator,
    ];

    let errors: Vec<ConfigError> = required
        .into_iter()
        .filter(|(_, _, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(key, env_var, _)| ConfigError::MissingCredential {
            key: key.to_string(),
            env_var: env_var.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
