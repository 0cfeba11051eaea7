// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Renwatch.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Renwatch configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RenwatchConfig {
    /// Process-wide bot behavior.
    #[serde(default)]
    pub bot: BotConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Match polling settings.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Delivery queue and worker settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Ledger and subscription retention.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Game-state cache TTLs.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Per-user command rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Riot API credentials.
    #[serde(default)]
    pub riot: RiotConfig,

    /// Discord credentials.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Which LLM backend translates names.
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Anthropic API settings, used when `translation.provider = "anthropic"`.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Google Gemini API settings, used when `translation.provider = "gemini"`.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Subscriptions allowed per chat server.
    #[serde(default = "default_max_subscriptions_per_server")]
    pub max_subscriptions_per_server: u32,

    /// Log user-caused command errors at warn instead of debug.
    #[serde(default)]
    pub verbose_user_errors: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_subscriptions_per_server: default_max_subscriptions_per_server(),
            verbose_user_errors: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_subscriptions_per_server() -> u32 {
    100
}

/// Which repository backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Postgres,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Postgres connection URL. Required when `backend = "postgres"`.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Postgres pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
            database_url: None,
            wal_mode: default_wal_mode(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("renwatch").join("renwatch.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("renwatch.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Pause between production cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on one cycle's lookups.
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,

    /// Subscriptions examined per cycle.
    #[serde(default = "default_subscription_batch_limit")]
    pub subscription_batch_limit: u32,

    /// Concurrent upstream lookups across all servers.
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            subscription_batch_limit: default_subscription_batch_limit(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_cycle_timeout_secs() -> u64 {
    120
}

fn default_subscription_batch_limit() -> u32 {
    1000
}

fn default_max_concurrent_lookups() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Bounded queue size between producer and workers.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of delivery workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How long the producer waits for queue space before abandoning a cycle's jobs.
    #[serde(default = "default_offer_timeout_secs")]
    pub offer_timeout_secs: u64,

    /// Bound on a single message-server send.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// How long shutdown waits for tasks to drain.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
            offer_timeout_secs: default_offer_timeout_secs(),
            send_timeout_secs: default_send_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl DeliveryConfig {
    pub fn offer_timeout(&self) -> Duration {
        Duration::from_secs(self.offer_timeout_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_queue_capacity() -> usize {
    20
}

fn default_workers() -> usize {
    2
}

fn default_offer_timeout_secs() -> u64 {
    60
}

fn default_send_timeout_secs() -> u64 {
    60
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Evals older than this are deleted.
    #[serde(default = "default_eval_expiration_hours")]
    pub eval_expiration_hours: u64,

    /// Subscriptions with no online activity for this long are deleted.
    #[serde(default = "default_offline_activity_threshold_hours")]
    pub offline_activity_threshold_hours: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub eval_sweep_interval_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub subscription_sweep_interval_secs: u64,

    #[serde(default = "default_cache_sweep_interval_secs")]
    pub cache_sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            eval_expiration_hours: default_eval_expiration_hours(),
            offline_activity_threshold_hours: default_offline_activity_threshold_hours(),
            eval_sweep_interval_secs: default_sweep_interval_secs(),
            subscription_sweep_interval_secs: default_sweep_interval_secs(),
            cache_sweep_interval_secs: default_cache_sweep_interval_secs(),
        }
    }
}

impl RetentionConfig {
    pub fn eval_expiration(&self) -> Duration {
        Duration::from_secs(self.eval_expiration_hours * 3600)
    }

    pub fn offline_activity_threshold(&self) -> Duration {
        Duration::from_secs(self.offline_activity_threshold_hours * 3600)
    }
}

fn default_eval_expiration_hours() -> u64 {
    30 * 24
}

fn default_offline_activity_threshold_hours() -> u64 {
    21 * 24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_cache_sweep_interval_secs() -> u64 {
    900
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// How long an account resolution is trusted.
    #[serde(default = "default_account_ttl_secs")]
    pub account_ttl_secs: u64,

    /// How long a match state is trusted.
    #[serde(default = "default_match_ttl_secs")]
    pub match_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            account_ttl_secs: default_account_ttl_secs(),
            match_ttl_secs: default_match_ttl_secs(),
        }
    }
}

fn default_account_ttl_secs() -> u64 {
    24 * 3600
}

fn default_match_ttl_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Commands allowed per user per window.
    #[serde(default = "default_max_commands")]
    pub max_commands: usize,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_commands: default_max_commands(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_commands() -> usize {
    5
}

fn default_window_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RiotConfig {
    /// Riot API key. Falls back to the `RIOT_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_riot_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout_secs: default_riot_timeout_secs(),
        }
    }
}

fn default_riot_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    /// Discord bot token. Falls back to the `DISCORD_TOKEN` environment variable.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// LLM backend used for name translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    #[default]
    Anthropic,
    Gemini,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationConfig {
    #[serde(default)]
    pub provider: TranslationProvider,
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. Falls back to the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for name translation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per translation batch.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

/// Google Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Gemini API key. Falls back to `GOOGLE_API_KEY`, then `GEMINI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Maximum output tokens per translation batch.
    #[serde(default = "default_max_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            max_output_tokens: default_max_tokens(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemma-3-27b-it".to_string()
}
