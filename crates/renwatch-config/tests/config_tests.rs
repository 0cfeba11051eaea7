// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Renwatch configuration system.

use renwatch_config::diagnostic::ConfigError;
use renwatch_config::model::{RenwatchConfig, StorageBackend, TranslationProvider};
use renwatch_config::{load_and_validate_path, load_and_validate_str, load_config, load_config_from_str};
use serial_test::serial;

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[bot]
log_level = "debug"
max_subscriptions_per_server = 25
verbose_user_errors = true

[storage]
backend = "postgres"
database_url = "postgres://renwatch@localhost/renwatch"
max_connections = 8

[poller]
interval_secs = 30
cycle_timeout_secs = 90
subscription_batch_limit = 500
max_concurrent_lookups = 4

[delivery]
queue_capacity = 10
workers = 3
offer_timeout_secs = 15
send_timeout_secs = 20
shutdown_grace_secs = 5

[retention]
eval_expiration_hours = 100
offline_activity_threshold_hours = 50

[cache]
account_ttl_secs = 600
match_ttl_secs = 30

[rate_limit]
max_commands = 3
window_secs = 10

[riot]
api_key = "RGAPI-test"

[discord]
bot_token = "discord-token"

[anthropic]
api_key = "sk-ant-test"
model = "claude-3-5-haiku-latest"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.bot.max_subscriptions_per_server, 25);
    assert!(config.bot.verbose_user_errors);
    assert_eq!(config.storage.backend, StorageBackend::Postgres);
    assert_eq!(config.storage.max_connections, 8);
    assert_eq!(config.poller.interval_secs, 30);
    assert_eq!(config.poller.max_concurrent_lookups, 4);
    assert_eq!(config.delivery.workers, 3);
    assert_eq!(config.retention.eval_expiration_hours, 100);
    assert_eq!(config.cache.match_ttl_secs, 30);
    assert_eq!(config.rate_limit.max_commands, 3);
    assert_eq!(config.riot.api_key.as_deref(), Some("RGAPI-test"));
    assert_eq!(config.discord.bot_token.as_deref(), Some("discord-token"));
    assert_eq!(config.anthropic.api_key.as_deref(), Some("sk-ant-test"));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.bot.log_level, "info");
    assert_eq!(config.bot.max_subscriptions_per_server, 100);
    assert!(!config.bot.verbose_user_errors);
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert!(config.storage.wal_mode);
    assert_eq!(config.poller.interval_secs, 60);
    assert_eq!(config.poller.subscription_batch_limit, 1000);
    assert_eq!(config.delivery.queue_capacity, 20);
    assert_eq!(config.delivery.workers, 2);
    assert_eq!(config.delivery.offer_timeout_secs, 60);
    assert_eq!(config.retention.eval_expiration_hours, 720);
    assert_eq!(config.retention.offline_activity_threshold_hours, 504);
    assert_eq!(config.cache.account_ttl_secs, 86_400);
    assert_eq!(config.cache.match_ttl_secs, 120);
    assert_eq!(config.rate_limit.max_commands, 5);
    assert_eq!(config.rate_limit.window_secs, 60);
    assert!(config.discord.bot_token.is_none());
}

#[test]
fn unknown_field_in_poller_produces_error() {
    let toml = r#"
[poller]
intervl_secs = 5
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("intervl_secs"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[metrics]
enabled = true
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("metrics"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unknown key diagnostics carry the suggestion and the section's valid keys.
#[test]
fn diagnostic_error_includes_suggestion_and_valid_keys() {
    let toml = r#"
[rate_limit]
max_comands = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "max_comands"
                && suggestion.as_deref() == Some("max_commands")
                && valid_keys.contains("window_secs")
        })
    });
    assert!(found, "expected UnknownKey for max_comands, got: {errors:?}");
}

#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[delivery]
workers = "many"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("workers"))),
        "got: {errors:?}"
    );
}

#[test]
fn unknown_storage_backend_is_rejected() {
    let toml = r#"
[storage]
backend = "mysql"
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// A serialized default config reloads to the same values.
#[test]
#[serial]
fn defaults_survive_toml_round_trip() {
    let rendered = toml::to_string(&RenwatchConfig::default()).expect("serialize defaults");
    assert!(rendered.contains("[retention]"), "got: {rendered}");

    let reloaded = load_and_validate_str(&rendered).expect("rendered defaults should validate");
    assert_eq!(reloaded.poller.interval_secs, 60);
    assert_eq!(reloaded.delivery.shutdown_grace_secs, 30);
    assert_eq!(reloaded.retention.offline_activity_threshold_hours, 504);
    assert_eq!(reloaded.storage.backend, StorageBackend::Sqlite);
    assert!(reloaded.storage.database_url.is_none());
}

#[test]
fn validation_errors_surface_through_loader() {
    let toml = r#"
[storage]
backend = "postgres"
"#;

    let errors = load_and_validate_str(toml).expect_err("postgres without url should fail");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("database_url"))
    ));
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::MissingCredential {
        key: "riot.api_key".to_string(),
        env_var: "RIOT_API_KEY".to_string(),
    };
    assert!(error.code().is_some());
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("RIOT_API_KEY"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("riot.api_key"));
}

#[test]
fn explicit_path_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[poller]\ninterval_secs = 15\n").unwrap();

    let config = load_and_validate_path(&path).expect("file should load");
    assert_eq!(config.poller.interval_secs, 15);
}

/// `RENWATCH_*` variables override file values and keep underscored key names intact.
#[test]
#[serial]
fn env_vars_override_local_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "renwatch.toml",
            r#"
[poller]
interval_secs = 45

[discord]
bot_token = "from-file"
"#,
        )?;
        jail.set_env("RENWATCH_POLLER_INTERVAL_SECS", "5");
        jail.set_env("RENWATCH_RATE_LIMIT_MAX_COMMANDS", "9");
        jail.set_env("RENWATCH_DISCORD_BOT_TOKEN", "from-env");

        let config: RenwatchConfig = load_config()?;
        assert_eq!(config.poller.interval_secs, 5);
        assert_eq!(config.rate_limit.max_commands, 9);
        assert_eq!(config.discord.bot_token.as_deref(), Some("from-env"));
        Ok(())
    });
}

/// Conventional credential variables fill in missing keys.
#[test]
#[serial]
fn credential_env_vars_fill_keys() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RIOT_API_KEY", "RGAPI-env");
        jail.set_env("DISCORD_TOKEN", "discord-env");
        jail.set_env("ANTHROPIC_API_KEY", "sk-ant-env");

        let config = load_config()?;
        assert_eq!(config.riot.api_key.as_deref(), Some("RGAPI-env"));
        assert_eq!(config.discord.bot_token.as_deref(), Some("discord-env"));
        assert_eq!(config.anthropic.api_key.as_deref(), Some("sk-ant-env"));
        assert!(renwatch_config::validate_credentials(&config).is_ok());
        Ok(())
    });
}

#[test]
fn gemini_provider_section_deserializes() {
    let toml = r#"
[translation]
provider = "gemini"

[gemini]
api_key = "AIza-test"
model = "gemini-2.0-flash"
"#;

    let config = load_config_from_str(toml).expect("gemini sections should deserialize");
    assert_eq!(config.translation.provider, TranslationProvider::Gemini);
    assert_eq!(config.gemini.api_key.as_deref(), Some("AIza-test"));
    assert_eq!(config.gemini.model, "gemini-2.0-flash");
    assert_eq!(config.gemini.max_output_tokens, 1024);

    let defaults = load_config_from_str("").unwrap();
    assert_eq!(defaults.translation.provider, TranslationProvider::Anthropic);
    assert_eq!(defaults.gemini.model, "gemma-3-27b-it");
    assert!(load_config_from_str("[translation]\nprovider = \"openai\"\n").is_err());
}

/// `GOOGLE_API_KEY` takes precedence over `GEMINI_API_KEY`.
#[test]
#[serial]
fn google_credential_env_vars_fill_gemini_key() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("GEMINI_API_KEY", "from-gemini-var");
        let config = load_config()?;
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-gemini-var"));

        jail.set_env("GOOGLE_API_KEY", "from-google-var");
        jail.set_env("RENWATCH_TRANSLATION_PROVIDER", "gemini");
        let config = load_config()?;
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-google-var"));
        assert_eq!(config.translation.provider, TranslationProvider::Gemini);
        Ok(())
    });
}
