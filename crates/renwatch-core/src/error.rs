// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Renwatch.

use std::time::Duration;

use thiserror::Error;

/// Errors caused by the person issuing a command rather than by the system.
///
/// The `Display` text of each variant is what the user is shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("invalid Riot ID `{input}`: expected `name#tag`")]
    InvalidRiotId { input: String },

    #[error("unknown region `{input}`; valid regions are {valid}")]
    InvalidRegion { input: String, valid: String },

    #[error("no account named `{riot_id}` exists in {region}")]
    AccountNotFound { riot_id: String, region: String },

    #[error("`{riot_id}` ({region}) is already being watched in this channel")]
    AlreadySubscribed { riot_id: String, region: String },

    #[error("`{riot_id}` ({region}) is not being watched in this channel")]
    NotSubscribed { riot_id: String, region: String },

    #[error("this server already watches the maximum of {limit} accounts")]
    SubscriptionLimit { limit: u32 },

    #[error("slow down: at most {max} commands per {window_secs}s")]
    RateLimited { max: usize, window_secs: u64 },
}

/// How a failure should be handled and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    /// Returned to the user; logged at debug (or warn when verbose).
    User,
    /// Upstream or storage trouble; skip the unit of work and retry next cycle.
    Transient,
    /// An external side effect exists without its ledger row.
    Invariant,
    /// Startup or configuration failure; the process cannot continue.
    Fatal,
}

/// The primary error type used across all Renwatch traits and services.
#[derive(Debug, Error)]
pub enum RenwatchError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, query, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A lookup matched no rows or no upstream entity.
    #[error("{entity} not found")]
    NotFound { entity: String },

    /// A command was rejected for a reason the user can fix.
    #[error(transparent)]
    User(#[from] UserError),

    /// Game-state API failures.
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Translation service failures.
    #[error("translation error: {message}")]
    Translation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Message server failures.
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A notification was sent but could not be recorded.
    #[error("invariant violation: {message}")]
    InvariantViolation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RenwatchError {
    /// Shorthand for a [`RenwatchError::NotFound`] naming the missing entity.
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Wrap any backend error as a storage failure.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// True when the error is the portable "no rows" result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Classify the error for logging severity and retry handling.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::User(_) => ErrorClass::User,
            Self::InvariantViolation { .. } => ErrorClass::Invariant,
            Self::Config(_) => ErrorClass::Fatal,
            Self::Storage { .. }
            | Self::NotFound { .. }
            | Self::Upstream { .. }
            | Self::Translation { .. }
            | Self::Delivery { .. }
            | Self::Timeout { .. }
            | Self::Internal(_) => ErrorClass::Transient,
        }
    }
}
