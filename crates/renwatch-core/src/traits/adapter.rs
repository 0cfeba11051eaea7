// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by every external-system adapter.

use async_trait::async_trait;

use crate::error::RenwatchError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health, and lifecycle for an adapter.
///
/// Every repository backend and upstream client implements this so startup
/// can report what was wired in and shutdown can release resources uniformly.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the role this adapter plays.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, RenwatchError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), RenwatchError>;
}
