// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Name translation contract.

use async_trait::async_trait;

use crate::error::RenwatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::TranslatedName;

/// Translates a batch of player names.
#[async_trait]
pub trait Translator: PluginAdapter {
    /// Model identifier recorded alongside persisted translations.
    fn model(&self) -> &str;

    /// Returns one entry per distinct input name, in input order.
    async fn translate(&self, names: &[String]) -> Result<Vec<TranslatedName>, RenwatchError>;
}
