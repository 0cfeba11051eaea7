// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`TranslationCache`]: read-through translations persisted in the repository.
//!
//! Names with a stored translation are answered from storage; only the rest
//! reach the LLM backend, and its answers are written back tagged with the
//! backend's provider and model. Stored translations never expire.

use std::sync::Arc;

use async_trait::async_trait;
use renwatch_core::types::StoredTranslation;
use renwatch_core::{
    AdapterType, Clock, HealthStatus, PluginAdapter, RenwatchError, Repository, TranslatedName,
    Translator,
};
use tracing::{debug, warn};

pub struct TranslationCache {
    repo: Arc<dyn Repository>,
    inner: Arc<dyn Translator>,
    clock: Arc<dyn Clock>,
}

impl TranslationCache {
    pub fn new(
        repo: Arc<dyn Repository>,
        inner: Arc<dyn Translator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, inner, clock }
    }
}

#[async_trait]
impl PluginAdapter for TranslationCache {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Translator
    }

    async fn health_check(&self) -> Result<HealthStatus, RenwatchError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), RenwatchError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl Translator for TranslationCache {
    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn translate(&self, names: &[String]) -> Result<Vec<TranslatedName>, RenwatchError> {
        let mut distinct: Vec<String> = Vec::new();
        for name in names {
            if !distinct.contains(name) {
                distinct.push(name.clone());
            }
        }
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let mut known: Vec<TranslatedName> = self
            .repo
            .get_translations(&distinct)
            .await?
            .into_iter()
            .map(|stored| TranslatedName {
                original: stored.original,
                translated: stored.translated,
            })
            .collect();

        let missing: Vec<String> = distinct
            .iter()
            .filter(|name| !known.iter().any(|t| &t.original == *name))
            .cloned()
            .collect();
        debug!(
            stored = known.len(),
            missing = missing.len(),
            "translation lookup"
        );

        if !missing.is_empty() {
            let fresh = self.inner.translate(&missing).await?;
            let now = self.clock.now();
            // An echoed name is the backend giving up; leave it unstored so it is retried.
            let to_store: Vec<StoredTranslation> = fresh
                .iter()
                .filter(|t| t.translated != t.original)
                .map(|t| StoredTranslation {
                    original: t.original.clone(),
                    translated: t.translated.clone(),
                    provider: self.inner.name().to_string(),
                    model: self.inner.model().to_string(),
                    created_at: now,
                })
                .collect();
            if let Err(e) = self.repo.put_translations(&to_store).await {
                warn!(error = %e, count = to_store.len(), "failed to persist translations");
            }
            known.extend(fresh);
        }

        Ok(distinct
            .into_iter()
            .filter_map(|name| known.iter().find(|t| t.original == name).cloned())
            .collect())
    }
}
