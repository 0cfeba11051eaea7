// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock translator backed by a fixed dictionary.
//!
//! Names missing from the dictionary come back as `"{name} (en)"`. A batch
//! containing a stalled name hangs until [`MockTranslator::resume`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use renwatch_core::{
    AdapterType, HealthStatus, PluginAdapter, RenwatchError, TranslatedName, Translator,
};
use tokio::sync::{Mutex, watch};

pub struct MockTranslator {
    dictionary: Mutex<HashMap<String, String>>,
    batches: Mutex<Vec<Vec<String>>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    stalled: watch::Sender<Vec<String>>,
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self {
            dictionary: Mutex::new(HashMap::new()),
            batches: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            stalled: watch::Sender::new(Vec::new()),
        }
    }
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a translator preloaded with `(original, translated)` pairs.
    pub async fn with_entries(entries: &[(&str, &str)]) -> Self {
        let translator = Self::new();
        for (original, translated) in entries {
            translator.insert(original, translated).await;
        }
        translator
    }

    pub async fn insert(&self, original: &str, translated: &str) {
        self.dictionary
            .lock()
            .await
            .insert(original.to_string(), translated.to_string());
    }

    /// Make every batch fail with a translation error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hold any batch that contains `name` until [`resume`](Self::resume).
    pub fn stall_on(&self, name: &str) {
        self.stalled.send_modify(|names| names.push(name.to_string()));
    }

    pub fn resume(&self) {
        self.stalled.send_replace(Vec::new());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every batch received, in call order.
    pub async fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockTranslator {
    fn name(&self) -> &str {
        "mock-translator"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Translator
    }

    async fn health_check(&self) -> Result<HealthStatus, RenwatchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RenwatchError> {
        Ok(())
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn model(&self) -> &str {
        "mock-dictionary"
    }

    async fn translate(&self, names: &[String]) -> Result<Vec<TranslatedName>, RenwatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().await.push(names.to_vec());

        let mut stalled = self.stalled.subscribe();
        loop {
            let blocked = stalled.borrow_and_update().iter().any(|s| names.contains(s));
            if !blocked || stalled.changed().await.is_err() {
                break;
            }
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(RenwatchError::Translation {
                message: "mock translator unavailable".into(),
                source: None,
            });
        }

        let dictionary = self.dictionary.lock().await;
        let mut out: Vec<TranslatedName> = Vec::new();
        for name in names {
            if out.iter().any(|t| &t.original == name) {
                continue;
            }
            out.push(TranslatedName {
                original: name.clone(),
                translated: dictionary
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| format!("{name} (en)")),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn translates_from_dictionary_and_dedupes() {
        let translator = MockTranslator::with_entries(&[("玩家2", "Player 2")]).await;
        let out = translator
            .translate(&["玩家2".into(), "玩家2".into(), "하나".into()])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].translated, "Player 2");
        assert_eq!(out[1].translated, "하나 (en)");
        assert_eq!(translator.calls(), 1);
    }

    #[tokio::test]
    async fn failure_injection() {
        let translator = MockTranslator::new();
        translator.set_failing(true);
        assert!(translator.translate(&["玩家2".into()]).await.is_err());
        assert_eq!(translator.batches().await.len(), 1);
    }

    #[tokio::test]
    async fn stalled_batch_completes_after_resume() {
        let translator = std::sync::Arc::new(MockTranslator::new());
        translator.stall_on("불꽃");

        let other = translator.translate(&["하나".into()]).await.unwrap();
        assert_eq!(other[0].translated, "하나 (en)");

        let pending = tokio::spawn({
            let translator = translator.clone();
            async move { translator.translate(&["불꽃".into()]).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        translator.resume();
        let out = pending.await.unwrap().unwrap();
        assert_eq!(out[0].translated, "불꽃 (en)");
    }
}
