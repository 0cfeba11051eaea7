// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini player name translator for Renwatch.
//!
//! Gemma models reject system instructions, so the shared prompt is sent
//! as the head of the single user turn.

pub mod client;
pub mod types;

use async_trait::async_trait;
use renwatch_config::model::GeminiConfig;
use renwatch_core::translation::{self, NameTranslation, SYSTEM_PROMPT};
use renwatch_core::{
    AdapterType, HealthStatus, PluginAdapter, RenwatchError, TranslatedName, Translator,
};
use tracing::{debug, info, warn};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig};

/// Gemini-backed [`Translator`].
pub struct GeminiTranslator {
    client: GeminiClient,
    model: String,
    max_output_tokens: u32,
}

impl GeminiTranslator {
    pub fn new(config: &GeminiConfig) -> Result<Self, RenwatchError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RenwatchError::Config(
                    "Gemini API key not found. Set gemini.api_key or GOOGLE_API_KEY.".into(),
                )
            })?;
        let client = GeminiClient::new(api_key)?;
        info!(model = config.model, "Gemini translator initialized");
        Ok(Self::with_client(client, config))
    }

    fn with_client(client: GeminiClient, config: &GeminiConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
        }
    }

    async fn request_translations(
        &self,
        names: &[&str],
    ) -> Result<Vec<NameTranslation>, RenwatchError> {
        let prompt = format!("{SYSTEM_PROMPT}\n\n{}", translation::user_prompt(names));
        let request = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            generation_config: Some(GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            }),
        };
        let response = self.client.generate_content(&self.model, &request).await?;
        debug!(
            prompt_tokens = response.usage_metadata.prompt_token_count,
            output_tokens = response.usage_metadata.candidates_token_count,
            "translation response received"
        );

        let text = response.text().ok_or_else(|| RenwatchError::Translation {
            message: "empty response from Gemini".into(),
            source: None,
        })?;
        translation::parse_translations(text)
    }
}

#[async_trait]
impl PluginAdapter for GeminiTranslator {
    fn name(&self) -> &str {
        "gemini"
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
        debug!("Gemini translator shutting down");
        Ok(())
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn translate(&self, names: &[String]) -> Result<Vec<TranslatedName>, RenwatchError> {
        let mut distinct: Vec<&str> = Vec::new();
        for name in names {
            if !distinct.contains(&name.as_str()) {
                distinct.push(name);
            }
        }
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let fresh = self.request_translations(&distinct).await?;
        Ok(distinct
            .into_iter()
            .map(|name| TranslatedName {
                original: name.to_string(),
                translated: fresh
                    .iter()
                    .find(|entry| entry.original == name)
                    .map(NameTranslation::compose)
                    .unwrap_or_else(|| {
                        warn!(name, "model omitted a name; echoing it untranslated");
                        name.to_string()
                    }),
            })
            .collect())
    }
}
