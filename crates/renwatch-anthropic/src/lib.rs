// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic-backed player name translator for Renwatch.
//!
//! This crate implements [`Translator`] by asking a Claude model for a JSON
//! array of translations. It keeps no state between calls; reuse of earlier
//! translations is the job of the repository-backed `TranslationCache`.

pub mod client;
pub mod types;

use async_trait::async_trait;
use renwatch_config::model::AnthropicConfig;
use renwatch_core::translation::{self, NameTranslation, SYSTEM_PROMPT};
use renwatch_core::{
    AdapterType, HealthStatus, PluginAdapter, RenwatchError, TranslatedName, Translator,
};
use tracing::{debug, info, warn};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Claude-backed [`Translator`].
pub struct AnthropicTranslator {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicTranslator {
    /// Creates a translator from configuration.
    ///
    /// The API key comes from `anthropic.api_key` (or `ANTHROPIC_API_KEY`,
    /// mapped by the config loader).
    pub fn new(config: &AnthropicConfig) -> Result<Self, RenwatchError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RenwatchError::Config(
                    "Anthropic API key not found. Set anthropic.api_key or ANTHROPIC_API_KEY."
                        .into(),
                )
            })?;
        let client = AnthropicClient::new(api_key, &config.api_version)?;
        info!(model = config.model, "Anthropic translator initialized");
        Ok(Self::with_client(client, config))
    }

    fn with_client(client: AnthropicClient, config: &AnthropicConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn request_translations(
        &self,
        names: &[&str],
    ) -> Result<Vec<NameTranslation>, RenwatchError> {
        let request = MessageRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage::user(translation::user_prompt(names))],
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: self.max_tokens,
        };
        let response = self.client.complete_message(&request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "translation response received"
        );

        let text = response.text().ok_or_else(|| RenwatchError::Translation {
            message: "no text content in response".into(),
            source: None,
        })?;
        translation::parse_translations(text)
    }
}

#[async_trait]
impl PluginAdapter for AnthropicTranslator {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Translator
    }

    async fn health_check(&self) -> Result<HealthStatus, RenwatchError> {
        // Avoid spending tokens on health checks.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RenwatchError> {
        debug!("Anthropic translator shutting down");
        Ok(())
    }
}

#[async_trait]
impl Translator for AnthropicTranslator {
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
            .map(|name| {
                let translated = fresh
                    .iter()
                    .find(|entry| entry.original == name)
                    .map(NameTranslation::compose)
                    .unwrap_or_else(|| {
                        warn!(name, "model omitted a name; echoing it untranslated");
                        name.to_string()
                    });
                TranslatedName {
                    original: name.to_string(),
                    translated,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "claude-3-5-haiku-latest",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        })
    }

    fn translator(server: &MockServer) -> AnthropicTranslator {
        let client = AnthropicClient::new("test-api-key", "2023-06-01")
            .unwrap()
            .with_base_url(server.uri());
        AnthropicTranslator::with_client(client, &AnthropicConfig::default())
    }

    #[test]
    fn new_requires_api_key() {
        let result = AnthropicTranslator::new(&AnthropicConfig::default());
        assert!(matches!(result, Err(RenwatchError::Config(_))));
    }




    #[tokio::test]
    async fn duplicate_names_share_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains("玩家2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(
                "```json\n[{\"original\": \"玩家2\", \"translated\": \"Player 2\", \"explanation\": \"\"}]\n```",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let translator = translator(&server);
        assert_eq!(translator.model(), "claude-3-5-haiku-latest");
        let names = vec!["玩家2".to_string(), "玩家2".to_string()];
        let translated = translator.translate(&names).await.unwrap();
        assert_eq!(
            translated,
            vec![TranslatedName {
                original: "玩家2".into(),
                translated: "Player 2".into()
            }]
        );
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("[]")))
            .expect(0)
            .mount(&server)
            .await;

        assert!(translator(&server).translate(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn omitted_names_are_echoed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(
                r#"[{"original": "하나", "translated": "One"}]"#,
            )))
            .mount(&server)
            .await;

        let names = vec!["하나".to_string(), "둘".to_string()];
        let result = translator(&server).translate(&names).await.unwrap();
        assert_eq!(result[0].translated, "One");
        assert_eq!(result[1].translated, "둘");
    }

    #[tokio::test]
    async fn api_failure_surfaces_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let err = translator(&server)
            .translate(&["玩家2".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RenwatchError::Translation { .. }));
    }
}
