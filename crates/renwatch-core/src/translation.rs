// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt and response format shared by the LLM translation backends.

use serde::Deserialize;

use crate::error::RenwatchError;

/// Instructions sent with every translation request.
pub const SYSTEM_PROMPT: &str = "\
You are translating League of Legends summoner names from Korean and Chinese to English.

For each name, provide:
1. The English translation or transliteration
2. Brief context if it's a cultural reference, pun, pro player name, or gaming term

Respond ONLY with a JSON array, no other text. Example:
[
  {\"original\": \"不知火舞\", \"translated\": \"Mai Shiranui\", \"explanation\": \"Fighting game character from Fatal Fury/KOF\"},
  {\"original\": \"人人人\", \"translated\": \"Person Person Person\", \"explanation\": \"\"}
]";

/// The user turn listing the names to translate.
pub fn user_prompt(names: &[&str]) -> String {
    let mut prompt = String::from("Translate these summoner names:\n");
    for name in names {
        prompt.push_str("- ");
        prompt.push_str(name);
        prompt.push('\n');
    }
    prompt
}

/// One entry of the JSON array the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NameTranslation {
    pub original: String,
    pub translated: String,
    #[serde(default)]
    pub explanation: String,
}

impl NameTranslation {
    /// `translated`, with the explanation in parentheses when there is one.
    pub fn compose(&self) -> String {
        let explanation = self.explanation.trim();
        if explanation.is_empty() {
            self.translated.clone()
        } else {
            format!("{} ({explanation})", self.translated)
        }
    }
}

/// Parse the model's JSON array, tolerating a surrounding Markdown code fence.
pub fn parse_translations(text: &str) -> Result<Vec<NameTranslation>, RenwatchError> {
    let body = strip_code_fence(text);
    serde_json::from_str(body).map_err(|e| RenwatchError::Translation {
        message: format!("failed to parse translation response: {e}"),
        source: Some(Box::new(e)),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string line (e.g. "json").
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    let rest = match rest.rfind("```") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_each_name() {
        assert_eq!(
            user_prompt(&["玩家2", "불꽃"]),
            "Translate these summoner names:\n- 玩家2\n- 불꽃\n"
        );
    }

    #[test]
    fn parses_fenced_json() {
        let text = "```json\n[{\"original\": \"玩家2\", \"translated\": \"Player 2\"}]\n```";
        let parsed = parse_translations(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].compose(), "Player 2");
    }

    #[test]
    fn compose_appends_explanation() {
        let entry = NameTranslation {
            original: "不知火舞".into(),
            translated: "Mai Shiranui".into(),
            explanation: "Fighting game character".into(),
        };
        assert_eq!(entry.compose(), "Mai Shiranui (Fighting game character)");
    }

    #[test]
    fn malformed_response_is_translation_error() {
        let err = parse_translations("Sure! Here are your names").unwrap_err();
        assert!(matches!(err, RenwatchError::Translation { .. }));
    }
}
