// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detection of names written in scripts that warrant translation.

use std::sync::LazyLock;

use regex::Regex;

/// Unicode Script=Han or Script=Hangul.
static TRANSLATABLE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Han}\p{Hangul}]").expect("valid script class"));

/// True when any character of `name` is Han or Hangul.
pub fn needs_translation(name: &str) -> bool {
    TRANSLATABLE_SCRIPT.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_han_and_hangul() {
        assert!(needs_translation("玩家2"));
        assert!(needs_translation("페이커"));
        assert!(needs_translation("Faker王"));
    }

    #[test]
    fn ignores_latin_kana_and_digits() {
        assert!(!needs_translation("Faker"));
        assert!(!needs_translation("12345"));
        assert!(!needs_translation("ひらがな"));
        assert!(!needs_translation(""));
    }

    #[test]
    fn follows_unicode_script_tables() {
        // Hangul tone marks, parenthesized and circled Hangul.
        for c in ['\u{302E}', '\u{302F}', '\u{3200}', '\u{321E}', '\u{3260}', '\u{327E}'] {
            assert!(needs_translation(&c.to_string()), "U+{:04X}", c as u32);
        }
        // Han iteration mark, ideographic zero, Hangzhou numerals, extension B.
        for c in ['\u{3005}', '\u{3007}', '\u{3021}', '\u{20000}'] {
            assert!(needs_translation(&c.to_string()), "U+{:04X}", c as u32);
        }
        // Circled katakana and CJK punctuation are neither.
        for c in ['\u{32D0}', '\u{3001}'] {
            assert!(!needs_translation(&c.to_string()), "U+{:04X}", c as u32);
        }
    }
}
