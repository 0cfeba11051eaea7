// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification layout, independent of the Discord client.

use renwatch_core::Notification;

/// Embed accent color (Discord blurple).
pub const EMBED_COLOR: u32 = 0x5865F2;

/// Pairs rendered as inline Original/Translation fields before overflow.
pub const MAX_INLINE_ENTRIES: usize = 8;

/// Discord's limit on a single field value.
pub const MAX_FIELD_VALUE: usize = 1024;

const BLANK: &str = "\u{200b}";

/// One embed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    fn new(name: &str, value: &str, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            inline,
        }
    }
}

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<Field>,
}

/// Lay out a notification: the first eight pairs side by side, the rest as
/// `**original** → translated` lines split across as many fields as needed.
pub fn render(notification: &Notification) -> RenderedEmbed {
    let translations = &notification.translations;
    let inline_count = translations.len().min(MAX_INLINE_ENTRIES);
    let mut fields = Vec::new();

    for (i, t) in translations.iter().take(inline_count).enumerate() {
        fields.push(Field::new("Original", &t.original, true));
        fields.push(Field::new("Translation", &t.translated, true));
        if i + 1 < inline_count {
            fields.push(Field::new(BLANK, BLANK, false));
        }
    }

    let mut chunk = String::new();
    for t in translations.iter().skip(MAX_INLINE_ENTRIES) {
        let line = format!("**{}** → {}\n", t.original, t.translated);
        if !chunk.is_empty() && chunk.len() + line.len() > MAX_FIELD_VALUE {
            fields.push(Field::new(BLANK, &chunk, false));
            chunk.clear();
        }
        chunk.push_str(&line);
    }
    if !chunk.is_empty() {
        fields.push(Field::new(BLANK, &chunk, false));
    }

    RenderedEmbed {
        title: format!("{} is in a game!", notification.account),
        description: "Translations for players in this match:".to_string(),
        color: EMBED_COLOR,
        fields,
    }
}
