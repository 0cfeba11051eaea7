// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Player account identity: Riot IDs, regions, and resolved accounts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::UserError;

/// Game server region a player account lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Na,
    Euw,
    Eune,
    Kr,
    Jp,
    Br,
    Lan,
    Las,
    Oce,
    Tr,
    Ru,
}

impl Region {
    pub const ALL: [Region; 11] = [
        Region::Na,
        Region::Euw,
        Region::Eune,
        Region::Kr,
        Region::Jp,
        Region::Br,
        Region::Lan,
        Region::Las,
        Region::Oce,
        Region::Tr,
        Region::Ru,
    ];

    /// Parse user input into a region, reporting the valid set on failure.
    pub fn parse(input: &str) -> Result<Self, UserError> {
        Region::from_str(input.trim()).map_err(|_| UserError::InvalidRegion {
            input: input.trim().to_string(),
            valid: Self::valid_list(),
        })
    }

    /// Comma-separated list of every region code.
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A player's `name#tag` identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl RiotId {
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            tag_line: tag_line.into(),
        }
    }

    /// Parse `name#tag`, tolerating whitespace around either half.
    pub fn parse(input: &str) -> Result<Self, UserError> {
        let invalid = || UserError::InvalidRiotId {
            input: input.trim().to_string(),
        };

        let mut parts = input.trim().split('#');
        let (Some(name), Some(tag), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let (name, tag) = (name.trim(), tag.trim());
        if name.is_empty() || tag.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(name, tag))
    }

    /// Case-insensitive comparison against a raw `name#tag` string.
    pub fn matches(&self, raw: &str) -> bool {
        raw.trim().to_lowercase() == self.to_string().to_lowercase()
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

/// Opaque upstream account identifier (a PUUID for Riot).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An account resolved by the game-state API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Canonical capitalization as reported upstream.
    pub riot_id: RiotId,
}

/// The display-name half of a raw participant identity.
///
/// `"玩家2#KR1"` yields `"玩家2"`; a value without a tag is returned whole.
pub fn display_name(raw: &str) -> &str {
    match raw.split_once('#') {
        Some((name, _)) => name.trim(),
        None => raw.trim(),
    }
}
