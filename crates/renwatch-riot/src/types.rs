// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response bodies for the Riot endpoints Renwatch calls.

use serde::Deserialize;

/// `GET /riot/account/v1/accounts/by-riot-id/{gameName}/{tagLine}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
}

/// `GET /lol/spectator/v5/active-games/by-summoner/{puuid}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentGameDto {
    pub game_id: i64,
    #[serde(default)]
    pub participants: Vec<CurrentGameParticipantDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentGameParticipantDto {
    /// Absent for bots.
    #[serde(default)]
    pub puuid: Option<String>,
    #[serde(default)]
    pub riot_id: Option<String>,
}

/// Error envelope: `{"status": {"message": "...", "status_code": 403}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub status: ApiErrorStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorStatus {
    pub message: String,
    pub status_code: u16,
}
