// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Region to Riot API host routing.
//!
//! Account lookups go to the regional cluster; spectator lookups go to the
//! platform shard that hosts the region.

use renwatch_core::Region;

/// Regional routing value used by account-v1.
pub fn regional_host(region: Region) -> &'static str {
    match region {
        Region::Na | Region::Br | Region::Lan | Region::Las => "americas",
        Region::Euw | Region::Eune | Region::Tr | Region::Ru => "europe",
        Region::Kr | Region::Jp => "asia",
        Region::Oce => "sea",
    }
}

/// Platform routing value used by spectator-v5.
pub fn platform_host(region: Region) -> &'static str {
    match region {
        Region::Na => "na1",
        Region::Euw => "euw1",
        Region::Eune => "eun1",
        Region::Kr => "kr",
        Region::Jp => "jp1",
        Region::Br => "br1",
        Region::Lan => "la1",
        Region::Las => "la2",
        Region::Oce => "oc1",
        Region::Tr => "tr1",
        Region::Ru => "ru",
    }
}

/// Base URL for a routing value on the public API.
pub fn api_base(host: &str) -> String {
    format!("https://{host}.api.riotgames.com")
}
