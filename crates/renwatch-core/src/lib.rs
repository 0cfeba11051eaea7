// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Renwatch.
//!
//! Holds the adapter traits every backend and upstream client implements,
//! the shared error type, and the domain records that flow between the
//! producer, the delivery workers, and storage.

pub mod account;
pub mod clock;
pub mod error;
pub mod script;
pub mod traits;
pub mod translation;
pub mod types;

pub use account::{Account, AccountId, Region, RiotId};
pub use clock::{Clock, SystemClock};
pub use error::{ErrorClass, RenwatchError, UserError};
pub use types::{
    AdapterType, ChannelId, DeliveryJob, Eval, EvalStatus, HealthStatus, MatchInfo, MatchState,
    MessageId, Notification, OrgId, Subscription, TranslatedName,
};

pub use traits::{GameStateProvider, MessageServer, PluginAdapter, Repository, Translator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Repository,
            AdapterType::GameState,
            AdapterType::Translator,
            AdapterType::MessageServer,
        ];
        for variant in &variants {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn all_adapter_traits_are_exported() {
        fn _assert_repository<T: Repository>() {}
        fn _assert_game_state<T: GameStateProvider>() {}
        fn _assert_translator<T: Translator>() {}
        fn _assert_message_server<T: MessageServer>() {}
    }

    #[test]
    fn system_clock_moves_forward() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
