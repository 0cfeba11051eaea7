// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message server contract.

use async_trait::async_trait;

use crate::error::RenwatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelId, MessageId, Notification};

/// Posts notifications to chat channels.
#[async_trait]
pub trait MessageServer: PluginAdapter {
    /// Post a match notification and return the id of the created message.
    async fn send(
        &self,
        channel_id: &ChannelId,
        notification: &Notification,
    ) -> Result<MessageId, RenwatchError>;

    /// Post plain text as a reply to an existing message.
    async fn reply_to(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), RenwatchError>;
}
