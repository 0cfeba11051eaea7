// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord message server adapter for Renwatch.
//!
//! Posts match notifications as embeds over the Discord REST API. Only the
//! HTTP half of serenity is used; command intake lives elsewhere.

pub mod embed;

use async_trait::async_trait;
use renwatch_config::model::DiscordConfig;
use renwatch_core::{
    AdapterType, ChannelId, HealthStatus, MessageId, MessageServer, Notification, PluginAdapter,
    RenwatchError,
};
use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::http::Http;
use serenity::model::id;
use tracing::{debug, info};

use crate::embed::{RenderedEmbed, render};

/// Discord-backed [`MessageServer`].
pub struct DiscordMessageServer {
    http: Http,
}

impl DiscordMessageServer {
    /// Creates a message server from configuration.
    ///
    /// The token comes from `discord.bot_token` (or `DISCORD_TOKEN`,
    /// mapped by the config loader).
    pub fn new(config: &DiscordConfig) -> Result<Self, RenwatchError> {
        let token = config
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                RenwatchError::Config(
                    "Discord bot token not found. Set discord.bot_token or DISCORD_TOKEN."
                        .into(),
                )
            })?;
        info!("Discord message server initialized");
        Ok(Self {
            http: Http::new(token),
        })
    }
}

/// Parse a Discord snowflake. Zero is not a valid id.
fn snowflake(raw: &str, what: &str) -> Result<u64, RenwatchError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(RenwatchError::Delivery {
            message: format!("invalid Discord {what} id `{raw}`"),
            source: None,
        }),
        Ok(n) => Ok(n),
    }
}

fn channel(channel_id: &ChannelId) -> Result<id::ChannelId, RenwatchError> {
    snowflake(&channel_id.0, "channel").map(id::ChannelId::new)
}

fn to_create_embed(rendered: RenderedEmbed) -> CreateEmbed {
    rendered.fields.into_iter().fold(
        CreateEmbed::new()
            .title(rendered.title)
            .description(rendered.description)
            .color(rendered.color),
        |embed, f| embed.field(f.name, f.value, f.inline),
    )
}

fn delivery_error(context: &str, e: serenity::Error) -> RenwatchError {
    RenwatchError::Delivery {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for DiscordMessageServer {
    fn name(&self) -> &str {
        "discord"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MessageServer
    }

    async fn health_check(&self) -> Result<HealthStatus, RenwatchError> {
        match self.http.get_current_user().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("Discord API unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), RenwatchError> {
        debug!("Discord message server shutting down");
        Ok(())
    }
}

#[async_trait]
impl MessageServer for DiscordMessageServer {
    async fn send(
        &self,
        channel_id: &ChannelId,
        notification: &Notification,
    ) -> Result<MessageId, RenwatchError> {
        let target = channel(channel_id)?;
        let message = CreateMessage::new().embed(to_create_embed(render(notification)));
        let sent = target
            .send_message(&self.http, message)
            .await
            .map_err(|e| delivery_error("failed to post notification", e))?;
        debug!(channel_id = %channel_id, message_id = %sent.id, "notification posted");
        Ok(MessageId(sent.id.get().to_string()))
    }

    async fn reply_to(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), RenwatchError> {
        let target = channel(channel_id)?;
        let parent = id::MessageId::new(snowflake(&message_id.0, "message")?);
        let message = CreateMessage::new()
            .content(content)
            .reference_message((target, parent));
        target
            .send_message(&self.http, message)
            .await
            .map_err(|e| delivery_error("failed to post reply", e))?;
        Ok(())
    }
}
