// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-neutral subscribe, unsubscribe, and list commands.
//!
//! Every command is rate limited per actor first. Errors come back
//! classified; [`CommandReply::for_error`] turns any of them into the text
//! shown to the user.

use std::sync::Arc;

use renwatch_cache::GameStateCache;
use renwatch_core::types::{NewSubscription, SubscriptionKey};
use renwatch_core::{
    ChannelId, Clock, ErrorClass, OrgId, Region, RenwatchError, Repository, RiotId, UserError,
};
use renwatch_resilience::SlidingWindowLimiter;
use tracing::{debug, error, info, warn};

const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again later.";

/// Text to show the user who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub content: String,
}

impl CommandReply {
    fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// User errors are explained; anything else gets a generic apology.
    pub fn for_error(err: &RenwatchError) -> Self {
        match err {
            RenwatchError::User(user) => Self::new(format!("❌ {user}")),
            _ => Self::new(GENERIC_FAILURE),
        }
    }
}

pub struct CommandService {
    repo: Arc<dyn Repository>,
    cache: Arc<GameStateCache>,
    limiter: Arc<SlidingWindowLimiter>,
    clock: Arc<dyn Clock>,
    max_subscriptions_per_server: u32,
    verbose_user_errors: bool,
}

impl CommandService {
    pub fn new(
        repo: Arc<dyn Repository>,
        cache: Arc<GameStateCache>,
        limiter: Arc<SlidingWindowLimiter>,
        clock: Arc<dyn Clock>,
        max_subscriptions_per_server: u32,
        verbose_user_errors: bool,
    ) -> Self {
        Self {
            repo,
            cache,
            limiter,
            clock,
            max_subscriptions_per_server,
            verbose_user_errors,
        }
    }

    /// Watch `riot_id` in `region` from `channel`.
    pub async fn subscribe(
        &self,
        actor: &str,
        org: &OrgId,
        channel: &ChannelId,
        riot_id: &str,
        region: &str,
    ) -> Result<CommandReply, RenwatchError> {
        let result = self.try_subscribe(actor, org, channel, riot_id, region).await;
        self.observe("subscribe", actor, &result);
        result
    }

    /// Stop watching `riot_id` in `region` from `channel`.
    pub async fn unsubscribe(
        &self,
        actor: &str,
        channel: &ChannelId,
        riot_id: &str,
        region: &str,
    ) -> Result<CommandReply, RenwatchError> {
        let result = self.try_unsubscribe(actor, channel, riot_id, region).await;
        self.observe("unsubscribe", actor, &result);
        result
    }

    /// Subscriptions in `channel`, newest first.
    pub async fn list(
        &self,
        actor: &str,
        channel: &ChannelId,
    ) -> Result<CommandReply, RenwatchError> {
        let result = self.try_list(actor, channel).await;
        self.observe("list", actor, &result);
        result
    }

    async fn try_subscribe(
        &self,
        actor: &str,
        org: &OrgId,
        channel: &ChannelId,
        riot_id: &str,
        region: &str,
    ) -> Result<CommandReply, RenwatchError> {
        self.limiter.check(actor)?;

        let count = self.repo.count_subscriptions_by_org(org).await?;
        if count >= u64::from(self.max_subscriptions_per_server) {
            return Err(UserError::SubscriptionLimit {
                limit: self.max_subscriptions_per_server,
            }
            .into());
        }

        let riot_id = RiotId::parse(riot_id)?;
        let region = Region::parse(region)?;

        let account = match self.cache.get_account(&riot_id, region).await {
            Ok(account) => account,
            Err(e) if e.is_not_found() => {
                return Err(UserError::AccountNotFound {
                    riot_id: riot_id.to_string(),
                    region: region.to_string(),
                }
                .into());
            }
            Err(e) => return Err(e),
        };

        let sub = self
            .repo
            .create_subscription(&NewSubscription {
                org_id: org.clone(),
                channel_id: channel.clone(),
                account: account.riot_id.clone(),
                region,
                created_at: self.clock.now(),
            })
            .await?;

        info!(
            subscription_id = sub.id,
            org_id = %org,
            channel_id = %channel,
            riot_id = %sub.account,
            %region,
            "subscription created"
        );
        Ok(CommandReply::new(format!(
            "✅ Subscribed to **{}** ({region})!",
            sub.account
        )))
    }

    async fn try_unsubscribe(
        &self,
        actor: &str,
        channel: &ChannelId,
        riot_id: &str,
        region: &str,
    ) -> Result<CommandReply, RenwatchError> {
        self.limiter.check(actor)?;
        let riot_id = RiotId::parse(riot_id)?;
        let region = Region::parse(region)?;

        // Stored ids use the upstream capitalization; match what the user typed loosely.
        let stored = self
            .repo
            .list_subscriptions_by_channel(channel)
            .await?
            .into_iter()
            .find(|s| s.region == region && s.account.matches(&riot_id.to_string()));
        let not_subscribed = || UserError::NotSubscribed {
            riot_id: riot_id.to_string(),
            region: region.to_string(),
        };
        let Some(stored) = stored else {
            return Err(not_subscribed().into());
        };

        let deleted = self
            .repo
            .delete_subscription(&SubscriptionKey {
                channel_id: channel.clone(),
                account: stored.account.clone(),
                region,
            })
            .await?;
        if deleted == 0 {
            return Err(not_subscribed().into());
        }

        info!(
            subscription_id = stored.id,
            channel_id = %channel,
            riot_id = %stored.account,
            %region,
            "subscription deleted"
        );
        Ok(CommandReply::new(format!(
            "✅ Unsubscribed from **{}** ({region}).",
            stored.account
        )))
    }

    async fn try_list(
        &self,
        actor: &str,
        channel: &ChannelId,
    ) -> Result<CommandReply, RenwatchError> {
        self.limiter.check(actor)?;
        let mut subs = self.repo.list_subscriptions_by_channel(channel).await?;
        if subs.is_empty() {
            return Ok(CommandReply::new(
                "No subscriptions in this channel. Use `/subscribe name#tag region` to add one!",
            ));
        }
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut content = String::from("**Subscriptions in this channel:**\n");
        for sub in &subs {
            content.push_str(&format!("• {} ({})\n", sub.account, sub.region));
        }
        Ok(CommandReply::new(content))
    }

    fn observe(&self, command: &str, actor: &str, result: &Result<CommandReply, RenwatchError>) {
        let Err(e) = result else { return };
        match e.class() {
            ErrorClass::User if self.verbose_user_errors => {
                warn!(command, actor, error = %e, "command rejected");
            }
            ErrorClass::User => debug!(command, actor, error = %e, "command rejected"),
            _ => error!(command, actor, error = %e, "command failed"),
        }
    }
}
