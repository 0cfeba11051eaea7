// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock message server for deterministic testing.
//!
//! Every successful `send()` is recorded with the id it returned, so tests
//! can pair deliveries with ledger rows. Sends can be made to fail, or to
//! stall until released, to exercise the worker pool's failure paths.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use renwatch_core::{
    AdapterType, ChannelId, HealthStatus, MessageId, MessageServer, Notification, PluginAdapter,
    RenwatchError,
};
use tokio::sync::{Mutex, watch};

/// A notification the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub notification: Notification,
}

/// A reply the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub content: String,
}

pub struct MockMessageServer {
    sent: Mutex<Vec<SentMessage>>,
    replies: Mutex<Vec<SentReply>>,
    failing: AtomicBool,
    stalled: watch::Sender<bool>,
}

impl MockMessageServer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            stalled: watch::Sender::new(false),
        }
    }

    /// Make every send fail with a delivery error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hold every send until [`resume`](Self::resume) is called.
    pub fn stall(&self) {
        self.stalled.send_replace(true);
    }

    pub fn resume(&self) {
        self.stalled.send_replace(false);
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn replies(&self) -> Vec<SentReply> {
        self.replies.lock().await.clone()
    }
}

impl Default for MockMessageServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockMessageServer {
    fn name(&self) -> &str {
        "mock-message-server"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MessageServer
    }

    async fn health_check(&self) -> Result<HealthStatus, RenwatchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RenwatchError> {
        Ok(())
    }
}

#[async_trait]
impl MessageServer for MockMessageServer {
    async fn send(
        &self,
        channel_id: &ChannelId,
        notification: &Notification,
    ) -> Result<MessageId, RenwatchError> {
        let mut stalled = self.stalled.subscribe();
        loop {
            let is_stalled = *stalled.borrow_and_update();
            if !is_stalled || stalled.changed().await.is_err() {
                break;
            }
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(RenwatchError::Delivery {
                message: "mock send failed".into(),
                source: None,
            });
        }

        let message_id = MessageId(uuid::Uuid::new_v4().to_string());
        self.sent.lock().await.push(SentMessage {
            channel_id: channel_id.clone(),
            message_id: message_id.clone(),
            notification: notification.clone(),
        });
        Ok(message_id)
    }

    async fn reply_to(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), RenwatchError> {
        self.replies.lock().await.push(SentReply {
            channel_id: channel_id.clone(),
            message_id: message_id.clone(),
            content: content.to_string(),
        });
        Ok(())
    }
}
