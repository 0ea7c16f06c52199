use super::backoff::BackoffDelayer;
use crate::config::RetryPolicy;
use async_trait::async_trait;
use callwire_core::{
    ChannelError, RoomId, SignalChannel, SignalMessage, Subscription, SubscriptionId,
};
use std::sync::Arc;
use tracing::warn;

/// Retries transient publish failures with exponential backoff.
///
/// Replay, subscribe and unsubscribe pass straight through.
pub struct RetryingChannel {
    inner: Arc<dyn SignalChannel>,
    policy: RetryPolicy,
}

impl RetryingChannel {
    pub fn new(inner: Arc<dyn SignalChannel>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl SignalChannel for RetryingChannel {
    async fn publish(&self, message: SignalMessage) -> Result<u64, ChannelError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delayer = BackoffDelayer::from_policy(&self.policy);
        let mut attempt = 1;

        loop {
            match self.inner.publish(message.clone()).await {
                Ok(seq) => return Ok(seq),
                Err(e) if e.is_permanent() || attempt >= max_attempts => return Err(e),
                Err(e) => {
                    warn!(
                        "Publishing {} failed (attempt {}/{}): {}",
                        message.kind(),
                        attempt,
                        max_attempts,
                        e
                    );
                    delayer.delay().await;
                    attempt += 1;
                }
            }
        }
    }

    async fn replay(&self, room_id: &RoomId) -> Result<Vec<SignalMessage>, ChannelError> {
        self.inner.replay(room_id).await
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<Subscription, ChannelError> {
        self.inner.subscribe(room_id).await
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), ChannelError> {
        self.inner.unsubscribe(subscription).await
    }
}
