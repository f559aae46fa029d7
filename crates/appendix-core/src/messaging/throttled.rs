use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChannelMessage, ChannelRef, FormattingEntity, MessageId},
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, ParsedMarkup},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* provider API calls.
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per channel.
    pub per_channel_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        // A floor under the operator-chosen inter-edit delay, not a replacement
        // for it.
        Self {
            global_min_interval: Duration::from_millis(40),
            per_channel_min_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that rate-limits outbound calls.
///
/// Best-effort defense against flood errors on edit-heavy runs. It does not
/// guarantee zero flood waits, but it keeps call spacing sane even when the
/// operator picks an aggressive delay.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_channel: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_channel: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_channel(&self, channel_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_channel.lock().await;
        map.entry(channel_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_channel_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_channel(&self, channel_id: i64) {
        let global_wait = { self.global.lock().await.reserve() };
        let channel_wait = {
            let lim = self.limiter_for_channel(channel_id).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = if global_wait > channel_wait {
            global_wait
        } else {
            channel_wait
        };
        if wait > Duration::from_millis(0) {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if wait > Duration::from_millis(0) {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn resolve_channel(&self, handle: &str) -> Result<ChannelRef> {
        self.throttle_global().await;
        self.inner.resolve_channel(handle).await
    }

    async fn fetch_history(
        &self,
        channel: &ChannelRef,
        offset_id: MessageId,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>> {
        self.throttle_channel(channel.id.0).await;
        self.inner.fetch_history(channel, offset_id, limit).await
    }

    async fn edit_message(
        &self,
        channel: &ChannelRef,
        id: MessageId,
        text: &str,
        entities: &[FormattingEntity],
    ) -> Result<()> {
        self.throttle_channel(channel.id.0).await;
        self.inner.edit_message(channel, id, text, entities).await
    }

    fn parse_markup(&self, text: &str) -> Result<ParsedMarkup> {
        // Local computation; no throttling needed.
        self.inner.parse_markup(text)
    }
}
