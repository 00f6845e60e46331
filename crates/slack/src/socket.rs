//! Socket Mode consumer loop.
//!
//! A single sequential consumer owns the transport session: one envelope is
//! fully handled before the next is dequeued. Every envelope is acknowledged
//! immediately on receipt, before any business logic, and the acknowledgment
//! is never conditioned on downstream success. Redelivered envelope ids seen
//! within a bounded recent window are dropped after the ack so one submission
//! cannot clone twice.

use std::collections::{HashSet, VecDeque};
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::events::{EventContext, EventDispatcher, SlackEnvelope, SlackEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopSocketTransport;

#[async_trait]
impl SocketTransport for NoopSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Bounded memory of recently acknowledged envelope ids. This is a transport
/// redelivery guard, not business state: it never crosses the process
/// boundary and losing it on restart only re-admits duplicates the platform
/// should not be sending anyway.
struct RecentEnvelopes {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentEnvelopes {
    fn new(capacity: usize) -> Self {
        Self { capacity, order: VecDeque::with_capacity(capacity), seen: HashSet::new() }
    }

    /// Records the id; returns `false` when it was already present.
    fn insert(&mut self, envelope_id: &str) -> bool {
        if self.seen.contains(envelope_id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        self.order.push_back(envelope_id.to_owned());
        self.seen.insert(envelope_id.to_owned());
        true
    }
}

const RECENT_ENVELOPE_WINDOW: usize = 128;

pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
    recent: Mutex<RecentEnvelopes>,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            reconnect_policy,
            recent: Mutex::new(RecentEnvelopes::new(RECENT_ENVELOPE_WINDOW)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "socket mode retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening socket mode transport connection");
        self.transport.connect().await?;
        info!(attempt, "socket mode transport connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "socket mode transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };
            let (trigger_id, user_id) = correlation_fields(&envelope);

            info!(
                event_name = "ingress.slack.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                trigger_id = trigger_id.as_deref().unwrap_or("unknown"),
                user_id = user_id.as_deref().unwrap_or("unknown"),
                "received slack envelope"
            );

            // Ack before any business logic; liveness is independent of
            // whether the downstream work succeeds.
            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge slack envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    "acknowledged slack envelope"
                );
            }

            if !self.recent.lock().await.insert(&envelope.envelope_id) {
                info!(
                    event_name = "ingress.slack.duplicate_dropped",
                    envelope_id = %envelope.envelope_id,
                    "redelivered envelope dropped after ack"
                );
                continue;
            }

            let context = EventContext { correlation_id: envelope.envelope_id.clone() };
            if let Err(error) = self.dispatcher.dispatch(&envelope, &context).await {
                warn!(
                    envelope_id = %envelope.envelope_id,
                    event_type = ?envelope.event.event_type(),
                    trigger_id = trigger_id.as_deref().unwrap_or("unknown"),
                    user_id = user_id.as_deref().unwrap_or("unknown"),
                    operation = error.operation().unwrap_or("dispatch"),
                    error = %error,
                    "event dispatch failed; continuing socket loop"
                );
            }
        }
    }
}

fn correlation_fields(envelope: &SlackEnvelope) -> (Option<String>, Option<String>) {
    match &envelope.event {
        SlackEvent::SlashCommand(payload) => {
            (Some(payload.trigger_id.clone()), Some(payload.user_id.clone()))
        }
        SlackEvent::Shortcut(payload) => {
            (Some(payload.trigger_id.clone()), Some(payload.user_id.clone()))
        }
        SlackEvent::ViewSubmission(payload) => (None, Some(payload.user_id.clone())),
        SlackEvent::Message(event) => (None, Some(event.user_id.clone())),
        SlackEvent::Unsupported { .. } => (None, None),
    }
}
