//! Slack Integration - Socket Mode bot interface
//!
//! This crate provides the Slack side of the replica bot:
//! - **Socket Mode** (`socket`) - acknowledged event consumption over a
//!   single ordered channel (no public URL needed)
//! - **Events** (`events`) - the closed event union and per-type handlers
//! - **Flow** (`flow`) - the replica interaction itself (pick → clone → notify)
//! - **Block Kit** (`blocks`) - modal and message builders
//! - **Chat API** (`chat`) - outbound `views.open` / `chat.postMessage` calls
//!
//! # Architecture
//!
//! ```text
//! Socket Mode → ack → EventDispatcher → Handlers → ReplicaFlow
//!                                                    ↓        ↓
//!                                          Datadog Gateway  Chat API
//! ```
//!
//! Every envelope is acknowledged exactly once, immediately on receipt and
//! before any business logic runs. Handler failures are logged and never
//! abort the consumer loop.

pub mod blocks;
pub mod chat;
pub mod events;
pub mod flow;
pub mod socket;
