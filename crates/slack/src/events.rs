//! Inbound event model and dispatch.
//!
//! Events are decoded into a closed union once, at the transport boundary;
//! everything after that is exhaustive matching. Each payload carries the
//! complete state its step needs (trigger id, user id, selected option), so
//! no session object exists between callbacks.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::flow::{FlowError, ReplicaFlow};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    SlashCommand(SlashCommandPayload),
    Message(MessageEvent),
    Shortcut(ShortcutPayload),
    ViewSubmission(ViewSubmissionPayload),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::SlashCommand(_) => SlackEventType::SlashCommand,
            Self::Message(_) => SlackEventType::Message,
            Self::Shortcut(_) => SlackEventType::Shortcut,
            Self::ViewSubmission(_) => SlackEventType::ViewSubmission,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    SlashCommand,
    Message,
    Shortcut,
    ViewSubmission,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub trigger_id: String,
    pub user_id: String,
    pub channel_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortcutPayload {
    pub callback_id: String,
    pub trigger_id: String,
    pub user_id: String,
}

/// The option the user picked in the selection dialog, as echoed back by the
/// view submission. Absent when the submission payload is malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedOption {
    pub value: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmissionPayload {
    pub view_callback_id: String,
    pub user_id: String,
    pub selected: Option<SelectedOption>,
}

/// Everything the clone step needs, re-derived from the submission payload
/// alone (no state is carried over from the picker step).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionState {
    pub dashboard_id: String,
    pub dashboard_title: String,
    pub user_id: String,
}

impl SelectionState {
    pub fn from_submission(
        payload: &ViewSubmissionPayload,
    ) -> Result<Self, EventHandlerError> {
        let selected = payload.selected.as_ref().ok_or_else(|| {
            EventHandlerError::MalformedEvent("view submission has no selected option".to_string())
        })?;

        Ok(Self {
            dashboard_id: selected.value.clone(),
            dashboard_title: selected.title.clone(),
            user_id: payload.user_id.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    Ignored,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("event payload missing expected field: {0}")]
    MalformedEvent(String),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

impl EventHandlerError {
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Flow(error) => Some(error.operation()),
            Self::MalformedEvent(_) => None,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

impl DispatchError {
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Handler(error) => error.operation(),
        }
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            debug!(
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                "no handler registered; ignoring event"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Wires all four replica handlers against one flow instance.
pub fn replica_dispatcher(
    flow: Arc<ReplicaFlow>,
    slash_command: impl Into<String>,
    shortcut_callback_id: impl Into<String>,
    view_callback_id: impl Into<String>,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler { flow: flow.clone(), command: slash_command.into() });
    dispatcher.register(MessageHandler { flow: flow.clone() });
    dispatcher
        .register(ShortcutHandler { flow: flow.clone(), callback_id: shortcut_callback_id.into() });
    dispatcher.register(ViewSubmissionHandler { flow, callback_id: view_callback_id.into() });
    dispatcher
}

pub struct SlashCommandHandler {
    flow: Arc<ReplicaFlow>,
    command: String,
}

#[async_trait]
impl EventHandler for SlashCommandHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if payload.command != self.command {
            debug!(command = %payload.command, "unrecognized slash command; ignoring");
            return Ok(HandlerResult::Ignored);
        }

        self.flow.open_picker(&payload.trigger_id).await?;
        Ok(HandlerResult::Processed)
    }
}

pub struct MessageHandler {
    flow: Arc<ReplicaFlow>,
}

#[async_trait]
impl EventHandler for MessageHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let replied = self.flow.greet(event).await?;
        Ok(if replied { HandlerResult::Processed } else { HandlerResult::Ignored })
    }
}

pub struct ShortcutHandler {
    flow: Arc<ReplicaFlow>,
    callback_id: String,
}

#[async_trait]
impl EventHandler for ShortcutHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Shortcut
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Shortcut(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if payload.callback_id != self.callback_id {
            debug!(callback_id = %payload.callback_id, "unrecognized shortcut; ignoring");
            return Ok(HandlerResult::Ignored);
        }

        self.flow.open_picker(&payload.trigger_id).await?;
        Ok(HandlerResult::Processed)
    }
}

pub struct ViewSubmissionHandler {
    flow: Arc<ReplicaFlow>,
    callback_id: String,
}

#[async_trait]
impl EventHandler for ViewSubmissionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ViewSubmission
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ViewSubmission(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if payload.view_callback_id != self.callback_id {
            debug!(callback_id = %payload.view_callback_id, "unrecognized view; ignoring");
            return Ok(HandlerResult::Ignored);
        }

        let selection = SelectionState::from_submission(payload)?;
        self.flow.clone_selected(&selection).await?;
        Ok(HandlerResult::Processed)
    }
}
