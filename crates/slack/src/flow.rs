//! The replica interaction itself: open the dashboard picker, clone the
//! selected dashboard, post the shareable link, and greet by keyword.
//!
//! The flow is stateless across events: every method takes everything it
//! needs from the event payload that triggered it. Nothing is remembered
//! between the picker opening and the submission arriving.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use replica_core::namegen::ReplicaNamer;
use replica_datadog::{DashboardGateway, GatewayError};

use crate::blocks::{self, SelectOption};
use crate::chat::{ChatApi, ChatApiError};
use crate::events::{MessageEvent, SelectionState};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Chat(#[from] ChatApiError),
}

impl FlowError {
    /// Identity of the outbound call that failed, for structured logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Gateway(error) => error.operation(),
            Self::Chat(error) => error.operation(),
        }
    }
}

/// Per-process flow wiring that is not derivable from any single event.
#[derive(Clone, Debug)]
pub struct FlowSettings {
    /// Bot's own user id; messages it authored never trigger a greeting.
    pub self_user_id: String,
    pub notify_channel_id: String,
    pub view_callback_id: String,
    pub greeting_keyword: String,
    pub review_url: String,
}

pub struct ReplicaFlow {
    gateway: Arc<dyn DashboardGateway>,
    chat: Arc<dyn ChatApi>,
    namer: ReplicaNamer,
    settings: FlowSettings,
}

impl ReplicaFlow {
    pub fn new(
        gateway: Arc<dyn DashboardGateway>,
        chat: Arc<dyn ChatApi>,
        namer: ReplicaNamer,
        settings: FlowSettings,
    ) -> Self {
        Self { gateway, chat, namer, settings }
    }

    /// List dashboards and open the selection dialog against the invoking
    /// interaction's trigger id. The gateway caps the listing at the
    /// dropdown's option ceiling.
    pub async fn open_picker(&self, trigger_id: &str) -> Result<(), FlowError> {
        let dashboards = self.gateway.list_dashboards().await?;
        let options = dashboards
            .into_iter()
            .map(|dashboard| SelectOption::new(dashboard.id, dashboard.title))
            .collect::<Vec<_>>();
        let option_count = options.len();

        let modal = blocks::dashboard_picker_modal(&self.settings.view_callback_id, options);
        self.chat.open_view(trigger_id, &modal).await?;

        info!(
            event_name = "flow.picker.opened",
            correlation_id = %trigger_id,
            options = option_count,
            "opened dashboard picker"
        );
        Ok(())
    }

    /// Clone the selected dashboard under a generated name and post the
    /// result notification to the configured channel.
    pub async fn clone_selected(&self, selection: &SelectionState) -> Result<(), FlowError> {
        let replica_name = self.namer.generate();

        let mut detail = self.gateway.get_dashboard(&selection.dashboard_id).await?;
        detail.set_title(replica_name.as_str());
        let replica = self.gateway.create_dashboard(&detail).await?;

        info!(
            event_name = "flow.replica.created",
            dashboard_id = %selection.dashboard_id,
            replica_id = %replica.id,
            replica_name = %replica_name,
            "created replica dashboard"
        );

        let message = blocks::replica_ready_message(
            &selection.dashboard_title,
            &selection.user_id,
            &replica_name,
            &replica.url,
            &self.settings.review_url,
        );
        self.chat.post_message(&self.settings.notify_channel_id, &message).await?;

        info!(
            event_name = "flow.replica.notified",
            channel_id = %self.settings.notify_channel_id,
            replica_id = %replica.id,
            "posted replica notification"
        );
        Ok(())
    }

    /// Reply to greeting-keyword messages from anyone but the bot itself.
    /// Returns whether a reply was posted.
    pub async fn greet(&self, event: &MessageEvent) -> Result<bool, FlowError> {
        if event.user_id == self.settings.self_user_id {
            return Ok(false);
        }
        let keyword = self.settings.greeting_keyword.to_lowercase();
        if !event.text.to_lowercase().contains(&keyword) {
            return Ok(false);
        }

        let message = blocks::greeting_message(&event.user_id);
        self.chat.post_message(&event.channel_id, &message).await?;
        Ok(true)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use replica_datadog::GatewayError;

    use super::test_support::{fixed_namer, settings, RecordingChat, StubGateway};
    use super::{FlowError, ReplicaFlow};
    use crate::blocks::{Block, InputElement, TextObject};
    use crate::chat::ChatApiError;
    use crate::events::{MessageEvent, SelectionState};

    fn flow_with(gateway: StubGateway, chat: Arc<RecordingChat>) -> ReplicaFlow {
        ReplicaFlow::new(Arc::new(gateway), chat, fixed_namer(), settings())
    }

    #[tokio::test]
    async fn open_picker_opens_one_dialog_with_the_trigger_token() {
        let chat = Arc::new(RecordingChat::default());
        let flow = flow_with(StubGateway::with_summaries(5), chat.clone());

        flow.open_picker("T1").await.expect("picker should open");

        let opened = chat.opened_views.lock().expect("lock poisoned");
        assert_eq!(opened.len(), 1);
        let (trigger_id, modal) = &opened[0];
        assert_eq!(trigger_id, "T1");

        let select = modal
            .blocks
            .iter()
            .find_map(|block| match block {
                Block::Input { element: InputElement::StaticSelect(select), .. } => Some(select),
                _ => None,
            })
            .expect("expected select element");
        assert_eq!(select.options.len(), 5);
        assert_eq!(select.options[0].value, "dash-0");
    }

    #[tokio::test]
    async fn clone_selected_fetches_creates_and_notifies() {
        let chat = Arc::new(RecordingChat::default());
        let gateway = StubGateway::with_summaries(1);
        let flow = flow_with(gateway, chat.clone());
        let selection = SelectionState {
            dashboard_id: "D1".to_string(),
            dashboard_title: "Prod Overview".to_string(),
            user_id: "U1".to_string(),
        };

        flow.clone_selected(&selection).await.expect("clone should succeed");

        let posted = chat.posted.lock().expect("lock poisoned");
        assert_eq!(posted.len(), 1);
        let (channel, message) = &posted[0];
        assert_eq!(channel, "CNOTIFY");
        assert!(message.fallback_text.contains("happy-run"));

        let mention = match &message.blocks[0] {
            Block::Section { text: TextObject::Mrkdwn { text }, .. } => text,
            other => panic!("expected section, got {other:?}"),
        };
        assert!(mention.contains("Prod Overview"));
        assert!(mention.contains("<@U1>"));

        let actions = match &message.blocks[2] {
            Block::Actions { elements, .. } => elements,
            other => panic!("expected actions, got {other:?}"),
        };
        assert_eq!(
            actions[0].url.as_deref(),
            Some("https://app.datadoghq.eu/dashboard/replica-1")
        );
    }

    #[tokio::test]
    async fn clone_selected_records_one_get_and_one_create() {
        let chat = Arc::new(RecordingChat::default());
        let gateway = Arc::new(StubGateway::with_summaries(1));
        let flow =
            ReplicaFlow::new(gateway.clone(), chat.clone(), fixed_namer(), settings());
        let selection = SelectionState {
            dashboard_id: "D1".to_string(),
            dashboard_title: "Prod Overview".to_string(),
            user_id: "U1".to_string(),
        };

        flow.clone_selected(&selection).await.expect("clone should succeed");

        assert_eq!(*gateway.get_calls.lock().expect("lock poisoned"), vec!["D1".to_string()]);
        let creates = gateway.create_calls.lock().expect("lock poisoned");
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].title(), Some("happy-run"));
    }

    #[tokio::test]
    async fn clone_selected_surfaces_gateway_failure_without_posting() {
        let chat = Arc::new(RecordingChat::default());
        let mut gateway = StubGateway::with_summaries(1);
        gateway.fail_get = Some(GatewayError::RemoteUnavailable {
            operation: "get_dashboard",
            message: "connect timeout".to_string(),
        });
        let flow = flow_with(gateway, chat.clone());
        let selection = SelectionState {
            dashboard_id: "D1".to_string(),
            dashboard_title: "Prod Overview".to_string(),
            user_id: "U1".to_string(),
        };

        let result = flow.clone_selected(&selection).await;

        assert!(matches!(result, Err(FlowError::Gateway(GatewayError::RemoteUnavailable { .. }))));
        assert!(chat.posted.lock().expect("lock poisoned").is_empty());
    }

    #[test]
    fn flow_error_names_the_failing_outbound_call() {
        let gateway_error = FlowError::Gateway(GatewayError::RemoteUnavailable {
            operation: "get_dashboard",
            message: "connect timeout".to_string(),
        });
        assert_eq!(gateway_error.operation(), "get_dashboard");

        let chat_error = FlowError::Chat(ChatApiError::PlatformRejected {
            operation: "chat.postMessage",
            error: "invalid_auth".to_string(),
        });
        assert_eq!(chat_error.operation(), "chat.postMessage");
    }

    #[tokio::test]
    async fn greet_replies_case_insensitively_in_the_source_channel() {
        let chat = Arc::new(RecordingChat::default());
        let flow = flow_with(StubGateway::with_summaries(0), chat.clone());

        let replied = flow
            .greet(&MessageEvent {
                channel_id: "C7".to_string(),
                user_id: "U9".to_string(),
                text: "well HELLO there".to_string(),
            })
            .await
            .expect("greet should succeed");

        assert!(replied);
        let posted = chat.posted.lock().expect("lock poisoned");
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, "C7");
        assert!(posted[0].1.fallback_text.contains("<@U9>"));
    }

    #[tokio::test]
    async fn greet_ignores_the_bots_own_messages() {
        let chat = Arc::new(RecordingChat::default());
        let flow = flow_with(StubGateway::with_summaries(0), chat.clone());

        let replied = flow
            .greet(&MessageEvent {
                channel_id: "C7".to_string(),
                user_id: "UBOT".to_string(),
                text: "hello hello".to_string(),
            })
            .await
            .expect("greet should succeed");

        assert!(!replied);
        assert!(chat.posted.lock().expect("lock poisoned").is_empty());
    }

    #[tokio::test]
    async fn greet_ignores_messages_without_the_keyword() {
        let chat = Arc::new(RecordingChat::default());
        let flow = flow_with(StubGateway::with_summaries(0), chat.clone());

        let replied = flow
            .greet(&MessageEvent {
                channel_id: "C7".to_string(),
                user_id: "U9".to_string(),
                text: "deploy finished".to_string(),
            })
            .await
            .expect("greet should succeed");

        assert!(!replied);
        assert!(chat.posted.lock().expect("lock poisoned").is_empty());
    }
}
