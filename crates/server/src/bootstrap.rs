use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use replica_core::config::{AppConfig, ConfigError, LoadOptions};
use replica_core::namegen::ReplicaNamer;
use replica_datadog::HttpDashboardGateway;
use replica_slack::chat::{ChatApi, ChatApiError, HttpChatApi};
use replica_slack::events::replica_dispatcher;
use replica_slack::flow::{FlowSettings, ReplicaFlow};
use replica_slack::socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner};

pub struct Application {
    pub config: AppConfig,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("slack bot token rejected: {0}")]
    ChatAuth(#[source] ChatApiError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let gateway =
        Arc::new(HttpDashboardGateway::new(&config.datadog).map_err(BootstrapError::HttpClient)?);
    let chat: Arc<dyn ChatApi> =
        Arc::new(HttpChatApi::new(&config.slack).map_err(BootstrapError::HttpClient)?);

    // Resolve the bot's own identity up front; an invalid bot token is a
    // startup failure, not something to discover mid-stream.
    let identity = chat.auth_identity().await.map_err(BootstrapError::ChatAuth)?;
    info!(
        event_name = "system.bootstrap.identity_resolved",
        correlation_id = "bootstrap",
        bot_user_id = %identity.user_id,
        "slack bot identity resolved"
    );

    let flow = Arc::new(ReplicaFlow::new(
        gateway,
        chat,
        ReplicaNamer::default(),
        FlowSettings {
            self_user_id: identity.user_id,
            notify_channel_id: config.slack.notify_channel_id.clone(),
            view_callback_id: config.bot.view_callback_id.clone(),
            greeting_keyword: config.bot.greeting_keyword.clone(),
            review_url: config.bot.review_url.clone(),
        },
    ));

    let dispatcher = replica_dispatcher(
        flow,
        config.bot.slash_command.clone(),
        config.bot.shortcut_callback_id.clone(),
        config.bot.view_callback_id.clone(),
    );

    let slack_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        dispatcher,
        ReconnectPolicy::default(),
    );

    Ok(Application { config, slack_runner })
}
