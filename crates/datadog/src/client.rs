use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use replica_core::config::DatadogConfig;

use crate::error::GatewayError;
use crate::model::{CreatedDashboard, DashboardDetail, DashboardSummary};

/// Hard ceiling imposed by the picker UI (a static select accepts at most
/// 100 options), not by the Datadog API.
pub const MAX_PICKER_OPTIONS: usize = 99;

#[async_trait]
pub trait DashboardGateway: Send + Sync {
    /// Ordered dashboard summaries, scoped to non-shared dashboards and
    /// capped at [`MAX_PICKER_OPTIONS`] entries.
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>, GatewayError>;

    async fn get_dashboard(&self, id: &str) -> Result<DashboardDetail, GatewayError>;

    async fn create_dashboard(
        &self,
        detail: &DashboardDetail,
    ) -> Result<CreatedDashboard, GatewayError>;
}

pub struct HttpDashboardGateway {
    client: Client,
    api_base: String,
    app_base_url: String,
    api_key: SecretString,
    app_key: SecretString,
}

impl HttpDashboardGateway {
    pub fn new(config: &DatadogConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: format!("https://{}", config.site),
            app_base_url: config.app_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            app_key: config.app_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.api_base))
            .header("DD-API-KEY", self.api_key.expose_secret())
            .header("DD-APPLICATION-KEY", self.app_key.expose_secret())
    }

    fn replica_url(&self, id: &str) -> String {
        format!("{}/dashboard/{id}", self.app_base_url)
    }
}

#[async_trait]
impl DashboardGateway for HttpDashboardGateway {
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>, GatewayError> {
        let response = self
            .request(reqwest::Method::GET, "/api/v1/dashboard")
            .query(&[("filter[shared]", "false")])
            .send()
            .await
            .map_err(|error| transport_error("list_dashboards", &error))?;

        let response = check_status("list_dashboards", response).await?;
        let body: ListDashboardsResponse = response
            .json()
            .await
            .map_err(|error| transport_error("list_dashboards", &error))?;

        let dashboards = cap_for_picker(body.dashboards);
        debug!(count = dashboards.len(), "listed dashboards");
        Ok(dashboards)
    }

    async fn get_dashboard(&self, id: &str) -> Result<DashboardDetail, GatewayError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/api/v1/dashboard/{id}"))
            .send()
            .await
            .map_err(|error| transport_error("get_dashboard", &error))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound { id: id.to_string() });
        }

        let response = check_status("get_dashboard", response).await?;
        let payload = response
            .json()
            .await
            .map_err(|error| transport_error("get_dashboard", &error))?;

        Ok(DashboardDetail::new(payload))
    }

    async fn create_dashboard(
        &self,
        detail: &DashboardDetail,
    ) -> Result<CreatedDashboard, GatewayError> {
        let response = self
            .request(reqwest::Method::POST, "/api/v1/dashboard")
            .json(detail.as_json())
            .send()
            .await
            .map_err(|error| transport_error("create_dashboard", &error))?;

        let response = check_status("create_dashboard", response).await?;
        let body: CreateDashboardResponse = response
            .json()
            .await
            .map_err(|error| transport_error("create_dashboard", &error))?;

        Ok(CreatedDashboard { url: self.replica_url(&body.id), id: body.id })
    }
}

fn cap_for_picker(mut dashboards: Vec<DashboardSummary>) -> Vec<DashboardSummary> {
    dashboards.truncate(MAX_PICKER_OPTIONS);
    dashboards
}

fn transport_error(operation: &'static str, error: &dyn std::fmt::Display) -> GatewayError {
    GatewayError::RemoteUnavailable { operation, message: error.to_string() }
}

async fn check_status(operation: &'static str, response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(map_status(operation, status, message))
}

fn map_status(operation: &'static str, status: StatusCode, message: String) -> GatewayError {
    let message = if message.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {message}")
    };

    // Auth failures read as "provider unreachable" to the caller; only a
    // well-formed rejection of the request itself is RemoteRejected.
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return GatewayError::RemoteUnavailable { operation, message };
    }
    if status.is_client_error() {
        return GatewayError::RemoteRejected { operation, message };
    }

    GatewayError::RemoteUnavailable { operation, message }
}

#[derive(Debug, Deserialize)]
struct ListDashboardsResponse {
    #[serde(default)]
    dashboards: Vec<DashboardSummary>,
}

#[derive(Debug, Deserialize)]
struct CreateDashboardResponse {
    id: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::StatusCode;

    use replica_core::config::DatadogConfig;

    use super::{
        cap_for_picker, map_status, DashboardGateway, HttpDashboardGateway,
        ListDashboardsResponse, MAX_PICKER_OPTIONS,
    };
    use crate::error::GatewayError;
    use crate::model::DashboardSummary;

    fn summaries(count: usize) -> Vec<DashboardSummary> {
        (0..count)
            .map(|index| DashboardSummary {
                id: format!("dash-{index}"),
                title: format!("Dashboard {index}"),
            })
            .collect()
    }

    #[test]
    fn listing_never_exceeds_the_picker_ceiling() {
        assert_eq!(cap_for_picker(summaries(150)).len(), MAX_PICKER_OPTIONS);
        assert_eq!(cap_for_picker(summaries(99)).len(), 99);
        assert_eq!(cap_for_picker(summaries(3)).len(), 3);
        assert!(cap_for_picker(summaries(0)).is_empty());
    }

    #[test]
    fn cap_preserves_provider_order() {
        let capped = cap_for_picker(summaries(120));
        assert_eq!(capped.first().map(|entry| entry.id.as_str()), Some("dash-0"));
        assert_eq!(capped.last().map(|entry| entry.id.as_str()), Some("dash-98"));
    }

    #[test]
    fn list_response_parses_id_and_title() {
        let body: ListDashboardsResponse = serde_json::from_str(
            r#"{"dashboards": [{"id": "abc-123", "title": "Prod Overview", "is_shared": false}]}"#,
        )
        .expect("response should parse");

        assert_eq!(
            body.dashboards,
            vec![DashboardSummary { id: "abc-123".to_string(), title: "Prod Overview".to_string() }]
        );
    }

    #[test]
    fn list_response_tolerates_missing_dashboards_field() {
        let body: ListDashboardsResponse =
            serde_json::from_str("{}").expect("response should parse");
        assert!(body.dashboards.is_empty());
    }

    #[test]
    fn auth_failures_map_to_remote_unavailable() {
        let error = map_status("list_dashboards", StatusCode::FORBIDDEN, String::new());
        assert!(matches!(error, GatewayError::RemoteUnavailable { operation: "list_dashboards", .. }));
    }

    #[test]
    fn invalid_payload_maps_to_remote_rejected() {
        let error = map_status(
            "create_dashboard",
            StatusCode::BAD_REQUEST,
            "invalid title".to_string(),
        );
        assert!(matches!(
            error,
            GatewayError::RemoteRejected { operation: "create_dashboard", ref message }
                if message.contains("invalid title")
        ));
    }

    #[test]
    fn server_errors_map_to_remote_unavailable() {
        let error = map_status("get_dashboard", StatusCode::BAD_GATEWAY, String::new());
        assert!(matches!(error, GatewayError::RemoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn unreachable_provider_maps_to_remote_unavailable() {
        // Nothing listens on the discard port, so the request fails at the
        // transport layer without touching the network.
        let config = DatadogConfig {
            api_key: "k".to_string().into(),
            app_key: "k".to_string().into(),
            site: "127.0.0.1:9".to_string(),
            app_base_url: "https://app.datadoghq.eu".to_string(),
            timeout_secs: 2,
        };
        let gateway: Arc<dyn DashboardGateway> =
            Arc::new(HttpDashboardGateway::new(&config).expect("client should build"));

        let error = gateway.get_dashboard("dash-1").await.err().expect("request should fail");
        assert!(matches!(
            error,
            GatewayError::RemoteUnavailable { operation: "get_dashboard", .. }
        ));
        assert_eq!(error.operation(), "get_dashboard");
    }
}
