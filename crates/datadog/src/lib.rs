//! Datadog Dashboard Gateway
//!
//! Thin, stateless client for the three dashboard operations the bot needs:
//! - **list** - dashboard summaries for the picker (capped at 99, the
//!   dropdown's selectable-option ceiling)
//! - **get** - full dashboard payload by id
//! - **create** - submit a modified payload as a new dashboard
//!
//! One call is one request/response; the gateway performs no retries and
//! holds no state beyond the HTTP client itself.

pub mod client;
pub mod error;
pub mod model;

pub use client::{DashboardGateway, HttpDashboardGateway, MAX_PICKER_OPTIONS};
pub use error::GatewayError;
pub use model::{CreatedDashboard, DashboardDetail, DashboardSummary};
