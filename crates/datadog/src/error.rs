use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("dashboard provider unavailable during {operation}: {message}")]
    RemoteUnavailable { operation: &'static str, message: String },
    #[error("dashboard `{id}` not found")]
    NotFound { id: String },
    #[error("dashboard provider rejected {operation}: {message}")]
    RemoteRejected { operation: &'static str, message: String },
}

impl GatewayError {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable { operation, .. } | Self::RemoteRejected { operation, .. } => {
                operation
            }
            Self::NotFound { .. } => "get_dashboard",
        }
    }
}
