//! Health check endpoints.
//!
//! - `/health/live` - the process is up
//! - `/health/ready` - the relay has what it needs to forward requests

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::relay::RelayState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Client id and secret are configured
    pub credentials: bool,
    /// Token and queue endpoints are http(s) URLs
    pub endpoints: bool,
}

/// Liveness probe.
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe.
///
/// Does not contact the upstream services.
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<RelayState>) -> (StatusCode, Json<HealthStatus>) {
    let config = state.config();
    let credentials = config.has_credentials();
    let endpoints = [&config.token_url, &config.queue_url]
        .iter()
        .all(|url| matches!(url.scheme(), "http" | "https"));

    let all_ok = credentials && endpoints;
    let status = HealthStatus {
        status: if all_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            credentials,
            endpoints,
        },
    };

    let code = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayConfig;
    use url::Url;

    fn state(client_secret: &str) -> RelayState {
        RelayState::new(RelayConfig {
            token_url: Url::parse("https://cloud.example/identity/connect/token").expect("url"),
            client_id: "client".into(),
            client_secret: client_secret.into(),
            scope: None,
            queue_url: Url::parse("https://cloud.example/odata/queue").expect("url"),
            organization_unit_id: None,
        })
    }

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy",
            version: "0.1.0",
            checks: HealthChecks {
                credentials: true,
                endpoints: true,
            },
        };

        let json = serde_json::to_string(&status).expect("should serialize");
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
        assert!(json.contains("credentials"));
        assert!(json.contains("endpoints"));
    }

    #[tokio::test]
    async fn test_readiness_with_credentials() {
        let (code, Json(status)) = readiness(State(state("secret"))).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(status.status, "healthy");
    }

    #[tokio::test]
    async fn test_readiness_without_secret() {
        let (code, Json(status)) = readiness(State(state(""))).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!status.checks.credentials);
    }

    #[tokio::test]
    async fn test_liveness() {
        assert_eq!(liveness().await, StatusCode::OK);
    }
}
