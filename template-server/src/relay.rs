//! Local relay between the editor and the queueing API.
//!
//! Each `POST /proxy-post-api` call does two hops:
//! 1. exchange client credentials for a bearer token at the identity endpoint;
//! 2. forward the request body verbatim to the queue endpoint with that token.
//!
//! The queue's status and body are passed straight back. A failure on either
//! hop becomes a `500` with `{ "message", "error" }`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Header carrying the tenant folder on queue requests.
pub const ORGANIZATION_UNIT_HEADER: &str = "X-UIPATH-OrganizationUnitId";

/// Where the relay gets tokens and where it forwards to.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Identity endpoint for the client-credentials exchange.
    pub token_url: Url,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Optional space-separated scopes.
    pub scope: Option<String>,
    /// Queue endpoint the body is forwarded to.
    pub queue_url: Url,
    /// Optional organization unit sent as [`ORGANIZATION_UNIT_HEADER`].
    pub organization_unit_id: Option<String>,
}

impl RelayConfig {
    /// Whether client credentials are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Errors on either relay hop.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The token request could not be sent or read.
    #[error("token request failed: {0}")]
    TokenRequest(#[source] reqwest::Error),
    /// The identity endpoint refused the credentials.
    #[error("token endpoint returned {status}: {body}")]
    TokenRejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// The token response had no `access_token`.
    #[error("token response did not contain an access_token")]
    MissingToken,
    /// Forwarding to the queue endpoint failed.
    #[error("queue request failed: {0}")]
    Forward(#[source] reqwest::Error),
}

/// Error body returned on relay failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayErrorBody {
    /// Fixed summary.
    pub message: String,
    /// Underlying error text.
    pub error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::error!("Relay failure: {}", self);
        let body = RelayErrorBody {
            message: "Error forwarding request to queue".to_string(),
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// The queue's reply, passed back as-is.
#[derive(Debug, Clone)]
pub struct Forwarded {
    /// Upstream status.
    pub status: StatusCode,
    /// Upstream content type, if any.
    pub content_type: Option<HeaderValue>,
    /// Upstream body bytes.
    pub body: Bytes,
}

impl IntoResponse for Forwarded {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let content_type = self
            .content_type
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
        response
    }
}

/// Shared relay state.
#[derive(Debug, Clone)]
pub struct RelayState {
    config: Arc<RelayConfig>,
    http: Client,
}

impl RelayState {
    /// Create relay state with a fresh HTTP client.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: Client::new(),
        }
    }

    /// Relay configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Exchange client credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError`] if the request fails, is rejected or carries
    /// no token.
    #[tracing::instrument(name = "fetch_token", skip(self), fields(token_url = %self.config.token_url))]
    pub async fn fetch_token(&self) -> Result<String, RelayError> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if let Some(scope) = self.config.scope.as_deref() {
            form.push(("scope", scope));
        }

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(RelayError::TokenRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::TokenRejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await.map_err(RelayError::TokenRequest)?;
        match token.access_token {
            Some(token) if !token.is_empty() => {
                tracing::debug!("Access token acquired");
                Ok(token)
            }
            _ => Err(RelayError::MissingToken),
        }
    }

    /// Fetch a token and forward `body` to the queue endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError`] if either hop fails. A non-success status
    /// from the queue is not an error; it is returned in [`Forwarded`].
    #[tracing::instrument(name = "forward_to_queue", skip(self, body), fields(queue_url = %self.config.queue_url))]
    pub async fn forward(&self, body: &Value) -> Result<Forwarded, RelayError> {
        let token = self.fetch_token().await?;

        let mut request = self
            .http
            .post(self.config.queue_url.clone())
            .bearer_auth(token)
            .json(body);
        if let Some(unit) = self.config.organization_unit_id.as_deref() {
            request = request.header(ORGANIZATION_UNIT_HEADER, unit);
        }

        let response = request.send().await.map_err(RelayError::Forward)?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(RelayError::Forward)?;

        tracing::info!(status = status.as_u16(), "Queue responded");
        Ok(Forwarded {
            status,
            content_type,
            body,
        })
    }
}

/// `POST /proxy-post-api`.
#[tracing::instrument(name = "proxy_post_api", skip(state, body))]
pub async fn proxy_post_api(
    State(state): State<RelayState>,
    Json(body): Json<Value>,
) -> Result<Forwarded, RelayError> {
    state.forward(&body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::post, Router};
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{body_json, body_string_contains, header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> RelayConfig {
        RelayConfig {
            token_url: Url::parse(&format!("{}/identity/connect/token", server.uri()))
                .expect("token url"),
            client_id: "client".into(),
            client_secret: "secret".into(),
            scope: Some("OR.Queues".into()),
            queue_url: Url::parse(&format!(
                "{}/odata/Queues/UiPathODataSvc.AddQueueItem",
                server.uri()
            ))
            .expect("queue url"),
            organization_unit_id: Some("42".into()),
        }
    }

    fn app(state: RelayState) -> Router {
        Router::new()
            .route("/proxy-post-api", post(proxy_post_api))
            .with_state(state)
    }

    fn post_json(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/proxy-post-api")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/identity/connect/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "tok-123", "expires_in": 3600 })),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_error_body_shape() {
        let body = RelayErrorBody {
            message: "m".into(),
            error: "e".into(),
        };
        let json = serde_json::to_value(&body).expect("should serialize");
        assert_eq!(json, json!({ "message": "m", "error": "e" }));
    }

    #[test]
    fn test_has_credentials() {
        let mut config = RelayConfig {
            token_url: Url::parse("http://localhost/token").expect("url"),
            client_id: "id".into(),
            client_secret: "secret".into(),
            scope: None,
            queue_url: Url::parse("http://localhost/queue").expect("url"),
            organization_unit_id: None,
        };
        assert!(config.has_credentials());
        config.client_secret.clear();
        assert!(!config.has_credentials());
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn forwards_body_with_bearer_token() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        let payload = json!({ "itemData": { "Name": "Document Template Queue" } });
        Mock::given(method("POST"))
            .and(path("/odata/Queues/UiPathODataSvc.AddQueueItem"))
            .and(header_is("authorization", "Bearer tok-123"))
            .and(header_is(ORGANIZATION_UNIT_HEADER, "42"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "Id": 99 })))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(RelayState::new(config_for(&server)))
            .oneshot(post_json(&payload))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(read_json(response).await, json!({ "Id": 99 }));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn queue_rejection_is_passed_through() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/odata/Queues/UiPathODataSvc.AddQueueItem"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({ "message": "duplicate" })),
            )
            .mount(&server)
            .await;

        let response = app(RelayState::new(config_for(&server)))
            .oneshot(post_json(&json!({})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(read_json(response).await, json!({ "message": "duplicate" }));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn token_rejection_becomes_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/connect/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/odata/Queues/UiPathODataSvc.AddQueueItem"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let response = app(RelayState::new(config_for(&server)))
            .oneshot(post_json(&json!({})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert!(body["message"].is_string());
        assert!(body["error"]
            .as_str()
            .expect("error text")
            .contains("invalid_client"));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn missing_access_token_becomes_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "Bearer" })))
            .mount(&server)
            .await;

        let state = RelayState::new(config_for(&server));
        assert!(matches!(
            state.fetch_token().await,
            Err(RelayError::MissingToken)
        ));

        let response = app(state)
            .oneshot(post_json(&json!({})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_becomes_500() {
        let port = portpicker::pick_unused_port().expect("no available port");
        let config = RelayConfig {
            token_url: Url::parse(&format!("http://127.0.0.1:{port}/token")).expect("url"),
            client_id: "id".into(),
            client_secret: "secret".into(),
            scope: None,
            queue_url: Url::parse(&format!("http://127.0.0.1:{port}/queue")).expect("url"),
            organization_unit_id: None,
        };

        let response = app(RelayState::new(config))
            .oneshot(post_json(&json!({})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert!(body["error"]
            .as_str()
            .expect("error text")
            .starts_with("token request failed"));
    }
}
