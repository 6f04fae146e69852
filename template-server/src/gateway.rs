//! Queue submission gateway - packages a compiled template and posts it to
//! the local relay.
//!
//! One attempt per export; no retry. A second export while one is in flight
//! is refused with [`GatewayError::InProgress`]. Every outcome collapses into
//! a single [`ExportMessage`] for the user.

use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use template_core::{compile, CompiledTemplate, Element, ElementStore, TemplateError, TemplateInfo};
use thiserror::Error;
use url::Url;

/// Queue item priority sent with every template.
pub const QUEUE_PRIORITY: &str = "Normal";
/// Name of the queue templates are added to.
pub const QUEUE_NAME: &str = "Document Template Queue";
/// Relay path the gateway posts to.
pub const RELAY_PATH: &str = "/proxy-post-api";

/// Errors that can occur while submitting a template.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The relay URL provided by configuration is invalid.
    #[error("invalid relay URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The relay or queueing API answered with a non-success status.
    #[error("queue rejected the template ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// Compiling or loading the template failed.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    /// Reading a scene file failed.
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),
    /// Another submission is still in flight.
    #[error("a template submission is already in progress")]
    InProgress,
}

/// Template fields of a queue item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificContent {
    /// Template name.
    #[serde(rename = "tempName")]
    pub temp_name: String,
    /// Template description.
    #[serde(rename = "tempDescription")]
    pub temp_description: String,
    /// Exported HTML document.
    #[serde(rename = "tempHTML")]
    pub temp_html: String,
    /// Exported JSON description, as a string.
    #[serde(rename = "tempJSON")]
    pub temp_json: String,
}

/// A queue item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueItem {
    /// Always [`QUEUE_PRIORITY`].
    pub priority: String,
    /// Always [`QUEUE_NAME`].
    pub name: String,
    /// Template payload.
    pub specific_content: SpecificContent,
}

/// Request body posted to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEnvelope {
    /// The queue item.
    #[serde(rename = "itemData")]
    pub item_data: QueueItem,
}

impl QueueEnvelope {
    /// Wrap a compiled template.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON description cannot be serialized.
    pub fn new(info: &TemplateInfo, compiled: &CompiledTemplate) -> Result<Self, GatewayError> {
        Ok(Self {
            item_data: QueueItem {
                priority: QUEUE_PRIORITY.to_string(),
                name: QUEUE_NAME.to_string(),
                specific_content: SpecificContent {
                    temp_name: info.name.clone(),
                    temp_description: info.description.clone(),
                    temp_html: compiled.html.clone(),
                    temp_json: compiled.json()?,
                },
            },
        })
    }
}

/// Severity of an [`ExportMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// The template was queued.
    Success,
    /// The export failed.
    Error,
}

/// The one message shown to the user after an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMessage {
    /// Severity.
    pub kind: MessageKind,
    /// Text shown to the user.
    pub text: String,
}

impl ExportMessage {
    /// Confirmation message.
    #[must_use]
    pub fn success() -> Self {
        Self {
            kind: MessageKind::Success,
            text: "Template created successfully!".to_string(),
        }
    }

    /// Error message for a failed export.
    #[must_use]
    pub fn failure(error: &GatewayError) -> Self {
        Self {
            kind: MessageKind::Error,
            text: format!("Failed to create template: {error}"),
        }
    }

    /// Whether this is a success message.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind == MessageKind::Success
    }
}

/// Clears the in-flight flag when a submission ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client posting templates to the relay.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    http: Client,
    endpoint: Url,
    in_flight: Arc<AtomicBool>,
}

impl SubmissionClient {
    /// Create a client posting to `endpoint` (the relay's full URL).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if `endpoint` is not an absolute
    /// http(s) URL.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self, GatewayError> {
        let endpoint = Url::parse(endpoint.as_ref())
            .map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidUrl(endpoint.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            endpoint,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create a client for a relay at `base` (e.g. `http://localhost:5000`).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if `base` is invalid.
    pub fn for_relay(base: impl AsRef<str>) -> Result<Self, GatewayError> {
        let base = Url::parse(base.as_ref()).map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;
        let endpoint = base
            .join(RELAY_PATH)
            .map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;
        Self::new(endpoint)
    }

    /// The URL submissions are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a submission is currently in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Post an envelope once and return the queue's reply.
    ///
    /// Any 2xx status counts as queued. A reply that is not JSON comes back
    /// as a [`Value::String`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InProgress`] if another submission is in
    /// flight, [`GatewayError::Http`] on transport failure and
    /// [`GatewayError::Rejected`] on a non-success status.
    #[tracing::instrument(name = "submit_template", skip(self, envelope), fields(endpoint = %self.endpoint))]
    pub async fn submit(&self, envelope: &QueueEnvelope) -> Result<Value, GatewayError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::warn!("Submission refused, another one is in flight");
            return Err(GatewayError::InProgress);
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Template submission rejected");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(status = status.as_u16(), "Template submitted");
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        // The item is queued at this point; a non-JSON reply is kept as text.
        Ok(serde_json::from_str(&body).unwrap_or_else(|err| {
            tracing::debug!("Relay reply is not JSON: {}", err);
            Value::String(body)
        }))
    }

    /// Compile `elements` and submit them.
    ///
    /// # Errors
    ///
    /// See [`SubmissionClient::submit`].
    pub async fn submit_elements(
        &self,
        elements: &[Element],
        info: &TemplateInfo,
    ) -> Result<Value, GatewayError> {
        self.submit_compiled(info, &compile(elements, info)).await
    }

    /// Submit an already compiled template.
    ///
    /// # Errors
    ///
    /// See [`SubmissionClient::submit`].
    pub async fn submit_compiled(
        &self,
        info: &TemplateInfo,
        compiled: &CompiledTemplate,
    ) -> Result<Value, GatewayError> {
        let envelope = QueueEnvelope::new(info, compiled)?;
        self.submit(&envelope).await
    }

    /// The "Create Template" action: compile, submit, report one message.
    pub async fn export(&self, elements: &[Element], info: &TemplateInfo) -> ExportMessage {
        self.export_compiled(info, &compile(elements, info)).await
    }

    /// Submit a compiled template and report one message.
    pub async fn export_compiled(
        &self,
        info: &TemplateInfo,
        compiled: &CompiledTemplate,
    ) -> ExportMessage {
        match self.submit_compiled(info, compiled).await {
            Ok(_) => ExportMessage::success(),
            Err(err) => {
                tracing::error!("Template export failed: {}", err);
                ExportMessage::failure(&err)
            }
        }
    }
}

/// Load an element list saved with [`ElementStore::to_json`].
///
/// # Errors
///
/// Returns [`GatewayError::Io`] if the file cannot be read and
/// [`GatewayError::Template`] if it is not a valid element list.
pub fn load_scene(path: &Path) -> Result<ElementStore, GatewayError> {
    let json = std::fs::read_to_string(path)?;
    Ok(ElementStore::from_json(&json)?)
}
