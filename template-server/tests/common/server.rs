//! Test server harness for integration tests.
//!
//! Spins up the real relay router on a random port, pointed at whatever
//! upstream the test provides (usually a wiremock server).

use std::net::SocketAddr;

use template_server::{router, RelayConfig, RelayState};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;

/// A test relay instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a relay forwarding to `upstream`.
    ///
    /// Tokens are requested from `{upstream}/identity/connect/token` and
    /// bodies forwarded to `{upstream}/odata/Queues/UiPathODataSvc.AddQueueItem`.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start(upstream: &str) -> Self {
        let config = RelayConfig {
            token_url: Url::parse(&format!("{upstream}/identity/connect/token"))
                .expect("token url"),
            client_id: "client".into(),
            client_secret: "secret".into(),
            scope: None,
            queue_url: Url::parse(&format!(
                "{upstream}/odata/Queues/UiPathODataSvc.AddQueueItem"
            ))
            .expect("queue url"),
            organization_unit_id: Some("7".into()),
        };
        Self::start_with(config).await
    }

    /// Start a relay with an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start_with(config: RelayConfig) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let app = router(RelayState::new(config), port);

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:5123`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full relay endpoint URL.
    #[allow(dead_code)]
    pub fn relay_url(&self) -> String {
        format!("http://{}/proxy-post-api", self.addr)
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
