//! # Document Template Relay
//!
//! `doc-template serve` runs the local relay on localhost.
//! `doc-template submit` compiles a saved element list and posts it through
//! the relay.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use template_core::{compile, TemplateInfo};
use template_server::config::{Cli, Command, ServeArgs, SubmitArgs};
use template_server::gateway::{load_scene, SubmissionClient};
use template_server::{router, RelayState};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,template_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,template_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Submit(args) => submit(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let port = args.port;
    let state = RelayState::new(args.relay.into());
    if !state.config().has_credentials() {
        tracing::warn!("Client credentials are empty; token requests will be rejected");
    }

    let app = router(state, port);

    // Bind to localhost only
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Template relay listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Template relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}

async fn submit(args: SubmitArgs) -> anyhow::Result<()> {
    let store = load_scene(&args.scene)
        .with_context(|| format!("failed to load {}", args.scene.display()))?;
    let info = TemplateInfo::new(args.name, args.description);

    let compiled = compile(store.elements(), &info);
    if let Some(path) = &args.html_out {
        std::fs::write(path, &compiled.html)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Compiled HTML written to {:?}", path);
    }

    let client = SubmissionClient::new(args.relay_url.as_str())?;
    let message = client.export_compiled(&info, &compiled).await;

    println!("{}", message.text);
    if message.is_success() {
        Ok(())
    } else {
        anyhow::bail!("template submission failed")
    }
}
