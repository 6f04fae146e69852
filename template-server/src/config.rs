//! Command-line and environment configuration.
//!
//! Every relay setting can come from a flag or a `DOC_TEMPLATE_*` variable.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::relay::RelayConfig;

/// Default relay port.
pub const DEFAULT_PORT: u16 = 5000;

/// Relay URL the `submit` command posts to by default.
pub const DEFAULT_RELAY_URL: &str = "http://localhost:5000/proxy-post-api";

/// Document template designer backend.
#[derive(Debug, Parser)]
#[command(name = "doc-template", version, about)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the local relay.
    Serve(ServeArgs),
    /// Compile a saved element list and submit it through the relay.
    Submit(SubmitArgs),
}

/// Arguments for `serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (localhost only).
    #[arg(long, env = "DOC_TEMPLATE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Upstream settings.
    #[command(flatten)]
    pub relay: RelayArgs,
}

/// Upstream identity and queue settings.
#[derive(Debug, Clone, Args)]
pub struct RelayArgs {
    /// Identity endpoint for the client-credentials exchange.
    #[arg(long, env = "DOC_TEMPLATE_TOKEN_URL")]
    pub token_url: Url,

    /// OAuth client id.
    #[arg(long, env = "DOC_TEMPLATE_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret.
    #[arg(long, env = "DOC_TEMPLATE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Scopes requested with the token.
    #[arg(long, env = "DOC_TEMPLATE_SCOPE")]
    pub scope: Option<String>,

    /// Queue endpoint requests are forwarded to.
    #[arg(long, env = "DOC_TEMPLATE_QUEUE_URL")]
    pub queue_url: Url,

    /// Organization unit (folder) id sent with queue requests.
    #[arg(long, env = "DOC_TEMPLATE_ORGANIZATION_UNIT_ID")]
    pub organization_unit_id: Option<String>,
}

impl From<RelayArgs> for RelayConfig {
    fn from(args: RelayArgs) -> Self {
        Self {
            token_url: args.token_url,
            client_id: args.client_id,
            client_secret: args.client_secret,
            scope: args.scope.filter(|s| !s.trim().is_empty()),
            queue_url: args.queue_url,
            organization_unit_id: args.organization_unit_id.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Arguments for `submit`.
#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Element list saved as JSON.
    #[arg(long)]
    pub scene: PathBuf,

    /// Template name.
    #[arg(long)]
    pub name: String,

    /// Template description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Relay endpoint.
    #[arg(long, env = "DOC_TEMPLATE_RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    pub relay_url: Url,

    /// Also write the compiled HTML here.
    #[arg(long)]
    pub html_out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from([
            "doc-template",
            "serve",
            "--port",
            "5100",
            "--token-url",
            "https://cloud.example/identity/connect/token",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
            "--queue-url",
            "https://cloud.example/odata/queue",
            "--scope",
            "  ",
        ])
        .expect("should parse");

        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 5100);
        let config = RelayConfig::from(args.relay);
        assert_eq!(config.client_id, "id");
        assert_eq!(config.scope, None);
        assert_eq!(config.organization_unit_id, None);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = Cli::try_parse_from([
            "doc-template",
            "serve",
            "--token-url",
            "not a url",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
            "--queue-url",
            "https://cloud.example/odata/queue",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_submit_defaults() {
        let cli = Cli::try_parse_from([
            "doc-template",
            "submit",
            "--scene",
            "scene.json",
            "--name",
            "Invoice",
            "--relay-url",
            DEFAULT_RELAY_URL,
        ])
        .expect("should parse");

        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.name, "Invoice");
        assert_eq!(args.description, "");
        assert_eq!(args.relay_url.as_str(), DEFAULT_RELAY_URL);
        assert!(args.html_out.is_none());
    }
}
