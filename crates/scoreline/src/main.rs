//! # scoreline
//!
//! Scoreline relay server binary: loads settings, initializes logging and
//! starts the HTTP/WebSocket server, or issues session tokens.

#![deny(unsafe_code)]

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scoreline_auth::{InMemoryUserStore, TokenIssuer};
use scoreline_server::{RelayServer, ServerConfig};
use scoreline_settings::{ScorelineSettings, load_settings, load_settings_from_path};

/// Real-time score relay.
#[derive(Parser, Debug)]
#[command(name = "scoreline", about = "Real-time score relay server", version)]
struct Cli {
    /// Settings file (default `~/.scoreline/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP + WebSocket server.
    Serve {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, 0 for auto-assign (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print a signed session token for a user.
    IssueToken {
        /// The `userId` claim.
        #[arg(long)]
        user_id: String,
    },
}

fn apply_cli_overrides(settings: &mut ScorelineSettings, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => load_settings_from_path(path),
        None => load_settings(),
    }
    .context("Failed to load settings")?;

    logging::init_subscriber(&settings.logging);

    match cli.command {
        Command::Serve { host, port } => {
            apply_cli_overrides(&mut settings, host, port);
            settings.validate().context("Invalid settings")?;
            serve(settings).await
        }
        Command::IssueToken { user_id } => {
            settings.validate().context("Invalid settings")?;
            let issuer = TokenIssuer::new(&settings.auth.jwt_secret, settings.auth.token_ttl_secs);
            let token = issuer.issue(&user_id).context("Failed to issue token")?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(settings: ScorelineSettings) -> Result<()> {
    let metrics = scoreline_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;
    let issuer = TokenIssuer::new(&settings.auth.jwt_secret, settings.auth.token_ttl_secs);
    let server = RelayServer::new(ServerConfig::from_settings(&settings.server), issuer)
        .context("Invalid server configuration")?
        .with_user_store(Arc::new(InMemoryUserStore::new()), settings.auth.password_cost)
        .with_metrics(metrics);

    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!(frontend = %settings.server.frontend_url, "scoreline listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().graceful_shutdown(vec![handle], None).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "scoreline", "serve", "--host", "127.0.0.1", "--port", "4000",
        ])
        .unwrap();
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(4000));
            }
            Command::IssueToken { .. } => panic!("expected serve"),
        }
    }

    #[test]
    fn settings_flag_is_global() {
        let cli = Cli::try_parse_from([
            "scoreline", "issue-token", "--user-id", "u1", "--settings", "/tmp/s.json",
        ])
        .unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.json")));
        assert!(matches!(cli.command, Command::IssueToken { ref user_id } if user_id == "u1"));
    }

    #[test]
    fn issue_token_requires_user_id() {
        assert!(Cli::try_parse_from(["scoreline", "issue-token"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["scoreline"]).is_err());
    }

    #[test]
    fn cli_overrides_win_over_settings() {
        let mut settings = ScorelineSettings::default();
        apply_cli_overrides(&mut settings, Some("127.0.0.1".into()), Some(0));
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 0);

        apply_cli_overrides(&mut settings, None, None);
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
