//! Approvegate main binary: the WhatsApp approval gateway.

mod config;
mod routes;
mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(name = "approvegate", version, about = "WhatsApp leave-approval gateway")]
struct Cli {
    /// Path to config.toml (default: ~/.approvegate/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the gateway server (default).
    Serve,
    /// Validate config and probe the bridge sidecar.
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(cli.config).await,
        Command::Doctor => server::doctor(cli.config).await,
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new(
            "info,approvegate=debug,ag_app=debug,ag_engine=debug,ag_channels=debug,tower_http=info",
        ),
    };
    let log_format = std::env::var("APPROVEGATE_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_ascii_lowercase();

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .init();
        }
    }
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "panic");
        default_hook(info);
    }));
}
