//! sysdump - Collect a point-in-time diagnostic bundle from a Kubernetes cluster

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use std::sync::Arc;
use sysdump::cli::Cli;
use sysdump::commands;
use sysdump::sysdump::{Hooks, NopHooks};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let hooks: Arc<dyn Hooks> = Arc::new(NopHooks);

    // Hooks may contribute flags before parsing
    let matches = hooks.add_sysdump_flags(Cli::command()).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    setup_tracing(cli.verbose);

    if cli.no_color {
        owo_colors::set_override(false);
    }

    if let Err(e) = commands::run_sysdump(&cli, hooks).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
