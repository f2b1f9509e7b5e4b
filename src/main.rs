mod audit;
mod cli;
mod config;
mod content;
mod request;
mod resolver;
mod response;
mod server;

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::audit::AuditLog;
use crate::cli::Cli;
use crate::config::Config;
use crate::resolver::ArpCacheResolver;
use crate::server::DecoyServer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let filter = if cli.verbose {
        EnvFilter::new("honeyswitch=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("honeyswitch=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    config.validate()?;

    let addr = config.listen_addr()?;
    let audit = Arc::new(AuditLog::open(&config.audit.logfile).await?);
    let listener = DecoyServer::bind(addr).await?;

    println!(
        "{} {}",
        "⟦DECOY⟧".truecolor(0, 212, 255).bold(),
        format!("CSS326-24G-2S+ web interface listening on {addr}").truecolor(255, 255, 255)
    );
    println!(
        "{} {}",
        "⟦AUDIT⟧".truecolor(191, 64, 191).bold(),
        audit.path().display().to_string().truecolor(128, 128, 128)
    );

    let server = Arc::new(DecoyServer::new(
        audit,
        Arc::new(ArpCacheResolver),
        config.read_timeout(),
    ));
    server.run(listener).await
}
