mod config;
mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpPaymentsApi, PaymentsDashboard, RequestOutcome};
use shared::domain::PaymentId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, validate_server_url},
    render::{render_candidates, render_payments},
};

#[derive(Parser, Debug)]
#[command(name = "organizer", about = "Payments dashboard for event organizers")]
struct Cli {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List payments, most recent first.
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show the events a payment can be requested for.
    Candidates,
    /// Request payment for an ongoing event.
    Request {
        #[arg(long)]
        event_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let server_url = validate_server_url(&settings.server_url)?;
    let api = HttpPaymentsApi::with_timeout(server_url.as_str(), settings.request_timeout())
        .context("failed to build payments client")?;
    info!(endpoint = %api.endpoint(), "loading payments");
    let dashboard = PaymentsDashboard::mount(api).await;

    match cli.command {
        Command::List { status } => {
            let status = status.unwrap_or_else(|| settings.default_filter.clone());
            dashboard.set_filter(&status).await;
            print!("{}", render_payments(&dashboard.view().await));
        }
        Command::Candidates => {
            print!("{}", render_candidates(&dashboard.view().await.candidates));
        }
        Command::Request { event_id } => request(&dashboard, event_id).await?,
    }
    Ok(())
}

async fn request(
    dashboard: &PaymentsDashboard<HttpPaymentsApi>,
    event_id: Option<String>,
) -> Result<()> {
    dashboard.open_request().await?;

    let selection = match event_id {
        Some(id) => Some(PaymentId::new(id)),
        None => prompt_for_candidate(dashboard).await?,
    };
    let Some(selection) = selection else {
        dashboard.cancel_request().await?;
        println!("No payment requested.");
        return Ok(());
    };

    dashboard
        .select_candidate(Some(selection.clone()))
        .await
        .with_context(|| format!("event '{selection}' cannot be requested"))?;

    match dashboard.submit_request().await? {
        RequestOutcome::Requested { id, .. } => {
            println!("Payment requested for {id}.");
            print!("{}", render_payments(&dashboard.view().await));
            Ok(())
        }
        RequestOutcome::Failed { id, reason } => {
            if let Some(notice) = dashboard.view().await.notice {
                eprintln!("{notice}");
            }
            bail!("payment request for {id} failed: {reason}");
        }
    }
}

/// Reads a 1-based index or an event id from stdin. Blank input cancels.
async fn prompt_for_candidate(
    dashboard: &PaymentsDashboard<HttpPaymentsApi>,
) -> Result<Option<PaymentId>> {
    let candidates = dashboard.view().await.candidates;
    print!("{}", render_candidates(&candidates));
    if candidates.is_empty() {
        return Ok(None);
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Select an event: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read selection")?;
    let answer = line.trim();
    if answer.is_empty() {
        return Ok(None);
    }

    if let Ok(index) = answer.parse::<usize>() {
        if let Some(candidate) = index.checked_sub(1).and_then(|i| candidates.get(i)) {
            return Ok(Some(candidate.id.clone()));
        }
    }
    Ok(Some(PaymentId::new(answer)))
}
