//! Serve command: MCP server on stdio.

use anyhow::Context;
use clap::Args;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing::{info, instrument};

use turbulence_core::Config;

use crate::server::TurbulenceServer;

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Start without the configured stopwords.
    #[arg(long)]
    pub no_stopwords: bool,
}

/// Run the MCP server until the client disconnects.
///
/// Logging goes to stderr and the log file; stdout carries the protocol.
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(
    args: ServeArgs,
    max_input_bytes: Option<usize>,
    config: Config,
) -> anyhow::Result<()> {
    let stopwords = if args.no_stopwords {
        turbulence_core::StopwordSet::empty()
    } else {
        config.stopwords().context("failed to load stopwords")?
    };
    info!(
        stopwords = stopwords.len(),
        alpha = config.alpha,
        top_k = config.top_k,
        "starting MCP server on stdio"
    );

    let server = TurbulenceServer::new(config.compare_options(), stopwords, max_input_bytes);
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await.context("MCP server failed")?;

    info!("MCP server stopped");
    Ok(())
}
