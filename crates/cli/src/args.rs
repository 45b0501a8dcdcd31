//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use vodmigrator_core::{Destination, TransferRequest};

/// Migrate one VOD asset through the bounded-execution worker.
#[derive(Debug, Parser)]
#[command(name = "vodmigrator", version, about)]
pub struct Args {
    /// Configuration file.
    #[arg(long, short, env = "VODMIGRATOR_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// Read the transfer request from a JSON file instead of flags.
    #[arg(long, conflicts_with_all = ["id", "source_url", "container"])]
    pub request: Option<PathBuf>,

    /// Asset identifier, used as the last segment of the destination prefix.
    #[arg(long, required_unless_present = "request")]
    pub id: Option<String>,

    /// Master manifest URL on the origin.
    #[arg(long, required_unless_present = "request")]
    pub source_url: Option<String>,

    /// Destination container.
    #[arg(long, required_unless_present = "request")]
    pub container: Option<String>,

    /// Path prefix inside the destination container.
    #[arg(long, default_value = "")]
    pub path_prefix: String,

    /// Print Prometheus metrics to stderr when the run ends.
    #[arg(long)]
    pub print_metrics: bool,
}

impl Args {
    pub fn transfer_request(&self) -> Result<TransferRequest> {
        if let Some(path) = &self.request {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request from {:?}", path))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse request in {:?}", path));
        }

        Ok(TransferRequest::new(
            self.id.clone().unwrap_or_default(),
            self.source_url.clone().unwrap_or_default(),
            Destination::new(
                self.container.clone().unwrap_or_default(),
                self.path_prefix.clone(),
            ),
        ))
    }
}
