//! Command line interface of the standalone data plane

use anyhow::Context;
use clap::{Parser, Subcommand};
use dataplane_spi::DataFlowStartMessage;
use std::path::{Path, PathBuf};

use crate::{Config, Runtime};

#[derive(Parser, Debug)]
#[command(
    name = "dicomweb-dataplane",
    about = "Transfer DICOM data between DICOMweb endpoints"
)]
pub struct Cli {
    /// TOML configuration file, defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Run a data flow start message
    Transfer {
        #[arg(short, long)]
        flow: PathBuf,
    },
    /// Validate a data flow start message without transferring
    Validate {
        #[arg(short, long)]
        flow: PathBuf,
    },
    /// List the supported source and sink types
    Types,
}

impl Cli {
    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display())),
            None => Ok(Config::default()),
        }
    }
}

impl Cmd {
    /// Run the subcommand, returning the lines to print on success
    pub async fn execute(&self, runtime: &Runtime) -> anyhow::Result<Vec<String>> {
        match self {
            Cmd::Transfer { flow } => {
                let request = read_flow(flow)?;
                runtime.transfer(&request).await.map_err(|failure| {
                    anyhow::anyhow!("transfer {} failed: {}", request.id, failure)
                })?;
                Ok(vec![format!("Transfer {} completed", request.id)])
            }
            Cmd::Validate { flow } => {
                let request = read_flow(flow)?;
                runtime
                    .validate(&request)
                    .map_err(|messages| anyhow::anyhow!(messages.join("\n")))?;
                Ok(vec![format!("Flow {} is valid", request.id)])
            }
            Cmd::Types => {
                let pipeline = runtime.pipeline();
                Ok(vec![
                    format!("sources: {}", pipeline.supported_source_types().join(", ")),
                    format!("sinks: {}", pipeline.supported_sink_types().join(", ")),
                ])
            }
        }
    }
}

fn read_flow(path: &Path) -> anyhow::Result<DataFlowStartMessage> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading flow {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing flow {}", path.display()))
}
