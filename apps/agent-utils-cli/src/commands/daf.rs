use agent_utils_client::DafExportOptions;
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use super::util::Remote;
use crate::config::Settings;

#[derive(Subcommand)]
pub enum DafCmd {
    /// Import a published DAF package
    Import(DafImportArgs),
    /// Ask the service to build a DAF package and print its download link
    Export(DafExportArgs),
}

#[derive(Args)]
pub struct DafImportArgs {
    /// Package name
    #[arg(long)]
    pub name: String,
    /// Package version
    #[arg(long, default_value = "0.0.1")]
    pub version: String,
}

#[derive(Args)]
pub struct DafExportArgs {
    /// Keep the descriptor as stored instead of cleaning it
    #[arg(long)]
    pub no_clean: bool,
    /// Include memory
    #[arg(long)]
    pub with_memory: bool,
    /// Include knowledge
    #[arg(long)]
    pub with_knowledge: bool,
}

pub fn execute(cmd: DafCmd, settings: &Settings) -> Result<()> {
    let mut remote = Remote::connect(settings)?;
    match cmd {
        DafCmd::Import(args) => {
            remote
                .client
                .import_daf(&mut remote.session, &args.name, &args.version)?;
            println!("DAF imported successfully");
        }
        DafCmd::Export(args) => {
            let agent_id = remote.agent_id()?;
            let options = DafExportOptions {
                clean: !args.no_clean,
                with_memory: args.with_memory,
                with_knowledge: args.with_knowledge,
            };
            let url = remote
                .client
                .export_daf(&mut remote.session, &agent_id, &options)?
                .ok_or_else(|| anyhow!("Failed to export DAF: the service returned no link"))?;
            println!("DAF exported successfully");
            println!("{url}");
        }
    }
    Ok(())
}
