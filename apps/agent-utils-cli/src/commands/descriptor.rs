use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::util::{read_text, require_truthy, Remote};
use crate::config::Settings;

#[derive(Subcommand)]
pub enum DescriptorCmd {
    /// Import an agent from a descriptor file (YAML or JSON)
    Import(DescriptorImportArgs),
}

#[derive(Args)]
pub struct DescriptorImportArgs {
    /// Descriptor file
    pub file: PathBuf,
}

pub fn execute(cmd: DescriptorCmd, settings: &Settings) -> Result<()> {
    match cmd {
        DescriptorCmd::Import(args) => {
            let descriptor = read_text(&args.file)?;
            let mut remote = Remote::connect(settings)?;
            let result = remote
                .client
                .import_agent(&mut remote.session, &descriptor)?;
            require_truthy(
                result,
                "Failed to import agent. Ensure that the descriptor is valid YAML.",
            )?;
            println!("Agent imported successfully");
            Ok(())
        }
    }
}
