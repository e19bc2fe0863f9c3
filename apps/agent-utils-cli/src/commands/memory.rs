use std::path::PathBuf;

use agent_utils_core::{render_memory_export, DocumentFormat};
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::Value as JsonValue;

use super::util::{display_value, print_json, read_text, require_truthy, write_output, Remote};
use crate::config::Settings;

#[derive(Subcommand)]
pub enum MemoryCmd {
    /// Run the memory healthcheck
    Health(MemoryHealthArgs),
    /// Purge stored memory (all sessions unless --session-id is given)
    Purge(MemorySessionArgs),
    /// Refresh memory for one session
    Refresh(MemoryRefreshArgs),
    /// Export memory to exported_memory.json / exported_memory.yaml
    Export(MemoryExportArgs),
    /// Import memory from a YAML or JSON file
    Import(MemoryImportArgs),
}

#[derive(Args)]
pub struct MemorySessionArgs {
    /// Limit the operation to one session
    #[arg(long, default_value = "")]
    pub session_id: String,
}

#[derive(Args)]
pub struct MemoryHealthArgs {
    #[command(flatten)]
    pub session: MemorySessionArgs,
    /// Ask for a verbose report
    #[arg(long)]
    pub verbose: bool,
    /// Print the raw JSON report
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct MemoryRefreshArgs {
    /// Session to refresh
    #[arg(long)]
    pub session_id: String,
}

#[derive(Args)]
pub struct MemoryExportArgs {
    #[command(flatten)]
    pub session: MemorySessionArgs,
    /// Export as YAML instead of JSON
    #[arg(long)]
    pub yaml: bool,
    /// Directory the export file is written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct MemoryImportArgs {
    /// YAML or JSON file holding the memory to import
    pub file: PathBuf,
    /// Merge into existing memory instead of overwriting it
    #[arg(long)]
    pub no_overwrite: bool,
}

pub fn execute(cmd: MemoryCmd, settings: &Settings) -> Result<()> {
    let mut remote = Remote::connect(settings)?;
    match cmd {
        MemoryCmd::Health(args) => cmd_health(&mut remote, &args),
        MemoryCmd::Purge(args) => cmd_purge(&mut remote, &args),
        MemoryCmd::Refresh(args) => cmd_refresh(&mut remote, &args),
        MemoryCmd::Export(args) => cmd_export(&mut remote, &args),
        MemoryCmd::Import(args) => cmd_import(&mut remote, &args),
    }
}

fn cmd_health(remote: &mut Remote, args: &MemoryHealthArgs) -> Result<()> {
    let target = remote.target()?;
    let verbose = args.verbose.then_some(true);
    let result = remote.client.memory_healthcheck(
        &mut remote.session,
        &target,
        &args.session.session_id,
        verbose,
    )?;
    let result = require_truthy(
        result,
        "Failed to run memory healthcheck. Please check your inputs and try again.",
    )?;
    if args.json {
        return print_json(&result);
    }
    println!("Memory healthcheck completed successfully!");
    match &result {
        JsonValue::Object(map) => {
            for (key, value) in map {
                println!("{key}: {}", display_value(value));
            }
        }
        other => println!("{}", display_value(other)),
    }
    Ok(())
}

fn cmd_purge(remote: &mut Remote, args: &MemorySessionArgs) -> Result<()> {
    let target = remote.target()?;
    let result = remote
        .client
        .purge_memory(&mut remote.session, &target, &args.session_id)?;
    require_truthy(
        result,
        "Failed to purge agent memory. Ensure that there is something to purge.",
    )?;
    println!("Agent memory purged successfully");
    Ok(())
}

fn cmd_refresh(remote: &mut Remote, args: &MemoryRefreshArgs) -> Result<()> {
    if args.session_id.trim().is_empty() {
        bail!("--session-id must not be empty");
    }
    let target = remote.target()?;
    let result = remote
        .client
        .refresh_memory(&mut remote.session, &target, &args.session_id)?;
    require_truthy(
        result,
        "Failed to refresh agent memory. Ensure that there is something to refresh.",
    )?;
    println!("Agent memory refreshed successfully");
    Ok(())
}

fn cmd_export(remote: &mut Remote, args: &MemoryExportArgs) -> Result<()> {
    let format = if args.yaml {
        DocumentFormat::Yaml
    } else {
        DocumentFormat::Json
    };
    let target = remote.target()?;
    let result = remote.client.export_memory(
        &mut remote.session,
        &target,
        &args.session.session_id,
        format == DocumentFormat::Json,
    )?;
    let export = match render_memory_export(&result, format) {
        Ok(export) => export,
        Err(err) => {
            tracing::debug!(%err, "export memory result unusable");
            bail!("Failed to export agent memory. Please check your inputs and try again.");
        }
    };

    println!("Agent memory exported successfully!");
    print!("{}", format.encode(&export.preview)?);
    if format == DocumentFormat::Json {
        println!();
    }
    let path = write_output(&args.out, &export.file_name, export.contents.as_bytes())?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_import(remote: &mut Remote, args: &MemoryImportArgs) -> Result<()> {
    let data = read_text(&args.file)?;
    let target = remote.target()?;
    let result = remote
        .client
        .import_memory(&mut remote.session, &target, &data, !args.no_overwrite)?;
    require_truthy(
        result,
        "Failed to import agent memory. Ensure that the file is valid YAML or JSON.",
    )?;
    println!("Agent memory imported successfully");
    Ok(())
}
