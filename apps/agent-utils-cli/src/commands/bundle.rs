use std::path::{Path, PathBuf};

use agent_utils_client::ExportOptions;
use agent_utils_core::{
    aggregate, package, package_document, DocumentFailure, DocumentFormat, ExportArchive,
    ExportBundle, ImportError, ImportReport, Upload,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use tracing::{info, warn};

use super::util::{print_json, require_truthy, write_output, Remote};
use crate::config::{GlobalArgs, Settings};

#[derive(Subcommand)]
pub enum BundleCmd {
    /// Fetch descriptor, memory, knowledge and info from the service and zip them
    Export(BundleExportArgs),
    /// Zip a bundle document already on disk (no service call)
    Package(BundlePackageArgs),
    /// Classify descriptor/knowledge/memory files and import them in one call
    Import(BundleImportArgs),
}

#[derive(Args)]
pub struct ArchiveArgs {
    /// Write archive entries as YAML instead of JSON
    #[arg(long)]
    pub yaml: bool,
    /// Directory the archive is written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

impl ArchiveArgs {
    fn format(&self) -> DocumentFormat {
        if self.yaml {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Json
        }
    }
}

#[derive(Args)]
pub struct BundleExportArgs {
    /// Include knowledge embeddings
    #[arg(long)]
    pub knode_embeddings: bool,
    /// Only export knowledge under this node
    #[arg(long)]
    pub knode_id: Option<String>,
    /// Keep the descriptor as stored instead of cleaning it
    #[arg(long)]
    pub keep_descriptor: bool,
    /// Keep API keys in the descriptor
    #[arg(long)]
    pub keep_api_keys: bool,
    #[command(flatten)]
    pub archive: ArchiveArgs,
}

impl BundleExportArgs {
    fn options(&self) -> ExportOptions {
        ExportOptions {
            knode_embeddings: self.knode_embeddings,
            knode_id: self.knode_id.clone().filter(|id| !id.trim().is_empty()),
            clean_descriptor: !self.keep_descriptor,
            remove_api_keys: !self.keep_api_keys,
            ..ExportOptions::default()
        }
    }
}

#[derive(Args)]
pub struct BundlePackageArgs {
    /// Bundle document (JSON or YAML) with descriptor, memory, knowledge and info
    pub file: PathBuf,
    #[command(flatten)]
    pub archive: ArchiveArgs,
}

#[derive(Args)]
pub struct BundleImportArgs {
    /// Descriptor, knowledge and memory documents (JSON or YAML), in upload order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Import knowledge embeddings too
    #[arg(long)]
    pub knode_embeddings: bool,
    /// Print the import request instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

/// `package` and `import --dry-run` stay local and never read connection settings.
pub fn execute(cmd: BundleCmd, global: &GlobalArgs) -> Result<()> {
    match cmd {
        BundleCmd::Export(args) => cmd_export(&Settings::load(global)?, &args),
        BundleCmd::Package(args) => cmd_package(&args),
        BundleCmd::Import(args) => cmd_import(global, &args),
    }
}

fn cmd_export(settings: &Settings, args: &BundleExportArgs) -> Result<()> {
    let mut remote = Remote::connect(settings)?;
    let target = remote.target()?;
    let result =
        remote
            .client
            .export_agent_utils(&mut remote.session, &target, &args.options())?;
    let result = require_truthy(
        result,
        "Failed to export agent. Please check your inputs and try again.",
    )?;
    let bundle = ExportBundle::from_document(result).context("export result is incomplete")?;
    let archive = package(&bundle, args.archive.format())?;
    save_archive(&args.archive.out, &archive)
}

fn cmd_package(args: &BundlePackageArgs) -> Result<()> {
    let upload = Upload::from_path(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let document = upload
        .decode()
        .with_context(|| format!("decoding {}", args.file.display()))?;
    let archive = package_document(document, args.archive.format())?;
    save_archive(&args.archive.out, &archive)
}

fn save_archive(dir: &Path, archive: &ExportArchive) -> Result<()> {
    let path = write_output(dir, &archive.file_name, &archive.bytes)?;
    info!(path = %path.display(), size = archive.bytes.len(), "wrote archive");
    println!("Agent exported successfully");
    println!("{}", path.display());
    Ok(())
}

fn cmd_import(global: &GlobalArgs, args: &BundleImportArgs) -> Result<()> {
    let (uploads, unreadable) = read_uploads(&args.files);
    let mut report = aggregate(&uploads, args.knode_embeddings);
    report.failures.splice(0..0, unreadable);
    print_report_problems(&report);

    if report.request.is_empty() {
        bail!("nothing to import: no descriptor, knowledge or memory document was recognised");
    }
    for placement in &report.placements {
        println!("{}: {}", placement.document, placement.category);
    }
    if args.dry_run {
        return print_json(&report.request);
    }

    let mut remote = Remote::connect(&Settings::load(global)?)?;
    let target = remote.target()?;
    let result = remote
        .client
        .import_agent_utils(&mut remote.session, &target, &report.request)?;
    require_truthy(
        result,
        "Failed to import agent. Ensure that the files are valid YAML or JSON.",
    )?;
    println!("Agent imported successfully");
    Ok(())
}

/// Read every path; files that cannot be read become per-document failures.
fn read_uploads(paths: &[PathBuf]) -> (Vec<Upload>, Vec<DocumentFailure>) {
    let mut uploads = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in paths {
        match Upload::from_path(path) {
            Ok(upload) => uploads.push(upload),
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable upload");
                unreadable.push(DocumentFailure {
                    document: path.display().to_string(),
                    error: ImportError::Read(err),
                });
            }
        }
    }
    (uploads, unreadable)
}

fn print_report_problems(report: &ImportReport) {
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    for overwrite in &report.overwrites {
        eprintln!("warning: {overwrite}");
    }
    for failure in &report.failures {
        eprintln!("warning: {}: {}", failure.document, failure.error);
    }
}
