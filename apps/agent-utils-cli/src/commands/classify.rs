use std::path::PathBuf;

use agent_utils_core::{classify, Upload};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::util::print_json;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Documents to classify (JSON or YAML)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Classified {
    document: String,
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Local only: decode each file and report which import slot it would fill.
pub fn execute(args: ClassifyArgs) -> Result<()> {
    let mut rows = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let upload =
            Upload::from_path(path).with_context(|| format!("reading {}", path.display()))?;
        let row = match upload.decode() {
            Ok(document) => Classified {
                document: upload.name,
                category: Some(classify(&document).to_string()),
                error: None,
            },
            Err(err) => Classified {
                document: upload.name,
                category: None,
                error: Some(err.to_string()),
            },
        };
        rows.push(row);
    }

    if args.json {
        return print_json(&rows);
    }
    for row in &rows {
        match (&row.category, &row.error) {
            (Some(category), _) => println!("{}: {category}", row.document),
            (None, Some(error)) => println!("{}: error: {error}", row.document),
            (None, None) => println!("{}: unknown", row.document),
        }
    }
    Ok(())
}
