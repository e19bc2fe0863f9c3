use thiserror::Error;

/// Failure to move a document between its in-memory form and JSON/YAML text.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[source] serde_yaml::Error),
}

/// Errors raised while packaging an export bundle into an archive.
///
/// Any of these aborts the whole export; no partial archive is returned.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("export bundle is missing the `{0}` section")]
    MissingSection(String),
    #[error("failed to serialize `{section}` section: {source}")]
    Serialization {
        section: String,
        #[source]
        source: CodecError,
    },
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Per-document errors raised by the import aggregator.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(
        "unsupported media type `{0}` (expected application/json, text/yaml or application/x-yaml)"
    )]
    UnsupportedFormat(String),
    #[error("could not decode document: {0}")]
    Decode(#[source] CodecError),
    #[error("could not read document: {0}")]
    Read(#[source] std::io::Error),
}
