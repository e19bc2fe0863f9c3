//! Pure transformations behind the agent utilities: payload classification,
//! export bundle packaging and import request aggregation.
//!
//! Nothing in this crate performs network I/O. Callers hand in decoded
//! documents (or raw upload bytes) and get fresh values back.

pub mod agent;
pub mod classify;
pub mod document;
mod error;
pub mod export;
pub mod import;
pub mod memory;

pub use agent::{AgentConfig, AgentConfigPatch};
pub use classify::{classify, Category};
pub use document::{Document, DocumentFormat, SUPPORTED_MEDIA_TYPES};
pub use error::{CodecError, ImportError, PackageError};
pub use export::{
    archive_file_name, package, package_document, unpack, ArchiveEntry, ExportArchive,
    ExportBundle, BUNDLE_SECTIONS,
};
pub use import::{
    aggregate, aggregate_documents, DocumentFailure, ImportReport, ImportRequest, ImportWarning,
    Overwrite, Placement, Upload,
};
pub use memory::{render_memory_export, MemoryExport, MEMORY_PREVIEW_LEN};
