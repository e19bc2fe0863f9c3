use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::classify::{classify, Category};
use crate::document::{Document, DocumentFormat};
use crate::error::ImportError;

const OCTET_STREAM: &str = "application/octet-stream";

/// A document as uploaded by the operator, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    /// Unrecognised extensions are declared as `application/octet-stream`.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let media_type = DocumentFormat::from_path(path)
            .map(DocumentFormat::media_type)
            .unwrap_or(OCTET_STREAM);
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, media_type, bytes))
    }

    /// Decode the upload according to its declared media type.
    pub fn decode(&self) -> Result<Document, ImportError> {
        let format = DocumentFormat::from_media_type(&self.media_type)
            .ok_or_else(|| ImportError::UnsupportedFormat(self.media_type.clone()))?;
        format.decode(&self.bytes).map_err(ImportError::Decode)
    }
}

/// Payload for the service's `import agent utils` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub daf_descriptor: Map<String, Value>,
    #[serde(default)]
    pub daf_knowledge: Vec<Value>,
    #[serde(default)]
    pub daf_memory: Vec<Value>,
    #[serde(default)]
    pub knode_embeddings: bool,
}

impl ImportRequest {
    pub fn is_empty(&self) -> bool {
        self.daf_descriptor.is_empty()
            && self.daf_knowledge.is_empty()
            && self.daf_memory.is_empty()
    }
}

/// A document that decoded fine but matched no category; it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportWarning {
    pub document: String,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: not a descriptor, knowledge or memory document; skipped",
            self.document
        )
    }
}

/// A later upload took over a slot an earlier upload had already filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overwrite {
    pub category: Category,
    pub replaced: String,
    pub by: String,
}

impl std::fmt::Display for Overwrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} replaces {} as the {} document",
            self.by, self.replaced, self.category
        )
    }
}

/// A document that could not be read or decoded.
#[derive(Debug)]
pub struct DocumentFailure {
    pub document: String,
    pub error: ImportError,
}

/// Which slot a document was classified into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub document: String,
    pub category: Category,
}

/// Outcome of aggregating a batch of uploads.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub request: ImportRequest,
    pub placements: Vec<Placement>,
    pub warnings: Vec<ImportWarning>,
    pub overwrites: Vec<Overwrite>,
    pub failures: Vec<DocumentFailure>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.overwrites.is_empty() && self.failures.is_empty()
    }
}

/// Decode, classify and slot a batch of uploads in order.
///
/// Later documents of the same category replace earlier ones and each
/// replacement is recorded in [`ImportReport::overwrites`]. Unsupported
/// media types and undecodable bytes are recorded per document and do not
/// stop the batch. `knode_embeddings` only survives into the request when
/// some document landed in the knowledge slot.
pub fn aggregate(uploads: &[Upload], knode_embeddings: bool) -> ImportReport {
    let mut slots = Slots::default();
    for upload in uploads {
        match upload.decode() {
            Ok(document) => slots.place(&upload.name, document),
            Err(error) => {
                warn!(document = %upload.name, %error, "skipping upload");
                slots.failures.push(DocumentFailure {
                    document: upload.name.clone(),
                    error,
                });
            }
        }
    }
    slots.finish(knode_embeddings)
}

/// Same as [`aggregate`] for documents that are already decoded.
pub fn aggregate_documents<I, S>(documents: I, knode_embeddings: bool) -> ImportReport
where
    I: IntoIterator<Item = (S, Document)>,
    S: Into<String>,
{
    let mut slots = Slots::default();
    for (name, document) in documents {
        slots.place(&name.into(), document);
    }
    slots.finish(knode_embeddings)
}

#[derive(Default)]
struct Slots {
    descriptor: Option<Filled<Map<String, Value>>>,
    knowledge: Option<Filled<Vec<Value>>>,
    memory: Option<Filled<Vec<Value>>>,
    placements: Vec<Placement>,
    warnings: Vec<ImportWarning>,
    overwrites: Vec<Overwrite>,
    failures: Vec<DocumentFailure>,
}

/// Slot contents plus the upload they came from.
struct Filled<T> {
    document: String,
    value: T,
}

impl Slots {
    fn place(&mut self, name: &str, document: Document) {
        let category = match (classify(&document), document) {
            (Category::Descriptor, Value::Object(map)) => {
                fill(&mut self.descriptor, &mut self.overwrites, map, name, Category::Descriptor);
                Category::Descriptor
            }
            (Category::Knowledge, Value::Array(items)) => {
                fill(&mut self.knowledge, &mut self.overwrites, items, name, Category::Knowledge);
                Category::Knowledge
            }
            (Category::Memory, Value::Array(items)) => {
                fill(&mut self.memory, &mut self.overwrites, items, name, Category::Memory);
                Category::Memory
            }
            _ => {
                warn!(document = %name, "could not classify upload; skipping");
                self.warnings.push(ImportWarning {
                    document: name.to_string(),
                });
                Category::Unknown
            }
        };
        self.placements.push(Placement {
            document: name.to_string(),
            category,
        });
    }

    fn finish(self, knode_embeddings: bool) -> ImportReport {
        let has_knowledge = self.knowledge.is_some();
        let request = ImportRequest {
            daf_descriptor: self.descriptor.map(|slot| slot.value).unwrap_or_default(),
            daf_knowledge: self.knowledge.map(|slot| slot.value).unwrap_or_default(),
            daf_memory: self.memory.map(|slot| slot.value).unwrap_or_default(),
            knode_embeddings: knode_embeddings && has_knowledge,
        };
        debug!(
            placed = self.placements.len(),
            warnings = self.warnings.len(),
            overwrites = self.overwrites.len(),
            failures = self.failures.len(),
            "aggregated import request"
        );
        ImportReport {
            request,
            placements: self.placements,
            warnings: self.warnings,
            overwrites: self.overwrites,
            failures: self.failures,
        }
    }
}

fn fill<T>(
    slot: &mut Option<Filled<T>>,
    overwrites: &mut Vec<Overwrite>,
    value: T,
    name: &str,
    category: Category,
) {
    let filled = Filled {
        document: name.to_string(),
        value,
    };
    if let Some(previous) = slot.replace(filled) {
        warn!(
            document = %name,
            replaced = %previous.document,
            category = %category,
            "slot already filled by an earlier upload; replacing it"
        );
        overwrites.push(Overwrite {
            category,
            replaced: previous.document,
            by: name.to_string(),
        });
    }
}
