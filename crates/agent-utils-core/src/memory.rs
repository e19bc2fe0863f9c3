use serde_json::Value;

use crate::document::DocumentFormat;
use crate::error::PackageError;

/// Number of memory entries shown before the operator downloads the full dump.
pub const MEMORY_PREVIEW_LEN: usize = 2;

/// Rendered result of an `export memory` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryExport {
    pub format: DocumentFormat,
    pub file_name: String,
    /// The whole export result, serialized.
    pub contents: String,
    pub preview: Vec<Value>,
}

/// Render an export-memory result for download.
///
/// The result must carry a `memory` key. The full result is serialized (not
/// just the memory list) so any metadata the service returns is kept.
pub fn render_memory_export(
    result: &Value,
    format: DocumentFormat,
) -> Result<MemoryExport, PackageError> {
    let memory = result
        .get("memory")
        .ok_or_else(|| PackageError::MissingSection("memory".to_string()))?;
    let preview = memory
        .as_array()
        .map(|entries| entries.iter().take(MEMORY_PREVIEW_LEN).cloned().collect())
        .unwrap_or_default();
    let contents = format
        .encode(result)
        .map_err(|source| PackageError::Serialization {
            section: "memory".to_string(),
            source,
        })?;
    Ok(MemoryExport {
        format,
        file_name: format!("exported_memory.{}", format.extension()),
        contents,
        preview,
    })
}
