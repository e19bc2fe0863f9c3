use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::CodecError;

/// A decoded JSON or YAML value. Mappings keep their insertion order.
pub type Document = Value;

/// Media types accepted for uploaded documents.
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &["application/json", "text/yaml", "application/x-yaml"];

const JSON_INDENT: &[u8] = b"    ";

/// Text formats a document can be decoded from and serialized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Resolve a declared media type. Parameters (`; charset=..`) and case are ignored.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(DocumentFormat::Json),
            "text/yaml" | "application/x-yaml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }

    /// Infer the format from a file extension (`.json`, `.yaml`, `.yml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(DocumentFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Some(DocumentFormat::Yaml)
            }
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Yaml => "yaml",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::Json => "application/json",
            DocumentFormat::Yaml => "application/x-yaml",
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Document, CodecError> {
        match self {
            DocumentFormat::Json => serde_json::from_slice(bytes).map_err(CodecError::Json),
            DocumentFormat::Yaml => serde_yaml::from_slice(bytes).map_err(CodecError::Yaml),
        }
    }

    /// Serialize a value. JSON is pretty-printed with four-space indentation.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<String, CodecError> {
        match self {
            DocumentFormat::Json => {
                let mut buf = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(
                    &mut buf,
                    PrettyFormatter::with_indent(JSON_INDENT),
                );
                value.serialize(&mut ser).map_err(CodecError::Json)?;
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(CodecError::Yaml),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn media_types_resolve_to_formats() {
        assert_eq!(
            DocumentFormat::from_media_type("application/json"),
            Some(DocumentFormat::Json)
        );
        assert_eq!(
            DocumentFormat::from_media_type("text/yaml"),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_media_type("Application/X-YAML; charset=utf-8"),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(DocumentFormat::from_media_type("text/plain"), None);
        assert_eq!(DocumentFormat::from_media_type(""), None);
    }

    #[test]
    fn extensions_resolve_to_formats() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("agent.YML")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("dir/memory.json")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn yaml_decode_keeps_key_order() {
        let doc = DocumentFormat::Yaml
            .decode(b"zeta: 1\nalpha: 2\nmid: 3\n")
            .expect("yaml decodes");
        let keys: Vec<&str> = doc
            .as_object()
            .expect("mapping")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn json_encode_uses_four_space_indent() {
        let text = DocumentFormat::Json
            .encode(&json!({"a": {"b": 1}}))
            .expect("encode");
        assert!(text.contains("\n    \"a\": {\n        \"b\": 1"), "{text}");
    }

    #[test]
    fn decode_reports_invalid_input() {
        assert!(matches!(
            DocumentFormat::Json.decode(b"{not json"),
            Err(CodecError::Json(_))
        ));
        assert!(matches!(
            DocumentFormat::Yaml.decode(b"key: [unterminated"),
            Err(CodecError::Yaml(_))
        ));
    }
}
