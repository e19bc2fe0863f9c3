use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of payload an uploaded document appears to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Descriptor,
    Knowledge,
    Memory,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Descriptor => "descriptor",
            Category::Knowledge => "knowledge",
            Category::Memory => "memory",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guess the category of a document from shallow structural signals.
///
/// A mapping is a descriptor when it has both `actions` and `name`. For a
/// sequence, the first mapping item carrying `metadata` + `text` (knowledge)
/// or `frame` (memory) decides the category for the whole list; later items
/// are not consulted. Everything else is [`Category::Unknown`].
pub fn classify(document: &Value) -> Category {
    match document {
        Value::Object(map) => {
            if map.contains_key("actions") && map.contains_key("name") {
                Category::Descriptor
            } else {
                Category::Unknown
            }
        }
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .find_map(classify_item)
            .unwrap_or(Category::Unknown),
        _ => Category::Unknown,
    }
}

fn classify_item(item: &Map<String, Value>) -> Option<Category> {
    if item.contains_key("metadata") && item.contains_key("text") {
        Some(Category::Knowledge)
    } else if item.contains_key("frame") {
        Some(Category::Memory)
    } else {
        None
    }
}
