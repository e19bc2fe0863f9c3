use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MESSAGE_LIMIT: i64 = 1024;
pub const DEFAULT_FLOOD_BLOCK_TIME: i64 = 300;
pub const DEFAULT_WINDOW_TIME: i64 = 300;
pub const DEFAULT_FLOOD_THRESHOLD: i64 = 4;
pub const DEFAULT_FRAME_SIZE: i64 = 10;
pub const DEFAULT_TTS_ACTION: &str = "ElevenlabsTTSAction";
pub const DEFAULT_STT_ACTION: &str = "DeepgramSTTAction";
pub const DEFAULT_VECTOR_STORE_ACTION: &str = "TypesenseVectorStoreAction";

/// Editable agent settings, as sent to the service's `update agent` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub description: String,
    pub jpr_api_key: String,
    /// Messages allowed within `window_time`.
    pub message_limit: i64,
    /// Seconds interactions stay blocked after a flood is detected.
    pub flood_block_time: i64,
    /// Seconds in the flood monitoring window.
    pub window_time: i64,
    pub flood_threshold: i64,
    /// Interactions kept in a frame before auto-pruning.
    pub frame_size: i64,
    pub tts_action: String,
    pub stt_action: String,
    pub vector_store_action: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            jpr_api_key: String::new(),
            message_limit: DEFAULT_MESSAGE_LIMIT,
            flood_block_time: DEFAULT_FLOOD_BLOCK_TIME,
            window_time: DEFAULT_WINDOW_TIME,
            flood_threshold: DEFAULT_FLOOD_THRESHOLD,
            frame_size: DEFAULT_FRAME_SIZE,
            tts_action: DEFAULT_TTS_ACTION.to_string(),
            stt_action: DEFAULT_STT_ACTION.to_string(),
            vector_store_action: DEFAULT_VECTOR_STORE_ACTION.to_string(),
        }
    }
}

impl AgentConfig {
    /// Build the form from a `get agent` response.
    ///
    /// Missing fields take their defaults. Numeric fields accept JSON numbers
    /// or numeric strings; anything else falls back to the default.
    pub fn from_agent(agent: &Value) -> Self {
        let defaults = Self::default();
        Self {
            name: text_field(agent, "name", &defaults.name),
            description: text_field(agent, "description", &defaults.description),
            jpr_api_key: text_field(agent, "jpr_api_key", &defaults.jpr_api_key),
            message_limit: int_field(agent, "message_limit", defaults.message_limit),
            flood_block_time: int_field(agent, "flood_block_time", defaults.flood_block_time),
            window_time: int_field(agent, "window_time", defaults.window_time),
            flood_threshold: int_field(agent, "flood_threshold", defaults.flood_threshold),
            frame_size: int_field(agent, "frame_size", defaults.frame_size),
            tts_action: text_field(agent, "tts_action", &defaults.tts_action),
            stt_action: text_field(agent, "stt_action", &defaults.stt_action),
            vector_store_action: text_field(
                agent,
                "vector_store_action",
                &defaults.vector_store_action,
            ),
        }
    }

    pub fn apply(&mut self, patch: AgentConfigPatch) {
        let AgentConfigPatch {
            name,
            description,
            jpr_api_key,
            message_limit,
            flood_block_time,
            window_time,
            flood_threshold,
            frame_size,
            tts_action,
            stt_action,
            vector_store_action,
        } = patch;
        replace(&mut self.name, name);
        replace(&mut self.description, description);
        replace(&mut self.jpr_api_key, jpr_api_key);
        replace(&mut self.message_limit, message_limit);
        replace(&mut self.flood_block_time, flood_block_time);
        replace(&mut self.window_time, window_time);
        replace(&mut self.flood_threshold, flood_threshold);
        replace(&mut self.frame_size, frame_size);
        replace(&mut self.tts_action, tts_action);
        replace(&mut self.stt_action, stt_action);
        replace(&mut self.vector_store_action, vector_store_action);
    }
}

/// Operator-supplied changes; `None` leaves the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentConfigPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub jpr_api_key: Option<String>,
    pub message_limit: Option<i64>,
    pub flood_block_time: Option<i64>,
    pub window_time: Option<i64>,
    pub flood_threshold: Option<i64>,
    pub frame_size: Option<i64>,
    pub tts_action: Option<String>,
    pub stt_action: Option<String>,
    pub vector_store_action: Option<String>,
}

impl AgentConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn replace<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn text_field(agent: &Value, key: &str, default: &str) -> String {
    match agent.get(key) {
        Some(Value::String(text)) => text.clone(),
        None | Some(Value::Null) => default.to_string(),
        Some(other) => other.to_string(),
    }
}

fn int_field(agent: &Value, key: &str, default: i64) -> i64 {
    match agent.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(default),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(default),
        _ => default,
    }
}
