use serde::Serialize;
use serde_json::Value;

/// The agent and action module that action walkers run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTarget {
    pub agent_id: String,
    pub module_root: String,
}

impl AgentTarget {
    pub fn new(agent_id: impl Into<String>, module_root: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            module_root: module_root.into(),
        }
    }
}

/// Arguments for the `export agent utils` action walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOptions {
    pub knode_embeddings: bool,
    pub export_json: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knode_id: Option<String>,
    pub clean_descriptor: bool,
    pub remove_api_keys: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            knode_embeddings: false,
            export_json: true,
            knode_id: None,
            clean_descriptor: true,
            remove_api_keys: true,
        }
    }
}

/// Arguments for the `export_daf` walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DafExportOptions {
    pub clean: bool,
    pub with_memory: bool,
    pub with_knowledge: bool,
}

impl Default for DafExportOptions {
    fn default() -> Self {
        Self {
            clean: true,
            with_memory: false,
            with_knowledge: false,
        }
    }
}

/// Outcome of an agent healthcheck. The service answers 503 with a report
/// when the agent is degraded, so that status is not treated as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: u16,
    pub body: Value,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        if self.status != 200 {
            return false;
        }
        match self.body.get("status").and_then(Value::as_u64) {
            Some(reported) => reported == 200,
            None => true,
        }
    }
}

/// Whether a walker result counts as success. Empty results (null, false,
/// zero, empty string/list/map) are how the service reports "nothing done".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_matches_empty_results() {
        for falsy in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(!is_truthy(&falsy), "{falsy}");
        }
        for truthy in [json!(true), json!(1), json!("ok"), json!([0]), json!({"a": 1})] {
            assert!(is_truthy(&truthy), "{truthy}");
        }
    }

    #[test]
    fn health_requires_http_and_reported_status_ok() {
        let ok = HealthReport {
            status: 200,
            body: json!({"status": 200}),
        };
        assert!(ok.is_healthy());
        let degraded = HealthReport {
            status: 503,
            body: json!({"status": 503}),
        };
        assert!(!degraded.is_healthy());
        let reported_bad = HealthReport {
            status: 200,
            body: json!({"status": 500}),
        };
        assert!(!reported_bad.is_healthy());
    }

    #[test]
    fn export_options_omit_unset_knode_id() {
        let value = serde_json::to_value(ExportOptions::default()).expect("serialize");
        assert_eq!(
            value,
            json!({
                "knode_embeddings": false,
                "export_json": true,
                "clean_descriptor": true,
                "remove_api_keys": true
            })
        );
    }
}
