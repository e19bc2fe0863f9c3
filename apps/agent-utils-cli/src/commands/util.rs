use std::fs;
use std::path::{Path, PathBuf};

use agent_utils_client::{is_truthy, AgentClient, AgentTarget, Session};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::Settings;

/// Client, session and settings for commands that talk to the service.
pub(crate) struct Remote {
    pub client: AgentClient,
    pub session: Session,
    pub settings: Settings,
}

impl Remote {
    pub(crate) fn connect(settings: &Settings) -> Result<Self> {
        let client = AgentClient::new(&settings.base_url, settings.timeout)
            .context("building HTTP client")?;
        Ok(Self {
            client,
            session: Session::new(settings.token.clone()),
            settings: settings.clone(),
        })
    }

    pub(crate) fn agent_id(&self) -> Result<String> {
        self.settings.require_agent_id().map(str::to_string)
    }

    pub(crate) fn target(&self) -> Result<AgentTarget> {
        Ok(AgentTarget::new(
            self.agent_id()?,
            self.settings.module_root.clone(),
        ))
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Fail with `message` when the walker returned an empty result.
pub(crate) fn require_truthy(result: JsonValue, message: &str) -> Result<JsonValue> {
    if !is_truthy(&result) {
        bail!("{message}");
    }
    Ok(result)
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Write `bytes` as `file_name` inside `dir`, creating the directory when needed.
pub(crate) fn write_output(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Render a JSON value for a single `key: value` line.
pub(crate) fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn require_truthy_rejects_empty_results() {
        assert!(require_truthy(json!({}), "nothing").is_err());
        assert!(require_truthy(json!(null), "nothing").is_err());
        assert_eq!(
            require_truthy(json!({"ok": true}), "nothing").expect("truthy"),
            json!({"ok": true})
        );
    }

    #[test]
    fn write_output_creates_missing_dirs() {
        let tmp = tempdir().expect("tmpdir");
        let dir = tmp.path().join("nested/out");
        let path = write_output(&dir, "a.zip", b"PK").expect("write");
        assert_eq!(fs::read(path).expect("read back"), b"PK");
    }

    #[test]
    fn display_value_unquotes_strings() {
        assert_eq!(display_value(&json!("ok")), "ok");
        assert_eq!(display_value(&json!(3)), "3");
    }
}
