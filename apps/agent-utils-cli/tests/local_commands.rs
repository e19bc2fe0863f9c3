use agent_utils_core::unpack;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn bin() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("agent-utils").expect("binary");
    cmd.env_remove("AGENT_UTILS_CONFIG")
        .env_remove("AGENT_UTILS_BASE_URL")
        .env_remove("AGENT_UTILS_TOKEN")
        .env_remove("AGENT_UTILS_AGENT_ID");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

const DESCRIPTOR_YAML: &str = "name: demo\nactions:\n  - action: jivas/intro_interact_action\n";
const KNOWLEDGE_JSON: &str = r#"[{"text": "Opening hours are 9-5", "metadata": {"source": "faq"}}]"#;
const MEMORY_JSON: &str = r#"[{"frame": "f-1", "interactions": []}]"#;

#[test]
fn classify_reports_each_document() {
    let tmp = tempdir().expect("tmpdir");
    let descriptor = write(tmp.path(), "agent.yaml", DESCRIPTOR_YAML);
    let knowledge = write(tmp.path(), "knowledge.json", KNOWLEDGE_JSON);
    let other = write(tmp.path(), "notes.json", r#"{"title": "not an agent"}"#);

    bin()
        .arg("classify")
        .arg(&descriptor)
        .arg(&knowledge)
        .arg(&other)
        .assert()
        .success()
        .stdout(predicate::str::contains("agent.yaml: descriptor"))
        .stdout(predicate::str::contains("knowledge.json: knowledge"))
        .stdout(predicate::str::contains("notes.json: unknown"));
}

#[test]
fn classify_json_marks_undecodable_files() {
    let tmp = tempdir().expect("tmpdir");
    let broken = write(tmp.path(), "broken.json", "{not json");
    let text = write(tmp.path(), "readme.txt", "hello");

    let output = bin()
        .arg("classify")
        .arg("--json")
        .arg(&broken)
        .arg(&text)
        .output()
        .expect("run classify");
    assert!(output.status.success());
    let rows: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(rows[0]["document"], json!("broken.json"));
    assert_eq!(rows[0]["category"], Value::Null);
    assert!(rows[0]["error"].is_string());
    assert!(rows[1]["error"]
        .as_str()
        .is_some_and(|err| err.contains("application/octet-stream")));
}

#[test]
fn bundle_package_writes_named_archive() {
    let tmp = tempdir().expect("tmpdir");
    let bundle = json!({
        "descriptor": {"name": "demo", "actions": []},
        "memory": [{"frame": "f-1"}],
        "knowledge": [],
        "info": {"package": {"name": "acme/front-desk agent"}}
    });
    let input = write(tmp.path(), "bundle.json", &bundle.to_string());
    let out = tmp.path().join("out");

    bin()
        .arg("bundle")
        .arg("package")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("acme_front_desk_agent_daf.zip"));

    let bytes = fs::read(out.join("acme_front_desk_agent_daf.zip")).expect("archive written");
    let entries = unpack(&bytes).expect("unpack");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        ["descriptor.json", "memory.json", "knowledge.json", "info.json"]
    );
    assert!(entries[0].contents.contains("\n    \"name\": \"demo\""));
}

#[test]
fn bundle_package_yaml_entries() {
    let tmp = tempdir().expect("tmpdir");
    let input = write(
        tmp.path(),
        "bundle.yaml",
        "descriptor: {name: demo}\nmemory: []\nknowledge: []\ninfo:\n  package:\n    name: demo\n",
    );

    bin()
        .arg("bundle")
        .arg("package")
        .arg(&input)
        .arg("--yaml")
        .arg("--out")
        .arg(tmp.path())
        .assert()
        .success();

    let bytes = fs::read(tmp.path().join("demo_daf.zip")).expect("archive written");
    let entries = unpack(&bytes).expect("unpack");
    assert_eq!(entries[3].name, "info.yaml");
    assert!(entries[3].contents.contains("name: demo"));
}

#[test]
fn bundle_package_rejects_missing_section() {
    let tmp = tempdir().expect("tmpdir");
    let input = write(
        tmp.path(),
        "bundle.json",
        r#"{"descriptor": {}, "memory": [], "info": {"package": {"name": "x"}}}"#,
    );

    bin()
        .arg("bundle")
        .arg("package")
        .arg(&input)
        .arg("--out")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("knowledge"));
    assert!(!tmp.path().join("x_daf.zip").exists());
}

#[test]
fn bundle_import_dry_run_prints_request() {
    let tmp = tempdir().expect("tmpdir");
    let memory = write(tmp.path(), "memory.json", MEMORY_JSON);
    let descriptor = write(tmp.path(), "agent.yaml", DESCRIPTOR_YAML);
    let knowledge = write(tmp.path(), "knowledge.json", KNOWLEDGE_JSON);
    let stray = write(tmp.path(), "stray.json", r#"{"hello": "world"}"#);

    let output = bin()
        .arg("bundle")
        .arg("import")
        .arg("--dry-run")
        .arg("--knode-embeddings")
        .arg(&memory)
        .arg(&descriptor)
        .arg(&knowledge)
        .arg(&stray)
        .output()
        .expect("run import");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stray.json"), "stderr: {stderr}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').expect("request json");
    let request: Value = serde_json::from_str(&stdout[json_start..]).expect("parse request");
    assert_eq!(request["daf_descriptor"]["name"], json!("demo"));
    assert_eq!(request["daf_memory"][0]["frame"], json!("f-1"));
    assert_eq!(request["daf_knowledge"][0]["metadata"]["source"], json!("faq"));
    assert_eq!(request["knode_embeddings"], json!(true));
}

#[test]
fn bundle_import_without_knowledge_drops_embeddings_flag() {
    let tmp = tempdir().expect("tmpdir");
    let memory = write(tmp.path(), "memory.json", MEMORY_JSON);

    let output = bin()
        .args(["bundle", "import", "--dry-run", "--knode-embeddings"])
        .arg(&memory)
        .output()
        .expect("run import");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').expect("request json");
    let request: Value = serde_json::from_str(&stdout[json_start..]).expect("parse request");
    assert_eq!(request["knode_embeddings"], json!(false));
}

#[test]
fn bundle_import_flags_replaced_descriptor() {
    let tmp = tempdir().expect("tmpdir");
    let first = write(tmp.path(), "first.yaml", DESCRIPTOR_YAML);
    let second = write(
        tmp.path(),
        "second.json",
        r#"{"name": "second", "actions": []}"#,
    );

    let output = bin()
        .args(["bundle", "import", "--dry-run"])
        .arg(&first)
        .arg(&second)
        .output()
        .expect("run import");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("second.json replaces first.yaml as the descriptor document"),
        "stderr: {stderr}"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').expect("request json");
    let request: Value = serde_json::from_str(&stdout[json_start..]).expect("parse request");
    assert_eq!(request["daf_descriptor"]["name"], json!("second"));
}

#[test]
fn bundle_import_keeps_going_past_unreadable_file() {
    let tmp = tempdir().expect("tmpdir");
    let missing = tmp.path().join("gone.json");
    let memory = write(tmp.path(), "memory.json", MEMORY_JSON);

    let output = bin()
        .args(["bundle", "import", "--dry-run"])
        .arg(&missing)
        .arg(&memory)
        .output()
        .expect("run import");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gone.json"), "stderr: {stderr}");
    assert!(stderr.contains("could not read document"), "stderr: {stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').expect("request json");
    let request: Value = serde_json::from_str(&stdout[json_start..]).expect("parse request");
    assert_eq!(request["daf_memory"][0]["frame"], json!("f-1"));
}

#[test]
fn bundle_import_fails_when_nothing_recognised() {
    let tmp = tempdir().expect("tmpdir");
    let stray = write(tmp.path(), "stray.json", "[1, 2, 3]");

    bin()
        .args(["bundle", "import", "--dry-run"])
        .arg(&stray)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to import"));
}

#[test]
fn completions_print_script() {
    bin()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("agent-utils"));
}
