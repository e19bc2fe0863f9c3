use std::time::Duration;

use agent_utils_core::{AgentConfig, ImportRequest};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::session::Session;
use crate::types::{AgentTarget, DafExportOptions, ExportOptions, HealthReport};

/// Path of the endpoint that dispatches action walkers.
const ACTION_WALKER_PATH: &str = "action/walker";

/// Blocking client for the agent-management API.
///
/// One HTTP request per call, no retries. Every call takes the [`Session`]
/// explicitly; a 401 invalidates it before the error is returned.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: Client,
    base: String,
}

impl AgentClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// `POST {base}/walker/{name}`; returns the first report when the
    /// response carries a `reports` list.
    pub fn call_walker<B: Serialize + ?Sized>(
        &self,
        session: &mut Session,
        walker: &str,
        body: &B,
    ) -> Result<Value, ClientError> {
        let path = format!("walker/{walker}");
        let (url, status, text) = self.post(session, &path, body)?;
        let value = parse_success(&url, status, &text)?;
        Ok(first_report(value))
    }

    /// Run an action walker on the target agent.
    pub fn call_action_walker<A: Serialize + ?Sized>(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        walker: &str,
        args: &A,
    ) -> Result<Value, ClientError> {
        let args = serde_json::to_value(args).map_err(|source| ClientError::Decode {
            url: self.url(ACTION_WALKER_PATH),
            source,
        })?;
        let body = json!({
            "agent_id": target.agent_id,
            "module_root": target.module_root,
            "walker": walker,
            "args": args,
        });
        let (url, status, text) = self.post(session, ACTION_WALKER_PATH, &body)?;
        let value = parse_success(&url, status, &text)?;
        Ok(first_report(value))
    }

    pub fn get_agent(&self, session: &mut Session, agent_id: &str) -> Result<Value, ClientError> {
        self.call_walker(session, "get_agent", &json!({ "agent_id": agent_id }))
    }

    pub fn update_agent(
        &self,
        session: &mut Session,
        agent_id: &str,
        config: &AgentConfig,
    ) -> Result<Value, ClientError> {
        self.call_walker(
            session,
            "update_agent",
            &json!({ "agent_id": agent_id, "agent_data": config }),
        )
    }

    /// Import an agent from descriptor text (YAML or JSON).
    pub fn import_agent(
        &self,
        session: &mut Session,
        descriptor: &str,
    ) -> Result<Value, ClientError> {
        self.call_walker(session, "import_agent", &json!({ "descriptor": descriptor }))
    }

    /// Import a published DAF package by name and version.
    pub fn import_daf(
        &self,
        session: &mut Session,
        daf_name: &str,
        daf_version: &str,
    ) -> Result<Value, ClientError> {
        self.call_walker(
            session,
            "import_agent",
            &json!({ "daf_name": daf_name, "daf_version": daf_version }),
        )
    }

    /// Ask the service for a DAF download link; `None` when it returned no report.
    pub fn export_daf(
        &self,
        session: &mut Session,
        agent_id: &str,
        options: &DafExportOptions,
    ) -> Result<Option<String>, ClientError> {
        let report = self.call_walker(
            session,
            "export_daf",
            &json!({
                "agent_id": agent_id,
                "clean": options.clean,
                "with_memory": options.with_memory,
                "with_knowledge": options.with_knowledge,
                "reporting": true,
            }),
        )?;
        Ok(report.as_str().map(str::to_string))
    }

    pub fn init_agents(&self, session: &mut Session) -> Result<Value, ClientError> {
        self.call_walker(session, "init_agents", &json!({}))
    }

    /// Agent healthcheck. Both 200 and 503 carry a JSON report.
    pub fn healthcheck(
        &self,
        session: &mut Session,
        agent_id: &str,
        trace: bool,
    ) -> Result<HealthReport, ClientError> {
        let body = json!({ "agent_id": agent_id, "reporting": true, "trace": trace });
        let (url, status, text) = self.post(session, "walker/healthcheck", &body)?;
        if status != StatusCode::OK && status != StatusCode::SERVICE_UNAVAILABLE {
            return Err(status_error(&url, status, &text));
        }
        let body = first_report(parse_json(&url, &text)?);
        Ok(HealthReport {
            status: status.as_u16(),
            body,
        })
    }

    pub fn memory_healthcheck(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        session_id: &str,
        verbose: Option<bool>,
    ) -> Result<Value, ClientError> {
        let mut args = json!({ "session_id": session_id });
        if let Some(verbose) = verbose {
            args["verbose"] = Value::Bool(verbose);
        }
        self.call_action_walker(session, target, "memory_healthcheck", &args)
    }

    pub fn purge_memory(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        session_id: &str,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(
            session,
            target,
            "purge_memory",
            &json!({ "session_id": session_id }),
        )
    }

    pub fn refresh_memory(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        session_id: &str,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(
            session,
            target,
            "refresh_memory",
            &json!({ "session_id": session_id }),
        )
    }

    pub fn export_memory(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        session_id: &str,
        as_json: bool,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(
            session,
            target,
            "export_memory",
            &json!({ "session_id": session_id, "json": as_json }),
        )
    }

    /// Import memory from raw YAML/JSON text. The service spells the flag `overwite`.
    pub fn import_memory(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        data: &str,
        overwrite: bool,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(
            session,
            target,
            "import_memory",
            &json!({ "data": data, "overwite": overwrite }),
        )
    }

    pub fn get_logging(
        &self,
        session: &mut Session,
        target: &AgentTarget,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(session, target, "get_logging", &json!({}))
    }

    pub fn set_logging(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        agent_logging: bool,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(
            session,
            target,
            "set_logging",
            &json!({ "agent_logging": agent_logging }),
        )
    }

    pub fn delete_agent(
        &self,
        session: &mut Session,
        target: &AgentTarget,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(
            session,
            target,
            "delete_agent",
            &json!({ "agent_id": target.agent_id }),
        )
    }

    /// Fetch the descriptor/memory/knowledge/info bundle for packaging.
    pub fn export_agent_utils(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        options: &ExportOptions,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(session, target, "export_agent", options)
    }

    pub fn import_agent_utils(
        &self,
        session: &mut Session,
        target: &AgentTarget,
        request: &ImportRequest,
    ) -> Result<Value, ClientError> {
        self.call_action_walker(session, target, "import_agent", request)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn post<B: Serialize + ?Sized>(
        &self,
        session: &mut Session,
        path: &str,
        body: &B,
    ) -> Result<(String, StatusCode, String), ClientError> {
        let url = self.url(path);
        debug!(%url, authenticated = session.is_authenticated(), "POST");
        let resp = with_bearer(self.http.post(&url), session.token())
            .json(body)
            .send()
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = resp.status();
        let text = resp.text().map_err(|source| ClientError::Transport {
            url: url.clone(),
            source,
        })?;
        if status == StatusCode::UNAUTHORIZED {
            warn!(%url, "session rejected; clearing cached token");
            session.invalidate();
            return Err(ClientError::Unauthorized);
        }
        debug!(%url, status = status.as_u16(), bytes = text.len(), "response");
        Ok((url, status, text))
    }
}

fn with_bearer(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(tok) => req.bearer_auth(tok),
        None => req,
    }
}

fn parse_success(url: &str, status: StatusCode, text: &str) -> Result<Value, ClientError> {
    if !status.is_success() {
        return Err(status_error(url, status, text));
    }
    parse_json(url, text)
}

fn parse_json(url: &str, text: &str) -> Result<Value, ClientError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

fn status_error(url: &str, status: StatusCode, text: &str) -> ClientError {
    ClientError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body: text.trim().to_string(),
    }
}

/// Unwrap `{"reports": [first, ..]}` envelopes; other bodies pass through.
fn first_report(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("reports").is_some_and(Value::is_array) => {
            match map.remove("reports") {
                Some(Value::Array(reports)) => reports.into_iter().next().unwrap_or(Value::Null),
                _ => Value::Null,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> AgentClient {
        AgentClient::new(&server.base_url(), Duration::from_secs(5)).expect("client")
    }

    fn target() -> AgentTarget {
        AgentTarget::new("agent-1", "jivas/agent_utils_action")
    }

    #[test]
    fn first_report_unwraps_envelopes() {
        assert_eq!(first_report(json!({"reports": [1, 2]})), json!(1));
        assert_eq!(first_report(json!({"reports": []})), Value::Null);
        assert_eq!(first_report(json!({"name": "x"})), json!({"name": "x"}));
        assert_eq!(
            first_report(json!({"reports": "not a list"})),
            json!({"reports": "not a list"})
        );
    }

    #[test]
    fn get_agent_sends_bearer_and_unwraps_report() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/walker/get_agent")
                .header("authorization", "Bearer tok-1")
                .json_body(json!({"agent_id": "agent-1"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"reports": [{"name": "Concierge", "frame_size": 12}]}));
        });

        let mut session = Session::new(Some("tok-1".into()));
        let agent = client(&server)
            .get_agent(&mut session, "agent-1")
            .expect("get agent");
        mock.assert();
        assert_eq!(agent["name"], json!("Concierge"));
        assert!(session.is_authenticated());
    }

    #[test]
    fn unauthorized_response_invalidates_session() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/action/walker");
            then.status(401).body("token expired");
        });

        let mut session = Session::new(Some("stale".into()));
        let err = client(&server)
            .purge_memory(&mut session, &target(), "")
            .expect_err("401");
        assert!(err.is_unauthorized());
        assert!(session.was_invalidated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn action_walker_body_carries_target_and_args() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/action/walker").json_body(json!({
                "agent_id": "agent-1",
                "module_root": "jivas/agent_utils_action",
                "walker": "import_memory",
                "args": {"data": "- frame: f\n", "overwite": true}
            }));
            then.status(200).json_body(json!({"reports": [true]}));
        });

        let mut session = Session::anonymous();
        let result = client(&server)
            .import_memory(&mut session, &target(), "- frame: f\n", true)
            .expect("import memory");
        mock.assert();
        assert_eq!(result, json!(true));
    }

    #[test]
    fn import_agent_utils_posts_request_slots() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/action/walker").json_body(json!({
                "agent_id": "agent-1",
                "module_root": "jivas/agent_utils_action",
                "walker": "import_agent",
                "args": {
                    "daf_descriptor": {},
                    "daf_knowledge": [],
                    "daf_memory": [{"frame": "f"}],
                    "knode_embeddings": false
                }
            }));
            then.status(200).json_body(json!({"reports": [{"ok": true}]}));
        });

        let request = ImportRequest {
            daf_memory: vec![json!({"frame": "f"})],
            ..Default::default()
        };
        let mut session = Session::anonymous();
        client(&server)
            .import_agent_utils(&mut session, &target(), &request)
            .expect("import");
        mock.assert();
    }

    #[test]
    fn degraded_healthcheck_is_a_report_not_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/walker/healthcheck")
                .json_body(json!({"agent_id": "agent-1", "reporting": true, "trace": false}));
            then.status(503)
                .json_body(json!({"status": 503, "errors": ["stt action missing"]}));
        });

        let mut session = Session::anonymous();
        let report = client(&server)
            .healthcheck(&mut session, "agent-1", false)
            .expect("report");
        assert_eq!(report.status, 503);
        assert!(!report.is_healthy());
        assert_eq!(report.body["errors"][0], json!("stt action missing"));
    }

    #[test]
    fn server_errors_surface_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/walker/init_agents");
            then.status(500).body("boom\n");
        });

        let mut session = Session::anonymous();
        let err = client(&server)
            .init_agents(&mut session)
            .expect_err("500");
        match err {
            ClientError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn export_daf_returns_download_link() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/walker/export_daf").json_body(json!({
                "agent_id": "agent-1",
                "clean": true,
                "with_memory": true,
                "with_knowledge": false,
                "reporting": true
            }));
            then.status(200)
                .json_body(json!({"reports": ["https://files.example/agent-1.zip"]}));
        });

        let mut session = Session::anonymous();
        let options = DafExportOptions {
            with_memory: true,
            ..Default::default()
        };
        let url = client(&server)
            .export_daf(&mut session, "agent-1", &options)
            .expect("export daf");
        assert_eq!(url.as_deref(), Some("https://files.example/agent-1.zip"));
    }
}
