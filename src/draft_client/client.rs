use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::types::BridgeError;

use super::api_types::{AuthStatus, CommandOutcome, CommitOutcome, VersionRecord, CONNECTION_ERROR};

const USER_AGENT: &str = "DraftWolf-Blender/1.0";

/// JSON request/response client for the local DraftWolf app.
#[derive(Clone)]
pub struct DraftClient {
    http: Client,
    base_url: String,
}

impl DraftClient {
    pub fn new(config: &Config) -> Result<Self, BridgeError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(BridgeError::Http)?;

        Ok(Self {
            http,
            base_url: config.api_url(),
        })
    }

    /// Fire a request against the local app: POST with a JSON body when a
    /// payload is given, GET otherwise.
    ///
    /// Never fails. Transport errors and unparseable bodies come back as
    /// `{success: false, error: <message>}`; a non-2xx response with a JSON
    /// body is returned verbatim so the server's business error reaches the
    /// caller. "Server unreachable" and "server said no" are therefore
    /// indistinguishable at the type level, which is exactly the contract
    /// every caller wants here.
    pub async fn send(&self, endpoint: &str, payload: Option<&Value>) -> Value {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let request = match payload {
            Some(body) => self.http.post(&url).json(body),
            None => self.http.get(&url),
        };

        let response = match request
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                debug!(endpoint, error = %err, "Request to DraftWolf app failed");
                // Nothing answered at all; the caller-facing message is the
                // fixed connection-error literal, the detail stays in the log.
                let message = if err.is_connect() {
                    CONNECTION_ERROR.to_string()
                } else {
                    err.to_string()
                };
                return json!({"success": false, "error": message});
            }
        };

        let status = response.status();
        match response.json::<Value>().await {
            Ok(body) if status.is_success() => body,
            Ok(body) => {
                warn!(endpoint, %status, "DraftWolf app returned an error");
                body
            }
            Err(err) if status.is_success() => {
                debug!(endpoint, error = %err, "DraftWolf app sent an unparseable body");
                json!({"success": false, "error": err.to_string()})
            }
            Err(_) => json!({"success": false, "error": format!("HTTP {}", status.as_u16())}),
        }
    }

    /// Whether the app is up and answering.
    pub async fn health(&self) -> bool {
        super::api_types::is_success(&self.send("/health", None).await)
    }

    pub async fn auth_status(&self) -> AuthStatus {
        AuthStatus::from_value(&self.send("/auth/status", None).await)
    }

    /// Directory the app recognizes as the project root for `directory`,
    /// or `None` when unreachable or not under version control.
    pub async fn find_root(&self, directory: &str) -> Option<String> {
        let response = self
            .send("/draft/find-root", Some(&json!({"path": directory})))
            .await;
        response
            .get("root")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub async fn init_project(&self, project_root: &str) -> CommandOutcome {
        let response = self
            .send("/draft/init", Some(&json!({"projectRoot": project_root})))
            .await;
        CommandOutcome::from_response(&response)
    }

    pub async fn commit(&self, project_root: &str, label: &str, files: &[String]) -> CommitOutcome {
        let response = self
            .send(
                "/draft/commit",
                Some(&json!({
                    "projectRoot": project_root,
                    "label": label,
                    "files": files,
                })),
            )
            .await;
        CommitOutcome::from_response(&response)
    }

    /// Full version history for the project. `None` means the app was
    /// unreachable or answered with something other than a history array,
    /// which callers treat differently from an empty history.
    pub async fn history(&self, project_root: &str) -> Option<Vec<VersionRecord>> {
        let response = self
            .send("/draft/history", Some(&json!({"projectRoot": project_root})))
            .await;
        let Value::Array(entries) = response else {
            return None;
        };
        Some(
            entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .collect(),
        )
    }

    pub async fn restore(&self, project_root: &str, version_id: &str) -> CommandOutcome {
        let response = self
            .send(
                "/draft/restore",
                Some(&json!({
                    "projectRoot": project_root,
                    "versionId": version_id,
                })),
            )
            .await;
        CommandOutcome::from_response(&response)
    }

    pub async fn rename_version(
        &self,
        project_root: &str,
        version_id: &str,
        new_label: &str,
    ) -> CommandOutcome {
        let response = self
            .send(
                "/draft/rename-version",
                Some(&json!({
                    "projectRoot": project_root,
                    "versionId": version_id,
                    "newLabel": new_label,
                })),
            )
            .await;
        CommandOutcome::from_response(&response)
    }
}
