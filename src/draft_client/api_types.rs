use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

pub const UNKNOWN_ERROR: &str = "Unknown Error";
pub const CONNECTION_ERROR: &str = "Connection Error";

/// True when a response value carries an explicit `success: true`.
pub fn is_success(response: &Value) -> bool {
    response
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub fn error_message(response: &Value) -> String {
    response
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Login state reported by `/auth/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthStatus {
    pub logged_in: bool,
    pub username: Option<String>,
}

impl AuthStatus {
    /// The app has sent both `loggedIn` and `logged_in` across releases, and
    /// sometimes only a username for a valid session; accept all three.
    pub fn from_value(value: &Value) -> Self {
        let flagged = value
            .get("loggedIn")
            .or_else(|| value.get("logged_in"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let username = value
            .get("username")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        if !flagged && username.is_none() {
            return Self::default();
        }
        Self {
            logged_in: true,
            username: Some(username.unwrap_or_else(|| "User".to_string())),
        }
    }
}

/// Outcome of a fire-and-forget endpoint call. `error` is the verbatim
/// server message when one was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn from_response(response: &Value) -> Self {
        if is_success(response) {
            Self {
                success: true,
                error: None,
            }
        } else {
            Self {
                success: false,
                error: Some(error_message(response)),
            }
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or(UNKNOWN_ERROR)
    }
}

/// Outcome of `/draft/commit`; carries the version number the app assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub success: bool,
    pub version_number: Option<String>,
    pub error: Option<String>,
}

impl CommitOutcome {
    pub fn from_response(response: &Value) -> Self {
        if is_success(response) {
            Self {
                success: true,
                version_number: response.get("versionNumber").map(value_as_display),
                error: None,
            }
        } else {
            Self {
                success: false,
                version_number: None,
                error: Some(error_message(response)),
            }
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            version_number: None,
            error: Some(message.into()),
        }
    }
}

// The app has sent version numbers both as strings and as bare numbers.
fn value_as_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// One saved checkpoint of one or more files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionRecord {
    pub id: String,
    pub version_number: String,
    pub label: String,
    /// ISO-8601, as sent by the app.
    pub timestamp: String,
    /// File path -> opaque metadata.
    pub files: HashMap<String, Value>,
}

impl VersionRecord {
    /// Exact match between a stored file basename and the cleaned target
    /// basename, both lower-cased. No partial or fuzzy matching.
    pub fn matches_basename(&self, target_lower: &str) -> bool {
        self.files.keys().any(|stored| {
            Path::new(stored)
                .file_name()
                .map(|name| name.to_string_lossy().to_lowercase() == target_lower)
                .unwrap_or(false)
        })
    }

    /// `"v3: Lighting pass (2024-05-01)"`, for version selector rows.
    pub fn display_name(&self) -> String {
        let number = if self.version_number.is_empty() {
            "0"
        } else {
            self.version_number.as_str()
        };
        let label = if self.label.is_empty() {
            "Untitled"
        } else {
            self.label.as_str()
        };
        let date = self.timestamp.split('T').next().unwrap_or_default();
        format!("v{number}: {label} ({date})")
    }

    /// Relative age of the checkpoint, falling back to the raw timestamp
    /// when it does not parse.
    pub fn saved_when(&self) -> String {
        match chrono::DateTime::parse_from_rfc3339(&self.timestamp) {
            Ok(parsed) => {
                let now = Utc::now();
                let duration = now.signed_duration_since(parsed.with_timezone(&Utc));
                if duration.num_seconds() < 60 {
                    "just now".to_string()
                } else if duration.num_minutes() < 60 {
                    format!("{} min ago", duration.num_minutes())
                } else if duration.num_hours() < 24 {
                    format!("{} h ago", duration.num_hours())
                } else {
                    format!("{} d ago", duration.num_days())
                }
            }
            Err(_) => self.timestamp.clone(),
        }
    }
}
