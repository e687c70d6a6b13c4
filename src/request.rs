//! JSON request/response envelope used by the `invoke` and `serve` commands
//!
//! Requests are tagged by `operation`:
//!
//! ```json
//! {"operation": "create", "type_name": "tf_local_file",
//!  "planned_state": {"path": "/tmp/x", "content": "hi"}}
//! ```
//!
//! Every request gets a response. Failures are reported as error
//! diagnostics, never as a process exit.

use crate::error::{Diagnostic, Severity};
use crate::provider::LocalProvider;
use crate::schema::ProviderSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display)]
#[serde(tag = "operation", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Request {
    GetSchema,
    Configure {
        #[serde(default)]
        config: Value,
    },
    Create {
        type_name: String,
        planned_state: Value,
    },
    Read {
        type_name: String,
        current_state: Value,
    },
    Update {
        type_name: String,
        prior_state: Value,
        planned_state: Value,
    },
    Delete {
        type_name: String,
        current_state: Value,
    },
    ReadDataSource {
        type_name: String,
        #[serde(default)]
        config: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    /// New state. `null` after a delete, or after a read of a resource that
    /// no longer exists.
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ProviderSchema>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Response {
    pub fn with_state(state: Value) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
            ..Self::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Parse one request document.
pub fn parse_request(text: &str) -> std::result::Result<Request, Response> {
    serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, "Malformed request");
        Response::from_diagnostic(Diagnostic::error("Malformed request", e.to_string()))
    })
}

/// Dispatch a request to the provider.
pub fn handle_request(provider: &mut LocalProvider, request: Request) -> Response {
    let operation = request.to_string();
    let result = match request {
        Request::GetSchema => {
            return Response {
                schema: Some(provider.schema()),
                ..Response::default()
            };
        }
        Request::Configure { config } => provider.configure(config).map(|()| None),
        Request::Create {
            type_name,
            planned_state,
        } => provider.create(&type_name, planned_state).map(Some),
        Request::Read {
            type_name,
            current_state,
        } => provider.read(&type_name, current_state),
        Request::Update {
            type_name,
            prior_state,
            planned_state,
        } => provider
            .update(&type_name, prior_state, planned_state)
            .map(Some),
        Request::Delete {
            type_name,
            current_state,
        } => provider.delete(&type_name, current_state).map(|()| None),
        Request::ReadDataSource { type_name, config } => {
            provider.read_data_source(&type_name, config).map(Some)
        }
    };

    match result {
        Ok(Some(state)) => Response::with_state(state),
        Ok(None) => Response::default(),
        Err(e) => {
            warn!(operation = %operation, error = %e, "Operation failed");
            Response::from_diagnostic(Diagnostic::from(&e))
        }
    }
}
