//! `local_exec` data source: run a command on every read.

use crate::data_sources::DataSource;
use crate::error::{ProviderError, Result};
use crate::exec::{self, DEFAULT_SHELL};
use crate::ident::generate_exec_id;
use crate::schema::{Attribute, AttributeKind, Schema};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalExecDataSourceModel {
    pub command: String,
    pub output: Option<String>,
    pub exit_code: Option<i64>,
    pub fail_if_nonzero: Option<bool>,
    pub id: Option<String>,
}

impl LocalExecDataSourceModel {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }
}

pub fn local_exec_data_source_schema() -> Schema {
    Schema::new("Execute local commands")
        .attribute(
            "command",
            Attribute::required(AttributeKind::String, "Command to execute"),
        )
        .attribute(
            "output",
            Attribute::computed(AttributeKind::String, "Output of the command"),
        )
        .attribute(
            "exit_code",
            Attribute::computed(AttributeKind::Int64, "Exit code of the command"),
        )
        .attribute(
            "fail_if_nonzero",
            Attribute::optional(
                AttributeKind::Bool,
                "Whether to fail if the command returns a non-zero exit code",
            ),
        )
        .attribute(
            "id",
            Attribute::computed(AttributeKind::String, "Unique identifier for this execution"),
        )
}

#[derive(Debug, Clone)]
pub struct LocalExecDataSource {
    shell: String,
}

impl LocalExecDataSource {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for LocalExecDataSource {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl DataSource for LocalExecDataSource {
    type Model = LocalExecDataSourceModel;

    fn type_suffix(&self) -> &'static str {
        "local_exec"
    }

    fn schema(&self) -> Schema {
        local_exec_data_source_schema()
    }

    fn read(&self, mut data: LocalExecDataSourceModel) -> Result<LocalExecDataSourceModel> {
        let fail_if_nonzero = *data.fail_if_nonzero.get_or_insert(true);
        data.id = Some(generate_exec_id(&data.command, Utc::now()));

        let result = exec::run_shell_command(&self.shell, &data.command, fail_if_nonzero)
            .map_err(|e| ProviderError::operation("Command execution failed", e))?;
        data.output = Some(result.output);
        data.exit_code = Some(result.exit_code);

        info!(exit_code = result.exit_code, "Read local_exec data source");
        Ok(data)
    }
}
