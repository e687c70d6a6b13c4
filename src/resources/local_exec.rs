//! `local_exec` resource: run a command on create/update, and optionally
//! another one on destroy.

use crate::error::{ProviderError, Result};
use crate::exec::{self, DEFAULT_SHELL};
use crate::ident::generate_exec_id;
use crate::resources::Resource;
use crate::schema::{Attribute, AttributeKind, Schema};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalExecResourceModel {
    pub command: String,
    pub output: Option<String>,
    pub exit_code: Option<i64>,
    pub fail_if_nonzero: Option<bool>,
    pub on_destroy: Option<String>,
    pub id: Option<String>,
}

impl LocalExecResourceModel {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    fn fail_if_nonzero(&self) -> bool {
        self.fail_if_nonzero.unwrap_or(true)
    }
}

pub fn local_exec_resource_schema() -> Schema {
    Schema::new("Execute local commands with potential side effects")
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
                "Whether to fail if the command returns a non-zero exit code. Defaults to true if not specified.",
            )
            .with_default(true),
        )
        .attribute(
            "on_destroy",
            Attribute::optional(
                AttributeKind::String,
                "Command to execute when the resource is destroyed",
            ),
        )
        .attribute(
            "id",
            Attribute::computed(AttributeKind::String, "Unique identifier for this execution"),
        )
}

#[derive(Debug, Clone)]
pub struct LocalExecResource {
    shell: String,
}

impl LocalExecResource {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn run_into(&self, data: &mut LocalExecResourceModel) -> Result<()> {
        let result = exec::run_shell_command(&self.shell, &data.command, data.fail_if_nonzero())
            .map_err(|e| ProviderError::operation("Command execution failed", e))?;
        data.output = Some(result.output);
        data.exit_code = Some(result.exit_code);
        Ok(())
    }
}

impl Default for LocalExecResource {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl Resource for LocalExecResource {
    type Model = LocalExecResourceModel;

    fn type_suffix(&self) -> &'static str {
        "local_exec"
    }

    fn schema(&self) -> Schema {
        local_exec_resource_schema()
    }

    fn create(&self, mut data: LocalExecResourceModel) -> Result<LocalExecResourceModel> {
        data.output.get_or_insert_with(String::new);
        data.exit_code.get_or_insert(0);

        // The ID is fixed before the command runs and never changes afterwards
        data.id = Some(generate_exec_id(&data.command, Utc::now()));

        self.run_into(&mut data)?;
        info!(id = data.id.as_deref(), exit_code = data.exit_code, "Created local_exec");
        Ok(data)
    }

    fn read(&self, state: LocalExecResourceModel) -> Result<Option<LocalExecResourceModel>> {
        // Commands are not re-run on refresh
        Ok(Some(state))
    }

    fn update(
        &self,
        state: LocalExecResourceModel,
        mut data: LocalExecResourceModel,
    ) -> Result<LocalExecResourceModel> {
        data.id = state.id;
        self.run_into(&mut data)?;
        info!(id = data.id.as_deref(), exit_code = data.exit_code, "Updated local_exec");
        Ok(data)
    }

    fn delete(&self, state: LocalExecResourceModel) -> Result<()> {
        let Some(on_destroy) = state.on_destroy.as_deref() else {
            debug!(id = state.id.as_deref(), "No on_destroy command");
            return Ok(());
        };

        exec::run_shell_command(&self.shell, on_destroy, state.fail_if_nonzero())
            .map_err(|e| ProviderError::operation("Failed to execute destroy command", e))?;
        info!(id = state.id.as_deref(), "Ran on_destroy command");
        Ok(())
    }
}
