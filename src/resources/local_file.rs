//! `local_file` resource: write a file on create/update, re-read it on
//! refresh, remove it on destroy.

use crate::error::{ProviderError, Result};
use crate::file_mode::{DEFAULT_DIR_MODE, format_file_mode, parse_file_mode};
use crate::ident::generate_file_id;
use crate::resources::Resource;
use crate::schema::{Attribute, AttributeKind, Schema};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;
use tracing::{debug, info, warn};

/// Permissions used when configuration leaves them unset.
pub const DEFAULT_PERMISSIONS: &str = "0644";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalFileResourceModel {
    pub path: String,
    pub content: String,
    pub permissions: Option<String>,
    pub fail_if_absent: Option<bool>,
    pub delete_on_destroy: Option<bool>,
    pub id: Option<String>,
}

impl LocalFileResourceModel {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

pub fn local_file_resource_schema() -> Schema {
    Schema::new("Manage local files with potential side effects")
        .attribute(
            "path",
            Attribute::required(AttributeKind::String, "Path to the file"),
        )
        .attribute(
            "content",
            Attribute::required(AttributeKind::String, "Content of the file"),
        )
        .attribute(
            "permissions",
            Attribute::optional(AttributeKind::String, "File permissions (e.g., '0644')")
                .with_default(DEFAULT_PERMISSIONS),
        )
        .attribute(
            "fail_if_absent",
            Attribute::optional(
                AttributeKind::Bool,
                "Whether to fail if the file does not exist",
            ),
        )
        .attribute(
            "delete_on_destroy",
            Attribute::optional(
                AttributeKind::Bool,
                "Whether to delete the file when the resource is destroyed. Defaults to true.",
            )
            .with_default(true),
        )
        .attribute(
            "id",
            Attribute::computed(AttributeKind::String, "Unique identifier for this file"),
        )
}

/// Create missing parent directories, write `content`, then apply the mode.
pub(crate) fn write_file(path: &Path, content: &str, permissions: Option<&str>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::DirBuilder::new()
            .recursive(true)
            .mode(DEFAULT_DIR_MODE)
            .create(parent)
            .map_err(|e| {
                ProviderError::operation("Failed to create directory", ProviderError::file(parent, e))
            })?;
    }

    fs::write(path, content).map_err(|e| ProviderError::file(path, e))?;

    let mode = parse_file_mode(permissions.unwrap_or(DEFAULT_PERMISSIONS));
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| ProviderError::file(path, e))?;
    debug!(path = %path.display(), mode = %format_file_mode(mode), "Wrote file");
    Ok(())
}

/// Read a file as text. Invalid UTF-8 is replaced rather than rejected.
pub(crate) fn read_file(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct LocalFileResource;

impl LocalFileResource {
    pub fn new() -> Self {
        Self
    }
}

impl Resource for LocalFileResource {
    type Model = LocalFileResourceModel;

    fn type_suffix(&self) -> &'static str {
        "local_file"
    }

    fn schema(&self) -> Schema {
        local_file_resource_schema()
    }

    fn create(&self, mut data: LocalFileResourceModel) -> Result<LocalFileResourceModel> {
        data.id = Some(generate_file_id(&data.path, Utc::now()));

        write_file(
            Path::new(&data.path),
            &data.content,
            data.permissions.as_deref(),
        )
        .map_err(|e| match e {
            ProviderError::Operation { .. } => e,
            other => ProviderError::operation("Failed to write file", other),
        })?;

        info!(path = %data.path, id = data.id.as_deref(), "Created local_file");
        Ok(data)
    }

    fn read(&self, mut state: LocalFileResourceModel) -> Result<Option<LocalFileResourceModel>> {
        match read_file(Path::new(&state.path)) {
            Ok(content) => {
                if content != state.content {
                    info!(path = %state.path, "File content drifted from state");
                }
                state.content = content;
                Ok(Some(state))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if state.fail_if_absent.unwrap_or(false) {
                    return Err(ProviderError::operation("Failed to read file", e));
                }
                warn!(path = %state.path, "File no longer exists, removing from state");
                Ok(None)
            }
            Err(e) => Err(ProviderError::operation("Failed to read file", e)),
        }
    }

    fn update(
        &self,
        state: LocalFileResourceModel,
        mut data: LocalFileResourceModel,
    ) -> Result<LocalFileResourceModel> {
        data.id = state.id;

        write_file(
            Path::new(&data.path),
            &data.content,
            data.permissions.as_deref(),
        )
        .map_err(|e| match e {
            ProviderError::Operation { .. } => e,
            other => ProviderError::operation("Failed to update file", other),
        })?;

        info!(path = %data.path, id = data.id.as_deref(), "Updated local_file");
        Ok(data)
    }

    fn delete(&self, state: LocalFileResourceModel) -> Result<()> {
        if state.delete_on_destroy == Some(false) {
            info!(path = %state.path, "delete_on_destroy is false, leaving file in place");
            return Ok(());
        }

        match fs::remove_file(&state.path) {
            Ok(()) => {
                info!(path = %state.path, "Deleted local_file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %state.path, "File already gone");
                Ok(())
            }
            Err(e) => Err(ProviderError::operation("Failed to delete file", e)),
        }
    }
}
