//! `local_file` data source: read a file's content and mode.

use crate::data_sources::DataSource;
use crate::error::{ProviderError, Result};
use crate::file_mode::format_file_mode;
use crate::ident::generate_file_id;
use crate::resources::local_file::read_file;
use crate::schema::{Attribute, AttributeKind, Schema};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalFileDataSourceModel {
    pub path: String,
    pub content: Option<String>,
    pub permissions: Option<String>,
    pub fail_if_absent: Option<bool>,
    pub id: Option<String>,
}

impl LocalFileDataSourceModel {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

pub fn local_file_data_source_schema() -> Schema {
    Schema::new("Read local files")
        .attribute(
            "path",
            Attribute::required(AttributeKind::String, "Path to the file"),
        )
        .attribute(
            "content",
            Attribute::computed(AttributeKind::String, "Content of the file"),
        )
        .attribute(
            "permissions",
            Attribute::optional(AttributeKind::String, "File permissions (e.g., '0644')")
                .and_computed(),
        )
        .attribute(
            "fail_if_absent",
            Attribute::optional(
                AttributeKind::Bool,
                "Whether to fail if the file does not exist",
            ),
        )
        .attribute(
            "id",
            Attribute::computed(AttributeKind::String, "Unique identifier for this file"),
        )
}

#[derive(Debug, Clone, Default)]
pub struct LocalFileDataSource;

impl LocalFileDataSource {
    pub fn new() -> Self {
        Self
    }
}

impl DataSource for LocalFileDataSource {
    type Model = LocalFileDataSourceModel;

    fn type_suffix(&self) -> &'static str {
        "local_file"
    }

    fn schema(&self) -> Schema {
        local_file_data_source_schema()
    }

    fn read(&self, mut data: LocalFileDataSourceModel) -> Result<LocalFileDataSourceModel> {
        data.id = Some(generate_file_id(&data.path, Utc::now()));
        let path = Path::new(&data.path);

        match read_file(path) {
            Ok(content) => {
                data.content = Some(content);
                if data.permissions.is_none() {
                    data.permissions = fs::metadata(path)
                        .ok()
                        .map(|meta| format_file_mode(meta.permissions().mode()));
                }
                info!(path = %data.path, "Read local_file data source");
            }
            Err(e) if data.fail_if_absent.unwrap_or(false) => {
                return Err(ProviderError::operation("Failed to read file", e));
            }
            Err(e) => {
                debug!(path = %data.path, error = %e, "File unreadable, returning empty content");
                data.content = Some(String::new());
            }
        }

        Ok(data)
    }
}
