//! The provider: registry of resource and data source types plus dispatch
//! of host engine operations to them.

use crate::config::ProviderConfig;
use crate::data_sources::DynDataSource;
use crate::data_sources::local_exec::LocalExecDataSource;
use crate::data_sources::local_file::LocalFileDataSource;
use crate::error::{ProviderError, Result};
use crate::process_guard::ChildRegistry;
use crate::resources::DynResource;
use crate::resources::local_exec::LocalExecResource;
use crate::resources::local_file::LocalFileResource;
use crate::schema::{ProviderSchema, Schema};
use serde_json::Value;
use tracing::{debug, info};

/// Prefix of every resource and data source type name
pub const PROVIDER_TYPE_NAME: &str = "tf";

pub struct LocalProvider {
    version: String,
    config: ProviderConfig,
    resources: Vec<Box<dyn DynResource>>,
    data_sources: Vec<Box<dyn DynDataSource>>,
}

impl LocalProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self::with_config(version, ProviderConfig::default())
    }

    pub fn with_config(version: impl Into<String>, config: ProviderConfig) -> Self {
        let mut provider = Self {
            version: version.into(),
            config: ProviderConfig::default(),
            resources: Vec::new(),
            data_sources: Vec::new(),
        };
        provider.install(config);
        provider
    }

    fn install(&mut self, config: ProviderConfig) {
        self.resources = vec![
            Box::new(LocalExecResource::new(config.shell.clone())),
            Box::new(LocalFileResource::new()),
        ];
        self.data_sources = vec![
            Box::new(LocalExecDataSource::new(config.shell.clone())),
            Box::new(LocalFileDataSource::new()),
        ];
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.set_grace_period(config.kill_grace_period());
        }
        self.config = config;
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Apply the provider block
    pub fn configure(&mut self, config: Value) -> Result<()> {
        let config = ProviderConfig::from_value(config)?;
        info!(
            shell = %config.shell,
            kill_grace_period_secs = config.kill_grace_period_secs,
            "Provider configured"
        );
        self.install(config);
        Ok(())
    }

    pub fn resource_type_names(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|r| full_type_name(r.type_suffix()))
            .collect()
    }

    pub fn data_source_type_names(&self) -> Vec<String> {
        self.data_sources
            .iter()
            .map(|d| full_type_name(d.type_suffix()))
            .collect()
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: Schema::new("Provider for managing local files and executing local commands"),
            resources: self
                .resources
                .iter()
                .map(|r| (full_type_name(r.type_suffix()), r.schema()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|d| (full_type_name(d.type_suffix()), d.schema()))
                .collect(),
        }
    }

    fn resource(&self, type_name: &str) -> Result<&dyn DynResource> {
        self.resources
            .iter()
            .find(|r| full_type_name(r.type_suffix()) == type_name)
            .map(|r| &**r)
            .ok_or_else(|| ProviderError::UnknownType {
                kind: "resource",
                name: type_name.to_string(),
            })
    }

    fn data_source(&self, type_name: &str) -> Result<&dyn DynDataSource> {
        self.data_sources
            .iter()
            .find(|d| full_type_name(d.type_suffix()) == type_name)
            .map(|d| &**d)
            .ok_or_else(|| ProviderError::UnknownType {
                kind: "data source",
                name: type_name.to_string(),
            })
    }

    pub fn create(&self, type_name: &str, planned_state: Value) -> Result<Value> {
        debug!(type_name, "create");
        self.resource(type_name)?.create_value(planned_state)
    }

    /// Refresh a resource. `None` means it no longer exists.
    pub fn read(&self, type_name: &str, current_state: Value) -> Result<Option<Value>> {
        debug!(type_name, "read");
        self.resource(type_name)?.read_value(current_state)
    }

    pub fn update(&self, type_name: &str, prior_state: Value, planned_state: Value) -> Result<Value> {
        debug!(type_name, "update");
        self.resource(type_name)?.update_value(prior_state, planned_state)
    }

    pub fn delete(&self, type_name: &str, current_state: Value) -> Result<()> {
        debug!(type_name, "delete");
        self.resource(type_name)?.delete_value(current_state)
    }

    pub fn read_data_source(&self, type_name: &str, config: Value) -> Result<Value> {
        debug!(type_name, "read data source");
        self.data_source(type_name)?.read_value(config)
    }
}

fn full_type_name(suffix: &str) -> String {
    format!("{PROVIDER_TYPE_NAME}_{suffix}")
}
