//! tf-local Provider Library
//!
//! Resources and data sources for running local shell commands
//! (`tf_local_exec`) and managing local files (`tf_local_file`), plus the
//! schema and dispatch layer a host engine drives them through.

pub mod cli;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod exec;
pub mod file_mode;
pub mod ident;
pub mod process_guard;
pub mod provider;
pub mod request;
pub mod resources;
pub mod schema;

// Re-export main types for convenience
pub use config::ProviderConfig;
pub use data_sources::local_exec::{LocalExecDataSource, LocalExecDataSourceModel};
pub use data_sources::local_file::{LocalFileDataSource, LocalFileDataSourceModel};
pub use data_sources::{DataSource, DynDataSource};
pub use error::{Diagnostic, ProviderError, Result, Severity};
pub use exec::{CommandOutput, execute_local_command, run_shell_command};
pub use file_mode::{format_file_mode, parse_file_mode};
pub use ident::{generate_exec_id, generate_file_id};
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use provider::{LocalProvider, PROVIDER_TYPE_NAME};
pub use request::{Request, Response, handle_request, parse_request};
pub use resources::local_exec::{LocalExecResource, LocalExecResourceModel};
pub use resources::local_file::{LocalFileResource, LocalFileResourceModel};
pub use resources::{DynResource, Resource};
pub use schema::{Attribute, AttributeKind, ProviderSchema, Schema};
