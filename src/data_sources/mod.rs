//! Read-only data sources.

pub mod local_exec;
pub mod local_file;

use crate::error::Result;
use crate::resources::decode_plan;
use crate::schema::Schema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A data source computes its record from configuration on every read.
pub trait DataSource {
    type Model: Serialize + DeserializeOwned;

    /// Type name without the provider prefix (e.g. `"local_file"`)
    fn type_suffix(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn read(&self, config: Self::Model) -> Result<Self::Model>;
}

/// JSON-level view of a [`DataSource`]
pub trait DynDataSource: Send + Sync {
    fn type_suffix(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn read_value(&self, config: Value) -> Result<Value>;
}

impl<D> DynDataSource for D
where
    D: DataSource + Send + Sync,
{
    fn type_suffix(&self) -> &'static str {
        DataSource::type_suffix(self)
    }

    fn schema(&self) -> Schema {
        DataSource::schema(self)
    }

    fn read_value(&self, config: Value) -> Result<Value> {
        let config = decode_plan(&DataSource::schema(self), config)?;
        Ok(serde_json::to_value(self.read(config)?)?)
    }
}
