//! Managed resources.
//!
//! A resource implements [`Resource`] over a typed model. The provider works
//! with the object-safe [`DynResource`], which every `Resource` gets for free
//! and which converts between JSON records and the model.

pub mod local_exec;
pub mod local_file;

use crate::error::{ProviderError, Result};
use crate::schema::Schema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Create/read/update/delete callbacks for one resource type.
///
/// # Contract
///
/// - `create` receives the planned record and returns the new state.
/// - `read` returns the refreshed state, or `None` when the underlying
///   object is gone and the resource should leave state.
/// - `update` receives the prior state and the planned record.
/// - `delete` performs any destroy-time side effect.
pub trait Resource {
    type Model: Serialize + DeserializeOwned;

    /// Type name without the provider prefix (e.g. `"local_exec"`)
    fn type_suffix(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn create(&self, plan: Self::Model) -> Result<Self::Model>;

    fn read(&self, state: Self::Model) -> Result<Option<Self::Model>>;

    fn update(&self, state: Self::Model, plan: Self::Model) -> Result<Self::Model>;

    fn delete(&self, state: Self::Model) -> Result<()>;
}

/// JSON-level view of a [`Resource`]
pub trait DynResource: Send + Sync {
    fn type_suffix(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn create_value(&self, plan: Value) -> Result<Value>;

    fn read_value(&self, state: Value) -> Result<Option<Value>>;

    fn update_value(&self, state: Value, plan: Value) -> Result<Value>;

    fn delete_value(&self, state: Value) -> Result<()>;
}

impl<R> DynResource for R
where
    R: Resource + Send + Sync,
{
    fn type_suffix(&self) -> &'static str {
        Resource::type_suffix(self)
    }

    fn schema(&self) -> Schema {
        Resource::schema(self)
    }

    fn create_value(&self, plan: Value) -> Result<Value> {
        let plan = decode_plan(&Resource::schema(self), plan)?;
        Ok(serde_json::to_value(self.create(plan)?)?)
    }

    fn read_value(&self, state: Value) -> Result<Option<Value>> {
        let state = decode_state(state)?;
        match self.read(state)? {
            Some(model) => Ok(Some(serde_json::to_value(model)?)),
            None => Ok(None),
        }
    }

    fn update_value(&self, state: Value, plan: Value) -> Result<Value> {
        let state = decode_state(state)?;
        let plan = decode_plan(&Resource::schema(self), plan)?;
        Ok(serde_json::to_value(self.update(state, plan)?)?)
    }

    fn delete_value(&self, state: Value) -> Result<()> {
        self.delete(decode_state(state)?)
    }
}

/// Fill defaults, validate, then deserialize a planned or configured record.
pub(crate) fn decode_plan<M: DeserializeOwned>(schema: &Schema, mut value: Value) -> Result<M> {
    schema.apply_defaults(&mut value)?;
    schema.validate(&value)?;
    serde_json::from_value(value).map_err(|e| ProviderError::validation(e.to_string()))
}

/// Deserialize a record previously produced by this provider.
pub(crate) fn decode_state<M: DeserializeOwned>(value: Value) -> Result<M> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::validation(format!("malformed state: {e}")))
}
