//! Attribute schemas for resources and data sources
//!
//! Schemas describe the flat records exchanged with the host engine: each
//! attribute has a kind, a set of required/optional/computed flags and an
//! optional default. The provider uses them to fill defaults and to reject
//! malformed plans before any side effect runs.

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Primitive value kind of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttributeKind {
    String,
    Bool,
    Int64,
}

impl AttributeKind {
    /// Whether a non-null JSON value has this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Int64 => value.is_i64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: String,
}

impl Attribute {
    fn new(kind: AttributeKind, description: &str) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            default: None,
            description: description.to_string(),
        }
    }

    /// Must be set in configuration
    pub fn required(kind: AttributeKind, description: &str) -> Self {
        Self {
            required: true,
            ..Self::new(kind, description)
        }
    }

    /// May be set in configuration
    pub fn optional(kind: AttributeKind, description: &str) -> Self {
        Self {
            optional: true,
            ..Self::new(kind, description)
        }
    }

    /// Set by the provider only
    pub fn computed(kind: AttributeKind, description: &str) -> Self {
        Self {
            computed: true,
            ..Self::new(kind, description)
        }
    }

    /// Also settable by the provider (optional + computed)
    pub fn and_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Value used when configuration leaves the attribute null.
    /// Implies `computed`, since the provider fills it in.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.computed = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    /// Fill null or missing attributes that declare a default.
    pub fn apply_defaults(&self, value: &mut Value) -> Result<()> {
        let object = as_object_mut(value)?;
        for (name, attribute) in &self.attributes {
            let Some(default) = &attribute.default else {
                continue;
            };
            let slot = object.entry(name.clone()).or_insert(Value::Null);
            if slot.is_null() {
                *slot = default.clone();
            }
        }
        Ok(())
    }

    /// Check a planned or configured record against this schema.
    ///
    /// Unknown attributes, missing required attributes and values of the
    /// wrong kind are rejected. Nulls are accepted for everything that is
    /// not required.
    pub fn validate(&self, value: &Value) -> Result<()> {
        let object = value
            .as_object()
            .ok_or_else(|| ProviderError::validation("expected an object of attributes"))?;

        if let Some(unknown) = object.keys().find(|k| !self.attributes.contains_key(*k)) {
            return Err(ProviderError::validation(format!(
                "unsupported attribute \"{unknown}\""
            )));
        }

        for (name, attribute) in &self.attributes {
            match object.get(name) {
                None | Some(Value::Null) if attribute.required => {
                    return Err(ProviderError::validation(format!(
                        "attribute \"{name}\" is required"
                    )));
                }
                Some(v) if !v.is_null() && !attribute.kind.accepts(v) => {
                    return Err(ProviderError::validation(format!(
                        "attribute \"{name}\" must be of type {}",
                        attribute.kind
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    value
        .as_object_mut()
        .ok_or_else(|| ProviderError::validation("expected an object of attributes"))
}

/// Every schema the provider exposes, keyed by full type name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Schema {
        Schema::new("sample")
            .attribute("path", Attribute::required(AttributeKind::String, "Path"))
            .attribute(
                "mode",
                Attribute::optional(AttributeKind::String, "Mode").with_default("0644"),
            )
            .attribute("count", Attribute::computed(AttributeKind::Int64, "Count"))
            .attribute("flag", Attribute::optional(AttributeKind::Bool, "Flag"))
    }

    #[test]
    fn test_defaults_fill_missing_and_null() {
        let schema = sample();

        let mut missing = json!({"path": "/tmp/x"});
        schema.apply_defaults(&mut missing).unwrap();
        assert_eq!(missing["mode"], "0644");

        let mut null = json!({"path": "/tmp/x", "mode": null});
        schema.apply_defaults(&mut null).unwrap();
        assert_eq!(null["mode"], "0644");

        let mut set = json!({"path": "/tmp/x", "mode": "0600"});
        schema.apply_defaults(&mut set).unwrap();
        assert_eq!(set["mode"], "0600");
    }

    #[test]
    fn test_defaults_on_null_record() {
        let mut value = Value::Null;
        sample().apply_defaults(&mut value).unwrap();
        assert_eq!(value, json!({"mode": "0644"}));
    }

    #[test]
    fn test_defaults_reject_non_object() {
        let mut value = json!([1, 2]);
        assert!(sample().apply_defaults(&mut value).is_err());
    }

    #[test]
    fn test_with_default_implies_computed() {
        let attr = Attribute::optional(AttributeKind::Bool, "x").with_default(true);
        assert!(attr.optional && attr.computed);
        assert_eq!(attr.default, Some(json!(true)));
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        let value = json!({"path": "/tmp/x", "mode": null, "count": 3, "flag": false});
        sample().validate(&value).unwrap();
    }

    #[test]
    fn test_validate_requires_required() {
        let err = sample().validate(&json!({"mode": "0644"})).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: attribute \"path\" is required");

        let err = sample().validate(&json!({"path": null})).unwrap_err();
        assert!(err.to_string().contains("\"path\" is required"));
    }

    #[test]
    fn test_validate_rejects_wrong_kind_and_unknown() {
        let err = sample()
            .validate(&json!({"path": "/tmp/x", "flag": "yes"}))
            .unwrap_err();
        assert!(err.to_string().contains("must be of type bool"));

        let err = sample()
            .validate(&json!({"path": "/tmp/x", "colour": "red"}))
            .unwrap_err();
        assert!(err.to_string().contains("unsupported attribute \"colour\""));
    }

    #[test]
    fn test_kind_parses_from_str() {
        let kind: AttributeKind = "int64".parse().unwrap();
        assert_eq!(kind, AttributeKind::Int64);
        assert_eq!(AttributeKind::String.to_string(), "string");
    }
}
