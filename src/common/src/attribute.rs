//! Attribute key model
//!
//! An attribute key names one dimension of a telemetry record and carries
//! enough typing information to render it as a field reference: tag and
//! resource attributes live in namespaced containers, while column-backed or
//! untyped keys are addressed bare (possibly as a dotted path into a
//! structured body field, e.g. `body.msg`).

use serde::{Deserialize, Serialize};

/// Which container an attribute key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "tag")]
    Tag,
    #[serde(rename = "resource")]
    Resource,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl AttributeType {
    /// Container name for existence tests, or `None` for bare keys.
    pub fn container(&self) -> Option<&'static str> {
        match self {
            AttributeType::Tag => Some("attributes"),
            AttributeType::Resource => Some("resources"),
            AttributeType::Unspecified => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttributeDataType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "float64")]
    Float64,
    #[serde(rename = "bool")]
    Bool,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeKey {
    pub key: String,
    #[serde(rename = "type", default)]
    pub key_type: AttributeType,
    #[serde(default)]
    pub data_type: AttributeDataType,
    #[serde(default)]
    pub is_column: bool,
}

impl AttributeKey {
    pub fn new(key: impl Into<String>, key_type: AttributeType) -> Self {
        Self {
            key: key.into(),
            key_type,
            ..Default::default()
        }
    }

    /// Tag attribute shorthand, the most common case in filters.
    pub fn tag(key: impl Into<String>) -> Self {
        Self::new(key, AttributeType::Tag)
    }

    pub fn resource(key: impl Into<String>) -> Self {
        Self::new(key, AttributeType::Resource)
    }

    /// Bare column or body-path key.
    pub fn column(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_column: true,
            ..Default::default()
        }
    }
}
