//! Models registered with the guard
//!
//! A model is a named schema bound to one collection. The guard derives an
//! explain-only sibling from it, so it only needs the parts of the schema
//! the sibling must carry: fields and indexes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a registered model (its registered name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelIdentity(String);

impl ModelIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Index declaration: ordered key/direction pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub keys: Vec<(String, i32)>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    /// Creates a non-unique index over the given keys
    pub fn new<K: Into<String>>(keys: impl IntoIterator<Item = (K, i32)>) -> Self {
        Self {
            keys: keys.into_iter().map(|(k, d)| (k.into(), d)).collect(),
            unique: false,
        }
    }

    /// Marks the index unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Schema definition as seen by the guard
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub fields: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
    /// Set on derived schemas so host-wide plugins are not applied again
    #[serde(default)]
    pub global_plugins_applied: bool,
}

impl SchemaDefinition {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    /// Clone for an explain sibling: indexes carried over, plugins marked applied
    pub fn derive_for_explain(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            indexes: self.indexes.clone(),
            global_plugins_applied: true,
        }
    }
}

/// A model the host registers with the guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub identity: ModelIdentity,
    pub schema: SchemaDefinition,
}

impl ModelDescriptor {
    pub fn new(identity: impl Into<ModelIdentity>, schema: SchemaDefinition) -> Self {
        Self {
            identity: identity.into(),
            schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_for_explain_keeps_indexes() {
        let schema = SchemaDefinition::new(["key1", "key2", "key3"])
            .with_index(IndexSpec::new([("key1", 1)]).unique())
            .with_index(IndexSpec::new([("key2", 1), ("key3", 1)]));

        let derived = schema.derive_for_explain();

        assert!(derived.global_plugins_applied);
        assert!(!schema.global_plugins_applied);
        assert_eq!(derived.indexes, schema.indexes);
        assert_eq!(derived.fields, schema.fields);
    }

    #[test]
    fn test_identity_display() {
        let id = ModelIdentity::from("test-explain");
        assert_eq!(id.to_string(), "test-explain");
    }
}
