//! Raw data model of a definition document, as deserialized from YAML.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Lifecycle policy for a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
  /// One shared instance, cached in the instance registry.
  #[default]
  Container,
  /// A fresh instance on every access, never cached.
  Prototype,
}

/// One unit of declarative input: imports, parameters and service entries.
///
/// The service map is insertion-ordered so that document order becomes
/// registration order in the merged store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
  #[serde(default)]
  pub imports: Vec<String>,
  #[serde(default)]
  pub parameters: HashMap<String, Value>,
  #[serde(default)]
  pub services: IndexMap<String, ServiceEntry>,
}

/// A single `services:` entry as written in a document.
///
/// `class` stays a raw [`Value`] here; the merge engine validates it and
/// substitutes `%name%` indirection before the entry reaches the store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceEntry {
  #[serde(default)]
  pub class: Option<Value>,
  #[serde(default)]
  pub scope: Scope,
  #[serde(default)]
  pub arguments: Vec<Value>,
  #[serde(default)]
  pub calls: Vec<Value>,
}

impl Document {
  /// Parses a document from YAML text.
  pub fn from_yaml(text: &str) -> Result<Self> {
    serde_yaml::from_str(text).map_err(|e| Error::DocumentParse(e.to_string()))
  }
}
