//! The merged definition store: parameter table plus service definitions.

use indexmap::IndexMap;
use serde_yaml::Value;
use std::collections::HashMap;

use crate::document::Scope;

/// Reserved parameter holding the engine root path, seeded by the first
/// merge unless a caller put it there beforehand.
pub const ROOT_PARAMETER: &str = "root";

/// The processed form of one service entry, as held by the store.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
  /// Factory-registry lookup key. `None` only for definitions written by
  /// [`Container::set`](crate::Container::set), which never reach
  /// construction while their instance is cached.
  pub class: Option<String>,
  pub scope: Scope,
  pub arguments: Vec<Value>,
  /// Raw call entries; their shape is validated when the service is built.
  pub calls: Vec<Value>,
}

/// Merged parameters and service definitions.
///
/// Pure data: mutated only by the merge engine and by
/// [`Container::set`](crate::Container::set). Later merges overwrite whole
/// definitions under the same name; partial field merges are not supported.
#[derive(Debug, Default)]
pub struct DefinitionStore {
  pub(crate) parameters: HashMap<String, Value>,
  pub(crate) services: IndexMap<String, ServiceDefinition>,
}

impl DefinitionStore {
  pub(crate) fn parameter(&self, name: &str) -> Option<&Value> {
    self.parameters.get(name)
  }

  pub(crate) fn service(&self, name: &str) -> Option<&ServiceDefinition> {
    self.services.get(name)
  }

  pub(crate) fn snapshot(&self) -> Snapshot {
    Snapshot {
      parameters: self.parameters.clone(),
      services: self.services.keys().cloned().collect(),
    }
  }
}

/// An introspection snapshot: the full parameter table and the known service
/// names in registration order. Produced by
/// [`Container::show`](crate::Container::show) without constructing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
  pub parameters: HashMap<String, Value>,
  pub services: Vec<String>,
}
