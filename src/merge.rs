//! The merge engine: folds definition documents into the store.
//!
//! Imports merge depth-first, before the importing document's own entries,
//! so the importer always wins on name collision and imports act as
//! low-priority defaults. The rule holds transitively across arbitrarily
//! deep import chains.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::document::{Document, ServiceEntry};
use crate::error::{Error, Result};
use crate::provider::BundleProvider;
use crate::store::{DefinitionStore, ServiceDefinition, ROOT_PARAMETER};

/// Conventional secondary document contributed by a bundle, relative to the
/// bundle root.
const BUNDLE_DOCUMENT: &str = "../config/containers/package-container.yml";

/// Loads one definition document from disk. A thin deserialization step;
/// everything interesting happens in [`Merger`].
pub(crate) fn load_document(path: &Path) -> Result<Document> {
  let text = fs::read_to_string(path).map_err(|e| match e.kind() {
    io::ErrorKind::NotFound => Error::DocumentNotFound(path.to_path_buf()),
    _ => Error::DocumentParse(format!("{}: {}", path.display(), e)),
  })?;
  serde_yaml::from_str(&text)
    .map_err(|e| Error::DocumentParse(format!("{}: {}", path.display(), e)))
}

pub(crate) struct Merger<'a> {
  root: &'a Path,
}

impl<'a> Merger<'a> {
  pub(crate) fn new(root: &'a Path) -> Self {
    Self { root }
  }

  /// Loads the document at `path` and merges it, resolving its imports
  /// against the document's own directory.
  pub(crate) fn merge_file(&self, store: &mut DefinitionStore, path: &Path) -> Result<()> {
    debug!(path = %path.display(), "merging definition document");
    let document = load_document(path)?;
    let base_dir = path.parent().unwrap_or(self.root).to_path_buf();
    self.merge(store, document, &base_dir)
  }

  /// Merges one document: seeds the `root` parameter, walks imports
  /// depth-first, then folds in the document's own parameters and services.
  pub(crate) fn merge(
    &self,
    store: &mut DefinitionStore,
    document: Document,
    base_dir: &Path,
  ) -> Result<()> {
    if !store.parameters.contains_key(ROOT_PARAMETER) {
      store.parameters.insert(
        ROOT_PARAMETER.to_owned(),
        Value::String(self.root.display().to_string()),
      );
    }
    for import in &document.imports {
      let import_path = PathBuf::from(import);
      let import_path = if import_path.is_absolute() {
        import_path
      } else {
        base_dir.join(import_path)
      };
      self.merge_file(store, &import_path)?;
    }
    for (name, value) in document.parameters {
      store.parameters.insert(name, value);
    }
    for (name, entry) in document.services {
      let definition = process_service(store, &name, entry)?;
      store.services.insert(name, definition);
    }
    Ok(())
  }

  /// Runs the bundle walk: merges each bundle's conventional secondary
  /// document in discovery order, after the primary document.
  pub(crate) fn merge_bundles(
    &self,
    store: &mut DefinitionStore,
    bundles: &dyn BundleProvider,
  ) -> Result<()> {
    for bundle in bundles.bundles() {
      let document_path = bundle.root.join(BUNDLE_DOCUMENT);
      if !document_path.is_file() {
        continue;
      }
      debug!(bundle = %bundle.name, path = %document_path.display(), "merging bundle document");
      self.merge_file(store, &document_path)?;
    }
    Ok(())
  }
}

/// Validates a service entry and substitutes a parameter-indirect class.
fn process_service(
  store: &DefinitionStore,
  name: &str,
  entry: ServiceEntry,
) -> Result<ServiceDefinition> {
  let class = match entry.class {
    None => {
      return Err(Error::InvalidDefinition {
        service: name.to_owned(),
        reason: "does not specify a class".to_owned(),
      })
    }
    Some(Value::String(class)) => class,
    Some(_) => {
      return Err(Error::InvalidDefinition {
        service: name.to_owned(),
        reason: "class must be a plain string".to_owned(),
      })
    }
  };
  let class = substitute_class(store, name, class)?;
  Ok(ServiceDefinition {
    class: Some(class),
    scope: entry.scope,
    arguments: entry.arguments,
    calls: entry.calls,
  })
}

/// Resolves a `%name%` class to the literal class identity held by an
/// already-merged parameter.
fn substitute_class(store: &DefinitionStore, service: &str, class: String) -> Result<String> {
  if !class.starts_with('%') {
    return Ok(class);
  }
  if class.len() < 2 || !class.ends_with('%') {
    return Err(Error::InvalidDefinition {
      service: service.to_owned(),
      reason: format!("class reference '{class}' must be wrapped in %...%"),
    });
  }
  let parameter = &class[1..class.len() - 1];
  let value = store
    .parameter(parameter)
    .ok_or_else(|| Error::MissingParameter {
      service: service.to_owned(),
      parameter: parameter.to_owned(),
    })?;
  match value {
    Value::String(literal) if !literal.starts_with('%') => Ok(literal.clone()),
    _ => Err(Error::InvalidDefinition {
      service: service.to_owned(),
      reason: format!("class parameter '{parameter}' must hold a plain class identity"),
    }),
  }
}
