//! Collaborator contracts consumed by the container.

use serde_yaml::Value;
use std::path::PathBuf;

/// External configuration source backing `config.*` argument references.
///
/// An attached provider is also registered as an immediately-available
/// service under [`CONFIG_SERVICE`](crate::CONFIG_SERVICE), stored as an
/// `Arc<dyn ConfigProvider>` instance.
pub trait ConfigProvider: Send + Sync {
  /// Looks up a configuration value by key. `None` when the key is unset.
  fn get(&self, key: &str) -> Option<Value>;
}

/// An externally-discovered unit contributing an additional definition
/// document, merged after the primary one.
#[derive(Debug, Clone)]
pub struct Bundle {
  pub name: String,
  pub root: PathBuf,
}

/// Bundle discovery walk.
///
/// Bundles merge in the order returned here, so bundle-provided definitions
/// override same-named primary ones and later bundles override earlier ones.
pub trait BundleProvider: Send + Sync {
  fn bundles(&self) -> Vec<Bundle>;
}
