//! The container facade: builder, instantiation engine, instance registry.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_yaml::Value;
use tracing::debug;

use crate::document::{Document, Scope};
use crate::error::{Error, Result};
use crate::factory::{Factory, FactoryRegistry, Instance};
use crate::merge::Merger;
use crate::provider::{BundleProvider, ConfigProvider};
use crate::resolve::{ArgumentResolver, Resolved};
use crate::store::{DefinitionStore, ServiceDefinition, Snapshot};

/// Reserved name under which the container registers its own handle, so
/// dependent services can receive `@container`.
pub const CONTAINER_SERVICE: &str = "container";

/// Reserved name under which an attached configuration provider is
/// registered, resolvable as `@config` into an `Arc<dyn ConfigProvider>`.
pub const CONFIG_SERVICE: &str = "config";

thread_local! {
  // Service names currently being resolved on this thread. Turns a reference
  // cycle of any length into a clean error instead of unbounded recursion.
  static RESOLVING: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// RAII guard over the thread-local under-construction set.
struct ResolutionGuard {
  name: String,
}

impl ResolutionGuard {
  fn enter(name: &str) -> Result<Self> {
    RESOLVING.with(|stack| {
      // `insert` returns `false` if the name was already present.
      if !stack.borrow_mut().insert(name.to_owned()) {
        return Err(Error::CircularReference {
          service: name.to_owned(),
        });
      }
      Ok(())
    })?;
    Ok(Self {
      name: name.to_owned(),
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING.with(|stack| {
      stack.borrow_mut().remove(&self.name);
    });
  }
}

/// The service container: merged definition store, instance registry, and
/// factory registry behind one handle.
///
/// Built once at startup through [`Container::builder`] and passed around as
/// an explicit `Arc<Container>`; there is no global access point. The handle
/// is also registered inside itself under [`CONTAINER_SERVICE`], which keeps
/// the `Arc` cycle alive for the life of the process.
pub struct Container {
  root: PathBuf,
  store: RwLock<DefinitionStore>,
  instances: DashMap<String, Instance>,
  factories: FactoryRegistry,
  config: Option<Arc<dyn ConfigProvider>>,
}

impl std::fmt::Debug for Container {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Container")
      .field("root", &self.root)
      .finish_non_exhaustive()
  }
}

impl Container {
  /// Starts building a container.
  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::default()
  }

  /// The engine root path, mirrored into the `root` parameter.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Resolves a service by name.
  ///
  /// `Ok(None)` means the name is not defined, which callers distinguish
  /// from construction failure. A `container`-scope service is constructed
  /// once and served from the instance registry afterwards; a `prototype`
  /// service is constructed afresh on every access and never cached.
  pub fn get(&self, name: &str) -> Result<Option<Instance>> {
    let Some(definition) = self.store.read().service(name).cloned() else {
      return Ok(None);
    };
    if definition.scope == Scope::Container {
      if let Some(cached) = self.instances.get(name) {
        return Ok(Some(cached.value().clone()));
      }
    }
    let _guard = ResolutionGuard::enter(name)?;
    let arguments = ArgumentResolver::new(self, name).resolve_all(&definition.arguments)?;
    let (factory, instance) = self.construct(name, &definition, &arguments)?;
    if definition.scope == Scope::Container {
      // Stored before the calls run: a failing call leaves the partially
      // configured singleton in place instead of re-running construction.
      self.instances.insert(name.to_owned(), instance.clone());
    }
    self.run_calls(name, &definition, factory, &instance)?;
    Ok(Some(instance))
  }

  /// Typed convenience over [`get`](Self::get): resolves and downcasts.
  pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
    Ok(
      self
        .get(name)?
        .and_then(|instance| instance.downcast::<T>().ok()),
    )
  }

  /// Installs or removes a ready-made instance.
  ///
  /// `None` removes any cached instance for `name` and changes nothing else;
  /// the definition, if any, stays in place. `Some` caches the instance
  /// (making it immediately available to `get` without construction) and
  /// (re)writes class-less definition metadata for `name` — safe only
  /// because construction is never attempted while the cached entry exists.
  pub fn set(
    &self,
    name: &str,
    value: Option<Instance>,
    scope: Scope,
    arguments: Vec<Value>,
    calls: Vec<Value>,
  ) {
    let Some(instance) = value else {
      debug!(service = name, "removing cached instance");
      self.instances.remove(name);
      return;
    };
    debug!(service = name, "installing instance");
    self.instances.insert(name.to_owned(), instance);
    self.store.write().services.insert(
      name.to_owned(),
      ServiceDefinition {
        class: None,
        scope,
        arguments,
        calls,
      },
    );
  }

  /// Introspection snapshot: the full parameter table and the known service
  /// names in registration order. Constructs nothing.
  pub fn show(&self) -> Snapshot {
    self.store.read().snapshot()
  }

  pub(crate) fn store(&self) -> &RwLock<DefinitionStore> {
    &self.store
  }

  pub(crate) fn config_provider(&self) -> Option<&Arc<dyn ConfigProvider>> {
    self.config.as_ref()
  }

  pub(crate) fn has_service(&self, name: &str) -> bool {
    self.store.read().services.contains_key(name)
  }

  fn construct<'f>(
    &'f self,
    name: &str,
    definition: &ServiceDefinition,
    arguments: &[Resolved],
  ) -> Result<(&'f Factory, Instance)> {
    let Some(class) = &definition.class else {
      return Err(Error::InvalidDefinition {
        service: name.to_owned(),
        reason: "definition carries no class and no cached instance".to_owned(),
      });
    };
    let Some(factory) = self.factories.factory(class) else {
      return Err(Error::MissingFactory {
        service: name.to_owned(),
        class: class.clone(),
      });
    };
    debug!(service = name, class = %class, "constructing service");
    Ok((factory, factory.build(arguments)))
  }

  /// Runs the post-construction calls in declared order. Call arguments
  /// resolve with the owning service as consumer, so self-reference
  /// detection still applies.
  fn run_calls(
    &self,
    name: &str,
    definition: &ServiceDefinition,
    factory: &Factory,
    instance: &Instance,
  ) -> Result<()> {
    for entry in &definition.calls {
      let (method, tokens) = parse_call(name, entry)?;
      let arguments = ArgumentResolver::new(self, name).resolve_all(tokens)?;
      let Some(hook) = factory.hook(method) else {
        return Err(Error::InvalidCall {
          service: name.to_owned(),
          reason: format!("no post-construction hook named '{method}' is registered"),
        });
      };
      hook(instance, &arguments);
    }
    Ok(())
  }
}

/// A call entry is a sequence: the method name, optionally followed by a
/// sequence of argument tokens.
fn parse_call<'e>(service: &str, entry: &'e Value) -> Result<(&'e str, &'e [Value])> {
  const NO_TOKENS: &[Value] = &[];
  let invalid = |reason: &str| Error::InvalidCall {
    service: service.to_owned(),
    reason: reason.to_owned(),
  };
  let Value::Sequence(parts) = entry else {
    return Err(invalid("call entry must be a sequence"));
  };
  let Some(Value::String(method)) = parts.first() else {
    return Err(invalid("call entry must start with a method name"));
  };
  let tokens = match parts.get(1) {
    None => NO_TOKENS,
    Some(Value::Sequence(tokens)) => tokens.as_slice(),
    Some(_) => return Err(invalid("call arguments must be a sequence")),
  };
  if parts.len() > 2 {
    return Err(invalid("call entry has trailing elements"));
  }
  Ok((method, tokens))
}

/// Assembles a [`Container`]: root path, entry point (primary document or
/// pre-merged definition set), collaborators, and the factory registry.
#[derive(Default)]
pub struct ContainerBuilder {
  root: Option<PathBuf>,
  document: Option<PathBuf>,
  merged: Option<Document>,
  config: Option<Arc<dyn ConfigProvider>>,
  bundles: Option<Box<dyn BundleProvider>>,
  factories: FactoryRegistry,
}

impl ContainerBuilder {
  /// Engine root path; required.
  pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
    self.root = Some(root.into());
    self
  }

  /// Primary definition document to load, walk, and merge, followed by the
  /// bundle walk when a [`BundleProvider`] is attached.
  pub fn document(mut self, path: impl Into<PathBuf>) -> Self {
    self.document = Some(path.into());
    self
  }

  /// Pre-merged entry point: an already-fully-merged definition set,
  /// skipping document loading, import walking, and bundle discovery. Must
  /// produce an identical store to the document path for the same logical
  /// input.
  pub fn merged(mut self, document: Document) -> Self {
    self.merged = Some(document);
    self
  }

  /// Attaches the external configuration provider behind `config.*`
  /// references and the `@config` service.
  pub fn config(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
    self.config = Some(provider);
    self
  }

  /// Attaches the bundle discovery walk.
  pub fn bundles(mut self, provider: impl BundleProvider + 'static) -> Self {
    self.bundles = Some(Box::new(provider));
    self
  }

  /// Registers the factory for one class identity.
  pub fn factory(mut self, class: &str, factory: Factory) -> Self {
    self.factories.register(class, factory);
    self
  }

  /// Replaces the whole factory registry.
  pub fn factories(mut self, registry: FactoryRegistry) -> Self {
    self.factories = registry;
    self
  }

  pub fn build(self) -> Result<Arc<Container>> {
    let root = self
      .root
      .ok_or_else(|| Error::ConfigurationMissing("a root path is required".to_owned()))?;
    match (&self.document, &self.merged) {
      (None, None) => {
        return Err(Error::ConfigurationMissing(
          "a primary document or a pre-merged definition set is required".to_owned(),
        ))
      }
      (Some(_), Some(_)) => {
        return Err(Error::ConfigurationMissing(
          "a primary document and a pre-merged definition set are mutually exclusive".to_owned(),
        ))
      }
      _ => {}
    }
    let container = Arc::new(Container {
      root,
      store: RwLock::new(DefinitionStore::default()),
      instances: DashMap::new(),
      factories: self.factories,
      config: self.config.clone(),
    });
    // Reserved registrations happen before any merge, so definitions can
    // reference `@container` and `@config` immediately.
    container.set(
      CONTAINER_SERVICE,
      Some(container.clone() as Instance),
      Scope::Container,
      Vec::new(),
      Vec::new(),
    );
    if let Some(provider) = self.config {
      container.set(
        CONFIG_SERVICE,
        Some(Arc::new(provider) as Instance),
        Scope::Container,
        Vec::new(),
        Vec::new(),
      );
    }
    {
      let merger = Merger::new(&container.root);
      let mut store = container.store.write();
      if let Some(document) = self.merged {
        let base_dir = container.root.clone();
        merger.merge(&mut store, document, &base_dir)?;
      } else if let Some(path) = self.document {
        merger.merge_file(&mut store, &path)?;
        if let Some(bundles) = &self.bundles {
          merger.merge_bundles(&mut store, bundles.as_ref())?;
        }
      }
    }
    Ok(container)
  }
}
