//! Factory registry: class identities mapped to construction closures.
//!
//! Without runtime reflection, a definition's `class` field can not name an
//! arbitrary type to instantiate. It is instead a lookup key into this
//! registry, and `calls` entries dispatch through a per-factory table of
//! named post-construction hooks.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::resolve::Resolved;

/// A constructed service instance, as held by the instance registry.
pub type Instance = Arc<dyn Any + Send + Sync>;

type ConstructFn = Box<dyn Fn(&[Resolved]) -> Instance + Send + Sync>;
pub(crate) type CallFn = Box<dyn Fn(&Instance, &[Resolved]) + Send + Sync>;

/// Constructs instances of one class identity and carries its named
/// post-construction hooks.
pub struct Factory {
  construct: ConstructFn,
  calls: HashMap<String, CallFn>,
}

impl Factory {
  /// Creates a factory from a construction closure. Arguments arrive already
  /// resolved, in declared order.
  pub fn new<T, F>(construct: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&[Resolved]) -> T + Send + Sync + 'static,
  {
    Self {
      construct: Box::new(move |args| Arc::new(construct(args))),
      calls: HashMap::new(),
    }
  }

  /// Registers a named post-construction hook.
  ///
  /// The hook receives a shared reference to the instance; services that are
  /// configured through calls use interior mutability.
  pub fn with_call<T, F>(mut self, method: &str, hook: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&T, &[Resolved]) + Send + Sync + 'static,
  {
    self.calls.insert(
      method.to_owned(),
      Box::new(move |instance, args| {
        // The instance was produced by this factory's own construct closure,
        // so the downcast can only miss if the hook was registered for a
        // different type than the factory builds.
        if let Some(target) = instance.downcast_ref::<T>() {
          hook(target, args);
        }
      }),
    );
    self
  }

  pub(crate) fn build(&self, args: &[Resolved]) -> Instance {
    (self.construct)(args)
  }

  pub(crate) fn hook(&self, method: &str) -> Option<&CallFn> {
    self.calls.get(method)
  }
}

/// Maps class identities to their factories, supplied at build time.
#[derive(Default)]
pub struct FactoryRegistry {
  factories: HashMap<String, Factory>,
}

impl FactoryRegistry {
  /// Creates a new, empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers the factory for one class identity, replacing any previous
  /// registration under the same identity.
  pub fn register(&mut self, class: &str, factory: Factory) {
    self.factories.insert(class.to_owned(), factory);
  }

  pub(crate) fn factory(&self, class: &str) -> Option<&Factory> {
    self.factories.get(class)
  }
}
