//! The argument resolver: classifies raw tokens and resolves them to values.
//!
//! Tokens are classified in a fixed order, first match wins: external-config
//! reference (`config.` prefix), parameter reference (`%...%`), service
//! reference (`@...`), literal. Doubled leading delimiters escape the
//! parameter and service forms; a leading `?` inside either form marks the
//! reference optional.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_yaml::Value;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::factory::Instance;

const CONFIG_PREFIX: &str = "config.";

/// A resolved argument, as handed to factories and hooks.
#[derive(Clone)]
pub enum Resolved {
  /// A literal, parameter, or external-config value.
  Value(Value),
  /// Another service's instance.
  Service(Instance),
  /// The explicit "no value" outcome of an optional reference that did not
  /// resolve, distinct from an empty string or a YAML null.
  None,
}

impl Resolved {
  pub fn as_value(&self) -> Option<&Value> {
    match self {
      Resolved::Value(value) => Some(value),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Resolved::Value(Value::String(text)) => Some(text),
      _ => None,
    }
  }

  /// Downcasts a service reference to its concrete type.
  pub fn service<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    match self {
      Resolved::Service(instance) => instance.clone().downcast::<T>().ok(),
      _ => None,
    }
  }

  pub fn is_none(&self) -> bool {
    matches!(self, Resolved::None)
  }
}

impl fmt::Debug for Resolved {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Resolved::Value(value) => f.debug_tuple("Value").field(value).finish(),
      Resolved::Service(_) => f.debug_tuple("Service").field(&"<instance>").finish(),
      Resolved::None => write!(f, "None"),
    }
  }
}

/// Resolves the raw argument tokens of one consuming service. Borrows the
/// container to look up parameters and to recurse into `get` for `@service`
/// references; never mutates the store.
pub(crate) struct ArgumentResolver<'a> {
  container: &'a Container,
  consumer: &'a str,
}

impl<'a> ArgumentResolver<'a> {
  pub(crate) fn new(container: &'a Container, consumer: &'a str) -> Self {
    Self { container, consumer }
  }

  pub(crate) fn resolve_all(&self, tokens: &[Value]) -> Result<Vec<Resolved>> {
    tokens.iter().map(|token| self.resolve(token)).collect()
  }

  pub(crate) fn resolve(&self, token: &Value) -> Result<Resolved> {
    // Only strings participate in the reference grammar; composite and
    // non-string scalar tokens pass through without interpolation.
    let Value::String(text) = token else {
      return Ok(Resolved::Value(token.clone()));
    };
    if let Some(key) = text.strip_prefix(CONFIG_PREFIX) {
      return self.resolve_config(key);
    }
    if text.starts_with('%') {
      if let Some(resolved) = self.resolve_parameter(text)? {
        return Ok(resolved);
      }
    }
    if let Some(rest) = text.strip_prefix('@') {
      return self.resolve_service(rest);
    }
    Ok(Resolved::Value(token.clone()))
  }

  fn resolve_config(&self, key: &str) -> Result<Resolved> {
    let Some(provider) = self.container.config_provider() else {
      return Err(Error::MissingCollaborator(
        "a configuration provider must be attached to resolve config.* references".to_owned(),
      ));
    };
    Ok(match provider.get(key) {
      Some(value) => Resolved::Value(value),
      None => Resolved::None,
    })
  }

  /// `Ok(None)` means the token is not actually a parameter reference (a
  /// `%`-leading literal without the closing delimiter) and falls through
  /// the classification chain.
  fn resolve_parameter(&self, text: &str) -> Result<Option<Resolved>> {
    // A doubled delimiter escapes: strip exactly one leading `%`, no lookup.
    // Checked before the optionality marker, so the two never combine.
    if let Some(escaped) = text.strip_prefix("%%") {
      return Ok(Some(Resolved::Value(Value::String(format!("%{escaped}")))));
    }
    if text.len() < 2 || !text.ends_with('%') {
      return Ok(None);
    }
    let inner = &text[1..text.len() - 1];
    let (optional, name) = match inner.strip_prefix('?') {
      Some(name) => (true, name),
      None => (false, inner),
    };
    if let Some(value) = self.container.store().read().parameter(name) {
      return Ok(Some(Resolved::Value(value.clone())));
    }
    if optional {
      Ok(Some(Resolved::None))
    } else {
      Err(Error::MissingParameter {
        service: self.consumer.to_owned(),
        parameter: name.to_owned(),
      })
    }
  }

  fn resolve_service(&self, rest: &str) -> Result<Resolved> {
    // `@@name` escapes to the literal remainder, no lookup.
    if let Some(escaped) = rest.strip_prefix('@') {
      return Ok(Resolved::Value(Value::String(escaped.to_owned())));
    }
    let (optional, name) = match rest.strip_prefix('?') {
      Some(name) => (true, name),
      None => (false, rest),
    };
    // Direct self-reference fails before any construction is attempted;
    // longer cycles are caught by the resolution guard in `get`.
    if name == self.consumer {
      return Err(Error::CircularReference {
        service: self.consumer.to_owned(),
      });
    }
    if self.container.has_service(name) {
      if let Some(instance) = self.container.get(name)? {
        return Ok(Resolved::Service(instance));
      }
    }
    if optional {
      Ok(Resolved::None)
    } else {
      Err(Error::UnknownService {
        service: self.consumer.to_owned(),
        name: name.to_owned(),
      })
    }
  }
}
