#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_yaml::Value;

use wirebox::{ConfigProvider, Factory, FactoryRegistry, Resolved};

// --- Test Fixtures ---

/// A database handle built from a DSN string argument.
pub struct Db {
  pub dsn: String,
}

/// A repository wired onto a `Db` service reference, with a per-instance id
/// so tests can tell prototype instances apart.
pub struct Repo {
  pub db: Arc<Db>,
  pub id: usize,
}

pub static REPO_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Records everything it receives: resolved constructor arguments and every
/// post-construction call, in order. Calls mutate through a lock because
/// hooks receive a shared reference.
pub struct Probe {
  pub args: Vec<Resolved>,
  pub calls: Mutex<Vec<(String, Vec<Resolved>)>>,
}

/// A configuration provider over a fixed key/value table.
pub struct TableConfig {
  entries: HashMap<String, Value>,
}

impl TableConfig {
  pub fn new(entries: &[(&str, &str)]) -> Arc<Self> {
    Arc::new(Self {
      entries: entries
        .iter()
        .map(|(key, value)| ((*key).to_owned(), Value::String((*value).to_owned())))
        .collect(),
    })
  }
}

impl ConfigProvider for TableConfig {
  fn get(&self, key: &str) -> Option<Value> {
    self.entries.get(key).cloned()
  }
}

/// The factory set shared by the integration tests: `Db`, `Repo`, and a
/// `Probe` with `record` and `set_db` hooks.
pub fn registry() -> FactoryRegistry {
  let mut factories = FactoryRegistry::new();
  factories.register(
    "Db",
    Factory::new(|args| Db {
      dsn: args
        .first()
        .and_then(Resolved::as_str)
        .unwrap_or_default()
        .to_owned(),
    }),
  );
  factories.register(
    "Repo",
    Factory::new(|args| Repo {
      db: args[0].service::<Db>().expect("repo requires a db service"),
      id: REPO_COUNTER.fetch_add(1, Ordering::SeqCst),
    }),
  );
  factories.register(
    "Probe",
    Factory::new(|args| Probe {
      args: args.to_vec(),
      calls: Mutex::new(Vec::new()),
    })
    .with_call("record", |probe: &Probe, args| {
      probe
        .calls
        .lock()
        .push(("record".to_owned(), args.to_vec()));
    })
    .with_call("set_db", |probe: &Probe, args| {
      probe
        .calls
        .lock()
        .push(("set_db".to_owned(), args.to_vec()));
    }),
  );
  factories
}
