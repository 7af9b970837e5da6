//! Instantiation semantics: singleton caching, prototype freshness,
//! post-construction calls, `set`, `show`, and the reserved services.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_yaml::Value;

use common::{Db, Probe, Repo, TableConfig};
use wirebox::{
  Container, Document, Error, Factory, Instance, Scope, CONFIG_SERVICE, CONTAINER_SERVICE,
};

fn container_with(yaml: &str) -> Arc<Container> {
  Container::builder()
    .root("/srv/app")
    .merged(Document::from_yaml(yaml).unwrap())
    .factories(common::registry())
    .build()
    .unwrap()
}

#[test]
fn container_scope_returns_the_same_instance_every_call() {
  let container = container_with(
    r#"
parameters:
  dsn: "db://primary"
services:
  db:
    class: Db
    arguments: ["%dsn%"]
"#,
  );

  let first: Arc<Db> = container.get_as("db").unwrap().unwrap();
  let second: Arc<Db> = container.get_as("db").unwrap().unwrap();
  assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn singleton_factory_runs_once() {
  static BUILT: AtomicUsize = AtomicUsize::new(0);

  struct Counted;
  let container = Container::builder()
    .root("/srv/app")
    .merged(Document::from_yaml("services: {counted: {class: Counted}}").unwrap())
    .factory(
      "Counted",
      Factory::new(|_args| {
        BUILT.fetch_add(1, Ordering::SeqCst);
        Counted
      }),
    )
    .build()
    .unwrap();

  container.get("counted").unwrap().unwrap();
  container.get("counted").unwrap().unwrap();
  assert_eq!(BUILT.load(Ordering::SeqCst), 1);
}

#[test]
fn prototype_scope_builds_a_fresh_instance_sharing_singleton_dependencies() {
  // The end-to-end wiring property: two prototype repos, one singleton db.
  let container = container_with(
    r#"
parameters:
  dsn: "db://x"
services:
  db:
    class: Db
    arguments: ["%dsn%"]
  repo:
    class: Repo
    scope: prototype
    arguments: ["@db"]
"#,
  );

  let first: Arc<Repo> = container.get_as("repo").unwrap().unwrap();
  let second: Arc<Repo> = container.get_as("repo").unwrap().unwrap();

  assert!(!Arc::ptr_eq(&first, &second));
  assert_ne!(first.id, second.id);
  assert_eq!(first.db.dsn, "db://x");
  assert!(Arc::ptr_eq(&first.db, &second.db));
}

#[test]
fn calls_run_in_declared_order_and_only_once_for_singletons() {
  let container = container_with(
    r#"
parameters:
  level: debug
services:
  svc:
    class: Probe
    calls:
      - [record, ["%level%"]]
      - [set_db, []]
      - [record]
"#,
  );

  let probe: Arc<Probe> = container.get_as("svc").unwrap().unwrap();
  {
    let calls = probe.calls.lock();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0, "record");
    assert_eq!(calls[0].1[0].as_str(), Some("debug"));
    assert_eq!(calls[1].0, "set_db");
    assert!(calls[1].1.is_empty());
    assert_eq!(calls[2].0, "record");
    assert!(calls[2].1.is_empty());
  }

  // A cached hit must not re-run the calls.
  let again: Arc<Probe> = container.get_as("svc").unwrap().unwrap();
  assert!(Arc::ptr_eq(&probe, &again));
  assert_eq!(probe.calls.lock().len(), 3);
}

#[test]
fn malformed_call_entries_fail_with_invalid_call() {
  for (yaml, fragment) in [
    ("services: {svc: {class: Probe, calls: [not-a-sequence]}}", "sequence"),
    ("services: {svc: {class: Probe, calls: [[]]}}", "method name"),
    ("services: {svc: {class: Probe, calls: [[record, not-a-sequence]]}}", "sequence"),
    ("services: {svc: {class: Probe, calls: [[unknown_hook]]}}", "unknown_hook"),
  ] {
    let container = container_with(yaml);
    let err = container.get("svc").unwrap_err();
    match &err {
      Error::InvalidCall { service, reason } => {
        assert_eq!(service, "svc");
        assert!(reason.contains(fragment), "{reason:?} vs {fragment:?}");
      }
      other => panic!("expected InvalidCall, got {other:?}"),
    }
  }
}

#[test]
fn get_on_an_unknown_name_is_not_an_error() {
  let container = container_with("services: {}");
  assert!(container.get("nope").unwrap().is_none());
}

#[test]
fn set_installs_an_instance_without_construction() {
  let container = container_with("services: {}");

  let handle: Instance = Arc::new(Db {
    dsn: "db://injected".to_owned(),
  });
  container.set("db", Some(handle), Scope::Container, Vec::new(), Vec::new());

  let db: Arc<Db> = container.get_as("db").unwrap().unwrap();
  assert_eq!(db.dsn, "db://injected");
  assert!(container.show().services.contains(&"db".to_owned()));
}

#[test]
fn set_none_removes_only_the_cached_instance() {
  let container = container_with(
    r#"
parameters:
  dsn: "db://primary"
services:
  db:
    class: Db
    arguments: ["%dsn%"]
"#,
  );

  let first: Arc<Db> = container.get_as("db").unwrap().unwrap();
  container.set("db", None, Scope::Container, Vec::new(), Vec::new());

  // The definition is untouched, so the next get reconstructs.
  assert!(container.show().services.contains(&"db".to_owned()));
  let second: Arc<Db> = container.get_as("db").unwrap().unwrap();
  assert!(!Arc::ptr_eq(&first, &second));
  assert_eq!(second.dsn, "db://primary");
}

#[test]
fn show_lists_parameters_and_names_without_constructing() {
  static BUILT: AtomicUsize = AtomicUsize::new(0);

  struct Lazy;
  let container = Container::builder()
    .root("/srv/app")
    .merged(
      Document::from_yaml(
        r#"
parameters:
  a: 1
services:
  svc:
    class: Lazy
"#,
      )
      .unwrap(),
    )
    .config(TableConfig::new(&[]))
    .factory(
      "Lazy",
      Factory::new(|_args| {
        BUILT.fetch_add(1, Ordering::SeqCst);
        Lazy
      }),
    )
    .build()
    .unwrap();

  let snapshot = container.show();
  assert_eq!(
    snapshot.parameters.get("a"),
    Some(&Value::Number(1u64.into()))
  );
  assert_eq!(
    snapshot.parameters.get("root"),
    Some(&Value::String("/srv/app".to_owned()))
  );
  // Registration order: the reserved services first, then the document's.
  assert_eq!(snapshot.services, vec!["container", "config", "svc"]);
  assert_eq!(BUILT.load(Ordering::SeqCst), 0);
}

#[test]
fn dependent_services_can_receive_the_container_itself() {
  let container = container_with(
    r#"
services:
  svc:
    class: Probe
    arguments: ["@container"]
"#,
  );

  let probe: Arc<Probe> = container.get_as("svc").unwrap().unwrap();
  let handle: Arc<Container> = probe.args[0].service::<Container>().unwrap();
  assert!(Arc::ptr_eq(&handle, &container));
}

#[test]
fn reserved_services_resolve_without_construction() {
  let container = Container::builder()
    .root("/srv/app")
    .merged(Document::from_yaml("services: {}").unwrap())
    .config(TableConfig::new(&[("key", "value")]))
    .build()
    .unwrap();

  assert!(container.get(CONTAINER_SERVICE).unwrap().is_some());
  assert!(container.get(CONFIG_SERVICE).unwrap().is_some());
}

#[test]
fn missing_factory_is_reported_at_construction_time() {
  let container = container_with("services: {svc: {class: Unregistered}}");
  let err = container.get("svc").unwrap_err();
  assert!(
    matches!(&err, Error::MissingFactory { service, class }
      if service == "svc" && class == "Unregistered")
  );
}
