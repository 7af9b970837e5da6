//! # Wirebox
//!
//! A declarative, document-driven service container.
//!
//! Definition documents (YAML) describe named services — a class identity,
//! constructor arguments, post-construction calls, and a lifecycle scope —
//! alongside a flat parameter table. Documents may import further documents;
//! everything merges into one definition store, with the importing document
//! winning on name collision. Services are then built lazily on `get`, with
//! `%parameter%`, `@service`, and `config.*` references resolved at
//! construction time.
//!
//! ## Core Concepts
//!
//! - **Document**: one unit of declarative input (`imports`, `parameters`,
//!   `services`), merged by the builder.
//! - **Factory registry**: class identities map to construction closures
//!   supplied at build time; `calls` dispatch through named hooks each
//!   factory registers. There is no runtime reflection.
//! - **Scope**: `container` services are built once and cached; `prototype`
//!   services are built fresh on every access.
//! - **Resolution**: `get` returns `Ok(None)` for unknown names, an error
//!   for anything that goes wrong while building, and detects reference
//!   cycles of any length.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use wirebox::{Container, Document, Factory};
//!
//! struct Db {
//!   dsn: String,
//! }
//!
//! let document = Document::from_yaml(
//!   r#"
//! parameters:
//!   dsn: "db://primary"
//! services:
//!   db:
//!     class: Db
//!     arguments: ["%dsn%"]
//! "#,
//! )
//! .unwrap();
//!
//! let container = Container::builder()
//!   .root("/srv/app")
//!   .merged(document)
//!   .factory(
//!     "Db",
//!     Factory::new(|args| Db {
//!       dsn: args[0].as_str().unwrap_or_default().to_owned(),
//!     }),
//!   )
//!   .build()
//!   .unwrap();
//!
//! let db: Arc<Db> = container.get_as("db").unwrap().expect("db is defined");
//! assert_eq!(db.dsn, "db://primary");
//! ```

mod container;
mod document;
mod error;
mod factory;
mod merge;
mod provider;
mod resolve;
mod store;

pub use container::{Container, ContainerBuilder, CONFIG_SERVICE, CONTAINER_SERVICE};
pub use document::{Document, Scope, ServiceEntry};
pub use error::{Error, Result};
pub use factory::{Factory, FactoryRegistry, Instance};
pub use provider::{Bundle, BundleProvider, ConfigProvider};
pub use resolve::Resolved;
pub use store::{Snapshot, ROOT_PARAMETER};

pub use serde_yaml::Value;
