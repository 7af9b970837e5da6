use std::sync::Arc;

use wirebox::{Container, Document, Factory, Resolved};

// A database handle, shared as a container-scope singleton.
struct Db {
  dsn: String,
}

// A repository built fresh on every access (prototype scope), wired onto
// the shared database.
struct Repo {
  db: Arc<Db>,
}

fn main() -> wirebox::Result<()> {
  let document = Document::from_yaml(
    r#"
parameters:
  dsn: "db://primary"
services:
  db:
    class: Db
    arguments: ["%dsn%"]
  repo:
    class: Repo
    scope: prototype
    arguments: ["@db"]
"#,
  )?;

  let container = Container::builder()
    .root("/srv/app")
    .merged(document)
    .factory(
      "Db",
      Factory::new(|args| {
        println!("Constructing Db...");
        Db {
          dsn: args[0].as_str().unwrap_or_default().to_owned(),
        }
      }),
    )
    .factory(
      "Repo",
      Factory::new(|args: &[Resolved]| {
        println!("Constructing Repo...");
        Repo {
          db: args[0].service::<Db>().expect("repo requires a db"),
        }
      }),
    )
    .build()?;

  println!("--- Resolving Prototypes ---");
  let first: Arc<Repo> = container.get_as("repo")?.expect("repo is defined");
  let second: Arc<Repo> = container.get_as("repo")?.expect("repo is defined");

  assert!(
    !Arc::ptr_eq(&first, &second),
    "prototype instances should be distinct"
  );
  assert!(
    Arc::ptr_eq(&first.db, &second.db),
    "both repos should share the singleton db"
  );
  println!(
    "Two distinct repos, one shared db at {}, as expected.",
    first.db.dsn
  );
  Ok(())
}
