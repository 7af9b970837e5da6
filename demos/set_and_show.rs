use std::sync::Arc;

use wirebox::{Container, Document, Instance, Scope};

// A ready-made client injected directly, bypassing construction.
struct Mailer {
  from: String,
}

fn main() -> wirebox::Result<()> {
  let container = Container::builder()
    .root("/srv/app")
    .merged(Document::from_yaml("parameters: {env: demo}")?)
    .build()?;

  // Install an already-built instance; it is immediately available to get.
  let mailer: Instance = Arc::new(Mailer {
    from: "noreply@example.org".to_owned(),
  });
  container.set("mailer", Some(mailer), Scope::Container, Vec::new(), Vec::new());

  let mailer: Arc<Mailer> = container.get_as("mailer")?.expect("mailer was installed");
  println!("Mailer sends from {}", mailer.from);

  // show() is a cheap snapshot: parameters plus the known service names,
  // in registration order, constructing nothing.
  let snapshot = container.show();
  println!("Parameters: {:?}", snapshot.parameters);
  println!("Services:   {:?}", snapshot.services);

  // Removing the cached instance leaves the definition behind.
  container.set("mailer", None, Scope::Container, Vec::new(), Vec::new());
  println!(
    "After removal, services are still listed: {:?}",
    container.show().services
  );
  Ok(())
}
