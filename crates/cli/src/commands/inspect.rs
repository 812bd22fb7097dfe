//! `helpline inspect` — Show what the router would classify against.

use helpline_config::{AppConfig, load_catalog, load_customer_data, load_knowledge};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let knowledge = load_knowledge(&config.data.knowledge_path)?;
    let catalog = load_catalog(&config.data.catalog_path)?;
    let customer = load_customer_data(config.data.customer_data_path.as_deref())?;

    println!("Knowledge: {} ({} entries)", config.data.knowledge_path.display(), knowledge.len());
    for category in knowledge.categories() {
        let entries = knowledge.for_category(&category.name).len();
        println!("  {} [{} entries]", category.name, entries);
        for issue in &category.issues {
            println!("    - {issue}");
        }
    }

    println!();
    println!("Contexts: {} ({} schemas)", config.data.catalog_path.display(), catalog.len());
    for schema in catalog.contexts() {
        let stored = customer.get(&schema.name).len();
        match &schema.description {
            Some(desc) => println!("  {}: {desc}", schema.name),
            None => println!("  {}", schema.name),
        }
        println!("    fields: {}  customer values: {stored}", schema.fields.len());
    }

    Ok(())
}
