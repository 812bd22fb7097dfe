//! `helpline doctor` — Diagnose config, data and provider health.

use helpline_config::{AppConfig, load_catalog, load_customer_data, load_knowledge};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Helpline Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `helpline init` (using defaults)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid config.");
            return Ok(());
        }
    };

    match load_knowledge(&config.data.knowledge_path) {
        Ok(index) if index.is_empty() => {
            println!("  ⚠️  Knowledge file has no entries: {}", config.data.knowledge_path.display());
            issues += 1;
        }
        Ok(index) => println!(
            "  ✅ Knowledge: {} entries in {} categories",
            index.len(),
            index.categories().len()
        ),
        Err(e) => {
            println!("  ❌ Knowledge: {e}");
            issues += 1;
        }
    }

    match load_catalog(&config.data.catalog_path) {
        Ok(catalog) => println!("  ✅ Context catalog: {} contexts", catalog.len()),
        Err(e) => {
            println!("  ❌ Context catalog: {e}");
            issues += 1;
        }
    }

    match load_customer_data(config.data.customer_data_path.as_deref()) {
        Ok(store) if store.is_empty() => println!("  ⚠️  No customer data loaded"),
        Ok(store) => println!("  ✅ Customer data: {} contexts", store.len()),
        Err(e) => {
            println!("  ❌ Customer data: {e}");
            issues += 1;
        }
    }

    match helpline_providers::build_from_config(&config) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider reachable: {} ({})", provider.name(), config.api_url),
            Ok(false) => {
                println!("  ❌ Provider responded unhealthy: {}", config.api_url);
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Provider: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
