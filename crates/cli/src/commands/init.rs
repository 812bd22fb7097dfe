//! `helpline init` — First-time setup.

use std::path::Path;

use helpline_config::AppConfig;

const SAMPLE_KNOWLEDGE: &str = include_str!("../../../../data/knowledge.json");
const SAMPLE_CATALOG: &str = include_str!("../../../../data/context_schemas.json");
const SAMPLE_CUSTOMER: &str = include_str!("../../../../data/customer_data.json");

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Helpline — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    // Sample data lands wherever the (possibly existing) config points.
    let config = AppConfig::load_from(&config_path)?;
    write_sample(&config.data.knowledge_path, SAMPLE_KNOWLEDGE)?;
    write_sample(&config.data.catalog_path, SAMPLE_CATALOG)?;
    if let Some(path) = &config.data.customer_data_path {
        write_sample(path, SAMPLE_CUSTOMER)?;
    }

    println!("\n📝 Next steps:");
    println!("   1. Set HELPLINE_API_KEY (or add api_key to {})", config_path.display());
    println!("   2. Run: helpline doctor");
    println!("   3. Run: helpline chat\n");

    Ok(())
}

fn write_sample(path: &Path, content: &str) -> std::io::Result<()> {
    if path.exists() {
        println!("  Data file exists: {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("✅ Wrote sample data: {}", path.display());
    Ok(())
}
