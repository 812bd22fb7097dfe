//! JSON data files: knowledge entries, context catalog, customer data.
//!
//! Each loader reads one file and hands back a ready-to-use core type. The
//! router never touches the filesystem.

use std::path::Path;

use helpline_core::{ContextCatalog, ContextSchema, CustomerContextStore, KnowledgeEntry, KnowledgeIndex};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::ConfigError;

/// Top-level shape of the context catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    contexts: Vec<ContextSchema>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load the knowledge file: a JSON array of
/// `{category?, issue?, customer_query, agent_response}` records.
pub fn load_knowledge(path: &Path) -> Result<KnowledgeIndex, ConfigError> {
    let entries: Vec<KnowledgeEntry> = read_json(path)?;
    tracing::info!(path = %path.display(), entries = entries.len(), "Loaded knowledge");
    Ok(KnowledgeIndex::new(entries))
}

/// Load the context catalog file: `{"contexts": [...]}`.
pub fn load_catalog(path: &Path) -> Result<ContextCatalog, ConfigError> {
    let file: CatalogFile = read_json(path)?;
    let catalog = ContextCatalog::new(file.contexts)
        .map_err(|e| ConfigError::ValidationError(format!("{}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), contexts = catalog.len(), "Loaded context catalog");
    Ok(catalog)
}

/// Load customer data: context name → {field → value}.
///
/// No path, or a path that does not exist, yields an empty store.
pub fn load_customer_data(path: Option<&Path>) -> Result<CustomerContextStore, ConfigError> {
    let Some(path) = path else {
        return Ok(CustomerContextStore::new());
    };
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Customer data file not found, starting empty");
        return Ok(CustomerContextStore::new());
    }

    let store: CustomerContextStore = read_json(path)?;
    tracing::info!(path = %path.display(), contexts = store.len(), "Loaded customer data");
    Ok(store)
}
