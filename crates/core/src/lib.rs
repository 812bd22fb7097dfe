//! # Helpline Core
//!
//! Domain types, traits, and error definitions for the Helpline support
//! router. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The completion service is defined as a trait here; implementations live in
//! `helpline-providers`. The knowledge index, context catalog, customer store
//! and conversation window are plain data structures with pure operations, so
//! the routing engine can be tested without any network.

pub mod catalog;
pub mod conversation;
pub mod customer;
pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use catalog::{ContextCatalog, ContextSchema, SchemaField};
pub use conversation::{ConversationWindow, DEFAULT_MAX_MESSAGES};
pub use customer::{CustomerContextStore, CustomerData, FieldMap};
pub use error::{CallStage, CatalogError, ProviderError, RoutingError};
pub use knowledge::{Category, KnowledgeEntry, KnowledgeIndex, OTHER_CATEGORY};
pub use message::{ChatMessage, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
