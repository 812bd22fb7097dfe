//! Context catalog — named customer-data "tables" described by schema.
//!
//! A schema describes the *shape* of a customer-data context (its fields and
//! the kinds of questions it answers); it never carries customer values.
//! The full catalog is only rendered for context classification. Once a
//! context has been chosen, only that single schema reaches the answering
//! prompt.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One field of a context schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaField {
    pub fn new(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            description: Some(description.into()),
        }
    }
}

/// Defines one customer context: name, description, fields, and example
/// queries that help classification pick it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSchema {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered field list; `schema` in the JSON configuration.
    #[serde(default, rename = "schema")]
    pub fields: Vec<SchemaField>,

    #[serde(default)]
    pub example_queries: Vec<String>,
}

impl ContextSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            fields: Vec::new(),
            example_queries: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, description: impl Into<String>) -> Self {
        self.fields.push(SchemaField::new(field, description));
        self
    }

    pub fn with_example(mut self, query: impl Into<String>) -> Self {
        self.example_queries.push(query.into());
        self
    }
}

/// An immutable, validated set of context schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextCatalog {
    contexts: Vec<ContextSchema>,
}

impl ContextCatalog {
    /// Build a catalog. Every name must be non-blank and unique.
    pub fn new(contexts: Vec<ContextSchema>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for ctx in &contexts {
            if ctx.name.trim().is_empty() {
                return Err(CatalogError::BlankName);
            }
            if !seen.insert(ctx.name.as_str()) {
                return Err(CatalogError::DuplicateName(ctx.name.clone()));
            }
        }
        Ok(Self { contexts })
    }

    pub fn contexts(&self) -> &[ContextSchema] {
        &self.contexts
    }

    pub fn names(&self) -> Vec<&str> {
        self.contexts.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Exact, case-sensitive lookup.
    pub fn by_name(&self, name: &str) -> Option<&ContextSchema> {
        if name.trim().is_empty() {
            return None;
        }
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Render the schema of a single context for the answering prompt.
    /// Empty when the name is unknown.
    pub fn prompt_section_for_context(&self, name: &str) -> String {
        let Some(ctx) = self.by_name(name) else {
            return String::new();
        };

        let mut out = String::from("## Customer context (relevant to this question)\n\n");
        render_schema(&mut out, ctx, "Example queries");
        out
    }

    /// Render every schema. Only used as classification input.
    pub fn full_prompt_section(&self) -> String {
        if self.contexts.is_empty() {
            return String::new();
        }

        let mut out = String::from("## Customer context catalog\n\n");
        out.push_str(
            "Use the following context names and schemas to decide where to find the answer. \
             Each context is a logical 'table' of customer data. Answer from the context that \
             matches the customer's question.\n\n",
        );
        for ctx in &self.contexts {
            render_schema(
                &mut out,
                ctx,
                "Example queries (use this context for questions like)",
            );
        }
        out
    }
}

fn render_schema(out: &mut String, ctx: &ContextSchema, examples_label: &str) {
    out.push_str(&format!("### Context: {}\n", ctx.name));
    out.push_str(&format!(
        "- Description: {}\n",
        ctx.description.as_deref().unwrap_or("")
    ));
    if !ctx.fields.is_empty() {
        out.push_str("- Schema (fields):\n");
        for f in &ctx.fields {
            out.push_str(&format!(
                "  - {}: {}\n",
                f.field,
                f.description.as_deref().unwrap_or("")
            ));
        }
    }
    if !ctx.example_queries.is_empty() {
        out.push_str(&format!(
            "- {examples_label}: {}\n",
            ctx.example_queries.join("; ")
        ));
    }
    out.push('\n');
}
