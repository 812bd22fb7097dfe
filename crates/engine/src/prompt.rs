//! System prompt assembly.
//!
//! The answering prompt is built from up to five sections, always in this
//! order:
//!
//! 1. **Preamble** (persona and answering rules)
//! 2. **Knowledge** (the possibly narrowed knowledge index, never omitted)
//! 3. **Context schema** (the selected context only)
//! 4. **Customer data** (the selected context only)
//! 5. **Safety** suffix
//!
//! Sections are separated by exactly one blank line. An omitted section
//! leaves no separator behind.

use helpline_config::PromptConfig;
use helpline_core::{ContextCatalog, KnowledgeIndex};

/// Default persona and answering rules.
pub const ROLE_AND_RULES: &str = "You are a friendly telecom customer support agent. Answer only \
using the information provided below. Keep replies concise and helpful (1-3 sentences). Match the \
customer's question to the closest customer_query and respond in the same style as the \
corresponding agent_response. If the answer is not in the provided data, say you don't have that \
information and suggest calling support or checking the app.";

/// Default closing instructions.
pub const SAFETY: &str = "Do not make up plan names, prices, or policies. If the customer asks \
something not covered above, say you don't have that information and offer to transfer to an \
agent or suggest the app/website.";

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    preamble: String,
    safety: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self {
            preamble: ROLE_AND_RULES.to_string(),
            safety: SAFETY.to_string(),
        }
    }
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the `[prompt]` overrides; blank overrides are ignored.
    pub fn from_config(config: &PromptConfig) -> Self {
        let mut assembler = Self::default();
        if let Some(preamble) = config.preamble.as_deref().filter(|p| !p.trim().is_empty()) {
            assembler.preamble = preamble.to_string();
        }
        if let Some(safety) = config.safety.as_deref().filter(|s| !s.trim().is_empty()) {
            assembler.safety = safety.to_string();
        }
        assembler
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    pub fn with_safety(mut self, safety: impl Into<String>) -> Self {
        self.safety = safety.into();
        self
    }

    /// Build the system prompt. `selected_context` that is `None` or not in
    /// the catalog contributes no schema section; a blank
    /// `customer_data_section` is omitted.
    pub fn build(
        &self,
        knowledge: &KnowledgeIndex,
        catalog: &ContextCatalog,
        selected_context: Option<&str>,
        customer_data_section: &str,
    ) -> String {
        let knowledge_section = knowledge.to_prompt_section();
        let schema_section = selected_context
            .map(|name| catalog.prompt_section_for_context(name))
            .unwrap_or_default();

        let sections = [
            self.preamble.as_str(),
            knowledge_section.as_str(),
            schema_section.as_str(),
            customer_data_section,
            self.safety.as_str(),
        ];

        sections
            .iter()
            .map(|s| s.trim_end())
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
