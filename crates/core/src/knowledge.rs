//! Knowledge index — flat Q&A records grouped into named categories.
//!
//! Entries are loaded once (see `helpline-config`) and never mutated.
//! Categories are derived on demand: every entry belongs to exactly one
//! category, and entries without a category are grouped under
//! [`OTHER_CATEGORY`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved category name for entries with a blank or absent category.
pub const OTHER_CATEGORY: &str = "Other";

/// Issue label used when deriving categories from entries without one.
const NO_ISSUE: &str = "(no issue)";

/// One knowledge item from the knowledge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,

    pub customer_query: String,

    pub agent_response: String,
}

impl KnowledgeEntry {
    pub fn new(
        category: Option<&str>,
        issue: Option<&str>,
        customer_query: impl Into<String>,
        agent_response: impl Into<String>,
    ) -> Self {
        Self {
            category: category.map(String::from),
            issue: issue.map(String::from),
            customer_query: customer_query.into(),
            agent_response: agent_response.into(),
        }
    }

    /// Whether this entry falls under [`OTHER_CATEGORY`].
    pub fn is_uncategorized(&self) -> bool {
        non_blank(self.category.as_deref()).is_none()
    }

    /// The category this entry is grouped under.
    pub fn category_name(&self) -> &str {
        non_blank(self.category.as_deref()).unwrap_or(OTHER_CATEGORY)
    }
}

/// A category name plus the distinct issues filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "type")]
    pub name: String,

    /// Distinct issues in first-seen order.
    pub issues: Vec<String>,
}

/// An immutable collection of knowledge entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeIndex {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeIndex {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derive categories, sorted by name, each with deduplicated issues.
    pub fn categories(&self) -> Vec<Category> {
        let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for entry in &self.entries {
            let issue = non_blank(entry.issue.as_deref()).unwrap_or(NO_ISSUE);
            let issues = grouped.entry(entry.category_name()).or_default();
            if !issues.iter().any(|i| i == issue) {
                issues.push(issue.to_string());
            }
        }

        grouped
            .into_iter()
            .map(|(name, issues)| Category {
                name: name.to_string(),
                issues,
            })
            .collect()
    }

    /// Entries of a single category. `"Other"` selects the uncategorized
    /// entries; an unknown or blank name yields an empty index.
    pub fn for_category(&self, name: &str) -> KnowledgeIndex {
        if name.trim().is_empty() {
            return KnowledgeIndex::default();
        }

        let entries = self
            .entries
            .iter()
            .filter(|e| {
                if name == OTHER_CATEGORY {
                    e.is_uncategorized()
                } else {
                    e.category.as_deref() == Some(name)
                }
            })
            .cloned()
            .collect();

        KnowledgeIndex::new(entries)
    }

    /// Render the knowledge section of the system prompt, grouped by
    /// category with uncategorized entries last.
    pub fn to_prompt_section(&self) -> String {
        if self.entries.is_empty() {
            return "## Knowledge base\n(No entries loaded.)\n".to_string();
        }

        let mut out = String::from("## Knowledge base\n\n");
        out.push_str(
            "Use the following Q&A entries to answer the customer. Match their question to the \
             closest customer_query and respond in the same style as agent_response. If multiple \
             entries could apply, pick the best match. If none match well, say you don't have \
             that information and suggest support or the app.\n\n",
        );

        let mut by_category: BTreeMap<&str, Vec<&KnowledgeEntry>> = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| !e.is_uncategorized()) {
            by_category
                .entry(entry.category_name())
                .or_default()
                .push(entry);
        }

        for (category, entries) in by_category {
            render_group(&mut out, category, entries.into_iter());
        }

        let uncategorized: Vec<&KnowledgeEntry> =
            self.entries.iter().filter(|e| e.is_uncategorized()).collect();
        if !uncategorized.is_empty() {
            render_group(&mut out, OTHER_CATEGORY, uncategorized.into_iter());
        }

        out
    }
}

fn render_group<'a>(
    out: &mut String,
    heading: &str,
    entries: impl Iterator<Item = &'a KnowledgeEntry>,
) {
    out.push_str(&format!("### {heading}\n\n"));
    for entry in entries {
        out.push_str(&format!(
            "- **Issue:** {}\n  - **Customer query:** {}\n  - **Agent response:** {}\n\n",
            entry.issue.as_deref().unwrap_or(""),
            entry.customer_query,
            entry.agent_response,
        ));
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
