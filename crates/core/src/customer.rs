//! Customer data, keyed by context name.
//!
//! The router only ever asks for the fields of one context at a time, through
//! the [`CustomerData`] trait. [`CustomerContextStore`] is the in-memory
//! implementation; a database-backed lookup can implement the same trait.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Field name → value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. An existing field keeps its position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut map = FieldMap::new();
                while let Some((field, value)) = access.next_entry::<String, String>()? {
                    map.insert(field, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// Lookup of customer data for exactly one context at a time.
pub trait CustomerData: Send + Sync {
    /// Fields stored for `context`; empty when the context is unknown.
    fn fields_for(&self, context: &str) -> FieldMap;

    /// Render the customer-data section for a single context. Blank values
    /// are skipped; empty when there is nothing to show.
    fn prompt_section_for_context(&self, context: &str) -> String {
        render_data_section(context, &self.fields_for(context))
    }
}

fn render_data_section(context: &str, data: &FieldMap) -> String {
    let filled: Vec<(&str, &str)> = data.iter().filter(|(_, v)| !v.trim().is_empty()).collect();
    if filled.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Current customer data (for this context)\n\n");
    out.push_str("Answer only from the data below.\n\n");
    out.push_str(&format!("### {context}\n"));
    for (field, value) in filled {
        out.push_str(&format!("- {field}: {value}\n"));
    }
    out
}

/// In-memory customer data per context name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerContextStore {
    contexts: HashMap<String, FieldMap>,
}

impl CustomerContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace all data for a context. Blank names are ignored.
    pub fn put_context(&mut self, context: impl Into<String>, fields: FieldMap) {
        let context = context.into();
        if context.trim().is_empty() {
            return;
        }
        self.contexts.insert(context, fields);
    }

    /// Set a single field, creating the context if missing.
    pub fn put(
        &mut self,
        context: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) {
        let context = context.into();
        if context.trim().is_empty() {
            return;
        }
        self.contexts.entry(context).or_default().insert(field, value);
    }

    /// Fields of one context, or an empty map.
    pub fn get(&self, context: &str) -> FieldMap {
        self.contexts.get(context).cloned().unwrap_or_default()
    }

    pub fn context_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl CustomerData for CustomerContextStore {
    fn fields_for(&self, context: &str) -> FieldMap {
        self.get(context)
    }
}
