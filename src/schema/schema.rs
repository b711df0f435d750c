use indexmap::IndexMap;
use serde::{Serialize, Deserialize};
use crate::storage::document::IndexableField;

/// Field definition with analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub indexed: bool,
    pub stored: bool,
    pub analyzer: Option<String>,  // None = keyword, the value is one term
}

impl SchemaField {
    /// Stored, indexed, untokenized field (identifiers, unique keys).
    pub fn keyword(name: &str) -> Self {
        SchemaField {
            name: name.to_string(),
            indexed: true,
            stored: true,
            analyzer: None,
        }
    }

    /// Stored, indexed field analyzed by the named analyzer.
    pub fn text(name: &str, analyzer: &str) -> Self {
        SchemaField {
            name: name.to_string(),
            indexed: true,
            stored: true,
            analyzer: Some(analyzer.to_string()),
        }
    }

    pub fn stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Turns a value/boost pair into a field instance the directory can store.
    pub fn to_indexable(&self, value: &str, boost: Option<f32>) -> IndexableField {
        IndexableField {
            name: self.name.clone(),
            value: value.to_string(),
            boost: boost.unwrap_or(1.0),
            stored: self.stored,
            indexed: self.indexed,
            terms: None,
        }
    }
}

/// Field list of one index, with its optional uniqueness key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    fields: IndexMap<String, SchemaField>,
    unique_field: Option<String>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn add_field(mut self, field: SchemaField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Declares the uniqueness key. The field should be a keyword field so
    /// that its value is a single term.
    pub fn with_unique_field(mut self, name: &str) -> Self {
        self.unique_field = Some(name.to_string());
        self
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.values()
    }

    pub fn unique_field(&self) -> Option<&SchemaField> {
        self.unique_field.as_deref().and_then(|name| self.fields.get(name))
    }
}
