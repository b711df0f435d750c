use indexmap::IndexMap;
use serde::{Serialize, Deserialize};
use crate::analysis::language::Language;

/// Internal document number inside one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

/// One value of a field, with its optional index-time boost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValueItem {
    pub value: String,
    pub boost: Option<f32>,
}

impl FieldValueItem {
    pub fn new(value: impl Into<String>) -> Self {
        FieldValueItem {
            value: value.into(),
            boost: None,
        }
    }

    pub fn boosted(value: impl Into<String>, boost: f32) -> Self {
        FieldValueItem {
            value: value.into(),
            boost: Some(boost),
        }
    }
}

/// A document submitted for indexing.
///
/// Field order and value order are kept as submitted. The language tag picks
/// the analyzer chain used when the document is converted to indexable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingDocument {
    pub lang: Language,
    pub fields: IndexMap<String, Vec<FieldValueItem>>,
}

impl PendingDocument {
    pub fn new(lang: Language) -> Self {
        PendingDocument {
            lang,
            fields: IndexMap::new(),
        }
    }

    pub fn add_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, FieldValueItem::new(value));
        self
    }

    pub fn add_boosted_field(mut self, name: &str, value: impl Into<String>, boost: f32) -> Self {
        self.push(name, FieldValueItem::boosted(value, boost));
        self
    }

    pub fn push(&mut self, name: &str, item: FieldValueItem) {
        self.fields.entry(name.to_string()).or_default().push(item);
    }

    pub fn values(&self, name: &str) -> &[FieldValueItem] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(|item| item.value.as_str())
    }
}

/// A field of an already-analyzed document: stored values and/or the exact
/// terms to index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreparedField {
    pub name: String,
    pub stored: Option<Vec<String>>,
    pub terms: Option<Vec<String>>,
}

/// A document whose analysis already happened elsewhere (e.g. copied out of
/// another index); indexed without consulting the analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreparedDocument {
    pub fields: Vec<PreparedField>,
}

impl PreparedDocument {
    pub fn add_stored(mut self, name: &str, values: Vec<String>) -> Self {
        self.fields.push(PreparedField {
            name: name.to_string(),
            stored: Some(values),
            terms: None,
        });
        self
    }

    pub fn add_terms(mut self, name: &str, terms: Vec<String>) -> Self {
        self.fields.push(PreparedField {
            name: name.to_string(),
            stored: None,
            terms: Some(terms),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_document_keeps_value_order() {
        let doc = PendingDocument::new(Language::English)
            .add_field("title", "first")
            .add_boosted_field("title", "second", 2.0)
            .add_field("id", "doc1");

        let titles: Vec<_> = doc.values("title").iter().map(|v| v.value.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(doc.values("title")[1].boost, Some(2.0));
        assert_eq!(doc.first_value("id"), Some("doc1"));
        assert!(doc.values("missing").is_empty());
        assert_eq!(doc.fields.keys().collect::<Vec<_>>(), vec!["title", "id"]);
    }
}
