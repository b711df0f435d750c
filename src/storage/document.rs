use indexmap::IndexMap;
use serde::{Serialize, Deserialize};

/// An indexed term: a field name and one of its terms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub text: String,
}

impl Term {
    pub fn new(field: &str, text: &str) -> Self {
        Term {
            field: field.to_string(),
            text: text.to_string(),
        }
    }
}

/// One field instance ready for the directory
#[derive(Debug, Clone, PartialEq)]
pub struct IndexableField {
    pub name: String,
    pub value: String,
    pub boost: f32,
    pub stored: bool,
    pub indexed: bool,
    pub terms: Option<Vec<String>>,  // Pre-analyzed terms; bypass the analyzer when set
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexableDocument {
    pub fields: Vec<IndexableField>,
}

impl IndexableDocument {
    pub fn new() -> Self {
        IndexableDocument::default()
    }

    pub fn add(&mut self, field: IndexableField) {
        self.fields.push(field);
    }

    /// First value of the named field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stored part of the document, values grouped per field in order.
    pub fn to_stored(&self) -> StoredDocument {
        let mut stored = StoredDocument::default();
        for field in self.fields.iter().filter(|f| f.stored) {
            stored.push(&field.name, field.value.clone());
        }
        stored
    }
}

/// Stored fields of a committed document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub fields: IndexMap<String, Vec<String>>,
}

impl StoredDocument {
    pub fn push(&mut self, name: &str, value: String) {
        match self.fields.get_mut(name) {
            Some(values) => values.push(value),
            None => {
                self.fields.insert(name.to_string(), vec![value]);
            }
        }
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// Keeps only `names`, in the order given.
    pub fn project(&self, names: &[String]) -> StoredDocument {
        let mut projected = StoredDocument::default();
        for name in names {
            if let Some(values) = self.fields.get(name) {
                projected.fields.insert(name.clone(), values.clone());
            }
        }
        projected
    }
}
