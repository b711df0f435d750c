use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::join::resolver::JoinResolver;

/// A stored field rendered as a snippet of at most `max_chars` characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetField {
    pub name: String,
    pub max_chars: usize,
}

impl SnippetField {
    pub fn new(name: &str, max_chars: usize) -> Self {
        SnippetField {
            name: name.to_string(),
            max_chars,
        }
    }
}

/// One configured join slot of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinItem {
    pub param_position: String,   // Token substituted with the foreign value
    pub return_fields: bool,      // Copy foreign fields into the primary view
}

/// The parts of a search request result assembly depends on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub start: usize,
    pub rows: usize,
    pub return_fields: Vec<String>,
    pub snippet_fields: Vec<SnippetField>,
    pub joins: Vec<JoinItem>,
}

impl SearchRequest {
    pub fn new(start: usize, rows: usize) -> Self {
        SearchRequest {
            start,
            rows,
            ..SearchRequest::default()
        }
    }

    pub fn with_return_field(mut self, name: &str) -> Self {
        self.return_fields.push(name.to_string());
        self
    }

    pub fn with_snippet_field(mut self, name: &str, max_chars: usize) -> Self {
        self.snippet_fields.push(SnippetField::new(name, max_chars));
        self
    }

    pub fn with_join(mut self, param_position: &str, return_fields: bool) -> Self {
        self.joins.push(JoinItem {
            param_position: param_position.to_string(),
            return_fields,
        });
        self
    }

    /// Exclusive end of the requested window.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.rows)
    }

    /// Return fields and snippet fields, deduplicated and sorted.
    pub fn projected_fields(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .return_fields
            .iter()
            .map(String::as_str)
            .chain(self.snippet_fields.iter().map(|f| f.name.as_str()))
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// One unattached resolver per join slot, in slot order.
    pub fn join_resolvers(&self) -> Vec<JoinResolver> {
        self.joins
            .iter()
            .enumerate()
            .map(|(position, item)| JoinResolver::new(position, &item.param_position, item.return_fields))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projected_fields_are_sorted_and_unique() {
        let request = SearchRequest::new(0, 10)
            .with_return_field("title")
            .with_return_field("id")
            .with_snippet_field("title", 50)
            .with_snippet_field("body", 80);
        assert_eq!(request.projected_fields(), vec!["body", "id", "title"]);
    }

    #[test]
    fn test_end_saturates() {
        assert_eq!(SearchRequest::new(5, 10).end(), 15);
        assert_eq!(SearchRequest::new(usize::MAX, 1).end(), usize::MAX);
    }

    #[test]
    fn test_join_resolvers_follow_slot_order() {
        let request = SearchRequest::new(0, 10)
            .with_join("$1", true)
            .with_join("$2", false);
        let joins = request.join_resolvers();
        assert_eq!(joins.len(), 2);
        assert_eq!(joins[0].position(), 0);
        assert!(joins[0].is_return_fields());
        assert_eq!(joins[1].param_position(), "$2");
        assert!(!joins[1].is_return_fields());
    }
}
