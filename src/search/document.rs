use indexmap::IndexMap;
use crate::core::error::Result;
use crate::core::timer::{self, Timer};
use crate::core::types::DocId;
use crate::search::request::SearchRequest;
use crate::storage::FieldReader;
use crate::storage::document::StoredDocument;

/// Materialized view of one hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultDocument {
    pub id: DocId,
    pub fields: StoredDocument,
    pub snippets: IndexMap<String, Vec<String>>,
    pub score: f32,
    pub distance: Option<f32>,
    pub collapse_count: u32,
    pub join_parameter: Option<String>,   // Set on documents produced by a join slot
    pub joins: Vec<ResultDocument>,
}

impl ResultDocument {
    /// Reads `field_names` of `id` and shapes them per `request`: its return
    /// fields are copied as-is, its snippet fields are cut to their limit.
    /// A document the reader does not know yields empty fields.
    pub fn load(
        reader: &dyn FieldReader,
        id: DocId,
        request: &SearchRequest,
        field_names: &[String],
        timer: Option<&Timer>,
    ) -> Result<Self> {
        let stored = {
            let _scope = timer::scope(timer, "stored fields");
            reader.stored_fields(id, field_names)?.unwrap_or_default()
        };

        let mut snippets = IndexMap::new();
        for field in &request.snippet_fields {
            let values = stored
                .values(&field.name)
                .iter()
                .map(|value| leading_fragment(value, field.max_chars))
                .collect();
            snippets.insert(field.name.clone(), values);
        }

        Ok(ResultDocument {
            id,
            fields: stored.project(&request.return_fields),
            snippets,
            score: 0.0,
            distance: None,
            collapse_count: 0,
            join_parameter: None,
            joins: Vec::new(),
        })
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn with_distance(mut self, distance: Option<f32>) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_collapse_count(mut self, count: u32) -> Self {
        self.collapse_count = count;
        self
    }

    pub fn with_join_parameter(mut self, param: &str) -> Self {
        self.join_parameter = Some(param.to_string());
        self
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.first(field)
    }

    pub fn snippet(&self, field: &str) -> Option<&str> {
        self.snippets.get(field)?.first().map(String::as_str)
    }
}

/// The first `max_chars` characters of `value`, trailing whitespace trimmed.
pub fn leading_fragment(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => value[..cut].trim_end().to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_fragment_respects_char_boundaries() {
        assert_eq!(leading_fragment("héllo wörld", 7), "héllo w");
        assert_eq!(leading_fragment("short", 10), "short");
        assert_eq!(leading_fragment("two words", 4), "two");
        assert_eq!(leading_fragment("abc", 0), "");
    }

    struct OneDoc(StoredDocument);

    impl FieldReader for OneDoc {
        fn stored_fields(&self, id: DocId, fields: &[String]) -> Result<Option<StoredDocument>> {
            Ok((id == DocId(0)).then(|| self.0.project(fields)))
        }
    }

    #[test]
    fn test_load_splits_return_and_snippet_fields() {
        let mut stored = StoredDocument::default();
        stored.push("id", "doc1".to_string());
        stored.push("body", "a fairly long body text".to_string());
        stored.push("secret", "hidden".to_string());
        let reader = OneDoc(stored);

        let request = SearchRequest::new(0, 10)
            .with_return_field("id")
            .with_snippet_field("body", 8);
        let doc = ResultDocument::load(&reader, DocId(0), &request, &request.projected_fields(), None).unwrap();

        assert_eq!(doc.value("id"), Some("doc1"));
        assert_eq!(doc.value("body"), None);
        assert_eq!(doc.value("secret"), None);
        assert_eq!(doc.snippet("body"), Some("a fairly"));

        let missing = ResultDocument::load(&reader, DocId(7), &request, &request.projected_fields(), None).unwrap();
        assert!(missing.fields.fields.is_empty());
        assert_eq!(missing.snippet("body"), None);
    }
}
