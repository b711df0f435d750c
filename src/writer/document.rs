use crate::analysis::analyzer::PerFieldAnalyzer;
use crate::core::types::{PendingDocument, PreparedDocument};
use crate::schema::schema::Schema;
use crate::storage::document::IndexableDocument;

/// Builds the indexable form of a pending document.
///
/// Fields the schema does not declare are dropped, as are values that
/// would index no term at all (empty strings, stop-word-only text).
pub fn to_indexable(schema: &Schema, analyzer: &PerFieldAnalyzer, doc: &PendingDocument) -> IndexableDocument {
    let mut indexable = IndexableDocument::new();

    for (name, items) in &doc.fields {
        let Some(field) = schema.field(name) else {
            continue;
        };
        for item in items {
            if analyzer.is_any_token(name, &item.value) {
                indexable.add(field.to_indexable(&item.value, item.boost));
            }
        }
    }

    indexable
}

/// Builds the indexable form of an already-analyzed document.
///
/// Stored values keep their schema flags and go through the analyzer unless
/// the same field also carries explicit terms. A terms-only field stores each
/// term as its own value.
pub fn prepared_to_indexable(schema: &Schema, doc: &PreparedDocument) -> IndexableDocument {
    let mut indexable = IndexableDocument::new();

    for prepared in &doc.fields {
        let Some(field) = schema.field(&prepared.name) else {
            continue;
        };

        let explicit_terms = doc
            .fields
            .iter()
            .filter(|f| f.name == prepared.name)
            .find_map(|f| f.terms.as_ref());

        match (&prepared.stored, &prepared.terms) {
            (Some(values), _) => {
                for (i, value) in values.iter().enumerate() {
                    let mut instance = field.to_indexable(value, None);
                    if let Some(terms) = explicit_terms {
                        // Terms are indexed once, on the first instance.
                        instance.terms = Some(if i == 0 { terms.clone() } else { Vec::new() });
                    }
                    indexable.add(instance);
                }
            }
            (None, Some(terms)) => {
                let has_stored = doc
                    .fields
                    .iter()
                    .any(|f| f.name == prepared.name && f.stored.is_some());
                if has_stored {
                    continue;
                }
                for term in terms {
                    let mut instance = field.to_indexable(term, None);
                    instance.terms = Some(vec![term.clone()]);
                    indexable.add(instance);
                }
            }
            (None, None) => {}
        }
    }

    indexable
}
