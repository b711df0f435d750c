use std::collections::BTreeMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use crate::analysis::analyzer::PerFieldAnalyzer;
use crate::core::types::DocId;
use crate::storage::document::{IndexableDocument, StoredDocument, Term};

/// Documents, deletions and postings of one index generation.
///
/// Deleted documents keep their slot (ids are stable) and stay in the
/// postings; every lookup filters them through `deleted`.
#[derive(Debug, Clone, Default)]
pub struct IndexSegment {
    docs: Vec<StoredDocument>,
    deleted: RoaringBitmap,
    postings: BTreeMap<Term, RoaringBitmap>,
}

impl IndexSegment {
    pub fn max_doc(&self) -> u32 {
        self.docs.len() as u32
    }

    pub fn num_docs(&self) -> u32 {
        self.max_doc() - self.deleted.len() as u32
    }

    pub fn is_deleted(&self, id: DocId) -> bool {
        self.deleted.contains(id.0)
    }

    /// Stored fields of a live document.
    pub fn document(&self, id: DocId) -> Option<&StoredDocument> {
        if self.is_deleted(id) {
            return None;
        }
        self.docs.get(id.0 as usize)
    }

    pub fn live_docs(&self) -> impl Iterator<Item = (DocId, &StoredDocument)> {
        self.docs
            .iter()
            .enumerate()
            .map(|(id, doc)| (DocId(id as u32), doc))
            .filter(|(id, _)| !self.is_deleted(*id))
    }

    /// Live documents indexing `term`, ascending.
    pub fn term_docs(&self, term: &Term) -> Vec<DocId> {
        match self.postings.get(term) {
            Some(bitmap) => (bitmap - &self.deleted).iter().map(DocId).collect(),
            None => Vec::new(),
        }
    }

    pub fn add(&mut self, doc: &IndexableDocument, analyzer: &PerFieldAnalyzer) -> DocId {
        let id = self.max_doc();

        for field in doc.fields.iter().filter(|f| f.indexed) {
            let terms = match &field.terms {
                Some(terms) => terms.clone(),
                None => analyzer.terms(&field.name, &field.value),
            };
            for text in terms {
                self.postings
                    .entry(Term { field: field.name.clone(), text })
                    .or_default()
                    .insert(id);
            }
        }

        self.docs.push(doc.to_stored());
        DocId(id)
    }

    /// Marks every live document indexing `term` deleted; returns how many.
    pub fn delete_term(&mut self, term: &Term) -> u64 {
        let Some(bitmap) = self.postings.get(term) else {
            return 0;
        };
        let live = bitmap - &self.deleted;
        let count = live.len();
        self.deleted |= live;
        count
    }

    /// Marks one document deleted; false when already deleted or unknown.
    pub fn delete(&mut self, id: DocId) -> bool {
        id.0 < self.max_doc() && self.deleted.insert(id.0)
    }

    pub fn delete_all(&mut self) {
        *self = IndexSegment::default();
    }

    /// Appends the live documents of `other`, remapping their postings to
    /// the new ids. Returns the number of documents appended.
    pub fn append(&mut self, other: &IndexSegment) -> u32 {
        let base = self.max_doc();
        let mut remap: Vec<Option<u32>> = vec![None; other.docs.len()];
        let mut next = base;

        for (id, doc) in other.live_docs() {
            remap[id.0 as usize] = Some(next);
            self.docs.push(doc.clone());
            next += 1;
        }

        for (term, bitmap) in &other.postings {
            let mapped: RoaringBitmap = bitmap
                .iter()
                .filter_map(|old| remap.get(old as usize).copied().flatten())
                .collect();
            if !mapped.is_empty() {
                *self.postings.entry(term.clone()).or_default() |= mapped;
            }
        }

        next - base
    }

    pub fn to_data(&self) -> SegmentData {
        SegmentData {
            docs: self.docs.clone(),
            deleted: self.deleted.iter().collect(),
            postings: self.postings
                .iter()
                .map(|(term, bitmap)| (term.clone(), bitmap.iter().collect()))
                .collect(),
        }
    }

    pub fn from_data(data: SegmentData) -> Self {
        IndexSegment {
            docs: data.docs,
            deleted: data.deleted.into_iter().collect(),
            postings: data.postings
                .into_iter()
                .map(|(term, ids)| (term, ids.into_iter().collect()))
                .collect(),
        }
    }
}

/// Serializable form of a segment, written by checkpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentData {
    pub docs: Vec<StoredDocument>,
    pub deleted: Vec<u32>,
    pub postings: Vec<(Term, Vec<u32>)>,
}
