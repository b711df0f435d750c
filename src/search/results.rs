use std::fmt;
use std::sync::Arc;
use crate::core::error::{Error, Result};
use crate::core::timer::{self, Timer};
use crate::core::types::DocId;
use crate::join::resolver::JoinResolver;
use crate::search::collector::Collector;
use crate::search::document::ResultDocument;
use crate::search::facet::{self, FacetTable, FacetTerms};
use crate::search::request::SearchRequest;
use crate::storage::FieldReader;

/// Ranked hits of one executed query, and everything needed to turn a
/// position into a `ResultDocument`.
///
/// Built once per query: the executor attaches the hit list, records
/// facets and hands over its collector; callers then read positions.
pub struct SearchResults {
    request: SearchRequest,
    projected_fields: Vec<String>,
    reader: Arc<dyn FieldReader>,
    docs: Option<Vec<DocId>>,
    scores: Option<Vec<f32>>,
    distances: Option<Vec<f32>>,
    num_found: u64,
    max_score: f32,
    collapsed_doc_count: u64,
    facets: FacetTable,
    joins: Vec<JoinResolver>,
    collector: Option<Arc<dyn Collector>>,
}

impl SearchResults {
    /// Empty results over `reader`, with one unattached join resolver per
    /// join slot of `request`.
    pub fn new(request: SearchRequest, reader: Arc<dyn FieldReader>) -> Self {
        SearchResults {
            projected_fields: request.projected_fields(),
            joins: request.join_resolvers(),
            request,
            reader,
            docs: None,
            scores: None,
            distances: None,
            num_found: 0,
            max_score: 0.0,
            collapsed_doc_count: 0,
            facets: FacetTable::new(),
            collector: None,
        }
    }

    /// Installs the ranked hit list. Scores and distances, when given, must
    /// line up with `docs`. Allowed once.
    pub fn attach(&mut self, docs: Vec<DocId>, scores: Option<Vec<f32>>, distances: Option<Vec<f32>>) -> Result<()> {
        if self.docs.is_some() {
            return Err(Error::InvalidState("hits already attached".to_string()));
        }
        for (name, len) in [
            ("scores", scores.as_ref().map(Vec::len)),
            ("distances", distances.as_ref().map(Vec::len)),
        ] {
            if let Some(len) = len {
                if len != docs.len() {
                    return Err(Error::InvalidArgument(format!(
                        "{name} has {len} entries for {} hits",
                        docs.len()
                    )));
                }
            }
        }

        self.max_score = scores
            .as_ref()
            .map(|s| s.iter().copied().fold(0.0, f32::max))
            .unwrap_or(0.0);
        self.num_found = self.num_found.max(docs.len() as u64);
        self.docs = Some(docs);
        self.scores = scores;
        self.distances = distances;
        Ok(())
    }

    /// Total matches of the query; never below the number of attached hits.
    pub fn set_num_found(&mut self, num_found: u64) {
        self.num_found = num_found.max(self.doc_len() as u64);
    }

    pub fn set_collapsed_doc_count(&mut self, count: u64) {
        self.collapsed_doc_count = count;
    }

    /// Hands the executor's collector to these results and to every join
    /// slot.
    pub fn set_collector(&mut self, collector: Arc<dyn Collector>) {
        for join in &mut self.joins {
            join.set_collector(&collector);
        }
        self.collector = Some(collector);
    }

    /// Records the facet table of one field; a later call for the same
    /// field replaces it.
    pub fn add_facet(&mut self, name: &str, terms: FacetTerms) {
        self.facets.insert(facet::intern(name), terms);
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    pub fn reader(&self) -> &dyn FieldReader {
        self.reader.as_ref()
    }

    pub fn num_found(&self) -> u64 {
        self.num_found
    }

    pub fn max_score(&self) -> f32 {
        self.max_score
    }

    pub fn collapsed_doc_count(&self) -> u64 {
        self.collapsed_doc_count
    }

    pub fn docs(&self) -> &[DocId] {
        self.docs.as_deref().unwrap_or(&[])
    }

    /// Number of attached hits.
    pub fn doc_len(&self) -> usize {
        self.docs().len()
    }

    /// Hits inside the requested window.
    pub fn document_count(&self) -> usize {
        let end = self.request.end().min(self.doc_len());
        end.saturating_sub(self.request.start)
    }

    pub fn score_at(&self, pos: usize) -> f32 {
        self.scores
            .as_ref()
            .and_then(|scores| scores.get(pos).copied())
            .unwrap_or(0.0)
    }

    pub fn distance_at(&self, pos: usize) -> Option<f32> {
        self.distances.as_ref()?.get(pos).copied()
    }

    pub fn collapse_count_at(&self, pos: usize) -> u32 {
        self.collector
            .as_ref()
            .and_then(|c| c.collapse_counts())
            .map(|lookup| lookup.collapse_count(pos))
            .unwrap_or(0)
    }

    pub fn facets(&self) -> &FacetTable {
        &self.facets
    }

    pub fn joins(&self) -> &[JoinResolver] {
        &self.joins
    }

    pub fn join_mut(&mut self, position: usize) -> Option<&mut JoinResolver> {
        self.joins.get_mut(position)
    }

    /// The hit at absolute position `pos`.
    pub fn document_at(&self, pos: usize, timer: Option<&Timer>) -> Result<ResultDocument> {
        let len = self.doc_len();
        let Some(&id) = self.docs().get(pos) else {
            return Err(Error::OutOfRangeResult { pos, len });
        };

        let _scope = timer::scope(timer, "document");
        let doc = ResultDocument::load(self.reader.as_ref(), id, &self.request, &self.projected_fields, timer)
            .map_err(Error::search)?;
        Ok(doc
            .with_score(self.score_at(pos))
            .with_distance(self.distance_at(pos))
            .with_collapse_count(self.collapse_count_at(pos)))
    }

    /// Foreign documents of hit `pos`, one entry per join slot that copies
    /// its fields, in slot order. `None` where the slot matched nothing.
    pub fn join_documents(&self, pos: usize, timer: Option<&Timer>) -> Result<Vec<Option<ResultDocument>>> {
        self.joins
            .iter()
            .filter(|join| join.is_return_fields())
            .map(|join| join.resolve(pos, timer))
            .collect()
    }

    /// The hit at `pos` carrying its joined documents.
    pub fn document_with_joins(&self, pos: usize, timer: Option<&Timer>) -> Result<ResultDocument> {
        let mut doc = self.document_at(pos, timer)?;
        doc.joins = self.join_documents(pos, timer)?.into_iter().flatten().collect();
        Ok(doc)
    }

    /// Merges every join slot's facets into the primary facet table.
    pub fn populate_join_facets(&mut self) {
        for join in &self.joins {
            join.merge_facets_into(&mut self.facets);
        }
    }

    /// Documents of the requested window, in rank order. Each call starts
    /// over from the first window position.
    pub fn iterate<'a>(&'a self, timer: Option<&'a Timer>) -> ResultIter<'a> {
        let start = self.request.start;
        ResultIter {
            results: self,
            timer,
            pos: start,
            end: start + self.document_count(),
        }
    }
}

impl fmt::Display for SearchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} found.", self.num_found)?;
        if let Some(docs) = &self.docs {
            write!(f, " {} docs.", docs.len())?;
        }
        write!(f, " MaxScore: {}", self.max_score)
    }
}

impl fmt::Debug for SearchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResults")
            .field("request", &self.request)
            .field("num_found", &self.num_found)
            .field("docs", &self.doc_len())
            .field("max_score", &self.max_score)
            .field("joins", &self.joins.len())
            .finish()
    }
}

pub struct ResultIter<'a> {
    results: &'a SearchResults,
    timer: Option<&'a Timer>,
    pos: usize,
    end: usize,
}

impl Iterator for ResultIter<'_> {
    type Item = Result<ResultDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let pos = self.pos;
        self.pos += 1;
        Some(self.results.document_at(pos, self.timer))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ResultIter<'_> {}
