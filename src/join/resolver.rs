use std::sync::Arc;
use crate::core::error::{Error, Result};
use crate::core::timer::Timer;
use crate::search::collector::Collector;
use crate::search::document::ResultDocument;
use crate::search::facet::{self, FacetTable, FacetTerms};
use crate::search::results::SearchResults;

/// One join slot of a primary result: maps primary hits to documents of a
/// foreign result.
///
/// Starts unattached; `attach` binds the foreign result once. Resolution
/// also needs a collector with a join-document lookup, and returns `None`
/// for every position until one is set.
pub struct JoinResolver {
    position: usize,
    param_position: String,
    return_fields: bool,
    foreign: Option<Arc<SearchResults>>,
    field_names: Vec<String>,
    collector: Option<Arc<dyn Collector>>,
    facets: Option<FacetTable>,
}

impl JoinResolver {
    pub fn new(position: usize, param_position: &str, return_fields: bool) -> Self {
        JoinResolver {
            position,
            param_position: param_position.to_string(),
            return_fields,
            foreign: None,
            field_names: Vec::new(),
            collector: None,
            facets: None,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn param_position(&self) -> &str {
        &self.param_position
    }

    /// Whether foreign fields are copied into the primary document view.
    pub fn is_return_fields(&self) -> bool {
        self.return_fields
    }

    pub fn is_attached(&self) -> bool {
        self.foreign.is_some()
    }

    pub fn foreign(&self) -> Option<&Arc<SearchResults>> {
        self.foreign.as_ref()
    }

    /// Fields read from foreign documents, sorted.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Binds the foreign result. Fails if one is already bound.
    pub fn attach(&mut self, foreign: Arc<SearchResults>) -> Result<()> {
        if self.foreign.is_some() {
            return Err(Error::InvalidState(format!(
                "join slot {} already has a foreign result",
                self.position
            )));
        }
        self.field_names = foreign.request().projected_fields();
        self.foreign = Some(foreign);
        Ok(())
    }

    /// Keeps `collector` if it can map hits to foreign documents; ignores
    /// it otherwise.
    pub fn set_collector(&mut self, collector: &Arc<dyn Collector>) {
        if collector.join_docs().is_some() {
            self.collector = Some(collector.clone());
        }
    }

    /// The foreign document joined to primary hit `pos`, scored with the
    /// collector's foreign score (0 without one).
    pub fn resolve(&self, pos: usize, timer: Option<&Timer>) -> Result<Option<ResultDocument>> {
        let Some(collector) = &self.collector else {
            return Ok(None);
        };
        let Some(join_docs) = collector.join_docs() else {
            return Ok(None);
        };
        let Some(foreign) = &self.foreign else {
            return Ok(None);
        };
        let Some(foreign_id) = join_docs.foreign_doc_id(pos, self.position) else {
            return Ok(None);
        };

        let score = collector
            .join_scores()
            .map(|scores| scores.foreign_score(pos, self.position))
            .unwrap_or(0.0);

        let doc = ResultDocument::load(foreign.reader(), foreign_id, foreign.request(), &self.field_names, timer)
            .map_err(Error::search)?;
        Ok(Some(doc.with_score(score).with_join_parameter(&self.param_position)))
    }

    /// Records the facet table `name` for this slot, replacing an earlier
    /// one of the same name.
    pub fn add_facet(&mut self, name: &str, terms: FacetTerms) {
        self.facets
            .get_or_insert_with(FacetTable::new)
            .insert(facet::intern(name), terms);
    }

    pub fn facets(&self) -> Option<&FacetTable> {
        self.facets.as_ref()
    }

    /// Copies every recorded facet table into `target`.
    pub fn merge_facets_into(&self, target: &mut FacetTable) {
        let Some(facets) = &self.facets else {
            return;
        };
        for (name, terms) in facets {
            target.insert(name.clone(), terms.clone());
        }
    }
}
