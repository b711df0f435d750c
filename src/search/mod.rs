pub mod collector;
pub mod document;
pub mod facet;
pub mod request;
pub mod results;

pub use collector::{CollapseCountLookup, CollapseCounts, Collector, JoinCollector, JoinDocLookup, JoinScoreLookup};
pub use document::ResultDocument;
pub use facet::{FacetTable, FacetTerms};
pub use request::{JoinItem, SearchRequest, SnippetField};
pub use results::SearchResults;
