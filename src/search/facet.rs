use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use indexmap::IndexMap;
use parking_lot::Mutex;

/// Term → count of one faceted field, in producer order.
pub type FacetTerms = IndexMap<String, u64>;

/// Field name → facet terms, in insertion order.
pub type FacetTable = IndexMap<Arc<str>, FacetTerms>;

static FACET_NAMES: OnceLock<Mutex<HashSet<Arc<str>>>> = OnceLock::new();

/// Returns the shared instance of a facet name, so the same name recorded
/// across many documents and join slots points at one allocation.
pub fn intern(name: &str) -> Arc<str> {
    let mut names = FACET_NAMES.get_or_init(Default::default).lock();
    if let Some(existing) = names.get(name) {
        return existing.clone();
    }
    let interned: Arc<str> = Arc::from(name);
    names.insert(interned.clone());
    interned
}
