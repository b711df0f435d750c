use crate::core::types::DocId;

/// Foreign document matched by join slot `join_position` for primary hit `pos`.
pub trait JoinDocLookup: Send + Sync {
    fn foreign_doc_id(&self, pos: usize, join_position: usize) -> Option<DocId>;
}

pub trait JoinScoreLookup: Send + Sync {
    fn foreign_score(&self, pos: usize, join_position: usize) -> f32;
}

/// Number of duplicates folded into primary hit `pos`.
pub trait CollapseCountLookup: Send + Sync {
    fn collapse_count(&self, pos: usize) -> u32;
}

/// What a query executor hands back after collection. Each capability is
/// optional; consumers fall back to their defaults when one is missing.
pub trait Collector: Send + Sync {
    fn join_docs(&self) -> Option<&dyn JoinDocLookup> {
        None
    }

    fn join_scores(&self) -> Option<&dyn JoinScoreLookup> {
        None
    }

    fn collapse_counts(&self) -> Option<&dyn CollapseCountLookup> {
        None
    }
}

/// Per-hit join matches, with optional foreign scores and collapse counts.
#[derive(Debug, Clone, Default)]
pub struct JoinCollector {
    doc_ids: Vec<Vec<DocId>>,
    scores: Option<Vec<Vec<f32>>>,
    collapse_counts: Option<Vec<u32>>,
}

impl JoinCollector {
    pub fn new() -> Self {
        JoinCollector::default()
    }

    /// Records the foreign matches of the next primary hit, one per join slot.
    pub fn push(&mut self, foreign: Vec<DocId>) {
        if let Some(scores) = &mut self.scores {
            scores.push(Vec::new());
        }
        self.doc_ids.push(foreign);
    }

    /// Like `push`, with a foreign score per join slot.
    pub fn push_scored(&mut self, foreign: Vec<(DocId, f32)>) {
        let rows = self.doc_ids.len();
        let scores = self.scores.get_or_insert_with(|| vec![Vec::new(); rows]);
        scores.push(foreign.iter().map(|(_, score)| *score).collect());
        self.doc_ids.push(foreign.into_iter().map(|(id, _)| id).collect());
    }

    pub fn with_collapse_counts(mut self, counts: Vec<u32>) -> Self {
        self.collapse_counts = Some(counts);
        self
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }
}

impl JoinDocLookup for JoinCollector {
    fn foreign_doc_id(&self, pos: usize, join_position: usize) -> Option<DocId> {
        self.doc_ids.get(pos)?.get(join_position).copied()
    }
}

impl JoinScoreLookup for JoinCollector {
    fn foreign_score(&self, pos: usize, join_position: usize) -> f32 {
        self.scores
            .as_ref()
            .and_then(|scores| scores.get(pos)?.get(join_position).copied())
            .unwrap_or(0.0)
    }
}

impl CollapseCountLookup for JoinCollector {
    fn collapse_count(&self, pos: usize) -> u32 {
        self.collapse_counts
            .as_ref()
            .and_then(|counts| counts.get(pos).copied())
            .unwrap_or(0)
    }
}

impl Collector for JoinCollector {
    fn join_docs(&self) -> Option<&dyn JoinDocLookup> {
        Some(self)
    }

    fn join_scores(&self) -> Option<&dyn JoinScoreLookup> {
        self.scores.as_ref().map(|_| self as &dyn JoinScoreLookup)
    }

    fn collapse_counts(&self) -> Option<&dyn CollapseCountLookup> {
        self.collapse_counts.as_ref().map(|_| self as &dyn CollapseCountLookup)
    }
}

/// Collapse counts alone, for results without joins.
#[derive(Debug, Clone, Default)]
pub struct CollapseCounts(pub Vec<u32>);

impl CollapseCountLookup for CollapseCounts {
    fn collapse_count(&self, pos: usize) -> u32 {
        self.0.get(pos).copied().unwrap_or(0)
    }
}

impl Collector for CollapseCounts {
    fn collapse_counts(&self) -> Option<&dyn CollapseCountLookup> {
        Some(self)
    }
}
