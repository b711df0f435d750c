use std::sync::Arc;
use std::time::Duration;
use crate::analysis::analyzer::PerFieldAnalyzer;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::storage::document::{IndexableDocument, StoredDocument, Term};
use crate::storage::segment::IndexSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Start from an empty index, replacing whatever was there.
    Create,
    /// Continue from the last published generation.
    Append,
}

#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub ram_buffer_mb: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions { ram_buffer_mb: 128 }
    }
}

/// Physical storage of one index.
///
/// `lock`/`unlock` guard writer lifetime across processes; in-process
/// exclusion is the coordinator's job.
pub trait IndexDirectory: Send + Sync {
    fn name(&self) -> &str;

    /// Takes the directory write lock, failing with `LockTimeout` past `timeout`.
    fn lock(&self, timeout: Duration) -> Result<()>;

    fn unlock(&self);

    fn open_writer(&self, mode: OpenMode, options: &WriterOptions) -> Result<Arc<dyn IndexWriterHandle>>;

    fn open_reader(&self) -> Result<Box<dyn IndexReaderHandle>>;

    /// Read-only view of the last published generation, for result assembly.
    fn searcher(&self) -> Result<Arc<dyn FieldReader>>;

    /// The last published generation, for absorption by another index.
    fn segment(&self) -> Result<Arc<IndexSegment>>;
}

/// An open writer. Implementations accept concurrent `add_document` /
/// `update_document` calls on one handle; batch ingestion relies on it.
pub trait IndexWriterHandle: Send + Sync {
    fn add_document(&self, doc: IndexableDocument, analyzer: &PerFieldAnalyzer) -> Result<()>;

    /// Deletes every document indexing `term`, then adds `doc`, as one step.
    fn update_document(&self, term: &Term, doc: IndexableDocument, analyzer: &PerFieldAnalyzer) -> Result<()>;

    fn delete_all(&self) -> Result<()>;

    /// Appends every live document of `source`.
    fn add_indexes(&self, source: &dyn IndexDirectory) -> Result<()>;

    /// Publishes the writer's changes. Later calls are no-ops; any other
    /// call after close fails with `WriterClosed`.
    fn close(&self) -> Result<()>;
}

pub trait FieldReader: Send + Sync {
    /// Stored values of `fields` for a live document, `None` when the id is
    /// unknown or deleted.
    fn stored_fields(&self, id: DocId, fields: &[String]) -> Result<Option<StoredDocument>>;
}

/// A reader that may mark documents deleted; marks are published on close.
pub trait IndexReaderHandle: FieldReader {
    fn max_doc(&self) -> u32;

    fn num_docs(&self) -> u32;

    fn is_deleted(&self, id: DocId) -> bool;

    fn delete(&mut self, id: DocId) -> Result<()>;

    fn term_docs(&self, term: &Term) -> Vec<DocId>;

    fn close(self: Box<Self>) -> Result<()>;
}
