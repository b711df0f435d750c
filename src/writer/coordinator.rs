use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};
use crate::analysis::analyzer::{AnalyzerResolver, PerFieldAnalyzer};
use crate::analysis::language::Language;
use crate::core::config::IndexConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, PendingDocument, PreparedDocument};
use crate::schema::schema::Schema;
use crate::storage::document::{IndexableDocument, Term};
use crate::storage::error::StorageError;
use crate::storage::{FieldReader, IndexDirectory, IndexWriterHandle, OpenMode, WriterOptions};
use crate::writer::batch::BatchPool;
use crate::writer::document::{prepared_to_indexable, to_indexable};

/// Acceptance predicate consulted before a pending document is written.
pub trait DocumentFilter: Send + Sync {
    fn accept(&self, doc: &PendingDocument) -> bool;
}

impl<F> DocumentFilter for F
where
    F: Fn(&PendingDocument) -> bool + Send + Sync,
{
    fn accept(&self, doc: &PendingDocument) -> bool {
        self(doc)
    }
}

/// What every ingest task needs, shared with batch workers.
struct IngestContext {
    schema: Arc<Schema>,
    analyzers: Arc<dyn AnalyzerResolver>,
    filter: Option<Arc<dyn DocumentFilter>>,
}

impl IngestContext {
    /// Writes one pending document; false when the filter rejected it.
    fn update_document(&self, writer: &dyn IndexWriterHandle, doc: &PendingDocument) -> Result<bool> {
        if let Some(filter) = &self.filter {
            if !filter.accept(doc) {
                return Ok(false);
            }
        }
        let analyzer = self.analyzers.resolve(doc.lang)?;
        let indexable = to_indexable(&self.schema, &analyzer, doc);
        self.write(writer, indexable, &analyzer)?;
        Ok(true)
    }

    /// Replaces by unique key when the schema has one, appends otherwise.
    fn write(&self, writer: &dyn IndexWriterHandle, doc: IndexableDocument, analyzer: &PerFieldAnalyzer) -> Result<()> {
        let Some(unique) = self.schema.unique_field() else {
            return writer.add_document(doc, analyzer);
        };

        let term = match doc.get(&unique.name) {
            Some(value) if !value.is_empty() => Term::new(&unique.name, value),
            _ => return Err(Error::UniqueKeyMissing(unique.name.clone())),
        };
        writer.update_document(&term, doc, analyzer)
    }
}

/// Writer token plus directory lock. Dropping it unlocks the directory,
/// then releases the token.
struct IndexLock<'a> {
    directory: &'a dyn IndexDirectory,
    _token: MutexGuard<'a, ()>,
}

impl Drop for IndexLock<'_> {
    fn drop(&mut self) {
        self.directory.unlock();
    }
}

/// An open writer under an `IndexLock`. The writer is closed before the
/// lock is released, whichever way the session ends.
struct WriterSession<'a> {
    writer: Arc<dyn IndexWriterHandle>,
    closed: bool,
    _lock: IndexLock<'a>,
}

impl WriterSession<'_> {
    fn writer(&self) -> &Arc<dyn IndexWriterHandle> {
        &self.writer
    }

    fn close(mut self) -> Result<()> {
        self.closed = true;
        self.writer.close()
    }
}

impl Drop for WriterSession<'_> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.writer.close() {
                warn!(error = %err, "closing writer on abandoned session failed");
            }
        }
    }
}

/// Writer shared by batch workers. Once sealed it refuses document writes,
/// so its count is exactly what the session publishes on close.
struct BatchWriter {
    inner: Arc<dyn IndexWriterHandle>,
    sealed: RwLock<bool>,
    written: AtomicUsize,
}

impl BatchWriter {
    fn new(inner: Arc<dyn IndexWriterHandle>) -> Self {
        BatchWriter {
            inner,
            sealed: RwLock::new(false),
            written: AtomicUsize::new(0),
        }
    }

    fn counted(&self, write: impl FnOnce(&dyn IndexWriterHandle) -> Result<()>) -> Result<()> {
        let sealed = self.sealed.read();
        if *sealed {
            return Err(StorageError::WriterClosed.into());
        }
        write(self.inner.as_ref())?;
        self.written.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Refuses further writes and returns how many were accepted. Waits for
    /// writes in progress, not for tasks still preparing a document.
    fn seal(&self) -> usize {
        *self.sealed.write() = true;
        self.written.load(Ordering::Acquire)
    }
}

impl IndexWriterHandle for BatchWriter {
    fn add_document(&self, doc: IndexableDocument, analyzer: &PerFieldAnalyzer) -> Result<()> {
        self.counted(|writer| writer.add_document(doc, analyzer))
    }

    fn update_document(&self, term: &Term, doc: IndexableDocument, analyzer: &PerFieldAnalyzer) -> Result<()> {
        self.counted(|writer| writer.update_document(term, doc, analyzer))
    }

    fn delete_all(&self) -> Result<()> {
        self.inner.delete_all()
    }

    fn add_indexes(&self, source: &dyn IndexDirectory) -> Result<()> {
        self.inner.add_indexes(source)
    }

    fn close(&self) -> Result<()> {
        self.seal();
        self.inner.close()
    }
}

/// Counts a running merge on both sides. Counters, not flags: one source
/// may feed several targets at once.
struct MergeFlags<'a> {
    source: &'a AtomicUsize,
    target: &'a AtomicUsize,
}

impl<'a> MergeFlags<'a> {
    fn raise(source: &'a AtomicUsize, target: &'a AtomicUsize) -> Self {
        source.fetch_add(1, Ordering::AcqRel);
        target.fetch_add(1, Ordering::AcqRel);
        MergeFlags { source, target }
    }
}

impl Drop for MergeFlags<'_> {
    fn drop(&mut self) {
        self.source.fetch_sub(1, Ordering::AcqRel);
        self.target.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Serializes every mutation of one index.
///
/// Each operation holds the in-process writer token and the directory
/// lock, so at most one writer or deleting reader is open at a time. A
/// batch is the exception inside that rule: its workers share the single
/// open writer.
pub struct IndexWriteCoordinator {
    config: IndexConfig,
    directory: Arc<dyn IndexDirectory>,
    context: Arc<IngestContext>,
    writer_token: Mutex<()>,
    merging_source: AtomicUsize,
    merging_target: AtomicUsize,
}

impl IndexWriteCoordinator {
    pub fn new(
        config: IndexConfig,
        directory: Arc<dyn IndexDirectory>,
        schema: Arc<Schema>,
        analyzers: Arc<dyn AnalyzerResolver>,
    ) -> Self {
        IndexWriteCoordinator {
            config,
            directory,
            context: Arc::new(IngestContext {
                schema,
                analyzers,
                filter: None,
            }),
            writer_token: Mutex::new(()),
            merging_source: AtomicUsize::new(0),
            merging_target: AtomicUsize::new(0),
        }
    }

    /// Installs an acceptance predicate for pending documents.
    pub fn with_filter(mut self, filter: impl DocumentFilter + 'static) -> Self {
        let context = IngestContext {
            schema: self.context.schema.clone(),
            analyzers: self.context.analyzers.clone(),
            filter: Some(Arc::new(filter)),
        };
        self.context = Arc::new(context);
        self
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn directory(&self) -> &Arc<dyn IndexDirectory> {
        &self.directory
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.context.schema
    }

    /// Read-only view of the last published state.
    pub fn searcher(&self) -> Result<Arc<dyn FieldReader>> {
        self.directory.searcher()
    }

    /// Live documents in the last published state.
    pub fn num_docs(&self) -> Result<u32> {
        Ok(self.directory.open_reader()?.num_docs())
    }

    pub fn is_merging_source(&self) -> bool {
        self.merging_source.load(Ordering::Acquire) > 0
    }

    pub fn is_merging_target(&self) -> bool {
        self.merging_target.load(Ordering::Acquire) > 0
    }

    fn acquire(&self) -> Result<IndexLock<'_>> {
        let timeout = self.config.write_lock_timeout();
        let deadline = Instant::now() + timeout;

        let token = self
            .writer_token
            .try_lock_for(timeout)
            .ok_or_else(|| Error::LockTimeout {
                resource: format!("{} writer", self.directory.name()),
                timeout,
            })?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        self.directory.lock(remaining.max(Duration::from_millis(1)))?;

        Ok(IndexLock {
            directory: self.directory.as_ref(),
            _token: token,
        })
    }

    fn open_session(&self, mode: OpenMode) -> Result<WriterSession<'_>> {
        let lock = self.acquire()?;
        let options = WriterOptions {
            ram_buffer_mb: self.config.ram_buffer_mb,
        };
        let writer = self.directory.open_writer(mode, &options)?;
        Ok(WriterSession {
            writer,
            closed: false,
            _lock: lock,
        })
    }

    /// Initializes the index, discarding any previous content.
    pub fn create(&self) -> Result<()> {
        let session = self.open_session(OpenMode::Create)?;
        session.close()?;
        info!(index = self.directory.name(), "index created");
        Ok(())
    }

    /// Adds or replaces one document. Returns false when the document
    /// filter rejected it; nothing is written then.
    pub fn upsert(&self, doc: &PendingDocument) -> Result<bool> {
        let session = self.open_session(OpenMode::Append)?;
        let updated = self.context.update_document(session.writer().as_ref(), doc)?;
        session.close()?;
        debug!(index = self.directory.name(), updated, "upsert");
        Ok(updated)
    }

    /// Adds or replaces many documents concurrently through one writer.
    ///
    /// Returns the number of documents written. If any task fails, every
    /// other task still runs, the writer is closed (committing the
    /// successful ones) and `BatchFailed` carries the count and the first
    /// failure. Past the drain ceiling the writer is sealed and closed with
    /// what it holds, and `BatchTimeout` carries that count.
    pub fn upsert_batch(&self, docs: Vec<PendingDocument>) -> Result<usize> {
        let total = docs.len();
        let session = self.open_session(OpenMode::Append)?;

        let writer = Arc::new(BatchWriter::new(session.writer().clone()));
        let task_writer = writer.clone();
        let context = self.context.clone();
        let mut outcome = self.batch_pool().run(docs, move |doc: &PendingDocument| {
            context.update_document(task_writer.as_ref(), doc)
        });
        outcome.committed = writer.seal();

        let result = outcome.finish(session.close());
        match &result {
            Ok(committed) => info!(index = self.directory.name(), total, committed, "batch upsert"),
            Err(err) => warn!(index = self.directory.name(), total, error = %err, "batch upsert failed"),
        }
        result
    }

    /// Batch variant for documents that arrive already analyzed. Documents
    /// with no schema field are skipped and not counted.
    pub fn upsert_prepared_batch(&self, docs: Vec<PreparedDocument>) -> Result<usize> {
        let total = docs.len();
        let session = self.open_session(OpenMode::Append)?;

        let analyzer = self.context.analyzers.resolve(Language::Undefined)?;
        let writer = Arc::new(BatchWriter::new(session.writer().clone()));
        let task_writer = writer.clone();
        let context = self.context.clone();
        let mut outcome = self.batch_pool().run(docs, move |doc: &PreparedDocument| {
            let indexable = prepared_to_indexable(&context.schema, doc);
            if indexable.is_empty() {
                return Ok(false);
            }
            context.write(task_writer.as_ref(), indexable, &analyzer)?;
            Ok(true)
        });
        outcome.committed = writer.seal();

        let result = outcome.finish(session.close());
        if let Ok(committed) = &result {
            info!(index = self.directory.name(), total, committed, "prepared batch upsert");
        }
        result
    }

    fn batch_pool(&self) -> BatchPool {
        BatchPool::new(self.config.batch_workers(), self.config.batch_drain_timeout())
    }

    /// Deletes documents by internal id. Ids that are unknown or already
    /// deleted are skipped; returns how many documents were deleted.
    pub fn delete_by_ids(&self, ids: &[DocId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let _lock = self.acquire()?;
        let mut reader = self.directory.open_reader()?;
        let max_doc = reader.max_doc();

        let mut deleted = 0;
        for &id in ids {
            if id.value() >= max_doc || reader.is_deleted(id) {
                continue;
            }
            reader.delete(id)?;
            deleted += 1;
        }
        reader.close()?;

        info!(index = self.directory.name(), requested = ids.len(), deleted, "delete by ids");
        Ok(deleted)
    }

    /// Removes every document.
    pub fn delete_all(&self) -> Result<()> {
        let session = self.open_session(OpenMode::Append)?;
        session.writer().delete_all()?;
        session.close()?;
        info!(index = self.directory.name(), "all documents deleted");
        Ok(())
    }

    /// Appends every live document of `source` into this index.
    ///
    /// Both coordinators report the merge through their flags while it runs.
    pub fn merge_from(&self, source: &IndexWriteCoordinator) -> Result<()> {
        if ptr::eq(self, source) || Arc::ptr_eq(&self.directory, &source.directory) {
            return Err(Error::InvalidArgument(format!(
                "cannot merge index '{}' into itself",
                self.directory.name()
            )));
        }

        let _flags = MergeFlags::raise(&source.merging_source, &self.merging_target);
        let session = self.open_session(OpenMode::Append)?;
        session.writer().add_indexes(source.directory.as_ref())?;
        session.close()?;

        info!(
            index = self.directory.name(),
            source = source.directory.name(),
            "index merged"
        );
        Ok(())
    }
}
