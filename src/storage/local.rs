use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use parking_lot::{Condvar, Mutex, RwLock};
use roaring::RoaringBitmap;
use tracing::debug;
use crate::analysis::analyzer::PerFieldAnalyzer;
use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::storage::checkpoint::Checkpoint;
use crate::storage::directory::{FieldReader, IndexDirectory, IndexReaderHandle, IndexWriterHandle, OpenMode, WriterOptions};
use crate::storage::document::{IndexableDocument, StoredDocument, Term};
use crate::storage::error::StorageError;
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::IndexSegment;

/// Directory backed by process memory, optionally checkpointed to disk.
///
/// Writers work on a private copy of the segment and publish it on close;
/// readers and searchers see the generation published last. On disk, taking
/// the lock reloads a checkpoint published by another handle.
///
/// Every writer copies the whole segment and every publish rewrites the
/// whole checkpoint, so one upsert costs O(index size). Meant for tests and
/// small indexes, not as a production store.
#[derive(Clone)]
pub struct LocalDirectory {
    inner: Arc<DirectoryInner>,
}

struct DirectoryInner {
    name: String,
    layout: Option<StorageLayout>,
    committed: RwLock<Arc<IndexSegment>>,
    generation: AtomicU64,
    lock: DirectoryLock,
}

enum DirectoryLock {
    Process { locked: Mutex<bool>, released: Condvar },
    File { layout: StorageLayout, held: Mutex<Option<FileLock>> },
}

impl LocalDirectory {
    pub fn in_memory(name: &str) -> Self {
        LocalDirectory {
            inner: Arc::new(DirectoryInner {
                name: name.to_string(),
                layout: None,
                committed: RwLock::new(Arc::new(IndexSegment::default())),
                generation: AtomicU64::new(0),
                lock: DirectoryLock::Process {
                    locked: Mutex::new(false),
                    released: Condvar::new(),
                },
            }),
        }
    }

    /// Opens (or creates) an on-disk directory, loading its last checkpoint.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let layout = StorageLayout::new(path)?;
        let (segment, generation) = match Checkpoint::load(&layout)? {
            Some(checkpoint) => (IndexSegment::from_data(checkpoint.segment), checkpoint.generation),
            None => (IndexSegment::default(), 0),
        };
        debug!(dir = %layout.base_dir.display(), generation, docs = segment.num_docs(), "directory opened");

        Ok(LocalDirectory {
            inner: Arc::new(DirectoryInner {
                name: layout.base_dir.display().to_string(),
                layout: Some(layout.clone()),
                committed: RwLock::new(Arc::new(segment)),
                generation: AtomicU64::new(generation),
                lock: DirectoryLock::File {
                    layout,
                    held: Mutex::new(None),
                },
            }),
        })
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    pub fn num_docs(&self) -> u32 {
        self.inner.current().num_docs()
    }
}

impl DirectoryInner {
    fn current(&self) -> Arc<IndexSegment> {
        self.committed.read().clone()
    }

    /// Adopts the checkpoint on disk when another handle published a newer
    /// generation. Call only while holding the file lock.
    fn refresh(&self) -> Result<()> {
        let Some(layout) = &self.layout else {
            return Ok(());
        };
        let Some(checkpoint) = Checkpoint::load(layout)? else {
            return Ok(());
        };
        let known = self.generation.load(Ordering::Acquire);
        if checkpoint.generation <= known {
            return Ok(());
        }

        let segment = IndexSegment::from_data(checkpoint.segment);
        debug!(dir = %self.name, from = known, to = checkpoint.generation, docs = segment.num_docs(), "checkpoint reloaded");
        *self.committed.write() = Arc::new(segment);
        self.generation.store(checkpoint.generation, Ordering::Release);
        Ok(())
    }

    fn publish(&self, segment: IndexSegment) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(layout) = &self.layout {
            Checkpoint::new(generation, &segment).save(layout)?;
        }
        debug!(dir = %self.name, generation, docs = segment.num_docs(), "generation published");
        *self.committed.write() = Arc::new(segment);
        Ok(())
    }
}

impl IndexDirectory for LocalDirectory {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn lock(&self, timeout: Duration) -> Result<()> {
        match &self.inner.lock {
            DirectoryLock::Process { locked, released } => {
                let deadline = Instant::now() + timeout;
                let mut locked = locked.lock();
                while *locked {
                    if released.wait_until(&mut locked, deadline).timed_out() && *locked {
                        return Err(Error::LockTimeout {
                            resource: self.inner.name.clone(),
                            timeout,
                        });
                    }
                }
                *locked = true;
                Ok(())
            }
            DirectoryLock::File { layout, held } => {
                let lock = FileLock::acquire(layout, timeout)?;
                self.inner.refresh()?;
                *held.lock() = Some(lock);
                Ok(())
            }
        }
    }

    fn unlock(&self) {
        match &self.inner.lock {
            DirectoryLock::Process { locked, released } => {
                *locked.lock() = false;
                released.notify_one();
            }
            DirectoryLock::File { held, .. } => {
                held.lock().take();
            }
        }
    }

    fn open_writer(&self, mode: OpenMode, options: &WriterOptions) -> Result<Arc<dyn IndexWriterHandle>> {
        let working = match mode {
            OpenMode::Create => IndexSegment::default(),
            OpenMode::Append => self.inner.current().as_ref().clone(),
        };
        debug!(dir = %self.inner.name, ?mode, ram_buffer_mb = options.ram_buffer_mb, "writer opened");

        Ok(Arc::new(LocalWriter {
            directory: self.inner.clone(),
            working: Mutex::new(Some(working)),
        }))
    }

    fn open_reader(&self) -> Result<Box<dyn IndexReaderHandle>> {
        Ok(Box::new(LocalReader {
            directory: self.inner.clone(),
            segment: self.inner.current(),
            pending: RoaringBitmap::new(),
        }))
    }

    fn searcher(&self) -> Result<Arc<dyn FieldReader>> {
        Ok(Arc::new(SegmentSearcher {
            segment: self.inner.current(),
        }))
    }

    fn segment(&self) -> Result<Arc<IndexSegment>> {
        Ok(self.inner.current())
    }
}

struct LocalWriter {
    directory: Arc<DirectoryInner>,
    working: Mutex<Option<IndexSegment>>,
}

impl LocalWriter {
    fn with_segment<T>(&self, f: impl FnOnce(&mut IndexSegment) -> T) -> Result<T> {
        let mut working = self.working.lock();
        let segment = working.as_mut().ok_or(StorageError::WriterClosed)?;
        Ok(f(segment))
    }
}

impl IndexWriterHandle for LocalWriter {
    fn add_document(&self, doc: IndexableDocument, analyzer: &PerFieldAnalyzer) -> Result<()> {
        self.with_segment(|segment| {
            segment.add(&doc, analyzer);
        })
    }

    fn update_document(&self, term: &Term, doc: IndexableDocument, analyzer: &PerFieldAnalyzer) -> Result<()> {
        self.with_segment(|segment| {
            segment.delete_term(term);
            segment.add(&doc, analyzer);
        })
    }

    fn delete_all(&self) -> Result<()> {
        self.with_segment(IndexSegment::delete_all)
    }

    fn add_indexes(&self, source: &dyn IndexDirectory) -> Result<()> {
        let source_segment = source.segment()?;
        let appended = self.with_segment(|segment| segment.append(&source_segment))?;
        debug!(from = source.name(), into = %self.directory.name, appended, "indexes added");
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let working = self.working.lock().take();
        match working {
            Some(segment) => self.directory.publish(segment),
            None => Ok(()),
        }
    }
}

struct LocalReader {
    directory: Arc<DirectoryInner>,
    segment: Arc<IndexSegment>,
    pending: RoaringBitmap,
}

impl FieldReader for LocalReader {
    fn stored_fields(&self, id: DocId, fields: &[String]) -> Result<Option<StoredDocument>> {
        if self.pending.contains(id.0) {
            return Ok(None);
        }
        Ok(self.segment.document(id).map(|doc| doc.project(fields)))
    }
}

impl IndexReaderHandle for LocalReader {
    fn max_doc(&self) -> u32 {
        self.segment.max_doc()
    }

    fn num_docs(&self) -> u32 {
        self.segment.num_docs() - self.pending.len() as u32
    }

    fn is_deleted(&self, id: DocId) -> bool {
        self.segment.is_deleted(id) || self.pending.contains(id.0)
    }

    fn delete(&mut self, id: DocId) -> Result<()> {
        if id.0 < self.max_doc() && !self.segment.is_deleted(id) {
            self.pending.insert(id.0);
        }
        Ok(())
    }

    fn term_docs(&self, term: &Term) -> Vec<DocId> {
        self.segment
            .term_docs(term)
            .into_iter()
            .filter(|id| !self.pending.contains(id.0))
            .collect()
    }

    fn close(self: Box<Self>) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut segment = self.directory.current().as_ref().clone();
        for id in &self.pending {
            segment.delete(DocId(id));
        }
        self.directory.publish(segment)
    }
}

struct SegmentSearcher {
    segment: Arc<IndexSegment>,
}

impl FieldReader for SegmentSearcher {
    fn stored_fields(&self, id: DocId, fields: &[String]) -> Result<Option<StoredDocument>> {
        Ok(self.segment.document(id).map(|doc| doc.project(fields)))
    }
}
