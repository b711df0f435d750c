pub mod core;
pub mod analysis;
pub mod schema;
pub mod storage;
pub mod writer;
pub mod search;
pub mod join;

pub use crate::core::config::IndexConfig;
pub use crate::core::error::{Error, Result};
pub use crate::core::timer::Timer;
pub use crate::core::types::{DocId, FieldValueItem, PendingDocument, PreparedDocument};
pub use crate::analysis::language::Language;
pub use crate::join::JoinResolver;
pub use crate::schema::schema::{Schema, SchemaField};
pub use crate::search::{ResultDocument, SearchRequest, SearchResults};
pub use crate::storage::LocalDirectory;
pub use crate::writer::{DocumentFilter, IndexWriteCoordinator};

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                          SEARCHCORE LAYOUT                               │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────── WRITE PATH ──────────────────────────────────┐
│                                                                          │
│  PendingDocument ──► IndexWriteCoordinator                               │
│                        │  writer token (parking_lot::Mutex, timed)        │
│                        │  directory lock (flock / in-process)             │
│                        │  BatchPool (crossbeam channel, N workers)        │
│                        ▼                                                 │
│                  IndexDirectory ──► IndexWriterHandle (shared by batch)   │
│                        │            IndexReaderHandle (delete by id)      │
│                        ▼                                                 │
│                  IndexSegment (stored docs, roaring postings)             │
│                        │                                                 │
│                        ▼                                                 │
│                  Checkpoint (crc32 + bincode, atomic rename)              │
│                                                                          │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────── RESULT PATH ─────────────────────────────────┐
│                                                                          │
│  executor ──► SearchResults.attach(docs, scores, distances)              │
│           ──► SearchResults.set_collector(collector)                     │
│                        │                                                 │
│                        ├── document_at / iterate ──► ResultDocument      │
│                        │         (FieldReader, window = start..end)      │
│                        │                                                 │
│                        └── JoinResolver[slot] ──► foreign SearchResults   │
│                                  resolve(pos) / facets                   │
│                                                                          │
└──────────────────────────────────────────────────────────────────────────┘
*/
