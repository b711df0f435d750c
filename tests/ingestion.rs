//! End-to-end ingestion through `IndexWriteCoordinator`: replacement by
//! unique key, batches, deletes, merges and on-disk persistence.

use searchcore::analysis::analyzer::{AnalyzerRegistry, SchemaAnalyzers};
use searchcore::storage::document::Term;
use searchcore::storage::{FieldReader, IndexDirectory};
use searchcore::{
    DocId, Error, IndexConfig, IndexWriteCoordinator, Language, LocalDirectory, PendingDocument,
    PreparedDocument, Schema, SchemaField,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_schema(unique: bool) -> Arc<Schema> {
    let schema = Schema::new()
        .add_field(SchemaField::keyword("id"))
        .add_field(SchemaField::text("title", "standard"))
        .add_field(SchemaField::text("body", "standard").stored(false));
    Arc::new(if unique { schema.with_unique_field("id") } else { schema })
}

fn create_coordinator(directory: LocalDirectory, unique: bool) -> IndexWriteCoordinator {
    let schema = create_test_schema(unique);
    let analyzers = Arc::new(SchemaAnalyzers::new(schema.clone(), Arc::new(AnalyzerRegistry::new())));
    let mut config = IndexConfig::new(directory.name());
    config.write_lock_timeout_ms = 300;
    IndexWriteCoordinator::new(config, Arc::new(directory), schema, analyzers)
}

fn create_test_doc(id: &str, title: &str) -> PendingDocument {
    PendingDocument::new(Language::English)
        .add_field("id", id)
        .add_field("title", title)
        .add_field("body", format!("body of {id}"))
}

fn docs_with_key(index: &IndexWriteCoordinator, key: &str) -> Vec<DocId> {
    index
        .directory()
        .open_reader()
        .unwrap()
        .term_docs(&Term::new("id", key))
}

fn title_of(index: &IndexWriteCoordinator, key: &str) -> Option<String> {
    let id = *docs_with_key(index, key).first()?;
    let stored = index
        .searcher()
        .unwrap()
        .stored_fields(id, &["title".to_string()])
        .unwrap()?;
    stored.first("title").map(str::to_string)
}

#[test]
fn test_upsert_is_idempotent_per_key() {
    let index = create_coordinator(LocalDirectory::in_memory("idempotent"), true);
    index.create().unwrap();

    for _ in 0..5 {
        assert!(index.upsert(&create_test_doc("doc1", "same")).unwrap());
    }
    assert_eq!(docs_with_key(&index, "doc1").len(), 1);
    assert_eq!(index.num_docs().unwrap(), 1);
}

#[test]
fn test_replace_on_reindex() {
    let index = create_coordinator(LocalDirectory::in_memory("reindex"), true);
    index.upsert(&create_test_doc("doc1", "v1")).unwrap();
    index.upsert(&create_test_doc("doc2", "other")).unwrap();
    index.upsert(&create_test_doc("doc1", "v2")).unwrap();

    assert_eq!(title_of(&index, "doc1").as_deref(), Some("v2"));
    assert_eq!(docs_with_key(&index, "doc1").len(), 1);
    assert_eq!(index.num_docs().unwrap(), 2);
}

#[test]
fn test_missing_unique_key_is_rejected() {
    let index = create_coordinator(LocalDirectory::in_memory("missing"), true);
    index.upsert(&create_test_doc("doc1", "kept")).unwrap();

    let no_key = PendingDocument::new(Language::English).add_field("title", "orphan");
    let empty_key = PendingDocument::new(Language::English)
        .add_field("id", "")
        .add_field("title", "orphan");

    for doc in [no_key, empty_key] {
        let err = index.upsert(&doc).unwrap_err();
        assert!(matches!(err, Error::UniqueKeyMissing(ref field) if field == "id"), "{err}");
    }
    assert_eq!(index.num_docs().unwrap(), 1);
}

#[test]
fn test_without_unique_field_documents_append() {
    let index = create_coordinator(LocalDirectory::in_memory("append"), false);
    index.upsert(&create_test_doc("doc1", "a")).unwrap();
    index.upsert(&create_test_doc("doc1", "a")).unwrap();
    index
        .upsert(&PendingDocument::new(Language::English).add_field("title", "no key needed"))
        .unwrap();
    assert_eq!(index.num_docs().unwrap(), 3);
}

#[test]
fn test_batch_commits_every_document() {
    let index = create_coordinator(LocalDirectory::in_memory("batch"), true);
    let docs: Vec<_> = (0..250)
        .map(|i| create_test_doc(&format!("doc{i}"), &format!("title {i}")))
        .collect();

    assert_eq!(index.upsert_batch(docs).unwrap(), 250);
    assert_eq!(index.num_docs().unwrap(), 250);
    assert_eq!(title_of(&index, "doc117").as_deref(), Some("title 117"));
}

#[test]
fn test_batch_keeps_successes_when_one_document_fails() {
    let index = create_coordinator(LocalDirectory::in_memory("partial"), true);
    let mut docs: Vec<_> = (0..10).map(|i| create_test_doc(&format!("doc{i}"), "ok")).collect();
    docs[4] = PendingDocument::new(Language::English).add_field("title", "malformed");

    let err = index.upsert_batch(docs).unwrap_err();
    match &err {
        Error::BatchFailed { committed, cause } => {
            assert_eq!(*committed, 9);
            assert!(matches!(**cause, Error::UniqueKeyMissing(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(err.root_cause(), Error::UniqueKeyMissing(_)));
    assert_eq!(index.num_docs().unwrap(), 9);
}

#[test]
fn test_batch_replaces_existing_keys() {
    let index = create_coordinator(LocalDirectory::in_memory("batch-replace"), true);
    index.upsert(&create_test_doc("doc1", "old")).unwrap();

    let docs = vec![create_test_doc("doc1", "new"), create_test_doc("doc2", "fresh")];
    assert_eq!(index.upsert_batch(docs).unwrap(), 2);
    assert_eq!(index.num_docs().unwrap(), 2);
    assert_eq!(title_of(&index, "doc1").as_deref(), Some("new"));
}

#[test]
fn test_empty_batch_commits_nothing() {
    let index = create_coordinator(LocalDirectory::in_memory("empty"), true);
    assert_eq!(index.upsert_batch(Vec::new()).unwrap(), 0);
    assert_eq!(index.num_docs().unwrap(), 0);
}

#[test]
fn test_prepared_batch_skips_documents_without_schema_fields() {
    let index = create_coordinator(LocalDirectory::in_memory("prepared"), true);
    let docs = vec![
        PreparedDocument::default()
            .add_stored("id", vec!["p1".to_string()])
            .add_stored("title", vec!["Prepared Title".to_string()])
            .add_terms("title", vec!["prepared".to_string()]),
        PreparedDocument::default().add_stored("unknown", vec!["x".to_string()]),
    ];

    assert_eq!(index.upsert_prepared_batch(docs).unwrap(), 1);
    let reader = index.directory().open_reader().unwrap();
    assert_eq!(reader.term_docs(&Term::new("title", "prepared")).len(), 1);
    assert!(reader.term_docs(&Term::new("title", "titl")).is_empty());
    assert_eq!(title_of(&index, "p1").as_deref(), Some("Prepared Title"));
}

#[test]
fn test_delete_by_ids_skips_unknown_and_deleted() {
    let index = create_coordinator(LocalDirectory::in_memory("delete"), true);
    for i in 0..4 {
        index.upsert(&create_test_doc(&format!("doc{i}"), "t")).unwrap();
    }

    let deleted = index
        .delete_by_ids(&[DocId(1), DocId(1), DocId(3), DocId(99)])
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(index.num_docs().unwrap(), 2);

    assert_eq!(index.delete_by_ids(&[DocId(1)]).unwrap(), 0);
    assert_eq!(index.delete_by_ids(&[]).unwrap(), 0);
}

#[test]
fn test_delete_all_then_create() {
    let index = create_coordinator(LocalDirectory::in_memory("clear"), true);
    index.upsert(&create_test_doc("doc1", "t")).unwrap();
    index.delete_all().unwrap();
    assert_eq!(index.num_docs().unwrap(), 0);

    index.upsert(&create_test_doc("doc2", "t")).unwrap();
    index.create().unwrap();
    assert_eq!(index.num_docs().unwrap(), 0);
}

#[test]
fn test_merge_appends_live_source_documents() {
    let target = create_coordinator(LocalDirectory::in_memory("target"), true);
    let source = create_coordinator(LocalDirectory::in_memory("source"), true);
    target.upsert(&create_test_doc("t1", "target")).unwrap();
    for i in 0..3 {
        source.upsert(&create_test_doc(&format!("s{i}"), "source")).unwrap();
    }
    source.delete_by_ids(&[DocId(0)]).unwrap();

    target.merge_from(&source).unwrap();

    assert_eq!(target.num_docs().unwrap(), 3);
    assert_eq!(source.num_docs().unwrap(), 2);
    assert!(docs_with_key(&target, "s0").is_empty());
    assert_eq!(title_of(&target, "s2").as_deref(), Some("source"));
    assert!(!source.is_merging_source());
    assert!(!target.is_merging_target());
}

#[test]
fn test_held_directory_lock_times_out() {
    let directory = LocalDirectory::in_memory("locked");
    let index = create_coordinator(directory.clone(), true);

    directory.lock(Duration::from_millis(10)).unwrap();
    let err = index.upsert(&create_test_doc("doc1", "t")).unwrap_err();
    assert!(err.is_lock_timeout(), "{err}");
    assert_eq!(index.num_docs().unwrap(), 0);

    directory.unlock();
    assert!(index.upsert(&create_test_doc("doc1", "t")).unwrap());
}

#[test]
fn test_lock_is_released_after_failure() {
    let index = create_coordinator(LocalDirectory::in_memory("release"), true);
    let orphan = PendingDocument::new(Language::English).add_field("title", "orphan");
    assert!(index.upsert(&orphan).is_err());
    assert!(index.upsert(&create_test_doc("doc1", "t")).unwrap());
}

#[test]
fn test_filter_rejects_documents() {
    let index = create_coordinator(LocalDirectory::in_memory("filtered"), true)
        .with_filter(|doc: &PendingDocument| !doc.first_value("title").unwrap_or("").contains("spam"));

    assert!(!index.upsert(&create_test_doc("doc1", "buy spam now")).unwrap());
    let docs = vec![create_test_doc("doc2", "spam again"), create_test_doc("doc3", "fine")];
    assert_eq!(index.upsert_batch(docs).unwrap(), 1);
    assert_eq!(index.num_docs().unwrap(), 1);
}

#[test]
fn test_on_disk_index_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let index = create_coordinator(LocalDirectory::open(temp_dir.path()).unwrap(), true);
        index.create().unwrap();
        let docs: Vec<_> = (0..20).map(|i| create_test_doc(&format!("doc{i}"), "persisted")).collect();
        assert_eq!(index.upsert_batch(docs).unwrap(), 20);
        let doc0 = docs_with_key(&index, "doc0");
        assert_eq!(index.delete_by_ids(&doc0).unwrap(), 1);
    }

    let index = create_coordinator(LocalDirectory::open(temp_dir.path()).unwrap(), true);
    assert_eq!(index.num_docs().unwrap(), 19);
    assert_eq!(title_of(&index, "doc5").as_deref(), Some("persisted"));
    assert!(docs_with_key(&index, "doc0").is_empty());
}

#[test]
fn test_two_handles_on_one_path_keep_both_writes() {
    let temp_dir = TempDir::new().unwrap();
    let first = create_coordinator(LocalDirectory::open(temp_dir.path()).unwrap(), true);
    let second = create_coordinator(LocalDirectory::open(temp_dir.path()).unwrap(), true);

    first.upsert(&create_test_doc("doc1", "from first")).unwrap();
    second.upsert(&create_test_doc("doc2", "from second")).unwrap();
    first.upsert(&create_test_doc("doc2", "replaced by first")).unwrap();

    let reopened = create_coordinator(LocalDirectory::open(temp_dir.path()).unwrap(), true);
    assert_eq!(reopened.num_docs().unwrap(), 2);
    assert_eq!(title_of(&reopened, "doc1").as_deref(), Some("from first"));
    assert_eq!(title_of(&reopened, "doc2").as_deref(), Some("replaced by first"));
}

#[test]
fn test_batch_timeout_commits_what_was_written() {
    let schema = create_test_schema(true);
    let analyzers = Arc::new(SchemaAnalyzers::new(schema.clone(), Arc::new(AnalyzerRegistry::new())));
    let mut config = IndexConfig::new("slow");
    config.write_lock_timeout_ms = 300;
    config.batch_drain_timeout_ms = 500;
    let index = IndexWriteCoordinator::new(config, Arc::new(LocalDirectory::in_memory("slow")), schema, analyzers)
        .with_filter(|doc: &PendingDocument| {
            if doc.first_value("id") == Some("slow") {
                std::thread::sleep(Duration::from_secs(3));
            }
            true
        });

    // The slow document is queued last, so every fast one is taken first.
    let mut docs: Vec<_> = (0..20).map(|i| create_test_doc(&format!("doc{i}"), "fast")).collect();
    docs.push(create_test_doc("slow", "never lands"));

    let err = index.upsert_batch(docs).unwrap_err();
    let committed = match err {
        Error::BatchTimeout { committed, .. } => committed,
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(committed, 20);
    assert_eq!(index.num_docs().unwrap() as usize, committed);

    // Token and lock were released with the timed-out batch.
    assert!(index.upsert(&create_test_doc("after", "fast")).unwrap());
    assert_eq!(index.num_docs().unwrap() as usize, committed + 1);
    assert!(docs_with_key(&index, "slow").is_empty());
}
