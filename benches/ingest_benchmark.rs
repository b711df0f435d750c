use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use searchcore::analysis::analyzer::{AnalyzerRegistry, SchemaAnalyzers};
use searchcore::search::SearchRequest;
use searchcore::{
    DocId, IndexConfig, IndexWriteCoordinator, Language, LocalDirectory, PendingDocument, Schema,
    SchemaField, SearchResults,
};
use std::sync::Arc;
use rand::Rng;

/// Helper to create test documents
fn create_test_document(id: usize, content_size: usize) -> PendingDocument {
    let mut rng = rand::thread_rng();
    let content: String = (0..content_size)
        .map(|_| {
            let words = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];
            words[rng.gen_range(0..words.len())]
        })
        .collect::<Vec<_>>()
        .join(" ");

    PendingDocument::new(Language::English)
        .add_field("id", format!("doc{id}"))
        .add_field("title", format!("Document {id}"))
        .add_field("content", content)
        .add_field("category", format!("category_{}", id % 10))
}

fn create_coordinator(name: &str) -> IndexWriteCoordinator {
    let schema = Arc::new(
        Schema::new()
            .add_field(SchemaField::keyword("id"))
            .add_field(SchemaField::text("title", "standard"))
            .add_field(SchemaField::text("content", "standard").stored(false))
            .add_field(SchemaField::keyword("category"))
            .with_unique_field("id"),
    );
    let analyzers = Arc::new(SchemaAnalyzers::new(schema.clone(), Arc::new(AnalyzerRegistry::new())));
    IndexWriteCoordinator::new(
        IndexConfig::new(name),
        Arc::new(LocalDirectory::in_memory(name)),
        schema,
        analyzers,
    )
}

/// Benchmark single document upsert
fn bench_single_upsert(c: &mut Criterion) {
    let index = create_coordinator("single");

    c.bench_function("single_document_upsert", |b| {
        let mut id = 0;
        b.iter(|| {
            let doc = create_test_document(id % 1000, 100);
            index.upsert(black_box(&doc)).unwrap();
            id += 1;
        });
    });
}

/// Benchmark batch upsert
fn bench_batch_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_upsert");

    for batch_size in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let index = create_coordinator("batch");
                b.iter(|| {
                    let docs: Vec<_> = (0..batch_size).map(|i| create_test_document(i, 50)).collect();
                    black_box(index.upsert_batch(docs).unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark reading a result window back
fn bench_result_window(c: &mut Criterion) {
    let index = create_coordinator("window");
    let docs: Vec<_> = (0..1000).map(|i| create_test_document(i, 50)).collect();
    index.upsert_batch(docs).unwrap();

    c.bench_function("result_window_20", |b| {
        b.iter(|| {
            let request = SearchRequest::new(0, 20)
                .with_return_field("title")
                .with_snippet_field("title", 8);
            let mut results = SearchResults::new(request, index.searcher().unwrap());
            results.attach((0..100).map(DocId).collect(), None, None).unwrap();
            for doc in results.iterate(None) {
                black_box(doc.unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_single_upsert, bench_batch_upsert, bench_result_window);
criterion_main!(benches);
