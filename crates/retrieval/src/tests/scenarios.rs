//! End-to-end behaviour of the search service.

use crate::config::{StorePaths, VECTORS_FILE};
use crate::snapshot::SnapshotStore;
use crate::vector_index::VectorIndex;
use crate::{DocumentInput, SearchService, Snippet};
use docseek_core::{AppConfig, AppError};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn service(temp: &TempDir) -> SearchService {
    let config = AppConfig {
        workspace: temp.path().to_path_buf(),
        ..Default::default()
    };
    SearchService::new(config).unwrap()
}

fn snapshots(service: &SearchService) -> SnapshotStore {
    SnapshotStore::new(StorePaths::new(service.paths().root()))
}

fn corpus() -> Vec<DocumentInput> {
    vec![
        DocumentInput::new(
            "rust.txt",
            "Rust ownership rules and the borrow checker prevent data races. \
             Lifetimes describe how long references stay valid.",
        ),
        DocumentInput::new(
            "garden.txt",
            "Tomatoes need full sun. Water the garden early in the morning. \
             Mulch keeps soil moist.",
        ),
        DocumentInput::new(
            "bread.txt",
            "Sourdough bread rises slowly. Knead the dough and bake in a hot oven.",
        ),
    ]
}

#[tokio::test]
async fn test_query_ranks_relevant_document_first() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    service.ingest_batch(corpus()).await.unwrap();

    let hits = service
        .query("borrow checker ownership", Some(3))
        .await
        .unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, "rust.txt");
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!(hits[0].snippet.is_found());
    assert_eq!(hits[0].occurrences, 3);
}

#[tokio::test]
async fn test_fewer_documents_than_k() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    service.ingest("a.txt", "first document").await.unwrap();
    service.ingest("b.txt", "second document").await.unwrap();

    let hits = service.query("document", Some(5)).await.unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn test_index_and_registry_stay_aligned() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    let store = snapshots(&service);

    for (i, doc) in corpus().into_iter().enumerate() {
        service.ingest_document(doc).await.unwrap();

        let snapshot = store.load().unwrap().unwrap();
        assert_eq!(snapshot.index.len(), i + 1);
        assert_eq!(snapshot.registry.len(), i + 1);
        assert_eq!(snapshot.generation, i as u64 + 1);
    }
}

#[tokio::test]
async fn test_huge_k_returns_every_document() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    service.ingest("a.txt", "only document").await.unwrap();

    let hits = service.query("document", Some(usize::MAX)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a.txt");
}

#[tokio::test]
async fn test_unusable_id_in_batch_keeps_the_rest() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    let long_id = format!("{}.txt", "x".repeat(220));

    let receipt = service
        .ingest_batch(vec![
            DocumentInput::new("good.txt", "good text"),
            DocumentInput::new(long_id.clone(), "name too long"),
        ])
        .await
        .unwrap();
    assert_eq!(receipt.accepted, vec!["good.txt"]);
    assert_eq!(receipt.skipped, vec![long_id.clone()]);
    assert_eq!(service.list_documents().await.unwrap(), vec!["good.txt"]);

    // A single ingest still reports the bad id
    assert!(matches!(
        service.ingest(&long_id, "name too long").await,
        Err(AppError::InvalidId(_))
    ));
}

#[tokio::test]
async fn test_stored_files_lists_raw_documents() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    assert!(service.stored_files().await.unwrap().is_empty());

    service
        .ingest_document(DocumentInput::new("b.txt", "beta").with_raw(b"Beta".to_vec()))
        .await
        .unwrap();
    service.ingest("a.txt", "alpha").await.unwrap();
    service
        .ingest_document(DocumentInput::new("c.txt", "gamma").with_raw(b"Gamma".to_vec()))
        .await
        .unwrap();

    assert_eq!(service.stored_files().await.unwrap(), vec!["b.txt", "c.txt"]);
    assert_eq!(
        service.list_documents().await.unwrap(),
        vec!["b.txt", "a.txt", "c.txt"]
    );
}

#[tokio::test]
async fn test_duplicate_id_is_disambiguated() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);

    let first = service.ingest("report.pdf", "first quarter").await.unwrap();
    let second = service.ingest("report.pdf", "second quarter").await.unwrap();

    assert_eq!(first.accepted_id, "report.pdf");
    assert_ne!(second.accepted_id, "report.pdf");
    assert!(second.accepted_id.starts_with("report_"));
    assert!(second.accepted_id.ends_with(".pdf"));

    let ids = service.list_documents().await.unwrap();
    assert_eq!(ids, vec!["report.pdf".to_string(), second.accepted_id.clone()]);

    let hits = service.query("\"first quarter\"", None).await.unwrap();
    let original = hits.iter().find(|h| h.id == "report.pdf").unwrap();
    assert_eq!(original.snippet, Snippet::Found("first quarter".to_string()));
}

#[tokio::test]
async fn test_exact_phrase_snippet() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    service
        .ingest("fox.txt", "The quick brown fox. Jumps over. The lazy dog.")
        .await
        .unwrap();

    let hits = service.query("\"Jumps Over\"", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].snippet.as_str().contains("jumps over."));
    assert_eq!(hits[0].occurrences, 1);

    let hits = service.query("fox dog", None).await.unwrap();
    assert_eq!(hits[0].occurrences, 2);

    // Nearest documents are returned even when the phrase is absent
    let hits = service.query("\"purple elephant\"", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].snippet, Snippet::NotFound);
    assert_eq!(hits[0].occurrences, 0);
}

#[tokio::test]
async fn test_empty_store_and_empty_query() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);

    assert!(service.query("anything", None).await.unwrap().is_empty());
    assert!(matches!(
        service.query("\"  \"", None).await,
        Err(AppError::EmptyQuery)
    ));
    assert!(matches!(
        service.ingest("blank.txt", "   ").await,
        Err(AppError::EmptyInput)
    ));
}

#[tokio::test]
async fn test_missing_text_drops_only_that_hit() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    service.ingest_batch(corpus()).await.unwrap();

    std::fs::remove_file(service.paths().texts_dir().join("garden.txt.txt")).unwrap();

    let hits = service.query("garden", Some(3)).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(hits.len(), 2);
    assert!(!ids.contains(&"garden.txt"));
}

#[tokio::test]
async fn test_missing_artifact_blocks_until_reset() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    service.ingest("a.txt", "some text").await.unwrap();

    std::fs::remove_file(
        service
            .paths()
            .generation_dir(1)
            .join(VECTORS_FILE),
    )
    .unwrap();

    assert!(matches!(
        service.query("text", None).await,
        Err(AppError::MissingArtifact(_))
    ));
    assert!(matches!(
        service.ingest("b.txt", "more text").await,
        Err(AppError::MissingArtifact(_))
    ));

    service.reset().await.unwrap();
    let receipt = service.ingest("b.txt", "more text").await.unwrap();
    assert_eq!(receipt.accepted_id, "b.txt");
    assert_eq!(service.stats().await.unwrap().documents, 1);
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    service
        .ingest_document(DocumentInput::new("a.txt", "hello").with_raw(b"Hello".to_vec()))
        .await
        .unwrap();
    assert_eq!(
        service.fetch_document("a.txt").await.unwrap().unwrap(),
        b"Hello"
    );

    service.reset().await.unwrap();

    let stats = service.stats().await.unwrap();
    assert!(!stats.is_initialized());
    assert_eq!(stats.documents, 0);
    assert!(service.list_documents().await.unwrap().is_empty());
    assert!(service.fetch_document("a.txt").await.unwrap().is_none());
    assert!(!service.paths().texts_dir().exists());
    assert!(!service.paths().index_dir().exists());
    assert!(service.query("hello", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_describe_committed_snapshot() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp);
    service.ingest_batch(corpus()).await.unwrap();

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.documents, 3);
    assert_eq!(stats.dimensions, 384);
    assert_eq!(stats.provider.as_deref(), Some("tfidf"));
    assert_eq!(stats.generation, 1);
    assert!(stats.committed_at.is_some());
}

#[tokio::test]
async fn test_fitted_state_survives_restart() {
    let temp = TempDir::new().unwrap();
    let first = service(&temp);
    first.ingest_batch(corpus()).await.unwrap();
    let before = first.query("sourdough oven", Some(3)).await.unwrap();
    drop(first);

    let second = service(&temp);
    let after = second.query("sourdough oven", Some(3)).await.unwrap();
    assert_eq!(before, after);
    assert_eq!(after[0].id, "bread.txt");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingests_are_serialized() {
    let temp = TempDir::new().unwrap();
    let service = Arc::new(service(&temp));

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .ingest("same.txt", &format!("document number {}", i))
                .await
                .unwrap()
                .accepted_id
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }

    assert_eq!(ids.len(), 8);
    assert!(ids.contains("same.txt"));

    let snapshot = snapshots(&service).load().unwrap().unwrap();
    assert_eq!(snapshot.index.len(), 8);
    assert_eq!(snapshot.registry.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_services_share_one_store() {
    // Separate services only coordinate through the file lock
    let temp = TempDir::new().unwrap();
    let a = Arc::new(service(&temp));
    let b = Arc::new(service(&temp));

    let mut handles = Vec::new();
    for i in 0..6 {
        let service = if i % 2 == 0 { Arc::clone(&a) } else { Arc::clone(&b) };
        handles.push(tokio::spawn(async move {
            service
                .ingest(&format!("doc-{}.txt", i), &format!("shared store text {}", i))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let ids = a.list_documents().await.unwrap();
    assert_eq!(ids.len(), 6);
    assert_eq!(b.stats().await.unwrap().generation, 6);
}
