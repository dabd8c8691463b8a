//! Corpus loading through querying, against files on disk

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use sitechat_ingestion::{CorpusLoader, SourceLocation};
use sitechat_search::{EngineHandle, EngineStatus, KnowledgeSearch, SearchError};
use std::path::Path;
use std::time::Duration;

fn single_page_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn loader(document: &Path, knowledge: &Path) -> CorpusLoader {
    CorpusLoader::new(
        SourceLocation::LocalFile(document.to_path_buf()),
        SourceLocation::LocalFile(knowledge.to_path_buf()),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn builds_engine_and_ranks_query_terms() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("company_profile.pdf");
    let knowledge = dir.path().join("content.json");
    std::fs::write(
        &document,
        single_page_pdf("Our transmission line projects span 400kV and 230kV networks"),
    )
    .unwrap();
    std::fs::write(
        &knowledge,
        serde_json::to_vec(&serde_json::json!({
            "services": ["Transmission line EPC", "Substation construction"],
        }))
        .unwrap(),
    )
    .unwrap();

    let handle = EngineHandle::new();
    handle.spawn_build(loader(&document, &knowledge)).await.unwrap().unwrap();
    assert_eq!(handle.status(), EngineStatus::Ready);

    let engine = handle.engine().unwrap();
    assert_eq!(engine.table().frequency("transmission"), Some(2));
    assert_eq!(engine.table().frequency("line"), Some(2));
    assert_eq!(engine.table().frequency("substation"), Some(1));

    // "transmission" (2) outranks "networks" (1)
    let result = handle.query("networks about transmission").await.unwrap();
    assert_eq!(result, "transmission networks");

    let result = handle.query("tell me about transmission networks").await.unwrap();
    assert_eq!(result, "transmission networks");
}

#[tokio::test]
async fn fetch_failure_never_reaches_ready() {
    let dir = tempfile::tempdir().unwrap();
    let knowledge = dir.path().join("content.json");
    std::fs::write(&knowledge, b"{}").unwrap();

    let handle = EngineHandle::new();
    let result = handle
        .spawn_build(loader(&dir.path().join("missing.pdf"), &knowledge))
        .await
        .unwrap();

    assert!(matches!(result, Err(SearchError::Build(_))));
    assert_eq!(handle.status(), EngineStatus::Failed);
    assert!(matches!(
        handle.wait_ready().await,
        Err(SearchError::ConstructionFailed { .. })
    ));
    assert!(matches!(
        handle.query("transmission").await,
        Err(SearchError::QueryOnUninitializedEngine { .. })
    ));
}

#[tokio::test]
async fn unparsable_document_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("company_profile.pdf");
    let knowledge = dir.path().join("content.json");
    std::fs::write(&document, b"%PDF-1.5 truncated").unwrap();
    std::fs::write(&knowledge, b"{}").unwrap();

    let handle = EngineHandle::new();
    let result = handle.spawn_build(loader(&document, &knowledge)).await.unwrap();

    assert!(result.is_err());
    assert_eq!(handle.status(), EngineStatus::Failed);
}
