//! Integration tests for seeding and concurrent access
//!
//! Run with: cargo test --package rollcall-directory --test seeded_directory

use rollcall_core::{CredentialStatus, EntityId, EntityKind, Token};
use rollcall_directory::{InMemoryDirectory, TokenDirectory};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Barrier;

const SEED: &str = r#"{
    "entries": [
        { "token": "qr_011", "kind": "student", "entity_id": 11 },
        { "token": "nfc_001", "kind": "student", "entity_id": 1 },
        { "token": "qr_t07", "kind": "teacher", "entity_id": 7, "status": "revoked" }
    ]
}"#;

#[tokio::test]
async fn test_seed_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SEED.as_bytes()).unwrap();

    let directory = InMemoryDirectory::from_json_file(file.path()).await.unwrap();
    assert_eq!(directory.len(), 3);

    let teacher = directory
        .lookup(&Token::new("qr_t07").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(teacher.kind, EntityKind::Teacher);
    assert_eq!(teacher.status, CredentialStatus::Revoked);
}

#[tokio::test]
async fn test_missing_seed_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = InMemoryDirectory::from_json_file(dir.path().join("absent.json")).await;
    assert!(matches!(
        result,
        Err(rollcall_directory::DirectoryError::Io(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_see_revocation() {
    let directory = Arc::new(InMemoryDirectory::from_json_str(SEED).unwrap());

    const NUM_CONCURRENT_TASKS: usize = 10;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));
    let mut handles = Vec::with_capacity(NUM_CONCURRENT_TASKS);

    for _ in 0..NUM_CONCURRENT_TASKS {
        let directory = Arc::clone(&directory);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            directory.lookup(&Token::new("qr_011").unwrap()).await
        }));
    }

    for handle in handles {
        let entry = handle.await.unwrap().unwrap().unwrap();
        assert_eq!(entry.entity_id, EntityId::new(11));
    }
    assert_eq!(directory.lookup_count(), NUM_CONCURRENT_TASKS as u64);

    directory.revoke(&Token::new("qr_011").unwrap());
    let entry = directory
        .lookup(&Token::new("qr_011").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.is_active());
}

#[tokio::test]
async fn test_arc_directory_is_a_directory() {
    async fn resolve_via<D: TokenDirectory>(directory: &D) -> bool {
        directory
            .lookup(&Token::new("nfc_001").unwrap())
            .await
            .unwrap()
            .is_some()
    }

    let directory = Arc::new(InMemoryDirectory::from_json_str(SEED).unwrap());
    assert!(resolve_via(&directory).await);
}
