// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use outreach::domain::services::session_store::{SessionBlob, SessionError, SessionStore};
use outreach::infrastructure::session::file_session_store::FileSessionStore;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_missing_session_loads_as_none() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::new(dir.path());

    assert!(store.load("acct-a").await.unwrap().is_none());
}

/// 保存后可读回，覆盖写入以最后一次为准
#[tokio::test]
async fn test_save_then_load_overwrites() {
    let dir = TempDir::new().unwrap();
    // 目录不存在时自动创建
    let store = FileSessionStore::new(dir.path().join("cookies"));

    let first = SessionBlob(json!({ "token": "one" }));
    let second = SessionBlob(json!({ "token": "two", "cookies": [{ "name": "sid" }] }));

    store.save("acct-a", &first).await.unwrap();
    assert_eq!(store.load("acct-a").await.unwrap(), Some(first));

    store.save("acct-a", &second).await.unwrap();
    assert_eq!(store.load("acct-a").await.unwrap(), Some(second));

    assert!(store.dir().join("acct-a.json").exists());
    assert!(!store.dir().join("acct-a.json.tmp").exists());
}

/// 账号之间互不影响
#[tokio::test]
async fn test_sessions_are_per_account() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::new(dir.path());

    store
        .save("alice@example.com", &SessionBlob(json!({ "token": "a" })))
        .await
        .unwrap();

    assert!(store.load("alice@example.com").await.unwrap().is_some());
    assert!(store.load("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unsafe_account_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::new(dir.path());
    let blob = SessionBlob(json!({}));

    for account_id in ["../escape", "a/b", "", ".hidden"] {
        let err = store.save(account_id, &blob).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidAccount(_)));
    }
}

#[tokio::test]
async fn test_corrupt_session_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("acct-a.json"), b"{not json").unwrap();
    let store = FileSessionStore::new(dir.path());

    let err = store.load("acct-a").await.unwrap_err();
    assert!(matches!(err, SessionError::Serialization(_)));
}
