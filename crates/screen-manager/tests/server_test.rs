//! Integration tests for the screen manager tool handlers.

use std::sync::Arc;

use rmcp::model::ErrorCode;
use screen_manager::protocol::server::FORBIDDEN;
use screen_manager::{
    AddScreenParams, KillScreenParams, ListScreensParams, RegisterParams, ScreenManagerServer,
};
use screen_manager_core::{SecuritySettings, SessionSettings};
use screen_manager_session::testing::RecordingMultiplexer;
use screen_manager_session::{Multiplexer, SessionOrchestrator, SessionRegistry};
use screen_manager_store::{init_schema, PersistentStore};

fn server(secret: Option<&str>, listing: &str) -> (ScreenManagerServer, Arc<RecordingMultiplexer>) {
    let store = Arc::new(PersistentStore::open_in_memory());
    init_schema(&store, false).unwrap();
    let recorder = Arc::new(RecordingMultiplexer::with_listing(listing));
    let multiplexer: Arc<dyn Multiplexer> = recorder.clone();
    let registry = Arc::new(SessionRegistry::new(
        store,
        SessionOrchestrator::new(multiplexer, SessionSettings::default()),
    ));
    let security = SecuritySettings {
        secret: secret.map(str::to_string),
    };
    (ScreenManagerServer::new(registry, security), recorder)
}

fn register_params(secret: &str) -> RegisterParams {
    RegisterParams {
        login: "alice".to_string(),
        password_hash: "hash".to_string(),
        secret: secret.to_string(),
    }
}

#[tokio::test]
async fn test_register_requires_secret() {
    let (server, _) = server(Some("s3cret"), "");

    let err = server.register(register_params("wrong")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode(FORBIDDEN));

    let response = server.register(register_params("s3cret")).await.unwrap();
    assert_eq!(response.login, "alice");
}

#[tokio::test]
async fn test_register_closed_without_configured_secret() {
    let (server, _) = server(None, "");
    let err = server.register(register_params("")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode(FORBIDDEN));
}

#[tokio::test]
async fn test_duplicate_registration_is_invalid_params() {
    let (server, _) = server(Some("s"), "");
    server.register(register_params("s")).await.unwrap();
    let err = server.register(register_params("s")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode(-32602));
}

#[tokio::test]
async fn test_add_list_and_kill() {
    let (server, recorder) = server(Some("s"), "\t31.s1\t(Detached)\n");
    server.register(register_params("s")).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s1");

    let added = server
        .add_screen(AddScreenParams {
            name: "s1".to_string(),
            run: "echo hi".to_string(),
            path: path.to_str().unwrap().to_string(),
            login: "alice".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(added.script, path.join("run.sh").display().to_string());
    assert_eq!(std::fs::read_to_string(path.join("run.sh")).unwrap(), "echo hi");

    let listed = server
        .list_screens(ListScreensParams {
            login: "alice".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(listed.count, 1);
    assert_eq!(listed.screens[0].run, "echo hi");

    let killed = server
        .kill_screen(KillScreenParams {
            name: "s1".to_string(),
            login: "alice".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(killed.terminated, vec!["31.s1".to_string()]);
    assert!(recorder.running().is_empty());
}

#[tokio::test]
async fn test_add_with_bad_credentials_is_forbidden() {
    let (server, _) = server(Some("s"), "");
    let err = server
        .add_screen(AddScreenParams {
            name: "s1".to_string(),
            run: "echo".to_string(),
            path: "/tmp/never-created-by-this-test".to_string(),
            login: "nobody".to_string(),
            password_hash: "x".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode(FORBIDDEN));
}
