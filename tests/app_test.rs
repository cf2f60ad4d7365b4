// End-to-end flow: queue a sync pass through AppState, watch the phase
// events, then fetch the mirrored page from the local server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;

use neuvoview_engine::{AppState, EngineEvent, SettingsManager, SyncPhase};

type FileMap = Arc<Mutex<HashMap<String, Vec<u8>>>>;

async fn cdn_handler(State(files): State<FileMap>, Path(path): Path<String>) -> Response {
    match files.lock().get(&path) {
        Some(body) => (
            StatusCode::OK,
            [(header::LAST_MODIFIED, "Tue, 15 Nov 1994 08:12:31 GMT")],
            body.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no such asset").into_response(),
    }
}

async fn start_cdn(files: FileMap) -> String {
    let app = Router::new()
        .route("/{*path}", get(cdn_handler))
        .with_state(files);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://127.0.0.1:{port}")
}

async fn next_event(rx: &mut broadcast::Receiver<EngineEvent>) -> EngineEvent {
    timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for engine event")
        .expect("event bus closed")
}

#[tokio::test]
async fn sync_pass_ends_serving_the_mirror() {
    let files: FileMap = Arc::new(Mutex::new(HashMap::new()));
    {
        let mut guard = files.lock();
        guard.insert("version.json".into(), json!({"build": "3"}).to_string().into());
        guard.insert(
            "model.json".into(),
            json!({"weightsManifest": [{"paths": ["group1-shard1of1.bin"]}]})
                .to_string()
                .into(),
        );
        guard.insert("files.json".into(), json!(["index.html"]).to_string().into());
        guard.insert("group1-shard1of1.bin".into(), vec![7u8; 16]);
        guard.insert("index.html".into(), b"<html>neuvo</html>".to_vec());
    }
    let base = start_cdn(files).await;

    let dir = tempfile::tempdir().unwrap();
    let settings = Arc::new(SettingsManager::with_path(dir.path().join("config.json")));
    let mut engine_settings = settings.read();
    engine_settings.remote_base_url = Some(base);
    engine_settings.mirror_dir = Some(dir.path().join("mirror"));
    engine_settings.server_port = 0;
    settings.write(engine_settings).unwrap();

    let app = AppState::with_settings(settings.clone());
    let mut events = app.subscribe();
    app.start_sync().unwrap();

    let mut phases = Vec::new();
    let url = loop {
        match next_event(&mut events).await {
            EngineEvent::SyncPhase { phase } => phases.push(phase),
            EngineEvent::ServerStarted { url } => break url,
            EngineEvent::SyncError { message } => panic!("sync failed: {message}"),
            _ => {}
        }
    };
    assert_eq!(phases, vec![SyncPhase::Checking, SyncPhase::Downloading]);

    // The serving phase lands right after the server URL.
    loop {
        if let EngineEvent::SyncPhase { phase } = next_event(&mut events).await {
            assert_eq!(phase, SyncPhase::Serving);
            break;
        }
    }
    assert_eq!(app.phase(), SyncPhase::Serving);
    assert_eq!(app.serve_url().as_deref(), Some(url.as_str()));
    assert!(settings.last_synced().is_some());

    let body = reqwest::get(format!("{url}/index.html"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "<html>neuvo</html>");

    // A second pass finds the mirror current and just re-serves it.
    app.start_sync().unwrap();
    loop {
        match next_event(&mut events).await {
            EngineEvent::SyncPhase {
                phase: SyncPhase::Serving,
            } => break,
            EngineEvent::SyncPhase {
                phase: SyncPhase::Downloading,
            } => panic!("no download expected for a current mirror"),
            EngineEvent::SyncError { message } => panic!("sync failed: {message}"),
            _ => {}
        }
    }

    app.shutdown();
    assert_eq!(app.serve_url(), None);
}

#[tokio::test]
async fn startup_only_syncs_when_auto_sync_is_enabled() {
    let files: FileMap = Arc::new(Mutex::new(HashMap::new()));
    files
        .lock()
        .insert("version.json".into(), json!({"build": "1"}).to_string().into());
    let base = start_cdn(files).await;

    let dir = tempfile::tempdir().unwrap();
    let settings = Arc::new(SettingsManager::with_path(dir.path().join("config.json")));
    let mut engine_settings = settings.read();
    engine_settings.remote_base_url = Some(base);
    engine_settings.mirror_dir = Some(dir.path().join("mirror"));
    engine_settings.server_port = 0;
    engine_settings.auto_sync = false;
    settings.write(engine_settings).unwrap();

    let app = AppState::with_settings(settings.clone());
    let mut events = app.subscribe();

    app.startup().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(app.phase(), SyncPhase::Idle);
    assert!(events.try_recv().is_err());

    let mut engine_settings = settings.read();
    engine_settings.auto_sync = true;
    settings.write(engine_settings).unwrap();

    app.startup().unwrap();
    loop {
        if let EngineEvent::SyncPhase { phase } = next_event(&mut events).await {
            assert_eq!(phase, SyncPhase::Checking);
            break;
        }
    }
    app.shutdown();
}
