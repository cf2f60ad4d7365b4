// Integration tests for the local static server.

use std::fs;

use neuvoview_engine::StaticServer;

fn seed_mirror(root: &std::path::Path) {
    fs::write(root.join("index.html"), "<html>neuvo</html>").unwrap();
    fs::write(root.join("version.json"), r#"{"build":"9"}"#).unwrap();
    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("assets/app.js"), "console.log('neuvo');").unwrap();
}

#[tokio::test]
async fn serves_mirrored_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("mirror");
    fs::create_dir_all(&root).unwrap();
    seed_mirror(&root);

    let server = StaticServer::start(root, 0).await.unwrap();
    let base = server.url();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/index.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/html; charset=utf-8"
    );
    assert_eq!(response.text().await.unwrap(), "<html>neuvo</html>");

    // The root path serves the index page.
    let response = client.get(&base).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "<html>neuvo</html>");

    let response = client
        .get(format!("{base}/assets/app.js"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/javascript");

    let response = client
        .get(format!("{base}/version.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["content-type"], "application/json");

    let response = client
        .get(format!("{base}/missing.bin"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.shutdown();
}

#[tokio::test]
async fn hides_the_mirror_state_document() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("mirror");
    fs::create_dir_all(&root).unwrap();
    seed_mirror(&root);
    fs::write(
        root.join("mirror-state.json"),
        r#"{"build":"9","files":{}}"#,
    )
    .unwrap();

    let server = StaticServer::start(root, 0).await.unwrap();
    let base = server.url();

    let response = reqwest::Client::new()
        .get(format!("{base}/mirror-state.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.shutdown();
}

#[tokio::test]
async fn rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("mirror");
    fs::create_dir_all(&root).unwrap();
    seed_mirror(&root);
    fs::write(dir.path().join("secret.txt"), "do not serve").unwrap();

    let server = StaticServer::start(root, 0).await.unwrap();
    let base = server.url();

    let response = reqwest::Client::new()
        .get(format!("{base}/%2e%2e/secret.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.shutdown();
}

#[tokio::test]
async fn shutdown_releases_the_port() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("mirror");
    fs::create_dir_all(&root).unwrap();
    seed_mirror(&root);

    let server = StaticServer::start(root.clone(), 0).await.unwrap();
    let port = server.port();
    server.shutdown();

    // Graceful shutdown is asynchronous; retry binding briefly.
    let mut replacement = None;
    for _ in 0..20 {
        match StaticServer::start(root.clone(), port).await {
            Ok(server) => {
                replacement = Some(server);
                break;
            }
            Err(_) => tokio::time::sleep(std::time::Duration::from_millis(100)).await,
        }
    }
    let replacement = replacement.expect("port not released after shutdown");
    assert_eq!(replacement.port(), port);
    replacement.shutdown();
}
