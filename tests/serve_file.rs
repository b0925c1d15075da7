//! End-to-end tests for serving the configured file.

use file_relay::http::FILE_NOT_FOUND;

mod common;

#[tokio::test]
async fn serves_whole_file_in_order() {
    let data = common::payload(3 * 1024 * 1024 + 17);
    let file = common::fixture(&data);
    let (addr, shutdown) = common::start_server(file.path(), 64 * 1024).await;

    let res = common::client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.content_length(), Some(data.len() as u64));
    assert_eq!(
        res.headers()["content-type"],
        "application/octet-stream"
    );

    let body = res.bytes().await.unwrap();
    assert_eq!(body.len(), data.len());
    assert!(body[..] == data[..], "body differs from file contents");

    shutdown.trigger();
}

#[tokio::test]
async fn any_path_serves_the_same_file() {
    let data = common::payload(1000);
    let file = common::fixture(&data);
    let (addr, shutdown) = common::start_server(file.path(), 256).await;

    let body = common::client()
        .get(format!("http://{}/some/other/path", addr))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&body[..], &data[..]);

    shutdown.trigger();
}

#[tokio::test]
async fn missing_file_is_500_without_content() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown) = common::start_server(&dir.path().join("gone.txt"), 1024).await;

    let res = common::client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), FILE_NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn request_id_is_assigned_and_echoed() {
    let file = common::fixture(b"hello");
    let (addr, shutdown) = common::start_server(file.path(), 1024).await;
    let client = common::client();

    let generated = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();
    let id = generated.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(id.len(), 36, "expected a UUID, got {id}");

    let echoed = client
        .get(format!("http://{}/", addr))
        .header("x-request-id", "client-chosen-id")
        .send()
        .await
        .unwrap();
    assert_eq!(echoed.headers()["x-request-id"], "client-chosen-id");

    shutdown.trigger();
}
