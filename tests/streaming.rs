//! End-to-end tail-follow tests against a live listener.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;

mod common;

use common::{bearer, client, test_config, SseReader, TestApp, POLL};

fn append(path: &Path, data: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(data.as_bytes()).unwrap();
}

async fn open_stream(base: &str, file: &str) -> reqwest::Response {
    client()
        .get(format!("{}/stream-logs", base))
        .query(&[("file", file)])
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn rejects_bad_names_before_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "secret\n").unwrap();
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    for name in ["../etc/passwd.log", "sub/app.log", "..\\app.log", "notes.txt"] {
        let response = open_stream(&base, name).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{name}");
        let body = response.text().await.unwrap();
        assert!(!body.contains("data:"), "{name}");
    }
}

#[tokio::test]
async fn missing_file_is_404_without_frames() {
    let dir = tempfile::tempdir().unwrap();
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    let response = open_stream(&base, "nonexistent.log").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.text().await.unwrap();
    assert!(body.starts_with("Error: log file not found"));
    assert!(!body.contains("data:"));
}

#[tokio::test]
async fn directory_named_like_a_log_is_404() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("archive.log")).unwrap();
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    let response = open_stream(&base, "archive.log").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn streams_existing_then_appended_lines_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "line1\n").unwrap();
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    let response = open_stream(&base, "app.log").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut sse = SseReader::new(response);
    assert_eq!(sse.next_data(Duration::from_secs(2)).await.as_deref(), Some("line1"));

    append(&path, "line2\n");
    assert_eq!(sse.next_data(POLL * 10).await.as_deref(), Some("line2"));

    // Nothing is repeated afterwards.
    assert!(sse.collect_for(POLL * 5).await.is_empty());
}

#[tokio::test]
async fn truncation_resumes_from_start_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotating.log");
    std::fs::write(&path, "before-1\nbefore-2\n").unwrap();
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    let mut sse = SseReader::new(open_stream(&base, "rotating.log").await);
    assert_eq!(sse.collect_for(POLL * 4).await, vec!["before-1", "before-2"]);

    OpenOptions::new().write(true).truncate(true).open(&path).unwrap();
    tokio::time::sleep(POLL * 3).await;
    append(&path, "after-1\n");

    assert_eq!(sse.collect_for(POLL * 6).await, vec!["after-1"]);
}

#[tokio::test]
async fn default_file_is_used_when_none_given() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mylog.log"), "default\n").unwrap();
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    let response = client()
        .get(format!("{}/stream-logs", base))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap();
    let mut sse = SseReader::new(response);
    assert_eq!(sse.next_data(Duration::from_secs(2)).await.as_deref(), Some("default"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn disconnect_releases_file_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "line1\n").unwrap();
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    let mut sse = SseReader::new(open_stream(&base, "app.log").await);
    assert_eq!(sse.next_data(Duration::from_secs(2)).await.as_deref(), Some("line1"));
    assert_eq!(common::open_handles(&path), 1);

    drop(sse);

    let mut released = false;
    for _ in 0..40 {
        tokio::time::sleep(POLL).await;
        if common::open_handles(&path) == 0 {
            released = true;
            break;
        }
    }
    assert!(released, "tail session kept the file open after disconnect");
}

#[tokio::test]
async fn shutdown_ends_open_streams() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.log"), "line1\n").unwrap();
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    let mut sse = SseReader::new(open_stream(&base, "app.log").await);
    assert_eq!(sse.next_data(Duration::from_secs(2)).await.as_deref(), Some("line1"));

    app.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), async {
        while sse.next_data(Duration::from_secs(2)).await.is_some() {}
    })
    .await
    .expect("stream should end after shutdown");
}

#[tokio::test]
async fn list_files_returns_only_log_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.log", "b.log", "c.txt"] {
        std::fs::write(dir.path().join(name), "log data").unwrap();
    }
    let app = TestApp::new(test_config(dir.path()));
    let base = app.spawn().await;

    let response = client()
        .get(format!("{}/list-files", base))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut names: Vec<String> = response.json().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["a.log".to_string(), "b.log".to_string()]);
}

#[tokio::test]
async fn list_files_reports_unreadable_directory() {
    let dir = tempfile::tempdir().unwrap();
    let app = TestApp::new(test_config(&dir.path().join("missing")));
    let base = app.spawn().await;

    let response = client()
        .get(format!("{}/list-files", base))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
