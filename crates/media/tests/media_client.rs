#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::{
    io::Write,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    mockito::{Matcher, Server},
    secrecy::Secret,
    wxmedia_config::HttpConfig,
    wxmedia_media::{DownloadOrigin, Error, MediaClient, MediaSettings, MediaType, http_client},
    wxmedia_token::{StaticTokenProvider, TokenProvider},
};

fn settings(server: &Server, media_path: &Path) -> MediaSettings {
    MediaSettings::new(
        format!(
            "{}/cgi-bin/media/upload?access_token={{access_token}}&type={{type}}",
            server.url()
        ),
        format!(
            "{}/cgi-bin/media/get?access_token={{access_token}}&media_id={{media_id}}",
            server.url()
        ),
        media_path,
    )
}

fn client_with(server: &Server, media_path: &Path, tokens: Arc<dyn TokenProvider>) -> MediaClient {
    MediaClient::new(reqwest::Client::new(), tokens, settings(server, media_path))
}

fn client(server: &Server, media_path: &Path) -> MediaClient {
    client_with(server, media_path, Arc::new(StaticTokenProvider::new("TOKEN")))
}

fn upload_query(media_type: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("access_token".into(), "TOKEN".into()),
        Matcher::UrlEncoded("type".into(), media_type.into()),
    ])
}

fn download_query(media_id: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("access_token".into(), "TOKEN".into()),
        Matcher::UrlEncoded("media_id".into(), media_id.into()),
    ])
}

/// Token provider that always fails.
struct NoTokens;

#[async_trait]
impl TokenProvider for NoTokens {
    async fn access_token(&self) -> wxmedia_token::Result<Secret<String>> {
        Err(wxmedia_token::Error::message("credentials unavailable"))
    }
}

/// Static token that counts invalidations.
#[derive(Default)]
struct CountingTokens {
    invalidations: AtomicUsize,
}

#[async_trait]
impl TokenProvider for CountingTokens {
    async fn access_token(&self) -> wxmedia_token::Result<Secret<String>> {
        Ok(Secret::new("TOKEN".into()))
    }

    async fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

// ── upload ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_bytes_returns_media_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(upload_query("image"))
        .match_body(Matcher::Regex(
            r#"name="media"; filename="photo.jpg""#.into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"type":"image","media_id":"MEDIA_123","created_at":1700000000}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let media_id = client(&server, dir.path())
        .upload_bytes("photo.jpg", b"jpeg-bytes".to_vec(), MediaType::Image)
        .await
        .unwrap();

    assert_eq!(media_id, "MEDIA_123");
    mock.assert_async().await;
}

#[tokio::test]
async fn upload_thumb_reads_thumb_media_id() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(upload_query("thumb"))
        .with_status(200)
        .with_body(r#"{"type":"thumb","thumb_media_id":"THUMB_1","created_at":1700000000}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let media_id = client(&server, dir.path())
        .upload_bytes("t.jpg", b"x".to_vec(), MediaType::Thumb)
        .await
        .unwrap();
    assert_eq!(media_id, "THUMB_1");
}

#[tokio::test]
async fn upload_with_both_id_fields_returns_media_id() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(upload_query("thumb"))
        .with_status(200)
        .with_body(r#"{"type":"thumb","media_id":"M","thumb_media_id":"T","created_at":1}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let media_id = client(&server, dir.path())
        .upload_bytes("t.jpg", b"x".to_vec(), MediaType::Thumb)
        .await
        .unwrap();
    assert_eq!(media_id, "M");
}

#[tokio::test]
async fn configured_timeout_limits_slow_download() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(download_query("slow"))
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_secs(3));
            w.write_all(b"late")
        })
        .create_async()
        .await;

    let http = http_client(&HttpConfig {
        timeout_secs: Some(1),
        user_agent: None,
    })
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let client = MediaClient::new(
        http,
        Arc::new(StaticTokenProvider::new("TOKEN")),
        settings(&server, dir.path()),
    );

    let started = Instant::now();
    let err = client
        .download_data("slow", MediaType::Image)
        .await
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(3));
    match err {
        Error::Transport(e) => assert!(e.is_timeout(), "expected timeout, got {e}"),
        other => panic!("expected transport timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn upload_file_sends_file_name_and_content() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(upload_query("voice"))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"filename="note.amr""#.into()),
            Matcher::Regex("voice-payload".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"type":"voice","media_id":"VOICE_9","created_at":1}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("note.amr");
    std::fs::write(&file, "voice-payload").unwrap();

    let media_id = client(&server, dir.path())
        .upload_file(&file, MediaType::Voice)
        .await
        .unwrap();
    assert_eq!(media_id, "VOICE_9");
    mock.assert_async().await;
}

#[tokio::test]
async fn upload_file_missing_fails_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client(&server, dir.path())
        .upload_file(dir.path().join("missing.jpg"), MediaType::Image)
        .await
        .unwrap_err();

    assert!(err.is_local_io(), "unexpected error: {err}");
    assert!(err.to_string().contains("missing.jpg"));
    mock.assert_async().await;
}

#[tokio::test]
async fn upload_error_payload_is_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"errcode":40004,"errmsg":"invalid media type"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client(&server, dir.path())
        .upload_bytes("a.jpg", b"x".to_vec(), MediaType::Image)
        .await
        .unwrap_err();

    assert!(err.is_remote());
    match err {
        Error::Api { errcode, errmsg } => {
            assert_eq!(errcode, 40004);
            assert_eq!(errmsg, "invalid media type");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn upload_malformed_response_is_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client(&server, dir.path())
        .upload_bytes("a.jpg", b"x".to_vec(), MediaType::Image)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { .. }));
    assert!(err.is_remote());
}

#[tokio::test]
async fn upload_without_media_id_is_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"type":"image","created_at":1}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client(&server, dir.path())
        .upload_bytes("a.jpg", b"x".to_vec(), MediaType::Image)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { .. }));
    assert!(err.to_string().contains("media_id"));
}

#[tokio::test]
async fn upload_http_failure_is_status_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client(&server, dir.path())
        .upload_bytes("a.jpg", b"x".to_vec(), MediaType::Image)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Status { .. }));
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn credential_failure_is_propagated() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let err = client_with(&server, dir.path(), Arc::new(NoTokens))
        .upload_bytes("a.jpg", b"x".to_vec(), MediaType::Image)
        .await
        .unwrap_err();

    assert!(err.is_credential());
    assert!(err.to_string().contains("credentials unavailable"));
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_token_is_invalidated() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/cgi-bin/media/upload")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"errcode":42001,"errmsg":"access_token expired"}"#)
        .create_async()
        .await;

    let tokens = Arc::new(CountingTokens::default());
    let dir = tempfile::tempdir().unwrap();
    let err = client_with(&server, dir.path(), tokens.clone())
        .upload_bytes("a.jpg", b"x".to_vec(), MediaType::Image)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api { errcode: 42001, .. }));
    assert_eq!(tokens.invalidations.load(Ordering::SeqCst), 1);
}

// ── download_data ───────────────────────────────────────────────────────────

#[tokio::test]
async fn download_data_returns_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(download_query("abc123"))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(vec![0xff, 0xd8, 0xff, 0xe0])
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let data = client(&server, dir.path())
        .download_data("abc123", MediaType::Image)
        .await
        .unwrap();

    assert_eq!(&data[..], &[0xff, 0xd8, 0xff, 0xe0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn download_data_non_success_is_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("no such media")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client(&server, dir.path())
        .download_data("gone", MediaType::Image)
        .await
        .unwrap_err();

    assert!(err.is_remote());
    assert!(matches!(err, Error::Status { .. }));
}

#[tokio::test]
async fn download_data_error_payload_is_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body(r#"{"errcode":40007,"errmsg":"invalid media_id"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client(&server, dir.path())
        .download_data("bad", MediaType::Voice)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { errcode: 40007, .. }));
}

#[tokio::test]
async fn download_data_keeps_binary_json_lookalike() {
    let mut server = Server::new_async().await;
    let body = r#"{"errcode":1}"#;
    let _mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body(body)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let data = client(&server, dir.path())
        .download_data("raw", MediaType::Video)
        .await
        .unwrap();
    assert_eq!(&data[..], body.as_bytes());
}

// ── download to file ────────────────────────────────────────────────────────

#[tokio::test]
async fn download_writes_once_then_serves_cache() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(download_query("abc123"))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body("image-bytes")
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, dir.path());

    let first = client.download("abc123", MediaType::Image).await.unwrap();
    assert_eq!(first.path, dir.path().join("abc123.jpg"));
    assert_eq!(first.origin, DownloadOrigin::Fetched);
    assert_eq!(std::fs::read(&first.path).unwrap(), b"image-bytes");

    let second = client.download("abc123", MediaType::Image).await.unwrap();
    assert_eq!(second.path, first.path);
    assert!(second.is_cached());
    mock.assert_async().await;
}

#[tokio::test]
async fn download_existing_file_skips_network() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("v1.amr");
    std::fs::write(&existing, "already here").unwrap();

    let got = client_with(&server, dir.path(), Arc::new(NoTokens))
        .download("v1", MediaType::Voice)
        .await
        .unwrap();

    assert!(got.is_cached());
    assert_eq!(got.path, existing);
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "already here");
    mock.assert_async().await;
}

#[tokio::test]
async fn download_creates_missing_media_directory() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(download_query("vid"))
        .with_status(200)
        .with_body("video-bytes")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let media_root = dir.path().join("nested/media");
    let got = client(&server, &media_root)
        .download("vid", MediaType::Video)
        .await
        .unwrap();

    assert_eq!(got.path, media_root.join("vid.mp4"));
    assert_eq!(std::fs::read(&got.path).unwrap(), b"video-bytes");
}

#[tokio::test]
async fn failed_download_leaves_no_file() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, dir.path());
    let err = client.download("abc123", MediaType::Image).await.unwrap_err();

    assert!(err.is_remote());
    assert!(!dir.path().join("abc123.jpg").exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn download_write_failure_is_local_io_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("bytes")
        .create_async()
        .await;

    // A regular file where the media directory should be.
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("media");
    std::fs::write(&blocker, "not a directory").unwrap();

    let err = client(&server, &blocker)
        .download("abc123", MediaType::Image)
        .await
        .unwrap_err();
    assert!(err.is_local_io(), "unexpected error: {err}");
}

#[tokio::test]
async fn download_uses_configured_extension() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/cgi-bin/media/get")
        .match_query(download_query("v2"))
        .with_status(200)
        .with_body("mp3")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = MediaClient::new(
        reqwest::Client::new(),
        Arc::new(StaticTokenProvider::new("TOKEN")),
        settings(&server, dir.path())
            .with_extension(MediaType::Voice, ".mp3")
            .unwrap(),
    );
    let got = client.download("v2", MediaType::Voice).await.unwrap();
    assert_eq!(got.path, dir.path().join("v2.mp3"));
}
