//! Bluesky XRPC contract tests
//!
//! A wiremock PDS stands in for bsky.social so the session and record
//! requests can be checked byte for byte.

mod common;

use common::session_body;
use libzpcast::config::BlueskyConfig;
use libzpcast::error::{FetchError, PlatformError, ZpcastError};
use libzpcast::platforms::bluesky::BlueskyClient;
use libzpcast::platforms::Platform;
use libzpcast::types::FormattedPost;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_PATH: &str = "/xrpc/com.atproto.server.createSession";
const RECORD_PATH: &str = "/xrpc/com.atproto.repo.createRecord";

fn client_for(server: &MockServer) -> BlueskyClient {
    let config = BlueskyConfig {
        service: server.uri(),
        identifier: "bot.bsky.social".to_string(),
        ..Default::default()
    };
    BlueskyClient::new(
        reqwest::Client::new(),
        &config,
        SecretString::from("app-password".to_string()),
    )
}

fn post() -> FormattedPost {
    FormattedPost {
        entry: "fel".to_string(),
        link: "https://zpdic.ziphil.com/dictionary/633?kind=exact&number=42".to_string(),
        formatted_str: "fel /fɛl/  [noun]\n\n1. 【en】 stone".to_string(),
    }
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_session_sends_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .and(body_partial_json(json!({
            "identifier": "bot.bsky.social",
            "password": "app-password",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.authenticate().await.unwrap();

    let session = client.session().unwrap();
    assert_eq!(session.did, "did:plc:testbot");
    assert_eq!(session.access_jwt.expose_secret(), "access-token");
}

#[tokio::test]
async fn test_rejected_password_is_session_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "AuthenticationRequired",
            "message": "Invalid identifier or password",
        })))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let err = client.authenticate().await.unwrap_err();

    match &err {
        ZpcastError::Platform(PlatformError::Session(FetchError::Http { status, .. })) => {
            assert_eq!(*status, 401);
        }
        other => panic!("Expected session HTTP error, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 3);
    assert!(client.session().is_none());
}

#[tokio::test]
async fn test_session_without_did_is_validation_error() {
    let server = MockServer::start().await;

    let mut body = session_body();
    body.as_object_mut().unwrap().remove("did");

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    match client_for(&server).authenticate().await {
        Err(ZpcastError::Platform(PlatformError::Session(FetchError::Validation(issues)))) => {
            assert_eq!(issues[0].path, "did");
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_record_carries_token_and_embed() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("POST"))
        .and(path(RECORD_PATH))
        .and(header("Authorization", "Bearer access-token"))
        .and(body_partial_json(json!({
            "repo": "did:plc:testbot",
            "collection": "app.bsky.feed.post",
            "record": {
                "$type": "app.bsky.feed.post",
                "text": "fel /fɛl/  [noun]\n\n1. 【en】 stone",
                "embed": {
                    "$type": "app.bsky.embed.external",
                    "external": {
                        "uri": "https://zpdic.ziphil.com/dictionary/633?kind=exact&number=42",
                        "title": "ZpDIC Online",
                        "description": "fel",
                    },
                },
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "at://did:plc:testbot/app.bsky.feed.post/3kabc",
            "cid": "bafyrei",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.authenticate().await.unwrap();
    let uri = client.post(&post()).await.unwrap();

    assert_eq!(uri, "at://did:plc:testbot/app.bsky.feed.post/3kabc");
}

#[tokio::test]
async fn test_record_without_uri_falls_back_to_repo() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("POST"))
        .and(path(RECORD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.authenticate().await.unwrap();

    assert_eq!(client.post(&post()).await.unwrap(), "at://did:plc:testbot");
}

#[tokio::test]
async fn test_record_failure_is_record_error() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("POST"))
        .and(path(RECORD_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.authenticate().await.unwrap();
    let err = client.post(&post()).await.unwrap_err();

    match &err {
        ZpcastError::Platform(PlatformError::Record(FetchError::Http { status, status_text })) => {
            assert_eq!(*status, 500);
            assert_eq!(status_text, "Internal Server Error");
        }
        other => panic!("Expected record HTTP error, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_long_post_is_still_sent() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("POST"))
        .and(path(RECORD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "at://did:plc:testbot/app.bsky.feed.post/long",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let long = FormattedPost {
        formatted_str: "あ".repeat(450),
        ..post()
    };

    let mut client = client_for(&server);
    client.authenticate().await.unwrap();
    assert!(client.validate_content(&long.formatted_str).is_err());

    let uri = client.post(&long).await.unwrap();
    assert!(uri.ends_with("/long"));
}

#[tokio::test]
async fn test_failed_reauthentication_drops_old_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "AuthenticationRequired",
            "message": "Invalid identifier or password"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(RECORD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.authenticate().await.unwrap();
    assert!(client.session().is_some());

    assert!(client.authenticate().await.is_err());
    assert!(client.session().is_none());

    let err = client.post(&post()).await.unwrap_err();
    assert!(err.to_string().contains("Not authenticated"));
}
