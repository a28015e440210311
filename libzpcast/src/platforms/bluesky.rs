//! Bluesky platform implementation
//!
//! Talks XRPC directly: `com.atproto.server.createSession` for the session and
//! `com.atproto.repo.createRecord` for the post, with an external link embed
//! pointing at the dictionary entry.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::config::BlueskyConfig;
use crate::error::{PlatformError, Result};
use crate::http;
use crate::platforms::Platform;
use crate::types::{FormattedPost, Session, SessionResponse};

/// Bluesky counts graphemes; chars are the closest cheap approximation
pub const BLUESKY_CHARACTER_LIMIT: usize = 300;

const POST_COLLECTION: &str = "app.bsky.feed.post";
const EXTERNAL_EMBED: &str = "app.bsky.embed.external";

pub struct BlueskyClient {
    client: reqwest::Client,
    service: String,
    identifier: String,
    password: SecretString,
    embed_title: String,
    session: Option<Session>,
}

impl BlueskyClient {
    /// Create a new Bluesky client
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (carries the request timeout)
    /// * `config` - PDS, handle and link card title
    /// * `password` - The app password for authentication
    pub fn new(client: reqwest::Client, config: &BlueskyConfig, password: SecretString) -> Self {
        Self {
            client,
            service: config.service.trim_end_matches('/').to_string(),
            identifier: config.identifier.clone(),
            password,
            embed_title: config.embed_title.clone(),
            session: None,
        }
    }

    fn xrpc_url(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service, method)
    }

    /// The current session, if authenticated
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Exchange identifier and password for a fresh session
    pub async fn create_session(
        &self,
        identifier: &str,
        password: &SecretString,
    ) -> std::result::Result<Session, PlatformError> {
        tracing::debug!("Creating Bluesky session for handle: {}", identifier);

        let request = self
            .client
            .post(self.xrpc_url("com.atproto.server.createSession"))
            .json(&json!({
                "identifier": identifier,
                "password": password.expose_secret(),
            }));

        let response = http::send(request).await.map_err(PlatformError::Session)?;
        let session: SessionResponse = http::decode(response)
            .await
            .map_err(PlatformError::Session)?;

        tracing::debug!(did = %session.did, "Bluesky session created");
        Ok(session.into())
    }

    /// Publish `post` to the session's repository and return the record URI
    pub async fn create_record(
        &self,
        session: &Session,
        post: &FormattedPost,
    ) -> std::result::Result<String, PlatformError> {
        let body = build_record(&session.did, post, &self.embed_title, Utc::now());

        let request = self
            .client
            .post(self.xrpc_url("com.atproto.repo.createRecord"))
            .bearer_auth(session.access_jwt.expose_secret())
            .json(&body);

        let response = http::send(request).await.map_err(PlatformError::Record)?;

        // Any 2xx is success; the body is only mined for the URI
        let uri = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("uri").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| format!("at://{}", session.did));

        tracing::debug!("Posted to Bluesky: {}", uri);
        Ok(uri)
    }
}

/// Request body for `com.atproto.repo.createRecord`
pub fn build_record(
    did: &str,
    post: &FormattedPost,
    embed_title: &str,
    created_at: DateTime<Utc>,
) -> Value {
    json!({
        "repo": did,
        "collection": POST_COLLECTION,
        "record": {
            "$type": POST_COLLECTION,
            "text": post.formatted_str,
            "createdAt": created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            "embed": {
                "$type": EXTERNAL_EMBED,
                "external": {
                    "uri": post.link,
                    "title": embed_title,
                    "description": post.entry,
                },
            },
        },
    })
}

#[async_trait]
impl Platform for BlueskyClient {
    async fn authenticate(&mut self) -> Result<()> {
        self.session = None;
        let session = self.create_session(&self.identifier, &self.password).await?;
        self.session = Some(session);
        Ok(())
    }

    async fn post(&self, post: &FormattedPost) -> Result<String> {
        let Some(session) = self.session.as_ref() else {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        };

        // The formatter's cap is authoritative; the PDS has the final word
        if let Err(e) = self.validate_content(&post.formatted_str) {
            tracing::warn!("{}", e);
        }

        tracing::debug!(
            "Posting to Bluesky: {} characters",
            post.formatted_str.chars().count()
        );

        Ok(self.create_record(session, post).await?)
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
        }

        let length = content.chars().count();
        if length > BLUESKY_CHARACTER_LIMIT {
            return Err(PlatformError::Validation(format!(
                "Content exceeds Bluesky's {} character limit (current: {} characters)",
                BLUESKY_CHARACTER_LIMIT, length
            ))
            .into());
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "bluesky"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(BLUESKY_CHARACTER_LIMIT)
    }

    fn is_configured(&self) -> bool {
        !self.identifier.is_empty() && !self.password.expose_secret().is_empty()
    }
}
