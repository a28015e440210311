//! Platform abstraction and implementations
//!
//! A run authenticates once and publishes one post. Each platform handles its
//! own session handling and content checks behind the [`Platform`] trait.
//!
//! # Examples
//!
//! ```no_run
//! use libzpcast::platforms::{Platform, bluesky::BlueskyClient};
//! use libzpcast::config::BlueskyConfig;
//! use libzpcast::types::FormattedPost;
//! use secrecy::SecretString;
//!
//! # async fn example(post: FormattedPost) -> libzpcast::error::Result<()> {
//! let mut platform = BlueskyClient::new(
//!     reqwest::Client::new(),
//!     &BlueskyConfig::default(),
//!     SecretString::from("app-password".to_string()),
//! );
//!
//! platform.authenticate().await?;
//! let uri = platform.post(&post).await?;
//! println!("Posted: {}", uri);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::FormattedPost;

pub mod bluesky;

// Available outside tests so integration tests can drive the runner
pub mod mock;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Authenticate with the platform
    ///
    /// Called once per run, before [`Platform::post`]. No session is reused
    /// across runs.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Session` when the session request fails, or
    /// `PlatformError::Authentication` for platform-specific refusals.
    async fn authenticate(&mut self) -> Result<()>;

    /// Publish a post and return the platform's identifier for it
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The platform is not authenticated (`PlatformError::Authentication`)
    /// - The record request fails (`PlatformError::Record`)
    async fn post(&self, post: &FormattedPost) -> Result<String>;

    /// Check content against platform rules before posting
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Validation` if the content fails validation
    fn validate_content(&self, content: &str) -> Result<()>;

    /// Lowercase identifier, e.g. "bluesky"
    fn name(&self) -> &str;

    /// Maximum post length, or `None` if there is no hard limit
    fn character_limit(&self) -> Option<usize>;

    /// Whether the platform has what it needs to authenticate
    fn is_configured(&self) -> bool;
}
