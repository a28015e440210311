//! In-memory platform for exercising runs without Bluesky
//!
//! Every call is recorded in a shared [`MockHandles`] log, which stays
//! readable after the platform has been boxed and moved into a `Runner`.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::FormattedPost;

/// How a mocked call ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Succeed,
    Fail(String),
}

#[derive(Debug, Default)]
struct CallLog {
    auth_calls: usize,
    post_calls: usize,
    posted: Vec<FormattedPost>,
}

/// Shared view of a mock platform's call log
#[derive(Debug, Clone, Default)]
pub struct MockHandles {
    log: Arc<Mutex<CallLog>>,
}

impl MockHandles {
    fn lock(&self) -> MutexGuard<'_, CallLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn auth_call_count(&self) -> usize {
        self.lock().auth_calls
    }

    pub fn post_call_count(&self) -> usize {
        self.lock().post_calls
    }

    /// Posts that were accepted, in order
    pub fn posted(&self) -> Vec<FormattedPost> {
        self.lock().posted.clone()
    }
}

pub struct MockPlatform {
    name: String,
    auth: MockOutcome,
    post: MockOutcome,
    latency: Duration,
    character_limit: Option<usize>,
    authenticated: bool,
    handles: MockHandles,
}

impl MockPlatform {
    pub fn new(name: &str, auth: MockOutcome, post: MockOutcome) -> Self {
        Self {
            name: name.to_string(),
            auth,
            post,
            latency: Duration::ZERO,
            character_limit: None,
            authenticated: false,
            handles: MockHandles::default(),
        }
    }

    pub fn success(name: &str) -> Self {
        Self::new(name, MockOutcome::Succeed, MockOutcome::Succeed)
    }

    /// Login is refused with `error`
    pub fn auth_failure(name: &str, error: &str) -> Self {
        Self::new(name, MockOutcome::Fail(error.to_string()), MockOutcome::Succeed)
    }

    /// Login works, the post is rejected with `error`
    pub fn post_failure(name: &str, error: &str) -> Self {
        Self::new(name, MockOutcome::Succeed, MockOutcome::Fail(error.to_string()))
    }

    /// Succeeds after sleeping `latency` on every call
    pub fn with_delay(name: &str, latency: Duration) -> Self {
        Self::success(name).latency(latency)
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_character_limit(mut self, limit: usize) -> Self {
        self.character_limit = Some(limit);
        self
    }

    pub fn handles(&self) -> MockHandles {
        self.handles.clone()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn authenticate(&mut self) -> Result<()> {
        self.handles.lock().auth_calls += 1;
        self.simulate_latency().await;

        match &self.auth {
            MockOutcome::Succeed => {
                self.authenticated = true;
                Ok(())
            }
            MockOutcome::Fail(message) => {
                Err(PlatformError::Authentication(message.clone()).into())
            }
        }
    }

    async fn post(&self, post: &FormattedPost) -> Result<String> {
        let call = {
            let mut log = self.handles.lock();
            log.post_calls += 1;
            log.post_calls
        };

        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }
        self.simulate_latency().await;

        match &self.post {
            MockOutcome::Succeed => {
                self.handles.lock().posted.push(post.clone());
                Ok(format!("{}:mock-{}", self.name, call))
            }
            MockOutcome::Fail(message) => Err(PlatformError::Posting(message.clone()).into()),
        }
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
        }

        match self.character_limit {
            Some(limit) if content.chars().count() > limit => Err(PlatformError::Validation(
                format!("Content exceeds {} character limit", limit),
            )
            .into()),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn character_limit(&self) -> Option<usize> {
        self.character_limit
    }

    fn is_configured(&self) -> bool {
        true
    }
}
