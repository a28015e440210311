//! One bot run: count, pick, fetch, format, authenticate, publish
//!
//! Every stage returns early on failure. The cache write runs alongside
//! authentication and publishing; its failure is logged but never fails the
//! run.
//!
//! # Examples
//!
//! ```no_run
//! use libzpcast::runner::Runner;
//! # async fn example(mut runner: Runner) -> libzpcast::error::Result<()> {
//! let report = runner.run_once().await?;
//! println!("{}\n{}", report.post.formatted_str, report.post.link);
//! # Ok(())
//! # }
//! ```

use rand::Rng;
use secrecy::SecretString;
use std::sync::Arc;

use crate::cache::{PostCache, SqliteCache};
use crate::config::{Config, Credentials};
use crate::dictionary::{Dictionary, FetchResult, ZpdicClient};
use crate::error::{CacheError, FetchError, Result};
use crate::format::{format_entry, LinkTarget};
use crate::http::build_client;
use crate::platforms::bluesky::BlueskyClient;
use crate::platforms::Platform;
use crate::types::{DictionaryEntry, FormattedPost};

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub post: FormattedPost,
    /// Identifier the platform returned for the new post
    pub post_uri: String,
    /// Whether the cache slot now holds this post
    pub cached: bool,
}

/// Draw an offset uniformly from `[0, total)`
///
/// # Errors
///
/// Returns `FetchError::NotFound` when `total` is zero or negative, since
/// there is nothing to draw from.
pub fn pick_index<R: Rng + ?Sized>(total: i64, rng: &mut R) -> FetchResult<u64> {
    if total <= 0 {
        return Err(FetchError::NotFound(format!(
            "dictionary has no words (total = {})",
            total
        )));
    }
    Ok(rng.gen_range(0..total as u64))
}

/// Fetch the entry at a fixed offset
pub async fn fetch_entry_at(dictionary: &dyn Dictionary, offset: u64) -> FetchResult<DictionaryEntry> {
    let entry = dictionary.entry_at(offset).await?;
    tracing::info!(
        dictionary_id = dictionary.dictionary_id(),
        index = offset,
        number = entry.number,
        entry = %entry.name,
        "Fetched word"
    );
    Ok(entry)
}

/// Count the dictionary, draw an offset and fetch that entry
pub async fn fetch_random_entry(dictionary: &dyn Dictionary) -> FetchResult<DictionaryEntry> {
    let total = dictionary.total_count().await?;
    tracing::debug!(dictionary_id = dictionary.dictionary_id(), total, "Counted words");

    let index = pick_index(total, &mut rand::thread_rng())?;
    fetch_entry_at(dictionary, index).await
}

/// Fetch the pinned or a random entry and format it, without publishing
pub async fn preview_entry(
    dictionary: &dyn Dictionary,
    index: Option<u64>,
    link_target: &LinkTarget,
) -> Result<FormattedPost> {
    let entry = match index {
        Some(offset) => fetch_entry_at(dictionary, offset).await?,
        None => fetch_random_entry(dictionary).await?,
    };
    Ok(format_entry(&entry, link_target))
}

/// Build the ZpDIC client alone, for runs that never reach Bluesky
pub fn dictionary_from_config(config: &Config, api_key: SecretString) -> Result<ZpdicClient> {
    config.validate()?;
    Ok(zpdic_client(config, build_client(&config.http)?, api_key))
}

fn zpdic_client(config: &Config, client: reqwest::Client, api_key: SecretString) -> ZpdicClient {
    ZpdicClient::new(
        client,
        &config.zpdic.base_url,
        &config.zpdic.dictionary_id,
        api_key,
    )
}

/// Authenticate and publish one post
pub async fn publish(platform: &mut dyn Platform, post: &FormattedPost) -> Result<String> {
    platform.authenticate().await?;
    platform.post(post).await
}

/// Write the cache slot, logging instead of failing
async fn store_best_effort(cache: Option<&dyn PostCache>, post: &FormattedPost) -> bool {
    let Some(cache) = cache else {
        return false;
    };

    match cache.store(post).await {
        Ok(()) => {
            tracing::debug!("Cached last post");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to cache last post");
            false
        }
    }
}

pub struct Runner {
    dictionary: Box<dyn Dictionary>,
    platform: Box<dyn Platform>,
    cache: Option<Arc<dyn PostCache>>,
    link_target: LinkTarget,
}

impl Runner {
    pub fn new(
        dictionary: Box<dyn Dictionary>,
        platform: Box<dyn Platform>,
        link_target: LinkTarget,
    ) -> Self {
        Self {
            dictionary,
            platform,
            cache: None,
            link_target,
        }
    }

    /// Also write every post to `cache`
    pub fn with_cache(mut self, cache: Arc<dyn PostCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Wire the production dictionary, Bluesky client and (optionally) cache
    pub async fn from_config(config: &Config, credentials: Credentials) -> Result<Self> {
        config.validate()?;

        let client = build_client(&config.http)?;
        let dictionary = zpdic_client(config, client.clone(), credentials.zpdic_api_key);
        let platform = BlueskyClient::new(client, &config.bluesky, credentials.bluesky_password);

        let runner = Self::new(
            Box::new(dictionary),
            Box::new(platform),
            config.zpdic.link_target(),
        );

        if config.cache_enabled() {
            let cache = open_cache(config).await?;
            Ok(runner.with_cache(cache))
        } else {
            Ok(runner)
        }
    }

    pub fn cache(&self) -> Option<Arc<dyn PostCache>> {
        self.cache.clone()
    }

    pub fn dictionary(&self) -> &dyn Dictionary {
        self.dictionary.as_ref()
    }

    /// Fetch and format a random entry without publishing it
    pub async fn preview(&self, index: Option<u64>) -> Result<FormattedPost> {
        preview_entry(self.dictionary.as_ref(), index, &self.link_target).await
    }

    /// One complete run with a random entry
    pub async fn run_once(&mut self) -> Result<RunReport> {
        self.run(None).await
    }

    /// One complete run; `index` pins the offset instead of drawing one
    pub async fn run(&mut self, index: Option<u64>) -> Result<RunReport> {
        let post = self.preview(index).await?;

        let cache = self.cache.as_deref();
        let (cached, published) = tokio::join!(
            store_best_effort(cache, &post),
            publish(self.platform.as_mut(), &post),
        );
        let post_uri = published?;

        tracing::info!(
            platform = self.platform.name(),
            uri = %post_uri,
            link = %post.link,
            text = %post.formatted_str,
            cached,
            "Successfully posted"
        );

        Ok(RunReport {
            post,
            post_uri,
            cached,
        })
    }
}

/// Open the SQLite cache named in the config
pub async fn open_cache(config: &Config) -> std::result::Result<Arc<dyn PostCache>, CacheError> {
    let cache = SqliteCache::new(&config.cache.path).await?;
    Ok(Arc::new(cache))
}
