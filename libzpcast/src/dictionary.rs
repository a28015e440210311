//! ZpDIC dictionary client
//!
//! Both operations are built on one word-search request:
//! `GET {base}/dictionary/{id}/words?text=&skip=&limit=` with the API key in
//! the `X-Api-Key` header.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::FetchError;
use crate::http;
use crate::types::{DictionaryEntry, WordsResponse};

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Query parameters of a word search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordQuery {
    pub text: String,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl WordQuery {
    /// Empty-text query, which matches every entry
    pub fn all() -> Self {
        Self::default()
    }

    /// A single entry at `offset`
    pub fn at(offset: u64) -> Self {
        Self {
            text: String::new(),
            skip: Some(offset),
            limit: Some(1),
        }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("text", self.text.clone())];
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Source of dictionary entries for a run
#[async_trait]
pub trait Dictionary: Send + Sync {
    /// Total number of entries in the dictionary
    async fn total_count(&self) -> FetchResult<i64>;

    /// The entry at a zero-based offset
    ///
    /// # Errors
    ///
    /// Returns `FetchError::NotFound` when nothing exists at `offset`.
    async fn entry_at(&self, offset: u64) -> FetchResult<DictionaryEntry>;

    /// Identifier used in log fields and error messages
    fn dictionary_id(&self) -> &str;
}

pub struct ZpdicClient {
    client: reqwest::Client,
    base_url: String,
    dictionary_id: String,
    api_key: SecretString,
}

impl ZpdicClient {
    /// * `base_url` - API root, e.g. `https://zpdic.ziphil.com/api/v0`
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        dictionary_id: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            dictionary_id: dictionary_id.into(),
            api_key,
        }
    }

    fn words_url(&self) -> String {
        format!(
            "{}/dictionary/{}/words",
            self.base_url.trim_end_matches('/'),
            self.dictionary_id
        )
    }

    /// Run one word search and validate the response body
    pub async fn list_words(&self, query: &WordQuery) -> FetchResult<WordsResponse> {
        let url = self.words_url();
        tracing::debug!(url = %url, query = ?query, "Fetching ZpDIC words");

        let request = self
            .client
            .get(&url)
            .header("X-Api-Key", self.api_key.expose_secret())
            .query(&query.pairs());

        let response = http::send(request).await?;
        http::decode(response).await
    }
}

#[async_trait]
impl Dictionary for ZpdicClient {
    async fn total_count(&self) -> FetchResult<i64> {
        let response = self.list_words(&WordQuery::all()).await?;
        Ok(response.total)
    }

    async fn entry_at(&self, offset: u64) -> FetchResult<DictionaryEntry> {
        let response = self.list_words(&WordQuery::at(offset)).await?;
        response.words.into_iter().next().ok_or_else(|| {
            FetchError::NotFound(format!(
                "no word at offset {} in dictionary {}",
                offset, self.dictionary_id
            ))
        })
    }

    fn dictionary_id(&self) -> &str {
        &self.dictionary_id
    }
}
