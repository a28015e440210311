//! Core types for Zpcast
//!
//! Dictionary types mirror the wire schema of the ZpDIC word search API and
//! are decoded strictly: every listed field is required unless it is an
//! `Option`. Keys the service adds later are ignored.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Opaque identifier the dictionary service assigns to words and examples
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordId(String);

impl WordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single headword record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub id: WordId,
    pub number: i64,
    pub name: String,
    pub pronunciation: String,
    pub equivalents: Vec<Equivalent>,
    pub tags: Vec<String>,
    pub informations: Vec<Information>,
    pub phrases: Vec<Phrase>,
    pub variations: Vec<Variation>,
    pub relations: Vec<Relation>,
    pub examples: Vec<Example>,
}

impl DictionaryEntry {
    /// Create an entry with only the identifying fields set
    pub fn new(id: WordId, number: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            number,
            name: name.into(),
            pronunciation: String::new(),
            equivalents: Vec::new(),
            tags: Vec::new(),
            informations: Vec::new(),
            phrases: Vec::new(),
            variations: Vec::new(),
            relations: Vec::new(),
            examples: Vec::new(),
        }
    }
}

/// A numbered translation group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equivalent {
    pub titles: Vec<String>,
    pub names: Vec<String>,
    pub name_string: String,
    pub ignored_pattern: String,
    pub hidden: bool,
}

impl Equivalent {
    pub fn new(titles: &[&str], names: &[&str]) -> Self {
        Self {
            titles: titles.iter().map(|t| t.to_string()).collect(),
            names: names.iter().map(|n| n.to_string()).collect(),
            name_string: names.join(", "),
            ..Default::default()
        }
    }
}

/// Freeform annotation attached to an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Information {
    pub title: String,
    pub text: String,
    pub hidden: bool,
}

impl Information {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub titles: Vec<String>,
    pub form: String,
    pub terms: Vec<String>,
    pub term_string: String,
    pub ignored_pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub title: String,
    pub name: String,
    pub pronunciation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub titles: Vec<String>,
    pub number: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub id: WordId,
    pub number: i64,
    pub sentence: String,
    pub translation: String,
    pub supplement: String,
    pub tags: Vec<String>,
    pub words: Vec<ExampleWord>,
    pub offer: Option<ExampleOffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleWord {
    pub number: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleOffer {
    pub catalog: String,
    pub number: i64,
}

/// Body of `GET /dictionary/{id}/words`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordsResponse {
    pub words: Vec<DictionaryEntry>,
    pub total: i64,
}

/// Display text derived from one entry, also the cache record payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedPost {
    /// Headword, reused as the link preview description
    pub entry: String,
    pub link: String,
    pub formatted_str: String,
}

/// Account state reported by the PDS on session creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Suspended,
    Takendown,
    Deactivated,
}

/// Wire shape of `com.atproto.server.createSession`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_jwt: String,
    pub refresh_jwt: String,
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub did_doc: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed: Option<bool>,
    #[serde(default)]
    pub email_auth_factor: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

/// Authenticated Bluesky session, held for the duration of one run
#[derive(Debug)]
pub struct Session {
    pub did: String,
    pub handle: String,
    pub access_jwt: SecretString,
    pub refresh_jwt: SecretString,
    pub did_doc: Option<serde_json::Value>,
    pub email: Option<String>,
    pub email_confirmed: Option<bool>,
    pub email_auth_factor: Option<bool>,
    pub active: Option<bool>,
    pub status: Option<AccountStatus>,
}

impl From<SessionResponse> for Session {
    fn from(r: SessionResponse) -> Self {
        Self {
            did: r.did,
            handle: r.handle,
            access_jwt: SecretString::from(r.access_jwt),
            refresh_jwt: SecretString::from(r.refresh_jwt),
            did_doc: r.did_doc,
            email: r.email,
            email_confirmed: r.email_confirmed,
            email_auth_factor: r.email_auth_factor,
            active: r.active,
            status: r.status,
        }
    }
}
