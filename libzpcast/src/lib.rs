//! Zpcast - posts a random ZpDIC dictionary entry to Bluesky
//!
//! A run counts the dictionary, picks a random entry, formats it into a
//! bounded post with a link back to the entry, and publishes it. The last
//! post can be cached and served over HTTP.

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod format;
pub mod http;
pub mod logging;
pub mod platforms;
pub mod runner;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use config::{Config, Credentials, RunMode};
pub use error::{Result, ZpcastError};
pub use runner::{RunReport, Runner};
pub use types::{DictionaryEntry, FormattedPost, WordId};
