//! Shared fixtures for libzpcast integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

pub const API_KEY: &str = "test-api-key";
pub const DICTIONARY_ID: &str = "633";

/// A complete word object as the dictionary service returns it
pub fn word_json(number: i64, name: &str) -> Value {
    json!({
        "id": format!("6650a1b2c3d4e5f6a7b8c9{:02}", number % 100),
        "number": number,
        "name": name,
        "pronunciation": "fɛl",
        "equivalents": [{
            "titles": ["en"],
            "names": ["stone"],
            "nameString": "stone",
            "ignoredPattern": "",
            "hidden": false
        }],
        "tags": ["noun"],
        "informations": [],
        "phrases": [],
        "variations": [],
        "relations": [],
        "examples": [],
        "createdDate": "2024-01-01T00:00:00.000Z"
    })
}

/// Body of a word search response
pub fn words_body(words: Vec<Value>, total: i64) -> Value {
    json!({ "words": words, "total": total })
}

/// Body of a successful createSession response
pub fn session_body() -> Value {
    json!({
        "accessJwt": "access-token",
        "refreshJwt": "refresh-token",
        "did": "did:plc:testbot",
        "handle": "bot.bsky.social",
        "active": true
    })
}
