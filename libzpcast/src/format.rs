//! Rendering of a dictionary entry into post text
//!
//! Formatting is pure: the same entry and link settings always produce the
//! same [`FormattedPost`], with no clock or network involved.

use crate::types::{DictionaryEntry, FormattedPost, Information};

/// Hard cap on the length of the rendered text, in characters
pub const MAX_POST_CHARS: usize = 500;

/// Number of characters kept when the text has to be cut
pub const TRUNCATE_AT_CHARS: usize = 490;

/// Appended after a cut
pub const ELLIPSIS: &str = "……";

/// Information title rendered as the explanation section
pub const EXPLANATION_TITLE: &str = "説明";

/// Information title rendered as the etymology section
pub const ETYMOLOGY_TITLE: &str = "語源";

/// Where links in a post point to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Public site root, e.g. `https://zpdic.ziphil.com`
    pub base: String,
    pub dictionary_id: String,
}

impl LinkTarget {
    pub fn new(base: impl Into<String>, dictionary_id: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            dictionary_id: dictionary_id.into(),
        }
    }

    /// Exact-number lookup page for an entry
    pub fn entry_url(&self, number: i64) -> String {
        format!(
            "{}/dictionary/{}?kind=exact&number={}",
            self.base.trim_end_matches('/'),
            self.dictionary_id,
            number
        )
    }
}

/// Render an entry into a post
pub fn format_entry(entry: &DictionaryEntry, target: &LinkTarget) -> FormattedPost {
    let pronunciation = format_pronunciation(&entry.pronunciation);
    let meaning = format_meaning(entry);
    let description = format_information(&entry.informations, EXPLANATION_TITLE);
    let etymology = format_information(&entry.informations, ETYMOLOGY_TITLE);
    let tags = format_tags(&entry.tags);

    let composed = format!(
        "{} {}  {}\n\n{}\n\n{}\n\n{}",
        entry.name, pronunciation, tags, meaning, description, etymology
    );

    FormattedPost {
        entry: entry.name.clone(),
        link: target.entry_url(entry.number),
        formatted_str: truncate(&tidy(&composed)),
    }
}

/// Wrap in slashes unless the dictionary already delimits it
fn format_pronunciation(pronunciation: &str) -> String {
    if pronunciation.contains('/') {
        pronunciation.to_string()
    } else {
        format!("/{}/", pronunciation)
    }
}

fn format_meaning(entry: &DictionaryEntry) -> String {
    entry
        .equivalents
        .iter()
        .enumerate()
        .map(|(i, eq)| {
            let titles: String = eq.titles.iter().map(|t| format!("【{}】", t)).collect();
            format!("{}. {} {}", i + 1, titles, eq.names.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header line plus cleaned text, or empty when absent
fn format_information(informations: &[Information], title: &str) -> String {
    match informations.iter().find(|info| info.title == title) {
        Some(info) if !info.text.is_empty() => {
            let text: String = info.text.chars().filter(|c| !matches!(c, '_' | '\\')).collect();
            format!("〜{}〜\n{}", info.title, text)
        }
        _ => String::new(),
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("[{}]", t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse runs of three or more newlines into one blank line, then trim
fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;

    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }

    out.trim_end_matches('\n').trim().to_string()
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_POST_CHARS {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(TRUNCATE_AT_CHARS).collect();
    cut.push_str(ELLIPSIS);
    cut
}
