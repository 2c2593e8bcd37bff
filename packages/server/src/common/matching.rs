//! Bag-of-words keyword matcher.
//!
//! Scores entries (contacts, sessions) against free text by token overlap.
//! For each distinct query token:
//! - +3 when it is one of the entry's keywords
//! - +1 when it shares a prefix (≥ 4 chars) with a keyword but is not an exact hit
//! - +2 when it appears in the entry's name
//! - +1 when it appears in the entry's description

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"[a-z0-9]+").expect("token regex is valid");
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "can", "do", "for", "from", "have", "how", "i", "in",
    "is", "it", "me", "my", "near", "of", "on", "or", "our", "the", "there", "to", "we",
    "what", "where", "who", "with", "you",
];

const PREFIX_MIN_LEN: usize = 4;

/// Lowercase, split on non-alphanumerics, drop stopwords and 1-char tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| t.len() >= 2 && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Something the matcher can score
pub trait Matchable {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn keywords(&self) -> &[String];
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredMatch<T> {
    #[serde(flatten)]
    pub entry: T,
    pub score: u32,
}

struct Indexed {
    keywords: HashSet<String>,
    name: HashSet<String>,
    description: HashSet<String>,
}

/// Pre-tokenized index over a fixed set of entries
pub struct KeywordMatcher<T> {
    entries: Vec<T>,
    index: Vec<Indexed>,
}

impl<T: Matchable + Clone> KeywordMatcher<T> {
    pub fn new(entries: Vec<T>) -> Self {
        let index = entries
            .iter()
            .map(|e| Indexed {
                keywords: e.keywords().iter().flat_map(|k| tokenize(k)).collect(),
                name: tokenize(e.name()).into_iter().collect(),
                description: tokenize(e.description()).into_iter().collect(),
            })
            .collect();

        Self { entries, index }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Best matches first; ties broken by name. An empty (or all-stopword)
    /// query returns entries in their original order with score 0.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredMatch<T>> {
        let mut seen = HashSet::new();
        let tokens: Vec<String> = tokenize(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();

        if tokens.is_empty() {
            return self
                .entries
                .iter()
                .take(limit)
                .cloned()
                .map(|entry| ScoredMatch { entry, score: 0 })
                .collect();
        }

        let mut scored: Vec<ScoredMatch<T>> = self
            .entries
            .iter()
            .zip(&self.index)
            .filter_map(|(entry, idx)| {
                let score: u32 = tokens.iter().map(|t| score_token(t, idx)).sum();
                (score > 0).then(|| ScoredMatch {
                    entry: entry.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.entry.name().cmp(b.entry.name()))
        });
        scored.truncate(limit);
        scored
    }
}

fn score_token(token: &str, idx: &Indexed) -> u32 {
    let mut score = 0;

    if idx.keywords.contains(token) {
        score += 3;
    } else if token.len() >= PREFIX_MIN_LEN
        && idx.keywords.iter().any(|k| {
            k.len() >= PREFIX_MIN_LEN && (k.starts_with(token) || token.starts_with(k.as_str()))
        })
    {
        score += 1;
    }

    if idx.name.contains(token) {
        score += 2;
    }
    if idx.description.contains(token) {
        score += 1;
    }

    score
}
