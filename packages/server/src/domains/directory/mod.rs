//! Directory domain - the static emergency contact and session list, and
//! keyword search over it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::common::{KeywordMatcher, Matchable, ScoredMatch};

const EMBEDDED_DIRECTORY: &str = include_str!("../../../data/emergency_directory.json");

pub const DEFAULT_SEARCH_LIMIT: i64 = 5;
pub const MAX_SEARCH_LIMIT: i64 = 50;

/// An emergency phone line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub category: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A preparedness session (briefing, training)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Matchable for Contact {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Matchable for Session {
    fn name(&self) -> &str {
        &self.title
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

#[derive(Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    sessions: Vec<Session>,
}

pub struct Directory {
    contacts: KeywordMatcher<Contact>,
    sessions: KeywordMatcher<Session>,
}

impl Directory {
    /// Directory compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_DIRECTORY).context("embedded emergency directory is invalid")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: DirectoryFile = serde_json::from_str(raw)?;
        Ok(Self {
            contacts: KeywordMatcher::new(file.contacts),
            sessions: KeywordMatcher::new(file.sessions),
        })
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn search_contacts(&self, query: &str, limit: usize) -> Vec<ScoredMatch<Contact>> {
        self.contacts.search(query, limit)
    }

    pub fn search_sessions(&self, query: &str, limit: usize) -> Vec<ScoredMatch<Session>> {
        self.sessions.search(query, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_directory_loads() {
        let directory = Directory::embedded().unwrap();
        assert!(directory.contact_count() > 0);
        assert!(directory.session_count() > 0);
    }

    #[test]
    fn test_flood_query_prefers_flood_contact() {
        let directory = Directory::embedded().unwrap();
        let results = directory.search_contacts("the river is flooding our street", 3);

        assert!(!results.is_empty());
        assert_eq!(results[0].entry.name, "Flood Control Hotline");
    }

    #[test]
    fn test_sessions_match_on_title() {
        let directory = Directory::embedded().unwrap();
        let results = directory.search_sessions("earthquake", 5);

        assert_eq!(results[0].entry.id, "earthquake-safety");
        assert!(results.iter().all(|r| r.score > 0));
    }

    #[test]
    fn test_empty_query_lists_in_file_order() {
        let directory = Directory::embedded().unwrap();
        let results = directory.search_contacts("", 2);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry.name, "Emergency Services");
        assert_eq!(results[0].score, 0);
    }

    #[test]
    fn test_from_json_tolerates_missing_sections() {
        let directory = Directory::from_json(r#"{"contacts": []}"#).unwrap();
        assert_eq!(directory.contact_count(), 0);
        assert_eq!(directory.session_count(), 0);
        assert!(Directory::from_json("not json").is_err());
    }
}
