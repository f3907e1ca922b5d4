//! Metadata document model

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::value::{MetaMap, MetaValue};

/// Section holding per-check validation outcomes
pub const VALIDATIONS: &str = "validations";
/// Section describing the article file itself
pub const ARTICLE_METADATA: &str = "article_metadata";
/// Section linking related content
pub const CROSS_REFERENCES: &str = "cross_references";

/// Validation types tracked under `validations`
pub const VALIDATION_TYPES: [&str; 3] = ["grammar", "readability", "structure"];

/// Status written for checks that have never run
pub const STATUS_NOT_VALIDATED: &str = "not_validated";

/// Current UTC time in the metadata timestamp format
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parsed contents of one article's metadata block
///
/// An ordered mapping from section name to value. Sections this crate does
/// not know about are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument {
    sections: MetaMap,
}

impl MetadataDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full default document for a new article
    pub fn initial(filename: &str, title: &str, author: &str) -> Self {
        let now = timestamp_now();

        let validation = |extra: MetaMap| {
            let mut section = MetaMap::new()
                .with("last_validated", MetaValue::Null)
                .with("status", STATUS_NOT_VALIDATED);
            for (k, v) in extra {
                section.insert(k, v);
            }
            MetaValue::Mapping(section)
        };

        let validations = MetaMap::new()
            .with(
                "grammar",
                validation(MetaMap::new().with("model", "").with("issues_found", 0)),
            )
            .with(
                "readability",
                validation(
                    MetaMap::new()
                        .with("flesch_score", 0)
                        .with("grade_level", 0),
                ),
            )
            .with(
                "structure",
                validation(
                    MetaMap::new()
                        .with("has_toc", false)
                        .with("has_references", false),
                ),
            );

        let article = MetaMap::new()
            .with("filename", filename)
            .with("title", title)
            .with("author", author)
            .with("created_date", now.clone())
            .with("last_updated", now)
            .with("word_count", 0)
            .with("estimated_reading_time", "0 min");

        let cross_references = MetaMap::new()
            .with("related_articles", Vec::<MetaValue>::new())
            .with("topics", Vec::<MetaValue>::new());

        Self {
            sections: MetaMap::new()
                .with(VALIDATIONS, validations)
                .with(ARTICLE_METADATA, article)
                .with(CROSS_REFERENCES, cross_references),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Top-level section value
    pub fn get(&self, section: &str) -> Option<&MetaValue> {
        self.sections.get(section)
    }

    /// Top-level section as a mapping, if it is one
    pub fn section(&self, section: &str) -> Option<&MetaMap> {
        self.sections.mapping(section)
    }

    pub fn section_mut(&mut self, section: &str) -> Option<&mut MetaMap> {
        self.sections.mapping_mut(section)
    }

    /// Replace a whole section
    pub fn set(&mut self, section: impl Into<String>, value: impl Into<MetaValue>) {
        self.sections.insert(section, value);
    }

    /// Section names in document order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys()
    }

    /// Shallow merge: each key in `updates` replaces its section wholesale
    pub fn merge(&mut self, updates: MetaMap) {
        for (key, value) in updates {
            self.sections.insert(key, value);
        }
    }

    /// Stamp `article_metadata.last_updated` when that section is a mapping
    pub fn stamp_last_updated(&mut self, timestamp: &str) -> bool {
        match self.sections.mapping_mut(ARTICLE_METADATA) {
            Some(article) => {
                article.insert("last_updated", timestamp);
                true
            }
            None => false,
        }
    }

    /// `article_metadata` section
    pub fn article_metadata(&self) -> Option<&MetaMap> {
        self.section(ARTICLE_METADATA)
    }

    /// `validations` section
    pub fn validations(&self) -> Option<&MetaMap> {
        self.section(VALIDATIONS)
    }

    /// `cross_references` section
    pub fn cross_references(&self) -> Option<&MetaMap> {
        self.section(CROSS_REFERENCES)
    }

    /// Shorthand for `article_metadata.filename`
    pub fn filename(&self) -> Option<&str> {
        self.article_metadata()
            .and_then(|a| a.get("filename"))
            .and_then(MetaValue::as_str)
    }

    /// Status of one validation type
    pub fn validation_status(&self, validation_type: &str) -> Option<&str> {
        self.validations()
            .and_then(|v| v.mapping(validation_type))
            .and_then(|v| v.get("status"))
            .and_then(MetaValue::as_str)
    }

    /// Borrow the underlying mapping
    pub fn as_map(&self) -> &MetaMap {
        &self.sections
    }

    pub fn into_map(self) -> MetaMap {
        self.sections
    }

    /// JSON view for tool results
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(&self.sections)
    }
}

impl From<MetaMap> for MetadataDocument {
    fn from(sections: MetaMap) -> Self {
        Self { sections }
    }
}
