//! Content validation engine
//!
//! Heuristic grammar, readability and structure checks. Every check that
//! runs records its outcome in the article's `validations` section.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use walkdir::WalkDir;

use crate::metadata::{MetaMap, MetadataStore, block};
use crate::settings::{SharedSettings, StructureConfig};
use crate::types::{IqPilotError, Result};

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("Invalid regex"));
static MARKDOWN_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*`\[\]()]").expect("Invalid regex"));
static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("Invalid regex"));
static VOWEL_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[aeiouy]+").expect("Invalid regex"));
static ITS_MISUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bit's\s+(own|your|their)\b").expect("Invalid regex"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,6})\s+(.+)$").expect("Invalid regex"));
static INTRO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^##\s+(Introduction|Overview)").expect("Invalid regex"));
static TECHNICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(function|class|method|API|library|framework)\b").expect("Invalid regex")
});
static IMAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[.*\]\(.*\)").expect("Invalid regex"));
static EXAMPLES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)##\s+(Example|Demo|Walkthrough|Tutorial)").expect("Invalid regex")
});
static PREREQ_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)##\s+(Prerequisites|Requirements|Before)").expect("Invalid regex")
});
static FRONT_MATTER_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^---\s*\r?\ntitle:\s*["']?(.+?)["']?\s*\r?\n"#).expect("Invalid regex")
});
static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("Invalid regex"));

/// Articles longer than this without images are flagged
const LONG_ARTICLE_CHARS: usize = 2000;
/// Minimum keyword overlap for a related article
const RELATED_THRESHOLD: f64 = 0.3;
const RELATED_LIMIT: usize = 5;

/// Outcome of one validation check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub validation_type: String,
    pub passed: bool,
    /// Disabled in configuration; nothing was recorded
    pub skipped: bool,
    pub issues_found: usize,
    pub issues: Vec<String>,
    pub metrics: Map<String, Value>,
}

impl ValidationReport {
    fn new(validation_type: &str, issues: Vec<String>, metrics: Map<String, Value>) -> Self {
        Self {
            validation_type: validation_type.to_string(),
            passed: issues.is_empty(),
            skipped: false,
            issues_found: issues.len(),
            issues,
            metrics,
        }
    }

    fn skipped(validation_type: &str) -> Self {
        Self {
            validation_type: validation_type.to_string(),
            passed: true,
            skipped: true,
            issues_found: 0,
            issues: Vec::new(),
            metrics: Map::new(),
        }
    }
}

/// Content gaps found in an article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapAnalysis {
    pub gaps: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Article similar to the one being analyzed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedArticle {
    pub file_path: PathBuf,
    pub title: String,
    pub similarity: f64,
}

/// Readability metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readability {
    pub flesch_score: f64,
    pub grade_level: i64,
}

/// Runs content checks and records their outcome
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    store: Arc<MetadataStore>,
    settings: SharedSettings,
}

impl ValidationEngine {
    pub fn new(store: Arc<MetadataStore>, settings: SharedSettings) -> Self {
        Self { store, settings }
    }

    /// Grammar heuristics
    #[tracing::instrument(name = "validate_grammar", skip(self, content), fields(path = %path.display()))]
    pub async fn validate_grammar(&self, path: &Path, content: &str) -> Result<ValidationReport> {
        if !self.settings.read().await.config().validation.grammar.enabled {
            return Ok(ValidationReport::skipped("grammar"));
        }

        let issues = grammar_issues(&article_body(content));
        let report = ValidationReport::new("grammar", issues, Map::new());

        self.record(
            path,
            &report,
            MetaMap::new()
                .with("issues_found", report.issues_found)
                .with("model", "basic-regex"),
        )
        .await?;
        Ok(report)
    }

    /// Flesch reading ease and Flesch-Kincaid grade
    #[tracing::instrument(name = "validate_readability", skip(self, content), fields(path = %path.display()))]
    pub async fn validate_readability(&self, path: &Path, content: &str) -> Result<ValidationReport> {
        let config = self.settings.read().await.config().validation.readability.clone();
        if !config.enabled {
            return Ok(ValidationReport::skipped("readability"));
        }

        let metrics = readability(&article_body(content));
        let mut issues = Vec::new();
        if metrics.flesch_score < config.flesch_score_min {
            issues.push(format!(
                "Flesch reading ease {} is below the minimum of {}",
                metrics.flesch_score, config.flesch_score_min
            ));
        }
        if metrics.grade_level as f64 > config.target_grade_level {
            issues.push(format!(
                "Grade level {} is above the target of {}",
                metrics.grade_level, config.target_grade_level
            ));
        }

        let mut values = Map::new();
        values.insert("flesch_score".into(), json!(metrics.flesch_score));
        values.insert("grade_level".into(), json!(metrics.grade_level));
        values.insert("target_flesch_min".into(), json!(config.flesch_score_min));
        values.insert("target_grade_max".into(), json!(config.target_grade_level));
        let report = ValidationReport::new("readability", issues, values);

        self.record(
            path,
            &report,
            MetaMap::new()
                .with("flesch_score", metrics.flesch_score)
                .with("grade_level", metrics.grade_level),
        )
        .await?;
        Ok(report)
    }

    /// Section and heading checks
    #[tracing::instrument(name = "validate_structure", skip(self, content), fields(path = %path.display()))]
    pub async fn validate_structure(&self, path: &Path, content: &str) -> Result<ValidationReport> {
        let config = self.settings.read().await.config().validation.structure.clone();
        if !config.enabled {
            return Ok(ValidationReport::skipped("structure"));
        }

        let check = structure_check(&article_body(content), &config);
        let mut metrics = Map::new();
        metrics.insert("has_toc".into(), json!(check.has_toc));
        metrics.insert("has_references".into(), json!(check.has_references));
        metrics.insert("has_intro".into(), json!(check.has_intro));
        metrics.insert("heading_count".into(), json!(check.heading_count));
        let report = ValidationReport::new("structure", check.issues, metrics);

        self.record(
            path,
            &report,
            MetaMap::new()
                .with("has_toc", check.has_toc)
                .with("has_references", check.has_references)
                .with("has_intro", check.has_intro),
        )
        .await?;
        Ok(report)
    }

    /// Run every check against the current file content
    pub async fn validate_all(&self, path: &Path) -> Result<Vec<ValidationReport>> {
        let content = read_content(path).await?;
        Ok(vec![
            self.validate_grammar(path, &content).await?,
            self.validate_readability(path, &content).await?,
            self.validate_structure(path, &content).await?,
        ])
    }

    /// Find articles sharing heading keywords
    ///
    /// Scans `repository`, or the workspace root when not given.
    #[tracing::instrument(name = "find_related", skip(self, content), fields(path = %path.display()))]
    pub async fn find_related(
        &self,
        path: &Path,
        content: &str,
        repository: Option<PathBuf>,
    ) -> Result<Vec<RelatedArticle>> {
        let root = match repository {
            Some(root) => root,
            None => self.settings.read().await.workspace_root().to_path_buf(),
        };
        let keywords = extract_keywords(&article_body(content));
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || scan_related(&root, &path, &keywords))
            .await
            .map_err(|e| IqPilotError::internal(format!("related article scan failed: {}", e)))
    }

    async fn record(&self, path: &Path, report: &ValidationReport, details: MetaMap) -> Result<()> {
        tracing::info!(
            validation = %report.validation_type,
            passed = report.passed,
            issues = report.issues_found,
            "Validation finished"
        );
        self.store
            .update_validation_result(path, &report.validation_type, report.passed, details)
            .await
    }
}

/// Read an article, mapping a missing file to `ArticleNotFound`
pub async fn read_content(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IqPilotError::article_not_found(path)
        } else {
            IqPilotError::Io(e)
        }
    })
}

/// Article text without its metadata block
pub fn article_body(content: &str) -> String {
    match block::find_block(content) {
        Some(found) => format!("{}{}", &content[..found.span.start], &content[found.span.end..]),
        None => content.to_string(),
    }
}

/// Grammar issues found by pattern matching
pub fn grammar_issues(content: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if ITS_MISUSE_RE.is_match(content) {
        issues.push("Potential incorrect use of 'it's' (possessive should be 'its')".to_string());
    }

    let repeated = repeated_words(content);
    if repeated > 0 {
        issues.push(format!("Found {} repeated word(s)", repeated));
    }

    issues
}

/// Count immediately repeated words, case-insensitive
fn repeated_words(content: &str) -> usize {
    let mut count = 0;
    for line in content.lines() {
        let words: Vec<String> = line
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        count += words
            .windows(2)
            .filter(|pair| pair[0] == pair[1] && pair[0].chars().all(char::is_alphanumeric))
            .count();
    }
    count
}

/// Compute readability scores for prose
pub fn readability(content: &str) -> Readability {
    let text = CODE_FENCE_RE.replace_all(content, "");
    let text = MARKDOWN_PUNCT_RE.replace_all(&text, "");

    let sentences = SENTENCE_END_RE
        .split(&text)
        .filter(|s| !s.trim().is_empty())
        .count();
    let words: Vec<&str> = text.split_whitespace().collect();

    if sentences == 0 || words.is_empty() {
        return Readability {
            flesch_score: 0.0,
            grade_level: 0,
        };
    }

    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;

    let flesch = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    let grade = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;

    Readability {
        flesch_score: (flesch * 10.0).round() / 10.0,
        grade_level: grade.round() as i64,
    }
}

/// Vowel groups in a word, at least one
fn count_syllables(word: &str) -> usize {
    VOWEL_GROUP_RE.find_iter(&word.to_lowercase()).count().max(1)
}

/// Result of the structure heuristics
#[derive(Debug, Clone, PartialEq)]
pub struct StructureCheck {
    pub has_toc: bool,
    pub has_references: bool,
    pub has_intro: bool,
    pub heading_count: usize,
    pub issues: Vec<String>,
}

pub fn structure_check(content: &str, config: &StructureConfig) -> StructureCheck {
    let prose = CODE_FENCE_RE.replace_all(content, "");
    let lower = prose.to_lowercase();
    let mut issues = Vec::new();

    let has_toc = lower.contains("## table of contents") || lower.contains("## contents");
    if config.require_toc && !has_toc {
        issues.push("Missing Table of Contents".to_string());
    }

    let has_references = lower.contains("## references") || lower.contains("## sources");
    if config.require_references && !has_references {
        issues.push("Missing References section".to_string());
    }

    let levels: Vec<usize> = HEADING_RE
        .captures_iter(&prose)
        .filter_map(|c| c.get(1).map(|m| m.as_str().len()))
        .collect();
    if let Some(pair) = levels.windows(2).find(|pair| pair[1] > pair[0] + 1) {
        issues.push(format!(
            "Heading hierarchy skip detected (h{} to h{})",
            pair[0], pair[1]
        ));
    }

    let has_intro = INTRO_RE.is_match(&prose);
    if !has_intro {
        issues.push("Missing Introduction/Overview section".to_string());
    }

    StructureCheck {
        has_toc,
        has_references,
        has_intro,
        heading_count: levels.len(),
        issues,
    }
}

/// Content gaps
pub fn analyze_gaps(content: &str) -> GapAnalysis {
    let content = article_body(content);
    let mut gaps = Vec::new();

    if TECHNICAL_RE.is_match(&content) && !content.contains("```") {
        gaps.push("Technical content without code examples".to_string());
    }
    if content.len() > LONG_ARTICLE_CHARS && !IMAGE_RE.is_match(&content) {
        gaps.push("Long article without images or diagrams".to_string());
    }
    if !EXAMPLES_RE.is_match(&content) {
        gaps.push("Missing practical examples section".to_string());
    }
    if !PREREQ_RE.is_match(&content) {
        gaps.push("Missing prerequisites section".to_string());
    }

    GapAnalysis {
        gaps,
        suggestions: vec![
            "Consider adding visual diagrams for complex concepts".to_string(),
            "Include practical code examples".to_string(),
            "Add troubleshooting section for common issues".to_string(),
        ],
    }
}

/// Lowercased heading words longer than four characters
pub fn extract_keywords(content: &str) -> Vec<String> {
    let keywords: BTreeSet<String> = HEADING_RE
        .captures_iter(content)
        .filter_map(|c| c.get(2))
        .flat_map(|m| m.as_str().split_whitespace())
        .filter(|w| w.chars().count() > 4)
        .map(str::to_lowercase)
        .collect();
    keywords.into_iter().collect()
}

/// Share of keywords present in `content`
pub fn similarity(keywords: &[String], content: &str) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let lower = content.to_lowercase();
    let matches = keywords.iter().filter(|k| lower.contains(k.as_str())).count();
    matches as f64 / keywords.len() as f64
}

/// Front-matter title, first H1, or "Untitled"
pub fn extract_title(content: &str) -> String {
    FRONT_MATTER_TITLE_RE
        .captures(content)
        .or_else(|| H1_RE.captures(content))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

fn scan_related(root: &Path, exclude: &Path, keywords: &[String]) -> Vec<RelatedArticle> {
    let skip: HashSet<&str> = ["node_modules", ".git"].into_iter().collect();
    let exclude = std::fs::canonicalize(exclude).unwrap_or_else(|_| exclude.to_path_buf());

    let mut related: Vec<RelatedArticle> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !e.file_name().to_str().is_some_and(|n| skip.contains(n)))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable path");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .filter(|e| {
            std::fs::canonicalize(e.path()).unwrap_or_else(|_| e.path().to_path_buf()) != exclude
        })
        .filter_map(|e| match std::fs::read_to_string(e.path()) {
            Ok(content) => Some((e.into_path(), content)),
            Err(err) => {
                tracing::warn!(path = %e.path().display(), error = %err, "Error processing article");
                None
            }
        })
        .filter_map(|(path, content)| {
            let score = similarity(keywords, &content);
            (score > RELATED_THRESHOLD).then(|| RelatedArticle {
                file_path: path,
                title: extract_title(&content),
                similarity: score,
            })
        })
        .collect();

    related.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    related.truncate(RELATED_LIMIT);
    related
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetaValue;
    use crate::settings::{IqPilotConfig, SettingsManager};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    fn engine(root: &Path, config: IqPilotConfig) -> (ValidationEngine, Arc<MetadataStore>) {
        let settings = Arc::new(RwLock::new(SettingsManager::from_config(root, config)));
        let store = Arc::new(MetadataStore::new());
        (ValidationEngine::new(Arc::clone(&store), settings), store)
    }

    #[test]
    fn test_grammar_issues() {
        assert!(grammar_issues("The cat sat on its mat.").is_empty());

        let issues = grammar_issues("The team did it's own thing.");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("it's"));

        let issues = grammar_issues("Read the the docs. Then then stop.");
        assert_eq!(issues, vec!["Found 2 repeated word(s)".to_string()]);
    }

    #[test]
    fn test_syllables() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("banana"), 3);
        assert_eq!(count_syllables("queue"), 1);
        assert_eq!(count_syllables("123"), 1);
    }

    #[test]
    fn test_readability() {
        // 6 words, 2 sentences, 6 syllables
        let r = readability("The cat sat. The dog ran.");
        let expected: f64 = 206.835 - 1.015 * 3.0 - 84.6 * 1.0;
        assert_eq!(r.flesch_score, (expected * 10.0).round() / 10.0);
        assert_eq!(r.grade_level, (0.39_f64 * 3.0 + 11.8 - 15.59).round() as i64);

        let empty = readability("```\ncode only\n```");
        assert_eq!(empty.flesch_score, 0.0);
        assert_eq!(empty.grade_level, 0);
    }

    #[test]
    fn test_structure_check() {
        let config = StructureConfig::default();
        let content = "# Title\n\n## Table of Contents\n\n## Introduction\n\ntext\n\n#### Deep\n\n## References\n";
        let check = structure_check(content, &config);
        assert!(check.has_toc);
        assert!(check.has_references);
        assert!(check.has_intro);
        assert_eq!(check.heading_count, 5);
        assert_eq!(
            check.issues,
            vec!["Heading hierarchy skip detected (h2 to h4)".to_string()]
        );

        let relaxed = StructureConfig {
            enabled: true,
            require_toc: false,
            require_references: false,
        };
        let check = structure_check("# T\n\n## Overview\n\n```\n#### not a heading\n```\n", &relaxed);
        assert!(check.issues.is_empty(), "{:?}", check.issues);
    }

    #[test]
    fn test_analyze_gaps() {
        let analysis = analyze_gaps("# API guide\n\nCall the function.\n");
        assert_eq!(
            analysis.gaps,
            vec![
                "Technical content without code examples".to_string(),
                "Missing practical examples section".to_string(),
                "Missing prerequisites section".to_string(),
            ]
        );

        let analysis = analyze_gaps(
            "# Guide\n\n## Prerequisites\n\n## Example\n\n```rust\nfn main() {}\n```\n",
        );
        assert!(analysis.gaps.is_empty());
        assert_eq!(analysis.suggestions.len(), 3);
    }

    #[test]
    fn test_keywords_and_title() {
        let keywords = extract_keywords("# Deploying Services\n\n## Rolling updates\n\n## Tips\n");
        assert_eq!(keywords, vec!["deploying", "rolling", "services", "updates"]);

        assert_eq!(extract_title("---\ntitle: \"Front Matter\"\n---\n# H1"), "Front Matter");
        assert_eq!(extract_title("intro\n# Heading One\n"), "Heading One");
        assert_eq!(extract_title("no headings"), "Untitled");
        assert_eq!(similarity(&keywords, "Rolling SERVICES"), 0.5);
    }

    #[test]
    fn test_article_body_strips_metadata() {
        let content = "# T\n\nthe the\n\n<!-- \n---\nkey: value value\n---\n-->\n";
        let body = article_body(content);
        assert!(!body.contains("key:"));
        assert!(body.contains("the the"));
    }

    #[tokio::test]
    async fn test_validation_recorded_in_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        let content = "# A\n\nIt's own fault.\n";
        std::fs::write(&path, content).unwrap();
        let (engine, store) = engine(dir.path(), IqPilotConfig::default());

        let report = engine.validate_grammar(&path, content).await.unwrap();
        assert!(!report.passed);
        assert_eq!(report.issues_found, 1);

        let doc = store.get_metadata(&path).await.unwrap();
        assert_eq!(doc.validation_status("grammar"), Some("failed"));
        let grammar = doc.validations().and_then(|v| v.mapping("grammar")).unwrap();
        assert_eq!(grammar.get("model"), Some(&MetaValue::from("basic-regex")));
        assert_eq!(grammar.get("issues_found").and_then(MetaValue::as_i64), Some(1));
    }

    #[tokio::test]
    async fn test_disabled_check_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.md");
        std::fs::write(&path, "# S\n").unwrap();
        let mut config = IqPilotConfig::default();
        config.validation.structure.enabled = false;
        let (engine, store) = engine(dir.path(), config);

        let report = engine.validate_structure(&path, "# S\n").await.unwrap();
        assert!(report.skipped);
        assert!(store.get_metadata(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validate_all() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all.md");
        std::fs::write(&path, "# All\n\n## Overview\n\nShort text. Easy words.\n").unwrap();
        let (engine, store) = engine(dir.path(), IqPilotConfig::default());

        let reports = engine.validate_all(&path).await.unwrap();
        let types: Vec<_> = reports.iter().map(|r| r.validation_type.as_str()).collect();
        assert_eq!(types, vec!["grammar", "readability", "structure"]);

        let doc = store.get_metadata(&path).await.unwrap();
        assert_eq!(doc.validation_status("grammar"), Some("passed"));
        assert_eq!(doc.validation_status("structure"), Some("failed"));
        assert!(doc.validation_status("readability").is_some());

        let missing = engine.validate_all(&dir.path().join("nope.md")).await;
        assert!(matches!(missing, Err(IqPilotError::ArticleNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_related() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("guides")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();

        let source = "# Kubernetes Deployment\n\n## Scaling Workloads\n";
        let path = root.join("source.md");
        std::fs::write(&path, source).unwrap();
        std::fs::write(
            root.join("guides/close.md"),
            "---\ntitle: Close Match\n---\nkubernetes deployment scaling workloads\n",
        )
        .unwrap();
        std::fs::write(root.join("guides/partial.md"), "# Partial\n\nkubernetes scaling\n").unwrap();
        std::fs::write(root.join("guides/far.md"), "# Far\n\nkubernetes only\n").unwrap();
        std::fs::write(
            root.join("node_modules/pkg/readme.md"),
            "kubernetes deployment scaling workloads",
        )
        .unwrap();

        let (engine, _store) = engine(root, IqPilotConfig::default());
        let related = engine.find_related(&path, source, None).await.unwrap();

        let titles: Vec<_> = related.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Close Match", "Partial"]);
        assert_eq!(related[0].similarity, 1.0);
        assert_eq!(related[1].similarity, 0.5);
    }
}
