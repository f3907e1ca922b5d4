//! Settings manager implementation
//!
//! Loads `.iqpilot/config.json` from the workspace root and merges it over the
//! compiled-in defaults one section at a time.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::types::{IqPilotError, Result};

/// Settings directory under the workspace root
pub const CONFIG_DIR: &str = ".iqpilot";
/// Settings file name
pub const CONFIG_FILE: &str = "config.json";

/// IQPilot configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IqPilotConfig {
    pub site: SiteConfig,
    pub validation: ValidationConfig,
    pub workflows: WorkflowsConfig,
    pub file_patterns: FilePatternsConfig,
    pub templates: TemplatesConfig,
}

/// Site description, used as template defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub site_type: String,
    pub author: Option<String>,
    pub repository: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Documentation Site".to_string(),
            site_type: "documentation".to_string(),
            author: None,
            repository: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    pub grammar: GrammarConfig,
    pub readability: ReadabilityConfig,
    pub structure: StructureConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrammarConfig {
    pub enabled: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadabilityConfig {
    pub enabled: bool,
    pub target_grade_level: f64,
    pub flesch_score_min: f64,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_grade_level: 10.0,
            flesch_score_min: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructureConfig {
    pub enabled: bool,
    pub require_toc: bool,
    pub require_references: bool,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_toc: true,
            require_references: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowsConfig {
    /// Rewrite `article_metadata.filename` when an article is renamed
    pub auto_sync_metadata: bool,
    pub auto_validate_on_save: bool,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            auto_sync_metadata: true,
            auto_validate_on_save: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilePatternsConfig {
    /// Glob selecting article files, relative to the workspace root
    pub articles: String,
    /// Globs excluded from watching
    pub exclude: Vec<String>,
}

impl Default for FilePatternsConfig {
    fn default() -> Self {
        Self {
            articles: "**/*.md".to_string(),
            exclude: vec![
                "README.md".to_string(),
                "node_modules/**".to_string(),
                "_site/**".to_string(),
                ".git/**".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplatesConfig {
    /// Site template directory, relative to the workspace root
    pub directory: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: ".github/templates".to_string(),
        }
    }
}

/// Shape of the config file: every section optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigOverrides {
    site: Option<SiteConfig>,
    validation: Option<ValidationConfig>,
    workflows: Option<WorkflowsConfig>,
    file_patterns: Option<FilePatternsConfig>,
    templates: Option<TemplatesConfig>,
}

impl IqPilotConfig {
    /// Merge file overrides over this config
    ///
    /// A section present in the file replaces the whole section; fields
    /// missing inside it take their defaults.
    fn merge(&mut self, overrides: ConfigOverrides) {
        if let Some(site) = overrides.site {
            self.site = site;
        }
        if let Some(validation) = overrides.validation {
            self.validation = validation;
        }
        if let Some(workflows) = overrides.workflows {
            self.workflows = workflows;
        }
        if let Some(file_patterns) = overrides.file_patterns {
            self.file_patterns = file_patterns;
        }
        if let Some(templates) = overrides.templates {
            self.templates = templates;
        }
    }
}

/// Include/exclude matcher for article paths
#[derive(Debug, Clone)]
pub struct ArticleMatcher {
    include: GlobSet,
    exclude: GlobSet,
}

impl ArticleMatcher {
    /// Build a matcher from configured patterns
    pub fn new(patterns: &FilePatternsConfig) -> Result<Self> {
        let mut include = GlobSetBuilder::new();
        include.add(compile_glob(&patterns.articles)?);

        let mut exclude = GlobSetBuilder::new();
        for pattern in &patterns.exclude {
            exclude.add(compile_glob(pattern)?);
        }

        Ok(Self {
            include: include
                .build()
                .map_err(|e| IqPilotError::config_error(e.to_string()))?,
            exclude: exclude
                .build()
                .map_err(|e| IqPilotError::config_error(e.to_string()))?,
        })
    }

    /// Check a path relative to the workspace root
    pub fn is_match(&self, relative: &Path) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| IqPilotError::config_error(format!("invalid glob '{}': {}", pattern, e)))
}

/// Settings manager for loading and accessing settings
#[derive(Debug)]
pub struct SettingsManager {
    /// The merged settings
    config: IqPilotConfig,
    /// Compiled file patterns
    matcher: ArticleMatcher,
    /// Repository root everything is resolved against
    workspace_root: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager and load settings
    pub fn new(workspace_root: impl AsRef<Path>) -> Self {
        let workspace_root = workspace_root.as_ref().to_path_buf();
        let config = Self::load_config(&workspace_root);
        Self::from_config(workspace_root, config)
    }

    /// Create a settings manager from an explicit configuration
    pub fn from_config(workspace_root: impl Into<PathBuf>, mut config: IqPilotConfig) -> Self {
        let matcher = match ArticleMatcher::new(&config.file_patterns) {
            Ok(matcher) => matcher,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid file patterns, using defaults");
                config.file_patterns = FilePatternsConfig::default();
                Self::default_matcher()
            }
        };

        Self {
            config,
            matcher,
            workspace_root: workspace_root.into(),
        }
    }

    fn default_matcher() -> ArticleMatcher {
        // The compiled-in patterns are valid globs
        ArticleMatcher::new(&FilePatternsConfig::default()).unwrap_or_else(|_| ArticleMatcher {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        })
    }

    /// Load defaults and merge the config file over them
    fn load_config(workspace_root: &Path) -> IqPilotConfig {
        let mut config = IqPilotConfig::default();
        let path = Self::config_path_for(workspace_root);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return config;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<ConfigOverrides>(&content) {
                Ok(overrides) => {
                    tracing::debug!(path = %path.display(), "Loaded config file");
                    config.merge(overrides);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {:?}: {}", path, e);
            }
        }

        config
    }

    fn config_path_for(workspace_root: &Path) -> PathBuf {
        workspace_root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Get the merged configuration
    pub fn config(&self) -> &IqPilotConfig {
        &self.config
    }

    /// Get the workspace root
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Path of the config file (which may not exist)
    pub fn config_path(&self) -> PathBuf {
        Self::config_path_for(&self.workspace_root)
    }

    /// Reload settings from disk
    pub fn reload(&mut self) {
        let config = Self::load_config(&self.workspace_root);
        *self = Self::from_config(self.workspace_root.clone(), config);
    }

    /// Whether rename events should rewrite the metadata filename
    pub fn auto_sync_metadata(&self) -> bool {
        self.config.workflows.auto_sync_metadata
    }

    /// Absolute site template directory
    pub fn templates_dir(&self) -> PathBuf {
        self.resolve(&self.config.templates.directory)
    }

    /// Resolve a possibly relative path against the workspace root
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    /// Check whether a path is an article the server should track
    ///
    /// Paths outside the workspace root never match.
    pub fn is_article(&self, path: &Path) -> bool {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.workspace_root) {
                Ok(relative) => relative,
                Err(_) => return false,
            }
        } else {
            path
        };
        self.matcher.is_match(relative)
    }
}

impl Default for SettingsManager {
    fn default() -> Self {
        Self::from_config(PathBuf::from("."), IqPilotConfig::default())
    }
}
