//! Article templates
//!
//! Templates come from the site template directory (`<name>.md`) and fall
//! back to the built-in set. Loaded templates are cached by name until
//! [`TemplateService::clear_cache`].

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::settings::SharedSettings;
use crate::types::{IqPilotError, Result};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[^}]+\}\}").expect("Invalid regex"));

const ARTICLE_TEMPLATE: &str = "# {{title}}

*By {{author}} · {{date}}*

## Table of Contents

- [Introduction](#introduction)
- [Background](#background)
- [Details](#details)
- [Conclusion](#conclusion)
- [References](#references)

## Introduction

{{summary}}

## Background

## Details

## Conclusion

## References
";

const HOWTO_TEMPLATE: &str = "# How to {{title}}

*By {{author}} · {{date}}*

## Table of Contents

- [Overview](#overview)
- [Prerequisites](#prerequisites)
- [Steps](#steps)
- [Example](#example)
- [Troubleshooting](#troubleshooting)
- [References](#references)

## Overview

{{summary}}

## Prerequisites

## Steps

1.

## Example

```
```

## Troubleshooting

## References
";

const TUTORIAL_TEMPLATE: &str = "# {{title}}: A Tutorial

*By {{author}} · {{date}}*

## Table of Contents

- [Introduction](#introduction)
- [Prerequisites](#prerequisites)
- [Tutorial](#tutorial)
- [Next Steps](#next-steps)
- [References](#references)

## Introduction

{{summary}}

## Prerequisites

## Tutorial

### Step 1

## Next Steps

## References
";

/// Built-in templates by name
const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("article", ARTICLE_TEMPLATE),
    ("howto", HOWTO_TEMPLATE),
    ("tutorial", TUTORIAL_TEMPLATE),
];

/// Loads, caches and renders article templates
#[derive(Debug)]
pub struct TemplateService {
    settings: SharedSettings,
    cache: DashMap<String, String>,
}

impl TemplateService {
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            settings,
            cache: DashMap::new(),
        }
    }

    /// Template text by name, site directory first
    #[tracing::instrument(name = "get_template", skip(self))]
    pub async fn get_template(&self, name: &str) -> Result<String> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }

        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(IqPilotError::template(format!("Invalid template name: {}", name)));
        }

        let site_path = self.site_dir().await.join(format!("{}.md", name));
        let template = match tokio::fs::read_to_string(&site_path).await {
            Ok(text) => {
                tracing::info!(path = %site_path.display(), "Loaded site template");
                text
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => builtin(name)
                .map(str::to_string)
                .ok_or_else(|| IqPilotError::template(format!("Template not found: {}", name)))?,
            Err(e) => return Err(IqPilotError::Io(e)),
        };

        self.cache.insert(name.to_string(), template.clone());
        Ok(template)
    }

    /// Render a template with `{{key}}` substitution
    ///
    /// Placeholders without a value are removed.
    pub async fn render(&self, name: &str, variables: &HashMap<String, String>) -> Result<String> {
        let template = self.get_template(name).await?;
        Ok(substitute(&template, variables))
    }

    /// Names of every available template, sorted
    pub async fn list_templates(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> = BUILTIN_TEMPLATES
            .iter()
            .map(|(name, _)| (*name).to_string())
            .collect();

        let dir = self.site_dir().await;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(names.into_iter().collect());
            }
            Err(e) => return Err(IqPilotError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                if let Some(stem) = path.file_stem() {
                    names.insert(stem.to_string_lossy().into_owned());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Template cache cleared");
    }

    async fn site_dir(&self) -> PathBuf {
        self.settings.read().await.templates_dir()
    }
}

fn builtin(name: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, text)| *text)
}

/// Substitute variables and strip leftover placeholders
pub fn substitute(template: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in variables {
        rendered = rendered.replace(&format!("{{{{{}}}}}", key), value);
    }
    PLACEHOLDER_RE.replace_all(&rendered, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{IqPilotConfig, SettingsManager};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    fn service(root: &std::path::Path) -> TemplateService {
        let settings = SettingsManager::from_config(root, IqPilotConfig::default());
        TemplateService::new(Arc::new(RwLock::new(settings)))
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_substitute() {
        let rendered = substitute(
            "# {{title}} by {{author}}{{missing}}",
            &vars(&[("title", "Intro"), ("author", "Ada")]),
        );
        assert_eq!(rendered, "# Intro by Ada");
    }

    #[tokio::test]
    async fn test_builtin_templates() {
        let dir = TempDir::new().unwrap();
        let service = service(dir.path());

        let rendered = service
            .render("howto", &vars(&[("title", "Deploy"), ("author", "Ada"), ("date", "2024-01-01")]))
            .await
            .unwrap();
        assert!(rendered.starts_with("# How to Deploy\n"));
        assert!(rendered.contains("*By Ada · 2024-01-01*"));
        assert!(!rendered.contains("{{"));

        let err = service.get_template("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Template error: Template not found: missing");
        assert!(service.get_template("../secret").await.is_err());
    }

    #[tokio::test]
    async fn test_site_template_overrides_builtin_and_is_cached() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join(".github/templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("article.md"), "Site {{title}}").unwrap();
        std::fs::write(templates.join("release-notes.md"), "Notes").unwrap();
        std::fs::write(templates.join("ignored.txt"), "x").unwrap();

        let service = service(dir.path());
        assert_eq!(
            service.render("article", &vars(&[("title", "A")])).await.unwrap(),
            "Site A"
        );

        std::fs::write(templates.join("article.md"), "Changed {{title}}").unwrap();
        assert_eq!(service.get_template("article").await.unwrap(), "Site {{title}}");
        service.clear_cache();
        assert_eq!(service.get_template("article").await.unwrap(), "Changed {{title}}");

        assert_eq!(
            service.list_templates().await.unwrap(),
            vec!["article", "howto", "release-notes", "tutorial"]
        );
    }

    #[tokio::test]
    async fn test_list_without_site_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            service(dir.path()).list_templates().await.unwrap(),
            vec!["article", "howto", "tutorial"]
        );
    }
}
