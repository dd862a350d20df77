//! Run configuration.
//!
//! Every field has a default matching the viewer schema, so an empty (or absent) config file
//! is valid. Files are YAML; JSON works too since it is a subset.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Language tags, source language first. Each tag names one output artifact per fragment.
    pub languages: Vec<String>,
    pub circular: CircularConfig,
    /// Definitions bundled, with the circular definition, into the `circular` fragment.
    pub definitions: Vec<String>,
    /// Also label the `definitions` section, under the `definitions.` prefix.
    pub label_definitions: bool,
    /// File name of the ledger inside the output directory.
    pub ledger_file: String,
    /// Pretty-print output fragments.
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "fr".to_string()],
            circular: CircularConfig::default(),
            definitions: [
                "entryGroup",
                "visibilitySet",
                "infoSection",
                "entry",
                "symbologyStack",
                "legendGroupControls",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            label_definitions: true,
            ledger_file: "ledger.csv".to_string(),
            pretty: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircularConfig {
    /// Name of the synthetic definition, and of the fragment that bundles it.
    pub name: String,
    /// The definition the synthetic one stands in for (its `circRef`).
    pub references: String,
    pub sites: Vec<CircularSite>,
}

impl Default for CircularConfig {
    fn default() -> Self {
        Self {
            name: "circular".to_string(),
            references: "entryGroup".to_string(),
            sites: vec![
                CircularSite {
                    path: "definitions.entryGroup.properties.children.items.oneOf".to_string(),
                    remove: 0,
                },
                CircularSite {
                    path: "definitions.visibilitySet.properties.exclusiveVisibility.items.oneOf"
                        .to_string(),
                    remove: 0,
                },
            ],
        }
    }
}

/// A `oneOf` list (dot-separated path) and the index of its self-referencing alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircularSite {
    pub path: String,
    #[serde(default)]
    pub remove: usize,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.languages.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "at least one language is required".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for language in &self.languages {
            if language.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    reason: "language tags cannot be empty".to_string(),
                });
            }
            if !seen.insert(language) {
                return Err(ConfigError::Invalid {
                    reason: format!("language '{language}' is listed twice"),
                });
            }
        }
        if self.circular.sites.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "at least one circular reference site is required".to_string(),
            });
        }
        if self.circular.name.is_empty() || self.circular.name == "header" {
            return Err(ConfigError::Invalid {
                reason: format!("'{}' cannot name the circular fragment", self.circular.name),
            });
        }
        Ok(())
    }
}
