//! Rule set catalog
//!
//! Rule sets are loaded from:
//! 1. Builtin (embedded in binary): `delivery`, `stakeholder`
//! 2. User global (~/.config/planwizard/rules/*.yml)
//! 3. Project-specific (.planwizard/rules/*.yml)
//!
//! Later definitions override earlier ones with the same name. A file that
//! fails to parse or validate is logged and skipped; builtins must always
//! compile.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::rule::RuleSet;

/// Builtin rule set definitions (embedded in binary)
const BUILTIN_DELIVERY: &str = include_str!("builtin_rules/delivery.yml");
const BUILTIN_STAKEHOLDER: &str = include_str!("builtin_rules/stakeholder.yml");

/// Where rule sets are searched for
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Paths to search for rule set definitions (searched in order)
    pub paths: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            paths: vec![
                "builtin".to_string(),
                "~/.config/planwizard/rules".to_string(),
                ".planwizard/rules".to_string(),
            ],
        }
    }
}

impl RulesConfig {
    /// Expand paths (resolve ~/ and relative paths)
    pub fn expanded_paths(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .filter_map(|p| {
                if p == "builtin" {
                    None // builtin is handled specially
                } else if let Some(rest) = p.strip_prefix("~/") {
                    dirs::home_dir().map(|home| home.join(rest))
                } else {
                    Some(PathBuf::from(p))
                }
            })
            .collect()
    }

    /// Check if builtin rule sets should be loaded
    pub fn use_builtin(&self) -> bool {
        self.paths.iter().any(|p| p == "builtin")
    }
}

/// Loaded rule sets by name
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    sets: IndexMap<String, RuleSet>,
}

impl RuleCatalog {
    /// Load every rule set reachable from the configuration
    pub fn load(config: &RulesConfig) -> Result<Self> {
        debug!(?config, "RuleCatalog::load: called");
        let mut catalog = Self::default();

        if config.use_builtin() {
            debug!("RuleCatalog::load: loading builtin rule sets");
            catalog.load_builtins()?;
        } else {
            debug!("RuleCatalog::load: builtin rule sets disabled");
        }

        for path in config.expanded_paths() {
            if path.is_dir() {
                debug!(?path, "RuleCatalog::load: loading from directory");
                catalog.load_from_directory(&path)?;
            } else {
                debug!(?path, "RuleCatalog::load: directory does not exist, skipping");
            }
        }

        info!(count = catalog.sets.len(), "Loaded rule sets");
        Ok(catalog)
    }

    /// Catalog holding only the builtin rule sets
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::default();
        catalog.load_builtins()?;
        Ok(catalog)
    }

    fn load_builtins(&mut self) -> Result<()> {
        debug!("load_builtins: called");
        for (name, yaml) in [("delivery", BUILTIN_DELIVERY), ("stakeholder", BUILTIN_STAKEHOLDER)] {
            let rules = RuleSet::from_yaml(name, yaml).with_context(|| format!("Failed to load builtin rule set: {}", name))?;
            self.insert(rules);
        }
        Ok(())
    }

    /// Load all .yml/.yaml files from a directory
    fn load_from_directory(&mut self, dir: &Path) -> Result<()> {
        debug!(?dir, "load_from_directory: called");
        let entries = fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "yml" || e == "yaml").unwrap_or(false))
            .collect();
        paths.sort();

        for path in paths {
            if let Err(e) = self.load_from_file(&path) {
                warn!(?path, error = %e, "Failed to load rule set file");
            }
        }
        Ok(())
    }

    /// Load a single rule set file; the file stem names it when the YAML does not
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        debug!(?path, "load_from_file: called");
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| eyre::eyre!("Invalid filename: {}", path.display()))?;

        let rules = RuleSet::from_yaml(stem, &content).with_context(|| format!("Failed to parse: {}", path.display()))?;
        self.insert(rules);
        Ok(())
    }

    /// Add or replace a rule set
    pub fn insert(&mut self, rules: RuleSet) {
        debug!(name = %rules.name(), replaced = self.sets.contains_key(rules.name()), "insert: called");
        self.sets.insert(rules.name().to_string(), rules);
    }

    /// Get a rule set by name
    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.sets.get(name)
    }

    /// Rule set names in load order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
