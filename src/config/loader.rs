// Configuration loader

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classify::{ClassifyPolicy, EmptyMappingPolicy};

/// Configuration for a deadrequire run.
///
/// Built once from file plus CLI overrides and then passed by reference
/// into the engine; nothing mutates it after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Packages excluded by exact name
    pub exclude_packages: Vec<String>,

    /// Packages excluded by glob pattern (`*` crosses separators)
    pub exclude_patterns: Vec<String>,

    /// Extra PHP files scanned in addition to the autoload sources
    pub extra_files: Vec<PathBuf>,

    /// Directory names skipped during source discovery
    pub exclude_dirs: Vec<String>,

    /// What to do with a dependency that has no autoload declarations
    pub zero_mapping: ZeroMappingPolicy,

    /// Whether zombie packages alone fail the run
    pub fail_on_zombies: bool,

    /// Skip unparsable project files with a warning instead of aborting
    pub lenient: bool,

    /// Report defaults
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZeroMappingPolicy {
    #[default]
    Unused,
    Ignored,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: text or gitlab
    pub format: String,

    /// Output file; stdout when unset
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_packages: vec![],
            exclude_patterns: vec![],
            extra_files: vec![],
            exclude_dirs: vec![],
            zero_mapping: ZeroMappingPolicy::default(),
            fail_on_zombies: true,
            lenient: false,
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML).
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try TOML first, then YAML
                if let Ok(config) = toml::from_str(&contents) {
                    Ok(config)
                } else {
                    serde_yaml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations next to the
    /// manifest.
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            "deadrequire.toml",
            ".deadrequire.toml",
            "deadrequire.yml",
            ".deadrequire.yml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// The classifier's policy knobs, derived from configuration.
    pub fn classify_policy(&self) -> ClassifyPolicy {
        ClassifyPolicy {
            empty_mapping: match self.zero_mapping {
                ZeroMappingPolicy::Unused => EmptyMappingPolicy::Unused,
                ZeroMappingPolicy::Ignored => EmptyMappingPolicy::Ignored,
            },
            fail_on_zombies: self.fail_on_zombies,
        }
    }
}
