// Manifest data model - declared dependencies and their autoload mappings

mod composer_json;
mod installed;

pub use composer_json::{Autoload, ComposerManifest, Requirement};
pub use installed::{load_installed, InstalledPackage};

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or interpreting Composer metadata. These are fatal
/// configuration errors; partial-data conditions degrade to warnings
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("unable to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("invalid JSON in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Composer Version {0} is not supported")]
    UnsupportedVersion(u32),
}

/// How a dependency declares the symbols it provides.
///
/// A dependency may own multiple mappings of mixed variants; the provided
/// set is the union over all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolMapping {
    /// Autoload prefix mapped to a directory (PSR-4 or PSR-0). A symbol
    /// under the prefix is provided iff the derived file exists.
    PrefixDirectory {
        prefix: String,
        base_dir: PathBuf,
        style: PrefixStyle,
    },

    /// Every symbol defined in these files belongs to the dependency,
    /// regardless of name (autoload `files` and `classmap` entries).
    ExplicitFiles { paths: Vec<PathBuf> },

    /// An explicit enumerated set of symbol names, added verbatim.
    ClassMap { names: Vec<String> },
}

/// Path derivation rule for a prefix mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixStyle {
    /// The prefix is stripped before joining to the base directory.
    Psr4,
    /// The full name is joined to the base directory, with underscores in
    /// the class basename treated as directory separators.
    Psr0,
}

/// A dependency as the classifier sees it: identity, declared constraint,
/// and the mappings describing what it provides.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: String,

    /// Declared version constraint; opaque to the engine.
    pub constraint: String,

    /// Language runtime or extension identity rather than a source package.
    pub platform: bool,

    pub mappings: Vec<SymbolMapping>,

    /// Line of the requirement in composer.json, for report locations.
    pub manifest_line: Option<usize>,
}

impl Dependency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: String::new(),
            platform: false,
            mappings: Vec::new(),
            manifest_line: None,
        }
    }

    pub fn platform(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
            platform: true,
            mappings: Vec::new(),
            manifest_line: None,
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = constraint.into();
        self
    }

    pub fn with_mappings(mut self, mappings: Vec<SymbolMapping>) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn with_manifest_line(mut self, line: Option<usize>) -> Self {
        self.manifest_line = line;
        self
    }
}

/// Requirements that name the platform itself (the PHP runtime, an
/// extension, or a system library) instead of an installable package.
pub fn is_platform_requirement(name: &str) -> bool {
    name == "php"
        || name.starts_with("php-")
        || name.starts_with("ext-")
        || name.starts_with("lib-")
}

/// Synthetic identity symbol pre-seeded for a platform requirement. Never
/// produced by real source; unconditionally treated as consumed so the
/// requirement can never be reported unused.
pub fn platform_symbol(package: &str) -> String {
    format!("__platform::{}", package)
}
