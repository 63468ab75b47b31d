//! deadrequire - Dependency usage resolution for Composer projects
//!
//! This library classifies every dependency declared in a `composer.json`
//! into one of four buckets: used, unused, ignored, or zombie (installed
//! and consumed but never declared).
//!
//! # Architecture
//!
//! The resolution pipeline consists of:
//! 1. **Manifest reading** - Parse `composer.json` and the install tree
//! 2. **File Discovery** - Find all project .php files under the autoload roots
//! 3. **Symbol Extraction** - Collect defined and consumed symbols per file
//! 4. **Provider Indexing** - Map provided symbols back to packages
//! 5. **Classification** - Resolve each dependency against consumed symbols
//! 6. **Reporting** - Output results in text or gitlab format

pub mod classify;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod filter;
pub mod manifest;
pub mod provider;
pub mod report;
pub mod symbol;

pub use classify::{classify, Analysis, Classification, ClassifyPolicy, Counts, Zombie};
pub use config::{Config, OutputConfig, ZeroMappingPolicy};
pub use discovery::FileFinder;
pub use engine::{resolve, Resolution};
pub use filter::{Filter, FilterPipeline};
pub use manifest::{ComposerManifest, Dependency, SymbolMapping};
pub use provider::ProvidedIndex;
pub use report::{ReportFormat, Reporter};
pub use symbol::{Symbol, SymbolExtractor, SymbolSet};
