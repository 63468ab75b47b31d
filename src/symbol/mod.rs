// Symbol model - comparison rules live here so every consumer agrees on them

mod extractor;

pub use extractor::{ExtractError, FileSymbols, SymbolExtractor};

use std::collections::HashMap;
use std::path::PathBuf;

/// A symbol name together with the source location that referenced or
/// defined it. The location is kept for report fidelity only; matching
/// is done purely on the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Fully qualified name, no leading backslash (e.g. `App\Service\Mailer`)
    pub name: String,

    /// File the symbol was seen in
    pub file: PathBuf,

    /// 1-based line number
    pub line: usize,
}

impl Symbol {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Normalize a symbol name for comparison.
///
/// PHP resolves class and function names case-insensitively, so the whole
/// pipeline compares lowercased names. File paths stay case-sensitive.
pub fn normalize(name: &str) -> String {
    name.trim_start_matches('\\').to_lowercase()
}

/// A set of symbols keyed by normalized name.
///
/// The first symbol inserted under a given name is kept as the
/// representative occurrence, so reports can point at a real source line.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    entries: HashMap<String, Symbol>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a symbol, keeping the earlier occurrence on collision.
    pub fn insert(&mut self, symbol: Symbol) {
        self.entries.entry(normalize(&symbol.name)).or_insert(symbol);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.values()
    }

    pub fn extend(&mut self, symbols: impl IntoIterator<Item = Symbol>) {
        for symbol in symbols {
            self.insert(symbol);
        }
    }
}

impl FromIterator<Symbol> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
