//! Exclusion filter pipeline
//!
//! Filters remove dependencies from consideration before any symbol
//! matching happens. The pipeline is a closed tagged union evaluated in a
//! fixed order: the first filter that matches wins and its reason is
//! recorded, so reordering filters can change the recorded reason but
//! never the ignored/not-ignored outcome.

use regex::Regex;

/// Packages that name Composer's own runtime surface rather than anything
/// installable. Always pre-ignored, before any user-configured filter.
pub const SPECIAL_PACKAGES: &[&str] = &["composer-plugin-api", "composer-runtime-api"];

/// A single exclusion predicate.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Exact, case-sensitive package-name membership.
    Named(NamedFilter),
    /// Glob-style name pattern; `*` matches across `/` and `-`.
    Pattern(PatternFilter),
}

impl Filter {
    pub fn named(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Filter::Named(NamedFilter::new(names))
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Filter::Pattern(PatternFilter::new(pattern))
    }

    /// Returns the reason string when the package matches.
    pub fn matched(&self, package: &str) -> Option<String> {
        match self {
            Filter::Named(f) => f.matched(package),
            Filter::Pattern(f) => f.matched(package),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NamedFilter {
    names: Vec<String>,
}

impl NamedFilter {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    fn matched(&self, package: &str) -> Option<String> {
        self.names
            .iter()
            .any(|n| n == package)
            .then(|| format!("NamedFilter [{}]", package))
    }
}

#[derive(Debug, Clone)]
pub struct PatternFilter {
    pattern: String,
    regex: Regex,
}

impl PatternFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let regex = compile_glob(&pattern);
        Self { pattern, regex }
    }

    fn matched(&self, package: &str) -> Option<String> {
        self.regex
            .is_match(package)
            .then(|| format!("PatternFilter [{}]", self.pattern))
    }
}

/// Translate a glob into an anchored regex. `*` deliberately matches any
/// run of characters including `/` and `-`, so `*-implementation` covers
/// `psr/log-implementation`.
fn compile_glob(pattern: &str) -> Regex {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    // A pattern built this way is always a valid regex.
    Regex::new(&out).unwrap()
}

/// Ordered chain of filters; first match wins.
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    filters: Vec<Filter>,
}

impl FilterPipeline {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// Build the pipeline with the built-in special-package filter ahead
    /// of all user-configured filters.
    pub fn with_builtin(user_filters: Vec<Filter>) -> Self {
        let mut filters = vec![Filter::named(SPECIAL_PACKAGES.iter().copied())];
        filters.extend(user_filters);
        Self { filters }
    }

    /// Run the package through the chain; the first matching filter's
    /// reason is returned.
    pub fn matched(&self, package: &str) -> Option<String> {
        self.filters.iter().find_map(|f| f.matched(package))
    }
}
