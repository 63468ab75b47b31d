//! Lexical PHP symbol extraction
//!
//! Pulls the symbols a PHP file defines and the symbols it consumes out of
//! the raw source with a line-oriented scan. This is deliberately a
//! name-level extraction: no type resolution, no inheritance walking. Names
//! are resolved against the file's namespace and use-imports so downstream
//! matching can work on fully qualified names.

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::Symbol;

/// A source file could not be read or scanned.
///
/// Extraction is fail-closed by default: classification cannot be trusted
/// with an incomplete consumed-symbol set.
#[derive(Debug, Error)]
#[error("failed to extract symbols from {}: {message}", file.display())]
pub struct ExtractError {
    pub file: PathBuf,
    pub message: String,
}

/// Symbols extracted from a single file.
#[derive(Debug, Default)]
pub struct FileSymbols {
    /// Symbols this file defines (classes, interfaces, traits, enums,
    /// functions, constants)
    pub defined: Vec<Symbol>,

    /// Symbols this file references
    pub consumed: Vec<Symbol>,
}

/// Whether a reference appeared in a class-like or function position.
/// PHP resolves unqualified function names with a global fallback; class
/// names resolve against the current namespace only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    ClassLike,
    Function,
}

/// Extracts defined and consumed symbols from PHP source files.
pub struct SymbolExtractor {
    re_namespace: Regex,
    re_use_group: Regex,
    re_use: Regex,
    re_class_def: Regex,
    re_fn_def: Regex,
    re_const_def: Regex,
    re_define: Regex,
    re_new: Regex,
    re_static: Regex,
    re_instanceof: Regex,
    re_extends: Regex,
    re_attribute: Regex,
    re_call: Regex,
    re_typed_param: Regex,
    re_return_type: Regex,
}

/// Language constructs that look like function calls but are not symbols.
const CALL_KEYWORDS: &[&str] = &[
    "if", "elseif", "for", "foreach", "while", "do", "switch", "match",
    "catch", "function", "fn", "array", "list", "isset", "unset", "empty",
    "exit", "die", "echo", "print", "return", "new", "use", "declare",
    "require", "include", "require_once", "include_once", "throw", "clone",
    "yield", "static", "self", "parent", "global", "namespace",
];

/// Modifiers that precede variables but are not type hints.
const TYPE_KEYWORDS: &[&str] = &[
    "public", "private", "protected", "static", "var", "readonly", "global",
    "int", "float", "string", "bool", "array", "object", "mixed", "callable",
    "iterable", "void", "null", "never", "false", "true", "self", "parent",
    "return", "echo", "print", "as", "case", "const", "instanceof", "new",
    "clone", "yield", "throw", "fn", "function", "use", "and", "or", "xor",
];

const STATIC_KEYWORDS: &[&str] = &["self", "static", "parent"];

impl SymbolExtractor {
    pub fn new() -> Self {
        Self {
            re_namespace: Regex::new(r"^\s*namespace\s+([A-Za-z_][\w\\]*)\s*[;{]").unwrap(),
            re_use_group: Regex::new(r"^\s*use\s+(?:function\s+|const\s+)?([A-Za-z_][\w\\]*)\\\{([^}]+)\}").unwrap(),
            re_use: Regex::new(r"^\s*use\s+(function\s+|const\s+)?([A-Za-z_][\w\\]*)(?:\s+as\s+([A-Za-z_]\w*))?\s*;").unwrap(),
            re_class_def: Regex::new(r"^\s*(?:(?:final|abstract|readonly)\s+)*(?:class|interface|trait|enum)\s+([A-Za-z_]\w*)").unwrap(),
            re_fn_def: Regex::new(r"^\s*function\s+&?\s*([A-Za-z_]\w*)\s*\(").unwrap(),
            re_const_def: Regex::new(r"^\s*const\s+([A-Za-z_]\w*)").unwrap(),
            re_define: Regex::new(r#"\bdefine\s*\(\s*['"]([^'"]+)['"]"#).unwrap(),
            re_new: Regex::new(r"\bnew\s+([A-Za-z_\\][\w\\]*)").unwrap(),
            re_static: Regex::new(r"([A-Za-z_\\][\w\\]*)\s*::").unwrap(),
            re_instanceof: Regex::new(r"\binstanceof\s+([A-Za-z_\\][\w\\]*)").unwrap(),
            re_extends: Regex::new(r"\b(?:extends|implements)\s+([A-Za-z_\\][\w\\]*(?:\s*,\s*[A-Za-z_\\][\w\\]*)*)").unwrap(),
            re_attribute: Regex::new(r"#\[\s*([A-Za-z_\\][\w\\]*)").unwrap(),
            re_call: Regex::new(r"(?:^|[^\w$\\>:])([A-Za-z_\\][\w\\]*)\s*\(").unwrap(),
            re_typed_param: Regex::new(r"\b([A-Za-z_\\][\w\\]*)\s+\$[A-Za-z_]").unwrap(),
            re_return_type: Regex::new(r"\)\s*:\s*\??\s*([A-Za-z_\\][\w\\]*)").unwrap(),
        }
    }

    /// Extract symbols from a file on disk.
    pub fn extract(&self, file: &Path) -> Result<FileSymbols, ExtractError> {
        let source = fs::read_to_string(file).map_err(|e| ExtractError {
            file: file.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(self.extract_source(&source, file))
    }

    /// Extract symbols from in-memory source, attributing locations to `file`.
    pub fn extract_source(&self, source: &str, file: &Path) -> FileSymbols {
        let mut out = FileSymbols::default();
        let mut namespace = String::new();
        let mut imports: HashMap<String, String> = HashMap::new();
        let mut in_block_comment = false;

        for (idx, raw_line) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_noise(raw_line, &mut in_block_comment);
            if line.trim().is_empty() {
                continue;
            }

            if let Some(cap) = self.re_namespace.captures(&line) {
                namespace = cap[1].to_string();
                imports.clear();
                continue;
            }

            // Group use: `use Foo\Bar\{A, B as C};`
            if let Some(cap) = self.re_use_group.captures(&line) {
                let prefix = cap[1].to_string();
                for part in cap[2].split(',') {
                    let part = part.trim().trim_start_matches("function ").trim_start_matches("const ");
                    if part.is_empty() {
                        continue;
                    }
                    let (target, alias) = match part.split_once(" as ") {
                        Some((t, a)) => (t.trim(), a.trim()),
                        None => (part, part.rsplit('\\').next().unwrap_or(part)),
                    };
                    let fqn = format!("{}\\{}", prefix, target);
                    imports.insert(alias.to_lowercase(), fqn.clone());
                    out.consumed.push(Symbol::new(fqn, file, line_no));
                }
                continue;
            }

            if let Some(cap) = self.re_use.captures(&line) {
                let target = cap[2].to_string();
                let alias = cap
                    .get(3)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| {
                        target.rsplit('\\').next().unwrap_or(&target).to_string()
                    });
                if target.contains('\\') {
                    // Top-level import of a fully qualified name.
                    imports.insert(alias.to_lowercase(), target.clone());
                    out.consumed.push(Symbol::new(target, file, line_no));
                } else {
                    // Either a global import or a trait use inside a class
                    // body. A lexical scan cannot tell them apart, so both
                    // candidate names are recorded; names that resolve to
                    // nothing are harmless downstream.
                    imports.insert(alias.to_lowercase(), target.clone());
                    out.consumed.push(Symbol::new(target.clone(), file, line_no));
                    if !namespace.is_empty() {
                        out.consumed
                            .push(Symbol::new(format!("{}\\{}", namespace, target), file, line_no));
                    }
                }
                continue;
            }

            // Definitions
            if let Some(cap) = self.re_class_def.captures(&line) {
                out.defined
                    .push(Symbol::new(qualify(&namespace, &cap[1]), file, line_no));
            }
            if let Some(cap) = self.re_fn_def.captures(&line) {
                out.defined
                    .push(Symbol::new(qualify(&namespace, &cap[1]), file, line_no));
            }
            if let Some(cap) = self.re_const_def.captures(&line) {
                out.defined
                    .push(Symbol::new(qualify(&namespace, &cap[1]), file, line_no));
            }
            // define() takes its constant name as a string literal, which
            // strip_noise blanks out, so this one scans the raw line.
            for cap in self.re_define.captures_iter(raw_line) {
                out.defined.push(Symbol::new(cap[1].to_string(), file, line_no));
            }

            // Consumptions
            for cap in self.re_new.captures_iter(&line) {
                self.consume(&mut out, &namespace, &imports, &cap[1], RefKind::ClassLike, file, line_no);
            }
            for cap in self.re_static.captures_iter(&line) {
                let name = &cap[1];
                if !STATIC_KEYWORDS.contains(&name.to_lowercase().as_str()) {
                    self.consume(&mut out, &namespace, &imports, name, RefKind::ClassLike, file, line_no);
                }
            }
            for cap in self.re_instanceof.captures_iter(&line) {
                self.consume(&mut out, &namespace, &imports, &cap[1], RefKind::ClassLike, file, line_no);
            }
            for cap in self.re_extends.captures_iter(&line) {
                for name in cap[1].split(',') {
                    self.consume(&mut out, &namespace, &imports, name.trim(), RefKind::ClassLike, file, line_no);
                }
            }
            for cap in self.re_attribute.captures_iter(&line) {
                self.consume(&mut out, &namespace, &imports, &cap[1], RefKind::ClassLike, file, line_no);
            }
            for cap in self.re_typed_param.captures_iter(&line) {
                let name = &cap[1];
                if !TYPE_KEYWORDS.contains(&name.to_lowercase().as_str()) {
                    self.consume(&mut out, &namespace, &imports, name, RefKind::ClassLike, file, line_no);
                }
            }
            for cap in self.re_return_type.captures_iter(&line) {
                let name = &cap[1];
                if !TYPE_KEYWORDS.contains(&name.to_lowercase().as_str()) {
                    self.consume(&mut out, &namespace, &imports, name, RefKind::ClassLike, file, line_no);
                }
            }
            for cap in self.re_call.captures_iter(&line) {
                let name = &cap[1];
                if !CALL_KEYWORDS.contains(&name.to_lowercase().as_str()) {
                    self.consume(&mut out, &namespace, &imports, name, RefKind::Function, file, line_no);
                }
            }
        }

        out
    }

    /// Resolve a referenced name against the namespace and imports, then
    /// record the resulting candidate(s).
    fn consume(
        &self,
        out: &mut FileSymbols,
        namespace: &str,
        imports: &HashMap<String, String>,
        raw: &str,
        kind: RefKind,
        file: &Path,
        line: usize,
    ) {
        if let Some(fqn) = raw.strip_prefix('\\') {
            out.consumed.push(Symbol::new(fqn.to_string(), file, line));
            return;
        }

        let first = raw.split('\\').next().unwrap_or(raw);
        if let Some(import) = imports.get(&first.to_lowercase()) {
            let resolved = match raw.split_once('\\') {
                Some((_, rest)) => format!("{}\\{}", import, rest),
                None => import.clone(),
            };
            out.consumed.push(Symbol::new(resolved, file, line));
            return;
        }

        if raw.contains('\\') || kind == RefKind::ClassLike {
            out.consumed.push(Symbol::new(qualify(namespace, raw), file, line));
            if kind == RefKind::Function && namespace.is_empty() {
                return;
            }
        }

        if kind == RefKind::Function {
            // Unqualified function names fall back to the global namespace.
            if !raw.contains('\\') && !namespace.is_empty() {
                out.consumed.push(Symbol::new(qualify(namespace, raw), file, line));
            }
            out.consumed.push(Symbol::new(raw.to_string(), file, line));
        }
    }
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}\\{}", namespace, name)
    }
}

/// Remove comments and string literals from a line so the symbol regexes
/// never match inside them. Heredocs and multi-line strings are not
/// tracked; this is a lexical approximation.
fn strip_noise(line: &str, in_block_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut in_string: Option<char> = None;

    while let Some(c) = chars.next() {
        if *in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block_comment = false;
            }
            continue;
        }
        if let Some(quote) = in_string {
            if c == '\\' {
                chars.next();
            } else if c == quote {
                in_string = None;
                out.push(quote);
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                in_string = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '#' if chars.peek() != Some(&'[') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_block_comment = true;
            }
            _ => out.push(c),
        }
    }

    out
}
