//! Plain-text report
//!
//! Human-readable sections per classification plus the summary count
//! line. Colors are only applied when the report goes to a terminal;
//! file output stays plain.

use colored::Colorize;

use crate::classify::{Analysis, Classification};

pub struct TextReporter {
    colored: bool,
}

impl TextReporter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn render(&self, analysis: &Analysis, warnings: &[String]) -> String {
        let mut out = String::new();

        let used: Vec<_> = self.names_with(analysis, |c| matches!(c, Classification::Used));
        let unused: Vec<_> = self.names_with(analysis, |c| matches!(c, Classification::Unused));
        let ignored: Vec<(String, String)> = analysis
            .outcomes
            .iter()
            .filter_map(|o| match &o.classification {
                Classification::Ignored(reason) => {
                    Some((o.dependency.name.clone(), reason.clone()))
                }
                _ => None,
            })
            .collect();

        if !used.is_empty() {
            out.push_str(&self.heading("Used packages"));
            for name in &used {
                out.push_str(&format!(" {} {}\n", self.paint("✓", Paint::Green), name));
            }
            out.push('\n');
        }

        if !unused.is_empty() {
            out.push_str(&self.heading("Unused packages"));
            for name in &unused {
                out.push_str(&format!(" {} {}\n", self.paint("✗", Paint::Red), name));
            }
            out.push('\n');
        }

        if !ignored.is_empty() {
            out.push_str(&self.heading("Ignored packages"));
            for (name, reason) in &ignored {
                out.push_str(&format!(
                    " {} {} (ignored by {})\n",
                    self.paint("-", Paint::Dim),
                    name,
                    reason
                ));
            }
            out.push('\n');
        }

        if !analysis.zombies.is_empty() {
            out.push_str(&self.heading("Zombie packages"));
            for zombie in &analysis.zombies {
                out.push_str(&format!(
                    " {} {} (used via {} in {}:{})\n",
                    self.paint("!", Paint::Yellow),
                    zombie.package,
                    zombie.symbol.name,
                    zombie.symbol.file.display(),
                    zombie.symbol.line
                ));
            }
            out.push('\n');
        }

        if !warnings.is_empty() {
            out.push_str(&self.heading("Warnings"));
            for warning in warnings {
                out.push_str(&format!(" {} [WARNING] {}\n", self.paint("⚠", Paint::Yellow), warning));
            }
            out.push('\n');
        }

        let counts = analysis.counts();
        out.push_str(&format!(
            "Found {} used, {} unused, {} ignored and {} zombie packages\n",
            counts.used, counts.unused, counts.ignored, counts.zombies
        ));

        out
    }

    fn names_with(
        &self,
        analysis: &Analysis,
        predicate: impl Fn(&Classification) -> bool,
    ) -> Vec<String> {
        analysis
            .outcomes
            .iter()
            .filter(|o| predicate(&o.classification))
            .map(|o| o.dependency.name.clone())
            .collect()
    }

    fn heading(&self, text: &str) -> String {
        if self.colored {
            format!("{}\n", text.bold())
        } else {
            format!("{}\n", text)
        }
    }

    fn paint(&self, marker: &str, paint: Paint) -> String {
        if !self.colored {
            return marker.to_string();
        }
        match paint {
            Paint::Green => marker.green().to_string(),
            Paint::Red => marker.red().to_string(),
            Paint::Yellow => marker.yellow().to_string(),
            Paint::Dim => marker.dimmed().to_string(),
        }
    }
}

enum Paint {
    Green,
    Red,
    Yellow,
    Dim,
}
