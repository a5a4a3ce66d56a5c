//! Import collection for generated files.

use crate::typeexpr::qualifiers;
use sr_core::GenWarning;
use sr_core::generated::GENERATED_HEADER;
use sr_core::meta::ImportMeta;
use sr_core::naming::last_segment;
use sr_core::writer::{CodeWriter, go_string_literal};
use std::collections::BTreeMap;

/// Imports of one generated file, keyed by the name code refers to them by.
#[derive(Debug, Clone, Default)]
pub struct ImportSet {
    imports: BTreeMap<String, String>,
    warnings: Vec<GenWarning>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import `path` as `alias`. A second path for a taken alias is
    /// reported and ignored.
    pub fn add(&mut self, alias: &str, path: &str) {
        match self.imports.get(alias) {
            Some(kept) if kept != path => {
                let warning = GenWarning::ImportConflict {
                    alias: alias.to_string(),
                    kept: kept.clone(),
                    ignored: path.to_string(),
                };
                warning.report();
                self.warnings.push(warning);
            }
            Some(_) => {}
            None => {
                self.imports.insert(alias.to_string(), path.to_string());
            }
        }
    }

    /// Import `path` under its last segment.
    pub fn add_path(&mut self, path: &str) {
        self.add(last_segment(path), path);
    }

    pub fn add_meta(&mut self, import: &ImportMeta) {
        self.add(import.export(), &import.path);
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.imports.get(alias).map(String::as_str)
    }

    /// Drop imports whose alias `code` never qualifies a name with.
    ///
    /// Code the tokenizer cannot read keeps every import.
    pub fn retain_used(&mut self, code: &str) {
        match qualifiers(code) {
            Ok(used) => self.imports.retain(|alias, _| used.contains(alias)),
            Err(e) => tracing::debug!(error = %e, "keeping all imports"),
        }
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn warnings(&self) -> &[GenWarning] {
        &self.warnings
    }

    /// Write the import declaration, sorted by path. Aliases equal to the
    /// path's last segment are left implicit.
    pub fn write(&self, w: &mut CodeWriter) {
        let mut specs: Vec<(&str, &str)> = self
            .imports
            .iter()
            .map(|(alias, path)| (alias.as_str(), path.as_str()))
            .collect();
        specs.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)));

        let spec = |alias: &str, path: &str| {
            if alias == last_segment(path) {
                go_string_literal(path)
            } else {
                format!("{alias} {}", go_string_literal(path))
            }
        };
        match specs.as_slice() {
            [] => {}
            [(alias, path)] => {
                w.writeln(&format!("import {}", spec(alias, path)));
            }
            _ => {
                w.writeln("import (").indent();
                for (alias, path) in &specs {
                    w.writeln(&spec(alias, path));
                }
                w.dedent().writeln(")");
            }
        }
    }
}

/// Assemble a generated Go file: header, package clause, imports, body.
pub fn go_file(package: &str, imports: &ImportSet, body: &str) -> String {
    let mut w = CodeWriter::new();
    w.writeln(GENERATED_HEADER).empty_line();
    w.writeln(&format!("package {package}"));
    if !imports.is_empty() {
        w.empty_line();
        imports.write(&mut w);
    }
    if !body.is_empty() {
        w.empty_line();
        w.raw(body);
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_alias_keeps_first() {
        let mut set = ImportSet::new();
        set.add_path("demo/internal/model");
        set.add_path("other/model");
        assert_eq!(set.get("model"), Some("demo/internal/model"));
        assert_eq!(set.warnings().len(), 1);
        set.add_path("demo/internal/model");
        assert_eq!(set.warnings().len(), 1);
    }

    #[test]
    fn test_write_block_sorted_by_path() {
        let mut set = ImportSet::new();
        set.add_path("encoding/json");
        set.add_path("context");
        set.add("dec", "github.com/shopspring/decimal");
        let mut w = CodeWriter::new();
        set.write(&mut w);
        assert_eq!(
            w.finish(),
            "import (\n\t\"context\"\n\t\"encoding/json\"\n\tdec \"github.com/shopspring/decimal\"\n)\n"
        );
    }

    #[test]
    fn test_go_file_layout() {
        let mut set = ImportSet::new();
        set.add_path("context");
        let out = go_file("slot", &set, "var A = 1\n");
        assert_eq!(
            out,
            format!("{GENERATED_HEADER}\n\npackage slot\n\nimport \"context\"\n\nvar A = 1\n")
        );
        assert!(sr_core::generated::is_generated(&out));
    }

    #[test]
    fn test_retain_used() {
        let mut set = ImportSet::new();
        set.add_path("context");
        set.add_path("encoding/json");
        set.retain_used("func f(ctx context.Context) {}\n");
        assert_eq!(set.len(), 1);
        let mut w = CodeWriter::new();
        set.write(&mut w);
        assert_eq!(w.finish(), "import \"context\"\n");
    }
}
