//! Indentation-aware text writer for generated Go code.

use std::fmt::Write as _;

/// Builds Go source with tab indentation, the way `gofmt` lays it out.
///
/// Indentation is written lazily at the first text of a line, so blank lines
/// never carry trailing whitespace.
#[derive(Debug)]
pub struct CodeWriter {
    out: String,
    indent: usize,
    line_start: bool,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            line_start: true,
        }
    }

    /// Append text to the current line.
    pub fn write(&mut self, s: &str) -> &mut Self {
        if s.is_empty() {
            return self;
        }
        if self.line_start {
            for _ in 0..self.indent {
                self.out.push('\t');
            }
            self.line_start = false;
        }
        self.out.push_str(s);
        self
    }

    /// Append each piece in order.
    pub fn write_all(&mut self, parts: &[&str]) -> &mut Self {
        for part in parts {
            self.write(part);
        }
        self
    }

    /// End the current line. No-op at the start of a line.
    pub fn line(&mut self) -> &mut Self {
        if !self.line_start {
            self.out.push('\n');
            self.line_start = true;
        }
        self
    }

    /// End the current line and add one blank line.
    pub fn empty_line(&mut self) -> &mut Self {
        self.line();
        self.out.push('\n');
        self
    }

    /// Write a full line.
    pub fn writeln(&mut self, s: &str) -> &mut Self {
        self.write(s).line()
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    /// Copy pre-formatted text verbatim, ignoring the current indentation.
    pub fn raw(&mut self, s: &str) -> &mut Self {
        if !s.is_empty() {
            self.out.push_str(s);
            self.line_start = s.ends_with('\n');
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(mut self) -> String {
        self.line();
        self.out
    }
}

/// Quote `s` as a Go interpreted string literal.
pub fn go_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation_uses_tabs() {
        let mut w = CodeWriter::new();
        w.writeln("func f() {").indent();
        w.writeln("return");
        w.dedent().writeln("}");
        assert_eq!(w.finish(), "func f() {\n\treturn\n}\n");
    }

    #[test]
    fn test_blank_lines_have_no_indent() {
        let mut w = CodeWriter::new();
        w.indent().write("a").empty_line().write("b");
        assert_eq!(w.finish(), "\ta\n\n\tb\n");
    }

    #[test]
    fn test_go_string_literal() {
        assert_eq!(
            go_string_literal("type A struct {\n\tName string `json:\"name\"`\n}"),
            r#""type A struct {\n\tName string `json:\"name\"`\n}""#
        );
        assert_eq!(go_string_literal("a\\b\r\n"), r#""a\\b\n""#);
    }
}
