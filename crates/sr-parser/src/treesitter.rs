//! Tree-sitter integration for Go.

use sr_core::{GenError, Result};
use std::path::Path;

/// Parse Go source and return the tree-sitter tree.
///
/// A tree with syntax errors is rejected: declarations extracted from a
/// recovered tree could silently drop fields.
pub fn parse_go(path: &Path, source: &str) -> Result<tree_sitter::Tree> {
    let lang: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&lang)
        .map_err(|e| parse_error(path, format!("failed to set tree-sitter language: {e}")))?;
    let tree = parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| parse_error(path, "parser returned no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        let message = match first_error(root) {
            Some(node) => {
                let p = node.start_position();
                if node.is_missing() {
                    format!("{}:{}: missing {}", p.row + 1, p.column + 1, node.kind())
                } else {
                    format!("{}:{}: syntax error", p.row + 1, p.column + 1)
                }
            }
            None => "syntax error".to_string(),
        };
        return Err(parse_error(path, message));
    }
    Ok(tree)
}

fn parse_error(path: &Path, message: impl Into<String>) -> GenError {
    GenError::PackageParse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_error(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error()
            && let Some(found) = first_error(child)
        {
            return Some(found);
        }
    }
    None
}

/// Source text covered by a node.
pub fn text<'s>(node: &tree_sitter::Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}
