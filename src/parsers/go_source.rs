/// Go declaration extraction backed by tree-sitter.
///
/// Only top-level `func` declarations matter for coverage grouping: function
/// literals are part of their enclosing declaration's span.
use std::ops::Range;
use std::path::Path;

use tree_sitter::{Node, Parser, Point};

use super::{Declaration, Position, SourceParser};
use crate::error::{Error, Result};

pub struct GoSourceParser;

impl SourceParser for GoSourceParser {
    fn parse(&self, path: &Path, source: &[u8]) -> Result<Vec<Declaration>> {
        let parse_error = |reason: String| Error::SourceParse {
            path: path.to_path_buf(),
            reason,
        };

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| parse_error(e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| parse_error("tree-sitter returned None".to_string()))?;

        let root = tree.root_node();
        if let Some(node) = first_error(root) {
            let at = position(node.start_position());
            return Err(parse_error(format!("syntax error at {}:{}", at.line, at.col)));
        }

        let mut cursor = root.walk();
        let declarations = root
            .children(&mut cursor)
            .filter_map(|node| func_declaration(node, source))
            .collect();
        Ok(declarations)
    }
}

/// Tree-sitter points are 0-based; coverage positions are 1-based.
fn position(point: Point) -> Position {
    Position {
        line: point.row as u32 + 1,
        col: point.column as u32 + 1,
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found.or(Some(node))
}

fn func_declaration(node: Node<'_>, source: &[u8]) -> Option<Declaration> {
    let receiver = match node.kind() {
        "function_declaration" => None,
        "method_declaration" => receiver_type(node),
        _ => return None,
    };

    let name = node.child_by_field_name("name")?.utf8_text(source).ok()?;
    Some(Declaration {
        name: name.to_string(),
        start: position(node.start_position()),
        end: position(node.end_position()),
        receiver,
    })
}

/// Byte range of the receiver's type expression, e.g. `*Type1` in
/// `func (r *Type1) M()`.
fn receiver_type(node: Node<'_>) -> Option<Range<usize>> {
    let params = node.child_by_field_name("receiver")?;
    let mut cursor = params.walk();
    let param = params
        .named_children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    param.child_by_field_name("type").map(|t| t.byte_range())
}
