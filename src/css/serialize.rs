//! Turning the CSS tree into text.
//!
//! This is the expanded output style only: source-map emission and
//! minification belong to the host serializer, which consumes the tree
//! directly.  The evaluator's own tests (and `@debug`-style hosts) use this
//! textual form.

use itertools::Itertools;

use crate::css::{CssNode, NodeKind};
use crate::error::{SassError, SassResult, SpannedResultExt};
use crate::media::MediaQuery;

/// Serializes a stylesheet tree.
///
/// Fails when a declaration's value has no plain-CSS representation; the
/// error points at the value's span.
pub fn serialize_tree(root: &CssNode) -> SassResult<String> {
    let mut out = String::new();
    write_children(root, 0, &mut out)?;
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

fn write_children(parent: &CssNode, indent: usize, out: &mut String) -> SassResult<()> {
    let visible: Vec<CssNode> = parent.children().filter(|c| !is_invisible(c)).collect();
    let count = visible.len();

    for (i, child) in visible.into_iter().enumerate() {
        write_node(&child, indent, out)?;
        if i + 1 < count && child.borrow().group_end {
            out.push('\n');
        }
    }
    Ok(())
}

fn write_node(node: &CssNode, indent: usize, out: &mut String) -> SassResult<()> {
    let data = node.borrow();
    let pad = "  ".repeat(indent);

    match &data.kind {
        NodeKind::Stylesheet => {
            drop(data);
            write_children(node, indent, out)?;
        }
        NodeKind::StyleRule { selector, .. } => {
            // placeholder complexes never reach the output
            let header = selector
                .borrow()
                .components
                .iter()
                .filter(|complex| !complex.is_invisible())
                .map(ToString::to_string)
                .join(", ");
            drop(data);
            write_block(node, indent, &header, out)?;
        }
        NodeKind::MediaRule { queries } => {
            let header = format!("@media {}", queries_text(queries));
            drop(data);
            write_block(node, indent, &header, out)?;
        }
        NodeKind::SupportsRule { condition } => {
            let header = format!("@supports {}", condition);
            drop(data);
            write_block(node, indent, &header, out)?;
        }
        NodeKind::KeyframeBlock { selectors } => {
            let header = selectors.join(", ");
            drop(data);
            write_block(node, indent, &header, out)?;
        }
        NodeKind::AtRule {
            name,
            value,
            childless,
        } => {
            let mut header = format!("@{}", name);
            if let Some(value) = value {
                header.push(' ');
                header.push_str(value);
            }
            if *childless {
                out.push_str(&pad);
                out.push_str(&header);
                out.push_str(";\n");
            } else {
                drop(data);
                write_block(node, indent, &header, out)?;
            }
        }
        NodeKind::Declaration {
            name,
            value,
            value_span,
        } => {
            let text = value.to_css_string(true).with_span(*value_span)?;
            out.push_str(&pad);
            out.push_str(name);
            out.push_str(": ");
            out.push_str(&text);
            out.push_str(";\n");
        }
        NodeKind::Import { url, modifiers } => {
            out.push_str(&pad);
            out.push_str("@import ");
            out.push_str(url);
            if let Some(modifiers) = modifiers {
                out.push(' ');
                out.push_str(modifiers);
            }
            out.push_str(";\n");
        }
        NodeKind::Comment { text } => {
            out.push_str(&pad);
            out.push_str(text);
            out.push('\n');
        }
    }
    Ok(())
}

fn write_block(node: &CssNode, indent: usize, header: &str, out: &mut String) -> SassResult<()> {
    let pad = "  ".repeat(indent);
    out.push_str(&pad);
    out.push_str(header);
    out.push_str(" {\n");
    write_children(node, indent + 1, out)?;
    out.push_str(&pad);
    out.push_str("}\n");
    Ok(())
}

fn queries_text(queries: &[MediaQuery]) -> String {
    queries.iter().map(MediaQuery::to_string).join(", ")
}

/// A node that produces no output: a container with nothing visible inside,
/// or a style rule whose selector is all placeholders.
fn is_invisible(node: &CssNode) -> bool {
    let data = node.borrow();
    match &data.kind {
        NodeKind::StyleRule { selector, .. } => {
            if selector.borrow().is_invisible() {
                return true;
            }
            drop(data);
            node.children().all(|c| is_invisible(&c))
        }
        NodeKind::MediaRule { .. }
        | NodeKind::SupportsRule { .. }
        | NodeKind::KeyframeBlock { .. } => {
            drop(data);
            node.children().all(|c| is_invisible(&c))
        }
        // an unknown at-rule is meaningful even with an empty body
        _ => false,
    }
}

/// Checks whether a SassError would be produced without building the text.
/// Used by module composition to surface serialization problems early.
pub fn check_serializable(root: &CssNode) -> Result<(), Box<SassError>> {
    serialize_tree(root).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::{append, new_node, new_style_rule};
    use crate::selector::parser::parse_selector_list;
    use crate::value::{SassNumber, Value};
    use codemap::Span;

    fn span() -> Span {
        let mut map = codemap::CodeMap::new();
        map.add_file("t.scss".into(), "x".into()).span
    }

    fn decl(name: &str, value: Value) -> CssNode {
        new_node(
            NodeKind::Declaration {
                name: name.into(),
                value,
                value_span: span(),
            },
            span(),
        )
    }

    #[test]
    fn writes_nested_rules() {
        let root = new_node(NodeKind::Stylesheet, span());
        let (rule, _) = new_style_rule(parse_selector_list(".a", true).unwrap(), span());
        append(&rule, decl("width", Value::Number(SassNumber::with_unit(3.0, "px"))));
        append(&root, rule);

        assert_eq!(serialize_tree(&root).unwrap(), ".a {\n  width: 3px;\n}\n");
    }

    #[test]
    fn skips_empty_and_placeholder_rules() {
        let root = new_node(NodeKind::Stylesheet, span());
        let (empty, _) = new_style_rule(parse_selector_list(".empty", true).unwrap(), span());
        append(&root, empty);
        let (placeholder, _) =
            new_style_rule(parse_selector_list("%base", true).unwrap(), span());
        append(&placeholder, decl("color", Value::unquoted_string("red")));
        append(&root, placeholder);

        assert_eq!(serialize_tree(&root).unwrap(), "");
    }

    #[test]
    fn group_end_inserts_blank_line() {
        let root = new_node(NodeKind::Stylesheet, span());
        let (mut a, _) = new_style_rule(parse_selector_list(".a", true).unwrap(), span());
        append(&a, decl("color", Value::unquoted_string("red")));
        a.borrow_mut().group_end = true;
        append(&root, a);
        let (b, _) = new_style_rule(parse_selector_list(".b", true).unwrap(), span());
        append(&b, decl("color", Value::unquoted_string("blue")));
        append(&root, b);

        assert_eq!(
            serialize_tree(&root).unwrap(),
            ".a {\n  color: red;\n}\n\n.b {\n  color: blue;\n}\n"
        );
    }

    #[test]
    fn unserializable_value_errors_at_value_span() {
        let root = new_node(NodeKind::Stylesheet, span());
        let (rule, _) = new_style_rule(parse_selector_list(".a", true).unwrap(), span());
        append(&rule, decl("width", Value::Map(crate::value::SassMap::new())));
        append(&root, rule);

        assert!(serialize_tree(&root).is_err());
    }
}
