//! The CSS output tree.
//!
//! The evaluator builds a mutable tree of plain-CSS nodes as it walks the
//! input.  The tree is represented with the [`rctree` crate][rctree]:
//! [`rctree::Node`] provides parent pointers, sibling order and subtree
//! reattachment, which `@at-root` and nested `@media` handling lean on.
//! We put a [`NodeData`] as the type parameter of [`rctree::Node`] and use
//! the type alias [`CssNode`]` = rctree::Node<NodeData>`.
//!
//! Style rules hold their selector behind a shared handle
//! (`Rc<RefCell<SelectorList>>`): the extender keeps the same handle and
//! rewrites the selector in place when extensions are applied, including on
//! copies made for `@media` splitting.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use codemap::Span;

use crate::media::MediaQuery;
use crate::selector::SelectorList;
use crate::value::Value;

pub mod serialize;

/// A node in the CSS output tree.
pub type CssNode = rctree::Node<NodeData>;

/// Data for a single CSS node.
pub struct NodeData {
    pub kind: NodeKind,
    pub span: Span,
    /// Set on the last node of a source-level group; the serializer inserts
    /// a blank line after it.
    pub group_end: bool,
}

/// What a CSS node is.
#[derive(Clone)]
pub enum NodeKind {
    Stylesheet,
    StyleRule {
        /// The selector as rewritten by the extender.  Shared: copies of
        /// this rule (made when splitting for nested `@media`) see the
        /// same rewrites.
        selector: Rc<RefCell<SelectorList>>,
        /// The selector as written, before any extensions.
        original: SelectorList,
    },
    MediaRule {
        queries: Vec<MediaQuery>,
    },
    SupportsRule {
        condition: String,
    },
    AtRule {
        name: String,
        value: Option<String>,
        /// `@charset "utf-8";` is childless; `@font-face { ... }` is not.
        childless: bool,
    },
    KeyframeBlock {
        selectors: Vec<String>,
    },
    Declaration {
        name: String,
        value: Value,
        value_span: Span,
    },
    Import {
        url: String,
        modifiers: Option<String>,
    },
    Comment {
        text: String,
    },
}

impl fmt::Debug for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Stylesheet => write!(f, "Stylesheet"),
            NodeKind::StyleRule { selector, .. } => {
                write!(f, "StyleRule({})", selector.borrow())
            }
            NodeKind::MediaRule { queries } => {
                let text = queries
                    .iter()
                    .map(MediaQuery::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "MediaRule({})", text)
            }
            NodeKind::SupportsRule { condition } => write!(f, "SupportsRule({})", condition),
            NodeKind::AtRule { name, .. } => write!(f, "AtRule(@{})", name),
            NodeKind::KeyframeBlock { selectors } => {
                write!(f, "KeyframeBlock({})", selectors.join(", "))
            }
            NodeKind::Declaration { name, .. } => write!(f, "Declaration({})", name),
            NodeKind::Import { url, .. } => write!(f, "Import({})", url),
            NodeKind::Comment { .. } => write!(f, "Comment"),
        }
    }
}

/// Creates a detached node.
pub fn new_node(kind: NodeKind, span: Span) -> CssNode {
    rctree::Node::new(NodeData {
        kind,
        span,
        group_end: false,
    })
}

/// Creates a style rule node; the returned handle is what the extender
/// tracks.
pub fn new_style_rule(
    selector: SelectorList,
    span: Span,
) -> (CssNode, Rc<RefCell<SelectorList>>) {
    let handle = Rc::new(RefCell::new(selector.clone()));
    let node = new_node(
        NodeKind::StyleRule {
            selector: Rc::clone(&handle),
            original: selector,
        },
        span,
    );
    (node, handle)
}

/// Appends `child` to `parent`, detaching it from any previous parent.
pub fn append(parent: &CssNode, child: CssNode) {
    let mut parent = parent.clone();
    parent.append(child);
}

/// Shallow-clones a node: same attributes (style rules share their selector
/// handle), no children, detached.
pub fn copy_without_children(node: &CssNode) -> CssNode {
    let data = node.borrow();
    rctree::Node::new(NodeData {
        kind: data.kind.clone(),
        span: data.span,
        group_end: false,
    })
}

/// Whether the node has a later sibling.  Appending new children to an
/// ancestor of such a node would reorder emitted CSS, so the evaluator
/// copies the ancestor chain instead.
pub fn has_following_sibling(node: &CssNode) -> bool {
    node.next_sibling().is_some()
}

/// Whether two handles refer to the same tree node.
pub fn same_node(a: &CssNode, b: &CssNode) -> bool {
    std::ptr::eq(&*a.borrow() as *const NodeData, &*b.borrow() as *const NodeData)
}

/// A detached style-rule node sharing an existing selector handle.  Used
/// when `@media` and friends need a copy of the enclosing rule to hold
/// declarations.
pub fn copy_with_style_rule(selector: &Rc<RefCell<SelectorList>>, span: Span) -> CssNode {
    let original = selector.borrow().clone();
    new_node(
        NodeKind::StyleRule {
            selector: Rc::clone(selector),
            original,
        },
        span,
    )
}

/// Marks the last child of `parent` as ending a group.
pub fn mark_group_end(parent: &CssNode) {
    if let Some(mut last) = parent.last_child() {
        last.borrow_mut().group_end = true;
    }
}
