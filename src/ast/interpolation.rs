//! `#{...}` interpolation.

use codemap::Span;

use crate::ast::Expr;

/// A piece of interpolated text: either a literal run of characters or an
/// embedded expression.
#[derive(Debug, Clone)]
pub enum InterpolationPart {
    Literal(String),
    Expr(Expr),
}

/// An ordered sequence of literal text and embedded expressions.
///
/// Selectors, declaration names, media queries and at-root queries all
/// arrive from the parser as interpolations; the evaluator concatenates the
/// literal parts with the unquoted serialization of each expression's value
/// and, where needed, re-parses the result.
#[derive(Debug, Clone)]
pub struct Interpolation {
    pub parts: Vec<InterpolationPart>,
    pub span: Span,
}

impl Interpolation {
    pub fn new(parts: Vec<InterpolationPart>, span: Span) -> Interpolation {
        Interpolation { parts, span }
    }

    /// An interpolation holding a single literal string.
    pub fn plain(text: impl Into<String>, span: Span) -> Interpolation {
        Interpolation {
            parts: vec![InterpolationPart::Literal(text.into())],
            span,
        }
    }

    /// An interpolation holding a single expression.
    pub fn from_expr(expr: Expr) -> Interpolation {
        let span = expr.span();
        Interpolation {
            parts: vec![InterpolationPart::Expr(expr)],
            span,
        }
    }

    /// The literal text, if no part is an expression.
    pub fn as_plain(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [] => Some(""),
            [InterpolationPart::Literal(text)] => Some(text),
            _ => None,
        }
    }

    /// The longest literal prefix.  Used for error messages about at-rules
    /// whose name is partially interpolated.
    pub fn initial_plain(&self) -> &str {
        match self.parts.first() {
            Some(InterpolationPart::Literal(text)) => text,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        let mut map = codemap::CodeMap::new();
        map.add_file("t.scss".into(), "abc".into()).span
    }

    #[test]
    fn plain_text_round_trips() {
        let interp = Interpolation::plain("a b", span());
        assert_eq!(interp.as_plain(), Some("a b"));
        assert_eq!(interp.initial_plain(), "a b");
    }

    #[test]
    fn empty_interpolation_is_plain() {
        let interp = Interpolation::new(vec![], span());
        assert_eq!(interp.as_plain(), Some(""));
    }
}
