//! `@at-root` queries.

use std::collections::HashSet;

use cssparser::{Parser, ParserInput, Token};

use crate::css::CssNode;
use crate::error::FormatError;

/// Which ancestor rules an `@at-root` block escapes.
///
/// Written as `(with: <names>)` or `(without: <names>)`; the names are rule
/// kinds (`rule` for style rules, `media`, `supports`, an at-rule name) or
/// `all`.  With no query, `@at-root` escapes style rules only.
#[derive(Debug, Clone)]
pub struct AtRootQuery {
    include: bool,
    names: HashSet<String>,
}

impl AtRootQuery {
    pub fn new(include: bool, names: HashSet<String>) -> AtRootQuery {
        AtRootQuery { include, names }
    }

    /// The query of a bare `@at-root`: `(without: rule)`.
    pub fn default_query() -> AtRootQuery {
        let mut names = HashSet::new();
        names.insert("rule".to_owned());
        AtRootQuery {
            include: false,
            names,
        }
    }

    fn all(&self) -> bool {
        self.names.contains("all")
    }

    pub fn excludes_name(&self, name: &str) -> bool {
        (self.all() || self.names.contains(name)) != self.include
    }

    pub fn excludes_style_rules(&self) -> bool {
        (self.all() || self.names.contains("rule")) != self.include
    }

    pub fn excludes_media(&self) -> bool {
        self.excludes_name("media")
    }

    /// Whether the given CSS node is excluded (escaped) by this query.
    pub fn excludes(&self, node: &CssNode) -> bool {
        use crate::css::NodeKind;

        match &node.borrow().kind {
            NodeKind::StyleRule { .. } | NodeKind::KeyframeBlock { .. } => {
                self.excludes_style_rules()
            }
            NodeKind::MediaRule { .. } => self.excludes_name("media"),
            NodeKind::SupportsRule { .. } => self.excludes_name("supports"),
            NodeKind::AtRule { name, .. } => self.excludes_name(&name.to_ascii_lowercase()),
            _ => false,
        }
    }
}

/// Parses an at-root query out of evaluated interpolation text.
pub fn parse_at_root_query(text: &str) -> Result<AtRootQuery, FormatError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);

    let token = parser.next().map(Token::clone);
    match token {
        Ok(Token::ParenthesisBlock) => {}
        _ => return Err(FormatError::new("expected \"(\".", 0, text.len())),
    }

    let inner: Result<AtRootQuery, cssparser::ParseError<'_, ()>> =
        parser.parse_nested_block(|input| {
            let token = input.next()?.clone();
            let include = match token {
                Token::Ident(word) if word.eq_ignore_ascii_case("with") => true,
                Token::Ident(word) if word.eq_ignore_ascii_case("without") => false,
                _ => return Err(input.new_error_for_next_token()),
            };

            let token = input.next()?.clone();
            match token {
                Token::Colon => {}
                _ => return Err(input.new_error_for_next_token()),
            }

            let mut names = HashSet::new();
            loop {
                let token = input.next().map(Token::clone);
                match token {
                    Ok(Token::Ident(name)) => {
                        names.insert(name.as_ref().to_ascii_lowercase());
                    }
                    _ => break,
                }
            }
            if names.is_empty() {
                return Err(input.new_error_for_next_token());
            }

            Ok(AtRootQuery::new(include, names))
        });

    let query =
        inner.map_err(|_| FormatError::new("Invalid at-root query.", 0, text.len()))?;

    if parser.next().is_ok() {
        return Err(FormatError::new("expected nothing.", 0, text.len()));
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excludes_only_style_rules() {
        let q = AtRootQuery::default_query();
        assert!(q.excludes_style_rules());
        assert!(!q.excludes_media());
    }

    #[test]
    fn without_media() {
        let q = parse_at_root_query("(without: media)").unwrap();
        assert!(q.excludes_media());
        assert!(!q.excludes_style_rules());
    }

    #[test]
    fn without_all() {
        let q = parse_at_root_query("(without: all)").unwrap();
        assert!(q.excludes_media());
        assert!(q.excludes_style_rules());
        assert!(q.excludes_name("supports"));
    }

    #[test]
    fn with_rule_keeps_style_rules() {
        let q = parse_at_root_query("(with: rule)").unwrap();
        assert!(!q.excludes_style_rules());
        // everything not named is excluded
        assert!(q.excludes_media());
    }

    #[test]
    fn rejects_malformed_queries() {
        assert!(parse_at_root_query("media").is_err());
        assert!(parse_at_root_query("(media)").is_err());
        assert!(parse_at_root_query("(with:)").is_err());
    }
}
