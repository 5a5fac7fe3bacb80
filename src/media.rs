//! Media queries and their intersection.
//!
//! Nested `@media` rules merge with the queries of their surrounding rules:
//! `@media screen { @media (min-width: 1px) { ... } }` becomes
//! `@media screen and (min-width: 1px)`.  The merge can succeed, prove the
//! intersection empty (the block is dropped), or be unrepresentable in CSS
//! (the inner query nests verbatim instead).

use std::fmt;

use cssparser::{Parser, ParserInput, Token};

use crate::error::FormatError;
use crate::selector::parser::raw_tokens;

/// A single media query: `[modifier] [type] [and (feature)]*`.
///
/// Features are kept as raw `(...)` condition text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    pub modifier: Option<String>,
    pub media_type: Option<String>,
    pub features: Vec<String>,
}

/// The outcome of intersecting two media queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaQueryMergeResult {
    /// The intersection matches nothing; drop the block.
    Empty,
    /// The intersection exists but CSS cannot express it; nest instead.
    Unrepresentable,
    Merged(MediaQuery),
}

impl MediaQuery {
    /// A query with conditions only, like `(min-width: 1px)`.
    pub fn condition(features: Vec<String>) -> MediaQuery {
        MediaQuery {
            modifier: None,
            media_type: None,
            features,
        }
    }

    pub fn media_type(
        media_type: impl Into<String>,
        modifier: Option<String>,
        features: Vec<String>,
    ) -> MediaQuery {
        MediaQuery {
            modifier,
            media_type: Some(media_type.into()),
            features,
        }
    }

    fn matches_all_types(&self) -> bool {
        match &self.media_type {
            None => true,
            Some(t) => t.eq_ignore_ascii_case("all"),
        }
    }

    fn modifier_lower(&self) -> Option<String> {
        self.modifier.as_ref().map(|m| m.to_ascii_lowercase())
    }

    fn type_lower(&self) -> Option<String> {
        self.media_type.as_ref().map(|t| t.to_ascii_lowercase())
    }

    /// Intersects this query with `other`.
    pub fn merge(&self, other: &MediaQuery) -> MediaQueryMergeResult {
        let our_modifier = self.modifier_lower();
        let our_type = self.type_lower();
        let their_modifier = other.modifier_lower();
        let their_type = other.type_lower();

        if our_type.is_none() && their_type.is_none() {
            return MediaQueryMergeResult::Merged(MediaQuery::condition(
                [self.features.clone(), other.features.clone()].concat(),
            ));
        }

        let ours_negated = our_modifier.as_deref() == Some("not");
        let theirs_negated = their_modifier.as_deref() == Some("not");

        let (modifier, media_type, features);
        if ours_negated != theirs_negated {
            if our_type == their_type {
                let (negative, positive) = if ours_negated {
                    (&self.features, &other.features)
                } else {
                    (&other.features, &self.features)
                };

                // If the negated features are a subset of the positive ones
                // the queries exclude each other; otherwise the result
                // can't be written as one query.
                return if negative.iter().all(|f| positive.contains(f)) {
                    MediaQueryMergeResult::Empty
                } else {
                    MediaQueryMergeResult::Unrepresentable
                };
            } else if self.matches_all_types() || other.matches_all_types() {
                return MediaQueryMergeResult::Unrepresentable;
            }

            if ours_negated {
                modifier = their_modifier;
                media_type = their_type;
                features = other.features.clone();
            } else {
                modifier = our_modifier;
                media_type = our_type;
                features = self.features.clone();
            }
        } else if ours_negated {
            // both negated; "neither screen nor print" has no CSS form
            if our_type != their_type {
                return MediaQueryMergeResult::Unrepresentable;
            }

            let (more, fewer) = if self.features.len() > other.features.len() {
                (&self.features, &other.features)
            } else {
                (&other.features, &self.features)
            };

            // a superset of features is strictly narrower under "not"
            if fewer.iter().all(|f| more.contains(f)) {
                modifier = our_modifier;
                media_type = our_type;
                features = more.clone();
            } else {
                return MediaQueryMergeResult::Unrepresentable;
            }
        } else if self.matches_all_types() {
            modifier = their_modifier;
            // omit "all" if either side did
            media_type = if other.matches_all_types() && our_type.is_none() {
                None
            } else {
                their_type
            };
            features = [self.features.clone(), other.features.clone()].concat();
        } else if other.matches_all_types() {
            modifier = our_modifier;
            media_type = our_type;
            features = [self.features.clone(), other.features.clone()].concat();
        } else if our_type != their_type {
            return MediaQueryMergeResult::Empty;
        } else {
            modifier = our_modifier.or(their_modifier);
            media_type = our_type;
            features = [self.features.clone(), other.features.clone()].concat();
        }

        MediaQueryMergeResult::Merged(MediaQuery {
            modifier,
            media_type,
            features,
        })
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(modifier) = &self.modifier {
            write!(f, "{} ", modifier)?;
        }
        if let Some(media_type) = &self.media_type {
            write!(f, "{}", media_type)?;
            wrote = true;
        }
        for feature in &self.features {
            if wrote {
                write!(f, " and ")?;
            }
            write!(f, "{}", feature)?;
            wrote = true;
        }
        Ok(())
    }
}

/// Parses a comma-separated media query list out of evaluated interpolation
/// text.
pub fn parse_media_query_list(text: &str) -> Result<Vec<MediaQuery>, FormatError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);

    let mut queries = Vec::new();
    loop {
        queries.push(parse_media_query(&mut parser, text)?);
        let token = parser.next().map(Token::clone);
        match token {
            Ok(Token::Comma) => continue,
            Ok(_) => {
                let pos = parser.position().byte_index();
                return Err(FormatError::new("expected \",\".", pos, text.len()));
            }
            Err(_) => break,
        }
    }
    Ok(queries)
}

fn parse_media_query(
    parser: &mut Parser<'_, '_>,
    text: &str,
) -> Result<MediaQuery, FormatError> {
    let mut modifier = None;
    let mut media_type = None;
    let mut features = Vec::new();

    let start = parser.position().byte_index();
    let state = parser.state();
    let token = parser.next().map(Token::clone);
    match token {
        Ok(Token::Ident(word)) => {
            let word = word.as_ref().to_owned();
            if word.eq_ignore_ascii_case("not") || word.eq_ignore_ascii_case("only") {
                modifier = Some(word);
                let token = parser.next().map(Token::clone);
                match token {
                    Ok(Token::Ident(ty)) => media_type = Some(ty.as_ref().to_owned()),
                    _ => {
                        return Err(FormatError::new(
                            "Expected identifier.",
                            start,
                            parser.position().byte_index(),
                        ))
                    }
                }
            } else {
                media_type = Some(word);
            }
        }
        Ok(Token::ParenthesisBlock) => {
            parser.reset(&state);
        }
        _ => {
            return Err(FormatError::new(
                "expected media query.",
                start,
                parser.position().byte_index(),
            ))
        }
    }

    // `and`-separated feature conditions
    loop {
        let state = parser.state();
        let token = parser.next().map(Token::clone);
        match token {
            Ok(Token::Ident(word)) if word.eq_ignore_ascii_case("and") => {
                features.push(parse_feature(parser, text)?);
            }
            Ok(Token::ParenthesisBlock) if media_type.is_none() && features.is_empty() => {
                parser.reset(&state);
                features.push(parse_feature(parser, text)?);
            }
            _ => {
                parser.reset(&state);
                break;
            }
        }
    }

    if media_type.is_none() && features.is_empty() {
        return Err(FormatError::new("expected media query.", start, text.len()));
    }

    Ok(MediaQuery {
        modifier,
        media_type,
        features,
    })
}

fn parse_feature(parser: &mut Parser<'_, '_>, text: &str) -> Result<String, FormatError> {
    let start = parser.position().byte_index();
    let token = parser.next().map(Token::clone);
    match token {
        Ok(Token::ParenthesisBlock) => parser
            .parse_nested_block::<_, _, ()>(raw_tokens)
            .map(|inner| format!("({})", inner.trim()))
            .map_err(|_| FormatError::new("invalid media feature.", start, text.len())),
        _ => Err(FormatError::new(
            "expected \"(\".",
            start,
            parser.position().byte_index(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(text: &str) -> MediaQuery {
        let queries = parse_media_query_list(text).unwrap();
        assert_eq!(queries.len(), 1);
        queries.into_iter().next().unwrap()
    }

    #[test]
    fn parses_types_modifiers_and_features() {
        assert_eq!(query("screen").to_string(), "screen");
        assert_eq!(query("only screen").to_string(), "only screen");
        assert_eq!(
            query("screen and (min-width: 1px)").to_string(),
            "screen and (min-width: 1px)"
        );
        assert_eq!(query("(color)").to_string(), "(color)");
        assert_eq!(
            query("(min-width: 1px) and (color)").to_string(),
            "(min-width: 1px) and (color)"
        );
    }

    #[test]
    fn parses_lists() {
        let queries = parse_media_query_list("screen, print").unwrap();
        assert_eq!(queries.len(), 2);
    }

    #[test]
    fn merge_type_with_condition() {
        let merged = query("screen").merge(&query("(min-width: 1px)"));
        assert_eq!(
            merged,
            MediaQueryMergeResult::Merged(query("screen and (min-width: 1px)"))
        );
    }

    #[test]
    fn merge_disjoint_types_is_empty() {
        assert_eq!(
            query("screen").merge(&query("print")),
            MediaQueryMergeResult::Empty
        );
    }

    #[test]
    fn merge_conditions_concatenates() {
        assert_eq!(
            query("(a: 1)").merge(&query("(b: 2)")),
            MediaQueryMergeResult::Merged(query("(a: 1) and (b: 2)"))
        );
    }

    #[test]
    fn merge_not_against_plain_type() {
        assert_eq!(
            query("not screen and (color)").merge(&query("screen and (color)")),
            MediaQueryMergeResult::Empty
        );
        assert_eq!(
            query("not screen and (color)").merge(&query("screen and (grid)")),
            MediaQueryMergeResult::Unrepresentable
        );
    }

    #[test]
    fn merge_both_negated() {
        assert_eq!(
            query("not screen").merge(&query("not print")),
            MediaQueryMergeResult::Unrepresentable
        );
        assert_eq!(
            query("not screen and (color)").merge(&query("not screen")),
            MediaQueryMergeResult::Merged(query("not screen and (color)"))
        );
    }
}
