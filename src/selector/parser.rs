//! Re-parsing selectors out of evaluated interpolation text.
//!
//! Selectors that reach the evaluator are plain strings (the result of
//! evaluating an interpolation), so they are re-parsed here, using
//! `cssparser` as the tokenizer.  Parse failures are reported as
//! [`FormatError`]s carrying byte offsets into the re-parsed text; the
//! evaluator splices those back into the interpolation's span.

use cssparser::{Parser, ParserInput, Token};

use crate::error::FormatError;
use crate::selector::{
    Combinator, ComplexComponent, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector,
};

/// Parses a comma-separated selector list.
///
/// `allow_parent` controls whether an explicit `&` is accepted; it is not,
/// for example, in `@extend` targets or at the top level of `@at-root`.
pub fn parse_selector_list(text: &str, allow_parent: bool) -> Result<SelectorList, FormatError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);

    let mut complexes = Vec::new();
    let mut components: Vec<ComplexComponent> = Vec::new();
    let mut compound: Vec<SimpleSelector> = Vec::new();

    fn flush_compound(
        compound: &mut Vec<SimpleSelector>,
        components: &mut Vec<ComplexComponent>,
    ) {
        if !compound.is_empty() {
            components.push(ComplexComponent::Compound(CompoundSelector::new(
                std::mem::take(compound),
            )));
        }
    }

    loop {
        let start = parser.position().byte_index();
        let state = parser.state();
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) => {
                flush_compound(&mut compound, &mut components);
            }
            Token::Comma => {
                flush_compound(&mut compound, &mut components);
                complexes.push(finish_complex(components, start, text)?);
                components = Vec::new();
            }
            Token::Delim('>') => {
                flush_compound(&mut compound, &mut components);
                components.push(ComplexComponent::Combinator(Combinator::Child));
            }
            Token::Delim('+') => {
                flush_compound(&mut compound, &mut components);
                components.push(ComplexComponent::Combinator(Combinator::NextSibling));
            }
            Token::Delim('~') => {
                flush_compound(&mut compound, &mut components);
                components.push(ComplexComponent::Combinator(Combinator::FollowingSibling));
            }
            _ => {
                parser.reset(&state);
                compound.push(parse_simple(&mut parser, allow_parent)?);
            }
        }
    }

    flush_compound(&mut compound, &mut components);
    // a trailing comma leaves an empty complex, which is an error too
    let end = text.len();
    complexes.push(finish_complex(components, end, text)?);

    Ok(SelectorList::new(complexes))
}

fn finish_complex(
    components: Vec<ComplexComponent>,
    offset: usize,
    text: &str,
) -> Result<ComplexSelector, FormatError> {
    if components.is_empty()
        || matches!(components.last(), Some(ComplexComponent::Combinator(_)))
    {
        return Err(FormatError::new(
            "expected selector.",
            offset.min(text.len()),
            text.len(),
        ));
    }
    Ok(ComplexSelector::new(components))
}

fn parse_simple(
    parser: &mut Parser<'_, '_>,
    allow_parent: bool,
) -> Result<SimpleSelector, FormatError> {
    let start = parser.position().byte_index();

    let token = match parser.next_including_whitespace() {
        Ok(token) => token.clone(),
        Err(_) => {
            return Err(FormatError::new("expected selector.", start, start));
        }
    };

    match token {
        Token::Ident(name) => Ok(SimpleSelector::Type(name.as_ref().to_owned())),
        Token::Delim('*') => Ok(SimpleSelector::Universal),
        Token::IDHash(name) => Ok(SimpleSelector::Id(name.as_ref().to_owned())),
        Token::Delim('.') => {
            let next = parser.next_including_whitespace().map(Token::clone);
            match next {
                Ok(Token::Ident(name)) => Ok(SimpleSelector::Class(name.as_ref().to_owned())),
                _ => Err(unexpected(parser, start, "Expected identifier.")),
            }
        }
        Token::Delim('%') => {
            let next = parser.next_including_whitespace().map(Token::clone);
            match next {
                Ok(Token::Ident(name)) => {
                    Ok(SimpleSelector::Placeholder(name.as_ref().to_owned()))
                }
                _ => Err(unexpected(parser, start, "Expected identifier.")),
            }
        }
        Token::Delim('&') => {
            if !allow_parent {
                return Err(unexpected(
                    parser,
                    start,
                    "Parent selectors aren't allowed here.",
                ));
            }
            let state = parser.state();
            let next = parser.next_including_whitespace().map(Token::clone);
            match next {
                Ok(Token::Ident(name)) => Ok(SimpleSelector::Parent {
                    suffix: Some(name.as_ref().to_owned()),
                }),
                _ => {
                    parser.reset(&state);
                    Ok(SimpleSelector::Parent { suffix: None })
                }
            }
        }
        Token::Colon => {
            let mut element = false;
            let state = parser.state();
            let next = parser.next_including_whitespace().map(Token::clone);
            match next {
                Ok(Token::Colon) => element = true,
                _ => parser.reset(&state),
            }
            let next = parser.next_including_whitespace().map(Token::clone);
            match next {
                Ok(Token::Ident(name)) => Ok(SimpleSelector::Pseudo {
                    name: name.as_ref().to_owned(),
                    element,
                    argument: None,
                }),
                Ok(Token::Function(name)) => {
                    let name = name.as_ref().to_owned();
                    let argument = parse_raw_block(parser, start)?;
                    Ok(SimpleSelector::Pseudo {
                        name,
                        element,
                        argument: Some(argument),
                    })
                }
                _ => Err(unexpected(parser, start, "Expected identifier.")),
            }
        }
        Token::SquareBracketBlock => parse_attribute(parser, start),
        _ => Err(unexpected(parser, start, "expected selector.")),
    }
}

fn parse_attribute(
    parser: &mut Parser<'_, '_>,
    start: usize,
) -> Result<SimpleSelector, FormatError> {
    parser
        .parse_nested_block::<_, _, ()>(|input| {
            let token = input.next()?.clone();
            let name = match token {
                Token::Ident(name) => name.as_ref().to_owned(),
                _ => return Err(input.new_error_for_next_token()),
            };

            let token = input.next().map(Token::clone);
            let op = match token {
                Err(_) => {
                    return Ok(SimpleSelector::Attribute {
                        name,
                        op: None,
                        value: None,
                    })
                }
                Ok(Token::Delim('=')) => "=",
                Ok(Token::IncludeMatch) => "~=",
                Ok(Token::DashMatch) => "|=",
                Ok(Token::PrefixMatch) => "^=",
                Ok(Token::SuffixMatch) => "$=",
                Ok(Token::SubstringMatch) => "*=",
                Ok(_) => return Err(input.new_error_for_next_token()),
            };

            let token = input.next()?.clone();
            let mut value = match token {
                Token::Ident(v) => v.as_ref().to_owned(),
                Token::QuotedString(v) => format!("\"{}\"", v.as_ref()),
                _ => return Err(input.new_error_for_next_token()),
            };

            // case-sensitivity modifier: [a=b i]
            let token = input.next().map(Token::clone);
            if let Ok(Token::Ident(modifier)) = token {
                value.push(' ');
                value.push_str(modifier.as_ref());
            }

            Ok(SimpleSelector::Attribute {
                name,
                op: Some(op.to_owned()),
                value: Some(value),
            })
        })
        .map_err(|_| FormatError::new("invalid attribute selector.", start, start + 1))
}

/// Collects the raw text of a parenthesized block, preserving nested
/// blocks, for pseudo-selector arguments.
fn parse_raw_block(parser: &mut Parser<'_, '_>, start: usize) -> Result<String, FormatError> {
    parser
        .parse_nested_block::<_, _, ()>(raw_tokens)
        .map_err(|_| FormatError::new("invalid pseudo-selector argument.", start, start + 1))
}

/// Collects the raw text of the rest of the current input, preserving
/// nested blocks.  Shared with the media-query and at-root query parsers.
pub(crate) fn raw_tokens<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<String, cssparser::ParseError<'i, ()>> {
    use cssparser::ToCss;

    let mut out = String::new();
    loop {
        let token = match input.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::WhiteSpace(_) => out.push(' '),
            Token::Function(ref name) => {
                out.push_str(name.as_ref());
                out.push('(');
                out.push_str(&input.parse_nested_block(raw_tokens)?);
                out.push(')');
            }
            Token::ParenthesisBlock => {
                out.push('(');
                out.push_str(&input.parse_nested_block(raw_tokens)?);
                out.push(')');
            }
            Token::SquareBracketBlock => {
                out.push('[');
                out.push_str(&input.parse_nested_block(raw_tokens)?);
                out.push(']');
            }
            Token::CurlyBracketBlock => {
                out.push('{');
                out.push_str(&input.parse_nested_block(raw_tokens)?);
                out.push('}');
            }
            ref token => {
                // writing to a String cannot fail
                let _ = token.to_css(&mut out);
            }
        }
    }
    Ok(out)
}

fn unexpected(parser: &Parser<'_, '_>, start: usize, message: &str) -> FormatError {
    let end = parser.position().byte_index();
    FormatError::new(message, start, end.max(start))
}

/// Parses the selector of a keyframe block: `from`, `to`, or percentages,
/// comma-separated.
pub fn parse_keyframe_selectors(text: &str) -> Result<Vec<String>, FormatError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);

    let mut selectors = Vec::new();
    let mut expect_selector = true;

    loop {
        let start = parser.position().byte_index();
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Ident(name) if expect_selector => {
                let name = name.as_ref();
                if name.eq_ignore_ascii_case("from") || name.eq_ignore_ascii_case("to") {
                    selectors.push(name.to_ascii_lowercase());
                } else {
                    return Err(FormatError::new(
                        "Expected \"to\" or \"from\".",
                        start,
                        parser.position().byte_index(),
                    ));
                }
                expect_selector = false;
            }
            Token::Percentage { unit_value, .. } if expect_selector => {
                selectors.push(format!(
                    "{}%",
                    crate::value::number::format_double(f64::from(unit_value) * 100.0)
                ));
                expect_selector = false;
            }
            Token::Comma if !expect_selector => expect_selector = true,
            _ => {
                return Err(FormatError::new(
                    "Expected keyframe selector.",
                    start,
                    parser.position().byte_index(),
                ));
            }
        }
    }

    if expect_selector {
        return Err(FormatError::new(
            "Expected keyframe selector.",
            text.len(),
            text.len(),
        ));
    }

    Ok(selectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SelectorList {
        parse_selector_list(text, true).unwrap()
    }

    #[test]
    fn parses_compounds_and_combinators() {
        assert_eq!(parse("a.foo > #bar").to_string(), "a.foo > #bar");
        assert_eq!(parse("a b").to_string(), "a b");
        assert_eq!(parse("a + b ~ c").to_string(), "a + b ~ c");
    }

    #[test]
    fn parses_lists() {
        let list = parse("a, .b,  %c");
        assert_eq!(list.components.len(), 3);
        assert_eq!(list.to_string(), "a, .b, %c");
    }

    #[test]
    fn parses_parent_with_suffix() {
        let list = parse("&-item:hover");
        assert_eq!(list.to_string(), "&-item:hover");
    }

    #[test]
    fn parent_can_be_forbidden() {
        assert!(parse_selector_list("& a", false).is_err());
    }

    #[test]
    fn parses_pseudo_arguments_raw() {
        let list = parse("a:not(.b > .c)::before");
        assert_eq!(list.to_string(), "a:not(.b > .c)::before");
    }

    #[test]
    fn parses_attributes() {
        assert_eq!(parse("[href]").to_string(), "[href]");
        assert_eq!(parse("[href^=\"http\"]").to_string(), "[href^=\"http\"]");
    }

    #[test]
    fn rejects_empty_selector() {
        assert!(parse_selector_list("", true).is_err());
        assert!(parse_selector_list("a, , b", true).is_err());
        assert!(parse_selector_list("a >", true).is_err());
    }

    #[test]
    fn keyframe_selectors() {
        assert_eq!(
            parse_keyframe_selectors("from, 50%, to").unwrap(),
            vec!["from", "50%", "to"]
        );
        assert!(parse_keyframe_selectors(".a").is_err());
    }
}
