//! Argument declarations (at definition sites) and invocations (at call
//! sites).

use codemap::Span;

use crate::ast::Expr;
use crate::error::ScriptError;

/// One declared parameter of a mixin or function.
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    pub default: Option<Expr>,
    pub span: Span,
}

/// The parameter list of a mixin, function or content block.
#[derive(Debug, Clone)]
pub struct ArgumentDeclaration {
    pub arguments: Vec<Argument>,
    /// Name of the trailing `$args...` parameter, if declared.
    pub rest: Option<String>,
    pub span: Span,
}

impl ArgumentDeclaration {
    pub fn empty(span: Span) -> ArgumentDeclaration {
        ArgumentDeclaration {
            arguments: Vec::new(),
            rest: None,
            span,
        }
    }

    /// Checks an invocation's shape against this declaration, before any
    /// values are bound.
    pub fn verify(&self, positional: usize, names: &[String]) -> Result<(), ScriptError> {
        let mut named_used = 0;

        for (i, argument) in self.arguments.iter().enumerate() {
            if i < positional {
                if names.iter().any(|n| *n == argument.name) {
                    return Err(ScriptError::new(format!(
                        "Argument ${} was passed both by position and by name.",
                        argument.name
                    )));
                }
            } else if names.iter().any(|n| *n == argument.name) {
                named_used += 1;
            } else if argument.default.is_none() {
                return Err(ScriptError::new(format!(
                    "Missing argument ${}.",
                    argument.name
                )));
            }
        }

        if self.rest.is_some() {
            return Ok(());
        }

        if positional > self.arguments.len() {
            return Err(ScriptError::new(format!(
                "Only {} {} allowed, but {} {} passed.",
                self.arguments.len(),
                if self.arguments.len() == 1 {
                    "argument"
                } else {
                    "arguments"
                },
                positional,
                if positional == 1 { "was" } else { "were" }
            )));
        }

        if named_used < names.len() {
            let unknown = names
                .iter()
                .find(|n| !self.arguments.iter().any(|a| a.name == **n))
                .expect("at least one name is unknown when named_used < names.len()");
            return Err(ScriptError::new(format!(
                "No argument named ${}.",
                unknown
            )));
        }

        Ok(())
    }
}

/// The arguments written at a call site.
///
/// `named` preserves source order.  `rest` and `keyword_rest` are the
/// `$list...` / `$map...` spread arguments.
#[derive(Debug, Clone)]
pub struct ArgumentInvocation {
    pub positional: Vec<Expr>,
    pub named: Vec<(String, Expr)>,
    pub rest: Option<Box<Expr>>,
    pub keyword_rest: Option<Box<Expr>>,
    pub span: Span,
}

impl ArgumentInvocation {
    pub fn empty(span: Span) -> ArgumentInvocation {
        ArgumentInvocation {
            positional: Vec::new(),
            named: Vec::new(),
            rest: None,
            keyword_rest: None,
            span,
        }
    }

    pub fn positional(positional: Vec<Expr>, span: Span) -> ArgumentInvocation {
        ArgumentInvocation {
            positional,
            named: Vec::new(),
            rest: None,
            keyword_rest: None,
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
            && self.named.is_empty()
            && self.rest.is_none()
            && self.keyword_rest.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        let mut map = codemap::CodeMap::new();
        map.add_file("t.scss".into(), "x".into()).span
    }

    fn decl(names: &[(&str, bool)], rest: Option<&str>) -> ArgumentDeclaration {
        ArgumentDeclaration {
            arguments: names
                .iter()
                .map(|(name, has_default)| Argument {
                    name: (*name).to_owned(),
                    default: if *has_default {
                        Some(Expr::Null { span: span() })
                    } else {
                        None
                    },
                    span: span(),
                })
                .collect(),
            rest: rest.map(str::to_owned),
            span: span(),
        }
    }

    #[test]
    fn missing_required_argument() {
        let d = decl(&[("a", false)], None);
        let err = d.verify(0, &[]).unwrap_err();
        assert_eq!(err.to_string(), "Missing argument $a.");
    }

    #[test]
    fn too_many_positional() {
        let d = decl(&[("a", false)], None);
        assert!(d.verify(2, &[]).is_err());
        // a rest parameter absorbs the extras
        let d = decl(&[("a", false)], Some("rest"));
        assert!(d.verify(2, &[]).is_ok());
    }

    #[test]
    fn unknown_name_is_reported() {
        let d = decl(&[("a", true)], None);
        let err = d.verify(0, &["b".to_owned()]).unwrap_err();
        assert_eq!(err.to_string(), "No argument named $b.");
    }

    #[test]
    fn duplicate_position_and_name() {
        let d = decl(&[("a", false)], None);
        let err = d.verify(1, &["a".to_owned()]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument $a was passed both by position and by name."
        );
    }
}
