//! Representation of Sass selectors.
//!
//! # Terminology
//!
//! Consider a selector like this:
//!
//! ```css
//! a > b.foo, #bar %baz
//! ```
//!
//! The whole thing is a **selector list** with two **complex selectors**,
//! `a > b.foo` and `#bar %baz`.  A complex selector is a sequence of
//! **compound selectors** joined by **combinators** (`>`, `+`, `~`, or
//! descendant, which is implied by adjacency).  A compound selector such as
//! `b.foo` is an unseparated run of **simple selectors** (`b` and `.foo`).
//!
//! Sass adds two simple selectors to CSS: the placeholder (`%baz`), which
//! is never emitted and exists to be extended, and the parent reference
//! (`&`), which is substituted with the enclosing style rule's selector
//! during evaluation.
//!
//! The types here are the structural AST the extender rewrites; they are
//! re-parsed from interpolated text by [`parser`](crate::selector::parser)
//! and resolved against the enclosing rule by
//! [`resolve`](crate::selector::resolve).

use std::fmt;

pub mod parser;
pub mod resolve;

/// A comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorList {
    pub components: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn new(components: Vec<ComplexSelector>) -> SelectorList {
        SelectorList { components }
    }

    /// True when no complex selector in this list would be emitted, i.e.
    /// every one involves a placeholder.
    pub fn is_invisible(&self) -> bool {
        self.components.iter().all(ComplexSelector::is_invisible)
    }

    pub fn contains_parent(&self) -> bool {
        self.components.iter().any(ComplexSelector::contains_parent)
    }

    /// All simple selectors anywhere in the list.
    pub fn simple_selectors(&self) -> impl Iterator<Item = &SimpleSelector> {
        self.components.iter().flat_map(|complex| {
            complex.components.iter().filter_map(|c| match c {
                ComplexComponent::Compound(compound) => Some(&compound.components),
                ComplexComponent::Combinator(_) => None,
            })
        })
        .flatten()
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, complex) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", complex)?;
        }
        Ok(())
    }
}

/// A combinator-joined sequence of compound selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComplexSelector {
    pub components: Vec<ComplexComponent>,
}

impl ComplexSelector {
    pub fn new(components: Vec<ComplexComponent>) -> ComplexSelector {
        ComplexSelector { components }
    }

    /// A complex selector with a single compound.
    pub fn from_compound(compound: CompoundSelector) -> ComplexSelector {
        ComplexSelector {
            components: vec![ComplexComponent::Compound(compound)],
        }
    }

    pub fn is_invisible(&self) -> bool {
        self.components.iter().any(|c| match c {
            ComplexComponent::Compound(compound) => compound
                .components
                .iter()
                .any(|s| matches!(s, SimpleSelector::Placeholder(_))),
            ComplexComponent::Combinator(_) => false,
        })
    }

    pub fn contains_parent(&self) -> bool {
        self.components.iter().any(|c| match c {
            ComplexComponent::Compound(compound) => compound
                .components
                .iter()
                .any(|s| matches!(s, SimpleSelector::Parent { .. })),
            ComplexComponent::Combinator(_) => false,
        })
    }

    pub fn last_compound(&self) -> Option<&CompoundSelector> {
        self.components.iter().rev().find_map(|c| match c {
            ComplexComponent::Compound(compound) => Some(compound),
            ComplexComponent::Combinator(_) => None,
        })
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match component {
                ComplexComponent::Compound(compound) => write!(f, "{}", compound)?,
                ComplexComponent::Combinator(combinator) => write!(f, "{}", combinator)?,
            }
        }
        Ok(())
    }
}

/// One element of a complex selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComplexComponent {
    Combinator(Combinator),
    Compound(CompoundSelector),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// `>`
    Child,
    /// `+`
    NextSibling,
    /// `~`
    FollowingSibling,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Child => write!(f, ">"),
            Combinator::NextSibling => write!(f, "+"),
            Combinator::FollowingSibling => write!(f, "~"),
        }
    }
}

/// An unseparated run of simple selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundSelector {
    pub components: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn new(components: Vec<SimpleSelector>) -> CompoundSelector {
        CompoundSelector { components }
    }

    pub fn single(simple: SimpleSelector) -> CompoundSelector {
        CompoundSelector {
            components: vec![simple],
        }
    }

    pub fn contains(&self, simple: &SimpleSelector) -> bool {
        self.components.iter().any(|s| s == simple)
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for simple in &self.components {
            write!(f, "{}", simple)?;
        }
        Ok(())
    }
}

/// A simple selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    /// `%name`; never emitted, exists to be extended.
    Placeholder(String),
    Attribute {
        name: String,
        /// `=`, `~=`, `|=`, `^=`, `$=`, `*=`; `None` for bare `[attr]`.
        op: Option<String>,
        value: Option<String>,
    },
    /// `:hover`, `::before`, `:not(...)`.  The argument is kept as raw
    /// text; the extender treats pseudo-selectors atomically.
    Pseudo {
        name: String,
        element: bool,
        argument: Option<String>,
    },
    /// `&` in a parsed selector, with an optional trailing suffix
    /// (`&-item`).
    Parent { suffix: Option<String> },
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Universal => write!(f, "*"),
            SimpleSelector::Type(name) => write!(f, "{}", name),
            SimpleSelector::Id(name) => write!(f, "#{}", name),
            SimpleSelector::Class(name) => write!(f, ".{}", name),
            SimpleSelector::Placeholder(name) => write!(f, "%{}", name),
            SimpleSelector::Attribute { name, op, value } => {
                write!(f, "[{}", name)?;
                if let (Some(op), Some(value)) = (op, value) {
                    write!(f, "{}{}", op, value)?;
                }
                write!(f, "]")
            }
            SimpleSelector::Pseudo {
                name,
                element,
                argument,
            } => {
                write!(f, "{}{}", if *element { "::" } else { ":" }, name)?;
                if let Some(argument) = argument {
                    write!(f, "({})", argument)?;
                }
                Ok(())
            }
            SimpleSelector::Parent { suffix } => {
                write!(f, "&")?;
                if let Some(suffix) = suffix {
                    write!(f, "{}", suffix)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trip() {
        let list = SelectorList::new(vec![ComplexSelector::new(vec![
            ComplexComponent::Compound(CompoundSelector::new(vec![
                SimpleSelector::Type("a".into()),
                SimpleSelector::Class("foo".into()),
            ])),
            ComplexComponent::Combinator(Combinator::Child),
            ComplexComponent::Compound(CompoundSelector::single(SimpleSelector::Id(
                "bar".into(),
            ))),
        ])]);
        assert_eq!(list.to_string(), "a.foo > #bar");
    }

    #[test]
    fn placeholder_is_invisible() {
        let list = SelectorList::new(vec![ComplexSelector::from_compound(
            CompoundSelector::single(SimpleSelector::Placeholder("base".into())),
        )]);
        assert!(list.is_invisible());

        let mixed = SelectorList::new(vec![
            ComplexSelector::from_compound(CompoundSelector::single(SimpleSelector::Placeholder(
                "base".into(),
            ))),
            ComplexSelector::from_compound(CompoundSelector::single(SimpleSelector::Class(
                "a".into(),
            ))),
        ]);
        assert!(!mixed.is_invisible());
    }
}
