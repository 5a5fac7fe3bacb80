//! The SassScript value model.
//!
//! [`Value`] is the dynamic value type the evaluator computes with.  Values
//! are immutable once constructed; the single exception is the
//! keyword-access flag on [`ArgList`], which records whether a callee ever
//! looked at `$kwargs` so the evaluator can reject unknown named arguments
//! afterwards.
//!
//! Operator semantics live in [`ops`]; numbers with their unit algebra in
//! [`number`]; colors in [`color`]; maps in [`map`].

use std::cell::Cell;
use std::rc::Rc;

use itertools::Itertools;

use crate::callable::SassFunction;
use crate::error::ScriptError;

pub mod color;
pub mod map;
pub mod number;
pub mod ops;
pub mod units;

pub use color::SassColor;
pub use map::SassMap;
pub use number::SassNumber;

/// How a Sass list separates its elements when serialized.
///
/// `Undecided` is the separator of empty and single-element literals; it
/// serializes like a space but unifies with either separator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ListSeparator {
    Space,
    Comma,
    Undecided,
}

impl ListSeparator {
    pub fn separator_text(self) -> &'static str {
        match self {
            ListSeparator::Comma => ", ",
            ListSeparator::Space | ListSeparator::Undecided => " ",
        }
    }
}

/// A quoted or unquoted Sass string.  Equality ignores quoting.
#[derive(Debug, Clone)]
pub struct SassString {
    pub text: String,
    pub quoted: bool,
}

impl SassString {
    pub fn quoted(text: impl Into<String>) -> SassString {
        SassString {
            text: text.into(),
            quoted: true,
        }
    }

    pub fn unquoted(text: impl Into<String>) -> SassString {
        SassString {
            text: text.into(),
            quoted: false,
        }
    }
}

/// An argument list: the value bound to a rest argument.
///
/// Behaves like a list of the positional arguments; the keyword arguments
/// ride along and remember whether anybody asked for them.
#[derive(Debug, Clone)]
pub struct ArgList {
    pub elements: Vec<Value>,
    keywords: Vec<(String, Value)>,
    pub separator: ListSeparator,
    accessed: Rc<Cell<bool>>,
}

impl ArgList {
    pub fn new(
        elements: Vec<Value>,
        keywords: Vec<(String, Value)>,
        separator: ListSeparator,
    ) -> ArgList {
        ArgList {
            elements,
            keywords,
            separator,
            accessed: Rc::new(Cell::new(false)),
        }
    }

    /// The keyword arguments, in invocation order.  Reading them marks them
    /// as observed.
    pub fn keywords(&self) -> &[(String, Value)] {
        self.accessed.set(true);
        &self.keywords
    }

    pub fn were_keywords_accessed(&self) -> bool {
        self.accessed.get()
    }
}

/// A SassScript value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(SassNumber),
    Color(SassColor),
    String(SassString),
    List {
        elements: Vec<Value>,
        separator: ListSeparator,
        bracketed: bool,
    },
    Map(SassMap),
    Function(SassFunction),
    ArgList(ArgList),
}

impl Value {
    pub fn quoted_string(text: impl Into<String>) -> Value {
        Value::String(SassString::quoted(text))
    }

    pub fn unquoted_string(text: impl Into<String>) -> Value {
        Value::String(SassString::unquoted(text))
    }

    pub fn space_list(elements: Vec<Value>) -> Value {
        Value::List {
            elements,
            separator: ListSeparator::Space,
            bracketed: false,
        }
    }

    pub fn comma_list(elements: Vec<Value>) -> Value {
        Value::List {
            elements,
            separator: ListSeparator::Comma,
            bracketed: false,
        }
    }

    #[cfg(test)]
    pub fn test_string(text: &str) -> Value {
        Value::unquoted_string(text)
    }

    /// Only `null` and `false` are falsey.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Whether this value is omitted when it appears as a declaration value
    /// or a list element.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => !s.quoted && s.text.is_empty(),
            Value::List { elements, .. } => elements.iter().all(Value::is_blank),
            Value::ArgList(args) => args.elements.iter().all(Value::is_blank),
            _ => false,
        }
    }

    pub fn is_empty_list(&self) -> bool {
        match self {
            Value::List { elements, .. } => elements.is_empty(),
            Value::ArgList(args) => args.elements.is_empty(),
            _ => false,
        }
    }

    /// Views this value as a list, per Sass indexing semantics.
    pub fn as_list(&self) -> Vec<Value> {
        match self {
            Value::List { elements, .. } => elements.clone(),
            Value::ArgList(args) => args.elements.clone(),
            Value::Map(map) => map.as_list(),
            other => vec![other.clone()],
        }
    }

    pub fn length_as_list(&self) -> usize {
        match self {
            Value::List { elements, .. } => elements.len(),
            Value::ArgList(args) => args.elements.len(),
            Value::Map(map) => map.len(),
            _ => 1,
        }
    }

    pub fn separator(&self) -> ListSeparator {
        match self {
            Value::List { separator, .. } => *separator,
            Value::ArgList(args) => args.separator,
            Value::Map(_) => ListSeparator::Comma,
            _ => ListSeparator::Undecided,
        }
    }

    /// Converts a Sass (1-based, negative-from-end) index into a Rust index.
    pub fn sass_index_to_list_index(&self, index: &Value) -> Result<usize, ScriptError> {
        let number = index.clone().assert_number(Some("n"))?;
        let i = number.assert_int()?;
        let len = self.length_as_list() as i64;
        if i == 0 {
            return Err(ScriptError::new("List index may not be 0."));
        }
        if i.abs() > len {
            return Err(ScriptError::new(format!(
                "Invalid index {} for a list with {} elements.",
                i, len
            )));
        }
        Ok(if i > 0 { i - 1 } else { len + i } as usize)
    }

    pub fn assert_number(self, name: Option<&str>) -> Result<SassNumber, ScriptError> {
        match self {
            Value::Number(n) => Ok(n),
            other => Err(other.wrong_type("number", name)),
        }
    }

    pub fn assert_string(self, name: Option<&str>) -> Result<SassString, ScriptError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.wrong_type("string", name)),
        }
    }

    pub fn assert_map(self, name: Option<&str>) -> Result<SassMap, ScriptError> {
        match self {
            Value::Map(m) => Ok(m),
            // an empty list is an empty map
            Value::List { ref elements, .. } if elements.is_empty() => Ok(SassMap::new()),
            other => Err(other.wrong_type("map", name)),
        }
    }

    pub fn assert_function(self, name: Option<&str>) -> Result<SassFunction, ScriptError> {
        match self {
            Value::Function(f) => Ok(f),
            other => Err(other.wrong_type("function reference", name)),
        }
    }

    pub fn assert_color(self, name: Option<&str>) -> Result<SassColor, ScriptError> {
        match self {
            Value::Color(c) => Ok(c),
            other => Err(other.wrong_type("color", name)),
        }
    }

    fn wrong_type(&self, ty: &str, name: Option<&str>) -> ScriptError {
        match name {
            Some(n) => ScriptError::new(format!("${}: {} is not a {}.", n, self.inspect(), ty)),
            None => ScriptError::new(format!("{} is not a {}.", self.inspect(), ty)),
        }
    }

    /// Drops a preserved `a/b` slash form, if any.
    pub fn without_slash(self) -> Value {
        match self {
            Value::Number(n) => Value::Number(n.without_slash()),
            other => other,
        }
    }

    /// Serializes this value as CSS text.
    ///
    /// `quote` controls whether quoted strings keep their quotes; values
    /// inside interpolation serialize with `quote: false`.  Values with no
    /// plain-CSS representation (maps, function references, numbers with
    /// complex units, empty lists) are script errors.
    pub fn to_css_string(&self, quote: bool) -> Result<String, ScriptError> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => {
                if let Some((numerator, denominator)) = n.as_slash() {
                    return Ok(format!(
                        "{}/{}",
                        Value::Number(numerator.clone()).to_css_string(quote)?,
                        Value::Number(denominator.clone()).to_css_string(quote)?
                    ));
                }
                let unit = n.css_unit()?;
                Ok(format!("{}{}", n.format_value(), unit))
            }
            Value::Color(c) => Ok(c.to_string()),
            Value::String(s) => {
                if quote && s.quoted {
                    Ok(format!("\"{}\"", s.text.replace('"', "\\\"")))
                } else {
                    Ok(s.text.clone())
                }
            }
            Value::List {
                elements,
                separator,
                bracketed,
            } => {
                let contents = serialize_list(elements, *separator, quote)?;
                if *bracketed {
                    Ok(format!("[{}]", contents))
                } else if elements.is_empty() {
                    Err(ScriptError::new("() isn't a valid CSS value."))
                } else {
                    Ok(contents)
                }
            }
            Value::ArgList(args) => {
                if args.elements.is_empty() {
                    Err(ScriptError::new("() isn't a valid CSS value."))
                } else {
                    serialize_list(&args.elements, args.separator, quote)
                }
            }
            Value::Map(_) => Err(ScriptError::new(format!(
                "{} isn't a valid CSS value.",
                self.inspect()
            ))),
            Value::Function(_) => Err(ScriptError::new(format!(
                "{} isn't a valid CSS value.",
                self.inspect()
            ))),
        }
    }

    /// Debug serialization: like CSS where possible, with a textual form
    /// for values CSS cannot express.  Never fails; used in error messages
    /// and by `inspect()`/`@debug`.
    pub fn inspect(&self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Color(c) => c.to_string(),
            Value::String(s) => {
                if s.quoted {
                    format!("\"{}\"", s.text.replace('"', "\\\""))
                } else {
                    s.text.clone()
                }
            }
            Value::List {
                elements,
                separator,
                bracketed,
            } => {
                let inner = elements
                    .iter()
                    .map(|e| {
                        // nested comma lists need parens to survive re-parsing
                        match e {
                            Value::List {
                                separator: ListSeparator::Comma,
                                ..
                            } if *separator == ListSeparator::Comma => {
                                format!("({})", e.inspect())
                            }
                            _ => e.inspect(),
                        }
                    })
                    .join(separator.separator_text());
                if *bracketed {
                    format!("[{}]", inner)
                } else if elements.is_empty() {
                    "()".to_owned()
                } else if elements.len() == 1 && *separator == ListSeparator::Comma {
                    format!("({},)", inner)
                } else {
                    inner
                }
            }
            Value::ArgList(args) => {
                if args.elements.is_empty() {
                    "()".to_owned()
                } else {
                    args.elements
                        .iter()
                        .map(Value::inspect)
                        .join(args.separator.separator_text())
                }
            }
            Value::Map(map) => {
                let inner = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .join(", ");
                format!("({})", inner)
            }
            Value::Function(f) => format!("get-function(\"{}\")", f.name),
        }
    }
}

fn serialize_list(
    elements: &[Value],
    separator: ListSeparator,
    quote: bool,
) -> Result<String, ScriptError> {
    let parts = elements
        .iter()
        .filter(|e| !e.is_blank())
        .map(|e| e.to_css_string(quote))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(separator.separator_text()))
}

/// Structural equality per Sass semantics: strings ignore quoting, numbers
/// coerce units, maps ignore order, an empty map equals an empty list.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::String(a), Value::String(b)) => a.text == b.text,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Map(m), other) | (other, Value::Map(m)) => {
                m.is_empty() && other.is_empty_list()
            }
            (Value::Function(a), Value::Function(b)) => a == b,
            (a, b) => {
                // list-like values (lists and argument lists) compare as lists
                let (a_items, a_sep, a_br) = match list_parts(a) {
                    Some(parts) => parts,
                    None => return false,
                };
                let (b_items, b_sep, b_br) = match list_parts(b) {
                    Some(parts) => parts,
                    None => return false,
                };
                a_sep == b_sep && a_br == b_br && a_items == b_items
            }
        }
    }
}

fn list_parts(value: &Value) -> Option<(&[Value], ListSeparator, bool)> {
    match value {
        Value::List {
            elements,
            separator,
            bracketed,
        } => Some((elements, *separator, *bracketed)),
        Value::ArgList(args) => Some((&args.elements, args.separator, false)),
        _ => None,
    }
}
