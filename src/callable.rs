//! Callables: the things `@include` and function calls dispatch to.
//!
//! Dispatch is over a tagged variant: user-defined callables carry their
//! declaration and the environment captured where they were declared;
//! built-ins carry pre-declared overloads so argument validation needs no
//! evaluation; a plain-CSS function is just a name whose arguments are
//! serialized textually.

use std::fmt;
use std::rc::Rc;

use crate::ast::CallableDecl;
use crate::environment::Environment;
use crate::error::ScriptError;
use crate::value::Value;

/// A mixin or function declared in Sass source, with its closure.
#[derive(Clone)]
pub struct UserDefinedCallable {
    pub declaration: Rc<CallableDecl>,
    pub environment: Environment,
}

impl UserDefinedCallable {
    pub fn new(declaration: Rc<CallableDecl>, environment: Environment) -> UserDefinedCallable {
        UserDefinedCallable {
            declaration,
            environment,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }
}

impl fmt::Debug for UserDefinedCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserDefinedCallable({})", self.declaration.name)
    }
}

/// The native body of a built-in overload.
pub type BuiltinBody = Rc<dyn Fn(Vec<Value>) -> Result<Value, ScriptError>>;

/// One declared parameter of a built-in overload.  Defaults are plain
/// values, not expressions; built-ins need no evaluation to bind.
#[derive(Debug, Clone)]
pub struct BuiltinParameter {
    pub name: String,
    pub default: Option<Value>,
}

impl BuiltinParameter {
    pub fn required(name: &str) -> BuiltinParameter {
        BuiltinParameter {
            name: name.to_owned(),
            default: None,
        }
    }

    pub fn optional(name: &str, default: Value) -> BuiltinParameter {
        BuiltinParameter {
            name: name.to_owned(),
            default: Some(default),
        }
    }
}

/// An overload of a built-in callable.
#[derive(Clone)]
pub struct BuiltinOverload {
    pub parameters: Vec<BuiltinParameter>,
    pub rest: Option<String>,
    pub body: BuiltinBody,
}

impl BuiltinOverload {
    /// Whether this overload accepts an invocation with the given shape.
    pub fn accepts(&self, positional: usize, names: &[String]) -> bool {
        if positional > self.parameters.len() && self.rest.is_none() {
            return false;
        }
        for name in names {
            if !self.parameters.iter().any(|p| p.name == *name) {
                return false;
            }
        }
        for (i, parameter) in self.parameters.iter().enumerate() {
            let covered = i < positional
                || names.iter().any(|n| *n == parameter.name)
                || parameter.default.is_some();
            if !covered {
                return false;
            }
        }
        true
    }
}

/// A function or mixin implemented natively.
#[derive(Clone)]
pub struct BuiltinCallable {
    pub name: String,
    pub overloads: Vec<BuiltinOverload>,
}

impl BuiltinCallable {
    /// A built-in with a single overload.
    pub fn new(
        name: &str,
        parameters: Vec<BuiltinParameter>,
        body: impl Fn(Vec<Value>) -> Result<Value, ScriptError> + 'static,
    ) -> BuiltinCallable {
        BuiltinCallable {
            name: name.to_owned(),
            overloads: vec![BuiltinOverload {
                parameters,
                rest: None,
                body: Rc::new(body),
            }],
        }
    }

    pub fn with_rest(mut self, rest: &str) -> BuiltinCallable {
        if let Some(overload) = self.overloads.last_mut() {
            overload.rest = Some(rest.to_owned());
        }
        self
    }

    /// Picks the overload matching an invocation's shape.
    pub fn overload_for(&self, positional: usize, names: &[String]) -> Option<&BuiltinOverload> {
        self.overloads
            .iter()
            .find(|o| o.accepts(positional, names))
    }
}

impl fmt::Debug for BuiltinCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinCallable({})", self.name)
    }
}

/// Any callable the evaluator can dispatch to.
#[derive(Debug, Clone)]
pub enum SassCallable {
    UserDefined(UserDefinedCallable),
    Builtin(BuiltinCallable),
    /// A CSS function with no Sass definition, like `url(...)`: calls
    /// serialize textually.
    PlainCss(String),
}

impl SassCallable {
    pub fn name(&self) -> &str {
        match self {
            SassCallable::UserDefined(c) => c.name(),
            SassCallable::Builtin(c) => &c.name,
            SassCallable::PlainCss(name) => name,
        }
    }
}

/// A first-class function value.
#[derive(Clone)]
pub struct SassFunction {
    pub name: String,
    pub callable: Rc<SassCallable>,
}

impl SassFunction {
    pub fn new(name: impl Into<String>, callable: Rc<SassCallable>) -> SassFunction {
        SassFunction {
            name: name.into(),
            callable,
        }
    }
}

/// Function values compare by identity, like Sass's first-class functions.
impl PartialEq for SassFunction {
    fn eq(&self, other: &SassFunction) -> bool {
        Rc::ptr_eq(&self.callable, &other.callable)
    }
}

impl fmt::Debug for SassFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SassFunction({})", self.name)
    }
}
