//! Modules: evaluated stylesheets and their configurations.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use codemap::Span;
use url::Url;

use crate::callable::SassCallable;
use crate::css::CssNode;
use crate::environment::{Scope, VariableBinding};
use crate::extender::Extender;
use crate::value::Value;

/// An evaluated stylesheet: its CSS, its extensions, and the members it
/// exports.
///
/// The exported members live in the module's global scope, shared by
/// reference so that configured and namespaced assignments are visible to
/// code that captured the module earlier.
pub struct Module {
    pub url: Url,
    scope: Rc<RefCell<Scope>>,
    pub extender: Rc<RefCell<Extender>>,
    pub css: CssNode,
    /// Modules this one `@use`d or `@forward`ed, in source order.
    pub upstream: Vec<Rc<Module>>,
    pub transitively_contains_css: bool,
    pub transitively_contains_extensions: bool,
}

impl Module {
    pub fn new(
        url: Url,
        scope: Rc<RefCell<Scope>>,
        extender: Rc<RefCell<Extender>>,
        css: CssNode,
        upstream: Vec<Rc<Module>>,
    ) -> Module {
        let has_css = css.first_child().is_some();
        let has_extensions = extender.borrow().has_extensions();
        let transitively_contains_css = has_css
            || upstream.iter().any(|m| m.transitively_contains_css);
        let transitively_contains_extensions = has_extensions
            || upstream.iter().any(|m| m.transitively_contains_extensions);

        Module {
            url,
            scope,
            extender,
            css,
            upstream,
            transitively_contains_css,
            transitively_contains_extensions,
        }
    }

    /// A built-in module (`sass:math` and friends): functions only, no CSS.
    pub fn builtin(url: Url, functions: Vec<SassCallable>, css: CssNode) -> Module {
        let scope = Rc::new(RefCell::new(Scope::default()));
        {
            let mut scope = scope.borrow_mut();
            for callable in functions {
                scope
                    .functions
                    .insert(callable.name().to_owned(), callable);
            }
        }
        Module::new(
            url,
            scope,
            Rc::new(RefCell::new(Extender::new())),
            css,
            Vec::new(),
        )
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        if is_private(name) {
            return None;
        }
        self.scope
            .borrow()
            .variables
            .get(name)
            .map(|b| b.value.clone())
    }

    /// Assigns an existing module variable.  Returns false when the module
    /// has no variable by that name.
    pub fn set_variable(&self, name: &str, value: Value, declaration_span: Option<Span>) -> bool {
        let mut scope = self.scope.borrow_mut();
        if !scope.variables.contains_key(name) {
            return false;
        }
        scope.variables.insert(
            name.to_owned(),
            VariableBinding {
                value,
                declaration_span,
            },
        );
        true
    }

    pub fn function(&self, name: &str) -> Option<SassCallable> {
        if is_private(name) {
            return None;
        }
        self.scope.borrow().functions.get(name).cloned()
    }

    pub fn mixin(&self, name: &str) -> Option<SassCallable> {
        if is_private(name) {
            return None;
        }
        self.scope.borrow().mixins.get(name).cloned()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module({})", self.url)
    }
}

/// Members whose names start with `-` or `_` are private to their module.
fn is_private(name: &str) -> bool {
    name.starts_with('-') || name.starts_with('_')
}

/// Copies `from`'s exported members into `scope`, applying `@forward`'s
/// prefix/show/hide filters.
pub fn forward_members(
    from: &Module,
    scope: &Rc<RefCell<Scope>>,
    prefix: Option<&str>,
    shown: Option<&[String]>,
    hidden: Option<&[String]>,
) {
    let visible = |name: &str| -> bool {
        if is_private(name) {
            return false;
        }
        if let Some(shown) = shown {
            return shown.iter().any(|s| s == name);
        }
        if let Some(hidden) = hidden {
            return !hidden.iter().any(|h| h == name);
        }
        true
    };
    let renamed = |name: &str| -> String {
        match prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name.to_owned(),
        }
    };

    let from_scope = from.scope.borrow();
    let mut into = scope.borrow_mut();

    for (name, binding) in &from_scope.variables {
        if visible(name) {
            into.variables.insert(renamed(name), binding.clone());
        }
    }
    for (name, callable) in &from_scope.functions {
        if visible(name) {
            into.functions.insert(renamed(name), callable.clone());
        }
    }
    for (name, callable) in &from_scope.mixins {
        if visible(name) {
            into.mixins.insert(renamed(name), callable.clone());
        }
    }
}

/// A value configured for a module via `@use ... with` or a `@forward`
/// override.
#[derive(Debug, Clone)]
pub struct ConfiguredValue {
    pub value: Value,
    pub span: Span,
}

/// The set of `!default` overrides supplied when loading a module.
///
/// A configuration is *implicit* when it was propagated through `@forward`
/// rather than written as an explicit `with` clause.  Implicit
/// configurations may re-enter already-loaded modules; explicit ones may
/// not.
///
/// The entry pool is shared between clones: when a `@forward` deep in a
/// module graph consumes an entry, the `@use` site that supplied it sees
/// the consumption and can report genuinely-unused entries afterwards.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    values: Rc<RefCell<Vec<(String, ConfiguredValue)>>>,
    explicit: bool,
}

impl Configuration {
    /// The empty, implicit configuration.
    pub fn implicit() -> Configuration {
        Configuration {
            values: Rc::new(RefCell::new(Vec::new())),
            explicit: false,
        }
    }

    /// An explicit `with (...)` configuration.
    pub fn explicit(values: Vec<(String, ConfiguredValue)>) -> Configuration {
        Configuration {
            values: Rc::new(RefCell::new(values)),
            explicit: true,
        }
    }

    pub fn is_implicit(&self) -> bool {
        !self.explicit
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    /// The names of the unconsumed entries.
    pub fn names(&self) -> Vec<String> {
        self.values
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// A snapshot of the unconsumed entries.
    pub fn entries(&self) -> Vec<(String, ConfiguredValue)> {
        self.values.borrow().clone()
    }

    /// Whether a configured (non-consumed) value exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.borrow().iter().any(|(n, _)| n == name)
    }

    /// Takes the configured value for `name`, marking it consumed.
    pub fn remove(&mut self, name: &str) -> Option<ConfiguredValue> {
        let mut values = self.values.borrow_mut();
        let index = values.iter().position(|(n, _)| n == name)?;
        Some(values.remove(index).1)
    }

    /// The first unconsumed entry, for "this variable was not declared"
    /// errors.
    pub fn first(&self) -> Option<(String, ConfiguredValue)> {
        self.values.borrow().first().cloned()
    }

    /// Whether two configurations share one entry pool (clones of the same
    /// configuration do; a derived configuration does not).
    pub fn shares_pool(&self, other: &Configuration) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::{new_node, NodeKind};

    fn span() -> Span {
        let mut map = codemap::CodeMap::new();
        map.add_file("t.scss".into(), "x".into()).span
    }

    fn test_module(vars: &[(&str, f64)]) -> Module {
        let scope = Rc::new(RefCell::new(Scope::default()));
        for (name, n) in vars {
            scope.borrow_mut().variables.insert(
                (*name).to_owned(),
                VariableBinding {
                    value: Value::Number(crate::value::SassNumber::unitless(*n)),
                    declaration_span: None,
                },
            );
        }
        Module::new(
            Url::parse("file:///a.scss").unwrap(),
            scope,
            Rc::new(RefCell::new(Extender::new())),
            new_node(NodeKind::Stylesheet, span()),
            Vec::new(),
        )
    }

    #[test]
    fn private_members_are_hidden() {
        let module = test_module(&[("visible", 1.0), ("-private", 2.0), ("_private", 3.0)]);
        assert!(module.variable("visible").is_some());
        assert!(module.variable("-private").is_none());
        assert!(module.variable("_private").is_none());
    }

    #[test]
    fn namespaced_assignment_requires_existing_variable() {
        let module = test_module(&[("x", 1.0)]);
        assert!(module.set_variable("x", Value::Null, None));
        assert!(!module.set_variable("y", Value::Null, None));
    }

    #[test]
    fn forward_prefix_and_filters() {
        let module = test_module(&[("a", 1.0), ("b", 2.0)]);
        let scope = Rc::new(RefCell::new(Scope::default()));
        forward_members(
            &module,
            &scope,
            Some("lib-"),
            None,
            Some(&["b".to_owned()]),
        );
        let scope = scope.borrow();
        assert!(scope.variables.contains_key("lib-a"));
        assert!(!scope.variables.contains_key("lib-b"));
    }

    #[test]
    fn configuration_consumption() {
        let mut config = Configuration::explicit(vec![(
            "x".to_owned(),
            ConfiguredValue {
                value: Value::Null,
                span: span(),
            },
        )]);
        assert!(!config.is_implicit());
        assert!(config.contains("x"));
        assert!(config.remove("x").is_some());
        assert!(config.remove("x").is_none());
        assert!(config.is_empty());
    }
}
