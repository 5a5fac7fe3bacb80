//! Lexical environments.
//!
//! An [`Environment`] is a stack of scope frames over a global frame.
//! Frames are shared by reference (`Rc<RefCell<Scope>>`): a closure is a
//! clone of the frame stack, so writes to frames that are visible from both
//! the closure and the original environment are seen by both, while frames
//! pushed later on either side are private to it.
//!
//! Scopes introduced by control flow (`@if`, `@each`, `@for`, `@while`) are
//! *semi-global*: transparent to variable assignment, so `$x: ...` inside
//! them updates the surrounding declaration scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use codemap::Span;

use crate::callable::{SassCallable, UserDefinedCallable};
use crate::error::ScriptError;
use crate::module::Module;
use crate::value::Value;

/// A variable binding plus the span of the declaration that produced it,
/// recorded when source maps are requested.
#[derive(Debug, Clone)]
pub struct VariableBinding {
    pub value: Value,
    pub declaration_span: Option<Span>,
}

/// One scope frame.
#[derive(Debug, Default)]
pub struct Scope {
    pub variables: HashMap<String, VariableBinding>,
    pub functions: HashMap<String, SassCallable>,
    pub mixins: HashMap<String, SassCallable>,
}

#[derive(Debug, Clone)]
struct Frame {
    scope: Rc<RefCell<Scope>>,
    semi_global: bool,
}

/// The evaluator's view of the current scope chain.
#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Frame>,
    content: Option<Rc<UserDefinedCallable>>,
    in_mixin: bool,
    /// Modules bound to a namespace by `@use`.
    modules: Rc<RefCell<HashMap<String, Rc<Module>>>>,
    /// Modules used with `as *`, latest first.
    global_modules: Rc<RefCell<Vec<Rc<Module>>>>,
}

impl Default for Environment {
    fn default() -> Environment {
        Environment::new()
    }
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            frames: vec![Frame {
                scope: Rc::new(RefCell::new(Scope::default())),
                semi_global: false,
            }],
            content: None,
            in_mixin: false,
            modules: Rc::new(RefCell::new(HashMap::new())),
            global_modules: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The globals frame, which modules export.
    pub fn global_scope(&self) -> Rc<RefCell<Scope>> {
        Rc::clone(&self.frames[0].scope)
    }

    /// Whether the current scope is the global one.
    pub fn at_root(&self) -> bool {
        self.frames.len() == 1
    }

    /// Captures the scope chain for a closure.  Frames are shared, not
    /// copied.
    pub fn closure(&self) -> Environment {
        self.clone()
    }

    pub fn push_scope(&mut self, semi_global: bool) {
        self.frames.push(Frame {
            scope: Rc::new(RefCell::new(Scope::default())),
            semi_global,
        });
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.frames.len() > 1, "popped the global scope");
        self.frames.pop();
    }

    pub fn get_variable(&self, name: &str, namespace: Option<&str>) -> Option<Value> {
        if let Some(namespace) = namespace {
            return self
                .get_module(namespace)
                .and_then(|module| module.variable(name));
        }

        for frame in self.frames.iter().rev() {
            if let Some(binding) = frame.scope.borrow().variables.get(name) {
                return Some(binding.value.clone());
            }
        }
        for module in self.global_modules.borrow().iter() {
            if let Some(value) = module.variable(name) {
                return Some(value);
            }
        }
        None
    }

    pub fn variable_exists(&self, name: &str) -> bool {
        self.get_variable(name, None).is_some()
    }

    pub fn global_variable_exists(&self, name: &str) -> bool {
        self.frames[0].scope.borrow().variables.contains_key(name)
    }

    /// Assigns a variable, honoring `!global` and the semi-global rule.
    pub fn set_variable(
        &mut self,
        name: &str,
        value: Value,
        declaration_span: Option<Span>,
        global: bool,
    ) {
        let binding = VariableBinding {
            value,
            declaration_span,
        };

        if global {
            self.frames[0]
                .scope
                .borrow_mut()
                .variables
                .insert(name.to_owned(), binding);
            return;
        }

        // innermost existing binding wins
        for frame in self.frames.iter().rev() {
            let mut scope = frame.scope.borrow_mut();
            if scope.variables.contains_key(name) {
                scope.variables.insert(name.to_owned(), binding);
                return;
            }
        }

        // otherwise create it, skipping semi-global scopes
        let frame = self
            .frames
            .iter()
            .rev()
            .find(|frame| !frame.semi_global)
            .expect("the global frame is never semi-global");
        frame
            .scope
            .borrow_mut()
            .variables
            .insert(name.to_owned(), binding);
    }

    /// Binds a variable in the current scope unconditionally.  Loop
    /// variables and bound arguments use this: they are local even inside
    /// semi-global scopes.
    pub fn set_local_variable(&mut self, name: &str, value: Value, declaration_span: Option<Span>) {
        self.frames
            .last()
            .expect("there is always a scope")
            .scope
            .borrow_mut()
            .variables
            .insert(
                name.to_owned(),
                VariableBinding {
                    value,
                    declaration_span,
                },
            );
    }

    /// Assigns into a module's namespace; the variable must already exist
    /// there.
    pub fn set_namespaced_variable(
        &mut self,
        namespace: &str,
        name: &str,
        value: Value,
        declaration_span: Option<Span>,
    ) -> Result<(), ScriptError> {
        let module = self.get_module(namespace).ok_or_else(|| {
            ScriptError::new(format!(
                "There is no module with the namespace \"{}\".",
                namespace
            ))
        })?;
        if !module.set_variable(name, value, declaration_span) {
            return Err(ScriptError::new("Undefined variable."));
        }
        Ok(())
    }

    pub fn get_function(&self, name: &str, namespace: Option<&str>) -> Option<SassCallable> {
        if let Some(namespace) = namespace {
            return self
                .get_module(namespace)
                .and_then(|module| module.function(name));
        }

        for frame in self.frames.iter().rev() {
            if let Some(callable) = frame.scope.borrow().functions.get(name) {
                return Some(callable.clone());
            }
        }
        for module in self.global_modules.borrow().iter() {
            if let Some(callable) = module.function(name) {
                return Some(callable);
            }
        }
        None
    }

    pub fn get_mixin(&self, name: &str, namespace: Option<&str>) -> Option<SassCallable> {
        if let Some(namespace) = namespace {
            return self
                .get_module(namespace)
                .and_then(|module| module.mixin(name));
        }

        for frame in self.frames.iter().rev() {
            if let Some(callable) = frame.scope.borrow().mixins.get(name) {
                return Some(callable.clone());
            }
        }
        for module in self.global_modules.borrow().iter() {
            if let Some(callable) = module.mixin(name) {
                return Some(callable);
            }
        }
        None
    }

    /// Declares a function in the current scope.
    pub fn set_function(&mut self, callable: SassCallable) {
        let name = callable.name().to_owned();
        self.frames
            .last()
            .expect("there is always a scope")
            .scope
            .borrow_mut()
            .functions
            .insert(name, callable);
    }

    /// Declares a mixin in the current scope.
    pub fn set_mixin(&mut self, callable: SassCallable) {
        let name = callable.name().to_owned();
        self.frames
            .last()
            .expect("there is always a scope")
            .scope
            .borrow_mut()
            .mixins
            .insert(name, callable);
    }

    /// Binds a module under a namespace.
    pub fn add_module(
        &mut self,
        namespace: Option<String>,
        module: Rc<Module>,
    ) -> Result<(), ScriptError> {
        match namespace {
            None => {
                self.global_modules.borrow_mut().insert(0, module);
                Ok(())
            }
            Some(namespace) => {
                let mut modules = self.modules.borrow_mut();
                if modules.contains_key(&namespace) {
                    return Err(ScriptError::new(format!(
                        "There's already a module with namespace \"{}\".",
                        namespace
                    )));
                }
                modules.insert(namespace, module);
                Ok(())
            }
        }
    }

    pub fn get_module(&self, namespace: &str) -> Option<Rc<Module>> {
        self.modules.borrow().get(namespace).cloned()
    }

    /// The content block passed to the current mixin invocation.
    pub fn content(&self) -> Option<Rc<UserDefinedCallable>> {
        self.content.clone()
    }

    pub fn in_mixin(&self) -> bool {
        self.in_mixin
    }

    /// Swaps the bound content block, returning the previous one.
    pub fn replace_content(
        &mut self,
        content: Option<Rc<UserDefinedCallable>>,
    ) -> Option<Rc<UserDefinedCallable>> {
        std::mem::replace(&mut self.content, content)
    }

    /// Swaps the mixin flag, returning the previous value.
    pub fn replace_in_mixin(&mut self, in_mixin: bool) -> bool {
        std::mem::replace(&mut self.in_mixin, in_mixin)
    }

    /// Runs `f` with the given content block bound.
    pub fn with_content<T>(
        &mut self,
        content: Option<Rc<UserDefinedCallable>>,
        f: impl FnOnce(&mut Environment) -> T,
    ) -> T {
        let old = std::mem::replace(&mut self.content, content);
        let result = f(self);
        self.content = old;
        result
    }

    /// Runs `f` with the mixin flag set, for `content-exists()`.
    pub fn as_mixin<T>(&mut self, f: impl FnOnce(&mut Environment) -> T) -> T {
        let old = std::mem::replace(&mut self.in_mixin, true);
        let result = f(self);
        self.in_mixin = old;
        result
    }
}
