//! The tree-walking evaluator.
//!
//! One [`Evaluator`] owns one compilation.  It walks the immutable input
//! tree, queries the [`Environment`], emits into the CSS output tree,
//! registers selectors and extensions with the [`Extender`], and drives the
//! module loader on `@use`/`@forward`/`@import`.
//!
//! All evaluation-time state that a construct changes (the current CSS
//! parent, the innermost style rule, the media query stack, the keyframes
//! flag, the declaration-name prefix, the call stack) is stashed and
//! restored around that construct, on both the success and the error path.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use codemap::{CodeMap, Span};
use url::Url;

use crate::ast::{
    ArgumentDeclaration, ArgumentInvocation, AtRoot, AtRule, BinaryOp, Content, Declaration, Each,
    Expr, Extend, For, Forward, If, Import, ImportArg, Include, Interpolation, InterpolationPart,
    LoudComment, Media, Stmt, StyleRule, Stylesheet, Supports, UnaryOp, Use, UseNamespace,
    VariableDecl, While,
};
use crate::at_root::{parse_at_root_query, AtRootQuery};
use crate::builtins;
use crate::callable::{BuiltinCallable, BuiltinOverload, SassCallable, UserDefinedCallable};
use crate::css::{self, CssNode, NodeKind};
use crate::environment::Environment;
use crate::error::{FormatError, SassError, SassResult, ScriptError, SpannedResultExt, StackFrame};
use crate::extender::Extender;
use crate::importer::{ImportCache, Loaded};
use crate::logger::{Logger, StderrLogger, WarnOptions};
use crate::media::{parse_media_query_list, MediaQuery, MediaQueryMergeResult};
use crate::module::{forward_members, Configuration, ConfiguredValue, Module};
use crate::selector::parser::{parse_keyframe_selectors, parse_selector_list};
use crate::selector::{ComplexComponent, SelectorList};
use crate::value::{ArgList, ListSeparator, SassNumber, Value};

/// The result of compiling a document.
#[derive(Debug)]
pub struct EvaluateResult {
    /// The produced CSS tree.
    pub css: CssNode,
    /// Every canonical URL loaded during the compilation, with file-scheme
    /// URLs reported as filesystem paths.
    pub included_files: HashSet<String>,
}

impl EvaluateResult {
    /// Convenience serialization of the CSS tree.
    pub fn to_css_string(&self) -> SassResult<String> {
        css::serialize::serialize_tree(&self.css)
    }
}

/// Construction options for an [`Evaluator`].
#[derive(Default)]
pub struct EvalOptions {
    /// Resolves `@use`/`@forward`/`@import` URLs.
    pub import_cache: Option<Rc<ImportCache>>,
    /// Extra functions merged into the global registry.
    pub functions: Vec<BuiltinCallable>,
    /// Sink for warnings and debug messages; stderr by default.
    pub logger: Option<Rc<dyn Logger>>,
    /// The code map spans point into, for rendering traces in warnings.
    pub codemap: Option<Rc<RefCell<CodeMap>>>,
    /// Record variable declaration spans for source maps.
    pub source_map: bool,
}

/// The innermost style rule's selector, for `&` and nesting.
#[derive(Clone)]
struct StyleRuleContext {
    handle: Rc<RefCell<SelectorList>>,
    original: SelectorList,
}

/// Evaluation state that belongs to the module currently being executed.
struct ModuleState {
    environment: Environment,
    root: CssNode,
    parent: CssNode,
    extender: Rc<RefCell<Extender>>,
    /// Canonical URL of the stylesheet being evaluated; base for relative
    /// loads.
    url: Option<Url>,
    /// Modules this one loaded, in source order.
    upstream: Vec<Rc<Module>>,
    configuration: Configuration,
    /// Index into the root's children where the import block ends.
    end_of_imports: usize,
    /// Imports that appeared after CSS was emitted; hoisted at the end.
    out_of_order_imports: Vec<CssNode>,
    style_rule: Option<StyleRuleContext>,
    media_queries: Option<Vec<MediaQuery>>,
    declaration_name: Option<String>,
    in_function: bool,
    in_unknown_at_rule: bool,
    in_keyframes: bool,
    at_root_excluding_style_rule: bool,
}

impl ModuleState {
    fn new(url: Option<Url>, configuration: Configuration, span: Span) -> ModuleState {
        let root = css::new_node(NodeKind::Stylesheet, span);
        ModuleState {
            environment: Environment::new(),
            parent: root.clone(),
            root,
            extender: Rc::new(RefCell::new(Extender::new())),
            url,
            upstream: Vec::new(),
            configuration,
            end_of_imports: 0,
            out_of_order_imports: Vec::new(),
            style_rule: None,
            media_queries: None,
            declaration_name: None,
            in_function: false,
            in_unknown_at_rule: false,
            in_keyframes: false,
            at_root_excluding_style_rule: false,
        }
    }
}

/// The evaluator.  See the [module documentation](self).
pub struct Evaluator {
    import_cache: Option<Rc<ImportCache>>,
    logger: Rc<dyn Logger>,
    codemap: Option<Rc<RefCell<CodeMap>>>,
    source_map: bool,
    global_functions: HashMap<String, Rc<SassCallable>>,

    /// Modules cached by canonical URL.
    modules: HashMap<Url, Rc<Module>>,
    /// Canonical URLs currently being executed, for loop detection.
    active_modules: HashSet<Url>,
    included_files: HashSet<String>,

    /// The current stack-frame member name ("root stylesheet", "@import",
    /// a mixin or function name).
    member: String,
    stack: Vec<StackFrame>,

    state: ModuleState,

    /// Keeps synthetic spans (used before `run` installs real ones) alive.
    #[allow(dead_code)]
    synthetic_map: CodeMap,
}

impl Evaluator {
    pub fn new(options: EvalOptions) -> Evaluator {
        let mut synthetic_map = CodeMap::new();
        let synthetic_span = synthetic_map
            .add_file("<evaluator>".to_owned(), String::new())
            .span;

        let mut global_functions = HashMap::new();
        for callable in builtins::global_functions() {
            global_functions.insert(
                callable.name.clone(),
                Rc::new(SassCallable::Builtin(callable)),
            );
        }
        for callable in options.functions {
            global_functions.insert(
                callable.name.clone(),
                Rc::new(SassCallable::Builtin(callable)),
            );
        }

        Evaluator {
            import_cache: options.import_cache,
            logger: options
                .logger
                .unwrap_or_else(|| Rc::new(StderrLogger) as Rc<dyn Logger>),
            codemap: options.codemap,
            source_map: options.source_map,
            global_functions,
            modules: HashMap::new(),
            active_modules: HashSet::new(),
            included_files: HashSet::new(),
            member: "root stylesheet".to_owned(),
            stack: Vec::new(),
            state: ModuleState::new(None, Configuration::implicit(), synthetic_span),
            synthetic_map,
        }
    }

    /// Compiles a full document.
    pub fn run(&mut self, stylesheet: &Stylesheet) -> SassResult<EvaluateResult> {
        let module = self.execute(None, stylesheet, Configuration::implicit())?;
        let css = self.combine_css(&module)?;
        Ok(EvaluateResult {
            css,
            included_files: self.included_files.clone(),
        })
    }

    /// Evaluates a single expression against the evaluator's state, for
    /// REPL-style clients.
    pub fn evaluate_expression(&mut self, expr: &Expr) -> SassResult<Value> {
        self.eval(expr)
    }

    /// Applies a single statement (a variable declaration, a `@use`)
    /// against the evaluator's shared state.
    pub fn execute_statement(&mut self, stmt: &Stmt) -> SassResult<()> {
        self.visit_stmt(stmt)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Modules
    // ---------------------------------------------------------------

    /// Evaluates a stylesheet in a fresh evaluation state and snapshots the
    /// result as a module.
    fn execute(
        &mut self,
        url: Option<Url>,
        stylesheet: &Stylesheet,
        configuration: Configuration,
    ) -> SassResult<Rc<Module>> {
        let fresh = ModuleState::new(url.clone(), configuration, stylesheet.span);
        let saved = std::mem::replace(&mut self.state, fresh);

        let result = self.visit_stylesheet_body(stylesheet);

        let finished = std::mem::replace(&mut self.state, saved);
        result?;

        let root = finished.root;
        reorder_imports(&root, finished.end_of_imports, finished.out_of_order_imports);

        let module_url = url.unwrap_or_else(|| {
            Url::parse("file:///-").expect("the fallback root URL parses")
        });
        Ok(Rc::new(Module::new(
            module_url,
            finished.environment.global_scope(),
            finished.extender,
            root,
            finished.upstream,
        )))
    }

    fn visit_stylesheet_body(&mut self, stylesheet: &Stylesheet) -> SassResult<()> {
        for stmt in &stylesheet.body {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    /// Loads the module at `url` and hands it to `callback`.
    fn load_module(
        &mut self,
        url: &str,
        member: &str,
        span: Span,
        configuration: Configuration,
        names_in_errors: bool,
        callback: impl FnOnce(&mut Self, Rc<Module>) -> SassResult<()>,
    ) -> SassResult<()> {
        if let Some(module) = self.builtin_module(url) {
            if !configuration.is_implicit() {
                return Err(self.error("Built-in modules can't be configured.", span));
            }
            self.state.upstream.push(Rc::clone(&module));
            return callback(self, module);
        }

        self.with_frame(member, span, |ev| {
            let loaded = ev.load_stylesheet(url, span, false)?;
            let canonical = loaded.canonical_url.clone();

            if ev.active_modules.contains(&canonical) {
                let message = if names_in_errors {
                    format!("Module loop: {} is already being loaded.", canonical)
                } else {
                    "Module loop: this module is already being loaded.".to_owned()
                };
                return Err(ev.error(message, span));
            }

            if let Some(cached) = ev.modules.get(&canonical).cloned() {
                if !configuration.is_implicit() {
                    let message = if names_in_errors {
                        format!(
                            "{} was already loaded, so it can't be configured using \"with\".",
                            canonical
                        )
                    } else {
                        "This module was already loaded, so it can't be configured using \"with\"."
                            .to_owned()
                    };
                    return Err(ev.error(message, span));
                }
                ev.state.upstream.push(Rc::clone(&cached));
                return callback(ev, cached);
            }

            ev.active_modules.insert(canonical.clone());
            let module = ev.execute(Some(canonical.clone()), &loaded.stylesheet, configuration);
            ev.active_modules.remove(&canonical);
            let module = module?;

            ev.modules.insert(canonical, Rc::clone(&module));
            ev.state.upstream.push(Rc::clone(&module));
            callback(ev, module)
        })
    }

    /// The registry of `sass:` modules, built from the global functions.
    fn builtin_module(&mut self, url: &str) -> Option<Rc<Module>> {
        let name = url.strip_prefix("sass:")?;
        let parsed = Url::parse(url).ok()?;
        if let Some(module) = self.modules.get(&parsed) {
            return Some(Rc::clone(module));
        }

        let members: &[&str] = match name {
            "math" => &["unit", "unitless"],
            "meta" => &["inspect", "feature-exists"],
            "list" => &["length", "nth", "index"],
            "map" => &["map-get", "map-has-key"],
            "color" => &["red", "rgb", "rgba"],
            "string" => &["quote", "unquote"],
            _ => return None,
        };

        let functions = members
            .iter()
            .filter_map(|name| self.global_functions.get(*name))
            .map(|callable| (**callable).clone())
            .collect();
        let css = css::new_node(NodeKind::Stylesheet, self.synthetic_span());
        let module = Rc::new(Module::builtin(parsed.clone(), functions, css));
        self.modules.insert(parsed, Rc::clone(&module));
        Some(module)
    }

    /// Resolves and loads a stylesheet through the import cache, recording
    /// it in `included_files`.
    fn load_stylesheet(&mut self, url: &str, span: Span, for_import: bool) -> SassResult<Loaded> {
        let cache = self
            .import_cache
            .as_ref()
            .ok_or_else(|| self.error("Can't find stylesheet to import.", span))?
            .clone();

        let loaded = cache
            .import(url, self.state.url.as_ref(), for_import)
            .map_err(|e| self.error(e.to_string(), span))?
            .ok_or_else(|| self.error("Can't find stylesheet to import.", span))?;

        let display = if loaded.canonical_url.scheme() == "file" {
            loaded
                .canonical_url
                .to_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| loaded.canonical_url.to_string())
        } else {
            loaded.canonical_url.to_string()
        };
        self.included_files.insert(display);

        Ok(loaded)
    }

    /// Combines the root module's CSS with its upstream modules': computes
    /// the topological order, propagates extensions, finalizes selectors,
    /// and checks for unsatisfied mandatory extensions.
    fn combine_css(&mut self, root: &Rc<Module>) -> SassResult<CssNode> {
        if !root
            .upstream
            .iter()
            .any(|m| m.transitively_contains_css)
        {
            let modules = topological_modules(root);
            self.extend_and_check(&modules)?;
            return Ok(root.css.clone());
        }

        let sorted = topological_modules(root);
        self.extend_and_check(&sorted)?;

        let combined = css::new_node(NodeKind::Stylesheet, root.css.borrow().span);
        let mut imports = Vec::new();
        let mut body = Vec::new();

        // reverse topological order: deepest upstream first, root last
        for module in sorted.iter().rev() {
            let children: Vec<CssNode> = module.css.children().collect();
            for mut child in children {
                child.detach();
                if matches!(child.borrow().kind, NodeKind::Import { .. }) {
                    imports.push(child);
                } else {
                    body.push(child);
                }
            }
        }

        for node in imports.into_iter().chain(body) {
            css::append(&combined, node);
        }
        Ok(combined)
    }

    /// Propagates extensions downstream-to-upstream, finalizes every
    /// module's selectors, and reports the first unsatisfied mandatory
    /// extension.
    fn extend_and_check(&mut self, sorted: &[Rc<Module>]) -> SassResult<()> {
        // every module's own extensions, before propagation muddies them
        let own_extensions: Vec<_> = sorted
            .iter()
            .flat_map(|module| {
                module
                    .extender
                    .borrow()
                    .extensions_where_target(|_| true)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        // root-first: by the time a module pushes its extensions upstream,
        // it already holds everything downstream of it
        for module in sorted {
            for upstream in &module.upstream {
                if Rc::ptr_eq(&module.extender, &upstream.extender) {
                    continue;
                }
                let downstream = module.extender.borrow();
                upstream.extender.borrow_mut().add_extensions(&downstream);
            }
        }

        for module in sorted {
            module.extender.borrow_mut().finalize();
        }

        for extension in &own_extensions {
            if extension.optional {
                continue;
            }
            let satisfied = sorted
                .iter()
                .any(|m| m.extender.borrow().is_satisfied(extension));
            if !satisfied {
                return Err(self.error("The target selector was not found.", extension.span));
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Errors, warnings, stack frames
    // ---------------------------------------------------------------

    fn synthetic_span(&self) -> Span {
        self.state.root.borrow().span
    }

    /// The current Sass-level stack trace, innermost frame first.
    fn stack_trace(&self, span: Span) -> Vec<StackFrame> {
        let mut frames = vec![StackFrame::new(Some(self.member.clone()), span)];
        frames.extend(self.stack.iter().rev().cloned());
        frames
    }

    fn error(&self, message: impl Into<String>, span: Span) -> Box<SassError> {
        SassError::with_trace(message, span, self.stack_trace(span))
    }

    fn with_frame<T>(
        &mut self,
        member: &str,
        span: Span,
        f: impl FnOnce(&mut Self) -> SassResult<T>,
    ) -> SassResult<T> {
        let old_member = std::mem::replace(&mut self.member, member.to_owned());
        self.stack.push(StackFrame::new(Some(old_member.clone()), span));
        let result = f(self);
        self.stack.pop();
        self.member = old_member;
        result
    }

    fn trace_string(&self, span: Span) -> Option<String> {
        let map = self.codemap.as_ref()?;
        let error = SassError::with_trace("", span, self.stack_trace(span));
        Some(error.render_trace(&map.borrow()))
    }

    fn warn(&self, message: &str, span: Span, deprecation: bool) {
        self.logger.warn(
            message,
            &WarnOptions {
                span: Some(span),
                trace: self.trace_string(span),
                deprecation,
            },
        );
    }
}

/// DFS topological order over upstream edges, root first; siblings appear
/// in source order when the result is reversed.
fn topological_modules(root: &Rc<Module>) -> Vec<Rc<Module>> {
    fn visit(module: &Rc<Module>, seen: &mut HashSet<*const Module>, out: &mut Vec<Rc<Module>>) {
        if !seen.insert(Rc::as_ptr(module)) {
            return;
        }
        for upstream in &module.upstream {
            visit(upstream, seen, out);
        }
        out.insert(0, Rc::clone(module));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    visit(root, &mut seen, &mut out);
    out
}

/// Splices imports that appeared after other CSS back into the import
/// block.
fn reorder_imports(root: &CssNode, end_of_imports: usize, out_of_order: Vec<CssNode>) {
    if out_of_order.is_empty() {
        return;
    }
    let children: Vec<CssNode> = root.children().collect();
    for child in &children {
        let mut child = child.clone();
        child.detach();
    }
    let (head, tail) = children.split_at(end_of_imports.min(children.len()));
    for node in head.iter().cloned() {
        css::append(root, node);
    }
    for node in out_of_order {
        css::append(root, node);
    }
    for node in tail.iter().cloned() {
        css::append(root, node);
    }
}

// -------------------------------------------------------------------
// Statements
// -------------------------------------------------------------------

impl Evaluator {
    /// Visits one statement.  `Some(value)` means a `@return` fired and is
    /// propagating out of nested scopes toward the enclosing function call.
    fn visit_stmt(&mut self, stmt: &Stmt) -> SassResult<Option<Value>> {
        match stmt {
            Stmt::StyleRule(rule) => self.visit_style_rule(rule).map(|_| None),
            Stmt::Declaration(declaration) => {
                self.visit_declaration(declaration).map(|_| None)
            }
            Stmt::Variable(declaration) => {
                self.visit_variable_decl(declaration).map(|_| None)
            }
            Stmt::FunctionDecl(declaration) => {
                let closure = self.state.environment.closure();
                self.state
                    .environment
                    .set_function(SassCallable::UserDefined(UserDefinedCallable::new(
                        Rc::clone(declaration),
                        closure,
                    )));
                Ok(None)
            }
            Stmt::MixinDecl(declaration) => {
                let closure = self.state.environment.closure();
                self.state
                    .environment
                    .set_mixin(SassCallable::UserDefined(UserDefinedCallable::new(
                        Rc::clone(declaration),
                        closure,
                    )));
                Ok(None)
            }
            Stmt::Include(include) => self.visit_include(include).map(|_| None),
            Stmt::Content(content) => self.visit_content(content).map(|_| None),
            Stmt::Return { value, span } => {
                if !self.state.in_function {
                    return Err(self.error("This at-rule is not allowed here.", *span));
                }
                Ok(Some(self.eval(value)?))
            }
            Stmt::If(rule) => self.visit_if(rule),
            Stmt::Each(rule) => self.visit_each(rule),
            Stmt::For(rule) => self.visit_for(rule),
            Stmt::While(rule) => self.visit_while(rule),
            Stmt::Extend(rule) => self.visit_extend(rule).map(|_| None),
            Stmt::AtRoot(rule) => self.visit_at_root(rule),
            Stmt::Media(rule) => self.visit_media(rule),
            Stmt::Supports(rule) => self.visit_supports(rule),
            Stmt::AtRule(rule) => self.visit_at_rule(rule),
            Stmt::Import(import) => self.visit_import(import).map(|_| None),
            Stmt::Use(rule) => self.visit_use(rule).map(|_| None),
            Stmt::Forward(rule) => self.visit_forward(rule).map(|_| None),
            Stmt::Warn { value, span } => {
                let value = self.eval(value)?;
                let message = match &value {
                    Value::String(s) => s.text.clone(),
                    other => other.inspect(),
                };
                self.warn(&message, *span, false);
                Ok(None)
            }
            Stmt::Debug { value, span } => {
                let value = self.eval(value)?;
                self.logger.debug(&value.inspect(), *span);
                Ok(None)
            }
            Stmt::Error { value, span } => {
                let value = self.eval(value)?;
                Err(self.error(value.inspect(), *span))
            }
            Stmt::LoudComment(comment) => self.visit_loud_comment(comment).map(|_| None),
        }
    }

    fn visit_stmts(&mut self, stmts: &[Stmt]) -> SassResult<Option<Value>> {
        for stmt in stmts {
            if let Some(value) = self.visit_stmt(stmt)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn visit_style_rule(&mut self, rule: &StyleRule) -> SassResult<()> {
        if self.state.declaration_name.is_some() {
            return Err(self.error(
                "Style rules may not be used within nested declarations.",
                rule.span,
            ));
        }

        let selector_text = self.interpolate(&rule.selector, true)?;

        if self.state.in_keyframes {
            let selectors = parse_keyframe_selectors(&selector_text)
                .map_err(|e| self.splice_format_error(e, &rule.selector, &selector_text))?;
            let block = css::new_node(NodeKind::KeyframeBlock { selectors }, rule.span);
            return self.with_parent(block, false, |ev| {
                ev.scoped(false, |ev| ev.visit_stmts(&rule.body).map(|_| ()))
            });
        }

        let parsed = parse_selector_list(&selector_text, true)
            .map_err(|e| self.splice_format_error(e, &rule.selector, &selector_text))?;

        let parent = self.state.style_rule.as_ref().map(|s| s.original.clone());
        let resolved = parsed
            .resolve_parent_selectors(
                parent.as_ref(),
                !self.state.at_root_excluding_style_rule,
            )
            .with_span(rule.selector.span)?;

        let (node, handle) = css::new_style_rule(resolved.clone(), rule.span);
        let media = self.state.media_queries.clone().unwrap_or_default();
        self.state
            .extender
            .borrow_mut()
            .add_selector(handle.clone(), media);

        let outermost = self.state.style_rule.is_none();
        let old_style_rule = self.state.style_rule.replace(StyleRuleContext {
            handle,
            original: resolved,
        });
        let old_at_root = std::mem::replace(&mut self.state.at_root_excluding_style_rule, false);

        let result = self.with_parent(node, true, |ev| {
            ev.scoped(false, |ev| ev.visit_stmts(&rule.body).map(|_| ()))
        });

        self.state.style_rule = old_style_rule;
        self.state.at_root_excluding_style_rule = old_at_root;
        result?;

        if outermost {
            css::mark_group_end(&self.state.parent);
        }
        Ok(())
    }

    fn visit_declaration(&mut self, declaration: &Declaration) -> SassResult<()> {
        if self.state.style_rule.is_none()
            && !self.state.in_unknown_at_rule
            && !self.state.in_keyframes
        {
            return Err(self.error(
                "Declarations may only be used within style rules.",
                declaration.span,
            ));
        }

        let mut name = self.interpolate(&declaration.name, true)?;
        if let Some(prefix) = &self.state.declaration_name {
            name = format!("{}-{}", prefix, name);
        }
        let is_custom_property = name.starts_with("--");

        if let Some(expr) = &declaration.value {
            let value = self.eval(expr)?;

            if is_custom_property {
                if let Value::String(s) = &value {
                    if s.text.is_empty() {
                        return Err(self.error(
                            "Custom property values may not be empty.",
                            expr.span(),
                        ));
                    }
                }
            }

            // null and empty unquoted strings are omitted; empty lists are
            // kept so the serializer reports them
            if !value.is_blank() || value.is_empty_list() {
                let node = css::new_node(
                    NodeKind::Declaration {
                        name: name.clone(),
                        value,
                        value_span: expr.span(),
                    },
                    declaration.span,
                );
                self.add_child(node, false);
            }
        }

        if let Some(body) = &declaration.body {
            let old_name = self.state.declaration_name.replace(name);
            let result = self.scoped(false, |ev| ev.visit_stmts(body).map(|_| ()));
            self.state.declaration_name = old_name;
            result?;
        }

        Ok(())
    }

    fn visit_variable_decl(&mut self, declaration: &VariableDecl) -> SassResult<()> {
        let declaration_span = self.source_map.then_some(declaration.span);

        if let Some(namespace) = &declaration.namespace {
            if declaration.guarded {
                let module = self.state.environment.get_module(namespace);
                if let Some(module) = module {
                    let current = module.variable(&declaration.name);
                    if matches!(current, Some(v) if v != Value::Null) {
                        return Ok(());
                    }
                }
            }
            let value = self.eval(&declaration.value)?.without_slash();
            return self
                .state
                .environment
                .set_namespaced_variable(namespace, &declaration.name, value, declaration_span)
                .with_span(declaration.span);
        }

        // a configured !default at the module root takes the caller's value
        if declaration.guarded && self.state.environment.at_root() {
            if let Some(configured) = self.state.configuration.remove(&declaration.name) {
                self.state.environment.set_variable(
                    &declaration.name,
                    configured.value.without_slash(),
                    declaration_span,
                    true,
                );
                return Ok(());
            }
        }

        if declaration.guarded {
            let current = self
                .state
                .environment
                .get_variable(&declaration.name, None);
            if matches!(current, Some(v) if v != Value::Null) {
                return Ok(());
            }
        }

        if declaration.global
            && !self
                .state
                .environment
                .global_variable_exists(&declaration.name)
        {
            self.warn(
                &format!(
                    "!global assignments won't be able to declare new variables in future \
                     versions.\nRecommendation: add `${}: null` at the stylesheet root.",
                    declaration.name
                ),
                declaration.span,
                true,
            );
        }

        let value = self.eval(&declaration.value)?.without_slash();
        self.state.environment.set_variable(
            &declaration.name,
            value,
            declaration_span,
            declaration.global,
        );
        Ok(())
    }

    fn visit_include(&mut self, include: &Include) -> SassResult<()> {
        let mixin = self
            .state
            .environment
            .get_mixin(&include.name, include.namespace.as_deref())
            .ok_or_else(|| self.error("Undefined mixin.", include.span))?;

        let callable = match mixin {
            SassCallable::UserDefined(callable) => callable,
            other => {
                return Err(self.error(
                    format!("\"{}\" is not a mixin.", other.name()),
                    include.span,
                ))
            }
        };

        let content = match &include.content {
            Some(block) => {
                if !accepts_content(&callable.declaration.body) {
                    return Err(
                        self.error("Mixin doesn't accept a content block.", include.span)
                    );
                }
                Some(Rc::new(UserDefinedCallable::new(
                    Rc::clone(block),
                    self.state.environment.closure(),
                )))
            }
            None => None,
        };

        let member = format!("{}()", include.name);
        self.with_frame(&member, include.span, |ev| {
            ev.run_user_defined(&callable, &include.arguments, include.span, |ev| {
                let old_content = ev.state.environment.replace_content(content);
                let old_in_mixin = ev.state.environment.replace_in_mixin(true);
                let result = ev.visit_stmts(&callable.declaration.body);
                ev.state.environment.replace_in_mixin(old_in_mixin);
                ev.state.environment.replace_content(old_content);
                result.map(|_| ())
            })
        })
    }

    fn visit_content(&mut self, content: &Content) -> SassResult<()> {
        let block = match self.state.environment.content() {
            Some(block) => block,
            None => return Ok(()),
        };

        self.with_frame("@content", content.span, |ev| {
            ev.run_user_defined(&block, &content.arguments, content.span, |ev| {
                ev.visit_stmts(&block.declaration.body).map(|_| ())
            })
        })
    }

    fn visit_if(&mut self, rule: &If) -> SassResult<Option<Value>> {
        for clause in &rule.clauses {
            if self.eval(&clause.condition)?.is_truthy() {
                return self.scoped(true, |ev| ev.visit_stmts(&clause.body));
            }
        }
        if let Some(body) = &rule.else_body {
            return self.scoped(true, |ev| ev.visit_stmts(body));
        }
        Ok(None)
    }

    fn visit_each(&mut self, rule: &Each) -> SassResult<Option<Value>> {
        let list = self.eval(&rule.list)?;
        let elements = list.as_list();

        self.scoped(true, |ev| {
            for element in elements {
                if rule.variables.len() == 1 {
                    ev.state.environment.set_local_variable(
                        &rule.variables[0],
                        element.clone().without_slash(),
                        None,
                    );
                } else {
                    // destructure, padding missing positions with null
                    let parts = element.as_list();
                    for (i, variable) in rule.variables.iter().enumerate() {
                        let value = parts.get(i).cloned().unwrap_or(Value::Null);
                        ev.state
                            .environment
                            .set_local_variable(variable, value.without_slash(), None);
                    }
                }
                if let Some(value) = ev.visit_stmts(&rule.body)? {
                    return Ok(Some(value));
                }
            }
            Ok(None)
        })
    }

    fn visit_for(&mut self, rule: &For) -> SassResult<Option<Value>> {
        let from_number = self
            .eval(&rule.from)?
            .assert_number(None)
            .with_span(rule.from.span())?;
        let to_number = self
            .eval(&rule.to)?
            .assert_number(None)
            .with_span(rule.to.span())?;

        // coerce the upper bound into the lower bound's units
        let to_coerced = to_number
            .coerce(
                &from_number.numerator_units,
                &from_number.denominator_units,
            )
            .with_span(rule.to.span())?;

        let from = from_number.assert_int().with_span(rule.from.span())?;
        let mut to = to_coerced.assert_int().with_span(rule.to.span())?;

        let direction = if from > to { -1 } else { 1 };
        if !rule.exclusive {
            to += direction;
        }
        if from == to {
            return Ok(None);
        }

        self.scoped(true, |ev| {
            let mut i = from;
            while i != to {
                ev.state.environment.set_local_variable(
                    &rule.variable,
                    Value::Number(SassNumber::new(
                        i as f64,
                        from_number.numerator_units.clone(),
                        from_number.denominator_units.clone(),
                    )),
                    None,
                );
                if let Some(value) = ev.visit_stmts(&rule.body)? {
                    return Ok(Some(value));
                }
                i += direction;
            }
            Ok(None)
        })
    }

    fn visit_while(&mut self, rule: &While) -> SassResult<Option<Value>> {
        self.scoped(true, |ev| {
            while ev.eval(&rule.condition)?.is_truthy() {
                if let Some(value) = ev.visit_stmts(&rule.body)? {
                    return Ok(Some(value));
                }
            }
            Ok(None)
        })
    }

    fn visit_extend(&mut self, rule: &Extend) -> SassResult<()> {
        let style_rule = match (&self.state.style_rule, &self.state.declaration_name) {
            (Some(style_rule), None) => style_rule.clone(),
            _ => {
                return Err(self.error(
                    "@extend may only be used within style rules.",
                    rule.span,
                ))
            }
        };

        let text = self.interpolate(&rule.selector, true)?;
        let targets = parse_selector_list(&text, false)
            .map_err(|e| self.splice_format_error(e, &rule.selector, &text))?;

        for complex in &targets.components {
            let compound = match complex.components.as_slice() {
                [ComplexComponent::Compound(compound)] => compound,
                _ => {
                    return Err(self.error(
                        "complex selectors may not be extended.",
                        rule.span,
                    ))
                }
            };
            let simple = match compound.components.as_slice() {
                [simple] => simple,
                _ => {
                    return Err(self.error(
                        "compound selectors may not be extended.",
                        rule.span,
                    ))
                }
            };

            let media = self.state.media_queries.clone().unwrap_or_default();
            self.state.extender.borrow_mut().add_extension(
                style_rule.original.clone(),
                simple,
                rule.span,
                media,
                rule.optional,
            );
        }
        Ok(())
    }

    fn visit_at_root(&mut self, rule: &AtRoot) -> SassResult<Option<Value>> {
        let query = match &rule.query {
            Some(interpolation) => {
                let text = self.interpolate(interpolation, true)?;
                parse_at_root_query(&text)
                    .map_err(|e| self.splice_format_error(e, interpolation, &text))?
            }
            None => AtRootQuery::default_query(),
        };

        // ancestors the query does not exclude, innermost first
        let mut included = Vec::new();
        let mut current = self.state.parent.clone();
        while let Some(parent) = current.parent() {
            if !query.excludes(&current) {
                included.push(current.clone());
            }
            current = parent;
        }

        let (attach_root, to_copy) = self.trim_included(&included);

        // rebuild the ancestor chain that survives, outermost first
        let mut new_parent = attach_root;
        for node in to_copy.iter().rev() {
            let copy = css::copy_without_children(node);
            css::append(&new_parent, copy.clone());
            new_parent = copy;
        }

        let old_parent = std::mem::replace(&mut self.state.parent, new_parent);
        let old_at_root = self.state.at_root_excluding_style_rule;
        let old_media = self.state.media_queries.clone();
        let old_in_keyframes = self.state.in_keyframes;
        let old_in_unknown = self.state.in_unknown_at_rule;

        if query.excludes_style_rules() {
            self.state.at_root_excluding_style_rule = true;
        }
        if query.excludes_media() {
            self.state.media_queries = None;
        }
        if self.state.in_keyframes && query.excludes_name("keyframes") {
            self.state.in_keyframes = false;
        }
        if self.state.in_unknown_at_rule
            && !included
                .iter()
                .any(|node| matches!(node.borrow().kind, NodeKind::AtRule { .. }))
        {
            self.state.in_unknown_at_rule = false;
        }

        let result = self.scoped(false, |ev| ev.visit_stmts(&rule.body));

        self.state.parent = old_parent;
        self.state.at_root_excluding_style_rule = old_at_root;
        self.state.media_queries = old_media;
        self.state.in_keyframes = old_in_keyframes;
        self.state.in_unknown_at_rule = old_in_unknown;

        result
    }

    /// Decides where `@at-root` content attaches: ancestors contiguous with
    /// the root are reused in place; the rest are copied.  Returns the
    /// attachment point and the nodes still needing copies (innermost
    /// first).
    fn trim_included(&self, included: &[CssNode]) -> (CssNode, Vec<CssNode>) {
        let root = self.state.root.clone();
        if included.is_empty() {
            return (root, Vec::new());
        }

        // Walk upward, consuming `included` in order.  `innermost_contiguous`
        // is the innermost index from which the included nodes sit directly
        // on top of each other; if that chain runs all the way to the root,
        // those nodes can be reused in place and only the inner ones need
        // copies.
        let mut innermost_contiguous: Option<usize> = None;
        let mut current = self.state.parent.clone();

        for (i, node) in included.iter().enumerate() {
            while !css::same_node(&current, node) {
                innermost_contiguous = None;
                match current.parent() {
                    Some(parent) => current = parent,
                    None => return (root, included.to_vec()),
                }
            }
            if innermost_contiguous.is_none() {
                innermost_contiguous = Some(i);
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return (root, included.to_vec()),
            }
        }

        // the outermost included node must hang directly off the root
        if !css::same_node(&current, &root) {
            return (root, included.to_vec());
        }

        let index = innermost_contiguous.expect("set when the last node matched");
        (included[index].clone(), included[..index].to_vec())
    }

    fn visit_media(&mut self, rule: &Media) -> SassResult<Option<Value>> {
        if self.state.declaration_name.is_some() {
            return Err(self.error(
                "Media rules may not be used within nested declarations.",
                rule.span,
            ));
        }

        let text = self.interpolate(&rule.query, true)?;
        let queries = parse_media_query_list(&text)
            .map_err(|e| self.splice_format_error(e, &rule.query, &text))?;

        let merged = match &self.state.media_queries {
            None => Some(queries.clone()),
            Some(current) => merge_media_queries(current, &queries),
        };
        if let Some(merged) = &merged {
            if merged.is_empty() {
                // the intersection matches nothing; drop the block
                return Ok(None);
            }
        }

        let merge_succeeded = merged.is_some();
        let effective = merged.clone().unwrap_or_else(|| queries.clone());
        let node = css::new_node(
            NodeKind::MediaRule {
                queries: effective.clone(),
            },
            rule.span,
        );

        let old_media = std::mem::replace(&mut self.state.media_queries, Some(effective));
        let result = self.with_parent_through(node, true, move |kind| {
            matches!(kind, NodeKind::StyleRule { .. })
                || (merge_succeeded && matches!(kind, NodeKind::MediaRule { .. }))
        }, |ev| {
            match ev.state.style_rule.clone() {
                None => ev.visit_stmts(&rule.body),
                Some(style_rule) => {
                    // copy the style rule under the media rule so bare
                    // declarations have a home
                    let copy = css::copy_with_style_rule(&style_rule.handle, rule.span);
                    ev.with_parent(copy, false, |ev| ev.visit_stmts(&rule.body))
                }
            }
        });
        self.state.media_queries = old_media;
        result
    }

    fn visit_supports(&mut self, rule: &Supports) -> SassResult<Option<Value>> {
        if self.state.declaration_name.is_some() {
            return Err(self.error(
                "Supports rules may not be used within nested declarations.",
                rule.span,
            ));
        }

        let condition = self.interpolate(&rule.condition, true)?;
        let node = css::new_node(NodeKind::SupportsRule { condition }, rule.span);

        self.with_parent_through(
            node,
            true,
            |kind| matches!(kind, NodeKind::StyleRule { .. }),
            |ev| match ev.state.style_rule.clone() {
                None => ev.visit_stmts(&rule.body),
                Some(style_rule) => {
                    let copy = css::copy_with_style_rule(&style_rule.handle, rule.span);
                    ev.with_parent(copy, false, |ev| ev.visit_stmts(&rule.body))
                }
            },
        )
    }

    fn visit_at_rule(&mut self, rule: &AtRule) -> SassResult<Option<Value>> {
        if self.state.declaration_name.is_some() {
            return Err(self.error(
                "At-rules may not be used within nested declarations.",
                rule.span,
            ));
        }

        let name = self.interpolate(&rule.name, false)?;
        let value = match &rule.value {
            Some(interpolation) => Some(self.interpolate(interpolation, true)?),
            None => None,
        };
        let is_keyframes = unvendor(&name) == "keyframes";

        let body = match &rule.body {
            None => {
                let node = css::new_node(
                    NodeKind::AtRule {
                        name,
                        value,
                        childless: true,
                    },
                    rule.span,
                );
                self.add_child(node, false);
                return Ok(None);
            }
            Some(body) => body,
        };

        let node = css::new_node(
            NodeKind::AtRule {
                name: name.clone(),
                value,
                childless: false,
            },
            rule.span,
        );

        let old_keyframes = self.state.in_keyframes;
        let old_unknown = self.state.in_unknown_at_rule;
        if is_keyframes {
            self.state.in_keyframes = true;
        } else {
            self.state.in_unknown_at_rule = true;
        }

        let result = self.with_parent_through(
            node,
            true,
            |kind| matches!(kind, NodeKind::StyleRule { .. }),
            |ev| match ev.state.style_rule.clone() {
                Some(style_rule) if !ev.state.in_keyframes && name != "font-face" => {
                    // wrap the body in a copy of the enclosing rule, as for
                    // @media
                    let copy = css::copy_with_style_rule(&style_rule.handle, rule.span);
                    ev.with_parent(copy, false, |ev| ev.visit_stmts(body))
                }
                _ => ev.visit_stmts(body),
            },
        );

        self.state.in_keyframes = old_keyframes;
        self.state.in_unknown_at_rule = old_unknown;
        result
    }

    fn visit_loud_comment(&mut self, comment: &LoudComment) -> SassResult<()> {
        if self.state.in_function {
            return Ok(());
        }

        let text = self.interpolate(&comment.text, false)?;
        let node = css::new_node(NodeKind::Comment { text }, comment.span);

        // comments before the first rule stay above hoisted imports
        if css::same_node(&self.state.parent, &self.state.root)
            && self.state.end_of_imports == count_children(&self.state.root)
        {
            self.state.end_of_imports += 1;
        }
        self.add_child(node, false);
        Ok(())
    }
}

fn count_children(node: &CssNode) -> usize {
    node.children().count()
}

/// Strips a vendor prefix: `-webkit-keyframes` becomes `keyframes`.
fn unvendor(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'-' || bytes[1] == b'-' {
        return name;
    }
    for i in 2..bytes.len() {
        if bytes[i] == b'-' {
            return &name[i + 1..];
        }
    }
    name
}

/// Searches a mixin body for `@content`, including nested blocks.
fn accepts_content(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        Stmt::Content(_) => true,
        Stmt::If(rule) => {
            rule.clauses.iter().any(|c| accepts_content(&c.body))
                || rule
                    .else_body
                    .as_ref()
                    .map_or(false, |body| accepts_content(body))
        }
        Stmt::Each(rule) => accepts_content(&rule.body),
        Stmt::For(rule) => accepts_content(&rule.body),
        Stmt::While(rule) => accepts_content(&rule.body),
        Stmt::StyleRule(rule) => accepts_content(&rule.body),
        Stmt::Media(rule) => accepts_content(&rule.body),
        Stmt::Supports(rule) => accepts_content(&rule.body),
        Stmt::AtRoot(rule) => accepts_content(&rule.body),
        Stmt::AtRule(rule) => rule
            .body
            .as_ref()
            .map_or(false, |body| accepts_content(body)),
        _ => false,
    })
}

/// Intersects two media query lists.  `None` means some pair was
/// unrepresentable; an empty list means the intersection matches nothing.
fn merge_media_queries(
    current: &[MediaQuery],
    new: &[MediaQuery],
) -> Option<Vec<MediaQuery>> {
    let mut merged = Vec::new();
    for a in current {
        for b in new {
            match a.merge(b) {
                MediaQueryMergeResult::Empty => continue,
                MediaQueryMergeResult::Unrepresentable => return None,
                MediaQueryMergeResult::Merged(query) => merged.push(query),
            }
        }
    }
    Some(merged)
}

// -------------------------------------------------------------------
// Imports and modules
// -------------------------------------------------------------------

impl Evaluator {
    fn visit_import(&mut self, import: &Import) -> SassResult<()> {
        for arg in &import.imports {
            match arg {
                ImportArg::Static {
                    url,
                    supports,
                    media,
                    span,
                } => {
                    let url_text = self.interpolate(url, false)?;
                    let mut modifiers = Vec::new();
                    if let Some(supports) = supports {
                        let condition = self.interpolate(supports, true)?;
                        modifiers.push(format!("supports({})", condition));
                    }
                    if let Some(media) = media {
                        modifiers.push(self.interpolate(media, true)?);
                    }
                    let node = css::new_node(
                        NodeKind::Import {
                            url: url_text,
                            modifiers: if modifiers.is_empty() {
                                None
                            } else {
                                Some(modifiers.join(" "))
                            },
                        },
                        *span,
                    );
                    self.add_import_node(node);
                }
                ImportArg::Dynamic { url, span } => {
                    self.visit_dynamic_import(url, *span)?;
                }
            }
        }
        Ok(())
    }

    /// Plain-CSS imports go into the import block at the top of the
    /// document; when CSS already follows it, they are hoisted afterwards.
    fn add_import_node(&mut self, node: CssNode) {
        if !css::same_node(&self.state.parent, &self.state.root) {
            self.add_child(node, false);
        } else if self.state.end_of_imports == count_children(&self.state.root) {
            css::append(&self.state.root, node);
            self.state.end_of_imports += 1;
        } else {
            self.state.out_of_order_imports.push(node);
        }
    }

    fn visit_dynamic_import(&mut self, url: &str, span: Span) -> SassResult<()> {
        self.with_frame("@import", span, |ev| {
            let loaded = ev.load_stylesheet(url, span, true)?;
            let canonical = loaded.canonical_url.clone();

            if ev.active_modules.contains(&canonical) {
                return Err(ev.error("This file is already being loaded.", span));
            }

            if loaded.stylesheet.has_module_statements() {
                // The imported sheet uses the module system: execute it as
                // a module and splice its CSS into the current context.
                let module = match ev.modules.get(&canonical).cloned() {
                    Some(module) => module,
                    None => {
                        ev.active_modules.insert(canonical.clone());
                        let module = ev.execute(
                            Some(canonical.clone()),
                            &Rc::clone(&loaded.stylesheet),
                            Configuration::implicit(),
                        );
                        ev.active_modules.remove(&canonical);
                        let module = module?;
                        ev.modules.insert(canonical, Rc::clone(&module));
                        module
                    }
                };

                forward_members(
                    &module,
                    &ev.state.environment.global_scope(),
                    None,
                    None,
                    None,
                );

                // splice the module's combined CSS: its upstream modules
                // first, then its own, with all their extension state
                let sorted = topological_modules(&module);
                for spliced in sorted.iter().rev() {
                    let downstream = spliced.extender.borrow();
                    ev.state.extender.borrow_mut().absorb(&downstream);
                    drop(downstream);
                    ev.splice_css(&spliced.css)?;
                }
                Ok(())
            } else {
                // plain Sass: execute inline, in the current scope
                ev.active_modules.insert(canonical.clone());
                let old_url = std::mem::replace(&mut ev.state.url, Some(canonical.clone()));
                let sheet = Rc::clone(&loaded.stylesheet);
                let result = ev.visit_stylesheet_body(&sheet);
                ev.state.url = old_url;
                ev.active_modules.remove(&canonical);
                result
            }
        })
    }

    /// Re-emits an imported module's CSS under the current context.  Nodes
    /// are shallow-copied (style rules keep their shared selector handle,
    /// so extensions still reach them); parents are re-established through
    /// the usual hoisting rules.
    fn splice_css(&mut self, root: &CssNode) -> SassResult<()> {
        let children: Vec<CssNode> = root.children().collect();
        for child in children {
            self.splice_node(&child)?;
        }
        Ok(())
    }

    fn splice_node(&mut self, node: &CssNode) -> SassResult<()> {
        enum Placement {
            Import,
            Leaf,
            StyleRule,
            MediaRule,
            OtherParent,
        }

        let placement = match &node.borrow().kind {
            NodeKind::Import { .. } => Placement::Import,
            NodeKind::Declaration { .. } | NodeKind::Comment { .. } => Placement::Leaf,
            NodeKind::StyleRule { .. } => Placement::StyleRule,
            NodeKind::MediaRule { .. } => Placement::MediaRule,
            _ => Placement::OtherParent,
        };

        let copy = css::copy_without_children(node);
        match placement {
            Placement::Import => {
                self.add_import_node(copy);
                return Ok(());
            }
            Placement::Leaf => {
                self.add_child(copy, false);
                return Ok(());
            }
            Placement::StyleRule => {
                self.add_child(copy.clone(), true);
            }
            Placement::MediaRule => {
                self.add_child_through(copy.clone(), |kind| {
                    matches!(
                        kind,
                        NodeKind::StyleRule { .. } | NodeKind::MediaRule { .. }
                    )
                });
            }
            Placement::OtherParent => {
                self.add_child(copy.clone(), true);
            }
        }

        let old_parent = std::mem::replace(&mut self.state.parent, copy);
        let result = self.splice_css(node);
        self.state.parent = old_parent;
        result
    }

    fn visit_use(&mut self, rule: &Use) -> SassResult<()> {
        let configuration = if rule.configuration.is_empty() {
            Configuration::implicit()
        } else {
            let mut values = Vec::new();
            for variable in &rule.configuration {
                let value = self.eval(&variable.value)?.without_slash();
                values.push((
                    variable.name.clone(),
                    ConfiguredValue {
                        value,
                        span: variable.span,
                    },
                ));
            }
            Configuration::explicit(values)
        };

        let namespace = match &rule.namespace {
            UseNamespace::Named(name) => Some(name.clone()),
            UseNamespace::Global => None,
            UseNamespace::Derived => Some(derive_namespace(&rule.url)),
        };

        let span = rule.span;
        self.load_module(
            &rule.url,
            "@use",
            span,
            configuration.clone(),
            false,
            |ev, module| {
                ev.state
                    .environment
                    .add_module(namespace, module)
                    .with_span(span)
            },
        )?;

        // anything still unconsumed was never declared with !default
        if !configuration.is_implicit() {
            if let Some((_, value)) = configuration.first() {
                return Err(self.error(
                    "This variable was not declared with !default in the @used module.",
                    value.span,
                ));
            }
        }
        Ok(())
    }

    fn visit_forward(&mut self, rule: &Forward) -> SassResult<()> {
        let incoming = self.state.configuration.clone();
        let own_names: Vec<&str> = rule
            .configuration
            .iter()
            .map(|v| v.name.as_str())
            .collect();

        // the forwarded module sees the incoming configuration overlaid
        // with this rule's own overrides; a guarded override yields to an
        // incoming one
        let configuration = if rule.configuration.is_empty() {
            incoming.clone()
        } else {
            let mut values = incoming.entries();
            for variable in &rule.configuration {
                if variable.guarded && values.iter().any(|(n, _)| n == &variable.name) {
                    continue;
                }
                let value = self.eval(&variable.value)?.without_slash();
                values.retain(|(n, _)| n != &variable.name);
                values.push((
                    variable.name.clone(),
                    ConfiguredValue {
                        value,
                        span: variable.span,
                    },
                ));
            }
            Configuration::explicit(values)
        };

        let span = rule.span;
        let prefix = rule.prefix.clone();
        let shown = rule.shown.clone();
        let hidden = rule.hidden.clone();
        self.load_module(
            &rule.url,
            "@forward",
            span,
            configuration.clone(),
            false,
            move |ev, module| {
                forward_members(
                    &module,
                    &ev.state.environment.global_scope(),
                    prefix.as_deref(),
                    shown.as_deref(),
                    hidden.as_deref(),
                );
                Ok(())
            },
        )?;

        // an override of this rule's own was never consumed: the forwarded
        // module has no matching !default variable
        for (name, value) in configuration.entries() {
            if own_names.iter().any(|n| *n == name) {
                return Err(self.error(
                    "This variable was not declared with !default in the @used module.",
                    value.span,
                ));
            }
        }

        // entries the forwarded module consumed are consumed for the
        // incoming configuration too
        if !incoming.shares_pool(&configuration) {
            let mut incoming = incoming;
            for name in incoming.names() {
                if !configuration.contains(&name) && !own_names.iter().any(|n| *n == name) {
                    incoming.remove(&name);
                }
            }
        }
        Ok(())
    }
}

/// Derives the default namespace of `@use "url"`: the basename, without a
/// leading underscore or trailing extension.
fn derive_namespace(url: &str) -> String {
    let base = url.strip_prefix("sass:").unwrap_or(url);
    let base = base.rsplit('/').next().unwrap_or(base);
    let base = base.strip_suffix(".scss").unwrap_or(base);
    base.strip_prefix('_').unwrap_or(base).to_owned()
}

// -------------------------------------------------------------------
// Expressions
// -------------------------------------------------------------------

/// A call site's arguments after evaluation, with spreads flattened.
struct EvaluatedArgs {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
    separator: ListSeparator,
    span: Span,
}

impl Evaluator {
    fn eval(&mut self, expr: &Expr) -> SassResult<Value> {
        match expr {
            Expr::Null { .. } => Ok(Value::Null),
            Expr::Boolean { value, .. } => Ok(Value::Bool(*value)),
            Expr::Number { value, unit, .. } => Ok(Value::Number(match unit {
                Some(unit) => SassNumber::with_unit(*value, unit.clone()),
                None => SassNumber::unitless(*value),
            })),
            Expr::Color { value, .. } => Ok(Value::Color(value.clone())),
            Expr::String { text, quoted } => {
                let text = self.interpolate(text, false)?;
                Ok(if *quoted {
                    Value::quoted_string(text)
                } else {
                    Value::unquoted_string(text)
                })
            }
            Expr::List {
                elements,
                separator,
                bracketed,
                ..
            } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element)?);
                }
                Ok(Value::List {
                    elements: values,
                    separator: *separator,
                    bracketed: *bracketed,
                })
            }
            Expr::Map { pairs, span: _ } => {
                let mut map = crate::value::SassMap::new();
                for (key_expr, value_expr) in pairs {
                    let key = self.eval(key_expr)?;
                    let value = self.eval(value_expr)?;
                    if map.insert(key, value) {
                        return Err(self.error("Duplicate key.", key_expr.span()));
                    }
                }
                Ok(Value::Map(map))
            }
            Expr::Variable {
                name,
                namespace,
                span,
            } => self
                .state
                .environment
                .get_variable(name, namespace.as_deref())
                .ok_or_else(|| self.error("Undefined variable.", *span)),
            Expr::ParentSelector { .. } => Ok(match &self.state.style_rule {
                Some(style_rule) => selector_to_value(&style_rule.original),
                None => Value::Null,
            }),
            Expr::FunctionCall {
                name,
                namespace,
                arguments,
                span,
            } => self.visit_function_call(name, namespace.as_deref(), arguments, *span),
            Expr::UnaryOp { op, operand, span } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Plus => value.unary_plus(),
                    UnaryOp::Minus => value.unary_minus(),
                    UnaryOp::DividedBy => value.unary_divide(),
                    UnaryOp::Not => Ok(value.unary_not()),
                }
                .with_span(*span)
                .map_err(|e| e.ensure_trace(&self.stack_trace(*span)))
            }
            Expr::BinaryOp {
                op,
                left,
                right,
                allows_slash,
                span,
            } => self.visit_binary_op(*op, left, right, *allows_slash, *span),
            Expr::Paren { expr, .. } => self.eval(expr),
        }
    }

    fn visit_binary_op(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        allows_slash: bool,
        span: Span,
    ) -> SassResult<Value> {
        match op {
            BinaryOp::And => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            BinaryOp::Or => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            BinaryOp::Equals => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(Value::Bool(left == right))
            }
            BinaryOp::NotEquals => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(Value::Bool(left != right))
            }
            BinaryOp::DividedBy => {
                let left_value = self.eval(left)?;
                let right_value = self.eval(right)?;
                let result = left_value
                    .clone()
                    .without_slash()
                    .divide(&right_value.clone().without_slash())
                    .with_span(span)?;

                // `a/b` between literal numbers keeps its textual form
                // until arithmetic touches it
                if allows_slash && left.is_slash_operand() && right.is_slash_operand() {
                    if let (Value::Number(result), Value::Number(l), Value::Number(r)) =
                        (&result, &left_value, &right_value)
                    {
                        return Ok(Value::Number(
                            result.clone().with_slash(l.clone(), r.clone()),
                        ));
                    }
                }
                Ok(result)
            }
            _ => {
                let left = self.eval(left)?.without_slash();
                let right = self.eval(right)?.without_slash();
                let result = match op {
                    BinaryOp::Plus => left.plus(&right),
                    BinaryOp::Minus => left.minus(&right),
                    BinaryOp::Times => left.times(&right),
                    BinaryOp::Modulo => left.modulo(&right),
                    BinaryOp::GreaterThan => left.greater_than(&right),
                    BinaryOp::GreaterThanOrEquals => left.greater_than_or_equals(&right),
                    BinaryOp::LessThan => left.less_than(&right),
                    BinaryOp::LessThanOrEquals => left.less_than_or_equals(&right),
                    BinaryOp::SingleEquals => left.single_equals(&right),
                    _ => unreachable!("handled above"),
                };
                result
                    .with_span(span)
                    .map_err(|e| e.ensure_trace(&self.stack_trace(span)))
            }
        }
    }

    // ---------------------------------------------------------------
    // Function dispatch
    // ---------------------------------------------------------------

    fn visit_function_call(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        invocation: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<Value> {
        let local = self.state.environment.get_function(name, namespace);

        if local.is_none() && namespace.is_none() {
            // language-level functions that need evaluator state
            match name {
                "if" => return self.visit_if_function(invocation, span),
                "content-exists" => {
                    if !self.state.environment.in_mixin() {
                        return Err(self.error(
                            "content-exists() may only be called within a mixin.",
                            span,
                        ));
                    }
                    return Ok(Value::Bool(self.state.environment.content().is_some()));
                }
                "call" => return self.visit_call_function(invocation, span),
                _ => {}
            }
        }

        let callable = match local {
            Some(callable) => callable,
            None => {
                if namespace.is_some() {
                    return Err(self.error("Undefined function.", span));
                }
                match self.global_functions.get(name) {
                    Some(callable) => (**callable).clone(),
                    // a purely plain-CSS call serializes its arguments
                    None => SassCallable::PlainCss(name.to_owned()),
                }
            }
        };

        self.call_callable(&callable, name, invocation, span)
    }

    /// `if($condition, $if-true, $if-false)`: only the taken branch is
    /// evaluated.
    fn visit_if_function(
        &mut self,
        invocation: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<Value> {
        fn find<'a>(
            invocation: &'a ArgumentInvocation,
            position: usize,
            name: &str,
        ) -> Option<&'a Expr> {
            invocation.positional.get(position).or_else(|| {
                invocation
                    .named
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, e)| e)
            })
        }

        let condition = find(invocation, 0, "condition")
            .ok_or_else(|| self.error("Missing argument $condition.", span))?;
        let if_true = find(invocation, 1, "if-true")
            .ok_or_else(|| self.error("Missing argument $if-true.", span))?;
        let if_false = find(invocation, 2, "if-false")
            .ok_or_else(|| self.error("Missing argument $if-false.", span))?;

        if self.eval(condition)?.is_truthy() {
            self.eval(if_true)
        } else {
            self.eval(if_false)
        }
    }

    /// `call($function, $args...)`: invokes a function reference; a string
    /// resolves by name, with a deprecation warning.
    fn visit_call_function(
        &mut self,
        invocation: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<Value> {
        let function_expr = invocation
            .positional
            .first()
            .ok_or_else(|| self.error("Missing argument $function.", span))?;
        let function = self.eval(function_expr)?;

        let rest = ArgumentInvocation {
            positional: invocation.positional[1..].to_vec(),
            named: invocation.named.clone(),
            rest: invocation.rest.clone(),
            keyword_rest: invocation.keyword_rest.clone(),
            span: invocation.span,
        };

        let (callable, name) = match function {
            Value::Function(function) => {
                ((*function.callable).clone(), function.name)
            }
            Value::String(string) => {
                self.warn(
                    &format!(
                        "Passing a string to call() is deprecated and will be illegal in future \
                         versions.\n\nRecommendation: call(get-function({}))",
                        string.text
                    ),
                    span,
                    true,
                );
                let name = string.text;
                let callable = self
                    .state
                    .environment
                    .get_function(&name, None)
                    .or_else(|| self.global_functions.get(&name).map(|c| (**c).clone()))
                    .unwrap_or_else(|| SassCallable::PlainCss(name.clone()));
                (callable, name)
            }
            other => {
                return Err(self.error(
                    format!("$function: {} is not a function reference.", other.inspect()),
                    function_expr.span(),
                ))
            }
        };

        self.call_callable(&callable, &name, &rest, span)
    }

    fn call_callable(
        &mut self,
        callable: &SassCallable,
        name: &str,
        invocation: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<Value> {
        match callable {
            SassCallable::UserDefined(callable) => {
                let callable = callable.clone();
                let member = format!("{}()", name);
                self.with_frame(&member, span, |ev| {
                    let old_in_function = std::mem::replace(&mut ev.state.in_function, true);
                    let result = ev.run_user_defined(&callable, invocation, span, |ev| {
                        match ev.visit_stmts(&callable.declaration.body)? {
                            Some(value) => Ok(value),
                            None => Err(ev.error(
                                "Function finished without @return.",
                                callable.declaration.span,
                            )),
                        }
                    });
                    ev.state.in_function = old_in_function;
                    result
                })
            }
            SassCallable::Builtin(builtin) => {
                let builtin = builtin.clone();
                let member = format!("{}()", name);
                self.with_frame(&member, span, |ev| {
                    ev.run_builtin(&builtin, invocation, span)
                })
            }
            SassCallable::PlainCss(name) => {
                if !invocation.named.is_empty() || invocation.keyword_rest.is_some() {
                    return Err(self.error(
                        "Plain CSS functions don't support keyword arguments.",
                        span,
                    ));
                }
                let mut parts = Vec::new();
                for argument in &invocation.positional {
                    let value = self.eval(argument)?;
                    parts.push(value.to_css_string(true).with_span(argument.span())?);
                }
                if let Some(rest) = &invocation.rest {
                    let value = self.eval(rest)?;
                    for element in value.as_list() {
                        parts.push(element.to_css_string(true).with_span(rest.span())?);
                    }
                }
                Ok(Value::unquoted_string(format!(
                    "{}({})",
                    name,
                    parts.join(", ")
                )))
            }
        }
    }

    /// Evaluates a call site's arguments, flattening `$args...` spreads.
    fn eval_arguments(&mut self, invocation: &ArgumentInvocation) -> SassResult<EvaluatedArgs> {
        let mut positional = Vec::with_capacity(invocation.positional.len());
        for expr in &invocation.positional {
            positional.push(self.eval(expr)?);
        }

        let mut named: Vec<(String, Value)> = Vec::new();
        for (name, expr) in &invocation.named {
            let value = self.eval(expr)?;
            named.retain(|(n, _)| n != name);
            named.push((name.clone(), value));
        }

        let mut separator = ListSeparator::Undecided;
        if let Some(rest) = &invocation.rest {
            let value = self.eval(rest)?;
            match value {
                Value::ArgList(args) => {
                    separator = args.separator;
                    positional.extend(args.elements.iter().cloned());
                    for (name, value) in args.keywords() {
                        named.retain(|(n, _)| n != name);
                        named.push((name.clone(), value.clone()));
                    }
                }
                Value::Map(map) => {
                    add_named_from_map(&mut named, map).with_span(rest.span())?;
                }
                Value::List {
                    elements,
                    separator: list_separator,
                    ..
                } => {
                    separator = list_separator;
                    positional.extend(elements);
                }
                other => positional.push(other),
            }
        }

        if let Some(keyword_rest) = &invocation.keyword_rest {
            let map = self
                .eval(keyword_rest)?
                .assert_map(None)
                .with_span(keyword_rest.span())?;
            add_named_from_map(&mut named, map).with_span(keyword_rest.span())?;
        }

        Ok(EvaluatedArgs {
            positional,
            named,
            separator,
            span: invocation.span,
        })
    }

    /// Runs a user-defined callable: evaluates the arguments, installs the
    /// closure environment, binds parameters in a fresh scope, runs `f`,
    /// and restores everything.
    fn run_user_defined<T>(
        &mut self,
        callable: &UserDefinedCallable,
        invocation: &ArgumentInvocation,
        span: Span,
        f: impl FnOnce(&mut Self) -> SassResult<T>,
    ) -> SassResult<T> {
        let args = self.eval_arguments(invocation)?;

        let mut environment = callable.environment.closure();
        std::mem::swap(&mut self.state.environment, &mut environment);

        let result = self.scoped(false, |ev| {
            let arg_list = ev.bind_arguments(&callable.declaration.arguments, &args)?;
            let value = f(ev)?;

            // named arguments the callee neither declared nor observed
            // through $kwargs are an error
            if let Some(arg_list) = arg_list {
                if !arg_list.were_keywords_accessed() {
                    if let Some((name, _)) = arg_list.keywords().first() {
                        return Err(ev.error(format!("No argument named ${}.", name), span));
                    }
                }
            }
            Ok(value)
        });

        std::mem::swap(&mut self.state.environment, &mut environment);
        result
    }

    /// Binds evaluated arguments to a declaration in the current scope.
    /// Returns the rest-argument list, if the declaration has one.
    fn bind_arguments(
        &mut self,
        declaration: &ArgumentDeclaration,
        args: &EvaluatedArgs,
    ) -> SassResult<Option<ArgList>> {
        let names: Vec<String> = args.named.iter().map(|(n, _)| n.clone()).collect();
        declaration
            .verify(args.positional.len(), &names)
            .with_span(args.span)?;

        let mut named = args.named.clone();
        for (i, argument) in declaration.arguments.iter().enumerate() {
            let value = if i < args.positional.len() {
                args.positional[i].clone()
            } else if let Some(position) = named.iter().position(|(n, _)| *n == argument.name) {
                named.remove(position).1
            } else {
                let default = argument
                    .default
                    .as_ref()
                    .expect("verify() rejected missing arguments");
                self.eval(default)?
            };
            self.state
                .environment
                .set_local_variable(&argument.name, value, None);
        }

        match &declaration.rest {
            None => Ok(None),
            Some(rest_name) => {
                let extra = args
                    .positional
                    .get(declaration.arguments.len()..)
                    .unwrap_or(&[])
                    .to_vec();
                let separator = match args.separator {
                    ListSeparator::Undecided => ListSeparator::Comma,
                    other => other,
                };
                let arg_list = ArgList::new(extra, named, separator);
                self.state.environment.set_local_variable(
                    rest_name,
                    Value::ArgList(arg_list.clone()),
                    None,
                );
                Ok(Some(arg_list))
            }
        }
    }

    /// Runs a built-in: picks an overload by shape, binds values in
    /// parameter order, calls the native body.
    fn run_builtin(
        &mut self,
        builtin: &BuiltinCallable,
        invocation: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<Value> {
        let args = self.eval_arguments(invocation)?;
        let names: Vec<String> = args.named.iter().map(|(n, _)| n.clone()).collect();

        let overload = builtin
            .overload_for(args.positional.len(), &names)
            .ok_or_else(|| {
                let first = &builtin.overloads[0];
                self.error(
                    overload_mismatch_message(first, args.positional.len(), &names),
                    span,
                )
            })?
            .clone();

        let mut named = args.named.clone();
        let mut values = Vec::with_capacity(overload.parameters.len() + 1);
        for (i, parameter) in overload.parameters.iter().enumerate() {
            let value = if i < args.positional.len() {
                args.positional[i].clone()
            } else if let Some(position) = named.iter().position(|(n, _)| *n == parameter.name) {
                named.remove(position).1
            } else {
                parameter
                    .default
                    .clone()
                    .expect("overload_for() checked coverage")
            };
            values.push(value);
        }

        let arg_list = overload.rest.as_ref().map(|_| {
            let extra = args
                .positional
                .get(overload.parameters.len()..)
                .unwrap_or(&[])
                .to_vec();
            let separator = match args.separator {
                ListSeparator::Undecided => ListSeparator::Comma,
                other => other,
            };
            ArgList::new(extra, named.clone(), separator)
        });
        if let Some(arg_list) = &arg_list {
            values.push(Value::ArgList(arg_list.clone()));
        }

        let result = (overload.body)(values).with_span(span)?;

        if let Some(arg_list) = arg_list {
            if !arg_list.were_keywords_accessed() {
                if let Some((name, _)) = arg_list.keywords().first() {
                    return Err(self.error(format!("No argument named ${}.", name), span));
                }
            }
        }
        Ok(result)
    }

    // ---------------------------------------------------------------
    // Interpolation
    // ---------------------------------------------------------------

    /// Evaluates an interpolation to text: literal parts verbatim,
    /// expression parts serialized unquoted.
    fn interpolate(
        &mut self,
        interpolation: &Interpolation,
        warn_for_color: bool,
    ) -> SassResult<String> {
        let mut out = String::new();
        for part in &interpolation.parts {
            match part {
                InterpolationPart::Literal(text) => out.push_str(text),
                InterpolationPart::Expr(expr) => {
                    let value = self.eval(expr)?;

                    if warn_for_color {
                        if let Value::Color(color) = &value {
                            if let Some(name) = color.name() {
                                self.warn(
                                    &format!(
                                        "You probably don't mean to use the color value {} in \
                                         interpolation here.\nIt may end up represented as {}, \
                                         which will likely produce invalid CSS.\nAlways quote \
                                         color names when using them as strings or map keys.",
                                        name, color
                                    ),
                                    expr.span(),
                                    false,
                                );
                            }
                        }
                    }

                    out.push_str(&value.to_css_string(false).with_span(expr.span())?);
                }
            }
        }
        Ok(out)
    }

    /// Rewrites a re-parse failure to point inside the interpolation that
    /// produced the text.  When the interpolation was a single literal the
    /// offending range maps straight back into the source; otherwise the
    /// whole interpolation is blamed.
    fn splice_format_error(
        &self,
        error: FormatError,
        interpolation: &Interpolation,
        text: &str,
    ) -> Box<SassError> {
        let len = interpolation.span.len() as usize;
        let span = if interpolation.as_plain().is_some()
            && error.start <= error.end
            && error.end <= text.len()
            && error.end <= len
        {
            interpolation
                .span
                .subspan(error.start as u64, error.end as u64)
        } else {
            interpolation.span
        };
        self.error(error.message, span)
    }

    // ---------------------------------------------------------------
    // CSS-tree plumbing
    // ---------------------------------------------------------------

    /// Appends a node to the current parent; with `through_style_rule`,
    /// hoists it out of enclosing style rules first.
    fn add_child(&mut self, node: CssNode, through_style_rule: bool) {
        if through_style_rule {
            self.add_child_through(node, |kind| matches!(kind, NodeKind::StyleRule { .. }));
        } else {
            css::append(&self.state.parent, node);
        }
    }

    /// Appends a node to the nearest ancestor the predicate rejects.  If
    /// that ancestor already has later children, appending would reorder
    /// emitted CSS; a childless copy is appended after them instead.
    fn add_child_through(&mut self, node: CssNode, through: impl Fn(&NodeKind) -> bool) {
        let mut parent = self.state.parent.clone();
        while through(&parent.borrow().kind) {
            parent = parent
                .parent()
                .expect("the predicate never matches the root stylesheet");
        }

        if css::has_following_sibling(&parent) {
            let grandparent = parent.parent().expect("only the root lacks a parent");
            let copy = css::copy_without_children(&parent);
            css::append(&grandparent, copy.clone());
            parent = copy;
        }

        css::append(&parent, node);
    }

    /// Appends `node` and makes it the current parent for `f`.
    fn with_parent<T>(
        &mut self,
        node: CssNode,
        through_style_rule: bool,
        f: impl FnOnce(&mut Self) -> SassResult<T>,
    ) -> SassResult<T> {
        self.add_child(node.clone(), through_style_rule);
        let old_parent = std::mem::replace(&mut self.state.parent, node);
        let result = f(self);
        self.state.parent = old_parent;
        result
    }

    /// Like [`with_parent`](Self::with_parent) with a custom hoisting
    /// predicate and an optional variable scope.
    fn with_parent_through<T>(
        &mut self,
        node: CssNode,
        scope: bool,
        through: impl Fn(&NodeKind) -> bool,
        f: impl FnOnce(&mut Self) -> SassResult<T>,
    ) -> SassResult<T> {
        self.add_child_through(node.clone(), through);
        let old_parent = std::mem::replace(&mut self.state.parent, node);
        let result = if scope {
            self.scoped(false, f)
        } else {
            f(self)
        };
        self.state.parent = old_parent;
        result
    }

    /// Runs `f` in a fresh variable scope.  Every construct that opens a
    /// scope (rule bodies, control flow, callable invocations) funnels
    /// through here.
    fn scoped<T>(
        &mut self,
        semi_global: bool,
        f: impl FnOnce(&mut Self) -> SassResult<T>,
    ) -> SassResult<T> {
        self.state.environment.push_scope(semi_global);
        let result = f(self);
        self.state.environment.pop_scope();
        result
    }
}

fn add_named_from_map(
    named: &mut Vec<(String, Value)>,
    map: crate::value::SassMap,
) -> Result<(), ScriptError> {
    for (key, value) in map {
        match key {
            Value::String(s) => {
                named.retain(|(n, _)| *n != s.text);
                named.push((s.text, value));
            }
            other => {
                return Err(ScriptError::new(format!(
                    "Variable keyword argument map must have string keys.\n{} is not a string.",
                    other.inspect()
                )))
            }
        }
    }
    Ok(())
}

/// The value of `&`: the selector as a comma-separated Sass list of
/// space-separated component lists.
fn selector_to_value(list: &SelectorList) -> Value {
    Value::comma_list(
        list.components
            .iter()
            .map(|complex| {
                Value::space_list(
                    complex
                        .components
                        .iter()
                        .map(|component| match component {
                            ComplexComponent::Compound(compound) => {
                                Value::unquoted_string(compound.to_string())
                            }
                            ComplexComponent::Combinator(combinator) => {
                                Value::unquoted_string(combinator.to_string())
                            }
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Why an invocation matched no overload, phrased like the user-facing
/// argument errors.
fn overload_mismatch_message(
    overload: &BuiltinOverload,
    positional: usize,
    names: &[String],
) -> String {
    for (i, parameter) in overload.parameters.iter().enumerate() {
        let covered = i < positional
            || names.iter().any(|n| *n == parameter.name)
            || parameter.default.is_some();
        if !covered {
            return format!("Missing argument ${}.", parameter.name);
        }
    }

    if positional > overload.parameters.len() && overload.rest.is_none() {
        let max = overload.parameters.len();
        return format!(
            "Only {} {} allowed, but {} {} passed.",
            max,
            if max == 1 { "argument" } else { "arguments" },
            positional,
            if positional == 1 { "was" } else { "were" }
        );
    }

    match names
        .iter()
        .find(|n| !overload.parameters.iter().any(|p| p.name == **n))
    {
        Some(name) => format!("No argument named ${}.", name),
        None => "Invalid arguments.".to_owned(),
    }
}
