//! Statement nodes.

use std::rc::Rc;

use codemap::Span;

use crate::ast::args::{ArgumentDeclaration, ArgumentInvocation};
use crate::ast::{Expr, Interpolation};

/// A parsed Sass source file: the root of the input tree.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Stylesheet {
    pub fn new(body: Vec<Stmt>, span: Span) -> Stylesheet {
        Stylesheet { body, span }
    }

    /// Whether this sheet uses the module system.  A legacy `@import` of a
    /// sheet that does executes it as a module instead of inlining it.
    pub fn has_module_statements(&self) -> bool {
        self.body
            .iter()
            .any(|stmt| matches!(stmt, Stmt::Use(_) | Stmt::Forward(_)))
    }
}

/// The declaration of a mixin, function, or content block.
///
/// Shared by reference: a closure captured at declaration time and the
/// declaration site both point at the same node.
#[derive(Debug)]
pub struct CallableDecl {
    pub name: String,
    pub arguments: ArgumentDeclaration,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selector: Interpolation,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: Interpolation,
    pub value: Option<Expr>,
    /// Nested declarations: `font: { family: serif; }`.
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    pub namespace: Option<String>,
    pub value: Expr,
    /// `!default`
    pub guarded: bool,
    /// `!global`
    pub global: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Include {
    pub name: String,
    pub namespace: Option<String>,
    pub arguments: ArgumentInvocation,
    /// The trailing `{ ... }` content block, stored as an anonymous
    /// callable declaration.
    pub content: Option<Rc<CallableDecl>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Content {
    pub arguments: ArgumentInvocation,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfClause {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct If {
    pub clauses: Vec<IfClause>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Each {
    pub variables: Vec<String>,
    pub list: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct For {
    pub variable: String,
    pub from: Expr,
    pub to: Expr,
    /// `to` (exclusive) vs `through` (inclusive).
    pub exclusive: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct While {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Extend {
    pub selector: Interpolation,
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AtRoot {
    pub query: Option<Interpolation>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Media {
    pub query: Interpolation,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Supports {
    pub condition: Interpolation,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `@keyframes`, `@font-face`, and any at-rule the evaluator has no special
/// handling for.
#[derive(Debug, Clone)]
pub struct AtRule {
    pub name: Interpolation,
    pub value: Option<Interpolation>,
    /// `None` for childless rules (`@charset "utf-8";`).
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

/// One argument of an `@import` statement.
#[derive(Debug, Clone)]
pub enum ImportArg {
    /// A Sass import, to be loaded and executed.
    Dynamic { url: String, span: Span },
    /// A plain-CSS import, passed through to the output.
    Static {
        url: Interpolation,
        supports: Option<Interpolation>,
        media: Option<Interpolation>,
        span: Span,
    },
}

impl ImportArg {
    pub fn span(&self) -> Span {
        match self {
            ImportArg::Dynamic { span, .. } | ImportArg::Static { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Import {
    pub imports: Vec<ImportArg>,
    pub span: Span,
}

/// The namespace an `@use` binds its module under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseNamespace {
    /// No `as` clause: the namespace is the URL's basename.
    Derived,
    /// `as *`: members are visible unprefixed.
    Global,
    Named(String),
}

#[derive(Debug, Clone)]
pub struct ConfiguredVariable {
    pub name: String,
    pub value: Expr,
    /// `!default` in a `with` clause: only applies if the module doesn't
    /// already have a concrete configuration for the variable.
    pub guarded: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Use {
    pub url: String,
    pub namespace: UseNamespace,
    pub configuration: Vec<ConfiguredVariable>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Forward {
    pub url: String,
    pub prefix: Option<String>,
    pub shown: Option<Vec<String>>,
    pub hidden: Option<Vec<String>>,
    pub configuration: Vec<ConfiguredVariable>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LoudComment {
    pub text: Interpolation,
    pub span: Span,
}

/// A statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    StyleRule(StyleRule),
    Declaration(Declaration),
    Variable(VariableDecl),
    FunctionDecl(Rc<CallableDecl>),
    MixinDecl(Rc<CallableDecl>),
    Include(Include),
    Content(Content),
    Return { value: Expr, span: Span },
    If(If),
    Each(Each),
    For(For),
    While(While),
    Extend(Extend),
    AtRoot(AtRoot),
    Media(Media),
    Supports(Supports),
    AtRule(AtRule),
    Import(Import),
    Use(Use),
    Forward(Forward),
    Warn { value: Expr, span: Span },
    Debug { value: Expr, span: Span },
    Error { value: Expr, span: Span },
    LoudComment(LoudComment),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::StyleRule(s) => s.span,
            Stmt::Declaration(s) => s.span,
            Stmt::Variable(s) => s.span,
            Stmt::FunctionDecl(s) | Stmt::MixinDecl(s) => s.span,
            Stmt::Include(s) => s.span,
            Stmt::Content(s) => s.span,
            Stmt::Return { span, .. } => *span,
            Stmt::If(s) => s.span,
            Stmt::Each(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Extend(s) => s.span,
            Stmt::AtRoot(s) => s.span,
            Stmt::Media(s) => s.span,
            Stmt::Supports(s) => s.span,
            Stmt::AtRule(s) => s.span,
            Stmt::Import(s) => s.span,
            Stmt::Use(s) => s.span,
            Stmt::Forward(s) => s.span,
            Stmt::Warn { span, .. } | Stmt::Debug { span, .. } | Stmt::Error { span, .. } => *span,
            Stmt::LoudComment(s) => s.span,
        }
    }
}
