//! Shared helpers for building input trees by hand.
//!
//! The parser is not part of this crate, so tests construct the AST
//! directly.  `Ctx` owns a code map with one dummy file and stamps every
//! node with that file's span.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use codemap::{CodeMap, Span};

use sass_eval::ast::{
    Argument, ArgumentDeclaration, ArgumentInvocation, CallableDecl, Content, Declaration, Expr,
    Extend, If, IfClause, Include, Interpolation, Media, Stmt, StyleRule, Stylesheet,
    VariableDecl,
};
use sass_eval::logger::{Logger, WarnOptions};
use sass_eval::value::ListSeparator;

pub struct Ctx {
    pub map: CodeMap,
    pub span: Span,
}

impl Ctx {
    pub fn new() -> Ctx {
        let mut map = CodeMap::new();
        let span = map
            .add_file("test.scss".to_owned(), "/* synthetic */".to_owned())
            .span;
        Ctx { map, span }
    }

    pub fn sheet(&self, body: Vec<Stmt>) -> Stylesheet {
        Stylesheet::new(body, self.span)
    }

    // ---- expressions ----

    pub fn num(&self, value: f64) -> Expr {
        Expr::Number {
            value,
            unit: None,
            span: self.span,
        }
    }

    pub fn unit(&self, value: f64, unit: &str) -> Expr {
        Expr::Number {
            value,
            unit: Some(unit.to_owned()),
            span: self.span,
        }
    }

    pub fn ident(&self, text: &str) -> Expr {
        Expr::String {
            text: Interpolation::plain(text, self.span),
            quoted: false,
        }
    }

    pub fn quoted(&self, text: &str) -> Expr {
        Expr::String {
            text: Interpolation::plain(text, self.span),
            quoted: true,
        }
    }

    pub fn variable(&self, name: &str) -> Expr {
        Expr::Variable {
            name: name.to_owned(),
            namespace: None,
            span: self.span,
        }
    }

    pub fn ns_variable(&self, namespace: &str, name: &str) -> Expr {
        Expr::Variable {
            name: name.to_owned(),
            namespace: Some(namespace.to_owned()),
            span: self.span,
        }
    }

    pub fn bin(&self, op: sass_eval::ast::BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            allows_slash: true,
            span: self.span,
        }
    }

    pub fn call(&self, name: &str, positional: Vec<Expr>) -> Expr {
        Expr::FunctionCall {
            name: name.to_owned(),
            namespace: None,
            arguments: ArgumentInvocation::positional(positional, self.span),
            span: self.span,
        }
    }

    pub fn call_named(&self, name: &str, named: Vec<(&str, Expr)>) -> Expr {
        Expr::FunctionCall {
            name: name.to_owned(),
            namespace: None,
            arguments: ArgumentInvocation {
                positional: Vec::new(),
                named: named
                    .into_iter()
                    .map(|(n, e)| (n.to_owned(), e))
                    .collect(),
                rest: None,
                keyword_rest: None,
                span: self.span,
            },
            span: self.span,
        }
    }

    pub fn list(&self, elements: Vec<Expr>, separator: ListSeparator) -> Expr {
        Expr::List {
            elements,
            separator,
            bracketed: false,
            span: self.span,
        }
    }

    pub fn map(&self, pairs: Vec<(Expr, Expr)>) -> Expr {
        Expr::Map {
            pairs,
            span: self.span,
        }
    }

    // ---- statements ----

    pub fn style_rule(&self, selector: &str, body: Vec<Stmt>) -> Stmt {
        Stmt::StyleRule(StyleRule {
            selector: Interpolation::plain(selector, self.span),
            body,
            span: self.span,
        })
    }

    pub fn decl(&self, name: &str, value: Expr) -> Stmt {
        Stmt::Declaration(Declaration {
            name: Interpolation::plain(name, self.span),
            value: Some(value),
            body: None,
            span: self.span,
        })
    }

    pub fn nested_decl(&self, name: &str, value: Option<Expr>, body: Vec<Stmt>) -> Stmt {
        Stmt::Declaration(Declaration {
            name: Interpolation::plain(name, self.span),
            value,
            body: Some(body),
            span: self.span,
        })
    }

    pub fn var(&self, name: &str, value: Expr) -> Stmt {
        Stmt::Variable(VariableDecl {
            name: name.to_owned(),
            namespace: None,
            value,
            guarded: false,
            global: false,
            span: self.span,
        })
    }

    pub fn var_default(&self, name: &str, value: Expr) -> Stmt {
        Stmt::Variable(VariableDecl {
            name: name.to_owned(),
            namespace: None,
            value,
            guarded: true,
            global: false,
            span: self.span,
        })
    }

    pub fn args(&self, names: &[&str]) -> ArgumentDeclaration {
        ArgumentDeclaration {
            arguments: names
                .iter()
                .map(|name| Argument {
                    name: (*name).to_owned(),
                    default: None,
                    span: self.span,
                })
                .collect(),
            rest: None,
            span: self.span,
        }
    }

    pub fn mixin(&self, name: &str, args: &[&str], body: Vec<Stmt>) -> Stmt {
        Stmt::MixinDecl(Rc::new(CallableDecl {
            name: name.to_owned(),
            arguments: self.args(args),
            body,
            span: self.span,
        }))
    }

    pub fn function(&self, name: &str, args: &[&str], body: Vec<Stmt>) -> Stmt {
        Stmt::FunctionDecl(Rc::new(CallableDecl {
            name: name.to_owned(),
            arguments: self.args(args),
            body,
            span: self.span,
        }))
    }

    pub fn ret(&self, value: Expr) -> Stmt {
        Stmt::Return {
            value,
            span: self.span,
        }
    }

    pub fn include(&self, name: &str, positional: Vec<Expr>) -> Stmt {
        Stmt::Include(Include {
            name: name.to_owned(),
            namespace: None,
            arguments: ArgumentInvocation::positional(positional, self.span),
            content: None,
            span: self.span,
        })
    }

    pub fn include_with_content(
        &self,
        name: &str,
        positional: Vec<Expr>,
        content: Vec<Stmt>,
    ) -> Stmt {
        Stmt::Include(Include {
            name: name.to_owned(),
            namespace: None,
            arguments: ArgumentInvocation::positional(positional, self.span),
            content: Some(Rc::new(CallableDecl {
                name: "@content".to_owned(),
                arguments: ArgumentDeclaration::empty(self.span),
                body: content,
                span: self.span,
            })),
            span: self.span,
        })
    }

    pub fn content(&self) -> Stmt {
        Stmt::Content(Content {
            arguments: ArgumentInvocation::empty(self.span),
            span: self.span,
        })
    }

    pub fn media(&self, query: &str, body: Vec<Stmt>) -> Stmt {
        Stmt::Media(Media {
            query: Interpolation::plain(query, self.span),
            body,
            span: self.span,
        })
    }

    pub fn extend(&self, selector: &str) -> Stmt {
        Stmt::Extend(Extend {
            selector: Interpolation::plain(selector, self.span),
            optional: false,
            span: self.span,
        })
    }

    pub fn extend_optional(&self, selector: &str) -> Stmt {
        Stmt::Extend(Extend {
            selector: Interpolation::plain(selector, self.span),
            optional: true,
            span: self.span,
        })
    }

    pub fn if_else(&self, condition: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt>) -> Stmt {
        Stmt::If(If {
            clauses: vec![IfClause {
                condition,
                body: then,
            }],
            else_body: Some(otherwise),
            span: self.span,
        })
    }
}

/// Captures warnings and debug lines for assertions.
#[derive(Default)]
pub struct TestLogger {
    pub warnings: RefCell<Vec<String>>,
    pub debugs: RefCell<Vec<String>>,
}

impl Logger for TestLogger {
    fn warn(&self, message: &str, _options: &WarnOptions) {
        self.warnings.borrow_mut().push(message.to_owned());
    }

    fn debug(&self, message: &str, _span: Span) {
        self.debugs.borrow_mut().push(message.to_owned());
    }
}
