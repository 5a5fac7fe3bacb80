//! Evaluate Sass syntax trees into plain-CSS trees.
//!
//! This crate is the evaluation core of a Sass compiler: the tree-walking
//! interpreter that sits between a parser and a serializer.  Given a parsed
//! [`Stylesheet`](ast::Stylesheet), optional configured globals, and an
//! importer that resolves `@use`/`@forward`/`@import` URLs to further
//! stylesheets, it executes the Sass semantics — scoping, interpolation,
//! user-defined and built-in callables, parent-selector nesting, `@extend`,
//! media-query merging, `@at-root` hoisting, module composition — and
//! produces a mutable CSS tree plus position-accurate diagnostics with a
//! Sass-level stack trace.
//!
//! What it does *not* do: parse Sass source (the host supplies the AST,
//! with [`codemap`] spans), serialize source maps, or cache anything on
//! disk.  A plain-text CSS serializer is included for tests and simple
//! hosts; see [`css::serialize`].
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use codemap::CodeMap;
//! use sass_eval::ast::{Declaration, Expr, Interpolation, Stmt, StyleRule, Stylesheet};
//! use sass_eval::{EvalOptions, Evaluator};
//!
//! let mut map = CodeMap::new();
//! let span = map
//!     .add_file("in.scss".to_owned(), ".a { width: 3px }".to_owned())
//!     .span;
//!
//! // .a { width: 3px } — normally produced by the parser
//! let stylesheet = Stylesheet::new(
//!     vec![Stmt::StyleRule(StyleRule {
//!         selector: Interpolation::plain(".a", span.subspan(0, 2)),
//!         body: vec![Stmt::Declaration(Declaration {
//!             name: Interpolation::plain("width", span.subspan(5, 10)),
//!             value: Some(Expr::Number {
//!                 value: 3.0,
//!                 unit: Some("px".to_owned()),
//!                 span: span.subspan(12, 15),
//!             }),
//!             body: None,
//!             span: span.subspan(5, 15),
//!         })],
//!         span,
//!     })],
//!     span,
//! );
//!
//! let mut evaluator = Evaluator::new(EvalOptions::default());
//! let result = evaluator.run(&stylesheet).unwrap();
//! assert_eq!(result.to_css_string().unwrap(), ".a {\n  width: 3px;\n}\n");
//! ```

#![allow(clippy::result_large_err)]

pub mod ast;
pub mod at_root;
pub mod builtins;
pub mod callable;
pub mod css;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod extender;
pub mod importer;
pub mod logger;
pub mod media;
pub mod module;
pub mod selector;
pub mod value;

pub use crate::error::{SassError, SassResult};
pub use crate::evaluator::{EvalOptions, EvaluateResult, Evaluator};
pub use crate::importer::{FilesystemImporter, ImportCache, Importer, MemoryImporter};
pub use crate::logger::{Logger, NullLogger, StderrLogger};
pub use crate::value::Value;
