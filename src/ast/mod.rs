//! The Sass input tree.
//!
//! The parser (an external collaborator) produces this tree; the evaluator
//! only reads it.  Every node carries a [`codemap::Span`] pointing into the
//! original source, which is what runtime errors and the Sass-level stack
//! trace report.

pub mod args;
pub mod expr;
pub mod interpolation;
pub mod stmt;

pub use args::{Argument, ArgumentDeclaration, ArgumentInvocation};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use interpolation::{Interpolation, InterpolationPart};
pub use stmt::{
    AtRoot, AtRule, CallableDecl, ConfiguredVariable, Content, Declaration, Each, Extend, For,
    Forward, If, IfClause, Import, ImportArg, Include, LoudComment, Media, Stmt, StyleRule,
    Stylesheet, Supports, Use, UseNamespace, VariableDecl, While,
};
