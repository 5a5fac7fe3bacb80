//! SassScript expression nodes.

use codemap::Span;

use crate::ast::args::ArgumentInvocation;
use crate::ast::Interpolation;
use crate::value::{ListSeparator, SassColor};

/// Binary SassScript operators, in source notation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
    Plus,
    Minus,
    Times,
    DividedBy,
    Modulo,
    SingleEquals,
}

impl BinaryOp {
    pub fn operator_text(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEquals => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEquals => "<=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::DividedBy => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::SingleEquals => "=",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    DividedBy,
    Not,
}

/// A SassScript expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Null {
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    Number {
        value: f64,
        unit: Option<String>,
        span: Span,
    },
    Color {
        value: SassColor,
        span: Span,
    },
    /// A possibly-interpolated string literal.
    String {
        text: Interpolation,
        quoted: bool,
    },
    List {
        elements: Vec<Expr>,
        separator: ListSeparator,
        bracketed: bool,
        span: Span,
    },
    Map {
        pairs: Vec<(Expr, Expr)>,
        span: Span,
    },
    Variable {
        name: String,
        namespace: Option<String>,
        span: Span,
    },
    /// `&` used as an expression.
    ParentSelector {
        span: Span,
    },
    FunctionCall {
        name: String,
        namespace: Option<String>,
        arguments: ArgumentInvocation,
        span: Span,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        /// Whether a `/` result may keep its textual slash form; set by the
        /// parser when both operands are written as literal numbers.
        allows_slash: bool,
        span: Span,
    },
    /// A parenthesized expression; parentheses decide list grouping.
    Paren {
        expr: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Null { span }
            | Expr::Boolean { span, .. }
            | Expr::Number { span, .. }
            | Expr::Color { span, .. }
            | Expr::List { span, .. }
            | Expr::Map { span, .. }
            | Expr::Variable { span, .. }
            | Expr::ParentSelector { span }
            | Expr::FunctionCall { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::BinaryOp { span, .. }
            | Expr::Paren { span, .. } => *span,
            Expr::String { text, .. } => text.span,
        }
    }

    /// Whether a division with this expression as an operand may keep the
    /// textual `a/b` form.
    pub fn is_slash_operand(&self) -> bool {
        match self {
            Expr::Number { .. } => true,
            Expr::BinaryOp {
                op: BinaryOp::DividedBy,
                allows_slash,
                ..
            } => *allows_slash,
            _ => false,
        }
    }
}
