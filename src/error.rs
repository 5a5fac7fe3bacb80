//! Error types.
//!
//! The evaluator distinguishes three kinds of failure:
//!
//! * [`ScriptError`] — a SassScript operation failed (invalid operand, bad
//!   coercion).  Value operations know nothing about source locations, so
//!   this error carries no span.  The evaluator attaches one at the AST node
//!   that triggered the operation; see [`SpannedResultExt`].
//!
//! * [`FormatError`] — re-parsing interpolated text (a selector, a media
//!   query, an at-root query) failed.  It carries a byte range into the text
//!   that was being re-parsed; the evaluator splices that range back into
//!   the interpolation's span.
//!
//! * [`SassError`] — what the caller sees.  Carries a message, a primary
//!   span, and the Sass-level stack trace that was current when the error
//!   was raised.

use std::error;
use std::fmt;

use codemap::Span;

/// Convenience alias for fallible evaluator operations.
///
/// The error is boxed: a `SassError` carries a whole stack trace and would
/// otherwise dominate the size of every `Result` in the crate.
pub type SassResult<T> = Result<T, Box<SassError>>;

/// An error from a SassScript value operation, before a span is known.
#[derive(Debug, Clone)]
pub struct ScriptError(pub String);

impl ScriptError {
    pub fn new(msg: impl Into<String>) -> ScriptError {
        ScriptError(msg.into())
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl error::Error for ScriptError {}

/// An error from re-parsing interpolated text.
///
/// `start..end` are byte offsets into the string that was being re-parsed,
/// not into the original source file.
#[derive(Debug, Clone)]
pub struct FormatError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl FormatError {
    pub fn new(message: impl Into<String>, start: usize, end: usize) -> FormatError {
        FormatError {
            message: message.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl error::Error for FormatError {}

/// One frame of the Sass-level call stack.
///
/// `member` is the name the user invoked (`mixin foo`, `function bar`,
/// `@import`, ...); a frame for a plain import has no member name.  The span
/// points at the call site.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub member: Option<String>,
    pub span: Span,
}

impl StackFrame {
    pub fn new(member: Option<String>, span: Span) -> StackFrame {
        StackFrame { member, span }
    }
}

/// A fatal Sass runtime error: message, primary span, synthesized trace.
///
/// The trace is stored innermost-first, which is also the order in which it
/// is rendered.
#[derive(Debug, Clone)]
pub struct SassError {
    message: String,
    span: Span,
    trace: Vec<StackFrame>,
}

impl SassError {
    pub fn new(message: impl Into<String>, span: Span) -> Box<SassError> {
        Box::new(SassError {
            message: message.into(),
            span,
            trace: Vec::new(),
        })
    }

    pub fn with_trace(
        message: impl Into<String>,
        span: Span,
        trace: Vec<StackFrame>,
    ) -> Box<SassError> {
        Box::new(SassError {
            message: message.into(),
            span,
            trace,
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn trace(&self) -> &[StackFrame] {
        &self.trace
    }

    /// Attaches a trace to an error that was raised without one.
    ///
    /// Errors raised deep in value code get their trace from the evaluator's
    /// catch site; an error that already carries frames keeps them.
    pub fn ensure_trace(mut self: Box<Self>, trace: &[StackFrame]) -> Box<Self> {
        if self.trace.is_empty() {
            self.trace = trace.to_vec();
        }
        self
    }

    /// Renders the trace innermost-first, one frame per line, resolving
    /// file/line through `map`.
    pub fn render_trace(&self, map: &codemap::CodeMap) -> String {
        let mut out = String::new();
        for frame in &self.trace {
            let loc = map.look_up_span(frame.span);
            match &frame.member {
                Some(member) => out.push_str(&format!(
                    "  {} {}:{}  {}\n",
                    loc.file.name(),
                    loc.begin.line + 1,
                    loc.begin.column + 1,
                    member
                )),
                None => out.push_str(&format!(
                    "  {} {}:{}\n",
                    loc.file.name(),
                    loc.begin.line + 1,
                    loc.begin.column + 1
                )),
            }
        }
        out
    }
}

impl fmt::Display for SassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)
    }
}

impl error::Error for SassError {}

/// Helper for converting span-less errors into `Result<T, Box<SassError>>`.
///
/// Value operations return `Result<T, ScriptError>`; the evaluator knows
/// which AST node triggered them and calls `.with_span(node_span)` to turn
/// the result into a proper runtime error:
///
/// ```
/// # use sass_eval::error::{ScriptError, SpannedResultExt};
/// let mut map = codemap::CodeMap::new();
/// let span = map.add_file("-".into(), "x".into()).span;
/// let res: Result<(), ScriptError> = Err(ScriptError::new("Undefined operation."));
/// assert!(res.with_span(span).is_err());
/// ```
pub trait SpannedResultExt<T> {
    fn with_span(self, span: Span) -> SassResult<T>;
}

impl<T> SpannedResultExt<T> for Result<T, ScriptError> {
    fn with_span(self, span: Span) -> SassResult<T> {
        self.map_err(|e| SassError::new(e.0, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        let mut map = codemap::CodeMap::new();
        map.add_file("test.scss".to_owned(), "a { b: c }".to_owned())
            .span
    }

    #[test]
    fn script_error_gains_span() {
        let res: Result<(), ScriptError> = Err(ScriptError::new("bad operand"));
        let err = res.with_span(dummy_span()).unwrap_err();
        assert_eq!(err.message(), "bad operand");
        assert!(err.trace().is_empty());
    }

    #[test]
    fn ensure_trace_keeps_existing_frames() {
        let span = dummy_span();
        let err = SassError::with_trace("boom", span, vec![StackFrame::new(None, span)]);
        let err = err.ensure_trace(&[
            StackFrame::new(Some("outer".into()), span),
            StackFrame::new(None, span),
        ]);
        assert_eq!(err.trace().len(), 1);
    }
}
