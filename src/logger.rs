//! Warning and debug output from a compilation.

use codemap::Span;
use once_cell::sync::Lazy;

/// Extra context attached to a warning.
#[derive(Default)]
pub struct WarnOptions {
    pub span: Option<Span>,
    pub trace: Option<String>,
    pub deprecation: bool,
}

/// Sink for `@warn`, `@debug` and deprecation messages.
///
/// The default implementation writes to standard error; hosts embedding the
/// evaluator provide their own to capture messages.
pub trait Logger {
    fn warn(&self, message: &str, options: &WarnOptions);

    fn debug(&self, message: &str, span: Span);
}

/// The default logger.  Writes to standard error.
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn warn(&self, message: &str, options: &WarnOptions) {
        if options.deprecation {
            eprintln!("Deprecation Warning: {}", message);
        } else {
            eprintln!("Warning: {}", message);
        }
        if let Some(trace) = &options.trace {
            eprint!("{}", trace);
        }
    }

    fn debug(&self, message: &str, _span: Span) {
        eprintln!("Debug: {}", message);
    }
}

/// A logger that swallows everything.  Used by tests that only care about
/// the produced CSS.
pub struct NullLogger;

impl Logger for NullLogger {
    fn warn(&self, _message: &str, _options: &WarnOptions) {}

    fn debug(&self, _message: &str, _span: Span) {}
}

/// Internal tracing, gated on an environment variable so that it costs one
/// boolean check when disabled.
#[macro_export]
macro_rules! sass_log {
    (
        $($arg:tt)+
    ) => {
        if $crate::logger::log_enabled() {
            eprintln!("{}", format_args!($($arg)+));
        }
    };
}

pub fn log_enabled() -> bool {
    static ENABLED: Lazy<bool> = Lazy::new(|| std::env::var_os("SASS_EVAL_LOG").is_some());

    *ENABLED
}
