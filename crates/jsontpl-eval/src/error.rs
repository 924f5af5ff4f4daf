//! Runtime error type with source-location tracking.
//!
//! [`EvalError`] wraps an error message together with an optional [`Span`]
//! into the compiled source, so callers can point at the sub-expression that
//! failed (e.g. "'user' is not defined at line 1, column 5").

use jsontpl_syntax::error::Span;
use std::fmt;

/// A runtime evaluation error that carries an optional source [`Span`].
///
/// Use the [`bail_span!`] macro (or [`EvalError::new`]) to construct these
/// inside the executor. The outer [`anyhow::Error`] wrapper is preserved so
/// that call-sites can keep using `Result<T>`.
#[derive(Debug, Clone)]
pub struct EvalError {
    /// Human-readable error description.
    pub message: String,
    /// Source location where the error originated (if available).
    pub span: Option<Span>,
}

impl EvalError {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn spanned(message: impl Into<String>, span: &Span) -> Self {
        Self {
            message: message.into(),
            span: Some(*span),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Bail out of a function with an [`EvalError`] that includes a source span.
///
/// # Usage
/// ```ignore
/// bail_span!(span, "'{}' is not defined", name);
/// bail_span!(None::<jsontpl_syntax::error::Span>, "Division by zero");
/// ```
#[macro_export]
macro_rules! bail_span {
    ($span:expr, $($arg:tt)*) => {
        return Err(anyhow::anyhow!($crate::error::EvalError::new(
            format!($($arg)*),
            $crate::error::into_option_span($span),
        )))
    };
}

/// Attaches `span` to an error that does not already carry one.
pub fn with_span(error: anyhow::Error, span: &Span) -> anyhow::Error {
    if error.downcast_ref::<EvalError>().is_some() {
        error
    } else {
        anyhow::anyhow!(EvalError::spanned(error.to_string(), span))
    }
}

/// Helper to convert various span representations into `Option<Span>`.
pub fn into_option_span(span: impl IntoOptionSpan) -> Option<Span> {
    span.into_option_span()
}

pub trait IntoOptionSpan {
    fn into_option_span(self) -> Option<Span>;
}

impl IntoOptionSpan for Span {
    fn into_option_span(self) -> Option<Span> {
        Some(self)
    }
}

impl IntoOptionSpan for &Span {
    fn into_option_span(self) -> Option<Span> {
        Some(*self)
    }
}

impl IntoOptionSpan for Option<Span> {
    fn into_option_span(self) -> Option<Span> {
        self
    }
}

impl IntoOptionSpan for Option<&Span> {
    fn into_option_span(self) -> Option<Span> {
        self.copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_display_ignores_span() {
        let span = Span::new(1, 1, 0, 5);
        let err = EvalError::new("msg", Some(span));
        assert_eq!(format!("{err}"), "msg");
    }

    #[test]
    fn eval_error_downcast_from_anyhow() {
        let span = Span::new(2, 3, 10, 15);
        let anyhow_err = anyhow::anyhow!(EvalError::new("wrapped", Some(span)));
        let downcast = anyhow_err.downcast_ref::<EvalError>().unwrap();
        assert_eq!(downcast.message, "wrapped");
        assert_eq!(downcast.span, Some(span));
    }

    #[test]
    fn with_span_keeps_existing_span() {
        let inner = Span::new(1, 2, 1, 2);
        let outer = Span::new(1, 1, 0, 9);
        let err = with_span(anyhow::anyhow!(EvalError::spanned("inner", &inner)), &outer);
        assert_eq!(err.downcast_ref::<EvalError>().unwrap().span, Some(inner));
    }

    #[test]
    fn with_span_wraps_plain_errors() {
        let span = Span::new(1, 1, 0, 9);
        let err = with_span(anyhow::anyhow!("boom"), &span);
        let eval_err = err.downcast_ref::<EvalError>().unwrap();
        assert_eq!(eval_err.message, "boom");
        assert_eq!(eval_err.span, Some(span));
    }

    #[test]
    fn bail_span_macro_produces_eval_error() {
        fn try_bail() -> anyhow::Result<()> {
            let span = Span::new(5, 10, 40, 50);
            bail_span!(&span, "'{}' is not defined", "x");
        }
        let err = try_bail().unwrap_err();
        let eval_err = err.downcast_ref::<EvalError>().unwrap();
        assert_eq!(eval_err.message, "'x' is not defined");
        assert_eq!(eval_err.span, Some(Span::new(5, 10, 40, 50)));
    }

    #[test]
    fn bail_span_macro_with_none_span() {
        fn try_bail() -> anyhow::Result<()> {
            bail_span!(None::<Span>, "division by zero");
        }
        let err = try_bail().unwrap_err();
        assert!(err.downcast_ref::<EvalError>().unwrap().span.is_none());
    }
}
