//! Out-of-band error channel between handlers and the interceptor.
//!
//! A handler (or any inner middleware) reports an application error by
//! attaching a [`CapturedError`] to its response extensions:
//!
//! ```ignore
//! async fn handler() -> impl IntoResponse {
//!     (
//!         StatusCode::INTERNAL_SERVER_ERROR,
//!         Extension(captured_error!("database unavailable")),
//!         "try again later",
//!     )
//! }
//! ```
//!
//! Extensions never reach the wire, so the client sees the same response.

use std::any::Any;

use crate::record::ErrorDescriptor;

/// An application error observed while serving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl CapturedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            line: None,
        }
    }

    /// Attach a source location.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Capture any error by its display text.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::new(err.to_string())
    }

    /// Capture a panic payload from `catch_unwind`.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_string()
        };
        Self::new(message)
    }

    pub fn to_descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor::unhandled(self.message.clone(), self.file.clone(), self.line)
    }
}

/// Build a [`CapturedError`] from a format string, tagged with the call site.
#[macro_export]
macro_rules! captured_error {
    ($($arg:tt)*) => {
        $crate::interceptor::CapturedError::new(format!($($arg)*)).at(file!(), line!())
    };
}
