//! # error
//!
//! failures reported through a computation's outer continuation
//!

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// resolver error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// a continuation was called twice within one iteration
    #[error("multiple callbacks within one iteration")]
    MultipleCallbacks,
    /// a rejection or stream error without a reason
    #[error("rejected without a reason")]
    Unknown,
    /// the coroutine instance is already driven by another computation
    #[error("coroutine instance already consumed")]
    Consumed,
    /// the coroutine body panicked
    #[error("coroutine panicked: {0}")]
    Panicked(String),
    /// plain error message
    #[error("{0}")]
    Message(String),
    /// any other error
    #[error("{0}")]
    Other(Rc<dyn std::error::Error>),
}

/// resolver result type
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// create an error from a message
    pub fn msg<M: fmt::Display>(m: M) -> Self {
        Error::Message(m.to_string())
    }

    /// wrap an arbitrary error
    pub fn other<E: std::error::Error + 'static>(e: E) -> Self {
        Error::Other(Rc::new(e))
    }

    /// absent reasons become `Unknown`
    #[inline]
    pub(crate) fn normalize(reason: Option<Error>) -> Self {
        reason.unwrap_or(Error::Unknown)
    }

    /// convert a caught panic payload
    pub(crate) fn panicked(cause: Box<dyn Any + Send>) -> Self {
        let msg = match cause.downcast::<String>() {
            Ok(s) => *s,
            Err(cause) => match cause.downcast::<&'static str>() {
                Ok(s) => s.to_string(),
                Err(_) => "unknown panic".to_string(),
            },
        };
        Error::Panicked(msg)
    }
}
