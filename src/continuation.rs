//! # continuation
//!
//! two argument `(error, value)` callbacks
//!

use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::value::{Outcome, Value};

/// an `(error, value)` callback
///
/// it can be invoked any number of times, the receiver decides
/// what a repeated call means
#[derive(Clone)]
pub struct Continuation(Rc<dyn Fn(Option<Error>, Value)>);

impl Continuation {
    /// create a continuation
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<Error>, Value) + 'static,
    {
        Continuation(Rc::new(f))
    }

    /// raw call
    #[inline]
    pub fn call(&self, err: Option<Error>, value: Value) {
        (self.0)(err, value)
    }

    /// deliver a value
    #[inline]
    pub fn ok<V: Into<Value>>(&self, value: V) {
        self.call(None, value.into())
    }

    /// deliver an error
    #[inline]
    pub fn fail(&self, err: Error) {
        self.call(Some(err), Value::Null)
    }

    /// deliver an outcome
    pub fn settle(&self, outcome: Outcome) {
        match outcome {
            Ok(v) => self.call(None, v),
            Err(e) => self.call(Some(e), Value::Null),
        }
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Continuation {{ ... }}")
    }
}
