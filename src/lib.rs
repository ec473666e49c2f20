//! # genflow
//!
//! generator driven async control flow
//!
//! a coroutine suspends on deferred values, nested coroutines, thunks or
//! streams; the resolver settles whatever it suspends on, resumes it on the
//! next tick of a cooperative task queue and delivers the final outcome to
//! a callback or a deferred
//!

#![deny(missing_docs)]

#[macro_use]
extern crate log;

mod computation;
mod continuation;
mod coroutine;
mod deferred;
mod error;
mod parallel;
mod resolver;
mod stream;
mod tick;
mod value;
mod yieldable;

pub use crate::computation::Next;
pub use crate::continuation::Continuation;
pub use crate::coroutine::{Co, Coroutine, CoroutineFn, DEFAULT_STACK_SIZE};
pub use crate::deferred::Deferred;
pub use crate::error::{Error, Result};
pub use crate::parallel::Group;
pub use crate::resolver::{ArgOrder, Config, CustomYieldable, Resolver, Source};
pub use crate::stream::{Observable, Observer, Stream, Subject, Subscription};
pub use crate::tick::{run_until_idle, TaskQueue};
pub use crate::value::{Args, Function, Outcome, Thunk, Value};
pub use crate::yieldable::{classify, Kind};
