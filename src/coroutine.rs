//! # coroutine
//!
//! coroutine functions and instances backed by stackful generators
//!
//! a coroutine body suspends with `Co::yield_` and receives either the
//! resolved value or the injected error; returning `Err` or panicking
//! terminates it
//!

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use generator::{Gn, LocalGenerator};

use crate::error::{Error, Result};
use crate::value::{Args, Outcome, Value};

/// default coroutine stack size, in words
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

type Gen = LocalGenerator<'static, Outcome, Outcome>;

/// the suspend handle passed to a coroutine body
pub struct Co<'c> {
    yielder: &'c mut dyn FnMut(Value) -> Option<Outcome>,
}

impl Co<'_> {
    /// suspend on `value` and get back its resolution
    ///
    /// an `Err` is the injected failure, propagate it with `?` or handle it
    #[inline]
    pub fn yield_<V: Into<Value>>(&mut self, value: V) -> Result<Value> {
        (self.yielder)(value.into()).unwrap_or(Ok(Value::Null))
    }
}

/// a coroutine function, started once per computation
#[derive(Clone)]
pub struct CoroutineFn(Rc<dyn Fn(&mut Co<'_>, Args) -> Result<Value>>);

impl CoroutineFn {
    /// create a coroutine function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Co<'_>, Args) -> Result<Value> + 'static,
    {
        CoroutineFn(Rc::new(f))
    }

    /// create an instance with `args`, nothing runs until the first resume
    pub fn start(&self, args: Args) -> Coroutine {
        self.start_opt(DEFAULT_STACK_SIZE, args)
    }

    /// create an instance with the specified stack size
    pub fn start_opt(&self, size: usize, args: Args) -> Coroutine {
        let f = self.0.clone();
        Coroutine::new_opt(size, move |co| f(co, args))
    }
}

impl fmt::Debug for CoroutineFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CoroutineFn {{ ... }}")
    }
}

/// a created coroutine instance
///
/// clones share the instance, the first computation to drive it takes
/// it over and later attempts fail with `Error::Consumed`
#[derive(Clone)]
pub struct Coroutine {
    gen: Rc<RefCell<Option<Instance>>>,
}

impl Coroutine {
    /// create an instance with default stack size
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut Co<'_>) -> Result<Value> + 'static,
    {
        Self::new_opt(DEFAULT_STACK_SIZE, f)
    }

    /// create an instance with specified stack size
    pub fn new_opt<F>(size: usize, f: F) -> Self
    where
        F: FnOnce(&mut Co<'_>) -> Result<Value> + 'static,
    {
        let gen = Gn::<Outcome>::new_scoped_opt_local(size, move |mut s| {
            // SAFETY: `Co` only lends the yielder to `f`, it cannot outlive
            // the generator body
            let mut yielder = |v: Value| unsafe { s.yield_unsafe(Ok(v)) };
            let mut co = Co {
                yielder: &mut yielder,
            };
            f(&mut co)
        });
        Coroutine {
            gen: Rc::new(RefCell::new(Some(Instance { gen }))),
        }
    }

    /// has it been taken over by a computation
    pub fn is_consumed(&self) -> bool {
        self.gen.borrow().is_none()
    }

    pub(crate) fn take(&self) -> Result<Instance> {
        self.gen.borrow_mut().take().ok_or(Error::Consumed)
    }
}

impl fmt::Debug for Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Coroutine {{ consumed: {} }}", self.is_consumed())
    }
}

/// value produced by one resume
#[derive(Debug)]
pub(crate) struct YieldPoint {
    pub done: bool,
    pub value: Value,
}

/// an instance exclusively owned by one computation
pub(crate) struct Instance {
    gen: Gen,
}

impl Instance {
    /// resume with a value or inject an error
    ///
    /// `Err` means the body returned an error or panicked
    pub fn resume(&mut self, input: Outcome) -> Result<YieldPoint> {
        let gen = &mut self.gen;
        let ret = panic::catch_unwind(AssertUnwindSafe(|| gen.raw_send(Some(input))));
        match ret {
            Err(cause) => Err(Error::panicked(cause)),
            // resumed after completion
            Ok(None) => Ok(YieldPoint {
                done: true,
                value: Value::Null,
            }),
            Ok(Some(out)) => {
                let done = self.gen.is_done();
                out.map(|value| YieldPoint { done, value })
            }
        }
    }
}
