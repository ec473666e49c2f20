//! # resolver
//!
//! entry points: run a coroutine in callback, deferred or detached mode,
//! and wrap coroutine functions into plain functions
//!

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::computation::{Computation, Next, Outer};
use crate::continuation::Continuation;
use crate::coroutine::{Coroutine, CoroutineFn, DEFAULT_STACK_SIZE};
use crate::deferred::Deferred;
use crate::tick::TaskQueue;
use crate::value::{Args, Function, Value};

/// custom yieldable hook, returns false when the value is not yieldable
pub type CustomYieldable = Rc<dyn Fn(&Value, Continuation) -> bool>;

/// where the continuation goes in a coroutine function's arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgOrder {
    /// after the caller's arguments
    #[default]
    Append,
    /// before the caller's arguments
    Prepend,
}

/// immutable resolver configuration
#[derive(Clone)]
pub struct Config {
    /// deferred constructor used when no callback is given
    pub deferred: Option<fn() -> Deferred>,
    /// placement of the continuation argument
    pub arg_order: ArgOrder,
    /// consulted when no built-in kind matches
    pub yieldable: Option<CustomYieldable>,
    /// stack size of started coroutine functions, in words
    pub stack_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            deferred: Some(Deferred::new as fn() -> Deferred),
            arg_order: ArgOrder::Append,
            yieldable: None,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl Config {
    /// set or remove the deferred constructor
    pub fn deferred(mut self, ctor: Option<fn() -> Deferred>) -> Self {
        self.deferred = ctor;
        self
    }

    /// set the continuation placement
    pub fn arg_order(mut self, order: ArgOrder) -> Self {
        self.arg_order = order;
        self
    }

    /// set the custom yieldable hook
    pub fn yieldable<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, Continuation) -> bool + 'static,
    {
        self.yieldable = Some(Rc::new(f));
        self
    }

    /// set the coroutine stack size
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("deferred", &self.deferred.is_some())
            .field("arg_order", &self.arg_order)
            .field("yieldable", &self.yieldable.is_some())
            .field("stack_size", &self.stack_size)
            .finish()
    }
}

/// what a computation runs
#[derive(Clone, Debug)]
pub enum Source {
    /// started with the caller's arguments
    Function(CoroutineFn),
    /// driven as is
    Instance(Coroutine),
}

impl From<CoroutineFn> for Source {
    fn from(f: CoroutineFn) -> Self {
        Source::Function(f)
    }
}

impl From<Coroutine> for Source {
    fn from(c: Coroutine) -> Self {
        Source::Instance(c)
    }
}

struct Inner {
    config: Config,
    queue: TaskQueue,
}

/// the coroutine resolver
///
/// clones share configuration and queue
#[derive(Clone)]
pub struct Resolver {
    inner: Rc<Inner>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Resolver {
    /// create a resolver on the current thread's queue
    pub fn new(config: Config) -> Self {
        Self::with_queue(config, TaskQueue::current())
    }

    /// create a resolver on an explicit queue
    pub fn with_queue(config: Config, queue: TaskQueue) -> Self {
        Resolver {
            inner: Rc::new(Inner { config, queue }),
        }
    }

    /// the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// the queue steps are scheduled on
    pub fn queue(&self) -> &TaskQueue {
        &self.inner.queue
    }

    /// run a coroutine
    ///
    /// a trailing `Value::Callback` or `Value::Next` receives the outcome;
    /// otherwise the configured deferred is returned; otherwise the
    /// computation is detached and a failure is only logged
    pub fn call<S: Into<Source>>(&self, source: S, args: Vec<Value>) -> Option<Deferred> {
        self.spawn(source.into(), args)
    }

    pub(crate) fn spawn(&self, source: Source, mut args: Vec<Value>) -> Option<Deferred> {
        // another computation's `Next` counts as a callback too
        let callback = match args.last() {
            Some(Value::Callback(_) | Value::Next(_)) => match args.pop() {
                Some(Value::Callback(cb)) => Some(cb),
                Some(Value::Next(next)) => Some(next.to_continuation()),
                _ => None,
            },
            _ => None,
        };

        let (outer, deferred) = match (callback, self.config().deferred) {
            (Some(cb), _) => (Outer::Callback(cb), None),
            (None, Some(ctor)) => {
                let d = ctor();
                (Outer::Deferred(d.clone()), Some(d))
            }
            (None, None) => {
                debug!("no callback and no deferred, running detached");
                (Outer::Detached, None)
            }
        };

        let comp = Computation::new(self.clone(), outer);
        let instance = match source {
            Source::Function(f) => {
                let next = Value::Next(Next::new(&comp));
                match self.config().arg_order {
                    ArgOrder::Append => args.push(next),
                    ArgOrder::Prepend => args.insert(0, next),
                }
                f.start_opt(self.config().stack_size, Args::new(args)).take()
            }
            Source::Instance(c) => c.take(),
        };
        comp.start(instance);
        deferred
    }

    /// turn a coroutine into a plain function
    ///
    /// the function returns the deferred, or `Null` in callback and
    /// detached mode
    pub fn wrap<S: Into<Source>>(&self, source: S) -> Function {
        let resolver = self.clone();
        let source = source.into();
        Function::new(move |args| {
            resolver
                .spawn(source.clone(), args)
                .map_or(Value::Null, Value::Deferred)
        })
    }

    /// wrap every coroutine entry of `map` in place
    pub fn wrap_all<'m, K>(&self, map: &'m mut HashMap<K, Value>) -> &'m mut HashMap<K, Value> {
        for value in map.values_mut() {
            let source = match value {
                Value::CoroutineFn(f) => Source::Function(f.clone()),
                Value::Coroutine(c) => Source::Instance(c.clone()),
                _ => continue,
            };
            *value = Value::Function(self.wrap(source));
        }
        map
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", self.config())
            .field("queue", self.queue())
            .finish()
    }
}
