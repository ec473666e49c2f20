//! # computation
//!
//! the step state machine driving one coroutine instance
//!
//! a computation goes `Created -> Stepping -> Suspended -> ... -> Terminated`;
//! every re-entry into `Stepping` goes through the tick gate and the outer
//! continuation fires exactly once
//!

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::continuation::Continuation;
use crate::coroutine::{Instance, YieldPoint};
use crate::deferred::Deferred;
use crate::error::Error;
use crate::parallel::Group;
use crate::resolver::Resolver;
use crate::tick::Ticker;
use crate::value::{Outcome, Value};

/// where the terminal outcome goes
pub(crate) enum Outer {
    Callback(Continuation),
    Deferred(Deferred),
    Detached,
}

pub(crate) struct Computation {
    resolver: Resolver,
    // taken out while the coroutine runs
    coroutine: RefCell<Option<Instance>>,
    // the coroutine reference is not cleared yet
    live: Cell<bool>,
    done: Cell<bool>,
    ticker: Ticker,
    parallel: RefCell<Option<Group>>,
    outer: RefCell<Option<Outer>>,
}

impl Computation {
    pub fn new(resolver: Resolver, outer: Outer) -> Rc<Self> {
        let ticker = Ticker::new(resolver.queue().clone());
        Rc::new(Computation {
            resolver,
            coroutine: RefCell::new(None),
            live: Cell::new(true),
            done: Cell::new(false),
            ticker,
            parallel: RefCell::new(None),
            outer: RefCell::new(Some(outer)),
        })
    }

    /// hand over the coroutine and run the first step synchronously
    pub fn start(self: &Rc<Self>, instance: Result<Instance, Error>) {
        // no drain may resume this computation while its first step runs
        let _hold = self.resolver.queue().hold();
        match instance {
            Ok(instance) => {
                *self.coroutine.borrow_mut() = Some(instance);
                self.step(Ok(Value::Null));
            }
            Err(e) => {
                self.live.set(false);
                self.step(Err(e));
            }
        }
    }

    fn step(self: &Rc<Self>, input: Outcome) {
        if !self.live.get() {
            if !self.done.get() {
                self.finish(input);
            }
            return;
        }

        let instance = self.coroutine.borrow_mut().take();
        let Some(mut instance) = instance else {
            // steps run from `start` or from a drain of our queue, both keep
            // the queue held while the coroutine runs
            debug_assert!(false, "step while the coroutine is running");
            return;
        };

        trace!("resume coroutine, inject error: {}", input.is_err());
        let point = instance.resume(input);
        if !self.live.get() {
            // abandoned while it was running
            return;
        }
        match point {
            Err(e) => {
                // raised by the coroutine itself, no further resume
                self.live.set(false);
                drop(instance);
                self.finish(Err(e));
            }
            Ok(YieldPoint { done, value }) => {
                if done {
                    self.live.set(false);
                    drop(instance);
                } else {
                    *self.coroutine.borrow_mut() = Some(instance);
                }
                let next = self.next();
                let rest = self.resolver.resolve_yieldable(value, next.to_continuation());
                match rest {
                    Some(value) if done => next.call(None, value),
                    Some(_) => trace!("plain value yielded, waiting for next"),
                    None => {}
                }
            }
        }
    }

    fn finish(&self, outcome: Outcome) {
        if self.done.replace(true) {
            return;
        }
        self.parallel.borrow_mut().take();
        let outer = self.outer.borrow_mut().take();
        match outer {
            Some(Outer::Callback(cb)) => cb.settle(outcome),
            Some(Outer::Deferred(d)) => {
                d.settle(outcome);
            }
            Some(Outer::Detached) => {
                if let Err(e) = outcome {
                    warn!("detached computation failed: {e}");
                }
            }
            None => {}
        }
    }

    // the tick gated entry point
    fn settle(self: &Rc<Self>, outcome: Outcome) {
        let this = self.clone();
        if self.ticker.tick(move || this.step(outcome)) {
            return;
        }
        if self.live.replace(false) {
            debug!("second callback within one iteration");
            let abandoned = self.coroutine.borrow_mut().take();
            drop(abandoned);
            self.step(Err(Error::MultipleCallbacks));
        } else {
            debug!("late callback after return, pending result kept");
        }
    }

    fn next(self: &Rc<Self>) -> Next {
        Next {
            comp: Rc::downgrade(self),
        }
    }
}

impl Drop for Computation {
    fn drop(&mut self) {
        if !self.done.get() {
            debug!("computation dropped before it terminated");
        }
    }
}

/// the resolver continuation handed to a running coroutine
///
/// calling it resumes the coroutine on the next tick, it also carries
/// the parallel group operations
///
/// a `Next` does not keep its computation alive, hand out
/// `to_continuation` where a resume must outlive the current step
#[derive(Clone)]
pub struct Next {
    comp: Weak<Computation>,
}

impl Next {
    pub(crate) fn new(comp: &Rc<Computation>) -> Self {
        comp.next()
    }

    fn comp(&self) -> Option<Rc<Computation>> {
        let comp = self.comp.upgrade();
        if comp.is_none() {
            trace!("computation already dropped");
        }
        comp
    }

    /// raw `(error, value)` call
    pub fn call(&self, err: Option<Error>, value: Value) {
        self.settle(match err {
            Some(e) => Err(e),
            None => Ok(value),
        })
    }

    /// resume with a value
    pub fn ok<V: Into<Value>>(&self, value: V) {
        self.settle(Ok(value.into()))
    }

    /// resume by injecting an error
    pub fn fail(&self, err: Error) {
        self.settle(Err(err))
    }

    /// resume with an outcome
    pub fn settle(&self, outcome: Outcome) {
        if let Some(comp) = self.comp() {
            comp.settle(outcome)
        }
    }

    /// a plain continuation calling this one, it keeps the computation alive
    pub fn to_continuation(&self) -> Continuation {
        match self.comp() {
            Some(comp) => Continuation::new(move |err, value| {
                comp.settle(match err {
                    Some(e) => Err(e),
                    None => Ok(value),
                })
            }),
            None => Continuation::new(|_, _| {}),
        }
    }

    /// add a slot to the parallel group, creating the group if needed
    pub fn push(&self) -> Continuation {
        match self.comp() {
            Some(comp) => comp
                .parallel
                .borrow_mut()
                .get_or_insert_with(Group::new)
                .push(),
            None => Group::new().push(),
        }
    }

    /// resume with every slot's value in push order
    pub fn all(&self) {
        let Some(comp) = self.comp() else {
            return;
        };
        let group = comp.parallel.borrow_mut().take();
        match group {
            Some(group) => group.all(self.to_continuation()),
            None => self.ok(Value::List(Vec::new())),
        }
    }

    /// resume with the first settled slot
    pub fn any(&self) {
        let Some(comp) = self.comp() else {
            return;
        };
        let group = comp.parallel.borrow_mut().take();
        match group {
            Some(group) => group.any(self.to_continuation()),
            None => self.ok(Value::Null),
        }
    }

    /// discard the parallel group
    pub fn clear(&self) {
        if let Some(comp) = self.comp() {
            comp.parallel.borrow_mut().take();
        }
    }

    /// the terminal outcome was delivered, or the computation is gone
    pub fn is_done(&self) -> bool {
        self.comp().map_or(true, |comp| comp.done.get())
    }

    /// a resume is scheduled and not run yet
    pub fn is_pending(&self) -> bool {
        self.comp().map_or(false, |comp| comp.ticker.is_ticking())
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.comp.upgrade() {
            Some(comp) => f
                .debug_struct("Next")
                .field("live", &comp.live.get())
                .field("done", &comp.done.get())
                .field("pending", &comp.ticker.is_ticking())
                .finish(),
            None => write!(f, "Next {{ dropped }}"),
        }
    }
}
