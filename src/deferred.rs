//! # deferred
//!
//! a value representing a future settlement
//!
//! subscribers registered with `then` are called exactly once, either at
//! settlement time or immediately when the deferred is already settled
//!

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::error::Error;
use crate::value::{Outcome, Value};

type Subscriber = Box<dyn FnOnce(Outcome)>;

enum State {
    Pending(Vec<Subscriber>),
    Settled(Outcome),
}

/// a single settlement shared by any number of subscribers
#[derive(Clone)]
pub struct Deferred {
    state: Rc<RefCell<State>>,
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl Deferred {
    /// create a pending deferred
    pub fn new() -> Self {
        Deferred {
            state: Rc::new(RefCell::new(State::Pending(Vec::new()))),
        }
    }

    /// create an already resolved deferred
    pub fn resolved<V: Into<Value>>(value: V) -> Self {
        let d = Self::new();
        d.resolve(value);
        d
    }

    /// create an already rejected deferred
    pub fn rejected<E: Into<Option<Error>>>(reason: E) -> Self {
        let d = Self::new();
        d.reject(reason);
        d
    }

    /// resolve with a value, return false if already settled
    pub fn resolve<V: Into<Value>>(&self, value: V) -> bool {
        self.settle(Ok(value.into()))
    }

    /// reject with a reason, an absent reason becomes `Error::Unknown`
    pub fn reject<E: Into<Option<Error>>>(&self, reason: E) -> bool {
        self.settle(Err(Error::normalize(reason.into())))
    }

    /// settle with an outcome, return false if already settled
    pub fn settle(&self, outcome: Outcome) -> bool {
        let subscribers = {
            let mut state = self.state.borrow_mut();
            if matches!(*state, State::Settled(_)) {
                return false;
            }
            match mem::replace(&mut *state, State::Settled(outcome.clone())) {
                State::Pending(subs) => subs,
                State::Settled(_) => Vec::new(),
            }
        };
        for sub in subscribers {
            sub(outcome.clone());
        }
        true
    }

    /// subscribe to the settlement
    pub fn then<F>(&self, f: F)
    where
        F: FnOnce(Outcome) + 'static,
    {
        let settled = match &mut *self.state.borrow_mut() {
            State::Pending(subs) => {
                subs.push(Box::new(f));
                return;
            }
            State::Settled(outcome) => outcome.clone(),
        };
        f(settled)
    }

    /// the outcome if settled
    pub fn peek(&self) -> Option<Outcome> {
        match &*self.state.borrow() {
            State::Pending(_) => None,
            State::Settled(outcome) => Some(outcome.clone()),
        }
    }

    /// is it settled
    pub fn is_settled(&self) -> bool {
        matches!(&*self.state.borrow(), State::Settled(_))
    }

    /// do both handles refer to the same deferred
    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &*self.state.borrow() {
            State::Pending(subs) => write!(f, "Deferred(<pending {}>)", subs.len()),
            State::Settled(Ok(v)) => write!(f, "Deferred(<resolved {v:?}>)"),
            State::Settled(Err(e)) => write!(f, "Deferred(<rejected {e}>)"),
        }
    }
}
