//! # parallel
//!
//! ordered aggregation of independently settled callbacks
//!
//! every slot records the first outcome it receives, later calls
//! on the same slot are ignored
//!

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::continuation::Continuation;
use crate::error::Error;
use crate::value::{Outcome, Value};

enum Waiter {
    All(Continuation),
    Any(Continuation),
}

#[derive(Default)]
struct State {
    slots: Vec<Option<Value>>,
    settled: usize,
    // first outcome in settlement order
    first: Option<Outcome>,
    first_err: Option<Error>,
    waiter: Option<Waiter>,
}

impl State {
    fn record(&mut self, index: usize, outcome: Outcome) -> bool {
        match self.slots.get(index) {
            Some(None) => {}
            _ => return false,
        }
        // an error slot still counts as settled
        self.slots[index] = Some(outcome.clone().unwrap_or_default());
        self.settled += 1;
        if let Err(e) = &outcome {
            self.first_err.get_or_insert_with(|| e.clone());
        }
        self.first.get_or_insert(outcome);
        true
    }

    // take the waiter together with what it should receive
    fn ready(&mut self) -> Option<(Continuation, Outcome)> {
        let outcome = match self.waiter.as_ref()? {
            Waiter::All(_) => {
                if self.settled < self.slots.len() {
                    return None;
                }
                match &self.first_err {
                    Some(e) => Err(e.clone()),
                    None => {
                        let values = self.slots.iter().map(|v| v.clone().unwrap_or_default());
                        Ok(Value::List(values.collect()))
                    }
                }
            }
            Waiter::Any(_) => self.first.clone()?,
        };
        match self.waiter.take()? {
            Waiter::All(cb) | Waiter::Any(cb) => Some((cb, outcome)),
        }
    }
}

/// a group of ordered slots
#[derive(Clone, Default)]
pub struct Group {
    state: Rc<RefCell<State>>,
}

impl Group {
    /// create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// append a slot and return its callback
    pub fn push(&self) -> Continuation {
        let index = {
            let mut state = self.state.borrow_mut();
            state.slots.push(None);
            state.slots.len() - 1
        };
        let group = self.clone();
        Continuation::new(move |err, value| {
            let outcome = match err {
                Some(e) => Err(e),
                None => Ok(value),
            };
            if group.state.borrow_mut().record(index, outcome) {
                group.notify();
            } else {
                trace!("slot {index} already settled");
            }
        })
    }

    /// once every slot settled, collect their values in push order or
    /// report the first error
    pub fn all(&self, cb: Continuation) {
        self.wait(Waiter::All(cb));
    }

    /// report the first settled slot
    pub fn any(&self, cb: Continuation) {
        self.wait(Waiter::Any(cb));
    }

    /// number of slots
    pub fn len(&self) -> usize {
        self.state.borrow().slots.len()
    }

    /// no slot pushed yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn wait(&self, waiter: Waiter) {
        self.state.borrow_mut().waiter = Some(waiter);
        self.notify();
    }

    fn notify(&self) {
        // the callback must run without the borrow held
        let ready = self.state.borrow_mut().ready();
        if let Some((cb, outcome)) = ready {
            cb.settle(outcome);
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.state.borrow();
        write!(f, "Group {{ slots: {}, settled: {} }}", state.slots.len(), state.settled)
    }
}
