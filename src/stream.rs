//! # stream
//!
//! push style sources with subscribe and unsubscribe
//!

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::value::Value;

/// a source that can be subscribed to
pub trait Observable {
    /// start delivering values to `observer`
    fn subscribe(&self, observer: Observer) -> Subscription;
}

/// the receiving side of a subscription
#[derive(Clone)]
pub struct Observer {
    on_next: Rc<dyn Fn(Value)>,
    on_error: Rc<dyn Fn(Option<Error>)>,
}

impl Observer {
    /// create an observer from its two handlers
    pub fn new<N, E>(on_next: N, on_error: E) -> Self
    where
        N: Fn(Value) + 'static,
        E: Fn(Option<Error>) + 'static,
    {
        Observer {
            on_next: Rc::new(on_next),
            on_error: Rc::new(on_error),
        }
    }

    /// deliver a value
    #[inline]
    pub fn next(&self, value: Value) {
        (self.on_next)(value)
    }

    /// deliver an error, the reason may be absent
    #[inline]
    pub fn error(&self, reason: Option<Error>) {
        (self.on_error)(reason)
    }
}

/// handle returned by `subscribe`
pub struct Subscription(Option<Box<dyn FnOnce()>>);

impl Subscription {
    /// create a subscription with its teardown
    pub fn new<F: FnOnce() + 'static>(f: F) -> Self {
        Subscription(Some(Box::new(f)))
    }

    /// a subscription with nothing to tear down
    pub fn empty() -> Self {
        Subscription(None)
    }

    /// stop the delivery
    pub fn unsubscribe(mut self) {
        if let Some(f) = self.0.take() {
            f()
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Subscription {{ active: {} }}", self.0.is_some())
    }
}

/// a shared observable handle
#[derive(Clone)]
pub struct Stream(Rc<dyn Observable>);

impl Stream {
    /// wrap an observable
    pub fn new<O: Observable + 'static>(o: O) -> Self {
        Stream(Rc::new(o))
    }

    /// build a stream from a subscribe function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Observer) -> Subscription + 'static,
    {
        struct FnStream<F>(F);

        impl<F: Fn(Observer) -> Subscription> Observable for FnStream<F> {
            fn subscribe(&self, observer: Observer) -> Subscription {
                (self.0)(observer)
            }
        }

        Stream::new(FnStream(f))
    }

    /// subscribe to the stream
    #[inline]
    pub fn subscribe(&self, observer: Observer) -> Subscription {
        self.0.subscribe(observer)
    }
}

/// a multicast stream fed by hand
#[derive(Clone, Default)]
pub struct Subject {
    inner: Rc<SubjectInner>,
}

#[derive(Default)]
struct SubjectInner {
    observers: RefCell<Vec<(usize, Observer)>>,
    id: Cell<usize>,
}

impl Subject {
    /// create a subject without observers
    pub fn new() -> Self {
        Self::default()
    }

    /// deliver a value to every current observer
    pub fn emit<V: Into<Value>>(&self, value: V) {
        let value = value.into();
        for o in self.snapshot() {
            o.next(value.clone());
        }
    }

    /// deliver an error to every current observer
    pub fn fail<E: Into<Option<Error>>>(&self, reason: E) {
        let reason = reason.into();
        for o in self.snapshot() {
            o.error(reason.clone());
        }
    }

    /// number of live subscriptions
    pub fn observers(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// a stream view of this subject
    pub fn stream(&self) -> Stream {
        Stream::new(self.clone())
    }

    // observers may unsubscribe while being called
    fn snapshot(&self) -> Vec<Observer> {
        let observers = self.inner.observers.borrow();
        observers.iter().map(|(_, o)| o.clone()).collect()
    }
}

impl Observable for Subject {
    fn subscribe(&self, observer: Observer) -> Subscription {
        let id = self.inner.id.get();
        self.inner.id.set(id + 1);
        self.inner.observers.borrow_mut().push((id, observer));

        let inner = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.observers.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }
}
