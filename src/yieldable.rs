//! # yieldable
//!
//! classification and resolution of suspended values
//!
//! kinds are probed in declaration order, first match wins:
//! deferred, coroutine, thunk (plain functions included), stream,
//! custom hook, not yieldable
//!

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::continuation::Continuation;
use crate::deferred::Deferred;
use crate::error::Error;
use crate::resolver::{Resolver, Source};
use crate::stream::{Observer, Stream, Subscription};
use crate::value::Value;

/// resolution strategy of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// a future settlement
    Deferred,
    /// a coroutine function or instance, run as a nested computation
    Coroutine,
    /// called with the continuation as its only argument
    Thunk,
    /// first emission only
    Stream,
    /// left to the configured hook
    Custom,
    /// the value itself
    NotYieldable,
}

/// classify a value, `custom` tells whether a custom hook is configured
pub fn classify(value: &Value, custom: bool) -> Kind {
    match value {
        Value::Deferred(_) => Kind::Deferred,
        Value::CoroutineFn(_) | Value::Coroutine(_) => Kind::Coroutine,
        Value::Thunk(_) | Value::Function(_) => Kind::Thunk,
        Value::Stream(_) => Kind::Stream,
        _ if custom => Kind::Custom,
        _ => Kind::NotYieldable,
    }
}

impl Resolver {
    /// arrange for `cb` to be called once with the resolution of `value`
    ///
    /// gives the value back when it is not yieldable
    pub(crate) fn resolve_yieldable(&self, value: Value, cb: Continuation) -> Option<Value> {
        let hook = self.config().yieldable.as_ref();
        let kind = classify(&value, hook.is_some());
        trace!("resolve yieldable: {kind:?}");
        match value {
            Value::Deferred(d) => on_settled(&d, cb),
            Value::CoroutineFn(f) => {
                self.spawn(Source::Function(f), vec![Value::Callback(cb)]);
            }
            Value::Coroutine(c) => {
                self.spawn(Source::Instance(c), vec![Value::Callback(cb)]);
            }
            Value::Thunk(t) => t.call(cb),
            Value::Function(f) => {
                f.call(vec![Value::Callback(cb)]);
            }
            Value::Stream(s) => take_first(&s, cb),
            other => {
                if let Some(hook) = hook {
                    if hook(&other, cb) {
                        return None;
                    }
                }
                return Some(other);
            }
        }
        None
    }
}

fn on_settled(d: &Deferred, cb: Continuation) {
    d.then(move |outcome| cb.settle(outcome));
}

// deliver the first emission or error, then unsubscribe
fn take_first(stream: &Stream, cb: Continuation) {
    let fired = Rc::new(Cell::new(false));
    let handle: Rc<RefCell<Option<Subscription>>> = Rc::default();

    let dispose = {
        let handle = handle.clone();
        move || {
            let sub = handle.borrow_mut().take();
            if let Some(sub) = sub {
                sub.unsubscribe();
            }
        }
    };
    let on_next = {
        let (fired, cb, dispose) = (fired.clone(), cb.clone(), dispose.clone());
        move |v: Value| {
            if !fired.replace(true) {
                cb.ok(v);
                dispose();
            }
        }
    };
    let on_error = {
        let fired = fired.clone();
        move |reason: Option<Error>| {
            if !fired.replace(true) {
                cb.fail(Error::normalize(reason));
                dispose();
            }
        }
    };

    let sub = stream.subscribe(Observer::new(on_next, on_error));
    if fired.get() {
        // emitted while subscribing
        sub.unsubscribe();
    } else {
        *handle.borrow_mut() = Some(sub);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coroutine::CoroutineFn;
    use crate::stream::Subject;
    use crate::value::{Function, Thunk};

    #[test]
    fn classification_order() {
        let f = CoroutineFn::new(|_, _| Ok(Value::Null));
        assert_eq!(classify(&Value::from(Deferred::new()), true), Kind::Deferred);
        assert_eq!(classify(&Value::from(f.clone()), true), Kind::Coroutine);
        assert_eq!(classify(&Value::from(f.start(Default::default())), false), Kind::Coroutine);
        assert_eq!(classify(&Value::from(Thunk::new(|_| {})), true), Kind::Thunk);
        assert_eq!(classify(&Value::from(Function::new(|_| Value::Null)), false), Kind::Thunk);
        assert_eq!(classify(&Value::from(Subject::new().stream()), true), Kind::Stream);
        assert_eq!(classify(&Value::from(1), true), Kind::Custom);
        assert_eq!(classify(&Value::from(1), false), Kind::NotYieldable);
        assert_eq!(classify(&Value::opaque(()), false), Kind::NotYieldable);
        assert!(Kind::Deferred < Kind::Coroutine && Kind::Custom < Kind::NotYieldable);
    }

    fn sink() -> (Continuation, Rc<RefCell<Vec<(Option<Error>, Value)>>>) {
        let got = Rc::new(RefCell::new(Vec::new()));
        let g = got.clone();
        (Continuation::new(move |e, v| g.borrow_mut().push((e, v))), got)
    }

    #[test]
    fn stream_takes_first_and_unsubscribes() {
        let r = Resolver::default();
        let subject = Subject::new();
        let (cb, got) = sink();

        assert!(r.resolve_yieldable(subject.stream().into(), cb).is_none());
        assert_eq!(subject.observers(), 1);
        subject.emit("first");
        assert_eq!(subject.observers(), 0);
        subject.emit("second");

        let got = got.borrow();
        assert_eq!(got.len(), 1);
        assert!(got[0].0.is_none());
        assert_eq!(got[0].1, Value::from("first"));
    }

    #[test]
    fn stream_emitting_on_subscribe() {
        let r = Resolver::default();
        let unsubscribed = Rc::new(Cell::new(false));
        let u = unsubscribed.clone();
        let stream = Stream::from_fn(move |o| {
            o.next(Value::from(1));
            o.next(Value::from(2));
            let u = u.clone();
            Subscription::new(move || u.set(true))
        });
        let (cb, got) = sink();
        r.resolve_yieldable(stream.into(), cb);
        assert!(unsubscribed.get());
        assert_eq!(got.borrow().len(), 1);
        assert_eq!(got.borrow()[0].1, Value::Int(1));
    }

    #[test]
    fn stream_error_without_reason() {
        let r = Resolver::default();
        let subject = Subject::new();
        let (cb, got) = sink();
        r.resolve_yieldable(subject.stream().into(), cb);
        subject.fail(None::<Error>);
        assert!(matches!(got.borrow()[0].0, Some(Error::Unknown)));
        assert_eq!(subject.observers(), 0);
    }

    #[test]
    fn deferred_rejection() {
        let r = Resolver::default();
        let d = Deferred::new();
        let (cb, got) = sink();
        r.resolve_yieldable(d.clone().into(), cb);
        assert!(got.borrow().is_empty());
        d.reject(Error::msg("nope"));
        assert_eq!(got.borrow()[0].0.as_ref().unwrap().to_string(), "nope");
    }

    #[test]
    fn plain_values_come_back() {
        let r = Resolver::default();
        let (cb, got) = sink();
        assert_eq!(r.resolve_yieldable(Value::from(5), cb), Some(Value::from(5)));
        assert!(got.borrow().is_empty());
    }

    #[test]
    fn custom_hook() {
        use crate::resolver::Config;

        struct Ticket(i64);

        let r = Resolver::new(Config::default().yieldable(|v: &Value, cb: Continuation| {
            match v.downcast_ref::<Ticket>() {
                Some(t) => {
                    cb.ok(t.0);
                    true
                }
                None => false,
            }
        }));
        let (cb, got) = sink();
        assert!(r.resolve_yieldable(Value::opaque(Ticket(9)), cb.clone()).is_none());
        assert_eq!(got.borrow()[0].1, Value::Int(9));
        assert_eq!(r.resolve_yieldable(Value::from("s"), cb), Some(Value::from("s")));
    }
}
