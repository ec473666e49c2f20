//! # value
//!
//! dynamic values passed in and out of coroutines
//!
//! data variants compare structurally, capability variants are cheap
//! `Rc` handles
//!

use std::any::Any;
use std::fmt;
use std::ops::Index;
use std::rc::Rc;

use crate::computation::Next;
use crate::continuation::Continuation;
use crate::coroutine::{Coroutine, CoroutineFn};
use crate::deferred::Deferred;
use crate::error::Error;
use crate::stream::Stream;

/// the `(error, value)` pair in result form
pub type Outcome = Result<Value, Error>;

/// a value yielded, returned, or sent into a coroutine
#[derive(Clone, Default)]
pub enum Value {
    /// absent value
    #[default]
    Null,
    /// boolean
    Bool(bool),
    /// integer
    Int(i64),
    /// float
    Float(f64),
    /// string
    Str(String),
    /// ordered sequence
    List(Vec<Value>),
    /// a future settlement
    Deferred(Deferred),
    /// a not yet started coroutine
    CoroutineFn(CoroutineFn),
    /// a created coroutine instance
    Coroutine(Coroutine),
    /// a callback accepting operation
    Thunk(Thunk),
    /// a plain function taking positional arguments
    Function(Function),
    /// a push style source
    Stream(Stream),
    /// an `(error, value)` callback
    Callback(Continuation),
    /// the resolver continuation handed to a running coroutine
    Next(Next),
    /// anything else, for custom yieldable hooks
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// wrap an arbitrary value
    pub fn opaque<T: Any>(v: T) -> Self {
        Value::Opaque(Rc::new(v))
    }

    /// build a callback value
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Option<Error>, Value) + 'static,
    {
        Value::Callback(Continuation::new(f))
    }

    /// build a thunk value
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn(Continuation) + 'static,
    {
        Value::Thunk(Thunk::new(f))
    }

    /// is it `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// get the bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// get the integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// get the float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// get the string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// get the list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// get the resolver continuation
    pub fn as_next(&self) -> Option<&Next> {
        match self {
            Value::Next(n) => Some(n),
            _ => None,
        }
    }

    /// downcast an opaque value
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(v) => v.downcast_ref(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Deferred(a), Deferred(b)) => a.ptr_eq(b),
            (Opaque(a), Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(v) => write!(f, "Float({v})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(l) => f.debug_tuple("List").field(l).finish(),
            Value::Deferred(d) => write!(f, "{d:?}"),
            Value::CoroutineFn(_) => write!(f, "CoroutineFn {{ ... }}"),
            Value::Coroutine(_) => write!(f, "Coroutine {{ ... }}"),
            Value::Thunk(_) => write!(f, "Thunk {{ ... }}"),
            Value::Function(_) => write!(f, "Function {{ ... }}"),
            Value::Stream(_) => write!(f, "Stream {{ ... }}"),
            Value::Callback(_) => write!(f, "Callback {{ ... }}"),
            Value::Next(_) => write!(f, "Next {{ ... }}"),
            Value::Opaque(_) => write!(f, "Opaque {{ ... }}"),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f64 => Float,
    &str => Str,
    String => Str,
    Vec<Value> => List,
    Deferred => Deferred,
    CoroutineFn => CoroutineFn,
    Coroutine => Coroutine,
    Thunk => Thunk,
    Function => Function,
    Stream => Stream,
    Continuation => Callback,
    Next => Next,
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// a single argument callback accepting operation
///
/// the thunk alone is responsible for calling the continuation
#[derive(Clone)]
pub struct Thunk(Rc<dyn Fn(Continuation)>);

impl Thunk {
    /// create a thunk
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Continuation) + 'static,
    {
        Thunk(Rc::new(f))
    }

    /// start the operation
    #[inline]
    pub fn call(&self, cb: Continuation) {
        (self.0)(cb)
    }
}

/// a plain function over positional arguments
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(Vec<Value>) -> Value>);

impl Function {
    /// create a function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Value + 'static,
    {
        Function(Rc::new(f))
    }

    /// call it
    #[inline]
    pub fn call(&self, args: Vec<Value>) -> Value {
        (self.0)(args)
    }
}

/// arguments handed to a coroutine function
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Value>);

impl Args {
    /// wrap positional arguments
    pub fn new(args: Vec<Value>) -> Self {
        Args(args)
    }

    /// get the argument at `i`
    pub fn get(&self, i: usize) -> Option<&Value> {
        self.0.get(i)
    }

    /// number of arguments, the continuation included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// no arguments at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// the resolver continuation, wherever it was placed
    pub fn next(&self) -> Option<Next> {
        self.0.iter().find_map(Value::as_next).cloned()
    }

    /// iterate the arguments
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// take back the raw arguments
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl Index<usize> for Args {
    type Output = Value;

    fn index(&self, i: usize) -> &Value {
        &self.0[i]
    }
}

impl From<Vec<Value>> for Args {
    fn from(v: Vec<Value>) -> Self {
        Args(v)
    }
}
