//! # work
//!
//! work items yielded by a suspended computation and the callback that
//! completes them
//!

use std::fmt;

use crate::error::Error;
use crate::value::Value;

/// what the computation is resumed with
pub(crate) enum Resume {
    /// send a value into the computation
    Send(Value),
    /// raise an error at the suspension point
    Throw(Error),
}

/// explicit result of a work item
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// the operation succeeded with zero or more values
    Success(Vec<Value>),
    /// the operation failed
    Failure(Error),
}

impl Outcome {
    /// success with a single value
    pub fn ok(v: impl Into<Value>) -> Self {
        Outcome::Success(vec![v.into()])
    }

    // zero values resume with nothing, one with itself, more as a tuple
    pub(crate) fn into_resume(self) -> Resume {
        match self {
            Outcome::Failure(e) => Resume::Throw(e),
            Outcome::Success(mut values) => match values.len() {
                0 => Resume::Send(Value::None),
                1 => Resume::Send(values.pop().unwrap_or_default()),
                _ => Resume::Send(Value::Tuple(values)),
            },
        }
    }
}

impl From<Result<Value, Error>> for Outcome {
    fn from(r: Result<Value, Error>) -> Self {
        match r {
            Ok(v) => Outcome::Success(vec![v]),
            Err(e) => Outcome::Failure(e),
        }
    }
}

/// completion handle passed to a work item
///
/// it is consumed on completion so a work item can resume its computation
/// at most once
pub struct Callback {
    f: Option<Box<dyn FnOnce(Resume)>>,
}

impl Callback {
    pub(crate) fn new<F: FnOnce(Resume) + 'static>(f: F) -> Self {
        Callback {
            f: Some(Box::new(f)),
        }
    }

    #[inline]
    pub(crate) fn resume(mut self, r: Resume) {
        if let Some(f) = self.f.take() {
            f(r);
        }
    }

    /// complete with an explicit outcome
    pub fn complete(self, outcome: Outcome) {
        self.resume(outcome.into_resume())
    }

    /// complete successfully with one value
    pub fn succeed(self, v: impl Into<Value>) {
        self.complete(Outcome::ok(v))
    }

    /// complete with a failure
    pub fn fail(self, err: Error) {
        self.complete(Outcome::Failure(err))
    }
}

impl Drop for Callback {
    fn drop(&mut self) {
        if self.f.is_some() {
            warn!("callback dropped without completing, the computation is abandoned");
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Callback {{ pending: {} }}", self.f.is_some())
    }
}

/// a pending asynchronous operation
///
/// when invoked it receives a [`Callback`] and must complete it exactly once,
/// either synchronously or on a later turn of the scheduler
pub struct Work {
    f: Box<dyn FnOnce(Callback)>,
}

impl Work {
    /// create a work item from the function that starts the operation
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Callback) + 'static,
    {
        Work { f: Box::new(f) }
    }

    /// a work item that completes immediately with `outcome`
    pub fn ready(outcome: Outcome) -> Self {
        Work::new(move |cb| cb.complete(outcome))
    }

    /// a work item that completes immediately with one value
    pub fn value(v: impl Into<Value>) -> Self {
        Work::ready(Outcome::ok(v))
    }

    /// a work item that fails immediately
    pub fn error(err: Error) -> Self {
        Work::ready(Outcome::Failure(err))
    }

    /// start the operation
    #[inline]
    pub(crate) fn run(self, cb: Callback) {
        (self.f)(cb)
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Work {{ ... }}")
    }
}
