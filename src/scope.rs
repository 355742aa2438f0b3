//! # scope
//!
//! the handle a computation suspends through
//!

use crate::error::Error;
use crate::value::Value;
use crate::work::{Callback, Resume, Work};

/// passed in scope type
///
/// each `wait` is a suspension point: the work item is handed to the
/// trampoline and the computation sleeps until the work completes
pub struct Scope<'a> {
    suspend: &'a mut dyn FnMut(Work) -> Option<Resume>,
    suspensions: usize,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(suspend: &'a mut dyn FnMut(Work) -> Option<Resume>) -> Self {
        Scope {
            suspend,
            suspensions: 0,
        }
    }

    /// yield `work` and wait for its completion
    ///
    /// returns the value the work completed with, or the error it failed
    /// with; use `?` to let the failure escape the computation
    pub fn wait(&mut self, work: Work) -> Result<Value, Error> {
        self.suspensions += 1;
        match (self.suspend)(work) {
            Some(Resume::Send(v)) => Ok(v),
            Some(Resume::Throw(e)) => Err(e),
            None => Ok(Value::None),
        }
    }

    /// wait on the operation started by `f`
    #[inline]
    pub fn wait_with<F>(&mut self, f: F) -> Result<Value, Error>
    where
        F: FnOnce(Callback) + 'static,
    {
        self.wait(Work::new(f))
    }

    /// how many times the computation has suspended
    #[inline]
    pub fn suspensions(&self) -> usize {
        self.suspensions
    }
}
