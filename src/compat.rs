//! # compat
//!
//! completion for callback-style APIs that report their result positionally,
//! as `(result, error)` or `(response)` where the response carries an
//! `error` attribute
//!

use crate::value::Value;
use crate::work::{Callback, Outcome, Resume};

/// decide what a positional callback means
///
/// * a trailing error value is raised
/// * otherwise an `error` attribute on the leading value is raised
/// * otherwise a trailing `None` ("no error") is dropped and the rest is
///   sent in, following the arity rule of [`Outcome::Success`]
pub(crate) fn interpret(mut args: Vec<Value>) -> Resume {
    if let Some(Value::Error(e)) = args.last() {
        return Resume::Throw(e.clone());
    }

    if let Some(e) = args.first().and_then(|v| v.attr("error")).and_then(Value::as_error) {
        return Resume::Throw(e.clone());
    }

    if args.last().map_or(false, Value::is_none) {
        args.pop();
    }

    Outcome::Success(args).into_resume()
}

impl Callback {
    /// complete with positional callback arguments
    pub fn call(self, args: Vec<Value>) {
        self.resume(interpret(args))
    }
}
