//! # error
//!
//! failures raised into, or escaping from, a suspended computation
//!

use std::fmt;
use std::io;
use std::rc::Rc;

/// error value delivered to a computation or reported to its lifecycle
#[derive(Clone, thiserror::Error)]
pub enum Error {
    /// plain failure message
    #[error("{0}")]
    Message(String),
    /// the computation panicked while it was running
    #[error("coroutine panicked: {0}")]
    Panicked(String),
    /// any other error, shared so it can be cloned into values
    #[error("{0}")]
    Other(Rc<dyn std::error::Error + 'static>),
}

impl Error {
    /// create an error from a message
    pub fn msg(msg: impl Into<String>) -> Self {
        Error::Message(msg.into())
    }

    /// wrap an arbitrary error
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Error::Other(Rc::new(err))
    }

    /// build a `Panicked` error from a panic payload
    pub(crate) fn from_panic(cause: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = cause.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = cause.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_owned()
        };
        Error::Panicked(msg)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::other(err)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(m) => f.debug_tuple("Message").field(m).finish(),
            Error::Panicked(m) => f.debug_tuple("Panicked").field(m).finish(),
            Error::Other(e) => f.debug_tuple("Other").field(&e.to_string()).finish(),
        }
    }
}

// `Other` compares by identity, the rest by content
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Message(a), Error::Message(b)) => a == b,
            (Error::Panicked(a), Error::Panicked(b)) => a == b,
            (Error::Other(a), Error::Other(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
