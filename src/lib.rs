//! # swirl
//!
//! write callback driven asynchronous code as a plain sequence of steps
//!
//! a routine taking a [`Scope`] runs on its own generator stack. every
//! [`Scope::wait`] hands a [`Work`] item to a [`Trampoline`] and suspends;
//! when the work calls back, the trampoline resumes the routine with the
//! result, or raises the failure at the suspension point.
//!
//! ```no_run
//! use std::rc::Rc;
//! use swirl::{Asynchronous, Error, EventLoop, Scope, Work};
//!
//! fn add(s: &mut Scope<'_>, (a, b): (i64, i64)) -> Result<(), Error> {
//!     let a = s.wait(Work::value(a))?.as_int().unwrap_or(0);
//!     let b = s.wait(Work::value(b))?.as_int().unwrap_or(0);
//!     println!("{}", a + b);
//!     Ok(())
//! }
//!
//! let ev = Rc::new(EventLoop::new());
//! let add = Asynchronous::new(ev.clone()).wrap(add);
//! add.call((1, 2));
//! ev.run();
//! ```

#![deny(missing_docs)]

#[macro_use]
extern crate log;

mod adapter;
mod compat;
mod computation;
mod error;
mod lifecycle;
mod options;
mod scheduler;
mod scope;
mod trampoline;
mod value;
mod work;

pub use crate::adapter::{
    asynchronous, AsyncFn, Asynchronous, Handler, Invocation, Plain, Routine, Suspending,
};
pub use crate::computation::Computation;
pub use crate::error::Error;
pub use crate::lifecycle::Lifecycle;
pub use crate::options::{Options, DEFAULT_STACK_SIZE, MIN_STACK_SIZE};
pub use crate::scheduler::{EventLoop, Handle, Scheduler, Task};
pub use crate::scope::Scope;
pub use crate::trampoline::{Failure, State, Trampoline};
pub use crate::value::Value;
pub use crate::work::{Callback, Outcome, Work};

/// crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
