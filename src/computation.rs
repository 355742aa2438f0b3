//! # computation
//!
//! a suspended computation backed by a stackful generator
//!

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use generator::{Gn, LocalGenerator};

use crate::error::Error;
use crate::options::Options;
use crate::scope::Scope;
use crate::work::{Resume, Work};

/// answer of a computation to one resumption
pub(crate) enum Step {
    /// suspended again, waiting on the work item
    Yielded(Work),
    /// ran to the end
    Done,
    /// an error escaped the computation
    Failed(Error),
    /// resumed after it had already ended, nothing ran
    Exhausted,
}

/// a computation suspended at its last `wait`, or not yet started
///
/// its stack and locals live in the generator, the trampoline only resumes
/// it and observes the resulting [`Step`]
pub struct Computation {
    gen: LocalGenerator<'static, Resume, Step>,
}

impl Computation {
    /// create a computation, the body runs on the first resumption
    pub fn new<F>(options: Options, body: F) -> Self
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), Error> + 'static,
    {
        let gen = Gn::<Resume>::new_scoped_opt_local(options.get_stack_size(), move |mut s| {
            let mut suspend = |work: Work| {
                s.yield_with(Step::Yielded(work));
                s.get_yield()
            };
            let mut scope = Scope::new(&mut suspend);
            match body(&mut scope) {
                Ok(()) => Step::Done,
                Err(e) => Step::Failed(e),
            }
        });
        Computation { gen }
    }

    /// resume the computation
    ///
    /// `None` only starts it. a panic inside the body is turned into
    /// `Failed`
    pub(crate) fn resume(&mut self, input: Option<Resume>) -> Step {
        if self.gen.is_done() {
            return Step::Exhausted;
        }

        let gen = &mut self.gen;
        match panic::catch_unwind(AssertUnwindSafe(|| gen.raw_send(input))) {
            Ok(Some(step)) => step,
            // cancelled from inside, nothing was returned
            Ok(None) => Step::Done,
            Err(cause) => Step::Failed(Error::from_panic(cause)),
        }
    }

    /// the body has returned or unwound
    #[inline]
    pub fn is_done(&self) -> bool {
        self.gen.is_done()
    }
}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Computation {{ done: {} }}", self.is_done())
    }
}
