//! # trampoline
//!
//! drive one suspended computation to completion, alternating between
//! resuming it and dispatching the work it yields
//!

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::computation::{Computation, Step};
use crate::error::Error;
use crate::lifecycle::Lifecycle;
use crate::scheduler::Handle;
use crate::work::{Callback, Resume, Work};

/// how an unhandled failure ended the computation
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Failure {
    /// no lifecycle was attached, the error was logged
    Detached,
    /// forwarded to the lifecycle error hook
    Reported,
    /// output was already committed, the error was only logged
    Logged,
}

/// trampoline state
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum State {
    /// created, first drive step not finished yet
    Starting,
    /// the computation is executing
    Running,
    /// waiting for the pending work to call back
    Suspended,
    /// ran to the end
    Completed,
    /// ended by an unhandled failure
    Failed(Failure),
}

impl State {
    /// the trampoline will never resume its computation again
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Completed | State::Failed(_))
    }
}

struct Inner {
    scheduler: Handle,
    lifecycle: Option<Rc<dyn Lifecycle>>,
    computation: RefCell<Computation>,
    // the work yielded by the last drive step, taken when it is executed
    pending: RefCell<Option<Work>>,
    state: Cell<State>,
    steps: Cell<usize>,
}

/// driver of one computation
///
/// cloning gives another handle to the same trampoline, holding a handle
/// keeps a suspended computation alive
#[derive(Clone)]
pub struct Trampoline {
    inner: Rc<Inner>,
}

impl Trampoline {
    /// start driving `computation`
    ///
    /// the first drive step runs before this returns, the computation
    /// executes up to its first suspension point. every later step runs
    /// from the callback of the work it waited on, and the work itself is
    /// always started on a later turn of `scheduler`
    pub fn start(
        scheduler: Handle,
        computation: Computation,
        lifecycle: Option<Rc<dyn Lifecycle>>,
    ) -> Trampoline {
        let inner = Rc::new(Inner {
            scheduler,
            lifecycle,
            computation: RefCell::new(computation),
            pending: RefCell::new(None),
            state: Cell::new(State::Starting),
            steps: Cell::new(0),
        });
        debug!(
            "trampoline start, bound to lifecycle: {}",
            inner.lifecycle.is_some()
        );
        Inner::drive(&inner, None);
        Trampoline { inner }
    }

    /// current state
    #[inline]
    pub fn state(&self) -> State {
        self.inner.state.get()
    }

    /// number of drive steps taken so far
    #[inline]
    pub fn steps(&self) -> usize {
        self.inner.steps.get()
    }
}

impl fmt::Debug for Trampoline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Trampoline")
            .field("state", &self.state())
            .field("steps", &self.steps())
            .finish()
    }
}

impl Inner {
    // one resumption step
    fn drive(this: &Rc<Inner>, input: Option<Resume>) {
        if this.state.get().is_terminal() {
            warn!("terminated trampoline resumed, ignored");
            return;
        }
        this.state.set(State::Running);
        this.steps.set(this.steps.get() + 1);
        trace!("trampoline drive step {}", this.steps.get());

        let step = this.computation.borrow_mut().resume(input);
        match step {
            Step::Yielded(work) => {
                *this.pending.borrow_mut() = Some(work);
                this.state.set(State::Suspended);
                // start the work on a later turn, never inline
                let me = Rc::clone(this);
                this.scheduler.defer(Box::new(move || Inner::execute(me)));
            }
            Step::Done => this.complete(),
            Step::Failed(err) => this.fail(err),
            Step::Exhausted => warn!("computation resumed after it ended"),
        }
    }

    // hand the pending work the callback of the next drive step
    fn execute(this: Rc<Inner>) {
        let work = this.pending.borrow_mut().take();
        match work {
            Some(work) => {
                let me = Rc::clone(&this);
                work.run(Callback::new(move |r| Inner::drive(&me, Some(r))));
            }
            None => warn!("trampoline executed without pending work"),
        }
    }

    fn complete(&self) {
        self.state.set(State::Completed);
        debug!("trampoline completed after {} steps", self.steps.get());
        if let Some(lifecycle) = &self.lifecycle {
            if !lifecycle.is_finished() {
                lifecycle.finish();
            }
        }
    }

    fn fail(&self, err: Error) {
        match &self.lifecycle {
            None => {
                self.state.set(State::Failed(Failure::Detached));
                error!("unhandled error in detached coroutine: {err}");
            }
            Some(lifecycle) if lifecycle.headers_written() => {
                self.state.set(State::Failed(Failure::Logged));
                error!("unhandled error after headers written: {err}");
            }
            Some(lifecycle) => {
                self.state.set(State::Failed(Failure::Reported));
                debug!("reporting unhandled error to lifecycle: {err}");
                lifecycle.handle_error(err);
            }
        }
    }
}
