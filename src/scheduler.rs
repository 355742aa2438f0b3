//! # scheduler
//!
//! the single threaded event loop that deferred resumptions run on
//!

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// deferred unit of work
pub type Task = Box<dyn FnOnce()>;

/// shared handle to a scheduler
pub type Handle = Rc<dyn Scheduler>;

/// anything that can run a task on a later turn of the current thread
pub trait Scheduler {
    /// schedule `task` to run exactly once on a later turn
    fn defer(&self, task: Task);
}

thread_local! {
    // each thread has it's own default loop
    static DEFAULT_LOOP: Rc<EventLoop> = Rc::new(EventLoop::new());
}

/// turn based FIFO event loop
#[derive(Default)]
pub struct EventLoop {
    queue: RefCell<VecDeque<Task>>,
    turns: Cell<u64>,
}

impl EventLoop {
    /// create an empty loop
    pub fn new() -> Self {
        EventLoop::default()
    }

    /// the default loop of the current thread
    pub fn instance() -> Rc<EventLoop> {
        DEFAULT_LOOP.with(Rc::clone)
    }

    /// number of queued tasks
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// no task is queued
    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// number of turns run so far
    pub fn turns(&self) -> u64 {
        self.turns.get()
    }

    /// run the tasks that were queued when the turn began
    ///
    /// tasks deferred while the turn is running wait for the next one.
    /// returns the number of tasks that ran
    pub fn turn(&self) -> usize {
        let n = self.pending();
        self.turns.set(self.turns.get() + 1);
        for _ in 0..n {
            // never hold the borrow while a task runs, tasks defer more tasks
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
        n
    }

    /// turn until no task is left, returns the number of tasks that ran
    pub fn run(&self) -> usize {
        let mut total = 0;
        while !self.is_idle() {
            total += self.turn();
        }
        trace!("event loop idle after {} tasks", total);
        total
    }
}

impl Scheduler for EventLoop {
    #[inline]
    fn defer(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("pending", &self.pending())
            .field("turns", &self.turns.get())
            .finish()
    }
}
