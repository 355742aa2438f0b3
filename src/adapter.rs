//! # adapter
//!
//! turn a computation written against [`Scope`] into an ordinary callable
//! that starts a [`Trampoline`] when invoked
//!

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

use crate::computation::Computation;
use crate::error::Error;
use crate::lifecycle::Lifecycle;
use crate::options::Options;
use crate::scheduler::{EventLoop, Handle};
use crate::scope::Scope;
use crate::trampoline::Trampoline;
use crate::value::Value;

/// a request handler argument
///
/// passed as the leading argument of an adapted routine, it binds the
/// trampoline to the wrapped [`Lifecycle`]. cloning shares the same sink
pub struct Handler<H>(Rc<H>);

impl<H> Handler<H> {
    /// wrap a new sink
    pub fn new(sink: H) -> Self {
        Handler(Rc::new(sink))
    }

    /// the shared sink
    #[inline]
    pub fn sink(&self) -> &Rc<H> {
        &self.0
    }
}

impl<H> From<Rc<H>> for Handler<H> {
    fn from(sink: Rc<H>) -> Self {
        Handler(sink)
    }
}

impl<H> Clone for Handler<H> {
    fn clone(&self) -> Self {
        Handler(Rc::clone(&self.0))
    }
}

impl<H> Deref for Handler<H> {
    type Target = H;

    #[inline]
    fn deref(&self) -> &H {
        &self.0
    }
}

impl<H: fmt::Debug> fmt::Debug for Handler<H> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.0).finish()
    }
}

/// arguments an adapted routine is invoked with
///
/// the leading argument decides whether the invocation is a request
/// handler: a [`Handler`] binds the trampoline to its lifecycle, anything
/// else starts a detached computation. tuples look only at their first
/// element.
///
/// own argument types opt in with an empty impl:
///
/// ```
/// struct Job {
///     id: u64,
/// }
///
/// impl swirl::Invocation for Job {}
/// ```
pub trait Invocation {
    /// the lifecycle the invocation is bound to
    fn lifecycle(&self) -> Option<Rc<dyn Lifecycle>> {
        None
    }
}

impl<H: Lifecycle + 'static> Invocation for Handler<H> {
    fn lifecycle(&self) -> Option<Rc<dyn Lifecycle>> {
        let lifecycle: Rc<dyn Lifecycle> = self.0.clone();
        Some(lifecycle)
    }
}

impl<T: Invocation> Invocation for Option<T> {
    fn lifecycle(&self) -> Option<Rc<dyn Lifecycle>> {
        self.as_ref().and_then(Invocation::lifecycle)
    }
}

macro_rules! plain_invocation {
    ($($t:ty),*) => {$(
        impl Invocation for $t {}
    )*};
}

plain_invocation!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, Value, Error
);

// shared or borrowed state is never a handler, even when it points at one
impl<T: ?Sized> Invocation for &T {}
impl<T: ?Sized> Invocation for Rc<T> {}
impl<T: ?Sized> Invocation for Arc<T> {}
impl<T: ?Sized> Invocation for Box<T> {}
impl<T> Invocation for Vec<T> {}

macro_rules! tuple_invocation {
    ($($name:ident),*) => {
        impl<H: Invocation, $($name),*> Invocation for (H, $($name,)*) {
            fn lifecycle(&self) -> Option<Rc<dyn Lifecycle>> {
                self.0.lifecycle()
            }
        }
    };
}

tuple_invocation!();
tuple_invocation!(A);
tuple_invocation!(A, B);
tuple_invocation!(A, B, C);
tuple_invocation!(A, B, C, D);
tuple_invocation!(A, B, C, D, E);

/// marker for routines that suspend through a [`Scope`]
pub enum Suspending {}

/// marker for ordinary callables
pub enum Plain {}

/// something [`Asynchronous::wrap`] can adapt
///
/// the marker is picked by the shape of the callable:
/// `Fn(&mut Scope, A) -> Result<(), Error>` is a suspending routine,
/// `Fn(A) -> R` is an ordinary callable and is returned unchanged
pub trait Routine<Marker> {
    /// what the adapter hands back
    type Output;

    /// adapt the routine to run on `scheduler`
    fn adapt(self, scheduler: Handle, options: Options) -> Self::Output;
}

impl<F, A> Routine<(Suspending, A)> for F
where
    F: Fn(&mut Scope<'_>, A) -> Result<(), Error> + 'static,
    A: Invocation + 'static,
{
    type Output = AsyncFn<F, A>;

    fn adapt(self, scheduler: Handle, options: Options) -> AsyncFn<F, A> {
        AsyncFn {
            body: Rc::new(self),
            scheduler,
            options,
            _args: PhantomData,
        }
    }
}

impl<F, A, R> Routine<(Plain, A, R)> for F
where
    F: Fn(A) -> R,
{
    type Output = F;

    #[inline]
    fn adapt(self, _scheduler: Handle, _options: Options) -> F {
        self
    }
}

/// adapter bound to one scheduler
#[derive(Clone)]
pub struct Asynchronous {
    scheduler: Handle,
    options: Options,
}

impl Asynchronous {
    /// adapter whose computations resume on `scheduler`
    pub fn new(scheduler: Handle) -> Self {
        Asynchronous {
            scheduler,
            options: Options::default(),
        }
    }

    /// replace the computation options
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// the bound options
    pub fn options(&self) -> Options {
        self.options
    }

    /// adapt `routine`
    pub fn wrap<R, M>(&self, routine: R) -> R::Output
    where
        R: Routine<M>,
    {
        routine.adapt(self.scheduler.clone(), self.options)
    }
}

impl Default for Asynchronous {
    /// adapter bound to the default loop of the current thread
    fn default() -> Self {
        Asynchronous::new(EventLoop::instance())
    }
}

impl fmt::Debug for Asynchronous {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Asynchronous")
            .field("options", &self.options)
            .finish()
    }
}

/// adapt `routine` with the default loop of the current thread
pub fn asynchronous<R, M>(routine: R) -> R::Output
where
    R: Routine<M>,
{
    Asynchronous::default().wrap(routine)
}

/// an adapted suspending routine
pub struct AsyncFn<F, A> {
    body: Rc<F>,
    scheduler: Handle,
    options: Options,
    _args: PhantomData<fn(A)>,
}

impl<F, A> AsyncFn<F, A>
where
    F: Fn(&mut Scope<'_>, A) -> Result<(), Error> + 'static,
    A: Invocation + 'static,
{
    /// start the routine
    ///
    /// the routine runs up to its first suspension point before this
    /// returns. failures after that are handled by the trampoline and
    /// never reach the caller
    pub fn call(&self, args: A) -> Trampoline {
        let lifecycle = args.lifecycle();
        if let Some(lifecycle) = &lifecycle {
            lifecycle.detach();
        }

        let body = Rc::clone(&self.body);
        let computation = Computation::new(self.options, move |s| body(s, args));
        Trampoline::start(self.scheduler.clone(), computation, lifecycle)
    }
}

impl<F, A> Clone for AsyncFn<F, A> {
    fn clone(&self) -> Self {
        AsyncFn {
            body: Rc::clone(&self.body),
            scheduler: self.scheduler.clone(),
            options: self.options,
            _args: PhantomData,
        }
    }
}

impl<F, A> fmt::Debug for AsyncFn<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AsyncFn<{}> {{ ... }}", std::any::type_name::<A>())
    }
}
