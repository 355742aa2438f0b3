use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};
use swirl::*;

// keeps warnings and errors logged on the current test thread
struct Capture;

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format!("{} {}", record.level(), record.args());
            CAPTURED.with(|c| c.borrow_mut().push(line));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;
static INIT: Once = Once::new();

fn capture_logs() {
    INIT.call_once(|| {
        log::set_logger(&CAPTURE).expect("logger already set");
        log::set_max_level(LevelFilter::Warn);
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
}

fn logged(pat: &str) -> bool {
    CAPTURED.with(|c| c.borrow().iter().any(|l| l.contains(pat)))
}

// give a closure the signature of a suspending routine
fn co<A, F>(f: F) -> F
where
    F: Fn(&mut Scope<'_>, A) -> Result<(), Error>,
{
    f
}

#[derive(Default)]
struct Response {
    finished: Cell<bool>,
    headers_written: Cell<bool>,
    detached: Cell<bool>,
    finish_calls: Cell<usize>,
    errors: RefCell<Vec<Error>>,
}

impl Lifecycle for Response {
    fn is_finished(&self) -> bool {
        self.finished.get()
    }

    fn headers_written(&self) -> bool {
        self.headers_written.get()
    }

    fn finish(&self) {
        self.finished.set(true);
        self.finish_calls.set(self.finish_calls.get() + 1);
    }

    fn handle_error(&self, err: Error) {
        self.errors.borrow_mut().push(err);
    }

    fn detach(&self) {
        self.detached.set(true);
    }
}

fn setup() -> (Rc<EventLoop>, Asynchronous) {
    let ev = Rc::new(EventLoop::new());
    let adapter = Asynchronous::new(ev.clone());
    (ev, adapter)
}

#[test]
fn runs_to_first_suspension_before_returning() {
    let (ev, adapter) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    let f = adapter.wrap(co(move |s, _: ()| {
        l.borrow_mut().push("before");
        s.wait(Work::value(1))?;
        l.borrow_mut().push("after");
        Ok(())
    }));

    let t = f.call(());
    assert_eq!(*log.borrow(), vec!["before"]);
    assert_eq!(t.state(), State::Suspended);

    ev.run();
    assert_eq!(*log.borrow(), vec!["before", "after"]);
    assert_eq!(t.state(), State::Completed);
}

#[test]
fn legacy_result_and_none() {
    let (ev, adapter) = setup();
    let got = Rc::new(RefCell::new(None));

    let g = got.clone();
    let f = adapter.wrap(co(move |s, _: ()| {
        let v = s.wait_with(|cb| cb.call(vec![Value::from("body"), Value::None]))?;
        *g.borrow_mut() = Some(v);
        Ok(())
    }));
    f.call(());
    ev.run();

    assert_eq!(*got.borrow(), Some(Value::from("body")));
}

#[test]
fn legacy_error_is_raised() {
    let (ev, adapter) = setup();
    let got = Rc::new(RefCell::new(None));

    let g = got.clone();
    let f = adapter.wrap(co(move |s, _: ()| {
        let r = s.wait_with(|cb| cb.call(vec![Error::msg("refused").into()]));
        *g.borrow_mut() = Some(r);
        Ok(())
    }));
    let t = f.call(());
    ev.run();

    assert_eq!(*got.borrow(), Some(Err(Error::msg("refused"))));
    assert_eq!(t.state(), State::Completed);
}

#[test]
fn legacy_error_attribute_is_raised() {
    let (ev, adapter) = setup();
    let got = Rc::new(RefCell::new(None));

    let g = got.clone();
    let f = adapter.wrap(co(move |s, _: ()| {
        let resp = Value::record([
            ("code", Value::Int(500)),
            ("error", Error::msg("server error").into()),
        ]);
        let r = s.wait_with(move |cb| cb.call(vec![resp]));
        *g.borrow_mut() = Some(r);
        Ok(())
    }));
    f.call(());
    ev.run();

    assert_eq!(*got.borrow(), Some(Err(Error::msg("server error"))));
}

#[test]
fn several_values_resume_as_tuple() {
    let (ev, adapter) = setup();
    let got = Rc::new(RefCell::new(None));

    let g = got.clone();
    let f = adapter.wrap(co(move |s, _: ()| {
        let v = s.wait_with(|cb| cb.call(vec![1.into(), "two".into(), 3.0.into()]))?;
        *g.borrow_mut() = Some(v);
        Ok(())
    }));
    f.call(());
    ev.run();

    assert_eq!(*got.borrow(), Some(Value::from((1, "two", 3.0))));
}

#[test]
fn error_caught_inside_continues() {
    let (ev, adapter) = setup();
    let attempts = Rc::new(Cell::new(0));

    let a = attempts.clone();
    let f = adapter.wrap(co(move |s, _: ()| {
        loop {
            a.set(a.get() + 1);
            let work = if a.get() < 3 {
                Work::error(Error::msg("busy"))
            } else {
                Work::value("ok")
            };
            match s.wait(work) {
                Ok(v) => {
                    assert_eq!(v.as_str(), Some("ok"));
                    return Ok(());
                }
                Err(e) => assert_eq!(e, Error::msg("busy")),
            }
        }
    }));
    let t = f.call(());
    ev.run();

    assert_eq!(attempts.get(), 3);
    assert_eq!(t.state(), State::Completed);
}

#[test]
fn completion_without_lifecycle_never_finishes() {
    let (ev, adapter) = setup();
    let resp = Rc::new(Response::default());

    // the response is not the leading argument, so it is not a handler
    let f = adapter.wrap(co(|s, (_n, _resp): (u32, Rc<Response>)| {
        s.wait(Work::value(1))?;
        Ok(())
    }));
    let t = f.call((7, resp.clone()));
    ev.run();

    assert_eq!(t.state(), State::Completed);
    assert_eq!(resp.finish_calls.get(), 0);
    assert!(!resp.detached.get());
}

#[test]
fn shared_state_argument_runs_detached() {
    let (ev, adapter) = setup();
    let acc = Rc::new(RefCell::new(Vec::new()));

    let f = adapter.wrap(co(|s, (acc, n): (Rc<RefCell<Vec<i64>>>, i64)| {
        for i in 0..n {
            let v = s.wait(Work::value(i * i))?;
            acc.borrow_mut().push(v.as_int().unwrap_or(-1));
        }
        Ok(())
    }));
    let t = f.call((acc.clone(), 3));
    ev.run();

    assert_eq!(t.state(), State::Completed);
    assert_eq!(*acc.borrow(), vec![0, 1, 4]);
}

#[test]
fn bare_shared_response_is_not_a_handler() {
    let (ev, adapter) = setup();
    let resp = Rc::new(Response::default());

    let f = adapter.wrap(co(|s, _resp: Rc<Response>| {
        s.wait(Work::error(Error::msg("ignored")))?;
        Ok(())
    }));
    let t = f.call(resp.clone());
    ev.run();

    assert_eq!(t.state(), State::Failed(Failure::Detached));
    assert!(!resp.detached.get());
    assert!(resp.errors.borrow().is_empty());
}

#[test]
fn handler_finishes_once() {
    let (ev, adapter) = setup();
    let resp = Handler::new(Response::default());

    let f = adapter.wrap(co(|s, _resp: Handler<Response>| {
        s.wait(Work::value(1))?;
        s.wait(Work::value(2))?;
        Ok(())
    }));
    let t = f.call(resp.clone());
    assert!(resp.detached.get());
    assert_eq!(resp.finish_calls.get(), 0);

    ev.run();
    assert_eq!(t.state(), State::Completed);
    assert_eq!(resp.finish_calls.get(), 1);
}

#[test]
fn handler_already_finished_is_left_alone() {
    let (ev, adapter) = setup();
    let resp = Handler::new(Response::default());

    let f = adapter.wrap(co(|s, resp: Handler<Response>| {
        s.wait(Work::value(1))?;
        // the handler finished the response itself
        resp.finish();
        Ok(())
    }));
    f.call(resp.clone());
    ev.run();

    assert_eq!(resp.finish_calls.get(), 1);
}

#[test]
fn handler_error_before_output_is_reported() {
    let (ev, adapter) = setup();
    let resp = Handler::new(Response::default());

    let f = adapter.wrap(co(|s, _resp: Handler<Response>| {
        s.wait(Work::error(Error::msg("db down")))?;
        Ok(())
    }));
    let t = f.call(resp.clone());
    ev.run();

    assert_eq!(t.state(), State::Failed(Failure::Reported));
    assert_eq!(*resp.errors.borrow(), vec![Error::msg("db down")]);
    assert_eq!(resp.finish_calls.get(), 0);
}

#[test]
fn handler_error_after_output_is_only_logged() {
    capture_logs();
    let (ev, adapter) = setup();
    let resp = Handler::new(Response::default());

    let f = adapter.wrap(co(|s, resp: Handler<Response>| {
        resp.headers_written.set(true);
        s.wait(Work::error(Error::msg("late failure")))?;
        Ok(())
    }));
    let t = f.call(resp.clone());
    ev.run();

    assert_eq!(t.state(), State::Failed(Failure::Logged));
    assert!(resp.errors.borrow().is_empty());
    assert_eq!(resp.finish_calls.get(), 0);
    assert!(logged("ERROR unhandled error after headers written: late failure"));
}

#[test]
fn handler_panic_is_reported() {
    let (ev, adapter) = setup();
    let resp = Handler::new(Response::default());

    let f = adapter.wrap(co(|s, _resp: Handler<Response>| {
        s.wait(Work::value(1))?;
        panic!("handler bug");
    }));
    let t = f.call(resp.clone());
    ev.run();

    assert_eq!(t.state(), State::Failed(Failure::Reported));
    assert_eq!(
        *resp.errors.borrow(),
        vec![Error::Panicked("handler bug".into())]
    );
}

#[test]
fn detached_failure_never_reaches_caller() {
    capture_logs();
    let (ev, adapter) = setup();

    let f = adapter.wrap(co(|s, _: ()| {
        s.wait(Work::error(Error::msg("lost")))?;
        Ok(())
    }));
    let t = f.call(());
    assert!(!logged("lost"));
    ev.run();

    assert_eq!(t.state(), State::Failed(Failure::Detached));
    assert!(logged("ERROR unhandled error in detached coroutine: lost"));
}

#[test]
fn deep_synchronous_chain_keeps_stack_flat() {
    const N: i64 = 100_000;
    let (ev, adapter) = setup();
    let depth = Rc::new(Cell::new(0usize));
    let max_depth = Rc::new(Cell::new(0usize));
    let sum = Rc::new(Cell::new(0i64));

    let (d, m, total) = (depth.clone(), max_depth.clone(), sum.clone());
    let f = adapter.wrap(co(move |s, _: ()| {
        for i in 0..N {
            let (d, m) = (d.clone(), m.clone());
            let v = s.wait_with(move |cb| {
                d.set(d.get() + 1);
                m.set(m.get().max(d.get()));
                // completes synchronously, inside the work item
                cb.succeed(i);
                d.set(d.get() - 1);
            })?;
            total.set(total.get() + v.as_int().unwrap_or(0));
        }
        Ok(())
    }));
    let t = f.call(());
    ev.run();

    assert_eq!(t.state(), State::Completed);
    assert_eq!(sum.get(), N * (N - 1) / 2);
    assert_eq!(max_depth.get(), 1);
    assert_eq!(t.steps(), N as usize + 1);
}

#[test]
fn completion_on_a_later_turn() {
    let (ev, adapter) = setup();
    let got = Rc::new(RefCell::new(Vec::new()));

    // a timer style operation, calls back from its own deferred task
    let sleep = {
        let ev = ev.clone();
        move |v: i64| {
            let ev = ev.clone();
            Work::new(move |cb| ev.defer(Box::new(move || cb.call(vec![v.into(), Value::None]))))
        }
    };

    let g = got.clone();
    let f = adapter.wrap(co(move |s, _: ()| {
        for v in [3, 1, 2] {
            let v = s.wait(sleep(v))?;
            g.borrow_mut().push(v.as_int().unwrap_or(-1));
        }
        Ok(())
    }));
    f.call(());
    ev.run();

    assert_eq!(*got.borrow(), vec![3, 1, 2]);
}

#[test]
fn trampolines_interleave() {
    let (ev, adapter) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    let f = adapter.wrap(co(move |s, name: &'static str| {
        for i in 0..3 {
            s.wait(Work::value(i))?;
            l.borrow_mut().push(format!("{name}{i}"));
        }
        Ok(())
    }));
    f.call("a");
    f.call("b");
    ev.run();

    assert_eq!(
        *log.borrow(),
        vec!["a0", "b0", "a1", "b1", "a2", "b2"]
    );
}

#[test]
fn nested_routine_starts_inside_another() {
    let (ev, adapter) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    let child = adapter.wrap(co(move |s, n: i64| {
        let v = s.wait(Work::value(n * 10))?;
        l.borrow_mut().push(v.as_int().unwrap_or(0));
        Ok(())
    }));

    let l = log.clone();
    let parent = adapter.wrap(co(move |s, _: ()| {
        child.call(1);
        s.wait(Work::value(0))?;
        child.call(2);
        l.borrow_mut().push(-1);
        Ok(())
    }));
    parent.call(());
    ev.run();

    let mut got = log.borrow().clone();
    got.sort();
    assert_eq!(got, vec![-1, 10, 20]);
}

#[test]
fn plain_callable_passes_through() {
    let (ev, adapter) = setup();

    fn greet(name: &'static str) -> String {
        format!("hello {name}")
    }

    let double = adapter.wrap(|x: i32| x * 2);
    let greet2 = adapter.wrap(greet);

    assert_eq!(double(21), 42);
    assert_eq!(greet2("swirl"), greet("swirl"));
    assert!(ev.is_idle());
}

#[test]
fn default_adapter_uses_thread_loop() {
    let n = Rc::new(Cell::new(0));

    let c = n.clone();
    let f = asynchronous(co(move |s, _: ()| {
        s.wait(Work::value(1))?;
        c.set(c.get() + 1);
        Ok(())
    }));
    f.call(());
    assert_eq!(n.get(), 0);

    EventLoop::instance().run();
    assert_eq!(n.get(), 1);
}

#[test]
fn stack_size_option() {
    let ev = Rc::new(EventLoop::new());
    let adapter = Asynchronous::new(ev.clone()).with_options(Options::new().stack_size(0x10000));
    assert_eq!(adapter.options().get_stack_size(), 0x10000);

    let f = adapter.wrap(co(|s, _: ()| {
        // a large frame on the generator stack
        let buf = [1u8; 64 * 1024];
        let v = s.wait(Work::value(i64::from(buf[buf.len() - 1])))?;
        assert_eq!(v, Value::Int(1));
        Ok(())
    }));
    let t = f.call(());
    ev.run();
    assert_eq!(t.state(), State::Completed);
}
