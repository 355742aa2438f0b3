//! a request handler that fetches two pages through a callback style
//! client and writes them out, the response is finished by the trampoline
use std::cell::{Cell, RefCell};
use swirl::{asynchronous, Error, EventLoop, Handler, Lifecycle, Scheduler, Scope, Value, Work};

struct Request {
    path: &'static str,
    body: RefCell<String>,
    finished: Cell<bool>,
    headers_written: Cell<bool>,
}

impl Request {
    fn new(path: &'static str) -> Handler<Self> {
        Handler::new(Request {
            path,
            body: RefCell::new(String::new()),
            finished: Cell::new(false),
            headers_written: Cell::new(false),
        })
    }

    fn write(&self, s: &str) {
        self.headers_written.set(true);
        self.body.borrow_mut().push_str(s);
    }
}

impl Lifecycle for Request {
    fn is_finished(&self) -> bool {
        self.finished.get()
    }

    fn headers_written(&self) -> bool {
        self.headers_written.get()
    }

    fn finish(&self) {
        self.finished.set(true);
        println!("200 {} -> {:?}", self.path, self.body.borrow());
    }

    fn handle_error(&self, err: Error) {
        self.finished.set(true);
        println!("500 {} -> {}", self.path, err);
    }
}

// a client in the legacy style: calls back with a single response record
// whose `error` attribute is set on failure
fn fetch(url: String) -> Work {
    let ev = EventLoop::instance();
    Work::new(move |cb| {
        ev.defer(Box::new(move || {
            let resp = if url.ends_with("/missing") {
                Value::record([
                    ("code", Value::Int(404)),
                    ("error", Error::msg(format!("404 fetching {url}")).into()),
                ])
            } else {
                Value::record([
                    ("code", Value::Int(200)),
                    ("body", Value::from(format!("<{url}>"))),
                ])
            };
            cb.call(vec![resp]);
        }))
    })
}

fn handle(s: &mut Scope<'_>, req: Handler<Request>) -> Result<(), Error> {
    let first = s.wait(fetch("http://a.example/index".to_owned()))?;
    let second = s.wait(fetch(format!("http://b.example{}", req.path)))?;
    for page in [first, second] {
        if let Some(body) = page.attr("body").and_then(Value::as_str) {
            req.write(body);
        }
    }
    Ok(())
}

fn main() {
    let handler = asynchronous(handle);

    handler.call(Request::new("/ok"));
    handler.call(Request::new("/missing"));
    EventLoop::instance().run();
}
