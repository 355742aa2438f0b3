//! a background computation that squares and sums numbers, each step is a
//! work item completing on a later turn with an explicit outcome
use std::rc::Rc;

use swirl::{Asynchronous, Error, EventLoop, Outcome, Scheduler, Scope, Work};

fn square(ev: Rc<EventLoop>, n: i64) -> Work {
    Work::new(move |cb| {
        ev.defer(Box::new(move || {
            if n > 9 {
                cb.complete(Outcome::Failure(Error::msg(format!("{n} out of range"))));
            } else {
                cb.complete(Outcome::ok(n * n));
            }
        }))
    })
}

fn sum(s: &mut Scope<'_>, (from, to, ev): (i64, i64, Rc<EventLoop>)) -> Result<(), Error> {
    let mut acc = 0;
    for i in from..to {
        match s.wait(square(ev.clone(), i)) {
            Ok(v) => acc += v.as_int().unwrap_or(0),
            Err(e) => {
                println!("skip: {e}");
                continue;
            }
        }
        println!("i = {i}, acc = {acc}");
    }

    let waits = s.suspensions() as i64;
    let pair = s.wait(Work::ready(Outcome::Success(vec![acc.into(), waits.into()])))?;
    println!("sum = {pair:?}");
    Ok(())
}

fn main() {
    let ev = Rc::new(EventLoop::new());
    let sum = Asynchronous::new(ev.clone()).wrap(sum);

    let a = sum.call((0, 5, ev.clone()));
    let b = sum.call((8, 12, ev.clone()));
    ev.run();
    println!("{a:?}\n{b:?}");
}
