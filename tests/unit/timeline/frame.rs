use super::*;
use std::rc::Rc;

#[test]
fn tick_runs_only_already_queued_callbacks() {
    let sched = Rc::new(ManualFrameScheduler::new());
    let hits = Rc::new(Cell::new(0));

    let (s, h) = (sched.clone(), hits.clone());
    sched.request_frame(Box::new(move || {
        h.set(h.get() + 1);
        let h2 = h.clone();
        s.request_frame(Box::new(move || h2.set(h2.get() + 10)));
    }));

    assert_eq!(sched.tick(), 1);
    assert_eq!(hits.get(), 1);
    assert_eq!(sched.pending(), 1);
    assert_eq!(sched.tick(), 1);
    assert_eq!(hits.get(), 11);
}

#[test]
fn cancel_removes_queued_callback() {
    let sched = ManualFrameScheduler::new();
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    let handle = sched.request_frame(Box::new(move || h.set(1)));
    sched.cancel_frame(handle);
    sched.cancel_frame(handle);
    assert_eq!(sched.tick(), 0);
    assert_eq!(hits.get(), 0);
}
