//! # tick
//!
//! cooperative task queue and the per computation tick gate
//!
//! every step of a computation runs from this queue, never inside the
//! call stack that asked for it
//!

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

thread_local! {
    // each thread has its own default queue
    static CURRENT: TaskQueue = TaskQueue::new();
}

#[derive(Default)]
struct Inner {
    tasks: RefCell<VecDeque<Task>>,
    draining: Cell<bool>,
}

/// FIFO single consumer task queue
#[derive(Clone, Default)]
pub struct TaskQueue {
    inner: Rc<Inner>,
}

impl TaskQueue {
    /// create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// the default queue of the current thread
    pub fn current() -> Self {
        CURRENT.with(TaskQueue::clone)
    }

    /// append a task
    pub fn schedule<F: FnOnce() + 'static>(&self, f: F) {
        self.inner.tasks.borrow_mut().push_back(Box::new(f));
    }

    /// pending task count
    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// no pending task
    pub fn is_empty(&self) -> bool {
        self.inner.tasks.borrow().is_empty()
    }

    /// run the oldest task, return false if there was none
    ///
    /// returns false without running anything when called from a task
    pub fn run_once(&self) -> bool {
        let Some(_guard) = Drain::enter(&self.inner) else {
            return false;
        };
        self.pop_run()
    }

    /// run tasks until the queue is empty, tasks scheduled meanwhile included
    ///
    /// returns the number of tasks run, `0` when called from a task
    pub fn run_until_idle(&self) -> usize {
        let Some(_guard) = Drain::enter(&self.inner) else {
            debug!("reentrant drain ignored");
            return 0;
        };
        let mut n = 0;
        while self.pop_run() {
            n += 1;
        }
        n
    }

    /// mark the queue as draining without running anything
    ///
    /// `None` when it is already draining
    pub(crate) fn hold(&self) -> Option<Drain<'_>> {
        Drain::enter(&self.inner)
    }

    fn pop_run(&self) -> bool {
        // the borrow must end before the task runs
        let task = self.inner.tasks.borrow_mut().pop_front();
        match task {
            Some(t) => {
                t();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TaskQueue {{ pending: {} }}", self.len())
    }
}

// resets the draining flag even if a task panics
pub(crate) struct Drain<'a>(&'a Inner);

impl<'a> Drain<'a> {
    fn enter(inner: &'a Inner) -> Option<Self> {
        if inner.draining.replace(true) {
            return None;
        }
        Some(Drain(inner))
    }
}

impl Drop for Drain<'_> {
    fn drop(&mut self) {
        self.0.draining.set(false);
    }
}

/// drain the current thread's queue
pub fn run_until_idle() -> usize {
    TaskQueue::current().run_until_idle()
}

/// tick gate of one computation
///
/// at most one step is pending at any time
pub(crate) struct Ticker {
    queue: TaskQueue,
    ticking: Rc<Cell<bool>>,
}

impl Ticker {
    pub fn new(queue: TaskQueue) -> Self {
        Ticker {
            queue,
            ticking: Rc::new(Cell::new(false)),
        }
    }

    /// schedule `f` on the next tick
    ///
    /// returns false, dropping `f`, when a tick is already pending
    pub fn tick<F: FnOnce() + 'static>(&self, f: F) -> bool {
        if self.ticking.replace(true) {
            return false;
        }
        let ticking = self.ticking.clone();
        self.queue.schedule(move || {
            ticking.set(false);
            f()
        });
        true
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_and_later_tasks() {
        let q = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let l = log.clone();
            let q2 = q.clone();
            q.schedule(move || {
                l.borrow_mut().push(i);
                if i == 0 {
                    let l = l.clone();
                    q2.schedule(move || l.borrow_mut().push(10));
                }
            });
        }
        // nothing runs until drained
        assert!(log.borrow().is_empty());
        assert_eq!(q.run_until_idle(), 4);
        assert_eq!(*log.borrow(), vec![0, 1, 2, 10]);
        assert!(q.is_empty());
    }

    #[test]
    fn no_reentrant_drain() {
        let q = TaskQueue::new();
        let inner_ran = Rc::new(Cell::new(usize::MAX));
        let q2 = q.clone();
        let r = inner_ran.clone();
        q.schedule(move || {
            q2.schedule(|| {});
            r.set(q2.run_until_idle());
            assert!(!q2.run_once());
        });
        assert_eq!(q.run_until_idle(), 2);
        assert_eq!(inner_ran.get(), 0);
    }

    #[test]
    fn held_queue_is_not_drained() {
        let q = TaskQueue::new();
        q.schedule(|| {});
        {
            let hold = q.hold();
            assert!(hold.is_some());
            assert!(q.hold().is_none());
            assert_eq!(q.run_until_idle(), 0);
        }
        assert_eq!(q.run_until_idle(), 1);
    }

    #[test]
    fn ticker_coalesces() {
        let q = TaskQueue::new();
        let t = Ticker::new(q.clone());
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        assert!(t.tick(move || h.set(h.get() + 1)));
        assert!(t.is_ticking());
        let h = hits.clone();
        assert!(!t.tick(move || h.set(h.get() + 100)));
        assert_eq!(q.len(), 1);

        q.run_until_idle();
        assert_eq!(hits.get(), 1);
        assert!(!t.is_ticking());

        let h = hits.clone();
        assert!(t.tick(move || h.set(h.get() + 1)));
        q.run_until_idle();
        assert_eq!(hits.get(), 2);
    }
}
