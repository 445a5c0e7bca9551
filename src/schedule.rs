use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;
use std::time::Duration;

/// A queued unit of work. Runs at most once.
pub type Task = Box<dyn FnOnce()>;

/// Handle to a scheduled one-shot callback. Cancelling a fired or already
/// cancelled handle is a no-op.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct Inner {
    now: Duration,
    next_id: u64,
    // Heap holds (deadline, id); the task itself lives in `tasks` so a
    // cancel can remove it without touching the heap.
    due: BinaryHeap<Reverse<(Duration, u64)>>,
    tasks: HashMap<u64, Task>,
}

/// Single-threaded cooperative queue: cancellable one-shot timers plus
/// immediately-ready posted tasks, all fired from `advance_to` in
/// deadline order. Time is virtual; the viewer feeds it wall-clock
/// elapsed time, tests feed it whatever they like.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<Inner>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                now: Duration::ZERO,
                next_id: 0,
                due: BinaryHeap::new(),
                tasks: HashMap::new(),
            })),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Schedule `task` to fire once `delay` after the current virtual time.
    pub fn schedule_after(&self, delay: Duration, task: Task) -> TimerHandle {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let deadline = inner.now + delay;
        inner.due.push(Reverse((deadline, id)));
        inner.tasks.insert(id, task);
        TimerHandle(id)
    }

    /// Post `task` to run on the next pump, before any later timer.
    /// Used to deliver resource-load completions onto this queue.
    pub fn post(&self, task: Task) {
        self.schedule_after(Duration::ZERO, task);
    }

    /// Remove a pending timer. Returns false if it already fired or was
    /// already cancelled. A cancelled timer never fires.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        self.inner.borrow_mut().tasks.remove(&handle.0).is_some()
    }

    /// Number of pending (not yet fired, not cancelled) tasks.
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Advance virtual time to `t`, firing every due task in deadline
    /// order (ties by scheduling order). Tasks queued during the pump
    /// fire in the same call when their deadline is within `t`.
    pub fn advance_to(&self, t: Duration) {
        loop {
            let task = {
                let mut inner = self.inner.borrow_mut();
                loop {
                    match inner.due.peek() {
                        Some(&Reverse((deadline, id))) if deadline <= t => {
                            inner.due.pop();
                            inner.now = inner.now.max(deadline);
                            // Cancelled entries stay in the heap; skip them.
                            if let Some(task) = inner.tasks.remove(&id) {
                                break Some(task);
                            }
                        }
                        _ => break None,
                    }
                }
            };
            match task {
                // Borrow is released before the task runs so it can
                // schedule or cancel freely.
                Some(task) => task(),
                None => break,
            }
        }
        self.inner.borrow_mut().now = t;
    }

    /// Advance virtual time by `delta`.
    pub fn advance_by(&self, delta: Duration) {
        let t = self.now() + delta;
        self.advance_to(t);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
