//! Update-Callback Scheduler
//!
//! Each entity owns an ordered collection of per-frame callbacks. A callback
//! runs once per frame tick until it returns `true` ("I am finished"), at
//! which point it is removed. There is no cancellation handle: a callback's
//! own completion predicate is the only way to stop it.
//!
//! Callbacks scheduled while a run is in progress (via [`Tick::schedule`])
//! start on the next run, never the current one.

use crate::sim::entity::Body;

/// A scheduled per-frame callback. Returns `true` when finished.
pub type UpdateCallback = Box<dyn FnMut(&mut Tick<'_>) -> bool>;

/// Context handed to each callback: the owning entity's body, the current
/// simulation time, and a way to schedule follow-up callbacks.
pub struct Tick<'a> {
    /// The owning entity's mutable body state.
    pub body: &'a mut Body,
    /// Global simulation time in seconds.
    pub now: f32,
    spawned: &'a mut Vec<UpdateCallback>,
}

impl Tick<'_> {
    /// Entity-local time (excludes time spent stunned).
    #[inline]
    pub fn local_time(&self) -> f32 {
        self.body.local_time(self.now)
    }

    /// Schedule a follow-up callback. It first runs on the next frame tick.
    pub fn schedule(&mut self, callback: UpdateCallback) {
        self.spawned.push(callback);
    }
}

/// Ordered collection of update callbacks owned by one entity.
#[derive(Default)]
pub struct Scheduler {
    active: Vec<UpdateCallback>,
    incoming: Vec<UpdateCallback>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback. It first runs on the next [`run`](Self::run).
    pub fn schedule(&mut self, callback: UpdateCallback) {
        self.incoming.push(callback);
    }

    /// Run every callback once, in insertion order, removing the finished ones.
    pub fn run(&mut self, body: &mut Body, now: f32) {
        self.active.append(&mut self.incoming);

        let mut spawned: Vec<UpdateCallback> = Vec::new();
        self.active.retain_mut(|callback| {
            let mut tick = Tick {
                body: &mut *body,
                now,
                spawned: &mut spawned,
            };
            !callback(&mut tick)
        });

        self.incoming.append(&mut spawned);
    }

    /// Number of callbacks currently known to the scheduler.
    pub fn len(&self) -> usize {
        self.active.len() + self.incoming.len()
    }

    /// True when no callbacks are scheduled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use std::cell::Cell;
    use std::rc::Rc;

    fn test_body() -> Body {
        Body::new(Vec2::ZERO, 25.0, 5.0, 0.0)
    }

    #[test]
    fn test_done_callback_removed() {
        let mut sched = Scheduler::new();
        let mut body = test_body();

        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        sched.schedule(Box::new(move |_| {
            counter.set(counter.get() + 1);
            true // done after one run
        }));

        sched.run(&mut body, 0.0);
        assert_eq!(runs.get(), 1);
        assert!(sched.is_empty());

        // Never invoked again
        sched.run(&mut body, 1.0);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_unfinished_callback_runs_forever() {
        let mut sched = Scheduler::new();
        let mut body = test_body();

        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        sched.schedule(Box::new(move |_| {
            counter.set(counter.get() + 1);
            false
        }));

        for i in 0..100 {
            sched.run(&mut body, i as f32);
        }
        assert_eq!(runs.get(), 100);
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn test_removal_leaves_others_untouched() {
        let mut sched = Scheduler::new();
        let mut body = test_body();

        let long_runs = Rc::new(Cell::new(0));
        let short_runs = Rc::new(Cell::new(0));

        let c = long_runs.clone();
        sched.schedule(Box::new(move |_| {
            c.set(c.get() + 1);
            false
        }));
        let c = short_runs.clone();
        sched.schedule(Box::new(move |_| {
            c.set(c.get() + 1);
            true
        }));

        sched.run(&mut body, 0.0);
        sched.run(&mut body, 1.0);

        assert_eq!(short_runs.get(), 1);
        assert_eq!(long_runs.get(), 2);
    }

    #[test]
    fn test_callbacks_run_in_insertion_order() {
        let mut sched = Scheduler::new();
        let mut body = test_body();

        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        for tag in 0..4 {
            let order = order.clone();
            sched.schedule(Box::new(move |_| {
                order.borrow_mut().push(tag);
                true
            }));
        }

        sched.run(&mut body, 0.0);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_scheduled_during_run_starts_next_run() {
        let mut sched = Scheduler::new();
        let mut body = test_body();

        let child_runs = Rc::new(Cell::new(0));
        let c = child_runs.clone();
        sched.schedule(Box::new(move |tick| {
            let c = c.clone();
            tick.schedule(Box::new(move |_| {
                c.set(c.get() + 1);
                true
            }));
            true
        }));

        sched.run(&mut body, 0.0);
        assert_eq!(child_runs.get(), 0, "child must not run in the same tick");

        sched.run(&mut body, 1.0);
        assert_eq!(child_runs.get(), 1);
    }

    #[test]
    fn test_callback_mutates_body() {
        let mut sched = Scheduler::new();
        let mut body = test_body();

        sched.schedule(Box::new(|tick| {
            tick.body.position += Vec2::new(1.0, 0.0);
            tick.body.position.x >= 3.0
        }));

        for i in 0..10 {
            sched.run(&mut body, i as f32);
        }
        assert_eq!(body.position, Vec2::new(3.0, 0.0));
        assert!(sched.is_empty());
    }
}
