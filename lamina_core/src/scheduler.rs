// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing one-shot timer for deferred compositing updates.
//!
//! Style changes and sub-frame notifications ask for a compositing update
//! "soon" instead of running one immediately. Any number of requests before
//! the next run-loop turn collapse into a single update. The host provides the
//! run loop; the timer only remembers whether a callback is outstanding.

/// The host's run loop.
pub trait RunLoop {
    /// Arranges for the owner of the timer to be called back on a later turn
    /// of the run loop.
    fn schedule_once(&mut self);
}

/// A [`RunLoop`] that never calls back. Pending updates are run explicitly
/// by the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualRunLoop;

impl RunLoop for ManualRunLoop {
    fn schedule_once(&mut self) {}
}

/// One-shot timer state.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateTimer {
    active: bool,
    invalidated: bool,
    scheduled: u64,
}

impl UpdateTimer {
    /// Creates an idle timer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: false,
            invalidated: false,
            scheduled: 0,
        }
    }

    /// Starts the timer unless it is already pending. Returns `true` if a
    /// new callback was requested from `run_loop`.
    pub fn start_one_shot(&mut self, run_loop: &mut dyn RunLoop) -> bool {
        if self.active || self.invalidated {
            return false;
        }
        self.active = true;
        self.scheduled += 1;
        run_loop.schedule_once();
        true
    }

    /// Cancels a pending callback.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Stops the timer for good; later start requests are ignored.
    pub fn invalidate(&mut self) {
        self.active = false;
        self.invalidated = true;
    }

    /// Returns whether a callback is pending.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns how many callbacks have been requested over the timer's life.
    #[must_use]
    pub const fn scheduled_count(&self) -> u64 {
        self.scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingLoop(u32);

    impl RunLoop for CountingLoop {
        fn schedule_once(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn requests_coalesce_until_stopped() {
        let mut rl = CountingLoop::default();
        let mut timer = UpdateTimer::new();
        assert!(timer.start_one_shot(&mut rl));
        assert!(!timer.start_one_shot(&mut rl));
        assert!(timer.is_active());
        assert_eq!(rl.0, 1);

        timer.stop();
        assert!(!timer.is_active());
        assert!(timer.start_one_shot(&mut rl));
        assert_eq!(rl.0, 2);
        assert_eq!(timer.scheduled_count(), 2);
    }

    #[test]
    fn invalidated_timer_ignores_requests() {
        let mut rl = CountingLoop::default();
        let mut timer = UpdateTimer::new();
        timer.start_one_shot(&mut rl);
        timer.invalidate();
        assert!(!timer.is_active());
        assert!(!timer.start_one_shot(&mut rl));
        assert_eq!(rl.0, 1);
    }

    #[test]
    fn manual_loop_is_silent() {
        let mut timer = UpdateTimer::new();
        assert!(timer.start_one_shot(&mut ManualRunLoop));
        assert!(timer.is_active());
    }
}
