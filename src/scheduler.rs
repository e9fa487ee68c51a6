//! Frame scheduling.
//!
//! The host owns the actual frame callback (a display-synced redraw in the
//! window host, a loop in headless runs). The scheduler decides when a callback
//! should be requested and whether an arriving callback is still wanted.
//!
//! ```text
//!            start()           pause()
//!   Idle ───────────▶ Running ─────────▶ Paused
//!                        ▲                 │
//!                        └──── resume() ───┘
//!   stop() from any state ──▶ Stopped (terminal)
//! ```
//!
//! Every request carries a [`FrameToken`]. `stop()` bumps the generation, so a
//! callback the host had already queued before unmount is recognized as stale
//! and ignored.

/// Identifies the scheduler generation a frame request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken {
    generation: u64,
}

impl FrameToken {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The platform's next-frame callback registration.
pub trait FrameDriver {
    /// Ask for one callback carrying `token` on the next frame.
    fn request_frame(&mut self, token: FrameToken);

    /// Withdraw a pending request if the platform allows it.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Driver for headless runs and tests: remembers the latest request and lets
/// the caller decide when to deliver it.
#[derive(Debug, Default, Clone)]
pub struct ManualDriver {
    pending: Option<FrameToken>,
    requests: u64,
    cancels: u64,
}

impl ManualDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending request, as a host would when the frame arrives.
    pub fn take_pending(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    #[inline]
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Total frames requested.
    #[inline]
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Total requests cancelled.
    #[inline]
    pub fn cancels(&self) -> u64 {
        self.cancels
    }
}

impl FrameDriver for ManualDriver {
    fn request_frame(&mut self, token: FrameToken) {
        self.pending = Some(token);
        self.requests += 1;
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
        self.cancels += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    /// Callbacks keep arriving and re-registering but do no work.
    Paused,
    /// Retired for good; nothing is ever scheduled again.
    Stopped,
}

/// What to do with a frame callback that is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// Step and draw, then call [`Scheduler::end_frame`].
    Work,
    /// Paused: skip the work, then call [`Scheduler::end_frame`] to stay registered.
    Skip,
}

#[derive(Debug)]
pub struct Scheduler<D: FrameDriver> {
    driver: D,
    state: SchedulerState,
    generation: u64,
    pending: Option<FrameToken>,
}

impl<D: FrameDriver> Scheduler<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            state: SchedulerState::Idle,
            generation: 0,
            pending: None,
        }
    }

    #[inline]
    fn token(&self) -> FrameToken {
        FrameToken {
            generation: self.generation,
        }
    }

    fn request(&mut self) {
        let token = self.token();
        self.driver.request_frame(token);
        self.pending = Some(token);
    }

    fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            self.driver.cancel_frame(token);
        }
    }

    /// Begin running and request the first frame.
    ///
    /// Returns `None` unless the scheduler was idle.
    pub fn start(&mut self) -> Option<FrameToken> {
        if self.state != SchedulerState::Idle {
            return None;
        }
        self.generation += 1;
        self.state = SchedulerState::Running;
        self.request();
        tracing::debug!(generation = self.generation, "scheduler started");
        Some(self.token())
    }

    /// Keep the loop registered but have callbacks skip their work.
    pub fn pause(&mut self) {
        if self.state == SchedulerState::Running {
            self.state = SchedulerState::Paused;
            tracing::debug!("scheduler paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state == SchedulerState::Paused {
            self.state = SchedulerState::Running;
            if self.pending.is_none() {
                self.request();
            }
            tracing::debug!("scheduler resumed");
        }
    }

    /// Retire the scheduler. Any in-flight token becomes stale.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.cancel();
        self.generation += 1;
        self.state = SchedulerState::Stopped;
        tracing::debug!(generation = self.generation, "scheduler stopped");
    }

    /// Validate an arriving callback. `None` means the token is stale.
    pub fn begin_frame(&mut self, token: FrameToken) -> Option<FrameDecision> {
        if token.generation != self.generation {
            return None;
        }
        match self.state {
            SchedulerState::Running => {
                self.pending = None;
                Some(FrameDecision::Work)
            }
            SchedulerState::Paused => {
                self.pending = None;
                Some(FrameDecision::Skip)
            }
            SchedulerState::Idle | SchedulerState::Stopped => None,
        }
    }

    /// Request the next frame. Paused frames re-register too.
    pub fn end_frame(&mut self) {
        let active = matches!(self.state, SchedulerState::Running | SchedulerState::Paused);
        if active && self.pending.is_none() {
            self.request();
        }
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_requests_one_frame() {
        let mut scheduler = Scheduler::new(ManualDriver::new());
        let token = scheduler.start().unwrap();
        assert_eq!(scheduler.driver().pending(), Some(token));
        assert_eq!(scheduler.driver().requests(), 1);
        assert!(scheduler.start().is_none());
    }

    #[test]
    fn test_frame_loop_reschedules() {
        let mut scheduler = Scheduler::new(ManualDriver::new());
        scheduler.start();
        for _ in 0..5 {
            let token = scheduler.driver_mut().take_pending().unwrap();
            assert_eq!(scheduler.begin_frame(token), Some(FrameDecision::Work));
            scheduler.end_frame();
        }
        assert_eq!(scheduler.driver().requests(), 6);
    }

    #[test]
    fn test_pause_keeps_request_registered() {
        let mut scheduler = Scheduler::new(ManualDriver::new());
        let token = scheduler.start().unwrap();
        scheduler.pause();
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert_eq!(scheduler.driver().pending(), Some(token));
        assert_eq!(scheduler.driver().cancels(), 0);

        scheduler.resume();
        assert!(scheduler.is_running());
        assert_eq!(scheduler.driver().pending(), Some(token));
        assert_eq!(scheduler.driver().requests(), 1);
    }

    #[test]
    fn test_callback_while_paused_skips_and_reschedules() {
        let mut scheduler = Scheduler::new(ManualDriver::new());
        scheduler.start();
        scheduler.pause();
        for _ in 0..3 {
            let token = scheduler.driver_mut().take_pending().unwrap();
            assert_eq!(scheduler.begin_frame(token), Some(FrameDecision::Skip));
            scheduler.end_frame();
        }
        assert!(scheduler.driver().pending().is_some());
        assert_eq!(scheduler.driver().requests(), 4);
    }

    #[test]
    fn test_stop_makes_tokens_stale() {
        let mut scheduler = Scheduler::new(ManualDriver::new());
        let token = scheduler.start().unwrap();
        scheduler.stop();
        assert_eq!(scheduler.begin_frame(token), None);
        scheduler.end_frame();
        scheduler.resume();
        assert!(scheduler.start().is_none());
        assert!(scheduler.driver().pending().is_none());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }
}
