//! Run-until-cancelled frame loop with an injectable clock.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::debug;

/// Source of frame ticks. `None` means the source has ended.
pub trait FrameClock {
    fn next_frame(&mut self) -> Option<Instant>;
}

/// Sleeps until the next multiple of the frame interval.
pub struct IntervalClock {
    interval: Duration,
    next: Option<Instant>,
}

impl IntervalClock {
    pub fn new(fps: u32) -> Self {
        Self { interval: Duration::from_secs(1) / fps.max(1), next: None }
    }
}

impl FrameClock for IntervalClock {
    fn next_frame(&mut self) -> Option<Instant> {
        let now = Instant::now();
        let due = *self.next.get_or_insert(now);
        if due > now {
            std::thread::sleep(due - now);
        }
        let tick = Instant::now();
        // Don't try to catch up on frames we overslept.
        self.next = Some((due + self.interval).max(tick));
        Some(tick)
    }
}

/// Hands out a fixed list of ticks, then ends. For deterministic tests and
/// headless replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: VecDeque<Instant>,
}

impl ManualClock {
    pub fn new(ticks: impl IntoIterator<Item = Instant>) -> Self {
        Self { ticks: ticks.into_iter().collect() }
    }

    /// `count` ticks `interval` apart starting at `start`.
    pub fn evenly(start: Instant, interval: Duration, count: u32) -> Self {
        Self::new((0..count).map(|i| start + interval * i))
    }
}

impl FrameClock for ManualClock {
    fn next_frame(&mut self) -> Option<Instant> {
        self.ticks.pop_front()
    }
}

/// Shared stop flag for the frame loop. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

#[derive(Debug, Default)]
pub struct FrameLoop {
    cancel: CancelToken,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Call `step` once per tick until the clock ends, the token is
    /// cancelled, or `step` asks to stop. Returns the number of steps run.
    pub fn run<C, F>(&self, clock: &mut C, mut step: F) -> u64
    where
        C: FrameClock + ?Sized,
        F: FnMut(Instant) -> LoopControl,
    {
        let mut frames = 0;
        loop {
            if self.cancel.is_cancelled() {
                debug!("frame loop cancelled after {frames} frames");
                break;
            }
            let Some(now) = clock.next_frame() else {
                debug!("frame clock ended after {frames} frames");
                break;
            };
            // Teardown may have happened while we waited for the tick.
            if self.cancel.is_cancelled() {
                break;
            }
            frames += 1;
            if step(now) == LoopControl::Stop {
                break;
            }
        }
        frames
    }
}
