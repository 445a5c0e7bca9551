use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use thiserror::Error;

use crate::scene::{NodeRef, RedrawFlag};
use crate::schedule::{Scheduler, TimerHandle};
use crate::sequence::{next_frame, FrameIndex, FrameLocator, SequenceId};
use crate::texture::{ImageLoader, LoadError, LoadResult};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("invalid playback config: {0}")]
    InvalidConfig(&'static str),
}

/// Immutable playback parameters, fixed for the player's lifetime.
pub struct PlaybackConfig {
    pub frame_count: u32,
    /// Frames per second.
    pub frame_rate: f32,
    pub locator: Box<dyn FrameLocator>,
}

impl PlaybackConfig {
    pub fn new(frame_count: u32, frame_rate: f32, locator: impl FrameLocator + 'static) -> Self {
        Self {
            frame_count,
            frame_rate,
            locator: Box::new(locator),
        }
    }
}

enum State {
    Idle,
    Playing {
        sequence: SequenceId,
        frame: FrameIndex,
    },
}

struct Inner {
    config: PlaybackConfig,
    target: NodeRef,
    scheduler: Scheduler,
    loader: Rc<dyn ImageLoader>,
    redraw: RedrawFlag,
    on_frame_error: Rc<dyn Fn(&LoadError)>,
    on_stale: Option<Rc<dyn Fn(&SequenceId, FrameIndex)>>,
    state: State,
    // Bumped by start/switch_to; a load completion whose stamped
    // generation no longer matches is discarded, never attached. This is
    // what keeps a slow load for the old sequence from flashing a stale
    // frame after a toggle.
    generation: u64,
    pending: Option<TimerHandle>,
}

impl Inner {
    fn period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.config.frame_rate)
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // An abandoned player must not leave a scheduled callback behind.
        self.cancel_pending();
    }
}

/// Drives one looping image sequence onto one target surface. Cheap to
/// clone; all clones share the same playback state, so a pick callback
/// can hold one while the scene owns another.
#[derive(Clone)]
pub struct SequencePlayer {
    inner: Rc<RefCell<Inner>>,
}

impl SequencePlayer {
    pub fn new(
        config: PlaybackConfig,
        target: NodeRef,
        scheduler: Scheduler,
        loader: Rc<dyn ImageLoader>,
        redraw: RedrawFlag,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                target,
                scheduler,
                loader,
                redraw,
                on_frame_error: Rc::new(|err| log::warn!("frame load failed: {err}")),
                on_stale: None,
                state: State::Idle,
                generation: 0,
                pending: None,
            })),
        }
    }

    /// Replace the default (log-at-warn) per-frame error callback.
    pub fn with_error_handler(self, f: impl Fn(&LoadError) + 'static) -> Self {
        self.inner.borrow_mut().on_frame_error = Rc::new(f);
        self
    }

    /// Diagnostic hook fired when a stale load result is discarded.
    pub fn with_stale_hook(self, f: impl Fn(&SequenceId, FrameIndex) + 'static) -> Self {
        self.inner.borrow_mut().on_stale = Some(Rc::new(f));
        self
    }

    /// Begin looping `initial` from frame 0. The first frame is requested
    /// immediately, not one period from now. Restarting while playing
    /// cancels the previous cadence first.
    pub fn start(&self, initial: SequenceId) -> Result<(), PlayerError> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.config.frame_count == 0 {
                return Err(PlayerError::InvalidConfig("frame_count must be positive"));
            }
            if !(inner.config.frame_rate > 0.0) {
                return Err(PlayerError::InvalidConfig("frame_rate must be positive"));
            }
            inner.cancel_pending();
            inner.generation += 1;
            inner.state = State::Playing {
                sequence: initial,
                frame: 0,
            };
        }
        Self::advance(&self.inner);
        Ok(())
    }

    /// Swap the active sequence without disturbing the cadence: the
    /// pending tick still fires at its originally scheduled time and
    /// requests `(new_sequence, 0)`. Same-sequence calls are no-ops, as
    /// are calls on an idle player.
    pub fn switch_to(&self, new_sequence: SequenceId) {
        let mut inner = self.inner.borrow_mut();
        match &mut inner.state {
            State::Playing { sequence, frame } => {
                if *sequence == new_sequence {
                    return;
                }
                *sequence = new_sequence;
                *frame = 0;
            }
            State::Idle => {
                log::debug!("switch_to({new_sequence}) on an idle player");
                return;
            }
        }
        inner.generation += 1;
    }

    /// Stop the cadence. The last displayed image stays attached to the
    /// target material; the scene releases it on teardown.
    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.cancel_pending();
        inner.generation += 1;
        inner.state = State::Idle;
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.inner.borrow().state, State::Playing { .. })
    }

    pub fn current_sequence(&self) -> Option<SequenceId> {
        match &self.inner.borrow().state {
            State::Playing { sequence, .. } => Some(sequence.clone()),
            State::Idle => None,
        }
    }

    /// Frame index the *next* tick will request.
    pub fn current_frame(&self) -> Option<FrameIndex> {
        match &self.inner.borrow().state {
            State::Playing { frame, .. } => Some(*frame),
            State::Idle => None,
        }
    }

    /// One tick: issue the load for the current frame, step the frame
    /// counter, and schedule the next tick. Scheduling happens here, not
    /// in the load completion, so a slow or failed load never stalls or
    /// skews the cadence.
    fn advance(inner_rc: &Rc<RefCell<Inner>>) {
        let issue = {
            let inner = inner_rc.borrow();
            match &inner.state {
                State::Playing { sequence, frame } => Some((
                    sequence.clone(),
                    *frame,
                    inner.config.locator.locate(sequence, *frame),
                    inner.generation,
                )),
                State::Idle => None,
            }
        };
        let Some((sequence, frame, locator, generation)) = issue else {
            return;
        };

        let loader = inner_rc.borrow().loader.clone();
        let weak = Rc::downgrade(inner_rc);
        let issued_for = sequence.clone();
        loader.request(
            &locator,
            Box::new(move |result| {
                Self::complete(weak, generation, issued_for, frame, result);
            }),
        );

        let mut inner = inner_rc.borrow_mut();
        let frame_count = inner.config.frame_count;
        if let State::Playing { frame: f, .. } = &mut inner.state {
            *f = next_frame(frame, frame_count);
        }
        let period = inner.period();
        let weak = Rc::downgrade(inner_rc);
        let handle = inner.scheduler.schedule_after(
            period,
            Box::new(move || {
                if let Some(rc) = weak.upgrade() {
                    rc.borrow_mut().pending = None;
                    Self::advance(&rc);
                }
            }),
        );
        inner.pending = Some(handle);
    }

    /// Load completion. Runs on the cooperative queue, possibly long
    /// after the tick that issued it.
    fn complete(
        weak: Weak<RefCell<Inner>>,
        generation: u64,
        sequence: SequenceId,
        frame: FrameIndex,
        result: LoadResult,
    ) {
        let Some(rc) = weak.upgrade() else {
            return;
        };

        let (current_generation, on_stale, on_error, target, redraw) = {
            let inner = rc.borrow();
            (
                inner.generation,
                inner.on_stale.clone(),
                inner.on_frame_error.clone(),
                inner.target.clone(),
                inner.redraw.clone(),
            )
        };

        if generation != current_generation {
            // Issued before a start/switch/stop: release the resource
            // without ever attaching it.
            drop(result);
            if let Some(hook) = on_stale {
                hook(&sequence, frame);
            }
            return;
        }

        match result {
            Ok(image) => {
                let Some(target) = target.upgrade() else {
                    return;
                };
                let previous = match target.borrow_mut().mesh.as_mut() {
                    Some(mesh) => mesh.material.attach_map(image),
                    None => None,
                };
                // Only now, with the new image attached, does the old one
                // go away.
                drop(previous);
                redraw.request();
            }
            Err(err) => {
                // Never fatal to the loop; the next tick is already on
                // the queue.
                on_error(&err);
            }
        }
    }
}
