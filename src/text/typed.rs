//! Typed-text reveal: segments typed character-by-character, with a pause
//! and deletion between segments. No looping; the reveal sequencer owns what
//! happens after the final segment.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::foundation::error::{StageError, StageResult};
use crate::resources::StageResources;
use crate::timing::scheduler::{Scheduler, TimerId};

#[derive(Clone, Debug)]
pub struct TypedTextConfig {
    /// Per-character typing delay.
    pub typing: Duration,
    /// Hold after a completed segment before deletion starts.
    pub pause: Duration,
    /// Per-character deletion delay (faster than typing).
    pub delete: Duration,
    pub cursor: char,
}

impl Default for TypedTextConfig {
    fn default() -> Self {
        Self {
            typing: Duration::from_millis(25),
            pause: Duration::from_millis(3500),
            delete: Duration::from_millis(10),
            cursor: '_',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Typing,
    Pausing,
    Deleting,
    Done,
}

struct State {
    segments: Vec<Vec<char>>,
    cfg: TypedTextConfig,
    segment: usize,
    shown: usize,
    phase: Phase,
    timer: Option<TimerId>,
    on_segment_complete: Box<dyn FnMut(usize)>,
    scheduler: Scheduler,
    unmounted: bool,
}

/// Typed text engine instance; cancels its timer chain on unmount/drop.
pub struct TypedText {
    state: Rc<RefCell<State>>,
}

impl TypedText {
    pub fn mount(
        resources: &StageResources,
        segments: Vec<String>,
        cfg: TypedTextConfig,
        on_segment_complete: impl FnMut(usize) + 'static,
    ) -> StageResult<Self> {
        if segments.is_empty() {
            return Err(StageError::validation("typed text requires at least one segment"));
        }
        let state = Rc::new(RefCell::new(State {
            segments: segments.iter().map(|s| s.chars().collect()).collect(),
            cfg,
            segment: 0,
            shown: 0,
            phase: Phase::Typing,
            timer: None,
            on_segment_complete: Box::new(on_segment_complete),
            scheduler: resources.scheduler.clone(),
            unmounted: false,
        }));
        let typing = state.borrow().cfg.typing;
        schedule_step(&state, typing);
        tracing::debug!(segments = segments.len(), "typed text mounted");
        Ok(Self { state })
    }

    /// Currently displayed text plus cursor.
    pub fn displayed(&self) -> String {
        let s = self.state.borrow();
        let mut out: String = s.segments[s.segment][..s.shown].iter().collect();
        if s.phase != Phase::Done {
            out.push(s.cfg.cursor);
        }
        out
    }

    pub fn is_done(&self) -> bool {
        self.state.borrow().phase == Phase::Done
    }

    pub fn unmount(&mut self) {
        let mut s = self.state.borrow_mut();
        if s.unmounted {
            return;
        }
        s.unmounted = true;
        if let Some(id) = s.timer.take() {
            s.scheduler.cancel(id);
        }
        tracing::debug!("typed text unmounted");
    }
}

impl Drop for TypedText {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn schedule_step(state: &Rc<RefCell<State>>, delay: Duration) {
    let weak = Rc::downgrade(state);
    let mut s = state.borrow_mut();
    if s.unmounted {
        return;
    }
    let id = s.scheduler.schedule(delay, move || {
        let Some(state) = weak.upgrade() else { return };
        step(&state);
    });
    s.timer = Some(id);
}

fn step(state: &Rc<RefCell<State>>) {
    let (next_delay, completed_segment) = {
        let mut s = state.borrow_mut();
        if s.unmounted {
            return;
        }
        s.timer = None;
        match s.phase {
            Phase::Typing => {
                let len = s.segments[s.segment].len();
                if s.shown < len {
                    s.shown += 1;
                }
                if s.shown >= len {
                    let idx = s.segment;
                    let last = idx + 1 == s.segments.len();
                    s.phase = if last { Phase::Done } else { Phase::Pausing };
                    let delay = (!last).then_some(s.cfg.pause);
                    (delay, Some(idx))
                } else {
                    (Some(s.cfg.typing), None)
                }
            }
            Phase::Pausing => {
                s.phase = Phase::Deleting;
                (Some(s.cfg.delete), None)
            }
            Phase::Deleting => {
                if s.shown > 0 {
                    s.shown -= 1;
                }
                if s.shown == 0 {
                    s.segment += 1;
                    s.phase = Phase::Typing;
                    (Some(s.cfg.typing), None)
                } else {
                    (Some(s.cfg.delete), None)
                }
            }
            Phase::Done => (None, None),
        }
    };

    if let Some(idx) = completed_segment {
        // Callback runs with no internal borrow held; it may unmount us.
        let cb_state = Rc::clone(state);
        let mut s = cb_state.borrow_mut();
        let mut cb = std::mem::replace(&mut s.on_segment_complete, Box::new(|_| {}));
        drop(s);
        cb(idx);
        let mut s = cb_state.borrow_mut();
        s.on_segment_complete = cb;
    }

    if let Some(delay) = next_delay {
        schedule_step(state, delay);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/typed.rs"]
mod tests;
