//! Blur/scale/contrast "blob-to-text" reveal for short brand/tagline strings.
//!
//! Progress is a single scalar; every visual parameter is a pure function of
//! it, so the terminal state freezes exactly once and stays frozen.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::foundation::error::{StageError, StageResult};
use crate::resources::StageResources;
use crate::timing::clock::FRAME;
use crate::timing::ease::Ease;
use crate::timing::scheduler::{Scheduler, TimerId};

/// Incoming/outgoing cross-fade blur is capped to keep the filter finite as
/// the opposed fraction approaches zero.
const CROSSFADE_BLUR_CAP: f64 = 200.0;

/// When the morph animation is allowed to begin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartGate {
    Immediate,
    AfterDelay(Duration),
}

#[derive(Clone, Copy, Debug)]
pub struct MorphConfig {
    /// Seconds from blob to fully legible text.
    pub morph_secs: f64,
    /// Hold between morphs in multi-string mode.
    pub cooldown_secs: f64,
    /// Blur radius at fraction 0, px.
    pub max_blur: f64,
    pub start: StartGate,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            morph_secs: 3.0,
            cooldown_secs: 0.5,
            max_blur: 12.0,
            start: StartGate::Immediate,
        }
    }
}

impl MorphConfig {
    fn validate(&self) -> StageResult<()> {
        if !(self.morph_secs.is_finite() && self.morph_secs > 0.0) {
            return Err(StageError::validation("morph duration must be > 0"));
        }
        if !(self.max_blur.is_finite() && self.max_blur >= 0.0) {
            return Err(StageError::validation("max blur must be >= 0"));
        }
        Ok(())
    }
}

/// Derived visual parameters; never set independently of the fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MorphStyle {
    pub blur_px: f64,
    pub scale: f64,
    pub contrast: f64,
    pub brightness: f64,
    pub opacity: f64,
}

impl MorphStyle {
    /// Single-string style for an eased fraction in [0, 1].
    fn single(eased: f64, max_blur: f64) -> Self {
        Self {
            blur_px: (max_blur * (1.0 - eased).powf(1.5)).max(0.0),
            scale: 0.85 + eased * 0.15,
            contrast: 0.8 + eased * 0.2,
            brightness: 0.9 + eased * 0.1,
            opacity: 0.95,
        }
    }

    /// Terminal (frozen) style.
    fn settled() -> Self {
        Self {
            blur_px: 0.0,
            scale: 1.0,
            contrast: 1.0,
            brightness: 1.0,
            opacity: 0.95,
        }
    }

    /// Incoming side of a multi-string cross-fade.
    fn fading_in(fraction: f64, max_blur: f64) -> Self {
        let f = fraction.max(f64::EPSILON);
        Self {
            blur_px: (max_blur / f - max_blur).min(CROSSFADE_BLUR_CAP),
            scale: 1.0,
            contrast: 0.5 + fraction * 0.5,
            brightness: 1.0,
            opacity: fraction.powf(0.4),
        }
    }

    /// Outgoing side of a multi-string cross-fade.
    fn fading_out(fraction: f64, max_blur: f64) -> Self {
        Self::fading_in(1.0 - fraction, max_blur)
    }
}

enum Mode {
    Single,
    Multi { index: usize, cooldown_left: f64 },
}

struct State {
    texts: Vec<String>,
    cfg: MorphConfig,
    mode: Mode,
    /// Raw progress, monotonically non-decreasing per activation.
    fraction: f64,
    completed: bool,
    frame: Option<TimerId>,
    start_timer: Option<TimerId>,
    on_complete: Option<Box<dyn FnOnce()>>,
    scheduler: Scheduler,
    unmounted: bool,
}

impl State {
    fn eased(&self) -> f64 {
        Ease::InOutQuad.apply(self.fraction)
    }
}

/// Morph text engine instance. Unmounting (or dropping) silently cancels the
/// animation loop; the completion callback never fires after unmount.
pub struct MorphText {
    state: Rc<RefCell<State>>,
}

impl MorphText {
    /// Mount with one or more strings. The completion callback fires exactly
    /// once, when a single-string morph reaches its frozen terminal state;
    /// multi-string morphs cycle forever and never complete.
    pub fn mount(
        resources: &StageResources,
        texts: Vec<String>,
        cfg: MorphConfig,
        on_complete: impl FnOnce() + 'static,
    ) -> StageResult<Self> {
        cfg.validate()?;
        if texts.is_empty() {
            return Err(StageError::validation("morph text requires at least one string"));
        }

        let mode = if texts.len() == 1 {
            Mode::Single
        } else {
            Mode::Multi {
                index: 0,
                cooldown_left: 0.0,
            }
        };
        let start = cfg.start;
        let state = Rc::new(RefCell::new(State {
            texts,
            cfg,
            mode,
            fraction: 0.0,
            completed: false,
            frame: None,
            start_timer: None,
            on_complete: Some(Box::new(on_complete)),
            scheduler: resources.scheduler.clone(),
            unmounted: false,
        }));

        match start {
            StartGate::Immediate => start_loop(&state),
            StartGate::AfterDelay(delay) => {
                let weak = Rc::downgrade(&state);
                let id = resources.scheduler.schedule(delay, move || {
                    if let Some(state) = weak.upgrade() {
                        start_loop(&state);
                    }
                });
                state.borrow_mut().start_timer = Some(id);
            }
        }

        tracing::debug!("morph text mounted");
        Ok(Self { state })
    }

    /// Raw progress in [0, 1]; monotonically non-decreasing while animating.
    pub fn fraction(&self) -> f64 {
        self.state.borrow().fraction
    }

    /// Poll-based completion check, kept for consumers that cannot take the
    /// callback; up to one poll interval of latency is expected there.
    pub fn is_complete(&self) -> bool {
        self.state.borrow().completed
    }

    /// Current derived style. After completion this is frozen permanently.
    pub fn style(&self) -> MorphStyle {
        let s = self.state.borrow();
        if s.completed {
            return MorphStyle::settled();
        }
        match s.mode {
            Mode::Single => MorphStyle::single(s.eased(), s.cfg.max_blur),
            Mode::Multi { .. } => MorphStyle::fading_in(s.eased(), s.cfg.max_blur),
        }
    }

    /// Multi-string mode: styles for the (outgoing, incoming) pair.
    pub fn crossfade_styles(&self) -> (MorphStyle, MorphStyle) {
        let s = self.state.borrow();
        let f = s.eased();
        (
            MorphStyle::fading_out(f, s.cfg.max_blur),
            MorphStyle::fading_in(f, s.cfg.max_blur),
        )
    }

    /// Currently displayed string.
    pub fn current_text(&self) -> String {
        let s = self.state.borrow();
        match s.mode {
            Mode::Single => s.texts[0].clone(),
            Mode::Multi { index, .. } => s.texts[index % s.texts.len()].clone(),
        }
    }

    /// Incoming string in multi-string mode.
    pub fn next_text(&self) -> String {
        let s = self.state.borrow();
        match s.mode {
            Mode::Single => s.texts[0].clone(),
            Mode::Multi { index, .. } => s.texts[(index + 1) % s.texts.len()].clone(),
        }
    }

    /// Cancel the animation loop without completing.
    pub fn unmount(&mut self) {
        let mut s = self.state.borrow_mut();
        if s.unmounted {
            return;
        }
        s.unmounted = true;
        s.on_complete = None;
        if let Some(id) = s.frame.take() {
            s.scheduler.cancel(id);
        }
        if let Some(id) = s.start_timer.take() {
            s.scheduler.cancel(id);
        }
        tracing::debug!("morph text unmounted");
    }
}

impl Drop for MorphText {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn start_loop(state: &Rc<RefCell<State>>) {
    let weak: Weak<RefCell<State>> = Rc::downgrade(state);
    let mut s = state.borrow_mut();
    if s.unmounted || s.frame.is_some() {
        return;
    }
    let id = s.scheduler.every_frame(move || {
        let Some(state) = weak.upgrade() else { return };
        tick(&state);
    });
    s.frame = Some(id);
}

fn tick(state: &Rc<RefCell<State>>) {
    let finished = {
        let mut guard = state.borrow_mut();
        if guard.unmounted || guard.completed {
            return;
        }
        let dt = FRAME.as_secs_f64();
        let s = &mut *guard;
        match &mut s.mode {
            Mode::Single => {
                s.fraction = (s.fraction + dt / s.cfg.morph_secs).min(1.0);
                if s.fraction >= 1.0 {
                    s.completed = true;
                    if let Some(id) = s.frame.take() {
                        s.scheduler.cancel(id);
                    }
                    true
                } else {
                    false
                }
            }
            Mode::Multi {
                index,
                cooldown_left,
            } => {
                if *cooldown_left > 0.0 {
                    *cooldown_left -= dt;
                    s.fraction = 0.0;
                } else {
                    s.fraction = (s.fraction + dt / s.cfg.morph_secs).min(1.0);
                    if s.fraction >= 1.0 {
                        // Advance cyclically and rest before the next morph.
                        *index = (*index + 1) % s.texts.len();
                        *cooldown_left = s.cfg.cooldown_secs;
                        s.fraction = 0.0;
                    }
                }
                false
            }
        }
    };

    if finished {
        tracing::debug!("morph complete");
        let cb = state.borrow_mut().on_complete.take();
        if let Some(cb) = cb {
            cb();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/morph.rs"]
mod tests;
