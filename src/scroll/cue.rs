//! Looping bounce/fade animation for the scroll-down cue.
//!
//! The loop is gated: it runs only while stage 1 is the active stage, a
//! configurable initial delay has elapsed, and some content has announced
//! readiness. Visibility is exactly that conjunction; losing the stage gate
//! hides the cue within a frame no matter where the loop is.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::notify::bus::{Notice, Stage, Subscription};
use crate::resources::StageResources;
use crate::timing::ease::Ease;
use crate::timing::scheduler::TimerId;
use crate::timing::tween::{Tween, animate};

/// Fast fade used when the stage-1 gate drops mid-loop.
const GATE_FADE: Duration = Duration::from_millis(200);
/// Fade used when a user scroll interrupts the loop.
const SCROLL_FADE: Duration = Duration::from_millis(500);
/// Pause before auto-resume after a scroll interrupt (matches the loop's own
/// fade-out + rest span).
const SCROLL_REST: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug)]
pub struct ScrollCueConfig {
    /// Bounce displacement unit, px; pulses travel 1x, 2x, and 3x this.
    pub bounce_px: f64,
}

impl Default for ScrollCueConfig {
    fn default() -> Self {
        Self { bounce_px: 40.0 }
    }
}

/// One step of the looping timeline.
#[derive(Clone, Copy, Debug)]
enum LoopStep {
    /// Tween opacity and vertical offset toward targets.
    Move {
        opacity: f64,
        offset: f64,
        duration: Duration,
        ease: Ease,
    },
    /// Hold everything still.
    Rest(Duration),
}

fn loop_steps(bounce: f64) -> Vec<LoopStep> {
    use LoopStep::{Move, Rest};
    vec![
        // Fade in.
        Move {
            opacity: 1.0,
            offset: 0.0,
            duration: Duration::from_millis(800),
            ease: Ease::OutQuad,
        },
        // Three staged downward pulses.
        Move {
            opacity: 0.2,
            offset: bounce,
            duration: Duration::from_millis(700),
            ease: Ease::InQuad,
        },
        Move {
            opacity: 1.0,
            offset: bounce * 2.0,
            duration: Duration::from_millis(700),
            ease: Ease::OutQuad,
        },
        Move {
            opacity: 0.1,
            offset: bounce * 3.0,
            duration: Duration::from_millis(500),
            ease: Ease::InCubic,
        },
        // Snap back.
        Move {
            opacity: 1.0,
            offset: 0.0,
            duration: Duration::from_millis(500),
            ease: Ease::OutBounce,
        },
        Rest(Duration::from_millis(300)),
        // Fade out and rest while hidden.
        Move {
            opacity: 0.0,
            offset: 0.0,
            duration: Duration::from_millis(800),
            ease: Ease::InQuad,
        },
        Rest(Duration::from_millis(3200)),
    ]
}

struct State {
    cfg: ScrollCueConfig,
    stage1_active: bool,
    delay_elapsed: bool,
    content_ready: bool,
    running: bool,
    step: usize,
    opacity: f64,
    offset: f64,
    tween: Option<Tween>,
    step_timer: Option<TimerId>,
    resume_timer: Option<TimerId>,
    delay_timer: Option<TimerId>,
    resources: StageResources,
    unmounted: bool,
}

impl State {
    fn gates_open(&self) -> bool {
        self.stage1_active && self.delay_elapsed && self.content_ready
    }

    fn halt_loop(&mut self) {
        self.running = false;
        if let Some(t) = self.tween.take() {
            t.cancel();
        }
        if let Some(id) = self.step_timer.take() {
            self.resources.scheduler.cancel(id);
        }
    }

    fn cancel_resume(&mut self) {
        if let Some(id) = self.resume_timer.take() {
            self.resources.scheduler.cancel(id);
        }
    }

    fn cancel_delay(&mut self) {
        if let Some(id) = self.delay_timer.take() {
            self.resources.scheduler.cancel(id);
        }
    }
}

/// Scroll cue instance; tears down all timers on unmount/drop.
pub struct ScrollCue {
    state: Rc<RefCell<State>>,
    _subs: Vec<Subscription>,
}

impl ScrollCue {
    pub fn mount(resources: &StageResources, cfg: ScrollCueConfig) -> Self {
        let state = Rc::new(RefCell::new(State {
            cfg,
            // Retained topic state covers mounts that happen after the
            // notices already fired.
            stage1_active: resources.bus.stage_active(Stage(1)),
            delay_elapsed: false,
            content_ready: resources.bus.content_ready(),
            running: false,
            step: 0,
            opacity: 0.0,
            offset: 0.0,
            tween: None,
            step_timer: None,
            resume_timer: None,
            delay_timer: None,
            resources: resources.clone(),
            unmounted: false,
        }));

        let subs = vec![
            {
                let weak = Rc::downgrade(&state);
                resources.bus.subscribe(Notice::StageEntering(Stage(1)), move || {
                    if let Some(state) = weak.upgrade() {
                        state.borrow_mut().stage1_active = true;
                        try_start(&state);
                    }
                })
            },
            {
                let weak = Rc::downgrade(&state);
                resources.bus.subscribe(Notice::StageLeaving(Stage(1)), move || {
                    if let Some(state) = weak.upgrade() {
                        on_stage1_lost(&state);
                    }
                })
            },
            {
                let weak = Rc::downgrade(&state);
                resources.bus.subscribe(Notice::ContentReady, move || {
                    if let Some(state) = weak.upgrade() {
                        state.borrow_mut().content_ready = true;
                        try_start(&state);
                    }
                })
            },
        ];

        // Elapsed-time gate.
        {
            let weak = Rc::downgrade(&state);
            let delay = resources.timing.scroll_initial_delay();
            let id = resources.scheduler.schedule(delay, move || {
                if let Some(state) = weak.upgrade() {
                    {
                        let mut s = state.borrow_mut();
                        s.delay_elapsed = true;
                        s.delay_timer = None;
                    }
                    try_start(&state);
                }
            });
            state.borrow_mut().delay_timer = Some(id);
        }

        Self { state, _subs: subs }
    }

    /// Visibility is exactly the gating conjunction.
    pub fn visible(&self) -> bool {
        let s = self.state.borrow();
        !s.unmounted && s.gates_open()
    }

    pub fn opacity(&self) -> f64 {
        self.state.borrow().opacity
    }

    pub fn offset_y(&self) -> f64 {
        self.state.borrow().offset
    }

    pub fn is_animating(&self) -> bool {
        self.state.borrow().running
    }

    /// A user scroll interrupts the loop: immediate fade-out, then a single
    /// auto-resume after the rest period, provided the gates still hold.
    pub fn notify_scroll(&self) {
        let (scheduler, from) = {
            let mut s = self.state.borrow_mut();
            if s.unmounted || !s.running {
                return;
            }
            s.halt_loop();
            s.cancel_resume();
            (s.resources.scheduler.clone(), s.opacity)
        };
        tracing::debug!("scroll cue interrupted by user scroll");

        let weak = Rc::downgrade(&self.state);
        let fade = animate(
            &scheduler,
            from,
            0.0,
            SCROLL_FADE,
            Ease::InQuad,
            {
                let weak = weak.clone();
                move |v| {
                    if let Some(state) = weak.upgrade() {
                        state.borrow_mut().opacity = v;
                    }
                }
            },
            || {},
        );
        let resume_id = scheduler.schedule(SCROLL_REST, {
            let weak = weak.clone();
            move || {
                let Some(state) = weak.upgrade() else { return };
                state.borrow_mut().resume_timer = None;
                try_start(&state);
            }
        });
        let mut s = self.state.borrow_mut();
        s.tween = Some(fade);
        s.resume_timer = Some(resume_id);
    }

    pub fn unmount(&mut self) {
        let mut s = self.state.borrow_mut();
        if s.unmounted {
            return;
        }
        s.unmounted = true;
        s.halt_loop();
        s.cancel_resume();
        s.cancel_delay();
        s.opacity = 0.0;
        self._subs.clear();
    }
}

impl Drop for ScrollCue {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Start the loop from the top iff all gates hold and it is not already
/// running. Safe to call from any gate edge, any number of times.
fn try_start(state: &Rc<RefCell<State>>) {
    {
        let mut s = state.borrow_mut();
        if s.unmounted || s.running || !s.gates_open() {
            return;
        }
        s.cancel_resume();
        if let Some(t) = s.tween.take() {
            t.cancel();
        }
        s.running = true;
        s.step = 0;
        s.opacity = 0.0;
        s.offset = 0.0;
    }
    tracing::debug!("scroll cue loop starting");
    run_step(state);
}

/// Stage-1 gate dropped: hide within a frame and pause the loop wherever it
/// was.
fn on_stage1_lost(state: &Rc<RefCell<State>>) {
    let (scheduler, from) = {
        let mut s = state.borrow_mut();
        s.stage1_active = false;
        if s.unmounted {
            return;
        }
        s.halt_loop();
        s.cancel_resume();
        (s.resources.scheduler.clone(), s.opacity)
    };
    let weak = Rc::downgrade(state);
    let fade = animate(
        &scheduler,
        from,
        0.0,
        GATE_FADE,
        Ease::InQuad,
        move |v| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().opacity = v;
            }
        },
        || {},
    );
    state.borrow_mut().tween = Some(fade);
}

/// Run the current loop step, advancing cyclically.
fn run_step(state: &Rc<RefCell<State>>) {
    let step = {
        let s = state.borrow();
        if s.unmounted || !s.running {
            return;
        }
        let steps = loop_steps(s.cfg.bounce_px);
        steps[s.step % steps.len()]
    };

    let weak: Weak<RefCell<State>> = Rc::downgrade(state);
    let advance = move || {
        let Some(state) = weak.upgrade() else { return };
        {
            let mut s = state.borrow_mut();
            if s.unmounted || !s.running {
                return;
            }
            s.step += 1;
        }
        run_step(&state);
    };

    match step {
        LoopStep::Rest(duration) => {
            let scheduler = state.borrow().resources.scheduler.clone();
            let id = scheduler.schedule(duration, advance);
            state.borrow_mut().step_timer = Some(id);
        }
        LoopStep::Move {
            opacity,
            offset,
            duration,
            ease,
        } => {
            let (scheduler, from_op, from_off) = {
                let s = state.borrow();
                (s.resources.scheduler.clone(), s.opacity, s.offset)
            };
            let weak = Rc::downgrade(state);
            // Remapping the unit scalar loses endpoint exactness, so the
            // completion snaps to the segment targets before advancing.
            let on_done = {
                let weak = weak.clone();
                move || {
                    if let Some(state) = weak.upgrade() {
                        let mut s = state.borrow_mut();
                        if s.running {
                            s.opacity = opacity;
                            s.offset = offset;
                        }
                    }
                    advance();
                }
            };
            let tween = animate(
                &scheduler,
                0.0,
                1.0,
                duration,
                ease,
                move |t| {
                    if let Some(state) = weak.upgrade() {
                        let mut s = state.borrow_mut();
                        if !s.running {
                            return;
                        }
                        s.opacity = from_op + (opacity - from_op) * t;
                        s.offset = from_off + (offset - from_off) * t;
                    }
                },
                on_done,
            );
            state.borrow_mut().tween = Some(tween);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/cue.rs"]
mod tests;
