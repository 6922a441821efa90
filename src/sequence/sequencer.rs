//! Top-level orchestration for the stage-3 scene: typed-text reveal,
//! fade-out, concurrent brand/tagline morphs, then the contact action.
//!
//! The sequencer holds no animation logic. It mounts and unmounts the text
//! engines, observes their completion, and tracks an explicit state machine
//! with a pure transition function so the choreography is testable without
//! timers.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::notify::bus::{Notice, Stage, Subscription};
use crate::resources::StageResources;
use crate::text::morph::{MorphConfig, MorphText, StartGate};
use crate::text::typed::{TypedText, TypedTextConfig};
use crate::timing::ease::Ease;
use crate::timing::scheduler::TimerId;
use crate::timing::tween::{Tween, animate};

/// Fade duration for the typed text once its read delay elapses.
const TYPED_FADE: Duration = Duration::from_millis(1500);
/// Delay before the tagline morph starts, relative to the brand morph.
const TAGLINE_START_DELAY: Duration = Duration::from_millis(500);
/// Tagline morph duration; slower than the brand's default.
const TAGLINE_MORPH_SECS: f64 = 4.0;

/// Externally-visible sequence state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencePhase {
    Idle,
    TypingActive,
    FadingTyped,
    MorphingBrand,
    MorphingTagline,
    ContactVisible,
}

/// Events the transition function reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceEvent {
    StageActive,
    TypedDone,
    FadeBegun,
    MorphsMounted,
    BrandDone,
    TaglineDone,
    StageInactive,
}

/// Pure transition function. `brand_done`/`tagline_done` are the
/// already-latched completion flags *including* the event being applied;
/// contact appears only once both hold, in either arrival order.
pub fn next_phase(
    phase: SequencePhase,
    event: SequenceEvent,
    brand_done: bool,
    tagline_done: bool,
) -> SequencePhase {
    use SequenceEvent as E;
    use SequencePhase as P;
    match event {
        E::StageInactive => P::Idle,
        E::StageActive => P::TypingActive,
        E::TypedDone => phase,
        E::FadeBegun => {
            if phase == P::TypingActive {
                P::FadingTyped
            } else {
                phase
            }
        }
        E::MorphsMounted => {
            if matches!(phase, P::TypingActive | P::FadingTyped) {
                P::MorphingBrand
            } else {
                phase
            }
        }
        E::BrandDone | E::TaglineDone => {
            if phase == P::Idle {
                // Stale callback after a reset.
                phase
            } else if brand_done && tagline_done {
                P::ContactVisible
            } else if brand_done {
                P::MorphingTagline
            } else {
                phase
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SequencerConfig {
    pub typed_segments: Vec<String>,
    pub brand: String,
    pub tagline: String,
    pub typed: TypedTextConfig,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            typed_segments: vec![
                "Alzheimer's\nParkinson's\nCOPD\nIPF\nLiver Fibrosis\nCirrhosis\n\
                 Chronic Kidney Disease\nCerebrovascular & Cardiovascular diseases"
                    .to_owned(),
                "They all share common biological drivers.".to_owned(),
                "A unified solution lies within:\n Modeling and simulating the root causes of disease."
                    .to_owned(),
            ],
            brand: "Aevum Labs".to_owned(),
            tagline: "Redefine Aging".to_owned(),
            typed: TypedTextConfig::default(),
        }
    }
}

struct State {
    phase: SequencePhase,
    typed: Option<TypedText>,
    brand: Option<MorphText>,
    tagline: Option<MorphText>,
    brand_done: bool,
    tagline_done: bool,
    typed_opacity: f64,
    fade: Option<Tween>,
    pending: Vec<TimerId>,
    resources: StageResources,
    cfg: SequencerConfig,
}

impl State {
    fn cancel_pending(&mut self) {
        for id in self.pending.drain(..) {
            self.resources.scheduler.cancel(id);
        }
        if let Some(fade) = self.fade.take() {
            fade.cancel();
        }
    }
}

/// Reveal sequencer instance. Resets to `Idle` (tearing everything down) on
/// `stage3-leaving` and on drop.
pub struct RevealSequencer {
    state: Rc<RefCell<State>>,
    _subs: Vec<Subscription>,
}

impl RevealSequencer {
    pub fn mount(resources: &StageResources, cfg: SequencerConfig) -> Self {
        let state = Rc::new(RefCell::new(State {
            phase: SequencePhase::Idle,
            typed: None,
            brand: None,
            tagline: None,
            brand_done: false,
            tagline_done: false,
            typed_opacity: 1.0,
            fade: None,
            pending: Vec::new(),
            resources: resources.clone(),
            cfg,
        }));

        let subs = vec![
            {
                let weak = Rc::downgrade(&state);
                resources.bus.subscribe(Notice::StageEntering(Stage(3)), move || {
                    if let Some(state) = weak.upgrade() {
                        activate(&state);
                    }
                })
            },
            {
                let weak = Rc::downgrade(&state);
                resources.bus.subscribe(Notice::StageLeaving(Stage(3)), move || {
                    if let Some(state) = weak.upgrade() {
                        reset(&state);
                    }
                })
            },
        ];

        // Late mount while stage 3 is already active: the retained topic
        // state stands in for a repeat broadcast.
        if resources.bus.stage_active(Stage(3)) {
            activate(&state);
        }

        Self { state, _subs: subs }
    }

    pub fn phase(&self) -> SequencePhase {
        self.state.borrow().phase
    }

    pub fn contact_visible(&self) -> bool {
        self.state.borrow().phase == SequencePhase::ContactVisible
    }

    pub fn typed_opacity(&self) -> f64 {
        self.state.borrow().typed_opacity
    }

    pub fn typed_displayed(&self) -> Option<String> {
        self.state.borrow().typed.as_ref().map(TypedText::displayed)
    }

    pub fn brand_fraction(&self) -> Option<f64> {
        self.state.borrow().brand.as_ref().map(MorphText::fraction)
    }

    pub fn tagline_fraction(&self) -> Option<f64> {
        self.state.borrow().tagline.as_ref().map(MorphText::fraction)
    }
}

impl Drop for RevealSequencer {
    fn drop(&mut self) {
        reset(&self.state);
    }
}

/// `stage3-entering`: mount the typed text and reset all downstream flags.
/// Idempotent under duplicate delivery (already-typing activations are
/// no-ops).
fn activate(state: &Rc<RefCell<State>>) {
    if state.borrow().phase != SequencePhase::Idle {
        tracing::debug!("duplicate stage-3 activation ignored");
        return;
    }
    tracing::debug!("sequence activating");

    let typed = {
        let mut s = state.borrow_mut();
        s.cancel_pending();
        s.brand_done = false;
        s.tagline_done = false;
        s.typed_opacity = 1.0;
        s.phase = next_phase(s.phase, SequenceEvent::StageActive, false, false);

        let weak = Rc::downgrade(state);
        let segments = s.cfg.typed_segments.clone();
        let last = segments.len().saturating_sub(1);
        let resources = s.resources.clone();
        let typed_cfg = s.cfg.typed.clone();
        drop(s);
        TypedText::mount(&resources, segments, typed_cfg, move |idx| {
            if idx == last
                && let Some(state) = weak.upgrade()
            {
                on_typed_done(&state);
            }
        })
    };

    match typed {
        Ok(typed) => state.borrow_mut().typed = Some(typed),
        Err(err) => tracing::warn!(%err, "typed text failed to mount"),
    }
}

/// Last segment fully typed: schedule the read-delay fade and the morph
/// mount, both cancellable by a reset.
fn on_typed_done(state: &Rc<RefCell<State>>) {
    let mut s = state.borrow_mut();
    if s.phase != SequencePhase::TypingActive {
        return;
    }
    let scheduler = s.resources.scheduler.clone();
    let read_delay = s.resources.timing.typed_read_delay();
    let mount_delay = s.resources.timing.morph_mount_delay();

    let weak = Rc::downgrade(state);
    let fade_id = scheduler.schedule(read_delay, move || {
        if let Some(state) = weak.upgrade() {
            begin_typed_fade(&state);
        }
    });
    let weak = Rc::downgrade(state);
    let mount_id = scheduler.schedule(mount_delay, move || {
        if let Some(state) = weak.upgrade() {
            mount_morphs(&state);
        }
    });
    s.pending.push(fade_id);
    s.pending.push(mount_id);
}

fn begin_typed_fade(state: &Rc<RefCell<State>>) {
    let mut s = state.borrow_mut();
    if matches!(s.phase, SequencePhase::Idle) {
        return;
    }
    s.phase = next_phase(s.phase, SequenceEvent::FadeBegun, s.brand_done, s.tagline_done);
    let weak = Rc::downgrade(state);
    let scheduler = s.resources.scheduler.clone();
    let from = s.typed_opacity;
    drop(s);
    let fade = animate(
        &scheduler,
        from,
        0.0,
        TYPED_FADE,
        Ease::OutQuad,
        move |v| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().typed_opacity = v;
            }
        },
        || {},
    );
    state.borrow_mut().fade = Some(fade);
}

/// Mount brand and tagline morphs; they run concurrently and complete in
/// either order.
fn mount_morphs(state: &Rc<RefCell<State>>) {
    {
        let s = state.borrow();
        if matches!(s.phase, SequencePhase::Idle) || s.brand.is_some() {
            return;
        }
    }

    let resources = state.borrow().resources.clone();
    let (brand_text, tagline_text) = {
        let s = state.borrow();
        (s.cfg.brand.clone(), s.cfg.tagline.clone())
    };

    let weak = Rc::downgrade(state);
    let brand = MorphText::mount(
        &resources,
        vec![brand_text],
        MorphConfig::default(),
        move || {
            if let Some(state) = weak.upgrade() {
                on_morph_done(&state, MorphSlot::Brand);
            }
        },
    );
    let weak = Rc::downgrade(state);
    let tagline = MorphText::mount(
        &resources,
        vec![tagline_text],
        MorphConfig {
            morph_secs: TAGLINE_MORPH_SECS,
            start: StartGate::AfterDelay(TAGLINE_START_DELAY),
            ..MorphConfig::default()
        },
        move || {
            if let Some(state) = weak.upgrade() {
                on_morph_done(&state, MorphSlot::Tagline);
            }
        },
    );

    let mut s = state.borrow_mut();
    match (brand, tagline) {
        (Ok(brand), Ok(tagline)) => {
            s.brand = Some(brand);
            s.tagline = Some(tagline);
            s.typed = None;
            s.phase = next_phase(s.phase, SequenceEvent::MorphsMounted, s.brand_done, s.tagline_done);
        }
        (brand, tagline) => {
            for err in [brand.err(), tagline.err()].into_iter().flatten() {
                tracing::warn!(%err, "morph text failed to mount");
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum MorphSlot {
    Brand,
    Tagline,
}

fn on_morph_done(state: &Rc<RefCell<State>>, slot: MorphSlot) {
    let mut s = state.borrow_mut();
    if s.phase == SequencePhase::Idle {
        return;
    }
    let event = match slot {
        MorphSlot::Brand => {
            s.brand_done = true;
            SequenceEvent::BrandDone
        }
        MorphSlot::Tagline => {
            s.tagline_done = true;
            SequenceEvent::TaglineDone
        }
    };
    s.phase = next_phase(s.phase, event, s.brand_done, s.tagline_done);
    if s.phase == SequencePhase::ContactVisible {
        tracing::debug!("contact action revealed");
    }
}

/// `stage3-leaving` (from any state, any number of times): unmount
/// everything and return to `Idle`.
fn reset(state: &Rc<RefCell<State>>) {
    let mut s = state.borrow_mut();
    s.cancel_pending();
    s.typed = None;
    s.brand = None;
    s.tagline = None;
    s.brand_done = false;
    s.tagline_done = false;
    s.typed_opacity = 1.0;
    if s.phase != SequencePhase::Idle {
        tracing::debug!("sequence reset to idle");
    }
    s.phase = next_phase(s.phase, SequenceEvent::StageInactive, false, false);
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/sequencer.rs"]
mod tests;
