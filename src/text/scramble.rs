//! Per-character reveal/obscure animation for static headline text.
//!
//! Each character owns its own restartable timeline; the engine only
//! coordinates when timelines (re)start, driven by video-stage notices. The
//! character set stays fixed-width (see [`crate::text::layout`]) so noise
//! glyphs never reflow the line.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use kurbo::Point;

use crate::foundation::error::{StageError, StageResult};
use crate::foundation::device::Viewport;
use crate::foundation::rng::Rng64;
use crate::notify::bus::{Notice, NotificationBus, Stage, Subscription};
use crate::resources::StageResources;
use crate::text::layout::{GlyphMetrics, layout_cells};
use crate::timing::clock::Tick;
use crate::timing::ease::Ease;
use crate::timing::scheduler::{Scheduler, TimerId};
use crate::timing::tween::{Tween, animate};

/// Timed steps per reveal timeline (noise steps plus the final reveal).
const TIMELINE_STEPS: u32 = 10;
/// Fraction of the configured duration spent scrambling before the reveal.
const SCRAMBLE_SHARE: f64 = 0.8;
/// Continuous re-scramble cadence (initial load and fade-out).
const FAST_INTERVAL: Duration = Duration::from_millis(80);
/// Per-tick probability that the fast interval touches a given cell.
const FAST_TOUCH_P: f64 = 0.5;
/// Settle delay between `mask-cleared` and the first reveal.
const MASK_SETTLE: Duration = Duration::from_millis(450);
/// Delay after the initial reveal before the noise loop starts.
const NOISE_AFTER_MASK: Duration = Duration::from_millis(1500);
/// Delay after a non-initial reveal before the noise loop starts.
const NOISE_AFTER_FADE_IN: Duration = Duration::from_millis(500);
/// Noise loop period.
const NOISE_PERIOD: Duration = Duration::from_secs(8);
const NOISE_CELLS_MIN: u64 = 2;
const NOISE_CELLS_MAX: u64 = 12;
/// Steps in one noise mini-cycle; the last restores the original glyph.
const NOISE_STEPS: u32 = 4;
const NOISE_CYCLE: Duration = Duration::from_millis(800);
/// DOM-settle delay before the non-initial fade-in starts.
const FADE_IN_SETTLE: Duration = Duration::from_millis(100);
const FADE_IN: Duration = Duration::from_millis(300);
const FADE_OUT: Duration = Duration::from_secs(1);
/// Pointer events are rate-limited to 10/sec.
const POINTER_THROTTLE: Duration = Duration::from_millis(100);
/// Pointer reveals are suppressed briefly after a full reveal.
const POINTER_COOLDOWN: Duration = Duration::from_secs(1);
/// A pointer this close to viewport center (per axis) is treated as a
/// synthetic trigger and reveals everything.
const CENTER_EPSILON: f64 = 20.0;

#[derive(Clone, Debug)]
pub struct ScrambleConfig {
    /// Pointer reveal radius, px.
    pub radius: f64,
    /// Full per-cell timeline duration, seconds.
    pub duration_secs: f64,
    /// Stagger factor, seconds.
    pub speed: f64,
    /// Noise glyphs substituted while scrambling.
    pub alphabet: Vec<char>,
    pub seed: u64,
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        Self {
            radius: 30.0,
            duration_secs: 1.2,
            speed: 0.5,
            alphabet: vec![':', '.'],
            seed: 0x5C4A_11B1,
        }
    }
}

impl ScrambleConfig {
    fn validate(&self) -> StageResult<()> {
        if self.alphabet.is_empty() {
            return Err(StageError::validation("scramble alphabet must be non-empty"));
        }
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(StageError::validation("scramble duration must be > 0"));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(StageError::validation("scramble radius must be > 0"));
        }
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(StageError::validation("scramble speed must be >= 0"));
        }
        Ok(())
    }
}

/// Per-cell timeline state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    Idle,
    Scrambling,
    Revealing,
    Revealed,
}

struct Cell {
    original: char,
    displayed: char,
    state: CellState,
    center: Point,
    #[allow(dead_code)]
    width: f64,
    word: usize,
    timer: Option<TimerId>,
    step: u32,
}

struct State {
    cfg: ScrambleConfig,
    cells: Vec<Cell>,
    opacity: f64,
    visible: bool,
    initial_load: bool,
    mask_handled: bool,
    played_initial: bool,
    last_reveal_all: Option<Tick>,
    last_pointer: Option<Tick>,
    fast_interval: Option<TimerId>,
    noise_loop: Option<TimerId>,
    noise_timers: Vec<TimerId>,
    aux_timers: Vec<TimerId>,
    fade: Option<Tween>,
    rng: Rng64,
    scheduler: Scheduler,
    bus: NotificationBus,
    viewport: Viewport,
    unmounted: bool,
}

impl State {
    fn noise_char(&mut self) -> char {
        *self.rng.pick(&self.cfg.alphabet)
    }

    fn step_duration(&self) -> Duration {
        Duration::from_secs_f64(
            self.cfg.duration_secs * SCRAMBLE_SHARE / f64::from(TIMELINE_STEPS),
        )
    }

    fn cancel_cell_timer(&mut self, idx: usize) {
        if let Some(id) = self.cells[idx].timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn scramble_all(&mut self) {
        for idx in 0..self.cells.len() {
            self.cancel_cell_timer(idx);
            let ch = self.noise_char();
            let cell = &mut self.cells[idx];
            cell.displayed = ch;
            cell.state = CellState::Scrambling;
        }
    }

    fn stop_fast_interval(&mut self) {
        if let Some(id) = self.fast_interval.take() {
            self.scheduler.cancel(id);
        }
    }

    fn stop_noise_loop(&mut self) {
        if let Some(id) = self.noise_loop.take() {
            self.scheduler.cancel(id);
        }
        for id in self.noise_timers.drain(..) {
            self.scheduler.cancel(id);
        }
    }

    fn cancel_fade(&mut self) {
        if let Some(fade) = self.fade.take() {
            fade.cancel();
        }
    }
}

/// Scramble text engine instance. Unmounts (cancelling every timer it
/// registered) on drop.
pub struct ScrambleText {
    state: Rc<RefCell<State>>,
    _subs: Vec<Subscription>,
}

impl ScrambleText {
    /// Build the character cells for `text`, start the initial scrambling
    /// interval, announce `content-ready`, and subscribe to stage-1
    /// lifecycle notices.
    pub fn mount(
        resources: &StageResources,
        text: &str,
        metrics: &dyn GlyphMetrics,
        origin: Point,
        cfg: ScrambleConfig,
    ) -> StageResult<Self> {
        cfg.validate()?;

        let mut rng = Rng64::new(cfg.seed);
        let cells = layout_cells(text, metrics, origin)
            .into_iter()
            .map(|slot| Cell {
                original: slot.ch,
                displayed: *rng.pick(&cfg.alphabet),
                state: CellState::Scrambling,
                center: slot.center,
                width: slot.width,
                word: slot.word,
                timer: None,
                step: 0,
            })
            .collect::<Vec<_>>();

        tracing::debug!(cells = cells.len(), "scramble text mounted");

        let state = Rc::new(RefCell::new(State {
            cfg,
            cells,
            opacity: 1.0,
            visible: true,
            initial_load: true,
            mask_handled: false,
            played_initial: false,
            last_reveal_all: None,
            last_pointer: None,
            fast_interval: None,
            noise_loop: None,
            noise_timers: Vec::new(),
            aux_timers: Vec::new(),
            fade: None,
            rng,
            scheduler: resources.scheduler.clone(),
            bus: resources.bus.clone(),
            viewport: resources.viewport,
            unmounted: false,
        }));

        start_fast_interval(&state);

        let subs = vec![
            subscribe(resources, &state, Notice::StageEntering(Stage(1)), on_stage1_entering),
            subscribe(resources, &state, Notice::StageLeaving(Stage(1)), on_stage1_leaving),
            subscribe(resources, &state, Notice::MaskCleared, on_mask_cleared),
        ];

        resources.bus.publish(Notice::ContentReady);

        // Late mount: the initial mask may already be gone; the retained
        // topic state stands in for a repeat broadcast.
        if resources.bus.mask_cleared() {
            on_mask_cleared(&state);
        }

        Ok(Self { state, _subs: subs })
    }

    /// Pointer-driven localized reveal (throttled; see module docs).
    pub fn pointer_moved(&self, x: f64, y: f64) {
        let within = {
            let mut s = self.state.borrow_mut();
            if s.unmounted {
                tracing::debug!("pointer ignored: scramble target unmounted");
                return;
            }
            let now = s.scheduler.now();
            if let Some(last) = s.last_pointer
                && now.since(last) < POINTER_THROTTLE
            {
                return;
            }
            s.last_pointer = Some(now);
            if s.initial_load || s.fast_interval.is_some() {
                return;
            }
            if let Some(done) = s.last_reveal_all
                && now.since(done) < POINTER_COOLDOWN
            {
                return;
            }

            let center = s.viewport.center();
            if (x - center.x).abs() < CENTER_EPSILON && (y - center.y).abs() < CENTER_EPSILON {
                None
            } else {
                let point = Point::new(x, y);
                let (radius, speed) = (s.cfg.radius, s.cfg.speed);
                Some(
                    s.cells
                        .iter()
                        .enumerate()
                        .filter_map(|(i, c)| {
                            let d = c.center.distance(point);
                            (d <= radius).then(|| {
                                (i, Duration::from_secs_f64((d / radius).min(1.0) * speed))
                            })
                        })
                        .collect::<Vec<_>>(),
                )
            }
        };

        match within {
            // Programmatic dispatch at the default (center) coordinate.
            None => reveal_all(&self.state),
            Some(targets) => {
                for (idx, delay) in targets {
                    restart_cell(&self.state, idx, delay);
                }
            }
        }
    }

    /// Run the full left-to-right wave reveal.
    pub fn reveal_all(&self) {
        reveal_all(&self.state);
    }

    /// Displayed string, with single spaces at word boundaries.
    pub fn displayed(&self) -> String {
        let s = self.state.borrow();
        let mut out = String::new();
        let mut word = 0;
        for cell in &s.cells {
            if cell.word != word {
                out.push(' ');
                word = cell.word;
            }
            out.push(cell.displayed);
        }
        out
    }

    pub fn cell_states(&self) -> Vec<CellState> {
        self.state.borrow().cells.iter().map(|c| c.state).collect()
    }

    pub fn opacity(&self) -> f64 {
        self.state.borrow().opacity
    }

    pub fn visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn is_initial_load(&self) -> bool {
        self.state.borrow().initial_load
    }

    /// Cancel every timer, interval, and fade this instance registered.
    pub fn unmount(&mut self) {
        let mut s = self.state.borrow_mut();
        if s.unmounted {
            return;
        }
        s.unmounted = true;
        s.visible = false;
        s.stop_fast_interval();
        s.stop_noise_loop();
        s.cancel_fade();
        for idx in 0..s.cells.len() {
            s.cancel_cell_timer(idx);
        }
        let s = &mut *s;
        for id in s.aux_timers.drain(..) {
            s.scheduler.cancel(id);
        }
        self._subs.clear();
        tracing::debug!("scramble text unmounted");
    }
}

impl Drop for ScrambleText {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn subscribe(
    resources: &StageResources,
    state: &Rc<RefCell<State>>,
    notice: Notice,
    handler: fn(&Rc<RefCell<State>>),
) -> Subscription {
    let weak = Rc::downgrade(state);
    resources.bus.subscribe(notice, move || {
        if let Some(state) = weak.upgrade() {
            handler(&state);
        }
    })
}

/// The one-time transition out of perpetual initial scrambling. Duplicate
/// deliveries are absorbed by the `mask_handled` latch.
fn on_mask_cleared(state: &Rc<RefCell<State>>) {
    {
        let mut s = state.borrow_mut();
        if s.unmounted || s.mask_handled {
            return;
        }
        s.mask_handled = true;
    }
    tracing::debug!("mask cleared; scheduling initial reveal");

    let weak = Rc::downgrade(state);
    let scheduler = state.borrow().scheduler.clone();
    let id = scheduler.clone().schedule(MASK_SETTLE, move || {
        let Some(state) = weak.upgrade() else { return };
        reveal_all(&state);
        let noise_delay = {
            let mut s = state.borrow_mut();
            s.initial_load = false;
            NOISE_AFTER_MASK
        };
        let weak = Rc::downgrade(&state);
        let (scheduler, bus) = {
            let s = state.borrow();
            (s.scheduler.clone(), s.bus.clone())
        };
        let id = scheduler.schedule(noise_delay, move || {
            let Some(state) = weak.upgrade() else { return };
            if bus.stage_active(Stage(1)) {
                start_noise_loop(&state);
            }
        });
        state.borrow_mut().aux_timers.push(id);
    });
    state.borrow_mut().aux_timers.push(id);
}

/// Non-initial fade-in: re-scramble, fade the container back, reveal, then
/// resume background noise.
fn on_stage1_entering(state: &Rc<RefCell<State>>) {
    {
        let mut s = state.borrow_mut();
        if s.unmounted || s.initial_load {
            return;
        }
        s.visible = true;
        s.cancel_fade();
        s.scramble_all();
    }

    let weak = Rc::downgrade(state);
    let scheduler = state.borrow().scheduler.clone();
    let id = scheduler.clone().schedule(FADE_IN_SETTLE, move || {
        let Some(state) = weak.upgrade() else { return };
        let weak = Rc::downgrade(&state);
        let apply = {
            let weak = weak.clone();
            move |v: f64| {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().opacity = v;
                }
            }
        };
        let on_done = move || {
            let Some(state) = weak.upgrade() else { return };
            reveal_all(&state);
            let weak = Rc::downgrade(&state);
            let (scheduler, bus) = {
                let s = state.borrow();
                (s.scheduler.clone(), s.bus.clone())
            };
            let id = scheduler.schedule(NOISE_AFTER_FADE_IN, move || {
                let Some(state) = weak.upgrade() else { return };
                if bus.stage_active(Stage(1)) {
                    start_noise_loop(&state);
                }
            });
            state.borrow_mut().aux_timers.push(id);
        };
        let (scheduler, from) = {
            let s = state.borrow();
            (s.scheduler.clone(), s.opacity)
        };
        let fade = animate(&scheduler, from, 1.0, FADE_IN, Ease::InQuad, apply, on_done);
        state.borrow_mut().fade = Some(fade);
    });
    state.borrow_mut().aux_timers.push(id);
}

/// Fade-out: keep scrambling fast while the container fades, then hide with
/// cells left in a scrambled (non-original) state.
fn on_stage1_leaving(state: &Rc<RefCell<State>>) {
    {
        let mut s = state.borrow_mut();
        if s.unmounted || s.initial_load {
            return;
        }
        s.stop_noise_loop();
        s.scramble_all();
        s.cancel_fade();
    }
    start_fast_interval(state);

    let weak = Rc::downgrade(state);
    let apply = {
        let weak = weak.clone();
        move |v: f64| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().opacity = v;
            }
        }
    };
    let on_done = move || {
        let Some(state) = weak.upgrade() else { return };
        let mut s = state.borrow_mut();
        s.stop_fast_interval();
        s.visible = false;
    };
    let (scheduler, from) = {
        let s = state.borrow();
        (s.scheduler.clone(), s.opacity)
    };
    let fade = animate(&scheduler, from, 0.0, FADE_OUT, Ease::OutQuad, apply, on_done);
    state.borrow_mut().fade = Some(fade);
}

fn start_fast_interval(state: &Rc<RefCell<State>>) {
    let weak = Rc::downgrade(state);
    let mut s = state.borrow_mut();
    if s.unmounted {
        return;
    }
    s.stop_fast_interval();
    let id = s.scheduler.every(FAST_INTERVAL, move || {
        let Some(state) = weak.upgrade() else { return };
        let mut s = state.borrow_mut();
        if s.unmounted {
            return;
        }
        for idx in 0..s.cells.len() {
            if s.rng.chance(FAST_TOUCH_P) {
                let ch = s.noise_char();
                let cell = &mut s.cells[idx];
                cell.displayed = ch;
                cell.state = CellState::Scrambling;
            }
        }
    });
    s.fast_interval = Some(id);
}

/// Stagger every cell's timeline into a left-to-right wave.
fn reveal_all(state: &Rc<RefCell<State>>) {
    let (n, speed) = {
        let mut s = state.borrow_mut();
        if s.unmounted {
            tracing::debug!("reveal-all ignored: scramble target unmounted");
            return;
        }
        if s.initial_load && s.played_initial {
            tracing::debug!("duplicate initial reveal-all ignored");
            return;
        }
        if s.initial_load {
            s.played_initial = true;
        }
        s.stop_fast_interval();
        s.opacity = 1.0;
        s.visible = true;
        s.last_reveal_all = Some(s.scheduler.now());
        (s.cells.len(), s.cfg.speed)
    };
    for idx in 0..n {
        let delay = Duration::from_secs_f64((idx as f64 / n as f64) * speed * 1.5);
        restart_cell(state, idx, delay);
    }
}

/// (Re)start one cell's scramble timeline: immediate noise glyph, `delay`,
/// then noise steps ending in a deterministic reveal. Restarting cancels the
/// previous chain, so a timeline always runs as a unit.
fn restart_cell(state: &Rc<RefCell<State>>, idx: usize, delay: Duration) {
    let mut s = state.borrow_mut();
    if s.unmounted || idx >= s.cells.len() {
        return;
    }
    s.cancel_cell_timer(idx);
    let ch = s.noise_char();
    let step_dur = s.step_duration();
    let scheduler = s.scheduler.clone();
    let cell = &mut s.cells[idx];
    cell.displayed = ch;
    cell.state = CellState::Revealing;
    cell.step = 0;

    let weak = Rc::downgrade(state);
    let id = scheduler.clone().schedule(delay, move || {
        let Some(state) = weak.upgrade() else { return };
        let weak = Rc::downgrade(&state);
        let id = scheduler.every(step_dur, move || {
            let Some(state) = weak.upgrade() else { return };
            let mut s = state.borrow_mut();
            if s.unmounted {
                return;
            }
            s.cells[idx].step += 1;
            if s.cells[idx].step < TIMELINE_STEPS {
                let ch = s.noise_char();
                s.cells[idx].displayed = ch;
            } else {
                if let Some(id) = s.cells[idx].timer.take() {
                    s.scheduler.cancel(id);
                }
                let cell = &mut s.cells[idx];
                cell.displayed = cell.original;
                cell.state = CellState::Revealed;
            }
        });
        state.borrow_mut().cells[idx].timer = Some(id);
    });
    s.cells[idx].timer = Some(id);
}

/// Background noise: every [`NOISE_PERIOD`], a handful of random cells run a
/// short scramble-then-restore mini-cycle, independent of the main timelines.
fn start_noise_loop(state: &Rc<RefCell<State>>) {
    let weak = Rc::downgrade(state);
    let mut s = state.borrow_mut();
    if s.unmounted {
        return;
    }
    s.stop_noise_loop();
    let bus = s.bus.clone();
    let id = s.scheduler.every(NOISE_PERIOD, move || {
        let Some(state) = weak.upgrade() else { return };
        noise_tick(&state, &bus);
    });
    s.noise_loop = Some(id);
    tracing::debug!("noise loop started");
}

fn noise_tick(state: &Rc<RefCell<State>>, bus: &NotificationBus) {
    let mut s = state.borrow_mut();
    if s.unmounted || !bus.stage_active(Stage(1)) {
        s.stop_noise_loop();
        return;
    }
    // Previous batch has long finished; drop its ids.
    let s = &mut *s;
    for id in s.noise_timers.drain(..) {
        s.scheduler.cancel(id);
    }
    let n = s.cells.len();
    if n == 0 {
        return;
    }
    let k = s.rng.next_range(NOISE_CELLS_MIN, NOISE_CELLS_MAX) as usize;
    let picked = s.rng.sample_indices(n, k);
    let step_dur = NOISE_CYCLE / NOISE_STEPS;
    for idx in picked {
        let weak = Rc::downgrade(state);
        let mut step = 0u32;
        let timer: Rc<std::cell::Cell<Option<TimerId>>> = Rc::new(std::cell::Cell::new(None));
        let timer_ref = Rc::clone(&timer);
        let id = s.scheduler.every(step_dur, move || {
            let Some(state) = weak.upgrade() else { return };
            let mut s = state.borrow_mut();
            if s.unmounted {
                return;
            }
            step += 1;
            if step < NOISE_STEPS {
                let ch = s.noise_char();
                let cell = &mut s.cells[idx];
                cell.displayed = ch;
                cell.state = CellState::Scrambling;
            } else {
                let cell = &mut s.cells[idx];
                cell.displayed = cell.original;
                cell.state = CellState::Revealed;
                if let Some(id) = timer_ref.take() {
                    s.scheduler.cancel(id);
                    s.noise_timers.retain(|t| *t != id);
                }
            }
        });
        timer.set(Some(id));
        s.noise_timers.push(id);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/scramble.rs"]
mod tests;
