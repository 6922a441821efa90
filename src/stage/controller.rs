//! Two-layer video stage with opaque masks and crossfade transitions.
//!
//! The controller is the only mutator of layer mask/visibility state. Other
//! components observe it exclusively through the notification bus. Playback
//! is driven through a pluggable [`StreamingBackend`]; an optional simpler
//! fallback backend takes over sources the primary cannot play.

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::error::{StageError, StageResult};
use crate::notify::bus::{Notice, Stage};
use crate::resources::StageResources;
use crate::stage::backend::{
    PlaybackErrorKind, PlayerEvent, PlayerId, PreloadPriority, StreamingBackend,
};
use crate::timing::ease::Ease;
use crate::timing::scheduler::TimerId;
use crate::timing::tween::{Tween, animate};

/// Identifies one of the two alternating video layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerId {
    A,
    B,
}

impl LayerId {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// How many upcoming sources standard profiles preload ahead of the current
/// stage.
const STANDARD_PRELOAD_AHEAD: usize = 2;

#[derive(Clone, Debug)]
pub struct VideoStageConfig {
    /// Video source per stage; index 0 is stage 1.
    pub sources: Vec<String>,
}

type SharedBackend = Rc<RefCell<dyn StreamingBackend>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BackendChoice {
    Primary,
    Fallback,
}

struct LayerState {
    stage: Option<Stage>,
    source: Option<String>,
    player: Option<PlayerId>,
    backend: BackendChoice,
    mask_opacity: f64,
    loaded: bool,
    playing: bool,
    retried: bool,
    recovered: bool,
    unplayable: bool,
    mask_tween: Option<Tween>,
    hold_timer: Option<TimerId>,
}

impl LayerState {
    fn fresh() -> Self {
        Self {
            stage: None,
            source: None,
            player: None,
            backend: BackendChoice::Primary,
            mask_opacity: 1.0,
            loaded: false,
            playing: false,
            retried: false,
            recovered: false,
            unplayable: false,
            mask_tween: None,
            hold_timer: None,
        }
    }

    /// Force the mask fully opaque and stop any fade or pending hold.
    fn seal_mask(&mut self, resources: &StageResources) {
        if let Some(t) = self.mask_tween.take() {
            t.cancel();
        }
        if let Some(id) = self.hold_timer.take() {
            resources.scheduler.cancel(id);
        }
        self.mask_opacity = 1.0;
    }
}

struct State {
    layers: [LayerState; 2],
    foreground: LayerId,
    mask_cleared_sent: bool,
    cfg: VideoStageConfig,
    resources: StageResources,
    primary: SharedBackend,
    fallback: Option<SharedBackend>,
}

impl State {
    fn backend(&self, choice: BackendChoice) -> Option<SharedBackend> {
        match choice {
            BackendChoice::Primary => Some(Rc::clone(&self.primary)),
            BackendChoice::Fallback => self.fallback.clone(),
        }
    }
}

/// Stage controller instance; destroys its players on drop.
pub struct VideoStage {
    state: Rc<RefCell<State>>,
}

impl VideoStage {
    /// Create the stage and start loading stage 1 into layer A. The preload
    /// policy for the device profile is applied immediately.
    pub fn new(
        resources: &StageResources,
        cfg: VideoStageConfig,
        primary: SharedBackend,
        fallback: Option<SharedBackend>,
    ) -> StageResult<Self> {
        if cfg.sources.is_empty() {
            return Err(StageError::validation("video stage requires at least one source"));
        }
        let state = Rc::new(RefCell::new(State {
            layers: [LayerState::fresh(), LayerState::fresh()],
            foreground: LayerId::A,
            mask_cleared_sent: false,
            cfg,
            resources: resources.clone(),
            primary,
            fallback,
        }));

        load_layer(&state, LayerId::A, Stage(1))?;
        apply_preload_policy(&state, Stage(1));
        Ok(Self { state })
    }

    /// Crossfade the stage to `stage`: the current stage's leaving notice
    /// publishes now, the back layer re-opaques and loads the new source,
    /// and the visual swap waits for confirmed playback.
    pub fn crossfade_to(&self, stage: Stage) -> StageResult<()> {
        let (leaving, back) = {
            let s = self.state.borrow();
            if s.cfg.sources.get(stage.0.saturating_sub(1) as usize).is_none() {
                return Err(StageError::validation(format!("no source for stage {}", stage.0)));
            }
            let fg = &s.layers[s.foreground.index()];
            if fg.stage == Some(stage) {
                tracing::debug!(stage = stage.0, "crossfade to current stage ignored");
                return Ok(());
            }
            (fg.stage, s.foreground.other())
        };
        if let Some(leaving) = leaving {
            let bus = self.state.borrow().resources.bus.clone();
            bus.publish(Notice::StageLeaving(leaving));
        }
        load_layer(&self.state, back, stage)?;
        apply_preload_policy(&self.state, stage);
        Ok(())
    }

    /// First user gesture: constrained profiles re-issue eager preloads,
    /// since autoplay policy may have blocked the initial batch.
    pub fn notify_user_interaction(&self) {
        let (constrained, backend, sources) = {
            let s = self.state.borrow();
            (
                s.resources.device.is_constrained(),
                Rc::clone(&s.primary),
                s.cfg.sources.clone(),
            )
        };
        if !constrained {
            return;
        }
        tracing::debug!("user gesture: re-preloading all sources");
        let mut backend = backend.borrow_mut();
        for source in &sources {
            backend.preload(source, PreloadPriority::Eager);
        }
    }

    pub fn foreground(&self) -> LayerId {
        self.state.borrow().foreground
    }

    pub fn current_stage(&self) -> Option<Stage> {
        let s = self.state.borrow();
        s.layers[s.foreground.index()].stage
    }

    pub fn mask_opacity(&self, layer: LayerId) -> f64 {
        self.state.borrow().layers[layer.index()].mask_opacity
    }

    pub fn is_playing(&self, layer: LayerId) -> bool {
        self.state.borrow().layers[layer.index()].playing
    }

    pub fn is_unplayable(&self, layer: LayerId) -> bool {
        self.state.borrow().layers[layer.index()].unplayable
    }
}

impl Drop for VideoStage {
    fn drop(&mut self) {
        let mut pairs = Vec::new();
        {
            let mut s = self.state.borrow_mut();
            let resources = s.resources.clone();
            for layer in &mut s.layers {
                layer.seal_mask(&resources);
                if let Some(player) = layer.player.take() {
                    pairs.push((layer.backend, player));
                }
            }
        }
        for (choice, player) in pairs {
            if let Some(backend) = self.state.borrow().backend(choice) {
                backend.borrow_mut().destroy(player);
            }
        }
    }
}

/// Issue preload hints relative to `current`: constrained profiles fetch
/// everything eagerly, standard profiles hint the next couple of sources.
fn apply_preload_policy(state: &Rc<RefCell<State>>, current: Stage) {
    let (constrained, backend, sources) = {
        let s = state.borrow();
        (
            s.resources.device.is_constrained(),
            Rc::clone(&s.primary),
            s.cfg.sources.clone(),
        )
    };
    let mut backend = backend.borrow_mut();
    if constrained {
        for source in &sources {
            backend.preload(source, PreloadPriority::Eager);
        }
    } else {
        let next = current.0 as usize; // 0-based index after the current one
        for source in sources.iter().skip(next).take(STANDARD_PRELOAD_AHEAD) {
            backend.preload(source, PreloadPriority::Hint);
        }
    }
}

/// Begin loading `stage` into `layer`. The layer's mask is opaque for the
/// whole load; the fade only starts after confirmed playback.
fn load_layer(state: &Rc<RefCell<State>>, layer: LayerId, stage: Stage) -> StageResult<()> {
    let source = {
        let mut s = state.borrow_mut();
        let Some(source) = s.cfg.sources.get(stage.0.saturating_sub(1) as usize).cloned() else {
            return Err(StageError::validation(format!("no source for stage {}", stage.0)));
        };
        let resources = s.resources.clone();
        let slot = &mut s.layers[layer.index()];
        slot.seal_mask(&resources);
        *slot = LayerState {
            stage: Some(stage),
            source: Some(source.clone()),
            ..LayerState::fresh()
        };
        source
    };
    tracing::debug!(?layer, stage = stage.0, %source, "loading layer");
    attach_layer(state, layer, BackendChoice::Primary)
}

/// Pick the first backend (starting from `preferred`) that supports the
/// layer's source, attach, and install the event listener.
fn attach_layer(
    state: &Rc<RefCell<State>>,
    layer: LayerId,
    preferred: BackendChoice,
) -> StageResult<()> {
    let (source, primary, fallback) = {
        let s = state.borrow();
        let slot = &s.layers[layer.index()];
        let Some(source) = slot.source.clone() else {
            return Err(StageError::missing_target("layer has no source"));
        };
        (source, Rc::clone(&s.primary), s.fallback.clone())
    };

    let mut candidates: Vec<(BackendChoice, SharedBackend)> = Vec::new();
    if preferred == BackendChoice::Primary {
        candidates.push((BackendChoice::Primary, primary));
    }
    if let Some(fb) = fallback {
        candidates.push((BackendChoice::Fallback, fb));
    }

    for (choice, backend) in candidates {
        if !backend.borrow().supports_format(&source) {
            continue;
        }
        // Bind before matching so the borrow is released for set_listener.
        let attached = backend.borrow_mut().attach(&source);
        match attached {
            Ok(player) => {
                {
                    let mut s = state.borrow_mut();
                    let slot = &mut s.layers[layer.index()];
                    slot.player = Some(player);
                    slot.backend = choice;
                }
                let weak = Rc::downgrade(state);
                backend.borrow_mut().set_listener(
                    player,
                    Box::new(move |event| {
                        if let Some(state) = weak.upgrade() {
                            on_player_event(&state, layer, event);
                        }
                    }),
                );
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(?layer, ?choice, %err, "backend attach failed");
            }
        }
    }

    mark_unplayable(state, layer);
    Err(StageError::unrecoverable(format!(
        "no backend could attach source {source:?}"
    )))
}

fn on_player_event(state: &Rc<RefCell<State>>, layer: LayerId, event: PlayerEvent) {
    match event {
        PlayerEvent::ManifestReady => {
            // Data readiness is noted but never starts the mask fade.
            state.borrow_mut().layers[layer.index()].loaded = true;
        }
        PlayerEvent::Playing => on_playing(state, layer),
        PlayerEvent::Error(kind) => on_error(state, layer, kind),
    }
}

/// Confirmed playback: the layer becomes the foreground, the entering
/// notice publishes, and the mask fade is scheduled after the device-class
/// hold.
fn on_playing(state: &Rc<RefCell<State>>, layer: LayerId) {
    let (stage, hold) = {
        let mut s = state.borrow_mut();
        let slot = &mut s.layers[layer.index()];
        if slot.playing || slot.unplayable {
            return;
        }
        slot.playing = true;
        slot.loaded = true;
        let Some(stage) = slot.stage else { return };
        s.foreground = layer;
        let hold = s.resources.timing.mask_hold(s.resources.device);
        (stage, hold)
    };
    tracing::debug!(?layer, stage = stage.0, "playback confirmed");

    let bus = state.borrow().resources.bus.clone();
    bus.publish(Notice::StageEntering(stage));

    let weak = Rc::downgrade(state);
    let scheduler = state.borrow().resources.scheduler.clone();
    let id = scheduler.schedule(hold, move || {
        if let Some(state) = weak.upgrade() {
            begin_mask_fade(&state, layer);
        }
    });
    state.borrow_mut().layers[layer.index()].hold_timer = Some(id);
}

/// Fade the layer's mask to transparent. The very first fade start also
/// publishes the one-shot `mask-cleared` notice.
fn begin_mask_fade(state: &Rc<RefCell<State>>, layer: LayerId) {
    let (scheduler, fade, from, first) = {
        let mut s = state.borrow_mut();
        let first = !s.mask_cleared_sent;
        s.mask_cleared_sent = true;
        let fade = s.resources.timing.mask_fade();
        let scheduler = s.resources.scheduler.clone();
        let slot = &mut s.layers[layer.index()];
        slot.hold_timer = None;
        (scheduler, fade, slot.mask_opacity, first)
    };

    let weak = Rc::downgrade(state);
    let tween = animate(
        &scheduler,
        from,
        0.0,
        fade,
        Ease::OutQuad,
        move |v| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().layers[layer.index()].mask_opacity = v;
            }
        },
        || {},
    );
    state.borrow_mut().layers[layer.index()].mask_tween = Some(tween);

    if first {
        let bus = state.borrow().resources.bus.clone();
        bus.publish(Notice::MaskCleared);
    }
}

/// Error ladder: network errors earn one re-attach, media errors one
/// `recover()`, anything further falls through to the fallback backend or an
/// unplayable layer. A broken layer never disturbs the rest of the scene.
fn on_error(state: &Rc<RefCell<State>>, layer: LayerId, kind: PlaybackErrorKind) {
    let (player, choice, retried, recovered) = {
        let s = state.borrow();
        let slot = &s.layers[layer.index()];
        if slot.unplayable {
            return;
        }
        (slot.player, slot.backend, slot.retried, slot.recovered)
    };
    tracing::warn!(?layer, ?kind, "playback error");

    match kind {
        PlaybackErrorKind::Network if !retried => {
            let mut s = state.borrow_mut();
            let slot = &mut s.layers[layer.index()];
            slot.retried = true;
            slot.playing = false;
            slot.loaded = false;
            drop(s);
            if let (Some(player), Some(backend)) = (player, state.borrow().backend(choice)) {
                backend.borrow_mut().destroy(player);
            }
            if attach_layer(state, layer, choice).is_err() {
                tracing::error!(?layer, "network retry could not re-attach");
            }
        }
        PlaybackErrorKind::Media if !recovered => {
            state.borrow_mut().layers[layer.index()].recovered = true;
            let recover = match (player, state.borrow().backend(choice)) {
                (Some(player), Some(backend)) => backend.borrow_mut().recover(player),
                _ => Err(StageError::missing_target("no player to recover")),
            };
            if let Err(err) = recover {
                tracing::warn!(?layer, %err, "recover failed, escalating");
                escalate(state, layer);
            }
        }
        _ => escalate(state, layer),
    }
}

/// Past the retry/recover budget: destroy the player and move to the
/// fallback backend if one can take the source, else give the layer up.
fn escalate(state: &Rc<RefCell<State>>, layer: LayerId) {
    let (player, choice, source, has_fallback) = {
        let s = state.borrow();
        let slot = &s.layers[layer.index()];
        (slot.player, slot.backend, slot.source.clone(), s.fallback.is_some())
    };
    if let (Some(player), Some(backend)) = (player, state.borrow().backend(choice)) {
        backend.borrow_mut().destroy(player);
    }
    {
        let mut s = state.borrow_mut();
        let slot = &mut s.layers[layer.index()];
        slot.player = None;
        slot.playing = false;
        slot.loaded = false;
    }

    let fallback = state.borrow().fallback.as_ref().map(Rc::clone);
    let can_fall_back = choice == BackendChoice::Primary
        && has_fallback
        && match (&source, &fallback) {
            (Some(src), Some(fb)) => fb.borrow().supports_format(src),
            _ => false,
        };

    if can_fall_back {
        tracing::warn!(?layer, "switching to fallback backend");
        {
            let mut s = state.borrow_mut();
            let slot = &mut s.layers[layer.index()];
            slot.retried = false;
            slot.recovered = false;
        }
        if attach_layer(state, layer, BackendChoice::Fallback).is_err() {
            mark_unplayable(state, layer);
        }
    } else {
        mark_unplayable(state, layer);
    }
}

/// Give the layer up: no player, mask held opaque so nothing broken shows.
fn mark_unplayable(state: &Rc<RefCell<State>>, layer: LayerId) {
    let mut s = state.borrow_mut();
    let resources = s.resources.clone();
    let slot = &mut s.layers[layer.index()];
    slot.seal_mask(&resources);
    slot.player = None;
    slot.playing = false;
    slot.unplayable = true;
    tracing::error!(?layer, "layer marked unplayable");
}

#[cfg(test)]
#[path = "../../tests/unit/stage/controller.rs"]
mod tests;
