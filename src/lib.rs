//! Herostage drives a single-page hero scene: a looping/crossfading video
//! backdrop coordinated with layered text effects and a scroll cue.
//!
//! The components never hold references to each other. Coordination happens
//! through two seams:
//!
//! 1. **Notification bus**: a synchronous, in-process publish/subscribe channel
//!    carrying named, payload-less notices (`stage1-entering`, `mask-cleared`,
//!    ...). The bus retains the current state of each topic so a component
//!    that mounts late can query "is stage 1 active?" instead of waiting for a
//!    repeat broadcast.
//! 2. **Scheduler**: a single-threaded virtual-time timer queue. Every delay,
//!    interval, and per-frame callback in the system goes through it, so tests
//!    advance time deterministically and teardown can cancel everything a
//!    component ever registered.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: randomness is seeded, time is virtual, and
//!   delivery order is specified, so a given input schedule replays exactly.
//! - **Idempotent consumers**: notices may be published more than once for the
//!   same logical event; every handler tolerates repeats and tolerates firing
//!   against an already-torn-down target.
#![forbid(unsafe_code)]

mod foundation;
mod notify;
mod scroll;
mod sequence;
mod stage;
mod text;
mod timing;

pub mod resources;

pub use foundation::device::{
    ClassifierConfig, DeviceClass, DeviceProfile, Orientation, Viewport,
};
pub use foundation::error::{StageError, StageResult};
pub use foundation::rng::Rng64;
pub use notify::bus::{Notice, NotificationBus, Stage, Subscription};
pub use resources::{StageResources, TimingConfig};
pub use scroll::cue::{ScrollCue, ScrollCueConfig};
pub use sequence::sequencer::{
    RevealSequencer, SequenceEvent, SequencePhase, SequencerConfig, next_phase,
};
pub use stage::backend::{
    PlaybackErrorKind, PlayerEvent, PlayerId, PreloadPriority, StreamingBackend,
};
pub use stage::controller::{LayerId, VideoStage, VideoStageConfig};
pub use text::layout::{CellSlot, GlyphMetrics, MonospaceMetrics, layout_cells};
pub use text::morph::{MorphConfig, MorphStyle, MorphText, StartGate};
pub use text::scramble::{CellState, ScrambleConfig, ScrambleText};
pub use text::typed::{TypedText, TypedTextConfig};
pub use timing::clock::{FRAME, Tick};
pub use timing::ease::Ease;
pub use timing::scheduler::{Scheduler, TimerId};
pub use timing::tween::{Tween, animate};
