//! Pluggable streaming backend seam.
//!
//! The stage controller never talks to a concrete player library; it drives
//! everything through [`StreamingBackend`]. One backend per target
//! environment, with an optional simpler fallback for sources the primary
//! cannot recover.

use crate::foundation::error::StageResult;

/// Opaque handle to an attached player instance, assigned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

/// Classified playback failure, reported through the event listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackErrorKind {
    /// Transient transport failure; worth one in-place re-attach.
    Network,
    /// Decoder/media failure; worth one `recover()` attempt.
    Media,
    /// Unrecoverable; the player must be destroyed.
    Fatal,
}

/// Events a backend delivers for an attached player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Source metadata parsed; data may still be buffering. Never treated
    /// as proof of playback.
    ManifestReady,
    /// Frames are actually rendering.
    Playing,
    Error(PlaybackErrorKind),
}

/// How urgently a source should be fetched ahead of need.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreloadPriority {
    /// Fetch now; the source is expected imminently (or autoplay rules
    /// require fetching inside a user gesture).
    Eager,
    /// Hint only; fetch when idle.
    Hint,
}

/// Object-safe adapter over one streaming/player library.
///
/// Listeners are invoked synchronously from whatever context the backend
/// learns of the event; callers must be re-entrancy safe.
pub trait StreamingBackend {
    /// Whether this backend can play the given source (typically judged by
    /// its format extension).
    fn supports_format(&self, source: &str) -> bool;

    /// Create a player for `source` and begin loading.
    fn attach(&mut self, source: &str) -> StageResult<PlayerId>;

    /// Install the event listener for an attached player, replacing any
    /// previous one.
    fn set_listener(&mut self, player: PlayerId, listener: Box<dyn FnMut(PlayerEvent)>);

    /// Attempt in-place recovery after a media error.
    fn recover(&mut self, player: PlayerId) -> StageResult<()>;

    /// Tear down the player and release its resources. Idempotent.
    fn destroy(&mut self, player: PlayerId);

    /// Ask the environment to fetch `source` ahead of need.
    fn preload(&mut self, source: &str, priority: PreloadPriority);
}
