use std::time::Duration;

/// Nominal frame period for per-frame callbacks (~60 updates/sec).
pub const FRAME: Duration = Duration::from_millis(16);

/// Virtual time in whole milliseconds since scene start.
///
/// All scheduling in the crate is expressed against this clock; nothing reads
/// wall time, so tests drive choreography by advancing a [`Scheduler`]
/// deterministically.
///
/// [`Scheduler`]: crate::timing::scheduler::Scheduler
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    pub fn from_duration(d: Duration) -> Self {
        Tick(d.as_millis() as u64)
    }

    pub fn after(self, d: Duration) -> Self {
        Tick(self.0.saturating_add(d.as_millis() as u64))
    }

    /// Elapsed duration since `earlier`, zero if `earlier` is in the future.
    pub fn since(self, earlier: Tick) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}
