pub mod clock;
pub mod ease;
pub mod scheduler;
pub mod tween;
