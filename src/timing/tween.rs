use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::timing::clock::Tick;
use crate::timing::ease::Ease;
use crate::timing::scheduler::{Scheduler, TimerId};

/// Handle for a running interpolation started by [`animate`].
///
/// Dropping the handle leaves the tween running (fire-and-forget fades are
/// the common case); stopping early is explicit via [`Tween::cancel`], which
/// halts without applying the end value or firing the completion callback.
pub struct Tween {
    scheduler: Scheduler,
    timer: Rc<Cell<Option<TimerId>>>,
    done: Rc<Cell<bool>>,
}

impl Tween {
    pub fn cancel(&self) {
        if let Some(id) = self.timer.take() {
            self.scheduler.cancel(id);
        }
    }

    pub fn is_done(&self) -> bool {
        self.done.get()
    }
}

/// Interpolate a scalar from `from` to `to` over `duration`, applying the
/// eased value once per frame and the exact end value on completion.
///
/// A zero `duration` applies the end value and completes immediately. The
/// caller maps the scalar onto its visual properties inside `apply`; the
/// engines never hand-roll per-frame math outside this primitive.
pub fn animate(
    scheduler: &Scheduler,
    from: f64,
    to: f64,
    duration: Duration,
    ease: Ease,
    mut apply: impl FnMut(f64) + 'static,
    on_complete: impl FnOnce() + 'static,
) -> Tween {
    let done = Rc::new(Cell::new(false));
    if duration.is_zero() {
        apply(to);
        done.set(true);
        on_complete();
        return Tween {
            scheduler: scheduler.clone(),
            timer: Rc::new(Cell::new(None)),
            done,
        };
    }

    let timer: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
    let start: Tick = scheduler.now();
    let total = duration.as_secs_f64();
    let mut on_complete = Some(on_complete);

    let id = {
        let scheduler = scheduler.clone();
        let timer = Rc::clone(&timer);
        let done = Rc::clone(&done);
        scheduler.clone().every_frame(move || {
            let t = (scheduler.now().since(start).as_secs_f64() / total).min(1.0);
            apply(from + (to - from) * ease.apply(t));
            if t >= 1.0 {
                if let Some(id) = timer.take() {
                    scheduler.cancel(id);
                }
                done.set(true);
                if let Some(cb) = on_complete.take() {
                    cb();
                }
            }
        })
    };
    timer.set(Some(id));

    Tween {
        scheduler: scheduler.clone(),
        timer,
        done,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/tween.rs"]
mod tests;
