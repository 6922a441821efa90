use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::timing::clock::Tick;
use crate::timing::scheduler::Scheduler;

/// 1-based stage number (a stage is a video source plus its scene of text).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stage(pub u8);

/// Named, payload-less broadcast notice, the wire protocol between
/// components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notice {
    StageEntering(Stage),
    StageLeaving(Stage),
    MaskCleared,
    ContentReady,
}

impl Notice {
    /// Wire name, e.g. `stage1-entering` or `mask-cleared`.
    pub fn name(&self) -> String {
        match self {
            Self::StageEntering(Stage(n)) => format!("stage{n}-entering"),
            Self::StageLeaving(Stage(n)) => format!("stage{n}-leaving"),
            Self::MaskCleared => "mask-cleared".to_owned(),
            Self::ContentReady => "content-ready".to_owned(),
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut()>>;

struct SubEntry {
    id: u64,
    notice: Notice,
    handler: Handler,
}

struct Inner {
    scheduler: Scheduler,
    subs: Vec<SubEntry>,
    next_id: u64,
    stage_active: HashMap<Stage, bool>,
    mask_cleared: bool,
    content_ready: bool,
    last_seen: HashMap<Notice, Tick>,
}

/// Process-wide publish/subscribe channel for cross-component coordination.
///
/// Delivery is in-process, synchronous, and ordered by subscription time. The
/// bus never deduplicates: publishing the same notice twice delivers twice,
/// and consumers are required to be idempotent to repeats.
///
/// The bus also retains the *current* state of each topic
/// ([`NotificationBus::stage_active`] and friends), so a component that
/// mounts after a notice was published can query instead of waiting for a
/// re-broadcast.
#[derive(Clone)]
pub struct NotificationBus {
    inner: Rc<RefCell<Inner>>,
}

impl NotificationBus {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                scheduler,
                subs: Vec::new(),
                next_id: 0,
                stage_active: HashMap::new(),
                mask_cleared: false,
                content_ready: false,
                last_seen: HashMap::new(),
            })),
        }
    }

    /// Deliver `notice` synchronously to all current subscribers, in
    /// subscription order, and update the retained topic state.
    ///
    /// Handlers that subscribe during delivery do not observe this delivery;
    /// handlers that unsubscribe during delivery are skipped.
    pub fn publish(&self, notice: Notice) {
        tracing::debug!(notice = %notice.name(), "publish");
        let handlers: Vec<(u64, Handler)> = {
            let mut inner = self.inner.borrow_mut();
            let now = inner.scheduler.now();
            match notice {
                Notice::StageEntering(stage) => {
                    inner.stage_active.insert(stage, true);
                }
                Notice::StageLeaving(stage) => {
                    inner.stage_active.insert(stage, false);
                }
                Notice::MaskCleared => inner.mask_cleared = true,
                Notice::ContentReady => inner.content_ready = true,
            }
            inner.last_seen.insert(notice, now);
            inner
                .subs
                .iter()
                .filter(|s| s.notice == notice)
                .map(|s| (s.id, Rc::clone(&s.handler)))
                .collect()
        };
        for (id, handler) in handlers {
            let still_subscribed = self.inner.borrow().subs.iter().any(|s| s.id == id);
            if still_subscribed {
                (handler.borrow_mut())();
            }
        }
    }

    /// Subscribe to one notice. Dropping the returned [`Subscription`]
    /// unsubscribes.
    #[must_use = "dropping the subscription unsubscribes"]
    pub fn subscribe(&self, notice: Notice, handler: impl FnMut() + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subs.push(SubEntry {
            id,
            notice,
            handler: Rc::new(RefCell::new(handler)),
        });
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Retained state: is `stage` currently the active stage?
    pub fn stage_active(&self, stage: Stage) -> bool {
        *self
            .inner
            .borrow()
            .stage_active
            .get(&stage)
            .unwrap_or(&false)
    }

    /// Retained state: has the initial video mask ever cleared?
    pub fn mask_cleared(&self) -> bool {
        self.inner.borrow().mask_cleared
    }

    /// Retained state: has any content announced readiness?
    pub fn content_ready(&self) -> bool {
        self.inner.borrow().content_ready
    }

    /// Tick of the most recent publish of `notice`, if any.
    pub fn last_seen(&self, notice: Notice) -> Option<Tick> {
        self.inner.borrow().last_seen.get(&notice).copied()
    }
}

/// Subscription guard; unsubscribes on drop.
pub struct Subscription {
    bus: Weak<RefCell<Inner>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.borrow_mut().subs.retain(|s| s.id != self.id);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/notify/bus.rs"]
mod tests;
