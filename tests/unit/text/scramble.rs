use super::*;

use crate::foundation::device::ClassifierConfig;
use crate::resources::TimingConfig;
use crate::text::layout::MonospaceMetrics;

fn resources() -> StageResources {
    StageResources::new(
        Viewport::new(1200.0, 800.0).unwrap(),
        ClassifierConfig::default(),
        TimingConfig::default(),
    )
}

fn mount(resources: &StageResources, text: &str) -> ScrambleText {
    let metrics = MonospaceMetrics::new(10.0, 20.0).unwrap();
    ScrambleText::mount(
        resources,
        text,
        &metrics,
        Point::ZERO,
        ScrambleConfig::default(),
    )
    .unwrap()
}

/// Drives the one-time initial reveal to completion.
fn clear_mask_and_settle(resources: &StageResources) {
    resources.bus.publish(Notice::MaskCleared);
    // Settle + max stagger + full per-cell timeline.
    resources.scheduler.advance(Duration::from_secs(3));
}

#[test]
fn config_validation_rejects_bad_input() {
    let r = resources();
    let metrics = MonospaceMetrics::new(10.0, 20.0).unwrap();
    let bad = ScrambleConfig {
        alphabet: Vec::new(),
        ..ScrambleConfig::default()
    };
    assert!(ScrambleText::mount(&r, "AB", &metrics, Point::ZERO, bad).is_err());
    let bad = ScrambleConfig {
        duration_secs: 0.0,
        ..ScrambleConfig::default()
    };
    assert!(ScrambleText::mount(&r, "AB", &metrics, Point::ZERO, bad).is_err());
}

#[test]
fn mount_scrambles_every_cell_and_announces_content() {
    let r = resources();
    let text = mount(&r, "AB");
    assert!(r.bus.content_ready());
    assert!(text.is_initial_load());
    for ch in text.displayed().chars() {
        assert!(ch == ':' || ch == '.', "unexpected glyph {ch:?}");
    }
    assert!(text.cell_states().iter().all(|s| *s == CellState::Scrambling));

    // The fast interval keeps churning glyphs while the mask is up.
    r.scheduler.advance(Duration::from_secs(2));
    for ch in text.displayed().chars() {
        assert!(ch == ':' || ch == '.');
    }
}

#[test]
fn mask_cleared_triggers_the_initial_reveal() {
    let r = resources();
    let text = mount(&r, "AB CD");
    clear_mask_and_settle(&r);

    assert_eq!(text.displayed(), "AB CD");
    assert!(text.cell_states().iter().all(|s| *s == CellState::Revealed));
    assert!(!text.is_initial_load());
    assert_eq!(text.opacity(), 1.0);
}

#[test]
fn duplicate_mask_cleared_is_absorbed() {
    let r = resources();
    let text = mount(&r, "AB");
    r.bus.publish(Notice::MaskCleared);
    r.bus.publish(Notice::MaskCleared);
    r.scheduler.advance(Duration::from_secs(3));
    r.bus.publish(Notice::MaskCleared);
    r.scheduler.advance(Duration::from_secs(3));
    assert_eq!(text.displayed(), "AB");
}

#[test]
fn late_mount_after_mask_cleared_still_reveals() {
    let r = resources();
    r.bus.publish(Notice::MaskCleared);
    let text = mount(&r, "AB");
    r.scheduler.advance(Duration::from_secs(3));
    assert_eq!(text.displayed(), "AB");
}

#[test]
fn stage_leaving_fades_out_and_leaves_cells_scrambled() {
    let r = resources();
    let text = mount(&r, "AB");
    r.bus.publish(Notice::StageEntering(Stage(1)));
    clear_mask_and_settle(&r);

    r.bus.publish(Notice::StageLeaving(Stage(1)));
    // Mid-fade the container is still visible and churning.
    r.scheduler.advance(Duration::from_millis(500));
    assert!(text.visible());
    assert!(text.opacity() < 1.0);

    r.scheduler.advance(Duration::from_millis(600));
    assert!(!text.visible());
    assert_eq!(text.opacity(), 0.0);
    assert_ne!(text.displayed(), "AB");
}

#[test]
fn stage_reentry_fades_in_and_reveals_again() {
    let r = resources();
    let text = mount(&r, "AB");
    r.bus.publish(Notice::StageEntering(Stage(1)));
    clear_mask_and_settle(&r);
    r.bus.publish(Notice::StageLeaving(Stage(1)));
    r.scheduler.advance(Duration::from_secs(2));
    assert!(!text.visible());

    r.bus.publish(Notice::StageEntering(Stage(1)));
    // Settle (100 ms) + fade-in (300 ms), plus a frame of slack since the
    // fade completes on the 16 ms frame grid.
    r.scheduler.advance(Duration::from_millis(416));
    assert!(text.visible());
    assert_eq!(text.opacity(), 1.0);
    // Reveal wave runs after the fade completes.
    r.scheduler.advance(Duration::from_secs(2));
    assert_eq!(text.displayed(), "AB");
}

#[test]
fn stage_entering_during_initial_load_is_ignored() {
    let r = resources();
    let text = mount(&r, "AB");
    r.bus.publish(Notice::StageEntering(Stage(1)));
    r.scheduler.advance(Duration::from_secs(2));
    // Still perpetually scrambling; only mask-cleared starts the reveal.
    assert_ne!(text.displayed(), "AB");
    assert!(text.is_initial_load());
}

#[test]
fn pointer_near_center_reveals_everything() {
    let r = resources();
    let text = mount(&r, "AB CD");
    clear_mask_and_settle(&r);

    // Perturb one cell so a full reveal is observable, then wait out the
    // pointer cooldown.
    r.scheduler.advance(Duration::from_secs(2));
    let center = r.viewport.center();
    text.pointer_moved(center.x + 5.0, center.y - 5.0);
    r.scheduler.advance(Duration::from_secs(3));
    assert_eq!(text.displayed(), "AB CD");
}

#[test]
fn pointer_reveal_is_localized_and_throttled() {
    let r = resources();
    let text = mount(&r, "AB");
    clear_mask_and_settle(&r);
    r.scheduler.advance(Duration::from_secs(2));

    // Cells sit near the origin; radius 30 catches them, center is far away.
    text.pointer_moved(5.0, 10.0);
    let states = text.cell_states();
    assert!(states.contains(&CellState::Revealing));

    // A second event inside the 100 ms throttle window is dropped.
    r.scheduler.advance(Duration::from_millis(50));
    let before = text.cell_states();
    text.pointer_moved(5.0, 10.0);
    assert_eq!(text.cell_states(), before);

    // The restarted timelines settle back to the original text.
    r.scheduler.advance(Duration::from_secs(3));
    assert_eq!(text.displayed(), "AB");
}

#[test]
fn pointer_during_initial_load_is_ignored() {
    let r = resources();
    let text = mount(&r, "AB");
    text.pointer_moved(5.0, 10.0);
    r.scheduler.advance(Duration::from_secs(2));
    assert_ne!(text.displayed(), "AB");
}

#[test]
fn noise_loop_touches_cells_and_restores_them() {
    let r = resources();
    let text = mount(&r, "ABCDEFGH");
    r.bus.publish(Notice::StageEntering(Stage(1)));
    clear_mask_and_settle(&r);
    assert_eq!(text.displayed(), "ABCDEFGH");

    // First noise tick lands 8 s after the loop starts; its mini-cycle ends
    // on the original glyphs.
    r.scheduler.advance(Duration::from_secs(9));
    r.scheduler.advance(Duration::from_secs(1));
    assert_eq!(text.displayed(), "ABCDEFGH");
}

#[test]
fn unmount_cancels_everything() {
    let r = resources();
    let mut text = mount(&r, "AB");
    r.bus.publish(Notice::MaskCleared);
    text.unmount();
    // Timers and notices after unmount are no-ops.
    r.scheduler.advance(Duration::from_secs(5));
    r.bus.publish(Notice::StageEntering(Stage(1)));
    r.bus.publish(Notice::StageLeaving(Stage(1)));
    r.scheduler.advance(Duration::from_secs(5));
    assert!(!text.visible());
}
