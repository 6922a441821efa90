use super::*;

use crate::foundation::device::{ClassifierConfig, Viewport};
use crate::resources::TimingConfig;

fn resources() -> StageResources {
    StageResources::new(
        Viewport::new(1200.0, 800.0).unwrap(),
        ClassifierConfig::default(),
        TimingConfig::default(),
    )
}

fn fast_config() -> SequencerConfig {
    SequencerConfig {
        typed_segments: vec!["ab".to_owned(), "cd".to_owned()],
        typed: TypedTextConfig {
            typing: Duration::from_millis(1),
            pause: Duration::from_millis(10),
            delete: Duration::from_millis(1),
            ..TypedTextConfig::default()
        },
        ..SequencerConfig::default()
    }
}

mod transitions {
    use super::*;
    use SequenceEvent as E;
    use SequencePhase as P;

    #[test]
    fn stage_inactive_resets_from_every_phase() {
        for phase in [
            P::Idle,
            P::TypingActive,
            P::FadingTyped,
            P::MorphingBrand,
            P::MorphingTagline,
            P::ContactVisible,
        ] {
            assert_eq!(next_phase(phase, E::StageInactive, true, true), P::Idle);
        }
    }

    #[test]
    fn activation_starts_typing() {
        assert_eq!(next_phase(P::Idle, E::StageActive, false, false), P::TypingActive);
    }

    #[test]
    fn fade_only_moves_out_of_typing() {
        assert_eq!(next_phase(P::TypingActive, E::FadeBegun, false, false), P::FadingTyped);
        assert_eq!(next_phase(P::Idle, E::FadeBegun, false, false), P::Idle);
        assert_eq!(
            next_phase(P::MorphingBrand, E::FadeBegun, false, false),
            P::MorphingBrand
        );
    }

    #[test]
    fn morphs_mount_from_typing_or_fading() {
        assert_eq!(
            next_phase(P::TypingActive, E::MorphsMounted, false, false),
            P::MorphingBrand
        );
        assert_eq!(
            next_phase(P::FadingTyped, E::MorphsMounted, false, false),
            P::MorphingBrand
        );
        assert_eq!(next_phase(P::Idle, E::MorphsMounted, false, false), P::Idle);
    }

    #[test]
    fn contact_requires_both_completions_in_either_order() {
        // Brand first, then tagline.
        assert_eq!(
            next_phase(P::MorphingBrand, E::BrandDone, true, false),
            P::MorphingTagline
        );
        assert_eq!(
            next_phase(P::MorphingTagline, E::TaglineDone, true, true),
            P::ContactVisible
        );
        // Tagline first, then brand.
        assert_eq!(
            next_phase(P::MorphingBrand, E::TaglineDone, false, true),
            P::MorphingBrand
        );
        assert_eq!(
            next_phase(P::MorphingBrand, E::BrandDone, true, true),
            P::ContactVisible
        );
    }

    #[test]
    fn stale_completions_after_reset_are_ignored() {
        assert_eq!(next_phase(P::Idle, E::BrandDone, true, false), P::Idle);
        assert_eq!(next_phase(P::Idle, E::TaglineDone, false, true), P::Idle);
    }
}

#[test]
fn idle_until_stage_three_enters() {
    let r = resources();
    let seq = RevealSequencer::mount(&r, fast_config());
    assert_eq!(seq.phase(), SequencePhase::Idle);
    assert!(seq.typed_displayed().is_none());

    r.bus.publish(Notice::StageEntering(Stage(3)));
    assert_eq!(seq.phase(), SequencePhase::TypingActive);
    assert!(seq.typed_displayed().is_some());
}

#[test]
fn retained_stage_state_activates_a_late_mount() {
    let r = resources();
    r.bus.publish(Notice::StageEntering(Stage(3)));
    let seq = RevealSequencer::mount(&r, fast_config());
    assert_eq!(seq.phase(), SequencePhase::TypingActive);
}

#[test]
fn duplicate_activation_is_a_no_op() {
    let r = resources();
    let seq = RevealSequencer::mount(&r, fast_config());
    r.bus.publish(Notice::StageEntering(Stage(3)));
    r.scheduler.advance(Duration::from_millis(1));
    let shown = seq.typed_displayed();
    r.bus.publish(Notice::StageEntering(Stage(3)));
    assert_eq!(seq.typed_displayed(), shown);
    assert_eq!(seq.phase(), SequencePhase::TypingActive);
}

#[test]
fn full_sequence_reaches_contact() {
    let r = resources();
    let seq = RevealSequencer::mount(&r, fast_config());
    r.bus.publish(Notice::StageEntering(Stage(3)));

    // Typing: 2 + pause 10 + delete 2 + 2 ms, then read/mount delays.
    r.scheduler.advance(Duration::from_millis(100));
    assert_eq!(seq.phase(), SequencePhase::TypingActive);
    assert_eq!(seq.typed_displayed().as_deref(), Some("cd"));

    // Morphs mount 3.0 s after the last segment; fade begins at 3.5 s.
    r.scheduler.advance(Duration::from_secs(3));
    assert_eq!(seq.phase(), SequencePhase::MorphingBrand);
    assert!(seq.brand_fraction().is_some());
    assert!(seq.typed_displayed().is_none());

    r.scheduler.advance(Duration::from_secs(1));
    assert!(seq.typed_opacity() < 1.0);

    // Brand (3 s) finishes before tagline (0.5 s delay + 4 s).
    r.scheduler.advance(Duration::from_secs(3));
    assert_eq!(seq.phase(), SequencePhase::MorphingTagline);
    assert!(!seq.contact_visible());

    r.scheduler.advance(Duration::from_secs(2));
    assert_eq!(seq.phase(), SequencePhase::ContactVisible);
    assert!(seq.contact_visible());
    assert_eq!(seq.typed_opacity(), 0.0);
}

#[test]
fn stage_leaving_resets_mid_flight() {
    let r = resources();
    let seq = RevealSequencer::mount(&r, fast_config());
    r.bus.publish(Notice::StageEntering(Stage(3)));
    r.scheduler.advance(Duration::from_millis(100));
    // Mid-wait between typing and morph mount.
    r.scheduler.advance(Duration::from_secs(1));

    r.bus.publish(Notice::StageLeaving(Stage(3)));
    assert_eq!(seq.phase(), SequencePhase::Idle);
    assert!(seq.typed_displayed().is_none());
    assert!(seq.brand_fraction().is_none());

    // Cancelled timers never mount the morphs.
    r.scheduler.advance(Duration::from_secs(10));
    assert_eq!(seq.phase(), SequencePhase::Idle);
    assert!(seq.brand_fraction().is_none());
}

#[test]
fn duplicate_stage_leaving_is_safe() {
    let r = resources();
    let seq = RevealSequencer::mount(&r, fast_config());
    r.bus.publish(Notice::StageEntering(Stage(3)));
    r.scheduler.advance(Duration::from_secs(20));
    assert!(seq.contact_visible());

    r.bus.publish(Notice::StageLeaving(Stage(3)));
    r.bus.publish(Notice::StageLeaving(Stage(3)));
    assert_eq!(seq.phase(), SequencePhase::Idle);
    assert!(!seq.contact_visible());
}

#[test]
fn sequence_can_rerun_after_a_reset() {
    let r = resources();
    let seq = RevealSequencer::mount(&r, fast_config());
    r.bus.publish(Notice::StageEntering(Stage(3)));
    r.scheduler.advance(Duration::from_secs(20));
    assert!(seq.contact_visible());

    r.bus.publish(Notice::StageLeaving(Stage(3)));
    r.bus.publish(Notice::StageEntering(Stage(3)));
    assert_eq!(seq.phase(), SequencePhase::TypingActive);
    r.scheduler.advance(Duration::from_secs(20));
    assert!(seq.contact_visible());
}
