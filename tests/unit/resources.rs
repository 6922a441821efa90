use super::*;

use crate::foundation::device::DeviceClass;

fn profile(class: DeviceClass) -> DeviceProfile {
    let width = match class {
        DeviceClass::Constrained => 400.0,
        DeviceClass::Standard => 1280.0,
    };
    DeviceProfile::classify(
        Viewport::new(width, 800.0).unwrap(),
        &ClassifierConfig::default(),
    )
}

#[test]
fn timing_defaults_match_the_choreography() {
    let t = TimingConfig::default();
    assert_eq!(t.scroll_initial_delay(), Duration::from_secs(5));
    assert_eq!(t.typed_read_delay(), Duration::from_millis(3500));
    assert_eq!(t.morph_mount_delay(), Duration::from_secs(3));
    assert_eq!(t.mask_fade(), Duration::from_millis(700));
}

#[test]
fn mask_hold_depends_on_device_class() {
    let t = TimingConfig::default();
    assert_eq!(t.mask_hold(profile(DeviceClass::Standard)), Duration::from_secs(1));
    assert_eq!(t.mask_hold(profile(DeviceClass::Constrained)), Duration::from_secs(2));
}

#[test]
fn from_json_fills_missing_fields_with_defaults() {
    let t = TimingConfig::from_json(r#"{"scroll_initial_delay_secs": 8.0}"#).unwrap();
    assert_eq!(t.scroll_initial_delay(), Duration::from_secs(8));
    assert_eq!(t.mask_fade_secs, 0.7);
}

#[test]
fn from_json_rejects_malformed_input() {
    assert!(TimingConfig::from_json("not json").is_err());
    assert!(matches!(
        TimingConfig::from_json(r#"{"mask_fade_secs": "soon"}"#),
        Err(crate::foundation::error::StageError::Validation(_))
    ));
}

#[test]
fn negative_durations_clamp_to_zero() {
    let t = TimingConfig {
        scroll_initial_delay_secs: -1.0,
        ..TimingConfig::default()
    };
    assert_eq!(t.scroll_initial_delay(), Duration::ZERO);
}

#[test]
fn resources_classify_the_viewport_once() {
    let resources = StageResources::new(
        Viewport::new(400.0, 800.0).unwrap(),
        ClassifierConfig::default(),
        TimingConfig::default(),
    );
    assert!(resources.device.is_constrained());
    assert_eq!(resources.viewport.width, 400.0);
    // Bus and scheduler share the same virtual clock.
    resources.scheduler.advance(Duration::from_millis(10));
    resources.bus.publish(crate::notify::bus::Notice::ContentReady);
    assert_eq!(
        resources.bus.last_seen(crate::notify::bus::Notice::ContentReady),
        Some(crate::timing::clock::Tick(10))
    );
}
