use super::*;

#[test]
fn viewport_rejects_degenerate_dimensions() {
    assert!(Viewport::new(0.0, 800.0).is_err());
    assert!(Viewport::new(1280.0, -1.0).is_err());
    assert!(Viewport::new(f64::NAN, 800.0).is_err());
    assert!(Viewport::new(f64::INFINITY, 800.0).is_err());
    assert!(Viewport::new(1280.0, 800.0).is_ok());
}

#[test]
fn center_is_half_extent() {
    let vp = Viewport::new(1200.0, 800.0).unwrap();
    assert_eq!(vp.center(), kurbo::Point::new(600.0, 400.0));
}

#[test]
fn default_cutoff_classifies_narrow_as_constrained() {
    let cfg = ClassifierConfig::default();
    let narrow = DeviceProfile::classify(Viewport::new(479.0, 800.0).unwrap(), &cfg);
    assert_eq!(narrow.class, DeviceClass::Constrained);
    assert!(narrow.is_constrained());

    let at_cutoff = DeviceProfile::classify(Viewport::new(480.0, 800.0).unwrap(), &cfg);
    assert_eq!(at_cutoff.class, DeviceClass::Standard);
    assert!(!at_cutoff.is_constrained());
}

#[test]
fn cutoff_is_configurable() {
    let cfg = ClassifierConfig {
        constrained_max_width: 800.0,
    };
    let profile = DeviceProfile::classify(Viewport::new(700.0, 900.0).unwrap(), &cfg);
    assert_eq!(profile.class, DeviceClass::Constrained);
}

#[test]
fn orientation_follows_aspect() {
    let cfg = ClassifierConfig::default();
    let landscape = DeviceProfile::classify(Viewport::new(1280.0, 800.0).unwrap(), &cfg);
    assert_eq!(landscape.orientation, Orientation::Landscape);

    let portrait = DeviceProfile::classify(Viewport::new(400.0, 800.0).unwrap(), &cfg);
    assert_eq!(portrait.orientation, Orientation::Portrait);

    // Square counts as portrait.
    let square = DeviceProfile::classify(Viewport::new(800.0, 800.0).unwrap(), &cfg);
    assert_eq!(square.orientation, Orientation::Portrait);
}

#[test]
fn classifier_config_deserializes_with_default() {
    let cfg: ClassifierConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg.constrained_max_width, 480.0);
    let cfg: ClassifierConfig = serde_json::from_str(r#"{"constrained_max_width": 600}"#).unwrap();
    assert_eq!(cfg.constrained_max_width, 600.0);
}
