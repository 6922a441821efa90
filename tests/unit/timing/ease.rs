use super::*;

const ALL: [Ease; 8] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::OutBounce,
];

#[test]
fn endpoints_are_exact() {
    for ease in ALL {
        assert_eq!(ease.apply(0.0), 0.0, "{ease:?} at 0");
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?} at 1");
    }
}

#[test]
fn input_is_clamped() {
    for ease in ALL {
        assert_eq!(ease.apply(-0.5), ease.apply(0.0));
        assert_eq!(ease.apply(1.5), ease.apply(1.0));
    }
}

#[test]
fn in_out_quad_matches_piecewise_form() {
    // 2t^2 below the midpoint, 1 - 2(1-t)^2 above.
    assert!((Ease::InOutQuad.apply(0.25) - 0.125).abs() < 1e-12);
    assert!((Ease::InOutQuad.apply(0.5) - 0.5).abs() < 1e-12);
    assert!((Ease::InOutQuad.apply(0.75) - 0.875).abs() < 1e-12);
}

#[test]
fn quad_pairs_are_reflections() {
    for t in [0.1, 0.3, 0.7, 0.9] {
        let a = Ease::InQuad.apply(t);
        let b = 1.0 - Ease::OutQuad.apply(1.0 - t);
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn curves_are_monotonic() {
    for ease in ALL {
        if matches!(ease, Ease::OutBounce) {
            continue; // bounce overshoots by design
        }
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = ease.apply(f64::from(i) / 100.0);
            assert!(v >= prev, "{ease:?} dipped at {i}");
            prev = v;
        }
    }
}

#[test]
fn out_bounce_stays_within_unit_range() {
    for i in 0..=100 {
        let v = Ease::OutBounce.apply(f64::from(i) / 100.0);
        assert!((0.0..=1.0 + 1e-9).contains(&v));
    }
}
