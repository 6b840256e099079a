use super::*;

#[test]
fn viewport_rejects_bad_dimensions() {
    assert!(Viewport::new(100.0, 50.0, 1.5).is_ok());
    assert!(Viewport::new(-1.0, 50.0, 1.0).is_err());
    assert!(Viewport::new(f64::NAN, 50.0, 1.0).is_err());
    assert!(Viewport::new(10.0, 10.0, 0.0).is_err());
    assert!(Viewport::new(10.0, 10.0, f64::INFINITY).is_err());
}

#[test]
fn device_size_floors_scaled_dimensions() {
    let vp = Viewport::new(100.5, 50.25, 1.0).unwrap();
    assert_eq!(vp.device_size(1.0), (100, 50));
    assert_eq!(vp.device_size(2.0), (201, 100));
    assert!(Viewport::empty(1.0).is_empty());
}

#[test]
fn norm_rect_missing_size_is_zero() {
    let r: NormRect = serde_json::from_value(serde_json::json!({"x": 0.1, "y": 0.2})).unwrap();
    assert_eq!(r, NormRect::new(0.1, 0.2, 0.0, 0.0));
}

#[test]
fn norm_rect_validation() {
    assert!(NormRect::new(0.1, 0.1, 0.5, 0.1).validate("quad").is_ok());
    assert!(NormRect::new(0.1, 0.1, -0.5, 0.1).validate("quad").is_err());
    assert!(NormRect::new(f64::NAN, 0.1, 0.5, 0.1).validate("quad").is_err());
}

#[test]
fn scaled_from_left_keeps_anchor() {
    let r = PixelRect {
        left: 10.0,
        top: 5.0,
        width: 40.0,
        height: 8.0,
    };
    let s = r.scaled_from_left(0.25);
    assert_eq!(s.left, 10.0);
    assert_eq!(s.width, 10.0);
    assert_eq!(s.to_kurbo(), kurbo::Rect::new(10.0, 5.0, 20.0, 13.0));
}
