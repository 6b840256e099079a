use super::*;

#[test]
fn rect_scales_each_axis_independently() {
    let vp = Viewport::new(800.0, 1000.0, 1.0).unwrap();
    let r = rect_to_absolute(&NormRect::new(0.1, 0.2, 0.5, 0.05), &vp);
    assert_eq!(
        r,
        PixelRect {
            left: 80.0,
            top: 200.0,
            width: 400.0,
            height: 50.0,
        }
    );
}

#[test]
fn point_scales_each_axis_independently() {
    let vp = Viewport::new(200.0, 100.0, 2.0).unwrap();
    let p = point_to_absolute(NormPoint { x: 0.5, y: 0.25 }, &vp);
    assert_eq!(p, Point::new(100.0, 25.0));
}

#[test]
fn empty_viewport_collapses_to_origin() {
    let vp = Viewport::empty(1.0);
    let r = rect_to_absolute(&NormRect::new(0.3, 0.3, 0.3, 0.3), &vp);
    assert_eq!(r, PixelRect::default());
}
