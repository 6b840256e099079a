use super::*;

fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((x0, y0));
    path.line_to((x1, y1));
    path
}

#[test]
fn recording_surface_tracks_current_frame() {
    let mut surface = RecordingInkSurface::new();
    surface.configure(100.0, 50.0, 2.0).unwrap();
    surface.clear();
    surface.stroke_path(&line(0.0, 0.0, 10.0, 10.0), Color::BLACK, 2.0);
    surface.present().unwrap();
    assert_eq!(surface.current_strokes().len(), 1);
    match &surface.ops()[1] {
        InkOp::Stroke { points, width, .. } => {
            assert_eq!(points, &[Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
            assert_eq!(*width, 2.0);
        }
        other => panic!("unexpected op {other:?}"),
    }

    surface.clear();
    surface.present().unwrap();
    assert!(surface.current_strokes().is_empty());
    assert_eq!(surface.clear_count(), 2);
    assert_eq!(surface.configure_count(), 1);
}

#[test]
fn recording_surface_keeps_only_the_current_frame() {
    let mut surface = RecordingInkSurface::new();
    surface.configure(100.0, 50.0, 1.0).unwrap();
    for _ in 0..1000 {
        surface.clear();
        surface.stroke_path(&line(0.0, 0.0, 5.0, 5.0), Color::BLACK, 1.0);
        surface.present().unwrap();
    }
    assert_eq!(surface.ops().len(), 3);
    assert_eq!(surface.ops()[0], InkOp::Clear);
    assert_eq!(surface.clear_count(), 1000);
    assert_eq!(
        surface.last_configure(),
        Some(&InkOp::Configure {
            width: 100.0,
            height: 50.0,
            density: 1.0
        })
    );

    surface.reset();
    assert!(surface.ops().is_empty());
    assert_eq!(surface.clear_count(), 0);
    assert_eq!(surface.last_configure(), None);
}

#[test]
fn cpu_surface_sizes_backing_store_by_density() {
    let mut surface = CpuInkSurface::new();
    surface.configure(40.5, 20.0, 2.0).unwrap();
    assert_eq!(surface.size(), (81, 40));
    assert_eq!(surface.rgba8_premul().len(), 81 * 40 * 4);

    assert!(surface.configure(10.0, 10.0, 0.0).unwrap_err().is_validation());
    assert!(surface.configure(1e6, 10.0, 1.0).unwrap_err().is_validation());
}

#[test]
fn cpu_surface_rasterizes_in_device_pixels() {
    let mut surface = CpuInkSurface::new();
    surface.configure(20.0, 20.0, 2.0).unwrap();
    surface.clear();
    // Logical y=10 maps to device y=20; a 4px logical stroke covers device rows 16..24.
    surface.stroke_path(&line(2.0, 10.0, 18.0, 10.0), Color::rgba(1.0, 0.0, 0.0, 1.0), 4.0);
    surface.present().unwrap();

    let inside = surface.pixel(20, 20).unwrap();
    assert_eq!(inside[3], 255);
    assert!(inside[0] > 200);
    assert_eq!(surface.pixel(20, 2).unwrap(), [0, 0, 0, 0]);
    assert_eq!(surface.pixel(40, 0), None);

    // Reconfiguring with the same density must not compound the scale.
    surface.configure(20.0, 20.0, 2.0).unwrap();
    surface.stroke_path(&line(2.0, 10.0, 18.0, 10.0), Color::BLACK, 4.0);
    surface.present().unwrap();
    assert_eq!(surface.pixel(20, 20).unwrap()[3], 255);
    assert_eq!(surface.pixel(20, 38).unwrap(), [0, 0, 0, 0]);
}

#[test]
fn cleared_surface_presents_transparent() {
    let mut surface = CpuInkSurface::new();
    surface.configure(10.0, 10.0, 1.0).unwrap();
    surface.stroke_path(&line(0.0, 5.0, 10.0, 5.0), Color::BLACK, 4.0);
    surface.present().unwrap();
    assert_eq!(surface.pixel(5, 5).unwrap()[3], 255);

    surface.clear();
    surface.present().unwrap();
    assert!(surface.rgba8_premul().iter().all(|&b| b == 0));
}

#[test]
fn unpremultiply_restores_straight_alpha() {
    assert_eq!(unpremultiply(&[64, 0, 0, 128, 0, 0, 0, 0]), vec![128, 0, 0, 128, 0, 0, 0, 0]);
}
