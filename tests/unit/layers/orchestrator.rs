use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::annotation::model::AnnotationSet;
use crate::overlay::host::SceneHost;
use crate::overlay::ink::RecordingInkSurface;

fn annotations() -> Vec<Annotation> {
    AnnotationSet::from_json_str(
        r#"[
            {"kind": "highlight", "id": "h1", "page": 1, "start": 0, "end": 10,
             "quads": [{"x": 0.1, "y": 0.1, "w": 0.6, "h": 0.02},
                       {"x": 0.1, "y": 0.13, "w": 0.4, "h": 0.02}]},
            {"kind": "text", "id": "t1", "page": 1, "start": 0, "end": 4,
             "content": "Hello world from text", "rect": {"x": 0.5, "y": 0.5, "w": 0.3, "h": 0.1}},
            {"kind": "ink", "id": "i1", "page": 2, "start": 2, "end": 2,
             "strokes": [{"points": [{"t": 0, "x": 0.1, "y": 0.1}, {"t": 1, "x": 0.2, "y": 0.2}]}]},
            {"kind": "sticker", "id": "s1", "page": 1, "start": 0, "end": 1}
        ]"#,
    )
    .unwrap()
    .as_slice()
    .to_vec()
}

struct Fixture {
    host: Rc<RefCell<SceneHost>>,
    ink: Rc<RefCell<RecordingInkSurface>>,
    orchestrator: LayerOrchestrator,
}

fn fixture() -> Fixture {
    let host = SceneHost::shared();
    let ink = RecordingInkSurface::shared();
    let orchestrator = LayerOrchestrator::new(
        host.clone(),
        ink.clone(),
        Viewport::new(1000.0, 800.0, 1.0).unwrap(),
        1.0,
    )
    .unwrap();
    Fixture {
        host,
        ink,
        orchestrator,
    }
}

#[test]
fn routes_by_page_and_kind() {
    let mut f = fixture();
    let summary = f.orchestrator.set_annotations(&annotations(), 1).unwrap();
    assert_eq!(
        summary,
        RoutingSummary {
            highlights: 1,
            texts: 1,
            inks: 0,
            unknown: 1,
            other_pages: 1,
        }
    );
    assert_eq!(summary.routed(), 2);
    assert_eq!(f.orchestrator.annotation_count(), 2);
    assert_eq!(f.host.borrow().len(), 3);
    assert_eq!(f.orchestrator.page(), Some(1));

    let summary = f.orchestrator.set_annotations(&annotations(), 2).unwrap();
    assert_eq!((summary.inks, summary.routed()), (1, 1));
    assert!(f.host.borrow().is_empty());
}

#[test]
fn timeline_updates_reach_every_layer() {
    let mut f = fixture();
    f.orchestrator.set_annotations(&annotations(), 1).unwrap();
    f.orchestrator.update_timeline(1.5).unwrap();
    assert_eq!(f.orchestrator.text().text_of("t1"), Some("Hello wo"));
    assert_eq!(f.orchestrator.highlight().reveal_of("h1").unwrap()[0], 0.25);
    assert_eq!(f.orchestrator.visible_count(), 2);

    f.orchestrator.update_timeline(-1.0).unwrap();
    assert_eq!(f.orchestrator.visible_count(), 0);
}

#[test]
fn timeline_updates_do_not_rebuild() {
    let mut f = fixture();
    f.orchestrator.set_annotations(&annotations(), 2).unwrap();
    let configures_before = f.ink.borrow().configure_count();
    f.orchestrator.update_timeline(3.0).unwrap();
    let ink = f.ink.borrow();
    assert_eq!(ink.configure_count(), configures_before);
    assert_eq!(ink.current_strokes().len(), 1);
}

#[test]
fn viewport_change_relayouts() {
    let mut f = fixture();
    f.orchestrator.set_annotations(&annotations(), 1).unwrap();
    f.orchestrator
        .set_viewport(Viewport::new(500.0, 400.0, 0.5).unwrap())
        .unwrap();
    let host = f.host.borrow();
    assert_eq!(host.quads().next().unwrap().rect.width, 300.0);
    assert_eq!(host.text_boxes().next().unwrap().font_size_px, 7.0);
}

#[test]
fn load_page_renders_each_layer_once() {
    let mut f = fixture();
    f.ink.borrow_mut().reset();
    f.orchestrator
        .load_page(Viewport::new(600.0, 800.0, 1.0).unwrap(), &annotations(), 2)
        .unwrap();
    assert_eq!(f.ink.borrow().clear_count(), 1);
    assert_eq!(f.orchestrator.drawing().strokes_drawn(), 0);
}

#[test]
fn detached_surfaces_are_rejected_at_construction() {
    let host = SceneHost::shared();
    host.borrow_mut().set_attached(false);
    let err = LayerOrchestrator::new(
        host,
        RecordingInkSurface::shared(),
        Viewport::empty(1.0),
        1.0,
    )
    .unwrap_err();
    assert!(err.is_validation());

    let ink = RecordingInkSurface::shared();
    ink.borrow_mut().set_detached(true);
    assert!(LayerOrchestrator::new(SceneHost::shared(), ink, Viewport::empty(1.0), 1.0).is_err());
    assert!(
        LayerOrchestrator::new(
            SceneHost::shared(),
            RecordingInkSurface::shared(),
            Viewport::empty(1.0),
            f64::NAN
        )
        .is_err()
    );
}

#[test]
fn surface_check_follows_later_detachment() {
    let f = fixture();
    f.orchestrator.check_surfaces().unwrap();

    f.host.borrow_mut().set_attached(false);
    assert!(f.orchestrator.check_surfaces().unwrap_err().is_validation());
    f.host.borrow_mut().set_attached(true);

    f.ink.borrow_mut().set_detached(true);
    assert!(f.orchestrator.check_surfaces().unwrap_err().is_validation());
}

#[test]
fn destroy_is_idempotent_and_final() {
    let mut f = fixture();
    f.orchestrator.set_annotations(&annotations(), 1).unwrap();
    f.orchestrator.destroy();
    f.orchestrator.destroy();
    assert!(f.orchestrator.is_destroyed());
    assert!(f.host.borrow().is_empty());
    assert!(matches!(
        f.orchestrator.update_timeline(1.0),
        Err(OverlayError::Destroyed("update_timeline"))
    ));
    assert!(f.orchestrator.set_annotations(&annotations(), 1).is_err());
}
