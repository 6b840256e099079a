use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::overlay::host::SceneHost;

const CONTENT: &str = "Hello world from text";

#[test]
fn reveals_whole_words_at_midpoint() {
    assert_eq!(visible_text(CONTENT, 0.0, 4.0, 2.0), "Hello world");
}

#[test]
fn reveals_partial_next_word() {
    assert_eq!(visible_text(CONTENT, 0.0, 4.0, 1.5), "Hello wo");
}

#[test]
fn empty_before_start_and_full_at_end() {
    assert_eq!(visible_text(CONTENT, 1.0, 4.0, 0.5), "");
    assert_eq!(visible_text(CONTENT, 1.0, 4.0, 4.0), CONTENT);
    assert_eq!(visible_text(CONTENT, 1.0, 4.0, 100.0), CONTENT);
    assert_eq!(visible_text("  spaced   out ", 0.0, 1.0, 1.0), "  spaced   out ");
}

#[test]
fn zero_length_window_is_instant() {
    assert_eq!(visible_text(CONTENT, 3.0, 3.0, 2.999), "");
    assert_eq!(visible_text(CONTENT, 3.0, 3.0, 3.0), CONTENT);
}

#[test]
fn reveal_length_never_shrinks_as_time_advances() {
    for content in [CONTENT, "a bb ccc dddd", "single", "", "  x  y  ", "héllo wörld ñ"] {
        let mut last = 0;
        for step in 0..=200 {
            let now = -1.0 + f64::from(step) * 0.05;
            let len = visible_text(content, 0.0, 7.0, now).chars().count();
            assert!(len >= last, "{content:?} shrank at {now}");
            last = len;
        }
        assert_eq!(visible_text(content, 0.0, 7.0, 7.0), content);
    }
}

fn text_annotation() -> TextAnnotation {
    serde_json::from_value(serde_json::json!({
        "id": "t1",
        "page": 1,
        "start": 0.0,
        "end": 4.0,
        "content": CONTENT,
        "rect": {"x": 0.5, "y": 0.25, "w": 0.2, "h": 0.1},
        "font_size": 10.0
    }))
    .unwrap()
}

fn layer() -> (Rc<RefCell<SceneHost>>, TextLayer) {
    let host = SceneHost::shared();
    let mut layer = TextLayer::new(host.clone(), Viewport::new(800.0, 400.0, 2.0).unwrap());
    layer.set_annotations(vec![text_annotation()]).unwrap();
    layer.render().unwrap();
    (host, layer)
}

#[test]
fn text_box_is_laid_out_in_viewport_pixels() {
    let (host, _layer) = layer();
    let host = host.borrow();
    let boxes: Vec<_> = host.text_boxes().collect();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].rect.left, 400.0);
    assert_eq!(boxes[0].rect.top, 100.0);
    assert_eq!(boxes[0].font_size_px, 20.0);
    assert!(boxes[0].visible);
    assert_eq!(boxes[0].text, "");
}

#[test]
fn time_updates_retype_content() {
    let (host, mut layer) = layer();
    layer.update_time(1.5).unwrap();
    assert_eq!(layer.text_of("t1"), Some("Hello wo"));
    layer.update_time(2.0).unwrap();
    assert_eq!(host.borrow().text_boxes().next().unwrap().text, "Hello world");

    layer.update_time(-1.0).unwrap();
    let host = host.borrow();
    let tb = host.text_boxes().next().unwrap();
    assert!(!tb.visible);
    assert_eq!(tb.text, "");
}

#[test]
fn set_viewport_takes_effect_on_render() {
    let (host, mut layer) = layer();
    layer.set_viewport(Viewport::new(400.0, 200.0, 1.0).unwrap()).unwrap();
    assert_eq!(host.borrow().text_boxes().next().unwrap().rect.left, 400.0);
    layer.render().unwrap();
    assert_eq!(host.borrow().text_boxes().next().unwrap().rect.left, 200.0);
    assert_eq!(layer.box_count(), 1);
}
