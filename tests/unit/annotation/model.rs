use super::*;
use serde_json::json;

fn sample_json() -> serde_json::Value {
    json!([
        {
            "kind": "highlight",
            "id": "h1",
            "page": 1,
            "start": 0.0,
            "end": 10.0,
            "quads": [{"x": 0.1, "y": 0.1, "w": 0.6, "h": 0.02}],
            "color": "rgba(255, 235, 59, 0.4)"
        },
        {
            "kind": "text",
            "id": "t1",
            "page": 2,
            "start": 0.0,
            "end": 4.0,
            "content": "Hello world from text",
            "rect": {"x": 0.5, "y": 0.5, "w": 0.3, "h": 0.1}
        },
        {
            "kind": "ink",
            "id": "i1",
            "page": 1,
            "start": 2.0,
            "end": 2.0,
            "strokes": [{"color": "#ff0000", "width": 3, "points": [
                {"t": 0.0, "x": 0.1, "y": 0.1},
                {"t": 1.0, "x": 0.2, "y": 0.2}
            ]}]
        },
        {
            "kind": "sticker",
            "id": "s1",
            "page": 1,
            "start": 0.0,
            "end": 1.0,
            "emoji": "*"
        }
    ])
}

#[test]
fn deserializes_every_kind_and_keeps_unknown() {
    let set: AnnotationSet = serde_json::from_value(sample_json()).unwrap();
    assert_eq!(set.len(), 4);
    let kinds: Vec<_> = set.as_slice().iter().map(Annotation::kind_name).collect();
    assert_eq!(kinds, vec!["highlight", "text", "ink", "unknown"]);

    let Annotation::Text(t) = &set.as_slice()[1] else {
        panic!("expected text annotation");
    };
    assert_eq!(t.font_size, 14.0);
    assert_eq!(t.foreground, Color::BLACK);
    assert!(set.validate().is_ok());
}

#[test]
fn accepts_wrapped_form() {
    let set: AnnotationSet =
        serde_json::from_value(json!({ "annotations": sample_json() })).unwrap();
    assert_eq!(set.len(), 4);
    assert_eq!(set.max_page(), 2);
    assert_eq!(set.for_page(1).count(), 2);
}

#[test]
fn rejects_inverted_window() {
    let a: Annotation = serde_json::from_value(json!({
        "kind": "highlight", "id": "h", "page": 1, "start": 5.0, "end": 1.0, "quads": []
    }))
    .unwrap();
    let err = a.validate().unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("must be >= start"));
}

#[test]
fn rejects_page_zero_and_empty_id() {
    let a: Annotation = serde_json::from_value(json!({
        "kind": "ink", "id": "i", "page": 0, "start": 0.0, "end": 1.0, "strokes": []
    }))
    .unwrap();
    assert!(a.validate().is_err());

    let a: Annotation = serde_json::from_value(json!({
        "kind": "ink", "id": " ", "page": 1, "start": 0.0, "end": 1.0, "strokes": []
    }))
    .unwrap();
    assert!(a.validate().is_err());
}

#[test]
fn rejects_duplicate_ids() {
    let set = AnnotationSet::from_json_str(
        r#"[
            {"kind": "ink", "id": "dup", "page": 1, "start": 0, "end": 1, "strokes": []},
            {"kind": "ink", "id": "dup", "page": 2, "start": 0, "end": 1, "strokes": []}
        ]"#,
    )
    .unwrap();
    let err = set.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate annotation id 'dup'"));
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = AnnotationSet::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, OverlayError::Serde(_)));
}
