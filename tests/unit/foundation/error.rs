use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        OverlayError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(OverlayError::load("x").to_string().contains("load error:"));
    assert!(
        OverlayError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        OverlayError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert_eq!(
        OverlayError::Destroyed("set_time").to_string(),
        "set_time called after destroy"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = OverlayError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_validation());
}
