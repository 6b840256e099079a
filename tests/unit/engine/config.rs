use super::*;

#[test]
fn defaults_are_valid() {
    let config = EngineConfig::default();
    config.validate().unwrap();
    assert_eq!(config.initial_page, 1);
    assert_eq!(serde_json::from_str::<EngineConfig>("{}").unwrap(), config);
}

#[test]
fn rejects_bad_ranges() {
    let bad = [
        EngineConfig {
            initial_scale: 0.0,
            ..EngineConfig::default()
        },
        EngineConfig {
            min_scale: 5.0,
            max_scale: 2.0,
            initial_scale: 3.0,
            ..EngineConfig::default()
        },
        EngineConfig {
            initial_scale: 20.0,
            ..EngineConfig::default()
        },
        EngineConfig {
            device_pixel_ratio: f64::INFINITY,
            ..EngineConfig::default()
        },
        EngineConfig {
            initial_page: 0,
            ..EngineConfig::default()
        },
    ];
    for config in bad {
        assert!(config.validate().unwrap_err().is_validation(), "{config:?}");
    }
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(serde_json::from_str::<EngineConfig>(r#"{"zoom": 2}"#).is_err());
}

#[test]
fn from_path_validates() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("target/unit-config");
    std::fs::create_dir_all(&dir).unwrap();

    let good = dir.join("good.json");
    std::fs::write(&good, r#"{"initial_scale": 2.0, "device_pixel_ratio": 2.0}"#).unwrap();
    let config = EngineConfig::from_path(&good).unwrap();
    assert_eq!((config.initial_scale, config.device_pixel_ratio), (2.0, 2.0));

    let bad = dir.join("bad.json");
    std::fs::write(&bad, r#"{"min_scale": -1}"#).unwrap();
    assert!(EngineConfig::from_path(&bad).unwrap_err().is_validation());

    assert!(matches!(
        EngineConfig::from_path(dir.join("missing.json")),
        Err(OverlayError::Other(_))
    ));
}
