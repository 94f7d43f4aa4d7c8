use flowmap_distortion::{EffectConfig, EffectError, MIN_DELTA_MS};

#[test]
fn defaults_match_the_tuned_values() {
    let config = EffectConfig::default();
    assert_eq!(config.strength, 0.12);
    assert_eq!(config.min_delta_ms, MIN_DELTA_MS);
    assert_eq!(config.velocity_attack, 0.15);
    assert_eq!(config.velocity_release, 0.10);
    assert_eq!(config.device_pixel_ratio, 1.0);
    assert_eq!(config.flowmap.size, 128);
    assert_eq!(config.flowmap.falloff, 0.3);
    assert_eq!(config.flowmap.alpha, 1.0);
    assert_eq!(config.flowmap.dissipation, 0.98);
    assert_eq!(config.flowmap.aspect, 1.0);
}

#[test]
fn known_keys_override_their_field() {
    let mut config = EffectConfig::default();
    assert!(config.apply_override("strength", "0.2").unwrap());
    assert!(config.apply_override("falloff", " 0.45 ").unwrap());
    assert!(config.apply_override("flowmap-size", "256").unwrap());
    assert!(config.apply_override("dpr", "2").unwrap());

    assert_eq!(config.strength, 0.2);
    assert_eq!(config.flowmap.falloff, 0.45);
    assert_eq!(config.flowmap.size, 256);
    assert_eq!(config.device_pixel_ratio, 2.0);
}

#[test]
fn unknown_keys_are_reported_but_harmless() {
    let mut config = EffectConfig::default();
    assert!(!config.apply_override("colour", "red").unwrap());
    assert_eq!(config, EffectConfig::default());
}

#[test]
fn invalid_values_are_rejected() {
    let mut config = EffectConfig::default();
    for (key, value) in [
        ("strength", "lots"),
        ("strength", "1.5"),
        ("dissipation", "-0.1"),
        ("falloff", "0"),
        ("dpr", "NaN"),
        ("flowmap-size", "0"),
        ("flowmap-size", "12.5"),
        ("attack", "inf"),
    ] {
        let err = config.apply_override(key, value).unwrap_err();
        assert!(
            matches!(&err, EffectError::InvalidSetting { key: k, value: v } if k == key && v == value),
            "{key}={value} gave {err}"
        );
    }
    assert_eq!(config, EffectConfig::default());
}

#[test]
fn bulk_overrides_keep_defaults_for_rejected_pairs() {
    let mut config = EffectConfig::default();
    let applied = config.apply_overrides([
        ("dissipation", "0.9"),
        ("release", "oops"),
        ("unknown", "1"),
        ("alpha", "0.5"),
    ]);

    assert_eq!(applied, 2);
    assert_eq!(config.flowmap.dissipation, 0.9);
    assert_eq!(config.flowmap.alpha, 0.5);
    assert_eq!(config.velocity_release, 0.10);
}
