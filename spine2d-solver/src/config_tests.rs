use crate::{BoneLocal, Inherit, MixBlend, Physics, PhysicsPose, SkeletonConfig};

#[test]
fn default_config_is_y_up_with_unit_wind_and_gravity() {
    let config = SkeletonConfig::default();
    assert!(!config.y_down);
    assert_eq!((config.wind_x, config.wind_y), (1.0, 0.0));
    assert_eq!((config.gravity_x, config.gravity_y), (0.0, 1.0));
    assert_eq!(config.y_direction(), 1.0);
    assert_eq!(SkeletonConfig::y_down().y_direction(), -1.0);
}

#[test]
fn config_fields_missing_from_json_use_defaults() {
    let config: SkeletonConfig = serde_json::from_str(r#"{ "y_down": true, "gravity_y": -9.8 }"#).unwrap();
    assert_eq!(
        config,
        SkeletonConfig {
            y_down: true,
            gravity_y: -9.8,
            ..SkeletonConfig::default()
        }
    );
}

#[test]
fn config_round_trips_through_json() {
    let config = SkeletonConfig {
        wind_x: 0.25,
        ..SkeletonConfig::y_down()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: SkeletonConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn partial_poses_keep_identity_defaults() {
    let local: BoneLocal =
        serde_json::from_str(r#"{ "rotation": 45.0, "inherit": "NoScale" }"#).unwrap();
    assert_eq!(local.rotation, 45.0);
    assert_eq!(local.scale_x, 1.0);
    assert_eq!(local.scale_y, 1.0);
    assert_eq!(local.inherit, Inherit::NoScale);

    let physics: PhysicsPose = serde_json::from_str(r#"{ "mix": 0.5 }"#).unwrap();
    assert_eq!(
        physics,
        PhysicsPose {
            mix: 0.5,
            ..PhysicsPose::default()
        }
    );
}

#[test]
fn enums_serialize_by_variant_name() {
    assert_eq!(serde_json::to_string(&MixBlend::Replace).unwrap(), r#""Replace""#);
    let physics: Physics = serde_json::from_str(r#""Update""#).unwrap();
    assert_eq!(physics, Physics::Update);
}
