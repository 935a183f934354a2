use crate::{
    BoneData, BoneLocal, ConstraintData, Skeleton, SkeletonData, TransformConstraintData,
    TransformFromProperty, TransformPose, TransformProperty, TransformToProperty,
};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn copy(property: TransformProperty) -> TransformFromProperty {
    map(property, property, 1.0, 0.0)
}

fn map(from: TransformProperty, to: TransformProperty, scale: f32, max: f32) -> TransformFromProperty {
    TransformFromProperty {
        property: from,
        offset: 0.0,
        to: vec![TransformToProperty {
            property: to,
            offset: 0.0,
            max,
            scale,
        }],
    }
}

fn constraint(properties: Vec<TransformFromProperty>) -> TransformConstraintData {
    TransformConstraintData {
        name: "follow".to_string(),
        skin_required: false,
        bones: vec![2],
        source: 1,
        local_source: false,
        local_target: false,
        additive: false,
        clamp: false,
        offsets: [0.0; 6],
        properties,
        setup: TransformPose::default(),
    }
}

/// root, `source` and `target` (bone 2, at x 10) both children of root.
fn solve(source: BoneLocal, target: BoneLocal, data: TransformConstraintData) -> Skeleton {
    let data = Arc::new(SkeletonData {
        bones: vec![
            BoneData::new("root", None),
            BoneData {
                setup: source,
                ..BoneData::new("source", Some(0))
            },
            BoneData {
                setup: target,
                ..BoneData::new("target", Some(0))
            },
        ],
        constraints: vec![ConstraintData::Transform(data)],
        ..SkeletonData::default()
    });
    let mut skeleton = Skeleton::new(data).unwrap();
    skeleton.update_world_transform();
    skeleton
}

fn rotated(degrees: f32) -> BoneLocal {
    BoneLocal {
        rotation: degrees,
        ..BoneLocal::default()
    }
}

fn target_at_ten() -> BoneLocal {
    BoneLocal {
        x: 10.0,
        ..BoneLocal::default()
    }
}

#[test]
fn world_rotation_is_copied_without_moving_target() {
    let skeleton = solve(
        rotated(45.0),
        target_at_ten(),
        constraint(vec![copy(TransformProperty::Rotate)]),
    );
    let target = &skeleton.bones[2];
    assert_approx(target.world_rotation_x(), 45.0);
    assert_approx(target.world_x, 10.0);
    assert_approx(target.world_y, 0.0);
}

#[test]
fn rotation_offset_is_added() {
    let mut data = constraint(vec![copy(TransformProperty::Rotate)]);
    data.offsets[0] = 10.0;
    let skeleton = solve(rotated(45.0), target_at_ten(), data);
    assert_approx(skeleton.bones[2].world_rotation_x(), 55.0);
}

#[test]
fn partial_mix_blends_rotation() {
    let mut data = constraint(vec![copy(TransformProperty::Rotate)]);
    data.setup.mix_rotate = 0.5;
    let skeleton = solve(rotated(45.0), target_at_ten(), data);
    assert_approx(skeleton.bones[2].world_rotation_x(), 22.5);
}

#[test]
fn world_translation_moves_target_to_source() {
    let skeleton = solve(
        BoneLocal {
            x: 3.0,
            y: 4.0,
            ..BoneLocal::default()
        },
        target_at_ten(),
        constraint(vec![copy(TransformProperty::X), copy(TransformProperty::Y)]),
    );
    let target = &skeleton.bones[2];
    assert_approx(target.world_x, 3.0);
    assert_approx(target.world_y, 4.0);
    assert_approx(target.pose().x, 10.0);
}

#[test]
fn zero_mixes_skip_the_constraint() {
    let mut data = constraint(vec![copy(TransformProperty::Rotate)]);
    data.setup = TransformPose {
        mix_rotate: 0.0,
        mix_x: 0.0,
        mix_y: 0.0,
        mix_scale_x: 0.0,
        mix_scale_y: 0.0,
        mix_shear_y: 0.0,
    };
    let skeleton = solve(rotated(45.0), target_at_ten(), data);
    assert_approx(skeleton.bones[2].world_rotation_x(), 0.0);
}

#[test]
fn local_rotation_writes_applied_not_pose() {
    let mut data = constraint(vec![copy(TransformProperty::Rotate)]);
    data.local_source = true;
    data.local_target = true;
    let skeleton = solve(rotated(45.0), target_at_ten(), data);

    let target = &skeleton.bones[2];
    assert_approx(target.applied().rotation, 45.0);
    assert_approx(target.pose().rotation, 0.0);
    assert_approx(target.world_rotation_x(), 45.0);
}

#[test]
fn additive_local_rotation_adds_to_target() {
    let mut data = constraint(vec![copy(TransformProperty::Rotate)]);
    data.local_source = true;
    data.local_target = true;
    data.additive = true;
    let skeleton = solve(rotated(45.0), rotated(10.0), data);
    assert_approx(skeleton.bones[2].applied().rotation, 55.0);
}

#[test]
fn mapped_property_is_scaled_and_clamped() {
    let mut data = constraint(vec![map(TransformProperty::X, TransformProperty::Rotate, 10.0, 30.0)]);
    data.local_source = true;
    data.local_target = true;
    data.clamp = true;
    let source = BoneLocal {
        x: 5.0,
        ..BoneLocal::default()
    };
    let skeleton = solve(source, BoneLocal::default(), data.clone());
    assert_approx(skeleton.bones[2].applied().rotation, 30.0);

    data.clamp = false;
    let skeleton = solve(source, BoneLocal::default(), data);
    assert_approx(skeleton.bones[2].applied().rotation, 50.0);
}

#[test]
fn world_scale_is_copied() {
    let skeleton = solve(
        BoneLocal {
            scale_x: 2.0,
            scale_y: 3.0,
            ..BoneLocal::default()
        },
        target_at_ten(),
        constraint(vec![copy(TransformProperty::ScaleX), copy(TransformProperty::ScaleY)]),
    );
    let target = &skeleton.bones[2];
    assert_approx(target.world_scale_x(), 2.0);
    assert_approx(target.world_scale_y(), 3.0);
}

#[test]
fn constraints_on_one_bone_compose_in_order_each_frame() {
    let stacked = |name: &str, source: usize, mix_rotate: f32| TransformConstraintData {
        name: name.to_string(),
        bones: vec![3],
        source,
        local_target: true,
        additive: true,
        setup: TransformPose {
            mix_rotate,
            ..TransformPose::default()
        },
        ..constraint(vec![copy(TransformProperty::Rotate)])
    };
    let data = Arc::new(SkeletonData {
        bones: vec![
            BoneData::new("root", None),
            BoneData {
                setup: rotated(40.0),
                ..BoneData::new("first", Some(0))
            },
            BoneData {
                setup: rotated(80.0),
                ..BoneData::new("second", Some(0))
            },
            BoneData::new("target", Some(0)),
        ],
        constraints: vec![
            ConstraintData::Transform(stacked("first", 1, 1.0)),
            ConstraintData::Transform(stacked("second", 2, 0.5)),
        ],
        ..SkeletonData::default()
    });
    let mut skeleton = Skeleton::new(data).unwrap();

    for _ in 0..2 {
        skeleton.update_world_transform();
        let target = &skeleton.bones[3];
        assert_approx(target.pose().rotation, 0.0);
        assert_approx(target.applied().rotation, 80.0);
        assert_approx(target.world_rotation_x(), 80.0);
    }
}
