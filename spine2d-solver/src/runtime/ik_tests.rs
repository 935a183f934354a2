use crate::{
    BoneData, BoneLocal, Constraint, ConstraintData, IkConstraintData, IkPose, Skeleton,
    SkeletonData,
};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-3,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn at(name: &str, parent: Option<usize>, length: f32, x: f32, y: f32) -> BoneData {
    BoneData {
        length,
        setup: BoneLocal {
            x,
            y,
            ..BoneLocal::default()
        },
        ..BoneData::new(name, parent)
    }
}

fn ik(bones: Vec<usize>, target: usize, setup: IkPose) -> ConstraintData {
    ConstraintData::Ik(IkConstraintData {
        name: "ik".to_string(),
        skin_required: false,
        bones,
        target,
        uniform: false,
        setup,
    })
}

/// root, `p` (length 10), target `t` at `(tx, ty)`, one-bone IK on `p`.
fn one_bone(tx: f32, ty: f32, setup: IkPose) -> Skeleton {
    let data = Arc::new(SkeletonData {
        bones: vec![
            at("root", None, 0.0, 0.0, 0.0),
            at("p", Some(0), 10.0, 0.0, 0.0),
            at("t", Some(0), 0.0, tx, ty),
        ],
        constraints: vec![ik(vec![1], 2, setup)],
        ..SkeletonData::default()
    });
    let mut skeleton = Skeleton::new(data).unwrap();
    skeleton.update_world_transform();
    skeleton
}

/// root, `p` (length 1), `c` at the tip of `p` (length 1), target `t` at `(tx, ty)`.
fn two_bone(tx: f32, ty: f32, setup: IkPose) -> Skeleton {
    let data = Arc::new(SkeletonData {
        bones: vec![
            at("root", None, 0.0, 0.0, 0.0),
            at("p", Some(0), 1.0, 0.0, 0.0),
            at("c", Some(1), 1.0, 1.0, 0.0),
            at("t", Some(0), 0.0, tx, ty),
        ],
        constraints: vec![ik(vec![1, 2], 3, setup)],
        ..SkeletonData::default()
    });
    let mut skeleton = Skeleton::new(data).unwrap();
    skeleton.update_world_transform();
    skeleton
}

fn tip(skeleton: &Skeleton, bone: usize) -> [f32; 2] {
    let length = skeleton.data.bones[bone].length;
    skeleton.bones[bone].local_to_world(length, 0.0)
}

#[test]
fn one_bone_points_at_target_without_touching_pose() {
    let skeleton = one_bone(0.0, 10.0, IkPose::default());
    let bone = &skeleton.bones[1];

    assert_approx(bone.applied().rotation, 90.0);
    assert_approx(bone.pose().rotation, 0.0);
    let [x, y] = tip(&skeleton, 1);
    assert_approx(x, 0.0);
    assert_approx(y, 10.0);
}

#[test]
fn zero_mix_leaves_bone_unchanged() {
    let skeleton = one_bone(
        0.0,
        10.0,
        IkPose {
            mix: 0.0,
            ..IkPose::default()
        },
    );
    assert_approx(skeleton.bones[1].world_rotation_x(), 0.0);
}

#[test]
fn partial_mix_interpolates_rotation() {
    let skeleton = one_bone(
        0.0,
        10.0,
        IkPose {
            mix: 0.5,
            ..IkPose::default()
        },
    );
    assert_approx(skeleton.bones[1].world_rotation_x(), 45.0);
}

#[test]
fn one_bone_stretch_scales_to_reach() {
    let skeleton = one_bone(
        0.0,
        20.0,
        IkPose {
            stretch: true,
            ..IkPose::default()
        },
    );
    assert_approx(skeleton.bones[1].applied().scale_x, 2.0);
    let [x, y] = tip(&skeleton, 1);
    assert_approx(x, 0.0);
    assert_approx(y, 20.0);
}

#[test]
fn one_bone_compress_only_shrinks() {
    let skeleton = one_bone(
        0.0,
        20.0,
        IkPose {
            compress: true,
            ..IkPose::default()
        },
    );
    assert_approx(skeleton.bones[1].applied().scale_x, 1.0);

    let skeleton = one_bone(
        5.0,
        0.0,
        IkPose {
            compress: true,
            ..IkPose::default()
        },
    );
    assert_approx(skeleton.bones[1].applied().scale_x, 0.5);
}

#[test]
fn two_bones_reach_target() {
    let skeleton = two_bone(1.0, 1.0, IkPose::default());
    let [x, y] = tip(&skeleton, 2);
    assert_approx(x, 1.0);
    assert_approx(y, 1.0);
}

#[test]
fn bend_direction_picks_the_elbow() {
    let skeleton = two_bone(1.0, 1.0, IkPose::default());
    assert_approx(skeleton.bones[2].world_x, 1.0);
    assert_approx(skeleton.bones[2].world_y, 0.0);

    let skeleton = two_bone(
        1.0,
        1.0,
        IkPose {
            bend_direction: -1,
            ..IkPose::default()
        },
    );
    assert_approx(skeleton.bones[2].world_x, 0.0);
    assert_approx(skeleton.bones[2].world_y, 1.0);
    let [x, y] = tip(&skeleton, 2);
    assert_approx(x, 1.0);
    assert_approx(y, 1.0);
}

#[test]
fn two_bones_extend_toward_unreachable_target() {
    let skeleton = two_bone(10.0, 0.0, IkPose::default());
    let [x, y] = tip(&skeleton, 2);
    assert_approx(x, 2.0);
    assert_approx(y, 0.0);
}

#[test]
fn two_bone_stretch_reaches_far_target() {
    let skeleton = two_bone(
        4.0,
        0.0,
        IkPose {
            stretch: true,
            ..IkPose::default()
        },
    );
    assert_approx(skeleton.bones[1].applied().scale_x, 2.0);
}

#[test]
fn animated_target_is_followed_on_next_update() {
    let mut skeleton = one_bone(0.0, 10.0, IkPose::default());
    skeleton.bones[2].pose_mut().set_position(-10.0, 0.0);
    skeleton.update_world_transform();

    assert_approx(skeleton.bones[1].applied().rotation.abs(), 180.0);
    let Constraint::Ik(constraint) = &skeleton.constraints[0] else {
        panic!("expected an IK constraint");
    };
    assert_approx(constraint.posed.applied().mix, 1.0);
}

#[test]
fn non_uniform_parent_scale_still_reaches_target() {
    let data = Arc::new(SkeletonData {
        bones: vec![
            at("root", None, 0.0, 0.0, 0.0),
            BoneData {
                length: 1.0,
                setup: BoneLocal {
                    scale_x: 2.0,
                    ..BoneLocal::default()
                },
                ..BoneData::new("p", Some(0))
            },
            at("c", Some(1), 1.0, 1.0, 0.0),
            at("t", Some(0), 0.0, 1.0, 2.0),
        ],
        constraints: vec![ik(vec![1, 2], 3, IkPose::default())],
        ..SkeletonData::default()
    });
    let mut skeleton = Skeleton::new(data).unwrap();
    skeleton.update_world_transform();

    assert_approx(skeleton.bones[1].applied().rotation, 36.869898);
    assert_approx(skeleton.bones[2].applied().rotation, 90.0);
    assert_approx(skeleton.bones[2].applied().y, 0.0);
    let [x, y] = tip(&skeleton, 2);
    assert_approx(x, 1.0);
    assert_approx(y, 2.0);
}

#[test]
fn softness_eases_in_before_full_extension() {
    // Fully extended the chain would reach x 2. Softness 0.5 pulls the tip back to 1.875.
    let skeleton = two_bone(
        2.0,
        0.0,
        IkPose {
            softness: 0.5,
            ..IkPose::default()
        },
    );
    assert_approx(skeleton.bones[1].applied().rotation, -20.364135);
    assert_approx(skeleton.bones[2].applied().rotation, 40.728270);
    let [x, y] = tip(&skeleton, 2);
    assert_approx(x, 1.875);
    assert_approx(y, 0.0);
}
