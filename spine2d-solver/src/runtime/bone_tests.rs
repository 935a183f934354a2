use crate::{BoneData, BoneLocal, Inherit, PointAttachmentData, Skeleton, SkeletonData};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn parent_and_child(parent: BoneLocal, child: BoneLocal) -> Skeleton {
    let data = Arc::new(SkeletonData {
        bones: vec![
            BoneData {
                setup: parent,
                ..BoneData::new("parent", None)
            },
            BoneData {
                setup: child,
                ..BoneData::new("child", Some(0))
            },
        ],
        ..SkeletonData::default()
    });
    let mut skeleton = Skeleton::new(data).unwrap();
    skeleton.update_world_transform();
    skeleton
}

#[test]
fn normal_inherits_parent_scale_and_rotation() {
    let skeleton = parent_and_child(
        BoneLocal {
            scale_x: 2.0,
            scale_y: 2.0,
            ..BoneLocal::default()
        },
        BoneLocal {
            x: 3.0,
            rotation: 90.0,
            ..BoneLocal::default()
        },
    );
    let child = &skeleton.bones[1];
    assert_approx(child.world_x, 6.0);
    assert_approx(child.world_scale_x(), 2.0);
    assert_approx(child.world_rotation_x(), 90.0);
}

#[test]
fn only_translation_ignores_parent_matrix() {
    let skeleton = parent_and_child(
        BoneLocal {
            rotation: 90.0,
            scale_x: 2.0,
            scale_y: 2.0,
            ..BoneLocal::default()
        },
        BoneLocal {
            x: 5.0,
            inherit: Inherit::OnlyTranslation,
            ..BoneLocal::default()
        },
    );
    let child = &skeleton.bones[1];
    assert_approx(child.world_x, 0.0);
    assert_approx(child.world_y, 10.0);
    assert_approx(child.a, 1.0);
    assert_approx(child.b, 0.0);
    assert_approx(child.c, 0.0);
    assert_approx(child.d, 1.0);
}

#[test]
fn no_scale_keeps_parent_rotation_only() {
    let skeleton = parent_and_child(
        BoneLocal {
            rotation: 30.0,
            scale_x: 3.0,
            scale_y: 3.0,
            ..BoneLocal::default()
        },
        BoneLocal {
            inherit: Inherit::NoScale,
            ..BoneLocal::default()
        },
    );
    let child = &skeleton.bones[1];
    assert_approx(child.world_scale_x(), 1.0);
    assert_approx(child.world_scale_y(), 1.0);
    assert_approx(child.world_rotation_x(), 30.0);
}

#[test]
fn no_rotation_keeps_parent_scale_only() {
    let skeleton = parent_and_child(
        BoneLocal {
            rotation: 60.0,
            scale_x: 2.0,
            scale_y: 2.0,
            ..BoneLocal::default()
        },
        BoneLocal {
            inherit: Inherit::NoRotationOrReflection,
            ..BoneLocal::default()
        },
    );
    let child = &skeleton.bones[1];
    assert_approx(child.world_rotation_x(), 0.0);
    assert_approx(child.world_scale_x(), 2.0);
    assert_approx(child.world_scale_y(), 2.0);
}

#[test]
fn world_and_local_points_round_trip() {
    let skeleton = parent_and_child(
        BoneLocal {
            x: 3.0,
            y: 4.0,
            rotation: 30.0,
            scale_x: 2.0,
            scale_y: 0.5,
            ..BoneLocal::default()
        },
        BoneLocal::default(),
    );
    let bone = &skeleton.bones[0];
    let [wx, wy] = bone.local_to_world(1.0, 2.0);
    let [lx, ly] = bone.world_to_local(wx, wy);
    assert_approx(lx, 1.0);
    assert_approx(ly, 2.0);
}

#[test]
fn local_transform_is_recovered_from_world() {
    let setup = BoneLocal {
        x: 4.0,
        y: 5.0,
        rotation: 30.0,
        scale_x: 2.0,
        scale_y: 3.0,
        ..BoneLocal::default()
    };
    let mut skeleton = parent_and_child(
        BoneLocal {
            rotation: 45.0,
            ..BoneLocal::default()
        },
        setup,
    );
    skeleton.update_local_transform(1);

    let local = skeleton.bones[1].applied();
    assert_approx(local.x, setup.x);
    assert_approx(local.y, setup.y);
    assert_approx(local.rotation, setup.rotation);
    assert_approx(local.scale_x, setup.scale_x);
    assert_approx(local.scale_y, setup.scale_y);
    assert_approx(local.shear_y, 0.0);
}

#[test]
fn local_rotation_round_trips_through_world() {
    let skeleton = parent_and_child(
        BoneLocal {
            rotation: 20.0,
            ..BoneLocal::default()
        },
        BoneLocal::default(),
    );
    let bone = &skeleton.bones[0];
    let world = bone.local_to_world_rotation(50.0);
    assert_approx(world, 50.0);
    assert_approx(bone.world_to_local_rotation(world), 50.0);
}

#[test]
fn rotate_world_turns_the_matrix() {
    let mut skeleton = parent_and_child(BoneLocal::default(), BoneLocal::default());
    let bone = &mut skeleton.bones[0];
    bone.rotate_world(90.0);
    assert_approx(bone.world_rotation_x(), 90.0);
    assert_approx(bone.world_scale_x(), 1.0);
}

#[test]
fn point_attachment_follows_bone() {
    let skeleton = parent_and_child(
        BoneLocal {
            x: 10.0,
            rotation: 90.0,
            ..BoneLocal::default()
        },
        BoneLocal::default(),
    );
    let point = PointAttachmentData {
        name: "muzzle".to_string(),
        x: 5.0,
        y: 0.0,
        rotation: 30.0,
    };
    let [x, y] = point.world_position(&skeleton.bones[0]);
    assert_approx(x, 10.0);
    assert_approx(y, 5.0);
    assert_approx(point.world_rotation(&skeleton.bones[0]), 120.0);
}

#[test]
fn no_scale_or_reflection_drops_parent_flip() {
    let flipped = BoneLocal {
        scale_x: -2.0,
        scale_y: 2.0,
        ..BoneLocal::default()
    };
    let skeleton = parent_and_child(
        flipped,
        BoneLocal {
            inherit: Inherit::NoScaleOrReflection,
            ..BoneLocal::default()
        },
    );
    let child = &skeleton.bones[1];
    assert_approx(child.a, -1.0);
    assert_approx(child.b, 0.0);
    assert_approx(child.c, 0.0);
    assert_approx(child.d, -1.0);
    assert_approx(child.world_rotation_x(), 180.0);

    let skeleton = parent_and_child(
        flipped,
        BoneLocal {
            inherit: Inherit::NoScale,
            ..BoneLocal::default()
        },
    );
    let child = &skeleton.bones[1];
    assert_approx(child.a, -1.0);
    assert_approx(child.d, 1.0);
}

#[test]
fn zero_x_scale_is_recovered_from_the_y_axis() {
    let mut skeleton = parent_and_child(
        BoneLocal {
            rotation: 90.0,
            ..BoneLocal::default()
        },
        BoneLocal {
            x: 3.0,
            scale_x: 0.0,
            scale_y: 2.0,
            shear_y: 15.0,
            ..BoneLocal::default()
        },
    );
    skeleton.update_local_transform(1);

    let local = skeleton.bones[1].applied();
    assert_approx(local.x, 3.0);
    assert_approx(local.y, 0.0);
    assert_approx(local.scale_x, 0.0);
    assert_approx(local.scale_y, 2.0);
    assert_approx(local.shear_x, 0.0);
    assert_approx(local.shear_y, 0.0);
    assert_approx(local.rotation, -15.0);
}
