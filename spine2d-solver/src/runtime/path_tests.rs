use crate::{
    AttachmentData, BoneData, BoneLocal, ConstraintData, DEFAULT_SKIN, MeshVertices,
    PathAttachmentData, PathConstraintData, PathPose, PositionMode, RotateMode, Skeleton,
    SkeletonData, SkinData, SlotData, SpacingMode,
};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-3,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

/// Spline vertices for straight segments through `points`: `[handle in, point, handle out]`
/// per point, handles at thirds.
fn polyline(points: &[[f32; 2]], closed: bool) -> Vec<[f32; 2]> {
    let n = points.len();
    let lerp = |a: [f32; 2], b: [f32; 2], t: f32| [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t];
    let mut vertices = Vec::with_capacity(n * 3);
    for i in 0..n {
        let point = points[i];
        let prev = if i > 0 {
            points[i - 1]
        } else if closed {
            points[n - 1]
        } else {
            lerp(point, points[1], -1.0)
        };
        let next = if i + 1 < n {
            points[i + 1]
        } else if closed {
            points[0]
        } else {
            lerp(point, points[n - 2], -1.0)
        };
        vertices.push(lerp(point, prev, 1.0 / 3.0));
        vertices.push(point);
        vertices.push(lerp(point, next, 1.0 / 3.0));
    }
    vertices
}

fn path(points: &[[f32; 2]], lengths: Vec<f32>, closed: bool, constant_speed: bool) -> AttachmentData {
    AttachmentData::Path(PathAttachmentData {
        name: "path".to_string(),
        vertices: MeshVertices::Unweighted(polyline(points, closed)),
        lengths,
        closed,
        constant_speed,
    })
}

fn constraint(bones: Vec<usize>, rotate_mode: RotateMode, setup: PathPose) -> PathConstraintData {
    PathConstraintData {
        name: "follow".to_string(),
        skin_required: false,
        bones,
        slot: 0,
        position_mode: PositionMode::Fixed,
        spacing_mode: SpacingMode::Length,
        rotate_mode,
        offset_rotation: 0.0,
        setup,
    }
}

fn at(position: f32) -> PathPose {
    PathPose {
        position,
        ..PathPose::default()
    }
}

/// root with the path slot, plus `bones` appended after it.
fn solve(bones: Vec<BoneData>, attachment: AttachmentData, constraint: PathConstraintData) -> Skeleton {
    let mut slot = SlotData::new("path", 0);
    slot.attachment = Some("path".to_string());
    let mut skin = SkinData::new(DEFAULT_SKIN, 1);
    skin.set_attachment(0, attachment);

    let mut all = vec![BoneData::new("root", None)];
    all.extend(bones);
    let data = Arc::new(SkeletonData {
        bones: all,
        slots: vec![slot],
        skins: [(DEFAULT_SKIN.to_string(), skin)].into_iter().collect(),
        constraints: vec![ConstraintData::Path(constraint)],
        ..SkeletonData::default()
    });
    let mut skeleton = Skeleton::new(data).unwrap();
    skeleton.update_world_transform();
    skeleton
}

const SQUARE: [[f32; 2]; 4] = [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]];

fn square_follower(position: f32) -> Skeleton {
    solve(
        vec![BoneData::new("follower", Some(0))],
        path(&SQUARE, vec![100.0, 200.0, 300.0, 400.0], true, false),
        constraint(vec![1], RotateMode::Tangent, at(position)),
    )
}

#[test]
fn bone_is_placed_along_closed_path() {
    let skeleton = square_follower(5.0);
    let bone = &skeleton.bones[1];
    assert_approx(bone.world_x, 5.0);
    assert_approx(bone.world_y, 0.0);
    assert_approx(bone.world_rotation_x(), 0.0);
}

#[test]
fn closed_path_position_wraps_by_its_length() {
    let wrapped = square_follower(405.0);
    let plain = square_follower(5.0);
    assert_approx(wrapped.bones[1].world_x, plain.bones[1].world_x);
    assert_approx(wrapped.bones[1].world_y, plain.bones[1].world_y);

    let negative = square_follower(-395.0);
    assert_approx(negative.bones[1].world_x, 5.0);
    assert_approx(negative.bones[1].world_y, 0.0);
}

#[test]
fn tangent_mode_follows_path_direction() {
    let skeleton = square_follower(150.0);
    let bone = &skeleton.bones[1];
    assert_approx(bone.world_x, 100.0);
    assert_approx(bone.world_y, 50.0);
    assert_approx(bone.world_rotation_x(), 90.0);
}

#[test]
fn percent_position_scales_by_path_length() {
    let mut data = constraint(vec![1], RotateMode::Tangent, at(0.25));
    data.position_mode = PositionMode::Percent;
    let skeleton = solve(
        vec![BoneData::new("follower", Some(0))],
        path(&[[0.0, 0.0], [100.0, 0.0]], vec![100.0], false, false),
        data,
    );
    assert_approx(skeleton.bones[1].world_x, 25.0);
}

#[test]
fn open_path_extends_past_its_end() {
    let skeleton = solve(
        vec![BoneData::new("follower", Some(0))],
        path(&[[0.0, 0.0], [100.0, 0.0]], vec![100.0], false, false),
        constraint(vec![1], RotateMode::Tangent, at(120.0)),
    );
    assert_approx(skeleton.bones[1].world_x, 120.0);
    assert_approx(skeleton.bones[1].world_y, 0.0);
}

#[test]
fn constant_speed_samples_by_distance() {
    let skeleton = solve(
        vec![BoneData::new("follower", Some(0))],
        path(&[[0.0, 0.0], [100.0, 0.0]], Vec::new(), false, true),
        constraint(vec![1], RotateMode::Tangent, at(25.0)),
    );
    assert_approx(skeleton.bones[1].world_x, 25.0);
    assert_approx(skeleton.bones[1].world_y, 0.0);
}

#[test]
fn chain_mode_lays_bones_along_path() {
    let bones = vec![
        BoneData {
            length: 50.0,
            ..BoneData::new("upper", Some(0))
        },
        BoneData {
            length: 50.0,
            setup: BoneLocal {
                x: 50.0,
                ..BoneLocal::default()
            },
            ..BoneData::new("lower", Some(1))
        },
    ];
    let skeleton = solve(
        bones,
        path(&[[0.0, 0.0], [0.0, 100.0]], vec![100.0], false, false),
        constraint(vec![1, 2], RotateMode::Chain, at(0.0)),
    );

    let upper = &skeleton.bones[1];
    assert_approx(upper.world_x, 0.0);
    assert_approx(upper.world_y, 0.0);
    assert_approx(upper.world_rotation_x(), 90.0);
    let lower = &skeleton.bones[2];
    assert_approx(lower.world_x, 0.0);
    assert_approx(lower.world_y, 50.0);
    assert_approx(lower.world_rotation_x(), 90.0);
}

#[test]
fn zero_mix_leaves_bones_in_place() {
    let skeleton = solve(
        vec![BoneData {
            setup: BoneLocal {
                x: 7.0,
                ..BoneLocal::default()
            },
            ..BoneData::new("follower", Some(0))
        }],
        path(&SQUARE, vec![100.0, 200.0, 300.0, 400.0], true, false),
        constraint(
            vec![1],
            RotateMode::Tangent,
            PathPose {
                position: 50.0,
                mix_rotate: 0.0,
                mix_x: 0.0,
                mix_y: 0.0,
                ..PathPose::default()
            },
        ),
    );
    assert_approx(skeleton.bones[1].world_x, 7.0);
    assert_approx(skeleton.bones[1].world_y, 0.0);
}

fn straight(length: f32) -> AttachmentData {
    path(&[[0.0, 0.0], [length, 0.0]], vec![length], false, false)
}

fn sized(name: &str, length: f32) -> BoneData {
    BoneData {
        length,
        ..BoneData::new(name, Some(0))
    }
}

#[test]
fn percent_spacing_is_a_fraction_of_path_length() {
    let mut data = constraint(
        vec![1, 2],
        RotateMode::Tangent,
        PathPose {
            position: 10.0,
            spacing: 0.25,
            ..PathPose::default()
        },
    );
    data.spacing_mode = SpacingMode::Percent;
    let skeleton = solve(vec![sized("a", 0.0), sized("b", 0.0)], straight(200.0), data);

    assert_approx(skeleton.bones[1].world_x, 10.0);
    assert_approx(skeleton.bones[2].world_x, 60.0);
    assert_approx(skeleton.bones[2].world_y, 0.0);
}

#[test]
fn proportional_chain_scale_stretches_bones_to_fill_path() {
    let mut data = constraint(
        vec![1, 2],
        RotateMode::ChainScale,
        PathPose {
            spacing: 1.0,
            ..PathPose::default()
        },
    );
    data.spacing_mode = SpacingMode::Proportional;
    let skeleton = solve(vec![sized("a", 30.0), sized("b", 10.0)], straight(200.0), data);

    let a = &skeleton.bones[1];
    assert_approx(a.world_x, 0.0);
    assert_approx(a.world_scale_x(), 5.0);
    assert_approx(a.world_scale_y(), 1.0);
    assert_approx(a.world_rotation_x(), 0.0);
    let b = &skeleton.bones[2];
    assert_approx(b.world_x, 150.0);
    assert_approx(b.world_y, 0.0);
    assert_approx(b.world_scale_x(), 5.0);
}

#[test]
fn chain_scale_follows_mix_rotate() {
    let mut data = constraint(
        vec![1],
        RotateMode::ChainScale,
        PathPose {
            spacing: 1.0,
            mix_rotate: 0.5,
            ..PathPose::default()
        },
    );
    data.spacing_mode = SpacingMode::Proportional;
    let skeleton = solve(vec![sized("a", 40.0)], straight(100.0), data);

    assert_approx(skeleton.bones[1].world_scale_x(), 1.75);
}
