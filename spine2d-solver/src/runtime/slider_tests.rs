use crate::{
    Animation, BoneData, BoneLocal, Constraint, ConstraintData, Keyframe, Skeleton, SkeletonData,
    SliderConstraintData, SliderDriver, SliderPose, Timeline, TransformProperty,
};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn knob_driver() -> SliderDriver {
    SliderDriver {
        bone: 1,
        property: TransformProperty::X,
        property_offset: 0.0,
        offset: 0.0,
        scale: 0.1,
        local: false,
    }
}

fn slider(driver: Option<SliderDriver>) -> SliderConstraintData {
    SliderConstraintData {
        name: "dial".to_string(),
        skin_required: false,
        animation: 0,
        additive: false,
        looped: false,
        driver,
        setup: SliderPose::default(),
    }
}

/// root, `knob` at `knob_x`, `arm` rotated by `arm_rotation`. The slider's animation turns
/// `arm` from 0 to 90 degrees over one second.
fn dial(knob_x: f32, arm_rotation: f32, data: SliderConstraintData) -> Skeleton {
    let turn = Animation::new(
        "turn",
        1.0,
        vec![Timeline::Rotate {
            bone: 2,
            frames: vec![Keyframe::linear(0.0, [0.0]), Keyframe::linear(1.0, [90.0])],
        }],
    );
    let data = Arc::new(SkeletonData {
        bones: vec![
            BoneData::new("root", None),
            BoneData {
                setup: BoneLocal {
                    x: knob_x,
                    ..BoneLocal::default()
                },
                ..BoneData::new("knob", Some(0))
            },
            BoneData {
                setup: BoneLocal {
                    rotation: arm_rotation,
                    ..BoneLocal::default()
                },
                ..BoneData::new("arm", Some(0))
            },
        ],
        constraints: vec![ConstraintData::Slider(data)],
        animations: vec![turn],
        ..SkeletonData::default()
    });
    let mut skeleton = Skeleton::new(data).unwrap();
    skeleton.update_world_transform();
    skeleton
}

fn slider_time(skeleton: &Skeleton) -> f32 {
    match &skeleton.constraints[0] {
        Constraint::Slider(c) => c.applied().time,
        _ => panic!("expected a slider constraint"),
    }
}

#[test]
fn driver_bone_sets_animation_time() {
    let skeleton = dial(5.0, 0.0, slider(Some(knob_driver())));

    assert_approx(slider_time(&skeleton), 0.5);
    let arm = &skeleton.bones[2];
    assert_approx(arm.applied().rotation, 45.0);
    assert_approx(arm.pose().rotation, 0.0);
    assert_approx(arm.world_rotation_x(), 45.0);
}

#[test]
fn moving_the_driver_updates_the_pose() {
    let mut skeleton = dial(5.0, 0.0, slider(Some(knob_driver())));
    skeleton.bones[1].pose_mut().x = 10.0;
    skeleton.update_world_transform();
    assert_approx(skeleton.bones[2].world_rotation_x(), 90.0);
}

#[test]
fn time_is_clamped_at_zero_without_looping() {
    let skeleton = dial(-5.0, 0.0, slider(Some(knob_driver())));
    assert_approx(slider_time(&skeleton), 0.0);
    assert_approx(skeleton.bones[2].applied().rotation, 0.0);
}

#[test]
fn looped_time_wraps_around_duration() {
    let mut data = slider(Some(knob_driver()));
    data.looped = true;
    let skeleton = dial(15.0, 0.0, data);
    assert_approx(skeleton.bones[2].applied().rotation, 45.0);
}

#[test]
fn pose_time_is_used_without_driver() {
    let mut skeleton = dial(0.0, 0.0, slider(None));
    assert_approx(skeleton.bones[2].applied().rotation, 0.0);

    if let Constraint::Slider(c) = &mut skeleton.constraints[0] {
        c.pose_mut().time = 1.0;
    }
    skeleton.update_world_transform();
    assert_approx(skeleton.bones[2].applied().rotation, 90.0);
}

#[test]
fn additive_slider_adds_to_current_rotation() {
    let mut data = slider(Some(knob_driver()));
    data.additive = true;
    let skeleton = dial(5.0, 10.0, data);
    assert_approx(skeleton.bones[2].applied().rotation, 55.0);
}

#[test]
fn slider_mix_scales_the_result() {
    let mut data = slider(Some(knob_driver()));
    data.setup.mix = 0.5;
    let skeleton = dial(5.0, 0.0, data);
    assert_approx(skeleton.bones[2].applied().rotation, 22.5);

    data = slider(Some(knob_driver()));
    data.setup.mix = 0.0;
    let skeleton = dial(5.0, 0.0, data);
    assert_approx(skeleton.bones[2].applied().rotation, 0.0);
}
