use crate::runtime::constraint::Constraint;
use crate::runtime::ik::signum;
use crate::runtime::skeleton::Skeleton;
use crate::{
    Animation, BoneLocal, ConstraintData, Curve, IkFrame, IkPose, Keyframe, PathPose, SkeletonData,
    SliderPose, Timeline, TransformPose,
};
use std::sync::Arc;

/// How timeline values are combined with the current values.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MixBlend {
    /// Mix from the setup value. Before the first key the setup value is restored.
    Setup,
    /// Mix from the current value. Before the first key the value mixes toward setup.
    First,
    /// Mix from the current value. Before the first key nothing changes.
    Replace,
    /// Add the timeline value to the current value.
    Add,
}

impl Animation {
    /// Applies every timeline at `time` to the pose values of the skeleton's bones and
    /// constraints. Inactive bones and constraints are skipped.
    pub fn apply(&self, skeleton: &mut Skeleton, time: f32, looped: bool, alpha: f32, blend: MixBlend) {
        self.apply_to(skeleton, time, looped, alpha, blend, false);
    }

    /// Like [`Animation::apply`], but writes the applied values used by the current update.
    pub(crate) fn apply_applied(
        &self,
        skeleton: &mut Skeleton,
        time: f32,
        looped: bool,
        alpha: f32,
        blend: MixBlend,
    ) {
        self.apply_to(skeleton, time, looped, alpha, blend, true);
    }

    fn apply_to(
        &self,
        skeleton: &mut Skeleton,
        mut time: f32,
        looped: bool,
        alpha: f32,
        blend: MixBlend,
        applied: bool,
    ) {
        if looped && self.duration > 0.0 {
            time = time.rem_euclid(self.duration);
        }
        let data = Arc::clone(&skeleton.data);
        for timeline in &self.timelines {
            apply_timeline(timeline, &data, skeleton, time, alpha, blend, applied);
        }
    }
}

fn apply_timeline(
    timeline: &Timeline,
    data: &SkeletonData,
    skeleton: &mut Skeleton,
    time: f32,
    alpha: f32,
    blend: MixBlend,
    applied: bool,
) {
    match timeline {
        Timeline::Rotate { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            relative(&mut pose.rotation, setup.rotation, value, alpha, blend);
        }
        Timeline::Translate { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time);
            relative(&mut pose.x, setup.x, value.map(|[x, _]| x), alpha, blend);
            relative(&mut pose.y, setup.y, value.map(|[_, y]| y), alpha, blend);
        }
        Timeline::TranslateX { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            relative(&mut pose.x, setup.x, value, alpha, blend);
        }
        Timeline::TranslateY { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            relative(&mut pose.y, setup.y, value, alpha, blend);
        }
        Timeline::Scale { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time);
            scale(&mut pose.scale_x, setup.scale_x, value.map(|[x, _]| x), alpha, blend);
            scale(&mut pose.scale_y, setup.scale_y, value.map(|[_, y]| y), alpha, blend);
        }
        Timeline::ScaleX { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            scale(&mut pose.scale_x, setup.scale_x, value, alpha, blend);
        }
        Timeline::ScaleY { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            scale(&mut pose.scale_y, setup.scale_y, value, alpha, blend);
        }
        Timeline::Shear { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time);
            relative(&mut pose.shear_x, setup.shear_x, value.map(|[x, _]| x), alpha, blend);
            relative(&mut pose.shear_y, setup.shear_y, value.map(|[_, y]| y), alpha, blend);
        }
        Timeline::ShearX { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            relative(&mut pose.shear_x, setup.shear_x, value, alpha, blend);
        }
        Timeline::ShearY { bone, frames } => {
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            relative(&mut pose.shear_y, setup.shear_y, value, alpha, blend);
        }
        Timeline::Inherit { bone, frames } => {
            let Some(first) = frames.first() else {
                return;
            };
            let Some((pose, setup)) = bone_target(data, skeleton, *bone, applied) else {
                return;
            };
            if time < first.time {
                if matches!(blend, MixBlend::Setup | MixBlend::First) {
                    pose.inherit = setup.inherit;
                }
                return;
            }
            let index = frames.partition_point(|f| f.time <= time);
            pose.inherit = frames[index.saturating_sub(1)].inherit;
        }
        Timeline::Ik { constraint, frames } => {
            let Some((pose, setup)) = ik_target(data, skeleton, *constraint, applied) else {
                return;
            };
            apply_ik(pose, &setup, frames, time, alpha, blend);
        }
        Timeline::Transform { constraint, frames } => {
            let Some((pose, setup)) = transform_target(data, skeleton, *constraint, applied) else {
                return;
            };
            let value = sample(frames, time);
            let fields = [
                (&mut pose.mix_rotate, setup.mix_rotate),
                (&mut pose.mix_x, setup.mix_x),
                (&mut pose.mix_y, setup.mix_y),
                (&mut pose.mix_scale_x, setup.mix_scale_x),
                (&mut pose.mix_scale_y, setup.mix_scale_y),
                (&mut pose.mix_shear_y, setup.mix_shear_y),
            ];
            for (i, (current, setup)) in fields.into_iter().enumerate() {
                absolute(current, setup, value.map(|v| v[i]), alpha, blend);
            }
        }
        Timeline::PathPosition { constraint, frames } => {
            let Some((pose, setup)) = path_target(data, skeleton, *constraint, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            absolute(&mut pose.position, setup.position, value, alpha, blend);
        }
        Timeline::PathSpacing { constraint, frames } => {
            let Some((pose, setup)) = path_target(data, skeleton, *constraint, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            absolute(&mut pose.spacing, setup.spacing, value, alpha, blend);
        }
        Timeline::PathMix { constraint, frames } => {
            let Some((pose, setup)) = path_target(data, skeleton, *constraint, applied) else {
                return;
            };
            let value = sample(frames, time);
            absolute(&mut pose.mix_rotate, setup.mix_rotate, value.map(|v| v[0]), alpha, blend);
            absolute(&mut pose.mix_x, setup.mix_x, value.map(|v| v[1]), alpha, blend);
            absolute(&mut pose.mix_y, setup.mix_y, value.map(|v| v[2]), alpha, blend);
        }
        Timeline::SliderTime { constraint, frames } => {
            let Some((pose, setup)) = slider_target(data, skeleton, *constraint, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            absolute(&mut pose.time, setup.time, value, alpha, blend);
        }
        Timeline::SliderMix { constraint, frames } => {
            let Some((pose, setup)) = slider_target(data, skeleton, *constraint, applied) else {
                return;
            };
            let value = sample(frames, time).map(|[v]| v);
            absolute(&mut pose.mix, setup.mix, value, alpha, blend);
        }
    }
}

fn apply_ik(pose: &mut IkPose, setup: &IkPose, frames: &[IkFrame], time: f32, alpha: f32, blend: MixBlend) {
    let Some(first) = frames.first() else {
        return;
    };
    if time < first.time {
        match blend {
            MixBlend::Setup => *pose = *setup,
            MixBlend::First => {
                pose.mix += (setup.mix - pose.mix) * alpha;
                pose.softness += (setup.softness - pose.softness) * alpha;
                pose.bend_direction = setup.bend_direction;
                pose.compress = setup.compress;
                pose.stretch = setup.stretch;
            }
            MixBlend::Replace | MixBlend::Add => {}
        }
        return;
    }

    let index = frames.partition_point(|f| f.time <= time);
    let frame = &frames[index.saturating_sub(1)];
    let (mix, softness) = match frames.get(index) {
        Some(next) => (
            curve_value(frame.curves[0], time, frame.time, frame.mix, next.time, next.mix),
            curve_value(frame.curves[1], time, frame.time, frame.softness, next.time, next.softness),
        ),
        None => (frame.mix, frame.softness),
    };
    if blend == MixBlend::Setup {
        pose.mix = setup.mix + (mix - setup.mix) * alpha;
        pose.softness = setup.softness + (softness - setup.softness) * alpha;
    } else {
        pose.mix += (mix - pose.mix) * alpha;
        pose.softness += (softness - pose.softness) * alpha;
    }
    pose.bend_direction = frame.bend_direction;
    pose.compress = frame.compress;
    pose.stretch = frame.stretch;
}

fn bone_target<'a>(
    data: &SkeletonData,
    skeleton: &'a mut Skeleton,
    index: usize,
    applied: bool,
) -> Option<(&'a mut BoneLocal, BoneLocal)> {
    let setup = data.bones.get(index)?.setup;
    let bone = skeleton.bones.get_mut(index)?;
    if !bone.active {
        return None;
    }
    Some((bone.local.target_mut(applied), setup))
}

fn ik_target<'a>(
    data: &SkeletonData,
    skeleton: &'a mut Skeleton,
    index: usize,
    applied: bool,
) -> Option<(&'a mut IkPose, IkPose)> {
    match (skeleton.constraints.get_mut(index)?, data.constraints.get(index)?) {
        (Constraint::Ik(c), ConstraintData::Ik(d)) if c.active => {
            Some((c.posed.target_mut(applied), d.setup))
        }
        _ => None,
    }
}

fn transform_target<'a>(
    data: &SkeletonData,
    skeleton: &'a mut Skeleton,
    index: usize,
    applied: bool,
) -> Option<(&'a mut TransformPose, TransformPose)> {
    match (skeleton.constraints.get_mut(index)?, data.constraints.get(index)?) {
        (Constraint::Transform(c), ConstraintData::Transform(d)) if c.active => {
            Some((c.posed.target_mut(applied), d.setup))
        }
        _ => None,
    }
}

fn path_target<'a>(
    data: &SkeletonData,
    skeleton: &'a mut Skeleton,
    index: usize,
    applied: bool,
) -> Option<(&'a mut PathPose, PathPose)> {
    match (skeleton.constraints.get_mut(index)?, data.constraints.get(index)?) {
        (Constraint::Path(c), ConstraintData::Path(d)) if c.active => {
            Some((c.posed.target_mut(applied), d.setup))
        }
        _ => None,
    }
}

fn slider_target<'a>(
    data: &SkeletonData,
    skeleton: &'a mut Skeleton,
    index: usize,
    applied: bool,
) -> Option<(&'a mut SliderPose, SliderPose)> {
    match (skeleton.constraints.get_mut(index)?, data.constraints.get(index)?) {
        (Constraint::Slider(c), ConstraintData::Slider(d)) if c.active => {
            Some((c.posed.target_mut(applied), d.setup))
        }
        _ => None,
    }
}

/// Mixes a value keyed relative to setup. `None` means `time` is before the first key.
fn relative(current: &mut f32, setup: f32, value: Option<f32>, alpha: f32, blend: MixBlend) {
    let Some(value) = value else {
        before_first(current, setup, alpha, blend);
        return;
    };
    match blend {
        MixBlend::Setup => *current = setup + value * alpha,
        MixBlend::First | MixBlend::Replace => *current += (value + setup - *current) * alpha,
        MixBlend::Add => *current += value * alpha,
    }
}

/// Mixes a scale keyed as a multiple of setup, keeping the sign of the keyed value.
fn scale(current: &mut f32, setup: f32, value: Option<f32>, alpha: f32, blend: MixBlend) {
    let Some(value) = value else {
        before_first(current, setup, alpha, blend);
        return;
    };
    let x = value * setup;
    if alpha >= 1.0 {
        *current = match blend {
            MixBlend::Add => *current + x - setup,
            _ => x,
        };
        return;
    }
    *current = match blend {
        MixBlend::Setup => {
            let from = setup.abs() * signum(x);
            from + (x - from) * alpha
        }
        MixBlend::First | MixBlend::Replace => {
            let from = current.abs() * signum(x);
            from + (x - from) * alpha
        }
        MixBlend::Add => *current + (x - setup) * alpha,
    };
}

/// Mixes a value keyed as-is.
fn absolute(current: &mut f32, setup: f32, value: Option<f32>, alpha: f32, blend: MixBlend) {
    let Some(value) = value else {
        before_first(current, setup, alpha, blend);
        return;
    };
    match blend {
        MixBlend::Setup => *current = setup + (value - setup) * alpha,
        MixBlend::First | MixBlend::Replace => *current += (value - *current) * alpha,
        MixBlend::Add => *current += value * alpha,
    }
}

fn before_first(current: &mut f32, setup: f32, alpha: f32, blend: MixBlend) {
    match blend {
        MixBlend::Setup => *current = setup,
        MixBlend::First => *current += (setup - *current) * alpha,
        MixBlend::Replace | MixBlend::Add => {}
    }
}

/// Samples keyed values at `time`. Returns `None` before the first key or without keys.
fn sample<const N: usize>(frames: &[Keyframe<N>], time: f32) -> Option<[f32; N]> {
    let first = frames.first()?;
    if time < first.time {
        return None;
    }
    let index = frames.partition_point(|f| f.time <= time);
    let prev = &frames[index.saturating_sub(1)];
    let Some(next) = frames.get(index) else {
        return Some(prev.values);
    };
    Some(std::array::from_fn(|i| {
        curve_value(prev.curves[i], time, prev.time, prev.values[i], next.time, next.values[i])
    }))
}

fn curve_value(curve: Curve, time: f32, time1: f32, value1: f32, time2: f32, value2: f32) -> f32 {
    let denom = time2 - time1;
    if denom.abs() <= 1.0e-12 {
        return value2;
    }
    match curve {
        Curve::Linear => value1 + (value2 - value1) * (time - time1) / denom,
        Curve::Stepped => value1,
        Curve::Bezier { cx1, cy1, cx2, cy2 } => {
            bezier_value(time, [time1, value1], [cx1, cy1], [cx2, cy2], [time2, value2])
        }
    }
}

/// Evaluates a bezier segment by walking its forward-difference table.
fn bezier_value(time: f32, p1: [f32; 2], c1: [f32; 2], c2: [f32; 2], p2: [f32; 2]) -> f32 {
    const BEZIER_SIZE: usize = 18;

    let tmpx = (p1[0] - c1[0] * 2.0 + c2[0]) * 0.03;
    let tmpy = (p1[1] - c1[1] * 2.0 + c2[1]) * 0.03;
    let dddx = ((c1[0] - c2[0]) * 3.0 - p1[0] + p2[0]) * 0.006;
    let dddy = ((c1[1] - c2[1]) * 3.0 - p1[1] + p2[1]) * 0.006;
    let mut ddx = tmpx * 2.0 + dddx;
    let mut ddy = tmpy * 2.0 + dddy;
    let mut dx = (c1[0] - p1[0]) * 0.3 + tmpx + dddx * 0.166_666_67;
    let mut dy = (c1[1] - p1[1]) * 0.3 + tmpy + dddy * 0.166_666_67;
    let mut x = p1[0] + dx;
    let mut y = p1[1] + dy;

    let mut points = [0.0f32; BEZIER_SIZE];
    for point in points.chunks_exact_mut(2) {
        point[0] = x;
        point[1] = y;
        dx += ddx;
        dy += ddy;
        ddx += dddx;
        ddy += dddy;
        x += dx;
        y += dy;
    }

    let mut from = p1;
    for point in points.chunks_exact(2) {
        if point[0] >= time {
            return lerp_at(time, from, [point[0], point[1]]);
        }
        from = [point[0], point[1]];
    }
    lerp_at(time, from, p2)
}

fn lerp_at(time: f32, from: [f32; 2], to: [f32; 2]) -> f32 {
    let denom = to[0] - from[0];
    if denom.abs() <= 1.0e-12 {
        return from[1];
    }
    from[1] + (time - from[0]) / denom * (to[1] - from[1])
}
