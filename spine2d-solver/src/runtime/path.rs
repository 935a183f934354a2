use crate::runtime::constraint::{Constraint, PathScratch};
use crate::runtime::skeleton::{Skeleton, current_attachment};
use crate::runtime::transform::wrap_pi;
use crate::{
    AttachmentData, PathAttachmentData, PathConstraintData, PathPose, PositionMode, RotateMode,
    SpacingMode,
};
use std::sync::Arc;

const EPSILON: f32 = 1.0e-5;

/// Which spline segment the world buffer currently holds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Segment {
    None,
    Before,
    After,
    Curve(usize),
}

impl Skeleton {
    pub(crate) fn update_path(&mut self, index: usize, data: &PathConstraintData) {
        let (pose, mut scratch) = match self.constraints.get_mut(index) {
            Some(Constraint::Path(c)) => (*c.posed.applied(), std::mem::take(&mut c.scratch)),
            _ => return,
        };
        if pose.mix_rotate != 0.0 || pose.mix_x != 0.0 || pose.mix_y != 0.0 {
            self.solve_path(data, &pose, &mut scratch);
        }
        if let Some(Constraint::Path(c)) = self.constraints.get_mut(index) {
            c.scratch = scratch;
        }
    }

    fn solve_path(&mut self, data: &PathConstraintData, pose: &PathPose, scratch: &mut PathScratch) {
        let skeleton_data = Arc::clone(&self.data);
        let Some(AttachmentData::Path(path)) = current_attachment(
            &skeleton_data,
            self.skin(),
            &self.slots[data.slot],
            data.slot,
        ) else {
            return;
        };

        let bone_count = data.bones.len();
        if bone_count == 0 {
            return;
        }
        let tangents = data.rotate_mode == RotateMode::Tangent;
        let scale = data.rotate_mode == RotateMode::ChainScale;
        let spaces_count = if tangents { bone_count } else { bone_count + 1 };

        self.compute_spaces(data, pose, scratch, spaces_count, scale);
        self.compute_path_positions(data, path, pose, scratch, spaces_count, tangents);
        let PathScratch {
            spaces,
            lengths,
            positions,
            ..
        } = scratch;
        if positions.len() < 2 {
            return;
        }

        let mut bone_x = positions[0];
        let mut bone_y = positions[1];
        let mut offset_rotation = data.offset_rotation;
        let tip = if offset_rotation == 0.0 {
            data.rotate_mode == RotateMode::Chain
        } else {
            let slot_bone = &self.bones[self.slots[data.slot].bone];
            let reflect = slot_bone.a * slot_bone.d - slot_bone.b * slot_bone.c > 0.0;
            offset_rotation = offset_rotation.to_radians() * if reflect { 1.0 } else { -1.0 };
            false
        };

        let mut p = 3;
        for (i, &bone_index) in data.bones.iter().enumerate() {
            self.modify_world(bone_index);
            let length = skeleton_data.bones[bone_index].length;
            let bone = &mut self.bones[bone_index];
            bone.world_x += (bone_x - bone.world_x) * pose.mix_x;
            bone.world_y += (bone_y - bone.world_y) * pose.mix_y;

            let x = positions[p];
            let y = positions[p + 1];
            let dx = x - bone_x;
            let dy = y - bone_y;
            if scale {
                let chain_length = lengths[i];
                if chain_length >= EPSILON {
                    let s = ((dx * dx + dy * dy).sqrt() / chain_length - 1.0) * pose.mix_rotate + 1.0;
                    bone.a *= s;
                    bone.c *= s;
                }
            }
            bone_x = x;
            bone_y = y;

            if pose.mix_rotate > 0.0 {
                let (a, b, c, d) = (bone.a, bone.b, bone.c, bone.d);
                let mut r = if tangents {
                    positions[p - 1]
                } else if spaces[i + 1] < EPSILON {
                    positions[p + 2]
                } else {
                    dy.atan2(dx)
                };
                r -= c.atan2(a);
                if tip {
                    let (sin, cos) = r.sin_cos();
                    bone_x += (length * (cos * a - sin * c) - dx) * pose.mix_rotate;
                    bone_y += (length * (sin * a + cos * c) - dy) * pose.mix_rotate;
                } else {
                    r += offset_rotation;
                }
                r = wrap_pi(r) * pose.mix_rotate;
                let (sin, cos) = r.sin_cos();
                bone.a = cos * a - sin * c;
                bone.b = cos * b - sin * d;
                bone.c = sin * a + cos * c;
                bone.d = sin * b + cos * d;
            }
            p += 3;
        }
    }

    /// Fills the distance between consecutive bones along the path, and for chain scale the
    /// current world length of each bone.
    fn compute_spaces(
        &self,
        data: &PathConstraintData,
        pose: &PathPose,
        scratch: &mut PathScratch,
        spaces_count: usize,
        scale: bool,
    ) {
        let spaces = &mut scratch.spaces;
        let lengths = &mut scratch.lengths;
        spaces.clear();
        spaces.resize(spaces_count, 0.0);
        lengths.clear();
        if scale {
            lengths.resize(data.bones.len(), 0.0);
        }
        let spacing = pose.spacing;

        let world_length = |i: usize| -> (f32, f32) {
            let bone_index = data.bones[i];
            let setup_length = self.data.bones[bone_index].length;
            let bone = &self.bones[bone_index];
            let x = setup_length * bone.a;
            let y = setup_length * bone.c;
            (setup_length, (x * x + y * y).sqrt())
        };

        match data.spacing_mode {
            SpacingMode::Percent => {
                if scale {
                    for i in 0..spaces_count - 1 {
                        lengths[i] = world_length(i).1;
                    }
                }
                for space in spaces.iter_mut().skip(1) {
                    *space = spacing;
                }
            }
            SpacingMode::Proportional => {
                let mut sum = 0.0;
                for i in 0..spaces_count - 1 {
                    let (setup_length, length) = world_length(i);
                    if setup_length < EPSILON {
                        if scale {
                            lengths[i] = 0.0;
                        }
                        spaces[i + 1] = spacing;
                    } else {
                        if scale {
                            lengths[i] = length;
                        }
                        spaces[i + 1] = length;
                        sum += length;
                    }
                }
                if sum > 0.0 {
                    let factor = spaces_count as f32 / sum * spacing;
                    for space in spaces.iter_mut().skip(1) {
                        *space *= factor;
                    }
                }
            }
            SpacingMode::Length | SpacingMode::Fixed => {
                let length_spacing = data.spacing_mode == SpacingMode::Length;
                for i in 0..spaces_count - 1 {
                    let (setup_length, length) = world_length(i);
                    if setup_length < EPSILON {
                        if scale {
                            lengths[i] = 0.0;
                        }
                        spaces[i + 1] = spacing;
                    } else {
                        if scale {
                            lengths[i] = length;
                        }
                        let space = if length_spacing {
                            setup_length + spacing
                        } else {
                            spacing
                        };
                        spaces[i + 1] = space * length / setup_length;
                    }
                }
            }
        }
    }

    /// Samples the spline once per space into `scratch.positions` as `[x, y, rotation]`
    /// triples, plus a trailing position.
    fn compute_path_positions(
        &self,
        data: &PathConstraintData,
        path: &PathAttachmentData,
        pose: &PathPose,
        scratch: &mut PathScratch,
        spaces_count: usize,
        tangents: bool,
    ) {
        let PathScratch {
            spaces,
            positions,
            world,
            curves,
            segments,
            ..
        } = scratch;
        let slot = data.slot;
        let closed = path.closed;
        let mut vertices_length = path.vertices.len() * 2;
        positions.clear();
        if vertices_length < 6 {
            return;
        }
        let mut position = pose.position;

        if !path.constant_speed {
            let lengths = path.lengths.as_slice();
            let Some(curve_count) = (vertices_length / 6).checked_sub(if closed { 1 } else { 2 })
            else {
                return;
            };
            let Some(&path_length) = lengths.get(curve_count) else {
                return;
            };
            positions.resize(spaces_count * 3 + 2, 0.0);
            let output = positions.as_mut_slice();
            if data.position_mode == PositionMode::Percent {
                position *= path_length;
            }
            let multiplier = match data.spacing_mode {
                SpacingMode::Percent => path_length,
                SpacingMode::Proportional => path_length / spaces_count as f32,
                SpacingMode::Length | SpacingMode::Fixed => 1.0,
            };

            world.clear();
            world.resize(8, 0.0);
            let mut segment = Segment::None;
            let mut curve = 0;
            for i in 0..spaces_count {
                let space = spaces[i] * multiplier;
                position += space;
                let mut p = position;

                if closed {
                    p = p.rem_euclid(path_length);
                    curve = 0;
                } else if p < 0.0 {
                    if segment != Segment::Before {
                        segment = Segment::Before;
                        self.compute_world_vertices(slot, &path.vertices, 2, 4, world, 0, 2);
                    }
                    add_before_position(p, world, 0, output, i * 3);
                    continue;
                } else if p > path_length {
                    if segment != Segment::After {
                        segment = Segment::After;
                        self.compute_world_vertices(
                            slot,
                            &path.vertices,
                            vertices_length - 6,
                            4,
                            world,
                            0,
                            2,
                        );
                    }
                    add_after_position(p - path_length, world, 0, output, i * 3);
                    continue;
                }

                p = locate(lengths, &mut curve, p);

                if segment != Segment::Curve(curve) {
                    segment = Segment::Curve(curve);
                    if closed && curve == curve_count {
                        self.compute_world_vertices(
                            slot,
                            &path.vertices,
                            vertices_length - 4,
                            4,
                            world,
                            0,
                            2,
                        );
                        self.compute_world_vertices(slot, &path.vertices, 0, 4, world, 4, 2);
                    } else {
                        self.compute_world_vertices(
                            slot,
                            &path.vertices,
                            curve * 6 + 2,
                            8,
                            world,
                            0,
                            2,
                        );
                    }
                }
                add_curve_position(
                    p,
                    world,
                    output,
                    i * 3,
                    tangents || (i > 0 && space.abs() < EPSILON),
                );
            }
            return;
        }

        let mut curve_count = vertices_length / 6;
        if !closed {
            curve_count -= 1;
        }
        if curve_count == 0 {
            return;
        }
        positions.resize(spaces_count * 3 + 2, 0.0);
        let output = positions.as_mut_slice();

        world.clear();
        if closed {
            vertices_length += 2;
            world.resize(vertices_length, 0.0);
            self.compute_world_vertices(slot, &path.vertices, 2, vertices_length - 4, world, 0, 2);
            self.compute_world_vertices(
                slot,
                &path.vertices,
                0,
                2,
                world,
                vertices_length - 4,
                2,
            );
            world[vertices_length - 2] = world[0];
            world[vertices_length - 1] = world[1];
        } else {
            vertices_length -= 4;
            world.resize(vertices_length, 0.0);
            self.compute_world_vertices(slot, &path.vertices, 2, vertices_length, world, 0, 2);
        }

        curves.clear();
        curves.resize(curve_count, 0.0);
        let mut path_length = 0.0;
        for (c, curve) in curves.iter_mut().enumerate() {
            let w = c * 6;
            path_length += curve_length_coarse(&world[w..w + 8]);
            *curve = path_length;
        }

        if data.position_mode == PositionMode::Percent {
            position *= path_length;
        }
        let multiplier = match data.spacing_mode {
            SpacingMode::Percent => path_length,
            SpacingMode::Proportional => path_length / spaces_count as f32,
            SpacingMode::Length | SpacingMode::Fixed => 1.0,
        };

        let mut current = Segment::None;
        let mut curve = 0;
        let mut segment = 0;
        let mut curve_length = 0.0;
        for i in 0..spaces_count {
            let space = spaces[i] * multiplier;
            position += space;
            let mut p = position;

            if closed {
                p = p.rem_euclid(path_length);
                curve = 0;
            } else if p < 0.0 {
                add_before_position(p, world, 0, output, i * 3);
                continue;
            } else if p > path_length {
                add_after_position(p - path_length, world, vertices_length - 4, output, i * 3);
                continue;
            }

            p = locate(curves, &mut curve, p);

            let w = curve * 6;
            let control = &world[w..w + 8];
            if current != Segment::Curve(curve) {
                current = Segment::Curve(curve);
                curve_length = fill_segments(control, segments);
                segment = 0;
            }

            p *= curve_length;
            loop {
                let length = segments[segment];
                if p > length && segment < segments.len() - 1 {
                    segment += 1;
                    continue;
                }
                if segment == 0 {
                    p /= length.max(EPSILON);
                } else {
                    let prev = segments[segment - 1];
                    p = segment as f32 + (p - prev) / (length - prev).max(EPSILON);
                }
                break;
            }
            add_curve_position(
                p * 0.1,
                control,
                output,
                i * 3,
                tangents || (i > 0 && space.abs() < EPSILON),
            );
        }
    }
}

/// Finds the curve containing distance `p` in cumulative `lengths`, starting at `curve`, and
/// returns `p` normalized to that curve.
fn locate(lengths: &[f32], curve: &mut usize, p: f32) -> f32 {
    while *curve < lengths.len() - 1 && p > lengths[*curve] {
        *curve += 1;
    }
    let length = lengths[*curve];
    if *curve == 0 {
        p / length.max(EPSILON)
    } else {
        let prev = lengths[*curve - 1];
        (p - prev) / (length - prev).max(EPSILON)
    }
}

/// Approximates a cubic curve's length by forward differencing in 4 steps.
fn curve_length_coarse(control: &[f32]) -> f32 {
    let [x1, y1, cx1, cy1, cx2, cy2, x2, y2] = control_points(control);
    let tmpx = (x1 - cx1 * 2.0 + cx2) * 0.1875;
    let tmpy = (y1 - cy1 * 2.0 + cy2) * 0.1875;
    let dddfx = ((cx1 - cx2) * 3.0 - x1 + x2) * 0.09375;
    let dddfy = ((cy1 - cy2) * 3.0 - y1 + y2) * 0.09375;
    let mut ddfx = tmpx * 2.0 + dddfx;
    let mut ddfy = tmpy * 2.0 + dddfy;
    let mut dfx = (cx1 - x1) * 0.75 + tmpx + dddfx * 0.166_666_67;
    let mut dfy = (cy1 - y1) * 0.75 + tmpy + dddfy * 0.166_666_67;

    let mut length = (dfx * dfx + dfy * dfy).sqrt();
    dfx += ddfx;
    dfy += ddfy;
    ddfx += dddfx;
    ddfy += dddfy;
    length += (dfx * dfx + dfy * dfy).sqrt();
    dfx += ddfx;
    dfy += ddfy;
    length += (dfx * dfx + dfy * dfy).sqrt();
    dfx += ddfx + dddfx;
    dfy += ddfy + dddfy;
    length + (dfx * dfx + dfy * dfy).sqrt()
}

/// Fills cumulative lengths of 10 equal-parameter segments of a cubic curve and returns the
/// total.
fn fill_segments(control: &[f32], segments: &mut [f32; 10]) -> f32 {
    let [x1, y1, cx1, cy1, cx2, cy2, x2, y2] = control_points(control);
    let tmpx = (x1 - cx1 * 2.0 + cx2) * 0.03;
    let tmpy = (y1 - cy1 * 2.0 + cy2) * 0.03;
    let dddfx = ((cx1 - cx2) * 3.0 - x1 + x2) * 0.006;
    let dddfy = ((cy1 - cy2) * 3.0 - y1 + y2) * 0.006;
    let mut ddfx = tmpx * 2.0 + dddfx;
    let mut ddfy = tmpy * 2.0 + dddfy;
    let mut dfx = (cx1 - x1) * 0.3 + tmpx + dddfx * 0.166_666_67;
    let mut dfy = (cy1 - y1) * 0.3 + tmpy + dddfy * 0.166_666_67;

    let mut length = (dfx * dfx + dfy * dfy).sqrt();
    segments[0] = length;
    for segment in segments.iter_mut().take(8).skip(1) {
        dfx += ddfx;
        dfy += ddfy;
        ddfx += dddfx;
        ddfy += dddfy;
        length += (dfx * dfx + dfy * dfy).sqrt();
        *segment = length;
    }
    dfx += ddfx;
    dfy += ddfy;
    length += (dfx * dfx + dfy * dfy).sqrt();
    segments[8] = length;
    dfx += ddfx + dddfx;
    dfy += ddfy + dddfy;
    length += (dfx * dfx + dfy * dfy).sqrt();
    segments[9] = length;
    length
}

fn control_points(control: &[f32]) -> [f32; 8] {
    let mut points = [0.0; 8];
    let n = control.len().min(8);
    points[..n].copy_from_slice(&control[..n]);
    points
}

fn add_before_position(p: f32, world: &[f32], i: usize, output: &mut [f32], o: usize) {
    let x1 = world[i];
    let y1 = world[i + 1];
    let r = (world[i + 3] - y1).atan2(world[i + 2] - x1);
    output[o] = x1 + p * r.cos();
    output[o + 1] = y1 + p * r.sin();
    output[o + 2] = r;
}

fn add_after_position(p: f32, world: &[f32], i: usize, output: &mut [f32], o: usize) {
    let x1 = world[i + 2];
    let y1 = world[i + 3];
    let r = (y1 - world[i + 1]).atan2(x1 - world[i]);
    output[o] = x1 + p * r.cos();
    output[o + 1] = y1 + p * r.sin();
    output[o + 2] = r;
}

fn add_curve_position(p: f32, control: &[f32], output: &mut [f32], o: usize, tangents: bool) {
    let [x1, y1, cx1, cy1, cx2, cy2, x2, y2] = control_points(control);
    if p < EPSILON || p.is_nan() {
        output[o] = x1;
        output[o + 1] = y1;
        output[o + 2] = (cy1 - y1).atan2(cx1 - x1);
        return;
    }
    let tt = p * p;
    let ttt = tt * p;
    let u = 1.0 - p;
    let uu = u * u;
    let uuu = uu * u;
    let ut = u * p;
    let ut3 = ut * 3.0;
    let uut3 = u * ut3;
    let utt3 = ut3 * p;
    let x = x1 * uuu + cx1 * uut3 + cx2 * utt3 + x2 * ttt;
    let y = y1 * uuu + cy1 * uut3 + cy2 * utt3 + y2 * ttt;
    output[o] = x;
    output[o + 1] = y;
    if tangents {
        output[o + 2] = if p < 0.001 {
            (cy1 - y1).atan2(cx1 - x1)
        } else {
            (y - (y1 * uu + cy1 * ut * 2.0 + cy2 * tt)).atan2(x - (x1 * uu + cx1 * ut * 2.0 + cx2 * tt))
        };
    }
}
