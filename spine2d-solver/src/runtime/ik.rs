use crate::runtime::constraint::Constraint;
use crate::runtime::skeleton::Skeleton;
use crate::{IkConstraintData, Inherit};

const EPSILON: f32 = 1.0e-4;

impl Skeleton {
    pub(crate) fn update_ik(&mut self, index: usize, data: &IkConstraintData) {
        let Some(Constraint::Ik(ik)) = self.constraints.get(index) else {
            return;
        };
        let pose = *ik.posed.applied();
        if pose.mix == 0.0 {
            return;
        }
        let target = &self.bones[data.target];
        let (target_x, target_y) = (target.world_x, target.world_y);

        match data.bones[..] {
            [bone] => {
                self.modify_local(bone);
                self.solve_ik_one(
                    bone,
                    target_x,
                    target_y,
                    pose.compress,
                    pose.stretch,
                    data.uniform,
                    pose.mix,
                );
            }
            [parent, child] => {
                self.modify_local(parent);
                self.modify_local(child);
                self.solve_ik_two(
                    parent,
                    child,
                    target_x,
                    target_y,
                    pose.bend_direction,
                    pose.stretch,
                    data.uniform,
                    pose.softness,
                    pose.mix,
                );
            }
            _ => {}
        }
    }

    /// Rotates one bone so it points at the target.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn solve_ik_one(
        &mut self,
        bone_index: usize,
        target_x: f32,
        target_y: f32,
        compress: bool,
        stretch: bool,
        uniform: bool,
        mix: f32,
    ) {
        let parent = self.parent_world_or_frame(bone_index);
        let (pa, mut pb, pc, mut pd) = (parent.a, parent.b, parent.c, parent.d);
        let scale_x = self.scale_x;
        let scale_y = self.effective_scale_y();

        let bone = &self.bones[bone_index];
        let (world_x, world_y) = (bone.world_x, bone.world_y);
        let local = *bone.applied();
        let length = self.data.bones[bone_index].length;

        let mut rotation_ik = -local.shear_x - local.rotation;
        let (mut tx, mut ty) = match local.inherit {
            Inherit::OnlyTranslation => (
                (target_x - world_x) * signum(scale_x),
                (target_y - world_y) * signum(scale_y),
            ),
            inherit => {
                if inherit == Inherit::NoRotationOrReflection {
                    let s = (pa * pd - pb * pc).abs() / (pa * pa + pc * pc).max(EPSILON);
                    let sa = pa / scale_x;
                    let sc = pc / scale_y;
                    pb = -sc * s * scale_x;
                    pd = sa * s * scale_y;
                    rotation_ik += sc.atan2(sa).to_degrees();
                }
                let x = target_x - parent.world_x;
                let y = target_y - parent.world_y;
                let det = pa * pd - pb * pc;
                if det.abs() <= EPSILON {
                    (0.0, 0.0)
                } else {
                    (
                        (x * pd - y * pb) / det - local.x,
                        (y * pa - x * pc) / det - local.y,
                    )
                }
            }
        };

        rotation_ik += ty.atan2(tx).to_degrees();
        if local.scale_x < 0.0 {
            rotation_ik += 180.0;
        }
        rotation_ik = shortest_rotation(rotation_ik);

        let mut sx = local.scale_x;
        let mut sy = local.scale_y;
        if compress || stretch {
            if matches!(local.inherit, Inherit::NoScale | Inherit::NoScaleOrReflection) {
                tx = target_x - world_x;
                ty = target_y - world_y;
            }
            let b = length * sx;
            if b > EPSILON {
                let dd = tx * tx + ty * ty;
                if (compress && dd < b * b) || (stretch && dd > b * b) {
                    let s = (dd.sqrt() / b - 1.0) * mix + 1.0;
                    sx *= s;
                    if uniform {
                        sy *= s;
                    }
                }
            }
        }

        let applied = self.bones[bone_index].local.applied_mut();
        applied.rotation += rotation_ik * mix;
        applied.scale_x = sx;
        applied.scale_y = sy;
    }

    /// Bends a parent and child bone so the child's tip reaches the target. Both bones must
    /// inherit normally.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn solve_ik_two(
        &mut self,
        parent_index: usize,
        child_index: usize,
        target_x: f32,
        target_y: f32,
        bend_direction: i32,
        stretch: bool,
        uniform: bool,
        softness: f32,
        mix: f32,
    ) {
        use std::f32::consts::PI;

        let parent_local = *self.bones[parent_index].applied();
        let child_local = *self.bones[child_index].applied();
        if parent_local.inherit != Inherit::Normal || child_local.inherit != Inherit::Normal {
            return;
        }

        let (px, py) = (parent_local.x, parent_local.y);
        let mut sx = parent_local.scale_x;
        let mut sy = parent_local.scale_y;
        let mut psx = sx;
        let mut psy = sy;
        let mut csx = child_local.scale_x;
        let mut os1 = 0.0;
        let mut s2 = 1.0;
        if psx < 0.0 {
            psx = -psx;
            os1 = 180.0;
            s2 = -1.0;
        }
        if psy < 0.0 {
            psy = -psy;
            s2 = -s2;
        }
        let mut os2 = 0.0;
        if csx < 0.0 {
            csx = -csx;
            os2 = 180.0;
        }

        let parent = self.bones[parent_index].world();
        let (pa, pb, pc, pd) = (parent.a, parent.b, parent.c, parent.d);
        let cx = child_local.x;
        let u = (psx - psy).abs() <= EPSILON;
        let (cy, cwx, cwy) = if !u || stretch {
            (0.0, pa * cx + parent.world_x, pc * cx + parent.world_y)
        } else {
            let cy = child_local.y;
            (
                cy,
                pa * cx + pb * cy + parent.world_x,
                pc * cx + pd * cy + parent.world_y,
            )
        };

        let pp = self.parent_world_or_frame(parent_index);
        let mut id = pp.a * pp.d - pp.b * pp.c;
        id = if id.abs() <= EPSILON { 0.0 } else { 1.0 / id };
        let x = cwx - pp.world_x;
        let y = cwy - pp.world_y;
        let dx = (x * pp.d - y * pp.b) * id - px;
        let dy = (y * pp.a - x * pp.c) * id - py;
        let l1 = (dx * dx + dy * dy).sqrt();

        if l1 < EPSILON {
            self.solve_ik_one(parent_index, target_x, target_y, false, stretch, false, mix);
            let child = self.bones[child_index].local.applied_mut();
            child.y = cy;
            child.rotation = 0.0;
            return;
        }

        let l2 = self.data.bones[child_index].length * csx;
        let x = target_x - pp.world_x;
        let y = target_y - pp.world_y;
        let mut tx = (x * pp.d - y * pp.b) * id - px;
        let mut ty = (y * pp.a - x * pp.c) * id - py;
        let mut dd = tx * tx + ty * ty;

        if softness != 0.0 {
            let softness = softness.max(0.0) * psx * (csx + 1.0) * 0.5;
            let td = dd.sqrt();
            let sd = td - l1 - l2 * psx + softness;
            if sd > 0.0 {
                let mut p = (sd / (softness * 2.0)).min(1.0) - 1.0;
                p = (sd - softness * (1.0 - p * p)) / td.max(EPSILON);
                tx -= p * tx;
                ty -= p * ty;
                dd = tx * tx + ty * ty;
            }
        }

        let bend = if bend_direction < 0 { -1.0 } else { 1.0 };
        let mut a1;
        let mut a2;

        if u {
            let l2 = l2 * psx;
            let mut cos = (dd - l1 * l1 - l2 * l2) / (2.0 * l1 * l2);
            if cos < -1.0 {
                cos = -1.0;
                a2 = PI * bend;
            } else if cos > 1.0 {
                cos = 1.0;
                a2 = 0.0;
                if stretch {
                    let s = (dd.sqrt() / (l1 + l2) - 1.0) * mix + 1.0;
                    sx *= s;
                    if uniform {
                        sy *= s;
                    }
                }
            } else {
                a2 = cos.acos() * bend;
            }
            let a = l1 + l2 * cos;
            let b = l2 * a2.sin();
            a1 = (ty * a - tx * b).atan2(tx * a + ty * b);
        } else {
            let a = psx * l2;
            let b = psy * l2;
            let aa = a * a;
            let bb = b * b;
            let ta = ty.atan2(tx);
            'solve: {
                let c = bb * l1 * l1 + aa * dd - aa * bb;
                let c1 = -2.0 * bb * l1;
                let c2 = bb - aa;
                let disc = c1 * c1 - 4.0 * c2 * c;
                if disc >= 0.0 {
                    let mut q = disc.sqrt();
                    if c1 < 0.0 {
                        q = -q;
                    }
                    q = -(c1 + q) * 0.5;
                    let r0 = q / c2;
                    let r1 = c / q;
                    let r = if r0.abs() < r1.abs() { r0 } else { r1 };
                    let r0 = dd - r * r;
                    if r0 >= 0.0 {
                        let y = r0.sqrt() * bend;
                        a1 = ta - y.atan2(r);
                        a2 = (y / psy).atan2((r - l1) / psx);
                        break 'solve;
                    }
                }

                let mut min_angle = PI;
                let mut min_x = l1 - a;
                let mut min_dist = min_x * min_x;
                let mut min_y = 0.0;
                let mut max_angle = 0.0;
                let mut max_x = l1 + a;
                let mut max_dist = max_x * max_x;
                let mut max_y = 0.0;
                let c = -a * l1 / (aa - bb);
                if (-1.0..=1.0).contains(&c) {
                    let c = c.acos();
                    let x = a * c.cos() + l1;
                    let y = b * c.sin();
                    let d = x * x + y * y;
                    if d < min_dist {
                        min_angle = c;
                        min_dist = d;
                        min_x = x;
                        min_y = y;
                    }
                    if d > max_dist {
                        max_angle = c;
                        max_dist = d;
                        max_x = x;
                        max_y = y;
                    }
                }
                if dd <= (min_dist + max_dist) * 0.5 {
                    a1 = ta - (min_y * bend).atan2(min_x);
                    a2 = min_angle * bend;
                } else {
                    a1 = ta - (max_y * bend).atan2(max_x);
                    a2 = max_angle * bend;
                }
            }
        }

        let os = cy.atan2(cx) * s2;
        a1 = shortest_rotation((a1 - os).to_degrees() + os1 - parent_local.rotation);
        a2 = shortest_rotation(
            ((a2 + os).to_degrees() - child_local.shear_x) * s2 + os2 - child_local.rotation,
        );

        let parent = self.bones[parent_index].local.applied_mut();
        parent.rotation += a1 * mix;
        parent.scale_x = sx;
        parent.scale_y = sy;
        parent.shear_x = 0.0;
        parent.shear_y = 0.0;

        let child = self.bones[child_index].local.applied_mut();
        child.y = cy;
        child.rotation += a2 * mix;
    }
}

pub(crate) fn signum(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Wraps an angle in degrees to `(-180, 180]`.
pub(crate) fn shortest_rotation(mut degrees: f32) -> f32 {
    degrees = degrees.rem_euclid(360.0);
    if degrees > 180.0 {
        degrees -= 360.0;
    }
    degrees
}
