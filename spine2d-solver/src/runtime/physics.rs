use crate::runtime::constraint::{Constraint, Physics, PhysicsState};
use crate::runtime::skeleton::Skeleton;
use crate::PhysicsConstraintData;

use std::f32::consts::TAU;

impl Skeleton {
    pub(crate) fn update_physics(&mut self, index: usize, data: &PhysicsConstraintData, physics: Physics) {
        let time = self.time();
        let (pose, mut state) = match self.constraints.get_mut(index) {
            Some(Constraint::Physics(c)) => {
                if c.posed.applied().mix == 0.0 {
                    return;
                }
                if physics == Physics::Reset {
                    c.reset(time);
                }
                (*c.posed.applied(), c.state)
            }
            _ => return,
        };
        let mix = pose.mix;
        if physics == Physics::None {
            return;
        }

        let x = data.x > 0.0;
        let y = data.y > 0.0;
        let rotate_or_shear_x = data.rotate > 0.0 || data.shear_x > 0.0;
        let scale_x = data.scale_x > 0.0;
        let bone_index = data.bone;
        let length = self.data.bones[bone_index].length;
        let step = data.step;
        let mut z = 0.0f32;

        match physics {
            Physics::Pose => {
                z = (1.0 - state.remaining / step).max(0.0);
                let bone = &mut self.bones[bone_index];
                if x {
                    bone.world_x += (state.x.offset - state.x.lag * z) * mix * data.x;
                }
                if y {
                    bone.world_y += (state.y.offset - state.y.lag * z) * mix * data.y;
                }
            }
            _ => {
                let delta = (time - state.last_time).max(0.0);
                let previous_remaining = state.remaining;
                state.remaining += delta;
                state.last_time = time;

                let (mut bx, mut by) = {
                    let bone = &self.bones[bone_index];
                    (bone.world_x, bone.world_y)
                };
                if state.reset {
                    state.reset = false;
                    state.ux = bx;
                    state.uy = by;
                } else {
                    let reference_scale = self.data.reference_scale;
                    let sx = self.scale_x;
                    let sy = self.effective_scale_y();
                    let wind = (self.config().wind_x, self.config().wind_y);
                    let gravity = (self.config().gravity_x, self.config().gravity_y);
                    let inertia = pose.inertia;

                    let qx = data.limit * delta * sx.abs();
                    let qy = data.limit * delta * sy.abs();

                    let mut d = -1.0f32;
                    let mut m = 0.0f32;
                    let mut e = 0.0f32;
                    let mut a = state.remaining;

                    if x || y {
                        if x {
                            state.x.offset += limit((state.ux - bx) * inertia, qx);
                            state.ux = bx;
                        }
                        if y {
                            state.y.offset += limit((state.uy - by) * inertia, qy);
                            state.uy = by;
                        }
                        if a >= step {
                            let xs = state.x.offset;
                            let ys = state.y.offset;
                            d = pose.damping.powf(60.0 * step);
                            m = step * pose.mass_inverse;
                            e = pose.strength;
                            let w = reference_scale * pose.wind;
                            let g = reference_scale * pose.gravity;
                            let ax = (w * wind.0 + g * gravity.0) * sx;
                            let ay = (w * wind.1 + g * gravity.1) * sy;
                            while a >= step {
                                if x {
                                    let spring = &mut state.x;
                                    spring.velocity += (ax - spring.offset * e) * m;
                                    spring.offset += spring.velocity * step;
                                    spring.velocity *= d;
                                }
                                if y {
                                    let spring = &mut state.y;
                                    spring.velocity -= (ay + spring.offset * e) * m;
                                    spring.offset += spring.velocity * step;
                                    spring.velocity *= d;
                                }
                                a -= step;
                            }
                            state.x.lag = state.x.offset - xs;
                            state.y.lag = state.y.offset - ys;
                        }
                        z = (1.0 - a / step).max(0.0);
                        if x {
                            bx += (state.x.offset - state.x.lag * z) * mix * data.x;
                        }
                        if y {
                            by += (state.y.offset - state.y.lag * z) * mix * data.y;
                        }
                    }

                    if rotate_or_shear_x || scale_x {
                        let (bone_a, bone_c) = {
                            let bone = &self.bones[bone_index];
                            (bone.a, bone.c)
                        };
                        let ca = bone_c.atan2(bone_a);
                        let world_scale_x = (bone_a * bone_a + bone_c * bone_c).sqrt();
                        let previous_z = (1.0 - previous_remaining / step).max(0.0);
                        let dx = limit(state.cx - bx, qx);
                        let dy = limit(state.cy - by, qy);
                        let mut mr = 0.0f32;
                        let mut cos;
                        let mut sin;

                        if rotate_or_shear_x {
                            mr = (data.rotate + data.shear_x) * mix;
                            let lag = state.rotate.lag * previous_z;
                            let r = (dy + state.ty).atan2(dx + state.tx)
                                - ca
                                - (state.rotate.offset - lag) * mr;
                            state.rotate.offset += (r - (r / TAU - 0.5).ceil() * TAU) * inertia;
                            let r = (state.rotate.offset - lag) * mr + ca;
                            (sin, cos) = r.sin_cos();
                            if scale_x {
                                let r = length * world_scale_x;
                                if r > 0.0 {
                                    state.scale.offset += (dx * cos + dy * sin) * inertia / r;
                                }
                            }
                        } else {
                            (sin, cos) = ca.sin_cos();
                            let r = length * world_scale_x - state.scale.lag * previous_z;
                            if r > 0.0 {
                                state.scale.offset += (dx * cos + dy * sin) * inertia / r;
                            }
                        }

                        a = state.remaining;
                        if a >= step {
                            if d < 0.0 {
                                d = pose.damping.powf(60.0 * step);
                                m = step * pose.mass_inverse;
                                e = pose.strength;
                            }
                            let ax = pose.wind * wind.0 + pose.gravity * gravity.0;
                            let ay = pose.wind * wind.1 + pose.gravity * gravity.1;
                            let h = if reference_scale.abs() > 1.0e-12 {
                                length / reference_scale
                            } else {
                                0.0
                            };
                            let rs = state.rotate.offset;
                            let ss = state.scale.offset;
                            loop {
                                a -= step;
                                if scale_x {
                                    let spring = &mut state.scale;
                                    spring.velocity += (ax * cos - ay * sin - spring.offset * e) * m;
                                    spring.offset += spring.velocity * step;
                                    spring.velocity *= d;
                                }
                                if rotate_or_shear_x {
                                    let spring = &mut state.rotate;
                                    spring.velocity -= ((ax * sin + ay * cos) * h + spring.offset * e) * m;
                                    spring.offset += spring.velocity * step;
                                    spring.velocity *= d;
                                    if a < step {
                                        break;
                                    }
                                    (sin, cos) = (spring.offset * mr + ca).sin_cos();
                                } else if a < step {
                                    break;
                                }
                            }
                            state.rotate.lag = state.rotate.offset - rs;
                            state.scale.lag = state.scale.offset - ss;
                        }
                        z = (1.0 - a / step).max(0.0);
                    }
                    state.remaining = a;

                    let bone = &mut self.bones[bone_index];
                    bone.world_x = bx;
                    bone.world_y = by;
                }
                let bone = &self.bones[bone_index];
                state.cx = bone.world_x;
                state.cy = bone.world_y;
            }
        }

        self.apply_physics_offsets(bone_index, data, &state, mix, z);
        if physics != Physics::Pose {
            let bone = &self.bones[bone_index];
            state.tx = length * bone.a;
            state.ty = length * bone.c;
        }
        self.modify_world(bone_index);

        if let Some(Constraint::Physics(c)) = self.constraints.get_mut(index) {
            c.state = state;
        }
    }

    /// Rotates, shears and scales the bone's world axes by the current spring offsets.
    fn apply_physics_offsets(
        &mut self,
        bone_index: usize,
        data: &PhysicsConstraintData,
        state: &PhysicsState,
        mix: f32,
        z: f32,
    ) {
        let bone = &mut self.bones[bone_index];
        if data.rotate > 0.0 || data.shear_x > 0.0 {
            let o = (state.rotate.offset - state.rotate.lag * z) * mix;
            if data.shear_x > 0.0 {
                let mut r = 0.0;
                if data.rotate > 0.0 {
                    r = o * data.rotate;
                    let (sin, cos) = r.sin_cos();
                    let b = bone.b;
                    bone.b = cos * b - sin * bone.d;
                    bone.d = sin * b + cos * bone.d;
                }
                r += o * data.shear_x;
                let (sin, cos) = r.sin_cos();
                let a = bone.a;
                bone.a = cos * a - sin * bone.c;
                bone.c = sin * a + cos * bone.c;
            } else {
                let (sin, cos) = (o * data.rotate).sin_cos();
                let a = bone.a;
                bone.a = cos * a - sin * bone.c;
                bone.c = sin * a + cos * bone.c;
                let b = bone.b;
                bone.b = cos * b - sin * bone.d;
                bone.d = sin * b + cos * bone.d;
            }
        }
        if data.scale_x > 0.0 {
            let s = 1.0 + (state.scale.offset - state.scale.lag * z) * mix * data.scale_x;
            bone.a *= s;
            bone.c *= s;
        }
    }
}

fn limit(value: f32, max: f32) -> f32 {
    if value > max {
        max
    } else if value < -max {
        -max
    } else {
        value
    }
}
