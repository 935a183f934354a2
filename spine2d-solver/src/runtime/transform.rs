use crate::runtime::constraint::Constraint;
use crate::runtime::skeleton::Skeleton;
use crate::{TransformConstraintData, TransformPose, TransformProperty};

use std::f32::consts::{FRAC_PI_2, PI, TAU};

impl Skeleton {
    pub(crate) fn update_transform(&mut self, index: usize, data: &TransformConstraintData) {
        let Some(Constraint::Transform(constraint)) = self.constraints.get(index) else {
            return;
        };
        let pose = *constraint.posed.applied();
        if pose.is_zero() {
            return;
        }

        if data.local_source {
            self.validate_local(data.source);
        }

        for &bone in &data.bones {
            if !self.bones[bone].active {
                continue;
            }
            if data.local_target {
                self.modify_local(bone);
            } else {
                self.modify_world(bone);
            }

            for from in &data.properties {
                let from_value =
                    self.property_value(data.source, from.property, data.local_source, &data.offsets)
                        - from.offset;
                for to in &from.to {
                    let mix = property_mix(&pose, to.property);
                    if mix == 0.0 {
                        continue;
                    }
                    let mut value = to.offset + from_value * to.scale;
                    if data.clamp {
                        value = if to.offset < to.max {
                            value.clamp(to.offset, to.max)
                        } else {
                            value.clamp(to.max, to.offset)
                        };
                    }
                    if data.local_target {
                        self.apply_local_property(bone, to.property, value, mix, data.additive);
                    } else {
                        self.apply_world_property(bone, to.property, value, mix, data.additive);
                    }
                }
            }
        }
    }

    /// Reads a transform property of a bone: its applied local value, or the value derived
    /// from its world transform with the skeleton scale removed. `offsets` is indexed like
    /// [`TransformProperty::index`].
    pub(crate) fn property_value(
        &self,
        bone_index: usize,
        property: TransformProperty,
        local: bool,
        offsets: &[f32; 6],
    ) -> f32 {
        let bone = &self.bones[bone_index];
        let offset = offsets[property.index()];
        if local {
            let applied = bone.applied();
            let value = match property {
                TransformProperty::Rotate => applied.rotation,
                TransformProperty::X => applied.x,
                TransformProperty::Y => applied.y,
                TransformProperty::ScaleX => applied.scale_x,
                TransformProperty::ScaleY => applied.scale_y,
                TransformProperty::ShearY => applied.shear_y,
            };
            return value + offset;
        }

        let sx = self.scale_x;
        let sy = self.effective_scale_y();
        match property {
            TransformProperty::Rotate => {
                let det = bone.a * bone.d - bone.b * bone.c;
                let sign = if det * sx * sy > 0.0 { 1.0 } else { -1.0 };
                let mut value = (bone.c / sy).atan2(bone.a / sx).to_degrees() + offset * sign;
                if value < 0.0 {
                    value += 360.0;
                }
                value
            }
            TransformProperty::X => {
                let x = offsets[TransformProperty::X.index()];
                let y = offsets[TransformProperty::Y.index()];
                (x * bone.a + y * bone.b + bone.world_x) / sx
            }
            TransformProperty::Y => {
                let x = offsets[TransformProperty::X.index()];
                let y = offsets[TransformProperty::Y.index()];
                (x * bone.c + y * bone.d + bone.world_y) / sy
            }
            TransformProperty::ScaleX => {
                let a = bone.a / sx;
                let c = bone.c / sy;
                (a * a + c * c).sqrt() + offset
            }
            TransformProperty::ScaleY => {
                let b = bone.b / sx;
                let d = bone.d / sy;
                (b * b + d * d).sqrt() + offset
            }
            TransformProperty::ShearY => {
                let (ix, iy) = (1.0 / sx, 1.0 / sy);
                ((bone.d * iy).atan2(bone.b * ix) - (bone.c * iy).atan2(bone.a * ix)).to_degrees()
                    - 90.0
                    + offset
            }
        }
    }

    fn apply_local_property(
        &mut self,
        bone_index: usize,
        property: TransformProperty,
        mut value: f32,
        mix: f32,
        additive: bool,
    ) {
        let local = self.bones[bone_index].local.applied_mut();
        match property {
            TransformProperty::Rotate => {
                if !additive {
                    value -= local.rotation;
                }
                local.rotation += value * mix;
            }
            TransformProperty::X => {
                if !additive {
                    value -= local.x;
                }
                local.x += value * mix;
            }
            TransformProperty::Y => {
                if !additive {
                    value -= local.y;
                }
                local.y += value * mix;
            }
            TransformProperty::ScaleX => {
                if additive {
                    local.scale_x *= 1.0 + (value - 1.0) * mix;
                } else if local.scale_x != 0.0 {
                    local.scale_x += (value - local.scale_x) * mix;
                }
            }
            TransformProperty::ScaleY => {
                if additive {
                    local.scale_y *= 1.0 + (value - 1.0) * mix;
                } else if local.scale_y != 0.0 {
                    local.scale_y += (value - local.scale_y) * mix;
                }
            }
            TransformProperty::ShearY => {
                if !additive {
                    value -= local.shear_y;
                }
                local.shear_y += value * mix;
            }
        }
    }

    fn apply_world_property(
        &mut self,
        bone_index: usize,
        property: TransformProperty,
        mut value: f32,
        mix: f32,
        additive: bool,
    ) {
        let sx = self.scale_x;
        let sy = self.effective_scale_y();
        let bone = &mut self.bones[bone_index];
        match property {
            TransformProperty::Rotate => {
                let a = bone.a / sx;
                let b = bone.b / sx;
                let c = bone.c / sy;
                let d = bone.d / sy;
                let mut r = value.to_radians();
                if !additive {
                    r -= c.atan2(a);
                }
                r = wrap_pi(r) * mix;
                let (sin, cos) = r.sin_cos();
                bone.a = (cos * a - sin * c) * sx;
                bone.b = (cos * b - sin * d) * sx;
                bone.c = (sin * a + cos * c) * sy;
                bone.d = (sin * b + cos * d) * sy;
            }
            TransformProperty::X => {
                if !additive {
                    value -= bone.world_x / sx;
                }
                bone.world_x += value * mix * sx;
            }
            TransformProperty::Y => {
                if !additive {
                    value -= bone.world_y / sy;
                }
                bone.world_y += value * mix * sy;
            }
            TransformProperty::ScaleX => {
                let s = if additive {
                    1.0 + (value - 1.0) * mix
                } else {
                    let a = bone.a / sx;
                    let c = bone.c / sy;
                    let s = (a * a + c * c).sqrt();
                    if s == 0.0 {
                        return;
                    }
                    1.0 + (value - s) * mix / s
                };
                bone.a *= s;
                bone.c *= s;
            }
            TransformProperty::ScaleY => {
                let s = if additive {
                    1.0 + (value - 1.0) * mix
                } else {
                    let b = bone.b / sx;
                    let d = bone.d / sy;
                    let s = (b * b + d * d).sqrt();
                    if s == 0.0 {
                        return;
                    }
                    1.0 + (value - s) * mix / s
                };
                bone.b *= s;
                bone.d *= s;
            }
            TransformProperty::ShearY => {
                let b = bone.b / sx;
                let d = bone.d / sy;
                let by = d.atan2(b);
                let mut r = (value + 90.0).to_radians();
                if additive {
                    r -= FRAC_PI_2;
                } else {
                    r = wrap_pi(r - (by - (bone.c / sy).atan2(bone.a / sx)));
                }
                r = by + r * mix;
                let s = (b * b + d * d).sqrt();
                bone.b = r.cos() * s * sx;
                bone.d = r.sin() * s * sy;
            }
        }
    }
}

fn property_mix(pose: &TransformPose, property: TransformProperty) -> f32 {
    match property {
        TransformProperty::Rotate => pose.mix_rotate,
        TransformProperty::X => pose.mix_x,
        TransformProperty::Y => pose.mix_y,
        TransformProperty::ScaleX => pose.mix_scale_x,
        TransformProperty::ScaleY => pose.mix_scale_y,
        TransformProperty::ShearY => pose.mix_shear_y,
    }
}

/// Wraps an angle in radians to `[-π, π]`.
pub(crate) fn wrap_pi(mut radians: f32) -> f32 {
    if radians > PI {
        radians -= TAU;
    } else if radians < -PI {
        radians += TAU;
    }
    radians
}
