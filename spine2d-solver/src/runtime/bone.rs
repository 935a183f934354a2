use crate::runtime::posed::Posed;
use crate::{BoneLocal, Inherit};

/// World transform of a bone: a 2x2 matrix plus translation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct WorldTransform {
    pub(crate) a: f32,
    pub(crate) b: f32,
    pub(crate) c: f32,
    pub(crate) d: f32,
    pub(crate) world_x: f32,
    pub(crate) world_y: f32,
}

impl WorldTransform {
    fn det(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }
}

/// Skeleton placement every root bone is composed with. `scale_y` already includes the
/// coordinate convention.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SkeletonFrame {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) scale_x: f32,
    pub(crate) scale_y: f32,
}

impl SkeletonFrame {
    /// The skeleton placement expressed as a parent transform, used where a root bone needs one.
    pub(crate) fn as_parent(&self) -> WorldTransform {
        WorldTransform {
            a: self.scale_x,
            b: 0.0,
            c: 0.0,
            d: self.scale_y,
            world_x: self.x,
            world_y: self.y,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Bone {
    data_index: usize,
    parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) local: Posed<BoneLocal>,

    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub world_x: f32,
    pub world_y: f32,

    pub(crate) active: bool,
    pub(crate) sorted: bool,
    /// Update counter value at which the world transform was last computed, or 0.
    pub(crate) world_epoch: u32,
    /// Update counter value at which the world transform was written directly, leaving the
    /// local values stale, or 0.
    pub(crate) local_epoch: u32,
}

impl Bone {
    pub(crate) fn new(data_index: usize, parent: Option<usize>, setup: BoneLocal) -> Self {
        Self {
            data_index,
            parent,
            children: Vec::new(),
            local: Posed::new(setup),
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            world_x: 0.0,
            world_y: 0.0,
            active: true,
            sorted: false,
            world_epoch: 0,
            local_epoch: 0,
        }
    }

    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The editable local pose, written by animation.
    pub fn pose(&self) -> &BoneLocal {
        self.local.pose()
    }

    pub fn pose_mut(&mut self) -> &mut BoneLocal {
        self.local.pose_mut()
    }

    /// The local values the world transform was computed from.
    pub fn applied(&self) -> &BoneLocal {
        self.local.applied()
    }

    pub fn posed(&self) -> &Posed<BoneLocal> {
        &self.local
    }

    pub(crate) fn world(&self) -> WorldTransform {
        WorldTransform {
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
            world_x: self.world_x,
            world_y: self.world_y,
        }
    }

    pub fn world_rotation_x(&self) -> f32 {
        self.c.atan2(self.a).to_degrees()
    }

    pub fn world_rotation_y(&self) -> f32 {
        self.d.atan2(self.b).to_degrees()
    }

    pub fn world_scale_x(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }

    pub fn world_scale_y(&self) -> f32 {
        (self.b * self.b + self.d * self.d).sqrt()
    }

    /// Transforms a world position into this bone's local space. A singular world matrix maps
    /// everything to the origin.
    pub fn world_to_local(&self, world_x: f32, world_y: f32) -> [f32; 2] {
        let det = self.world().det();
        if det == 0.0 {
            return [0.0, 0.0];
        }
        let x = world_x - self.world_x;
        let y = world_y - self.world_y;
        [(x * self.d - y * self.b) / det, (y * self.a - x * self.c) / det]
    }

    pub fn local_to_world(&self, local_x: f32, local_y: f32) -> [f32; 2] {
        [
            local_x * self.a + local_y * self.b + self.world_x,
            local_x * self.c + local_y * self.d + self.world_y,
        ]
    }

    pub fn world_to_local_rotation(&self, world_rotation: f32) -> f32 {
        let r = world_rotation.to_radians();
        let (sin, cos) = r.sin_cos();
        let applied = self.applied();
        (self.a * sin - self.c * cos)
            .atan2(self.d * cos - self.b * sin)
            .to_degrees()
            + applied.rotation
            - applied.shear_x
    }

    pub fn local_to_world_rotation(&self, local_rotation: f32) -> f32 {
        let applied = self.applied();
        let r = (local_rotation - applied.rotation - applied.shear_x).to_radians();
        let (sin, cos) = r.sin_cos();
        (cos * self.c + sin * self.d)
            .atan2(cos * self.a + sin * self.b)
            .to_degrees()
    }

    /// Rotates the world matrix. Local values are not updated.
    pub fn rotate_world(&mut self, degrees: f32) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (ra, rb) = (self.a, self.b);
        self.a = cos * ra - sin * self.c;
        self.b = cos * rb - sin * self.d;
        self.c = sin * ra + cos * self.c;
        self.d = sin * rb + cos * self.d;
    }

    #[cfg(feature = "glam")]
    pub fn world_matrix(&self) -> glam::Affine2 {
        glam::Affine2::from_cols_array(&[
            self.a,
            self.c,
            self.b,
            self.d,
            self.world_x,
            self.world_y,
        ])
    }

    /// Computes the world transform from the applied local values.
    pub(crate) fn compute_world_transform(
        &mut self,
        parent: Option<&WorldTransform>,
        frame: &SkeletonFrame,
    ) {
        let local = *self.local.applied();
        let Some(parent) = parent else {
            let (la, lb, lc, ld) = local_matrix(
                local.rotation + local.shear_x,
                local.rotation + 90.0 + local.shear_y,
                local.scale_x,
                local.scale_y,
            );
            self.a = la * frame.scale_x;
            self.b = lb * frame.scale_x;
            self.c = lc * frame.scale_y;
            self.d = ld * frame.scale_y;
            self.world_x = local.x * frame.scale_x + frame.x;
            self.world_y = local.y * frame.scale_y + frame.y;
            return;
        };

        let (mut pa, mut pb, mut pc, mut pd) = (parent.a, parent.b, parent.c, parent.d);
        self.world_x = pa * local.x + pb * local.y + parent.world_x;
        self.world_y = pc * local.x + pd * local.y + parent.world_y;

        match local.inherit {
            Inherit::Normal => {
                let (la, lb, lc, ld) = local_matrix(
                    local.rotation + local.shear_x,
                    local.rotation + 90.0 + local.shear_y,
                    local.scale_x,
                    local.scale_y,
                );
                self.a = pa * la + pb * lc;
                self.b = pa * lb + pb * ld;
                self.c = pc * la + pd * lc;
                self.d = pc * lb + pd * ld;
                return;
            }
            Inherit::OnlyTranslation => {
                let (la, lb, lc, ld) = local_matrix(
                    local.rotation + local.shear_x,
                    local.rotation + 90.0 + local.shear_y,
                    local.scale_x,
                    local.scale_y,
                );
                self.a = la;
                self.b = lb;
                self.c = lc;
                self.d = ld;
            }
            Inherit::NoRotationOrReflection => {
                let sx = reciprocal(frame.scale_x);
                let sy = reciprocal(frame.scale_y);
                pa *= sx;
                pc *= sy;
                let mut s = pa * pa + pc * pc;
                let prx;
                if s > 1.0e-4 {
                    s = (pa * pd * sy - pb * sx * pc).abs() / s;
                    pb = pc * s;
                    pd = pa * s;
                    prx = pc.atan2(pa).to_degrees();
                } else {
                    pa = 0.0;
                    pc = 0.0;
                    prx = 90.0 - pd.atan2(pb).to_degrees();
                }
                let (la, lb, lc, ld) = local_matrix(
                    local.rotation + local.shear_x - prx,
                    local.rotation + local.shear_y - prx + 90.0,
                    local.scale_x,
                    local.scale_y,
                );
                self.a = pa * la - pb * lc;
                self.b = pa * lb - pb * ld;
                self.c = pc * la + pd * lc;
                self.d = pc * lb + pd * ld;
            }
            Inherit::NoScale | Inherit::NoScaleOrReflection => {
                let (sin, cos) = local.rotation.to_radians().sin_cos();
                let mut za = (pa * cos + pb * sin) / frame.scale_x;
                let mut zc = (pc * cos + pd * sin) / frame.scale_y;
                let mut s = (za * za + zc * zc).sqrt();
                if s > 1.0e-5 {
                    s = 1.0 / s;
                }
                za *= s;
                zc *= s;
                s = (za * za + zc * zc).sqrt();
                if local.inherit == Inherit::NoScale
                    && (parent.det() < 0.0) != ((frame.scale_x < 0.0) != (frame.scale_y < 0.0))
                {
                    s = -s;
                }
                let r = std::f32::consts::FRAC_PI_2 + zc.atan2(za);
                let zb = r.cos() * s;
                let zd = r.sin() * s;
                let (la, lb, lc, ld) = local_matrix(
                    local.shear_x,
                    90.0 + local.shear_y,
                    local.scale_x,
                    local.scale_y,
                );
                self.a = za * la + zb * lc;
                self.b = za * lb + zb * ld;
                self.c = zc * la + zd * lc;
                self.d = zc * lb + zd * ld;
            }
        }

        self.a *= frame.scale_x;
        self.b *= frame.scale_x;
        self.c *= frame.scale_y;
        self.d *= frame.scale_y;
    }

    /// Recomputes the applied local values from the current world transform. Shear X is always
    /// folded into rotation.
    pub(crate) fn update_local_transform(
        &mut self,
        parent: Option<&WorldTransform>,
        frame: &SkeletonFrame,
    ) {
        let (a, b, c, d) = (self.a, self.b, self.c, self.d);

        let Some(parent) = parent else {
            let local = self.local.applied_mut();
            local.x = self.world_x - frame.x;
            local.y = self.world_y - frame.y;
            local.rotation = c.atan2(a).to_degrees();
            local.scale_x = (a * a + c * c).sqrt();
            local.scale_y = (b * b + d * d).sqrt();
            local.shear_x = 0.0;
            local.shear_y = (a * b + c * d).atan2(a * d - b * c).to_degrees();
            return;
        };

        let (pa, mut pb, pc, mut pd) = (parent.a, parent.b, parent.c, parent.d);
        let det = parent.det();
        let mut pid = reciprocal(det);
        let mut ia = pd * pid;
        let mut ib = pb * pid;
        let mut ic = pc * pid;
        let mut id = pa * pid;
        let dx = self.world_x - parent.world_x;
        let dy = self.world_y - parent.world_y;
        let x = dx * ia - dy * ib;
        let y = dy * id - dx * ic;

        let inherit = self.local.applied().inherit;
        let applied_rotation = self.local.applied().rotation;

        let (ra, rb, rc, rd) = if inherit == Inherit::OnlyTranslation {
            (a, b, c, d)
        } else {
            match inherit {
                Inherit::NoRotationOrReflection => {
                    let s = det.abs() / (pa * pa + pc * pc).max(f32::MIN_POSITIVE);
                    pb = -pc * frame.scale_x * s / frame.scale_y;
                    pd = pa * frame.scale_y * s / frame.scale_x;
                    pid = reciprocal(pa * pd - pb * pc);
                    ia = pd * pid;
                    ib = pb * pid;
                }
                Inherit::NoScale | Inherit::NoScaleOrReflection => {
                    let (sin, cos) = applied_rotation.to_radians().sin_cos();
                    let mut za = (pa * cos + pb * sin) / frame.scale_x;
                    let mut zc = (pc * cos + pd * sin) / frame.scale_y;
                    let mut s = (za * za + zc * zc).sqrt();
                    if s > 1.0e-5 {
                        s = 1.0 / s;
                    }
                    za *= s;
                    zc *= s;
                    s = (za * za + zc * zc).sqrt();
                    if inherit == Inherit::NoScale
                        && (det < 0.0) != ((frame.scale_x < 0.0) != (frame.scale_y < 0.0))
                    {
                        s = -s;
                    }
                    let r = std::f32::consts::FRAC_PI_2 + zc.atan2(za);
                    pb = r.cos() * s;
                    pd = r.sin() * s;
                    pid = reciprocal(za * pd - pb * zc);
                    ia = pd * pid;
                    ib = pb * pid;
                    ic = zc * pid;
                    id = za * pid;
                }
                Inherit::Normal | Inherit::OnlyTranslation => {}
            }
            (
                ia * a - ib * c,
                ia * b - ib * d,
                id * c - ic * a,
                id * d - ic * b,
            )
        };

        let local = self.local.applied_mut();
        local.x = x;
        local.y = y;
        local.shear_x = 0.0;
        let scale_x = (ra * ra + rc * rc).sqrt();
        if scale_x > 1.0e-4 {
            let det2 = ra * rd - rb * rc;
            local.scale_x = scale_x;
            local.scale_y = det2 / scale_x;
            local.shear_y = -(ra * rb + rc * rd).atan2(det2).to_degrees();
            local.rotation = rc.atan2(ra).to_degrees();
        } else {
            local.scale_x = 0.0;
            local.scale_y = (rb * rb + rd * rd).sqrt();
            local.shear_y = 0.0;
            local.rotation = 90.0 - rd.atan2(rb).to_degrees();
        }
    }
}

/// Local 2x2 matrix for the given x/y axis angles in degrees.
fn local_matrix(rotation_x: f32, rotation_y: f32, scale_x: f32, scale_y: f32) -> (f32, f32, f32, f32) {
    let (sin_x, cos_x) = rotation_x.to_radians().sin_cos();
    let (sin_y, cos_y) = rotation_y.to_radians().sin_cos();
    (cos_x * scale_x, cos_y * scale_y, sin_x * scale_x, sin_y * scale_y)
}

fn reciprocal(value: f32) -> f32 {
    if value == 0.0 { 0.0 } else { 1.0 / value }
}
