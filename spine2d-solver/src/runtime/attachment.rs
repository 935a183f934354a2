use crate::runtime::bone::Bone;
use crate::runtime::skeleton::Skeleton;
use crate::{AttachmentData, MeshVertices, PointAttachmentData, RegionAttachmentData};

impl PointAttachmentData {
    pub fn world_position(&self, bone: &Bone) -> [f32; 2] {
        bone.local_to_world(self.x, self.y)
    }

    /// World rotation in degrees.
    pub fn world_rotation(&self, bone: &Bone) -> f32 {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let x = cos * bone.a + sin * bone.b;
        let y = cos * bone.c + sin * bone.d;
        y.atan2(x).to_degrees()
    }
}

impl RegionAttachmentData {
    /// Corners in the bone's space, in the order bottom-right, bottom-left, upper-left,
    /// upper-right, as `[x0, y0, x1, y1, ..]`.
    pub fn local_vertices(&self) -> [f32; 8] {
        let local_x = -self.width * 0.5 * self.scale_x;
        let local_y = -self.height * 0.5 * self.scale_y;
        let local_x2 = self.width * 0.5 * self.scale_x;
        let local_y2 = self.height * 0.5 * self.scale_y;

        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let local_x_cos = local_x * cos + self.x;
        let local_x_sin = local_x * sin;
        let local_y_cos = local_y * cos + self.y;
        let local_y_sin = local_y * sin;
        let local_x2_cos = local_x2 * cos + self.x;
        let local_x2_sin = local_x2 * sin;
        let local_y2_cos = local_y2 * cos + self.y;
        let local_y2_sin = local_y2 * sin;

        [
            local_x2_cos - local_y_sin,
            local_y_cos + local_x2_sin,
            local_x_cos - local_y_sin,
            local_y_cos + local_x_sin,
            local_x_cos - local_y2_sin,
            local_y2_cos + local_x_sin,
            local_x2_cos - local_y2_sin,
            local_y2_cos + local_x2_sin,
        ]
    }

    /// Corners transformed by the bone, in [`Self::local_vertices`] order.
    pub fn world_vertices(&self, bone: &Bone) -> [f32; 8] {
        let mut out = self.local_vertices();
        for corner in out.chunks_exact_mut(2) {
            let [x, y] = bone.local_to_world(corner[0], corner[1]);
            corner[0] = x;
            corner[1] = y;
        }
        out
    }
}

impl Skeleton {
    /// Transforms `count` floats of a slot's vertex attachment, starting at float `start`, into
    /// `world` at `offset`, writing one `[x, y]` pair every `stride` floats.
    ///
    /// Unweighted vertices are in the slot bone's space and are replaced by the slot's deform
    /// when it holds a position for every vertex. Weighted vertices are blended from their
    /// bones, with the deform added per weight as an offset.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn compute_world_vertices(
        &self,
        slot_index: usize,
        vertices: &MeshVertices,
        start: usize,
        count: usize,
        world: &mut Vec<f32>,
        offset: usize,
        stride: usize,
    ) {
        let Some(slot) = self.slots.get(slot_index) else {
            return;
        };
        let start_vertex = start / 2;
        let vertex_count = count / 2;
        let end = offset + vertex_count * stride;
        if world.len() < end {
            world.resize(end, 0.0);
        }
        let deform = slot.deform.as_slice();

        match vertices {
            MeshVertices::Unweighted(v) => {
                let bone = &self.bones[slot.bone];
                let use_deform = deform.len() == v.len() * 2;
                let n = vertex_count.min(v.len().saturating_sub(start_vertex));
                for i in 0..n {
                    let vi = start_vertex + i;
                    let (vx, vy) = if use_deform {
                        (deform[vi * 2], deform[vi * 2 + 1])
                    } else {
                        (v[vi][0], v[vi][1])
                    };
                    let [x, y] = bone.local_to_world(vx, vy);
                    let w = offset + i * stride;
                    world[w] = x;
                    world[w + 1] = y;
                }
            }
            MeshVertices::Weighted(v) => {
                let weight_count: usize = v.iter().map(Vec::len).sum();
                let use_deform = deform.len() == weight_count * 2;
                let n = vertex_count.min(v.len().saturating_sub(start_vertex));
                let mut f = v.iter().take(start_vertex).map(Vec::len).sum::<usize>() * 2;
                for i in 0..n {
                    let mut wx = 0.0;
                    let mut wy = 0.0;
                    for weight in &v[start_vertex + i] {
                        let (dx, dy) = if use_deform {
                            (deform[f], deform[f + 1])
                        } else {
                            (0.0, 0.0)
                        };
                        f += 2;
                        let [x, y] = self.bones[weight.bone].local_to_world(weight.x + dx, weight.y + dy);
                        wx += x * weight.weight;
                        wy += y * weight.weight;
                    }
                    let w = offset + i * stride;
                    world[w] = wx;
                    world[w + 1] = wy;
                }
            }
        }
    }

    /// World positions of the vertex attachment shown by a slot (mesh, path, bounding box or
    /// clipping), as `[x0, y0, x1, y1, ..]`.
    pub fn attachment_world_vertices(&self, slot_index: usize) -> Option<Vec<f32>> {
        let vertices = match self.slot_attachment(slot_index)? {
            AttachmentData::Region(_) | AttachmentData::Point(_) => return None,
            attachment => attachment.vertices()?,
        };
        let mut out = Vec::with_capacity(vertices.len() * 2);
        self.compute_world_vertices(slot_index, vertices, 0, vertices.len() * 2, &mut out, 0, 2);
        Some(out)
    }
}
