use crate::geometry::SkeletonClipper;
use crate::runtime::skeleton::Skeleton;
use crate::AttachmentData;

const QUAD_TRIANGLES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Axis-aligned world-space rectangle.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Skeleton {
    /// Bounds of the region and mesh attachments in draw order, after clipping. Uses the
    /// current world transforms. Returns `None` when no vertex contributes.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut clipper = SkeletonClipper::default();
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        let mut world = Vec::new();

        for &slot_index in &self.draw_order {
            let mut end_for_slot = true;

            'slot: {
                let Some(attachment) = self.slot_attachment(slot_index) else {
                    break 'slot;
                };
                let slot = &self.slots[slot_index];
                let bone = &self.bones[slot.bone];
                if !bone.active {
                    break 'slot;
                }

                world.clear();
                let triangles: &[u16] = match attachment {
                    AttachmentData::Region(region) => {
                        world.extend(region.world_vertices(bone));
                        &QUAD_TRIANGLES
                    }
                    AttachmentData::Mesh(mesh) => {
                        let count = mesh.vertices.len() * 2;
                        self.compute_world_vertices(slot_index, &mesh.vertices, 0, count, &mut world, 0, 2);
                        &mesh.triangles
                    }
                    AttachmentData::Clipping(clip) => {
                        end_for_slot = false;
                        if clipper.is_clipping() {
                            break 'slot;
                        }
                        let count = clip.vertices.len() * 2;
                        self.compute_world_vertices(slot_index, &clip.vertices, 0, count, &mut world, 0, 2);
                        clipper.clip_start(&world, clip.end_slot);
                        break 'slot;
                    }
                    AttachmentData::Point(_) | AttachmentData::Path(_) | AttachmentData::BoundingBox(_) => {
                        break 'slot;
                    }
                };

                let clipped;
                let vertices = if clipper.is_clipping() {
                    clipped = clipper.clip_triangles(&world, triangles).0;
                    &clipped
                } else {
                    &world
                };
                for p in vertices.chunks_exact(2) {
                    min = [min[0].min(p[0]), min[1].min(p[1])];
                    max = [max[0].max(p[0]), max[1].max(p[1])];
                }
            }

            if end_for_slot {
                clipper.clip_end_slot(slot_index);
            }
        }
        clipper.clip_end();

        if min.iter().chain(&max).all(|v| v.is_finite()) {
            Some(Bounds {
                x: min[0],
                y: min[1],
                width: max[0] - min[0],
                height: max[1] - min[1],
            })
        } else {
            None
        }
    }
}
