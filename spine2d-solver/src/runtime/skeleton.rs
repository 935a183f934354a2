use crate::runtime::bone::{Bone, SkeletonFrame, WorldTransform};
use crate::runtime::constraint::{Constraint, Physics};
use crate::runtime::slot::Slot;
use crate::{
    AttachmentData, ConstraintData, DEFAULT_SKIN, Error, MeshAttachmentData, MeshVertices,
    PathConstraintData, Result, SkeletonConfig, SkeletonData, SkinData,
};
use std::sync::Arc;

/// One step of [`Skeleton::update_world_transform_with_physics`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CacheEntry {
    /// Compute a bone's world transform.
    Bone(usize),
    /// Apply a constraint, by index into [`Skeleton::constraints`].
    Constraint(usize),
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    pub data: Arc<SkeletonData>,
    pub bones: Vec<Bone>,
    pub slots: Vec<Slot>,
    /// Slot indices in the order they are drawn.
    pub draw_order: Vec<usize>,
    pub constraints: Vec<Constraint>,
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    skin: Option<String>,
    config: SkeletonConfig,
    time: f32,
    update: u32,
    update_cache: Vec<CacheEntry>,
    reset_cache: Vec<CacheEntry>,
}

impl Skeleton {
    pub fn new(data: Arc<SkeletonData>) -> Result<Self> {
        Self::with_config(data, SkeletonConfig::default())
    }

    pub fn with_config(data: Arc<SkeletonData>, config: SkeletonConfig) -> Result<Self> {
        validate_data(&data)?;

        let mut bones: Vec<Bone> = data
            .bones
            .iter()
            .enumerate()
            .map(|(i, b)| Bone::new(i, b.parent, b.setup))
            .collect();
        for i in 0..bones.len() {
            if let Some(parent) = bones[i].parent_index() {
                bones[parent].children.push(i);
            }
        }

        let slots = data
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| Slot::new(i, s))
            .collect();
        let constraints = data
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| Constraint::new(i, c))
            .collect();

        let mut skeleton = Self {
            draw_order: (0..data.slots.len()).collect(),
            data,
            bones,
            slots,
            constraints,
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skin: None,
            config,
            time: 0.0,
            update: 0,
            update_cache: Vec::new(),
            reset_cache: Vec::new(),
        };
        skeleton.set_slots_to_setup_pose();
        skeleton.update_cache();
        Ok(skeleton)
    }

    pub fn config(&self) -> &SkeletonConfig {
        &self.config
    }

    pub fn skin(&self) -> Option<&str> {
        self.skin.as_deref()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Advances the time used by physics constraints.
    pub fn update(&mut self, delta: f32) {
        self.time += delta;
    }

    pub fn set_wind(&mut self, x: f32, y: f32) {
        self.config.wind_x = x;
        self.config.wind_y = y;
    }

    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.config.gravity_x = x;
        self.config.gravity_y = y;
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn set_scale(&mut self, scale_x: f32, scale_y: f32) {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
    }

    /// Y scale including the coordinate convention.
    pub(crate) fn effective_scale_y(&self) -> f32 {
        self.scale_y * self.config.y_direction()
    }

    pub(crate) fn frame(&self) -> SkeletonFrame {
        SkeletonFrame {
            x: self.x,
            y: self.y,
            scale_x: self.scale_x,
            scale_y: self.effective_scale_y(),
        }
    }

    pub fn root_bone(&self) -> Option<&Bone> {
        self.bones.first()
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.data.find_bone(name)
    }

    pub fn bone(&self, name: &str) -> Result<&Bone> {
        self.find_bone(name)
            .map(|i| &self.bones[i])
            .ok_or_else(|| Error::UnknownBone { name: name.to_string() })
    }

    pub fn bone_mut(&mut self, name: &str) -> Result<&mut Bone> {
        let index = self.find_bone(name).ok_or_else(|| Error::UnknownBone { name: name.to_string() })?;
        Ok(&mut self.bones[index])
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.data.find_slot(name)
    }

    pub fn find_constraint(&self, name: &str) -> Option<usize> {
        self.data.find_constraint(name)
    }

    /// Entries run by each world transform update, in order.
    pub fn update_cache_entries(&self) -> &[CacheEntry] {
        &self.update_cache
    }

    /// Posed objects whose constrained copy is reset from the pose before each update.
    pub fn reset_cache_entries(&self) -> &[CacheEntry] {
        &self.reset_cache
    }

    /// The world transform of a bone's parent, or `None` for a root bone.
    pub(crate) fn parent_world(&self, bone_index: usize) -> Option<WorldTransform> {
        let parent = self.bones.get(bone_index)?.parent_index()?;
        self.bones.get(parent).map(Bone::world)
    }

    /// The parent transform used by solvers: the parent bone, or the skeleton placement for a
    /// root bone.
    pub(crate) fn parent_world_or_frame(&self, bone_index: usize) -> WorldTransform {
        self.parent_world(bone_index)
            .unwrap_or_else(|| self.frame().as_parent())
    }

    /// Transforms a world position into the space of `bone_index`'s parent.
    pub fn world_to_parent(&self, bone_index: usize, world_x: f32, world_y: f32) -> [f32; 2] {
        match self.bones.get(bone_index).and_then(Bone::parent_index) {
            Some(parent) => self.bones[parent].world_to_local(world_x, world_y),
            None => [world_x, world_y],
        }
    }

    /// Transforms a position in `bone_index`'s parent space into world space.
    pub fn parent_to_world(&self, bone_index: usize, parent_x: f32, parent_y: f32) -> [f32; 2] {
        match self.bones.get(bone_index).and_then(Bone::parent_index) {
            Some(parent) => self.bones[parent].local_to_world(parent_x, parent_y),
            None => [parent_x, parent_y],
        }
    }

    /// Rebuilds the update order. Required after changing the skin or activating bones and
    /// constraints.
    pub fn update_cache(&mut self) {
        self.update_cache.clear();
        self.reset_cache.clear();

        let data = Arc::clone(&self.data);
        for (bone, bone_data) in self.bones.iter_mut().zip(&data.bones) {
            bone.local.use_pose();
            bone.sorted = bone_data.skin_required;
            bone.active = !bone.sorted;
        }

        let skin = self.skin.as_deref().and_then(|name| data.skin(name));
        if let Some(skin) = skin {
            for &bone_index in &skin.bones {
                let mut current = Some(bone_index);
                while let Some(i) = current {
                    let bone = &mut self.bones[i];
                    bone.sorted = false;
                    bone.active = true;
                    current = bone.parent_index();
                }
            }
        }

        for constraint in &mut self.constraints {
            constraint.use_pose();
        }
        for (i, constraint_data) in data.constraints.iter().enumerate() {
            let enabled = !constraint_data.skin_required()
                || skin.is_some_and(|s| s.constraints.contains(&i));
            let active = enabled && self.is_source_active(constraint_data);
            if enabled && !active {
                log::warn!(
                    "constraint '{}' skipped: its source bone is inactive",
                    constraint_data.name()
                );
            }
            self.constraints[i].set_active(active);
            if active {
                self.sort_constraint(i, constraint_data);
            }
        }

        for i in 0..self.bones.len() {
            self.sort_bone(i);
        }

        log::debug!(
            "update cache rebuilt: {} entries, {} reset entries",
            self.update_cache.len(),
            self.reset_cache.len()
        );
    }

    fn is_source_active(&self, data: &ConstraintData) -> bool {
        match data {
            ConstraintData::Ik(d) => self.bones[d.target].active,
            ConstraintData::Transform(d) => self.bones[d.source].active,
            ConstraintData::Path(d) => self.bones[self.slots[d.slot].bone].active,
            ConstraintData::Physics(d) => self.bones[d.bone].active,
            ConstraintData::Slider(d) => d
                .driver
                .as_ref()
                .is_none_or(|driver| self.bones[driver.bone].active),
        }
    }

    fn sort_bone(&mut self, bone_index: usize) {
        let bone = &self.bones[bone_index];
        if bone.sorted || !bone.active {
            return;
        }
        if let Some(parent) = bone.parent_index() {
            self.sort_bone(parent);
        }
        self.bones[bone_index].sorted = true;
        self.update_cache.push(CacheEntry::Bone(bone_index));
    }

    /// Clears `sorted` below `bone_index` so those bones are appended again after a constraint.
    fn sort_reset(&mut self, bone_index: usize) {
        for k in 0..self.bones[bone_index].children.len() {
            let child = self.bones[bone_index].children[k];
            if !self.bones[child].active {
                continue;
            }
            if self.bones[child].sorted {
                self.sort_reset(child);
            }
            self.bones[child].sorted = false;
        }
    }

    fn constrained_bone(&mut self, bone_index: usize) {
        let posed = &mut self.bones[bone_index].local;
        if posed.is_pose_applied() {
            posed.use_constrained();
            self.reset_cache.push(CacheEntry::Bone(bone_index));
        }
    }

    fn constrained_constraint(&mut self, constraint_index: usize) {
        let constraint = &mut self.constraints[constraint_index];
        if constraint.is_pose_applied() {
            constraint.use_constrained();
            self.reset_cache.push(CacheEntry::Constraint(constraint_index));
        }
    }

    fn sort_constraint(&mut self, index: usize, data: &ConstraintData) {
        match data {
            ConstraintData::Ik(d) => {
                self.sort_bone(d.target);
                let parent = d.bones[0];
                self.sort_bone(parent);
                self.update_cache.push(CacheEntry::Constraint(index));
                self.bones[parent].sorted = false;
                self.sort_reset(parent);
                self.constrained_bone(parent);
                if let Some(&child) = d.bones.get(1) {
                    self.constrained_bone(child);
                }
            }
            ConstraintData::Transform(d) => {
                if !d.local_source {
                    self.sort_bone(d.source);
                }
                let world_target = !d.local_target;
                if world_target {
                    for &bone in &d.bones {
                        self.sort_bone(bone);
                    }
                }
                self.update_cache.push(CacheEntry::Constraint(index));
                for &bone in &d.bones {
                    self.sort_reset(bone);
                    self.constrained_bone(bone);
                }
                for &bone in &d.bones {
                    self.bones[bone].sorted = world_target;
                }
            }
            ConstraintData::Path(d) => {
                self.sort_path_slot(d);
                for &bone in &d.bones {
                    self.sort_bone(bone);
                    self.constrained_bone(bone);
                }
                self.update_cache.push(CacheEntry::Constraint(index));
                for &bone in &d.bones {
                    self.sort_reset(bone);
                }
                for &bone in &d.bones {
                    self.bones[bone].sorted = true;
                }
            }
            ConstraintData::Physics(d) => {
                self.sort_bone(d.bone);
                self.update_cache.push(CacheEntry::Constraint(index));
                self.sort_reset(d.bone);
                self.constrained_bone(d.bone);
            }
            ConstraintData::Slider(d) => {
                if let Some(driver) = d.driver.as_ref().filter(|driver| !driver.local) {
                    self.sort_bone(driver.bone);
                }
                self.update_cache.push(CacheEntry::Constraint(index));
                let data = Arc::clone(&self.data);
                let Some(animation) = data.animations.get(d.animation) else {
                    return;
                };
                for timeline in &animation.timelines {
                    if let Some(bone) = timeline.bone() {
                        self.constrained_bone(bone);
                        self.bones[bone].sorted = false;
                        self.sort_reset(bone);
                    } else if let Some(constraint) = timeline.constraint() {
                        self.constrained_constraint(constraint);
                    }
                }
            }
        }
    }

    /// Sorts the bones any path attachment of the constraint's slot can be bound to, in the
    /// active and default skins.
    fn sort_path_slot(&mut self, data: &PathConstraintData) {
        let slot_bone = self.slots[data.slot].bone;
        let skeleton_data = Arc::clone(&self.data);
        let skin = self.skin.as_deref().and_then(|name| skeleton_data.skin(name));
        let default_skin = skeleton_data
            .default_skin()
            .filter(|d| skin.is_none_or(|s| s.name != d.name));

        let mut paths: Vec<&AttachmentData> = Vec::new();
        for skin in skin.into_iter().chain(default_skin) {
            if let Some(attachments) = skin.attachments.get(data.slot) {
                paths.extend(attachments.values());
            }
        }
        paths.sort_by(|a, b| a.name().cmp(b.name()));

        for attachment in paths {
            let AttachmentData::Path(path) = attachment else {
                continue;
            };
            match &path.vertices {
                MeshVertices::Unweighted(_) => self.sort_bone(slot_bone),
                MeshVertices::Weighted(vertices) => {
                    for weight in vertices.iter().flatten() {
                        self.sort_bone(weight.bone);
                    }
                }
            }
        }
    }

    pub fn update_world_transform(&mut self) {
        self.update_world_transform_with_physics(Physics::None);
    }

    pub fn update_world_transform_with_physics(&mut self, physics: Physics) {
        self.update = self.update.wrapping_add(1).max(1);

        for k in 0..self.reset_cache.len() {
            match self.reset_cache[k] {
                CacheEntry::Bone(i) => self.bones[i].local.reset_constrained(),
                CacheEntry::Constraint(i) => self.constraints[i].reset_constrained(),
            }
        }

        for k in 0..self.update_cache.len() {
            match self.update_cache[k] {
                CacheEntry::Bone(i) => self.update_bone(i),
                CacheEntry::Constraint(i) => self.update_constraint(i, physics),
            }
        }
    }

    fn update_bone(&mut self, bone_index: usize) {
        let update = self.update;
        if self.bones[bone_index].world_epoch == update {
            return;
        }
        if self.bones[bone_index].local_epoch == update {
            self.update_local_transform(bone_index);
        }
        let parent = self.parent_world(bone_index);
        let frame = self.frame();
        let bone = &mut self.bones[bone_index];
        bone.world_epoch = update;
        bone.compute_world_transform(parent.as_ref(), &frame);
    }

    fn update_constraint(&mut self, index: usize, physics: Physics) {
        let data = Arc::clone(&self.data);
        let Some(constraint_data) = data.constraints.get(index) else {
            return;
        };
        match constraint_data {
            ConstraintData::Ik(d) => self.update_ik(index, d),
            ConstraintData::Transform(d) => self.update_transform(index, d),
            ConstraintData::Path(d) => self.update_path(index, d),
            ConstraintData::Physics(d) => self.update_physics(index, d, physics),
            ConstraintData::Slider(d) => self.update_slider(index, d),
        }
    }

    /// Recomputes the applied local values of a bone from its world transform.
    pub(crate) fn update_local_transform(&mut self, bone_index: usize) {
        let parent = self.parent_world(bone_index);
        let frame = self.frame();
        let update = self.update;
        let bone = &mut self.bones[bone_index];
        bone.local_epoch = 0;
        bone.world_epoch = update;
        bone.update_local_transform(parent.as_ref(), &frame);
    }

    /// Makes the applied local values of a bone current without invalidating its world
    /// transform.
    pub(crate) fn validate_local(&mut self, bone_index: usize) {
        if self.bones[bone_index].local_epoch == self.update {
            self.update_local_transform(bone_index);
        }
    }

    /// Marks a bone's local values as about to change, so its world transform and its
    /// already computed descendants are recomputed.
    pub(crate) fn modify_local(&mut self, bone_index: usize) {
        self.validate_local(bone_index);
        self.bones[bone_index].world_epoch = 0;
        self.reset_world(bone_index);
    }

    /// Marks a bone's world transform as written directly. Its local values are recomputed
    /// on demand and its descendants are recomputed.
    pub(crate) fn modify_world(&mut self, bone_index: usize) {
        let update = self.update;
        let bone = &mut self.bones[bone_index];
        bone.local_epoch = update;
        bone.world_epoch = update;
        self.reset_world(bone_index);
    }

    fn reset_world(&mut self, bone_index: usize) {
        let update = self.update;
        for k in 0..self.bones[bone_index].children.len() {
            let child = self.bones[bone_index].children[k];
            if self.bones[child].world_epoch == update {
                self.bones[child].world_epoch = 0;
                self.bones[child].local_epoch = 0;
                self.reset_world(child);
            }
        }
    }

    /// Sets bones and constraints to their setup pose, and slots to their setup attachments
    /// and draw order.
    pub fn set_to_setup_pose(&mut self) {
        self.set_bones_to_setup_pose();
        self.set_slots_to_setup_pose();
    }

    pub fn set_bones_to_setup_pose(&mut self) {
        let data = Arc::clone(&self.data);
        for (bone, bone_data) in self.bones.iter_mut().zip(&data.bones) {
            *bone.local.pose_mut() = bone_data.setup;
        }
        for (constraint, constraint_data) in self.constraints.iter_mut().zip(&data.constraints) {
            constraint.set_to_setup_pose(constraint_data);
        }
    }

    pub fn set_slots_to_setup_pose(&mut self) {
        self.draw_order.clear();
        self.draw_order.extend(0..self.slots.len());
        let data = Arc::clone(&self.data);
        for (i, slot_data) in data.slots.iter().enumerate() {
            let resolved = slot_data
                .attachment
                .as_deref()
                .and_then(|name| self.resolve_attachment(i, name));
            let slot = &mut self.slots[i];
            slot.color = slot_data.color;
            slot.deform.clear();
            slot.set_attachment(resolved);
        }
    }

    /// Resolves an attachment name for a slot to `(name, skin name)`: the active skin first,
    /// then the default skin.
    fn resolve_attachment(&self, slot_index: usize, name: &str) -> Option<(String, String)> {
        let skins = self
            .skin
            .as_deref()
            .and_then(|skin| self.data.skin(skin))
            .into_iter()
            .chain(self.data.default_skin());
        for skin in skins {
            if skin.attachment(slot_index, name).is_some() {
                return Some((name.to_string(), skin.name.clone()));
            }
        }
        None
    }

    /// Looks up an attachment by name in the active skin, then in the default skin.
    pub fn attachment(&self, slot_index: usize, name: &str) -> Option<&AttachmentData> {
        if let Some(skin) = self.skin.as_deref().and_then(|skin| self.data.skin(skin)) {
            if let Some(attachment) = skin.attachment(slot_index, name) {
                return Some(attachment);
            }
        }
        self.data
            .default_skin()
            .and_then(|skin| skin.attachment(slot_index, name))
    }

    /// The attachment currently shown by a slot.
    pub fn slot_attachment(&self, slot_index: usize) -> Option<&AttachmentData> {
        current_attachment(&self.data, self.skin.as_deref(), self.slots.get(slot_index)?, slot_index)
    }

    /// Sets the skin by name, or clears it with `None`.
    ///
    /// Switching from no skin shows every slot's setup attachment the new skin contains.
    /// Switching between skins keeps a slot's attachment from the old skin when the new skin
    /// has one with the same name, and clears it otherwise. Attachments from the default skin
    /// are left alone.
    pub fn set_skin(&mut self, skin_name: Option<&str>) -> Result<()> {
        let data = Arc::clone(&self.data);
        let new_skin: Option<&SkinData> = match skin_name {
            Some(name) => Some(data.skin(name).ok_or_else(|| Error::UnknownSkin {
                name: name.to_string(),
            })?),
            None => None,
        };
        if self.skin.as_deref() == skin_name {
            return Ok(());
        }

        let old_skin = self.skin.take();
        match (old_skin.as_deref(), new_skin) {
            (None, Some(new_skin)) => {
                for (i, slot_data) in data.slots.iter().enumerate() {
                    let Some(setup) = slot_data.attachment.as_deref() else {
                        continue;
                    };
                    if new_skin.attachment(i, setup).is_some() {
                        self.slots[i].set_attachment(Some((setup.to_string(), new_skin.name.clone())));
                    }
                }
            }
            (Some(old_name), new_skin) => {
                for (i, slot) in self.slots.iter_mut().enumerate() {
                    if slot.attachment_skin.as_deref() != Some(old_name) {
                        continue;
                    }
                    let kept = match (slot.attachment.as_deref(), new_skin) {
                        (Some(name), Some(skin)) if skin.attachment(i, name).is_some() => {
                            Some((name.to_string(), skin.name.clone()))
                        }
                        _ => None,
                    };
                    slot.set_attachment(kept);
                }
            }
            (None, None) => {}
        }

        self.skin = new_skin.map(|s| s.name.clone());
        log::debug!(
            "skin changed from {:?} to {:?}",
            old_skin.as_deref(),
            self.skin.as_deref()
        );
        self.update_cache();
        Ok(())
    }

    /// Shows the named attachment in a slot, or clears the slot with `None`.
    pub fn set_attachment(&mut self, slot_name: &str, attachment_name: Option<&str>) -> Result<()> {
        let slot_index = self
            .find_slot(slot_name)
            .ok_or_else(|| Error::UnknownSlot {
                name: slot_name.to_string(),
            })?;
        let resolved = match attachment_name {
            Some(name) => Some(self.resolve_attachment(slot_index, name).ok_or_else(|| {
                Error::UnknownAttachment {
                    slot: slot_name.to_string(),
                    name: name.to_string(),
                }
            })?),
            None => None,
        };
        self.slots[slot_index].set_attachment(resolved);
        Ok(())
    }

    /// Tells every physics constraint the skeleton moved by `(x, y)` in world space.
    pub fn physics_translate(&mut self, x: f32, y: f32) {
        for constraint in &mut self.constraints {
            if let Constraint::Physics(physics) = constraint {
                physics.translate(x, y);
            }
        }
    }

    /// Tells every physics constraint the skeleton rotated around `(x, y)` in world space.
    pub fn physics_rotate(&mut self, x: f32, y: f32, degrees: f32) {
        for constraint in &mut self.constraints {
            if let Constraint::Physics(physics) = constraint {
                physics.rotate(x, y, degrees);
            }
        }
    }

    pub fn reset_physics(&mut self) {
        let time = self.time;
        for constraint in &mut self.constraints {
            if let Constraint::Physics(physics) = constraint {
                physics.reset(time);
            }
        }
    }
}

/// Resolves a slot's current attachment from the skin it was set from, then the active skin,
/// then the default skin.
pub(crate) fn current_attachment<'a>(
    data: &'a SkeletonData,
    skin: Option<&str>,
    slot: &Slot,
    slot_index: usize,
) -> Option<&'a AttachmentData> {
    let name = slot.attachment.as_deref()?;
    slot.attachment_skin
        .as_deref()
        .into_iter()
        .chain(skin)
        .chain(Some(DEFAULT_SKIN))
        .filter_map(|skin| data.skin(skin))
        .find_map(|skin| skin.attachment(slot_index, name))
}

fn check_index(owner: impl FnOnce() -> String, kind: &'static str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::reference(owner(), kind, index))
    }
}

fn validate_vertices(
    owner: &dyn Fn() -> String,
    vertices: &MeshVertices,
    bone_count: usize,
) -> Result<()> {
    if let MeshVertices::Weighted(vertices) = vertices {
        for weight in vertices.iter().flatten() {
            check_index(owner, "bone", weight.bone, bone_count)?;
        }
    }
    Ok(())
}

/// Triangles must come in whole triples of indices into the mesh's vertices.
fn validate_triangles(owner: &dyn Fn() -> String, mesh: &MeshAttachmentData) -> Result<()> {
    if mesh.triangles.len() % 3 != 0 {
        return Err(Error::InvalidValue {
            message: format!(
                "{}: mesh '{}' has {} triangle indices, not a multiple of 3",
                owner(),
                mesh.name,
                mesh.triangles.len()
            ),
        });
    }
    let vertex_count = mesh.vertices.len();
    for &index in &mesh.triangles {
        check_index(owner, "vertex", usize::from(index), vertex_count)?;
    }
    Ok(())
}

fn validate_data(data: &SkeletonData) -> Result<()> {
    let bone_count = data.bones.len();
    let slot_count = data.slots.len();
    let constraint_count = data.constraints.len();

    for (i, bone) in data.bones.iter().enumerate() {
        if let Some(parent) = bone.parent {
            check_index(|| format!("bone '{}'", bone.name), "parent bone", parent, bone_count)?;
            if parent >= i {
                return Err(Error::InvalidHierarchy {
                    bone: bone.name.clone(),
                });
            }
        }
    }

    for slot in &data.slots {
        check_index(|| format!("slot '{}'", slot.name), "bone", slot.bone, bone_count)?;
    }

    for constraint in &data.constraints {
        let owner = || format!("constraint '{}'", constraint.name());
        match constraint {
            ConstraintData::Ik(d) => {
                if d.bones.is_empty() || d.bones.len() > 2 {
                    return Err(Error::InvalidValue {
                        message: format!("{} must constrain one or two bones", owner()),
                    });
                }
                for &bone in &d.bones {
                    check_index(owner, "bone", bone, bone_count)?;
                }
                check_index(owner, "target bone", d.target, bone_count)?;
                if let [parent, child] = d.bones[..] {
                    if data.bones[child].parent != Some(parent) {
                        return Err(Error::InvalidValue {
                            message: format!("{}: second bone must be a child of the first", owner()),
                        });
                    }
                }
            }
            ConstraintData::Transform(d) => {
                for &bone in &d.bones {
                    check_index(owner, "bone", bone, bone_count)?;
                }
                check_index(owner, "source bone", d.source, bone_count)?;
            }
            ConstraintData::Path(d) => {
                for &bone in &d.bones {
                    check_index(owner, "bone", bone, bone_count)?;
                }
                check_index(owner, "slot", d.slot, slot_count)?;
            }
            ConstraintData::Physics(d) => {
                check_index(owner, "bone", d.bone, bone_count)?;
                if d.step <= 0.0 {
                    return Err(Error::InvalidValue {
                        message: format!("{}: step must be positive", owner()),
                    });
                }
            }
            ConstraintData::Slider(d) => {
                check_index(owner, "animation", d.animation, data.animations.len())?;
                if let Some(driver) = &d.driver {
                    check_index(owner, "driver bone", driver.bone, bone_count)?;
                }
            }
        }
    }

    for skin in data.skins.values() {
        let owner = || format!("skin '{}'", skin.name);
        for &bone in &skin.bones {
            check_index(owner, "bone", bone, bone_count)?;
        }
        for &constraint in &skin.constraints {
            check_index(owner, "constraint", constraint, constraint_count)?;
        }
        for (slot, attachments) in skin.attachments.iter().enumerate() {
            if attachments.is_empty() {
                continue;
            }
            check_index(owner, "slot", slot, slot_count)?;
            for attachment in attachments.values() {
                if let Some(vertices) = attachment.vertices() {
                    validate_vertices(&owner, vertices, bone_count)?;
                }
                match attachment {
                    AttachmentData::Clipping(clip) => {
                        if let Some(end) = clip.end_slot {
                            check_index(owner, "end slot", end, slot_count)?;
                        }
                    }
                    AttachmentData::Mesh(mesh) => validate_triangles(&owner, mesh)?,
                    _ => {}
                }
            }
        }
    }

    for animation in &data.animations {
        let owner = || format!("animation '{}'", animation.name);
        for timeline in &animation.timelines {
            if let Some(bone) = timeline.bone() {
                check_index(owner, "bone", bone, bone_count)?;
            }
            if let Some(constraint) = timeline.constraint() {
                check_index(owner, "constraint", constraint, constraint_count)?;
            }
        }
    }

    Ok(())
}
