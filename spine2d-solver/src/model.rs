use crate::{BoneLocal, IkPose, PathPose, PhysicsPose, SliderPose, TransformPose};
use std::collections::HashMap;

/// Name of the skin holding attachments visible without an active skin.
pub const DEFAULT_SKIN: &str = "default";

#[derive(Clone, Debug)]
pub struct BoneData {
    pub name: String,
    /// Index of the parent bone. Parents always precede their children.
    pub parent: Option<usize>,
    pub length: f32,
    pub skin_required: bool,
    pub setup: BoneLocal,
}

impl BoneData {
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
            length: 0.0,
            skin_required: false,
            setup: BoneLocal::default(),
        }
    }
}

/// How a bone inherits its parent's world transform.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Inherit {
    #[default]
    Normal,
    OnlyTranslation,
    NoRotationOrReflection,
    NoScale,
    NoScaleOrReflection,
}

#[derive(Clone, Debug)]
pub struct SlotData {
    pub name: String,
    pub bone: usize,
    /// Setup attachment name.
    pub attachment: Option<String>,
    pub color: [f32; 4],
}

impl SlotData {
    pub fn new(name: impl Into<String>, bone: usize) -> Self {
        Self {
            name: name.into(),
            bone,
            attachment: None,
            color: [1.0; 4],
        }
    }
}

#[derive(Clone, Debug)]
pub struct IkConstraintData {
    pub name: String,
    pub skin_required: bool,
    /// One bone, or a parent and its child.
    pub bones: Vec<usize>,
    pub target: usize,
    /// Stretch and compress scale both axes.
    pub uniform: bool,
    pub setup: IkPose,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransformProperty {
    Rotate,
    X,
    Y,
    ScaleX,
    ScaleY,
    ShearY,
}

impl TransformProperty {
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Rotate => 0,
            Self::X => 1,
            Self::Y => 2,
            Self::ScaleX => 3,
            Self::ScaleY => 4,
            Self::ShearY => 5,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransformToProperty {
    pub property: TransformProperty,
    pub offset: f32,
    /// Upper (or lower) bound when the constraint clamps.
    pub max: f32,
    pub scale: f32,
}

#[derive(Clone, Debug)]
pub struct TransformFromProperty {
    pub property: TransformProperty,
    pub offset: f32,
    pub to: Vec<TransformToProperty>,
}

#[derive(Clone, Debug)]
pub struct TransformConstraintData {
    pub name: String,
    pub skin_required: bool,
    pub bones: Vec<usize>,
    pub source: usize,
    pub local_source: bool,
    pub local_target: bool,
    pub additive: bool,
    pub clamp: bool,
    /// Added to the source values, indexed `[rotate, x, y, scaleX, scaleY, shearY]`.
    pub offsets: [f32; 6],
    pub properties: Vec<TransformFromProperty>,
    pub setup: TransformPose,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PositionMode {
    Fixed,
    Percent,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpacingMode {
    Length,
    Fixed,
    Percent,
    Proportional,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RotateMode {
    Tangent,
    Chain,
    ChainScale,
}

#[derive(Clone, Debug)]
pub struct PathConstraintData {
    pub name: String,
    pub skin_required: bool,
    pub bones: Vec<usize>,
    /// Slot whose path attachment is followed.
    pub slot: usize,
    pub position_mode: PositionMode,
    pub spacing_mode: SpacingMode,
    pub rotate_mode: RotateMode,
    /// Degrees.
    pub offset_rotation: f32,
    pub setup: PathPose,
}

#[derive(Clone, Debug)]
pub struct PhysicsConstraintData {
    pub name: String,
    pub skin_required: bool,
    pub bone: usize,
    pub x: f32,
    pub y: f32,
    pub rotate: f32,
    pub scale_x: f32,
    pub shear_x: f32,
    pub limit: f32,
    /// Fixed simulation step in seconds.
    pub step: f32,
    pub setup: PhysicsPose,
}

impl PhysicsConstraintData {
    pub fn new(name: impl Into<String>, bone: usize) -> Self {
        Self {
            name: name.into(),
            skin_required: false,
            bone,
            x: 0.0,
            y: 0.0,
            rotate: 0.0,
            scale_x: 0.0,
            shear_x: 0.0,
            limit: 5000.0,
            step: 1.0 / 60.0,
            setup: PhysicsPose::default(),
        }
    }
}

/// Bone property that drives a slider's animation time.
#[derive(Clone, Debug)]
pub struct SliderDriver {
    pub bone: usize,
    pub property: TransformProperty,
    /// Subtracted from the property value.
    pub property_offset: f32,
    /// Time at which the property value equals `property_offset`.
    pub offset: f32,
    pub scale: f32,
    pub local: bool,
}

#[derive(Clone, Debug)]
pub struct SliderConstraintData {
    pub name: String,
    pub skin_required: bool,
    /// Index into [`SkeletonData::animations`].
    pub animation: usize,
    pub additive: bool,
    pub looped: bool,
    pub driver: Option<SliderDriver>,
    pub setup: SliderPose,
}

/// Constraint definitions in registration order, which is also their update order.
#[derive(Clone, Debug)]
pub enum ConstraintData {
    Ik(IkConstraintData),
    Transform(TransformConstraintData),
    Path(PathConstraintData),
    Physics(PhysicsConstraintData),
    Slider(SliderConstraintData),
}

impl ConstraintData {
    pub fn name(&self) -> &str {
        match self {
            Self::Ik(c) => &c.name,
            Self::Transform(c) => &c.name,
            Self::Path(c) => &c.name,
            Self::Physics(c) => &c.name,
            Self::Slider(c) => &c.name,
        }
    }

    pub fn skin_required(&self) -> bool {
        match self {
            Self::Ik(c) => c.skin_required,
            Self::Transform(c) => c.skin_required,
            Self::Path(c) => c.skin_required,
            Self::Physics(c) => c.skin_required,
            Self::Slider(c) => c.skin_required,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegionAttachmentData {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug)]
pub struct MeshAttachmentData {
    pub name: String,
    pub vertices: MeshVertices,
    pub triangles: Vec<u16>,
}

#[derive(Clone, Debug)]
pub struct VertexWeight {
    pub bone: usize,
    pub x: f32,
    pub y: f32,
    pub weight: f32,
}

#[derive(Clone, Debug)]
pub enum MeshVertices {
    /// Positions in the slot bone's space.
    Unweighted(Vec<[f32; 2]>),
    /// Per vertex, the bones it is bound to.
    Weighted(Vec<Vec<VertexWeight>>),
}

impl MeshVertices {
    pub fn len(&self) -> usize {
        match self {
            Self::Unweighted(v) => v.len(),
            Self::Weighted(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct PointAttachmentData {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

/// A cubic Bezier spline stored as `[in handle, point, out handle]` per control point.
#[derive(Clone, Debug)]
pub struct PathAttachmentData {
    pub name: String,
    pub vertices: MeshVertices,
    /// Cumulative length at the end of each curve.
    pub lengths: Vec<f32>,
    pub closed: bool,
    pub constant_speed: bool,
}

#[derive(Clone, Debug)]
pub struct BoundingBoxAttachmentData {
    pub name: String,
    pub vertices: MeshVertices,
}

#[derive(Clone, Debug)]
pub struct ClippingAttachmentData {
    pub name: String,
    pub vertices: MeshVertices,
    /// Clipping stops after this slot in draw order. `None` clips to the end.
    pub end_slot: Option<usize>,
}

#[derive(Clone, Debug)]
pub enum AttachmentData {
    Region(RegionAttachmentData),
    Mesh(MeshAttachmentData),
    Point(PointAttachmentData),
    Path(PathAttachmentData),
    BoundingBox(BoundingBoxAttachmentData),
    Clipping(ClippingAttachmentData),
}

impl AttachmentData {
    pub fn name(&self) -> &str {
        match self {
            AttachmentData::Region(a) => a.name.as_str(),
            AttachmentData::Mesh(a) => a.name.as_str(),
            AttachmentData::Point(a) => a.name.as_str(),
            AttachmentData::Path(a) => a.name.as_str(),
            AttachmentData::BoundingBox(a) => a.name.as_str(),
            AttachmentData::Clipping(a) => a.name.as_str(),
        }
    }

    pub fn vertices(&self) -> Option<&MeshVertices> {
        match self {
            AttachmentData::Mesh(a) => Some(&a.vertices),
            AttachmentData::Path(a) => Some(&a.vertices),
            AttachmentData::BoundingBox(a) => Some(&a.vertices),
            AttachmentData::Clipping(a) => Some(&a.vertices),
            AttachmentData::Region(_) | AttachmentData::Point(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SkinData {
    pub name: String,
    /// Per slot, attachments keyed by name.
    pub attachments: Vec<HashMap<String, AttachmentData>>,
    /// Skin-required bones activated by this skin.
    pub bones: Vec<usize>,
    /// Skin-required constraints activated by this skin, as indices into
    /// [`SkeletonData::constraints`].
    pub constraints: Vec<usize>,
}

impl SkinData {
    pub fn new(name: impl Into<String>, slot_count: usize) -> Self {
        Self {
            name: name.into(),
            attachments: vec![HashMap::new(); slot_count],
            bones: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn attachment(&self, slot_index: usize, attachment_name: &str) -> Option<&AttachmentData> {
        self.attachments
            .get(slot_index)
            .and_then(|slot_map| slot_map.get(attachment_name))
    }

    pub fn set_attachment(&mut self, slot_index: usize, attachment: AttachmentData) {
        if self.attachments.len() <= slot_index {
            self.attachments.resize_with(slot_index + 1, HashMap::new);
        }
        self.attachments[slot_index].insert(attachment.name().to_string(), attachment);
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Curve {
    Linear,
    Stepped,
    Bezier {
        cx1: f32,
        cy1: f32,
        cx2: f32,
        cy2: f32,
    },
}

/// A key with `N` animated values, each with the curve toward the next key.
#[derive(Clone, Debug)]
pub struct Keyframe<const N: usize> {
    pub time: f32,
    pub values: [f32; N],
    pub curves: [Curve; N],
}

impl<const N: usize> Keyframe<N> {
    pub fn linear(time: f32, values: [f32; N]) -> Self {
        Self {
            time,
            values,
            curves: [Curve::Linear; N],
        }
    }
}

#[derive(Clone, Debug)]
pub struct InheritFrame {
    pub time: f32,
    pub inherit: Inherit,
}

#[derive(Clone, Debug)]
pub struct IkFrame {
    pub time: f32,
    pub mix: f32,
    pub softness: f32,
    pub bend_direction: i32,
    pub compress: bool,
    pub stretch: bool,
    pub curves: [Curve; 2],
}

#[derive(Clone, Debug)]
pub enum Timeline {
    Rotate { bone: usize, frames: Vec<Keyframe<1>> },
    Translate { bone: usize, frames: Vec<Keyframe<2>> },
    TranslateX { bone: usize, frames: Vec<Keyframe<1>> },
    TranslateY { bone: usize, frames: Vec<Keyframe<1>> },
    /// Values multiply the setup scale.
    Scale { bone: usize, frames: Vec<Keyframe<2>> },
    ScaleX { bone: usize, frames: Vec<Keyframe<1>> },
    ScaleY { bone: usize, frames: Vec<Keyframe<1>> },
    Shear { bone: usize, frames: Vec<Keyframe<2>> },
    ShearX { bone: usize, frames: Vec<Keyframe<1>> },
    ShearY { bone: usize, frames: Vec<Keyframe<1>> },
    Inherit { bone: usize, frames: Vec<InheritFrame> },
    Ik { constraint: usize, frames: Vec<IkFrame> },
    /// Values are `[rotate, x, y, scaleX, scaleY, shearY]` mixes.
    Transform { constraint: usize, frames: Vec<Keyframe<6>> },
    PathPosition { constraint: usize, frames: Vec<Keyframe<1>> },
    PathSpacing { constraint: usize, frames: Vec<Keyframe<1>> },
    /// Values are `[rotate, x, y]` mixes.
    PathMix { constraint: usize, frames: Vec<Keyframe<3>> },
    SliderTime { constraint: usize, frames: Vec<Keyframe<1>> },
    SliderMix { constraint: usize, frames: Vec<Keyframe<1>> },
}

impl Timeline {
    pub fn bone(&self) -> Option<usize> {
        match self {
            Self::Rotate { bone, .. }
            | Self::Translate { bone, .. }
            | Self::TranslateX { bone, .. }
            | Self::TranslateY { bone, .. }
            | Self::Scale { bone, .. }
            | Self::ScaleX { bone, .. }
            | Self::ScaleY { bone, .. }
            | Self::Shear { bone, .. }
            | Self::ShearX { bone, .. }
            | Self::ShearY { bone, .. }
            | Self::Inherit { bone, .. } => Some(*bone),
            _ => None,
        }
    }

    pub fn constraint(&self) -> Option<usize> {
        match self {
            Self::Ik { constraint, .. }
            | Self::Transform { constraint, .. }
            | Self::PathPosition { constraint, .. }
            | Self::PathSpacing { constraint, .. }
            | Self::PathMix { constraint, .. }
            | Self::SliderTime { constraint, .. }
            | Self::SliderMix { constraint, .. } => Some(*constraint),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Animation {
    pub name: String,
    pub duration: f32,
    pub timelines: Vec<Timeline>,
    bones: Vec<usize>,
}

impl Animation {
    pub fn new(name: impl Into<String>, duration: f32, timelines: Vec<Timeline>) -> Self {
        let mut bones: Vec<usize> = timelines.iter().filter_map(Timeline::bone).collect();
        bones.sort_unstable();
        bones.dedup();
        Self {
            name: name.into(),
            duration,
            timelines,
            bones,
        }
    }

    /// Bones with at least one timeline, ascending.
    pub fn bones(&self) -> &[usize] {
        &self.bones
    }
}

#[derive(Clone, Debug)]
pub struct SkeletonData {
    /// Scale of the physics forces, in skeleton units per meter.
    pub reference_scale: f32,
    pub bones: Vec<BoneData>,
    pub slots: Vec<SlotData>,
    pub skins: HashMap<String, SkinData>,
    pub constraints: Vec<ConstraintData>,
    pub animations: Vec<Animation>,
}

impl Default for SkeletonData {
    fn default() -> Self {
        Self {
            reference_scale: 100.0,
            bones: Vec::new(),
            slots: Vec::new(),
            skins: HashMap::new(),
            constraints: Vec::new(),
            animations: Vec::new(),
        }
    }
}

impl SkeletonData {
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    pub fn find_constraint(&self, name: &str) -> Option<usize> {
        self.constraints.iter().position(|c| c.name() == name)
    }

    pub fn find_animation(&self, name: &str) -> Option<&Animation> {
        self.animations.iter().find(|a| a.name == name)
    }

    pub fn skin(&self, name: &str) -> Option<&SkinData> {
        self.skins.get(name)
    }

    pub fn default_skin(&self) -> Option<&SkinData> {
        self.skins.get(DEFAULT_SKIN)
    }
}
