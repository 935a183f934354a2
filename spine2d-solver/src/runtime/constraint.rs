use crate::runtime::posed::Posed;
use crate::{ConstraintData, IkPose, PathPose, PhysicsPose, SliderPose, TransformPose};

/// Determines how physics constraints are advanced by an update.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Physics {
    /// Physics are not updated or applied.
    #[default]
    None,
    /// Physics are reset to the current pose.
    Reset,
    /// Physics are updated and the pose from physics is applied.
    Update,
    /// Physics are not updated but the pose from physics is applied.
    Pose,
}

#[derive(Clone, Debug)]
pub struct IkConstraint {
    data_index: usize,
    pub(crate) posed: Posed<IkPose>,
    pub(crate) active: bool,
}

#[derive(Clone, Debug)]
pub struct TransformConstraint {
    data_index: usize,
    pub(crate) posed: Posed<TransformPose>,
    pub(crate) active: bool,
}

#[derive(Clone, Debug)]
pub struct PathConstraint {
    data_index: usize,
    pub(crate) posed: Posed<PathPose>,
    pub(crate) active: bool,
    pub(crate) scratch: PathScratch,
}

/// Buffers reused by every solve of one path constraint.
#[derive(Clone, Debug, Default)]
pub(crate) struct PathScratch {
    pub(crate) spaces: Vec<f32>,
    pub(crate) lengths: Vec<f32>,
    pub(crate) positions: Vec<f32>,
    pub(crate) world: Vec<f32>,
    pub(crate) curves: Vec<f32>,
    pub(crate) segments: [f32; 10],
}

/// One damped spring of a physics constraint.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spring {
    pub offset: f32,
    pub lag: f32,
    pub velocity: f32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhysicsChannel {
    X,
    Y,
    /// Rotation, or shear X when the constraint does not rotate.
    Rotate,
    Scale,
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct PhysicsState {
    pub(crate) reset: bool,
    pub(crate) ux: f32,
    pub(crate) uy: f32,
    pub(crate) cx: f32,
    pub(crate) cy: f32,
    pub(crate) tx: f32,
    pub(crate) ty: f32,
    pub(crate) x: Spring,
    pub(crate) y: Spring,
    pub(crate) rotate: Spring,
    pub(crate) scale: Spring,
    pub(crate) remaining: f32,
    pub(crate) last_time: f32,
}

#[derive(Clone, Debug)]
pub struct PhysicsConstraint {
    data_index: usize,
    pub(crate) posed: Posed<PhysicsPose>,
    pub(crate) active: bool,
    pub(crate) state: PhysicsState,
}

impl PhysicsConstraint {
    /// Clears all spring state. The next update re-anchors to the bone's current position.
    pub fn reset(&mut self, skeleton_time: f32) {
        log::trace!("physics constraint #{} reset", self.data_index);
        self.state = PhysicsState {
            reset: true,
            last_time: skeleton_time,
            ..PhysicsState::default()
        };
    }

    /// Moves the anchor so the simulation sees the skeleton translated by `(x, y)`.
    pub fn translate(&mut self, x: f32, y: f32) {
        let state = &mut self.state;
        state.ux -= x;
        state.uy -= y;
        state.cx -= x;
        state.cy -= y;
    }

    /// Moves the anchor so the simulation sees the skeleton rotated around `(x, y)`.
    pub fn rotate(&mut self, x: f32, y: f32, degrees: f32) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.state.cx - x;
        let dy = self.state.cy - y;
        self.translate(dx * cos - dy * sin - dx, dx * sin + dy * cos - dy);
    }

    pub fn spring(&self, channel: PhysicsChannel) -> Spring {
        match channel {
            PhysicsChannel::X => self.state.x,
            PhysicsChannel::Y => self.state.y,
            PhysicsChannel::Rotate => self.state.rotate,
            PhysicsChannel::Scale => self.state.scale,
        }
    }

    /// Simulation time not yet consumed by a whole step.
    pub fn remaining(&self) -> f32 {
        self.state.remaining
    }
}

#[derive(Clone, Debug)]
pub struct SliderConstraint {
    data_index: usize,
    pub(crate) posed: Posed<SliderPose>,
    pub(crate) active: bool,
}

impl IkConstraint {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pose(&self) -> &IkPose {
        self.posed.pose()
    }

    pub fn pose_mut(&mut self) -> &mut IkPose {
        self.posed.pose_mut()
    }

    pub fn applied(&self) -> &IkPose {
        self.posed.applied()
    }
}

impl TransformConstraint {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pose(&self) -> &TransformPose {
        self.posed.pose()
    }

    pub fn pose_mut(&mut self) -> &mut TransformPose {
        self.posed.pose_mut()
    }

    pub fn applied(&self) -> &TransformPose {
        self.posed.applied()
    }
}

impl PathConstraint {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pose(&self) -> &PathPose {
        self.posed.pose()
    }

    pub fn pose_mut(&mut self) -> &mut PathPose {
        self.posed.pose_mut()
    }

    pub fn applied(&self) -> &PathPose {
        self.posed.applied()
    }
}

impl PhysicsConstraint {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pose(&self) -> &PhysicsPose {
        self.posed.pose()
    }

    pub fn pose_mut(&mut self) -> &mut PhysicsPose {
        self.posed.pose_mut()
    }

    pub fn applied(&self) -> &PhysicsPose {
        self.posed.applied()
    }
}

impl SliderConstraint {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pose(&self) -> &SliderPose {
        self.posed.pose()
    }

    pub fn pose_mut(&mut self) -> &mut SliderPose {
        self.posed.pose_mut()
    }

    pub fn applied(&self) -> &SliderPose {
        self.posed.applied()
    }
}

/// A constraint instance, in the same order as [`crate::SkeletonData::constraints`].
#[derive(Clone, Debug)]
pub enum Constraint {
    Ik(IkConstraint),
    Transform(TransformConstraint),
    Path(PathConstraint),
    Physics(PhysicsConstraint),
    Slider(SliderConstraint),
}

impl Constraint {
    pub(crate) fn new(data_index: usize, data: &ConstraintData) -> Self {
        match data {
            ConstraintData::Ik(d) => Self::Ik(IkConstraint {
                data_index,
                posed: Posed::new(d.setup),
                active: true,
            }),
            ConstraintData::Transform(d) => Self::Transform(TransformConstraint {
                data_index,
                posed: Posed::new(d.setup),
                active: true,
            }),
            ConstraintData::Path(d) => Self::Path(PathConstraint {
                data_index,
                posed: Posed::new(d.setup),
                active: true,
                scratch: PathScratch::default(),
            }),
            ConstraintData::Physics(d) => Self::Physics(PhysicsConstraint {
                data_index,
                posed: Posed::new(d.setup),
                active: true,
                state: PhysicsState {
                    reset: true,
                    ..PhysicsState::default()
                },
            }),
            ConstraintData::Slider(d) => Self::Slider(SliderConstraint {
                data_index,
                posed: Posed::new(d.setup),
                active: true,
            }),
        }
    }

    pub fn data_index(&self) -> usize {
        match self {
            Self::Ik(c) => c.data_index,
            Self::Transform(c) => c.data_index,
            Self::Path(c) => c.data_index,
            Self::Physics(c) => c.data_index,
            Self::Slider(c) => c.data_index,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Ik(c) => c.active,
            Self::Transform(c) => c.active,
            Self::Path(c) => c.active,
            Self::Physics(c) => c.active,
            Self::Slider(c) => c.active,
        }
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        match self {
            Self::Ik(c) => c.active = active,
            Self::Transform(c) => c.active = active,
            Self::Path(c) => c.active = active,
            Self::Physics(c) => c.active = active,
            Self::Slider(c) => c.active = active,
        }
    }

    pub fn is_pose_applied(&self) -> bool {
        match self {
            Self::Ik(c) => c.posed.is_pose_applied(),
            Self::Transform(c) => c.posed.is_pose_applied(),
            Self::Path(c) => c.posed.is_pose_applied(),
            Self::Physics(c) => c.posed.is_pose_applied(),
            Self::Slider(c) => c.posed.is_pose_applied(),
        }
    }

    pub(crate) fn use_pose(&mut self) {
        match self {
            Self::Ik(c) => c.posed.use_pose(),
            Self::Transform(c) => c.posed.use_pose(),
            Self::Path(c) => c.posed.use_pose(),
            Self::Physics(c) => c.posed.use_pose(),
            Self::Slider(c) => c.posed.use_pose(),
        }
    }

    pub(crate) fn use_constrained(&mut self) {
        match self {
            Self::Ik(c) => c.posed.use_constrained(),
            Self::Transform(c) => c.posed.use_constrained(),
            Self::Path(c) => c.posed.use_constrained(),
            Self::Physics(c) => c.posed.use_constrained(),
            Self::Slider(c) => c.posed.use_constrained(),
        }
    }

    pub(crate) fn reset_constrained(&mut self) {
        match self {
            Self::Ik(c) => c.posed.reset_constrained(),
            Self::Transform(c) => c.posed.reset_constrained(),
            Self::Path(c) => c.posed.reset_constrained(),
            Self::Physics(c) => c.posed.reset_constrained(),
            Self::Slider(c) => c.posed.reset_constrained(),
        }
    }

    /// Copies the setup values of `data` into the pose. Physics state is kept.
    pub(crate) fn set_to_setup_pose(&mut self, data: &ConstraintData) {
        match (self, data) {
            (Self::Ik(c), ConstraintData::Ik(d)) => *c.posed.pose_mut() = d.setup,
            (Self::Transform(c), ConstraintData::Transform(d)) => *c.posed.pose_mut() = d.setup,
            (Self::Path(c), ConstraintData::Path(d)) => *c.posed.pose_mut() = d.setup,
            (Self::Physics(c), ConstraintData::Physics(d)) => *c.posed.pose_mut() = d.setup,
            (Self::Slider(c), ConstraintData::Slider(d)) => *c.posed.pose_mut() = d.setup,
            _ => {}
        }
    }

    pub fn as_ik(&self) -> Option<&IkConstraint> {
        match self {
            Self::Ik(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_ik_mut(&mut self) -> Option<&mut IkConstraint> {
        match self {
            Self::Ik(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<&TransformConstraint> {
        match self {
            Self::Transform(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_transform_mut(&mut self) -> Option<&mut TransformConstraint> {
        match self {
            Self::Transform(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathConstraint> {
        match self {
            Self::Path(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_path_mut(&mut self) -> Option<&mut PathConstraint> {
        match self {
            Self::Path(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_physics(&self) -> Option<&PhysicsConstraint> {
        match self {
            Self::Physics(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_physics_mut(&mut self) -> Option<&mut PhysicsConstraint> {
        match self {
            Self::Physics(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_slider(&self) -> Option<&SliderConstraint> {
        match self {
            Self::Slider(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_slider_mut(&mut self) -> Option<&mut SliderConstraint> {
        match self {
            Self::Slider(c) => Some(c),
            _ => None,
        }
    }
}
