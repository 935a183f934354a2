/// Which value of a [`Posed`] is authoritative during an update.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Applied {
    /// The editable pose is used directly.
    #[default]
    Pose,
    /// A private working copy, reset from the pose every frame, is used so constraints can
    /// modify it without touching the pose.
    Constrained,
}

/// A pose value paired with a working copy for constraints.
///
/// Animation writes [`Posed::pose_mut`]. The skeleton selects, when it builds its update cache,
/// whether updates read and write the pose itself or a constrained copy of it.
#[derive(Clone, Debug)]
pub struct Posed<P> {
    pose: P,
    constrained: P,
    applied: Applied,
}

impl<P: Copy> Posed<P> {
    pub(crate) fn new(setup: P) -> Self {
        Self {
            pose: setup,
            constrained: setup,
            applied: Applied::Pose,
        }
    }

    pub fn pose(&self) -> &P {
        &self.pose
    }

    pub fn pose_mut(&mut self) -> &mut P {
        &mut self.pose
    }

    pub fn applied(&self) -> &P {
        match self.applied {
            Applied::Pose => &self.pose,
            Applied::Constrained => &self.constrained,
        }
    }

    pub fn applied_mut(&mut self) -> &mut P {
        match self.applied {
            Applied::Pose => &mut self.pose,
            Applied::Constrained => &mut self.constrained,
        }
    }

    pub fn applied_kind(&self) -> Applied {
        self.applied
    }

    pub fn is_pose_applied(&self) -> bool {
        self.applied == Applied::Pose
    }

    pub(crate) fn use_pose(&mut self) {
        self.applied = Applied::Pose;
    }

    pub(crate) fn use_constrained(&mut self) {
        self.applied = Applied::Constrained;
    }

    pub(crate) fn reset_constrained(&mut self) {
        self.constrained = self.pose;
    }

    /// Returns the pose or the applied value.
    pub(crate) fn target_mut(&mut self, applied: bool) -> &mut P {
        if applied {
            self.applied_mut()
        } else {
            &mut self.pose
        }
    }
}
