//! Construction-time settings for a [`crate::Skeleton`].

/// Coordinate convention and physics environment shared by every constraint of a skeleton.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkeletonConfig {
    /// World +Y points down (typical for screen-space engines). Flips the effective skeleton
    /// Y scale, which also flips gravity.
    pub y_down: bool,
    pub wind_x: f32,
    pub wind_y: f32,
    pub gravity_x: f32,
    pub gravity_y: f32,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            y_down: false,
            wind_x: 1.0,
            wind_y: 0.0,
            gravity_x: 0.0,
            gravity_y: 1.0,
        }
    }
}

impl SkeletonConfig {
    pub fn y_down() -> Self {
        Self {
            y_down: true,
            ..Self::default()
        }
    }

    pub(crate) fn y_direction(&self) -> f32 {
        if self.y_down { -1.0 } else { 1.0 }
    }
}
