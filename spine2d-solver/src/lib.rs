//! Pure Rust solver for Spine 4.3 skeletons (unofficial).
//!
//! Given populated [`SkeletonData`], a [`Skeleton`] orders its bones and constraints into an
//! update cache and computes world transforms through IK, transform, path, physics and slider
//! constraints. Asset loading and rendering live outside this crate.

#![forbid(unsafe_code)]

mod config;
mod error;
mod geometry;
mod model;
mod pose;
mod runtime;

pub use config::*;
pub use error::*;
pub use model::*;
pub use pose::*;
pub use runtime::*;

#[cfg(test)]
mod geometry_tests;

#[cfg(all(test, feature = "serde"))]
mod config_tests;
