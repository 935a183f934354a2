mod animation;
mod attachment;
mod bone;
mod bounds;
mod constraint;
mod ik;
mod path;
mod physics;
mod posed;
mod skeleton;
mod slider;
mod slot;
mod transform;

pub use animation::MixBlend;
pub use bone::Bone;
pub use bounds::Bounds;
pub use constraint::{
    Constraint, IkConstraint, PathConstraint, Physics, PhysicsChannel, PhysicsConstraint,
    SliderConstraint, Spring, TransformConstraint,
};
pub use posed::{Applied, Posed};
pub use skeleton::{CacheEntry, Skeleton};
pub use slot::Slot;


#[cfg(test)]
mod bone_tests;

#[cfg(test)]
mod ik_tests;

#[cfg(test)]
mod transform_tests;

#[cfg(test)]
mod path_tests;


#[cfg(test)]
mod slider_tests;
