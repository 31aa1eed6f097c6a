//! Pendulum physics (physics3.json).

#[allow(clippy::module_inception)]
pub mod physics;
pub mod rig;

pub use physics::{Physics, PhysicsOptions};
pub use rig::{
    PhysicsInput, PhysicsNormalization, PhysicsOutput, PhysicsParticle, PhysicsRig, PhysicsSource, PhysicsSubRig,
};
