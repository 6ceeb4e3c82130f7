//! # Gravity Physics
//!
//! CPU-side data model for the gravity particle simulation: particle
//! attributes, attractor masses, and the falloff law shared with the GPU kernel.

pub mod constants;
pub mod forces;
pub mod mass;
pub mod particle;

pub use constants::*;
pub use forces::*;
pub use mass::*;
pub use particle::*;
