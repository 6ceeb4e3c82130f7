//! Constants for the gravity particle simulation
//!
//! Values are in normalized device units: the initial particle cloud and the
//! masses live in the `[-1, 1]` cube, and velocities are per-frame displacements.

/// Components stored per particle attribute (xyz / rgb)
pub const COMPONENTS_PER_ATTRIBUTE: usize = 3;

/// Size in bytes of one attribute element (three tightly packed f32)
pub const ATTRIBUTE_STRIDE: u64 = (COMPONENTS_PER_ATTRIBUTE * std::mem::size_of::<f32>()) as u64;

/// Default number of particles at startup
pub const DEFAULT_PARTICLE_COUNT: u32 = 10_000;

/// Range exposed to the tunable panel for the particle count
pub const MIN_PARTICLE_COUNT: u32 = 1_000;
pub const MAX_PARTICLE_COUNT: u32 = 10_000;

/// Default rendered point size in pixels
pub const DEFAULT_POINT_SIZE: f32 = 3.0;
pub const MIN_POINT_SIZE: f32 = 3.0;
pub const MAX_POINT_SIZE: f32 = 10.0;

/// Default strength assigned to every mass
pub const DEFAULT_GRAVITY: f32 = 0.000_02;
pub const MIN_GRAVITY: f32 = 0.000_002;
pub const MAX_GRAVITY: f32 = 0.000_1;

/// Default number of attractor masses
pub const DEFAULT_MASS_COUNT: usize = 3;

/// Capacity of the `Masses` uniform block.
/// Must match the array length of `Masses` in `update.wgsl`.
pub const MAX_MASS_COUNT: usize = 16;

/// Softening length added to the particle-mass distance.
/// Keeps the attraction finite when a particle sits on a mass.
pub const DEFAULT_SOFTENING: f32 = 0.01;

/// Squared pick radius (px²) for mouse pointers
pub const MOUSE_PICK_RADIUS_SQ: f32 = 25.0;

/// Squared pick radius (px²) for touch points, larger to compensate for finger size
pub const TOUCH_PICK_RADIUS_SQ: f32 = 100.0;
