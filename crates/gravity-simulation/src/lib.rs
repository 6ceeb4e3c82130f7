//! # Gravity Simulation
//!
//! GPU-resident particle simulation: particles are pulled toward a handful of
//! draggable masses, stepped by a compute shader that ping-pongs between two
//! buffer sets.

pub mod context;
pub mod error;
pub mod interaction;
pub mod kernel;
pub mod params;
pub mod program;
pub mod scheduler;
pub mod simulation;
pub mod store;
pub mod surface;

pub use context::*;
pub use error::*;
pub use interaction::*;
pub use kernel::*;
pub use params::*;
pub use program::*;
pub use scheduler::*;
pub use simulation::*;
pub use store::*;
pub use surface::*;
