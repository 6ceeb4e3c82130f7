//! Error types for the gravity simulation.
//!
//! `InitError` covers everything that can stop a session from starting.
//! `ResourceError` covers device allocation and access on the
//! initialize / recreate / readback paths.

use std::fmt;

/// Errors that can occur while binding the surface and creating the GPU context.
#[derive(Debug)]
pub enum InitError {
    /// The named drawable surface could not be resolved.
    SurfaceNotFound(String),
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter(wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The adapter lacks capabilities the simulation needs.
    ContextUnsupported(wgpu::DownlevelFlags),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::SurfaceNotFound(name) => write!(f, "Surface not found: {:?}", name),
            InitError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            InitError::NoAdapter(e) => write!(f, "No compatible GPU adapter found: {}", e),
            InitError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            InitError::ContextUnsupported(missing) => write!(
                f,
                "GPU context unsupported, missing capabilities: {:?}",
                missing
            ),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::SurfaceCreation(e) => Some(e),
            InitError::NoAdapter(e) => Some(e),
            InitError::DeviceCreation(e) => Some(e),
            InitError::SurfaceNotFound(_) | InitError::ContextUnsupported(_) => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for InitError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        InitError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestAdapterError> for InitError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        InitError::NoAdapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for InitError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        InitError::DeviceCreation(e)
    }
}

/// Errors from allocating or accessing device resources.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// A particle store needs at least one particle.
    EmptyStore,
    /// A single attribute buffer would exceed the device limit.
    BufferTooLarge { requested: u64, limit: u64 },
    /// More masses than the `Masses` uniform block holds.
    TooManyMasses { requested: usize, max: usize },
    /// The device could not allocate the buffers.
    OutOfMemory(String),
    /// Failed to map a buffer for reading.
    Readback(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::EmptyStore => write!(f, "Particle store needs at least one particle"),
            ResourceError::BufferTooLarge { requested, limit } => write!(
                f,
                "Attribute buffer of {} bytes exceeds the device limit of {} bytes",
                requested, limit
            ),
            ResourceError::TooManyMasses { requested, max } => write!(
                f,
                "{} masses requested, the uniform block holds at most {}",
                requested, max
            ),
            ResourceError::OutOfMemory(msg) => write!(f, "GPU out of memory: {}", msg),
            ResourceError::Readback(msg) => write!(f, "Failed to read back GPU buffer: {}", msg),
        }
    }
}

impl std::error::Error for ResourceError {}
