//! GPU instance, adapter and device setup

use crate::error::InitError;

/// Capabilities the simulation cannot run without:
/// the update kernel is a compute pass, and the renderers read particle
/// storage buffers from the vertex stage.
pub const REQUIRED_DOWNLEVEL: wgpu::DownlevelFlags =
    wgpu::DownlevelFlags::COMPUTE_SHADERS.union(wgpu::DownlevelFlags::VERTEX_STORAGE);

/// Fail with `ContextUnsupported` listing whatever is missing from `available`
pub fn check_downlevel(available: wgpu::DownlevelFlags) -> Result<(), InitError> {
    let missing = REQUIRED_DOWNLEVEL.difference(available);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(InitError::ContextUnsupported(missing))
    }
}

pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub fn create_instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        })
    }

    /// Request an adapter (compatible with `surface` when given) and a device
    pub async fn new(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, InitError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        check_downlevel(adapter.get_downlevel_capabilities().flags)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Context without a surface, used for offscreen stepping and tests
    pub async fn headless() -> Result<Self, InitError> {
        let instance = Self::create_instance();
        Self::new(&instance, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_capabilities_pass() {
        assert!(check_downlevel(wgpu::DownlevelFlags::all()).is_ok());
        assert!(check_downlevel(REQUIRED_DOWNLEVEL).is_ok());
    }

    #[test]
    fn missing_compute_is_reported() {
        match check_downlevel(wgpu::DownlevelFlags::VERTEX_STORAGE) {
            Err(InitError::ContextUnsupported(missing)) => {
                assert_eq!(missing, wgpu::DownlevelFlags::COMPUTE_SHADERS);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
