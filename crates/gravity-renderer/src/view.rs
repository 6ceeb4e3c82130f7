//! Per-frame view uniform shared by both renderers

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use gravity_simulation::Viewport;

/// Layout matches `View` in `particle.wgsl` and `mass.wgsl`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ViewUniform {
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub _padding: f32,
}

impl ViewUniform {
    pub fn new(viewport: Viewport, point_size: f32) -> Self {
        Self {
            viewport: [viewport.width.max(1.0), viewport.height.max(1.0)],
            point_size,
            _padding: 0.0,
        }
    }

    /// Half size of a point quad in NDC
    pub fn half_extent(&self) -> Vec2 {
        Vec2::splat(self.point_size) / Vec2::from_array(self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_one_vec4() {
        assert_eq!(std::mem::size_of::<ViewUniform>(), 16);
    }

    #[test]
    fn point_size_is_in_pixels() {
        let view = ViewUniform::new(Viewport::new(800.0, 400.0), 4.0);
        // A 4 px quad spans 4 / 800 * 2 NDC units horizontally
        assert_eq!(view.half_extent(), Vec2::new(0.005, 0.01));
    }

    #[test]
    fn empty_viewport_does_not_divide_by_zero() {
        let view = ViewUniform::new(Viewport::new(0.0, 0.0), 3.0);
        assert!(view.half_extent().is_finite());
    }
}
