use egui::Context;
use egui_wgpu::Renderer;
use egui_winit::State;
use gravity_simulation::{
    TunableChange, Tunables, GRAVITY_RANGE, NUM_PARTICLES_RANGE, POINT_SIZE_RANGE,
};
use wgpu::{Device, TextureFormat};
use winit::{event::WindowEvent, window::Window};

pub struct UiState {
    pub fps: f32,
    pub frame_time: f32,
    pub ticks: u64,
    pub particle_count: u32,
    pub mass_count: usize,
    pub picked_mass: Option<usize>,
    /// Live values edited by the Parameters panel
    pub tunables: Tunables,
}

impl UiState {
    pub fn new(tunables: Tunables) -> Self {
        Self {
            fps: 0.0,
            frame_time: 0.0,
            ticks: 0,
            particle_count: tunables.num_particles,
            mass_count: 0,
            picked_mass: None,
            tunables,
        }
    }
}

pub struct Gui {
    context: Context,
    state: State,
    renderer: Renderer,
}

impl Gui {
    pub fn new(device: &Device, output_color_format: TextureFormat, window: &Window) -> Self {
        let context = Context::default();
        let id = context.viewport_id();

        let state = State::new(
            context.clone(),
            id,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );

        let renderer = Renderer::new(
            device,
            output_color_format,
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            context,
            state,
            renderer,
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);
        response.consumed
    }

    /// Draw the panels on top of `view`. Returns the tunable edits made this
    /// frame; the caller applies them.
    pub fn render(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        ui_state: &mut UiState,
    ) -> Vec<TunableChange> {
        let raw_input = self.state.take_egui_input(window);

        let mut changes = Vec::new();
        let full_output = self.context.run(raw_input, |ctx| {
            changes.extend(Self::ui(ctx, ui_state));
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let size = window.inner_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        changes
    }

    fn ui(ctx: &Context, state: &mut UiState) -> Vec<TunableChange> {
        // Diagnostics Panel (Top Left)
        egui::Window::new("Diagnostics")
            .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", state.fps));
                ui.label(format!("Frame Time: {:.2} ms", state.frame_time));
                ui.label(format!("Ticks: {}", state.ticks));
                ui.separator();
                ui.label(format!("Particles: {}", state.particle_count));
                ui.label(format!("Masses: {}", state.mass_count));
                match state.picked_mass {
                    Some(index) => ui.label(format!("Dragging mass {}", index)),
                    None => ui.label("Dragging: none"),
                };
            });

        // Tunables (Top Right)
        let mut edited = state.tunables;
        egui::Window::new("Parameters")
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.add(
                    egui::Slider::new(&mut edited.num_particles, NUM_PARTICLES_RANGE)
                        .text("numParticles")
                        .step_by(1.0),
                );
                ui.add(
                    egui::Slider::new(&mut edited.point_size, POINT_SIZE_RANGE)
                        .text("pointSize")
                        .step_by(1.0),
                );
                ui.add(
                    egui::Slider::new(&mut edited.gravity_strength, GRAVITY_RANGE)
                        .text("gravityStrength")
                        .logarithmic(true),
                );
                ui.checkbox(&mut edited.show_mass_markers, "showMassMarkers");
            });

        state.tunables.diff(&edited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_reports_edits_without_applying_them() {
        let ctx = Context::default();
        let mut state = UiState::new(Tunables::default());
        let before = state.tunables;

        let mut changes = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            changes.extend(Gui::ui(ctx, &mut state));
        });

        assert!(changes.is_empty());
        assert_eq!(state.tunables, before);
    }
}
