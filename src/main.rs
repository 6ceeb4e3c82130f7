//! Gravity Particles
//!
//! Thousands of particles pulled toward a handful of masses, stepped entirely
//! on the GPU. Drag a mass with the mouse or a finger to reshape the flow.

mod gui;

use glam::Vec2;
use gravity_renderer::{begin_frame_pass, MassRenderer, ParticleRenderer, ViewUniform};
use gravity_simulation::{
    GpuContext, GravitySimulation, InitError, InteractionController, PointerKind, ResourceError,
    SimulationConfig, SurfaceSource, TickOutcome, Viewport,
};
use gui::{Gui, UiState};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Anything that keeps the first frame from being drawn
#[derive(Debug)]
enum StartupError {
    Init(InitError),
    Resource(ResourceError),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Init(e) => write!(f, "{}", e),
            StartupError::Resource(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::Init(e) => Some(e),
            StartupError::Resource(e) => Some(e),
        }
    }
}

impl From<InitError> for StartupError {
    fn from(e: InitError) -> Self {
        StartupError::Init(e)
    }
}

impl From<ResourceError> for StartupError {
    fn from(e: ResourceError) -> Self {
        StartupError::Resource(e)
    }
}

/// Result of one redraw
enum Frame {
    Presented { fps: f32, frame_time: f32 },
    Stopped,
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    simulation: GravitySimulation,
    particle_renderer: ParticleRenderer,
    mass_renderer: MassRenderer,
    controller: InteractionController,

    gui: Gui,
    ui_state: UiState,

    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl GpuState {
    async fn new(
        source: SurfaceSource<Arc<Window>>,
        sim_config: SimulationConfig,
    ) -> Result<Self, StartupError> {
        // Desktop windows are always passed as handles; there is nothing to look up by name
        let window = source.resolve(|_| None)?;
        let size = window.inner_size();

        let instance = GpuContext::create_instance();
        let surface = instance
            .create_surface(window.clone())
            .map_err(InitError::from)?;

        let GpuContext {
            adapter,
            device,
            queue,
        } = GpuContext::new(&instance, Some(&surface)).await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let tunables = sim_config.tunables;
        let simulation = GravitySimulation::new(device.clone(), queue.clone(), sim_config)?;
        log::info!("✓ Simulation initialized");

        let particle_renderer = ParticleRenderer::new(&device, config.format, simulation.store());
        let mass_renderer =
            MassRenderer::new(&device, config.format, particle_renderer.view_buffer());
        log::info!("✓ Renderers initialized");

        let viewport = Viewport::new(config.width as f32, config.height as f32);
        let controller = InteractionController::new(simulation.command_sender(), viewport);

        let gui = Gui::new(&device, config.format, &window);
        let mut ui_state = UiState::new(tunables);
        ui_state.mass_count = simulation.registry().len();

        Ok(Self {
            surface,
            device,
            queue,
            config,
            simulation,
            particle_renderer,
            mass_renderer,
            controller,
            gui,
            ui_state,
            frame_times: VecDeque::with_capacity(100),
            last_frame_time: Instant::now(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.controller.set_viewport(Viewport::new(
                new_size.width as f32,
                new_size.height as f32,
            ));
        }
    }

    fn pointer_down(&mut self, position: Vec2, kind: PointerKind) {
        self.controller
            .pointer_down(position, kind, self.simulation.registry());
    }

    fn pointer_move(&mut self, position: Vec2) {
        self.controller
            .pointer_move(position, self.simulation.registry());
    }

    fn touch(&mut self, touch: &Touch) {
        let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        let registry = self.simulation.registry();
        match touch.phase {
            TouchPhase::Started => self.controller.touch_start(touch.id, position, registry),
            TouchPhase::Moved => self.controller.touch_move(touch.id, position, registry),
            TouchPhase::Ended | TouchPhase::Cancelled => self.controller.touch_end(touch.id),
        }
    }

    fn render(&mut self, window: &Window) -> Result<Frame, wgpu::SurfaceError> {
        // Track frame time
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        self.frame_times.push_back(frame_time);
        if self.frame_times.len() > 100 {
            self.frame_times.pop_front();
        }
        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = if avg_frame_time > 0.0 {
            1000.0 / avg_frame_time
        } else {
            0.0
        };

        // Acquire first so a lost surface does not cost a step
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // One physics step with this frame's snapshot of the tunables
        let tunables = self.ui_state.tunables;
        match self.simulation.tick(&tunables) {
            Ok(TickOutcome::Stopped) => return Ok(Frame::Stopped),
            Ok(TickOutcome::Stepped(report)) => {
                if report.commands_applied > 0 {
                    log::trace!("Applied {} mass commands", report.commands_applied);
                }
            }
            Err(e) => {
                log::error!("Simulation step failed: {}", e);
                // Keep the panel in sync with the store that is still alive
                self.ui_state.tunables.num_particles = self.simulation.particle_count();
            }
        }

        self.particle_renderer
            .rebind(&self.device, self.simulation.store());
        self.particle_renderer.update_view(
            &self.queue,
            &ViewUniform::new(self.controller.viewport(), tunables.point_size),
        );
        self.mass_renderer
            .update(&self.queue, &self.simulation.registry().pack());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = begin_frame_pass(&mut encoder, &view);
            if tunables.show_mass_markers {
                self.mass_renderer.draw(&mut render_pass);
            }
            self.particle_renderer.draw(
                &mut render_pass,
                self.simulation.current(),
                self.simulation.particle_count(),
            );
        }

        self.ui_state.fps = fps;
        self.ui_state.frame_time = avg_frame_time;
        self.ui_state.ticks = self.simulation.ticks();
        self.ui_state.particle_count = self.simulation.particle_count();
        self.ui_state.picked_mass = self.controller.picked();

        let changes = self.gui.render(
            &self.device,
            &self.queue,
            &mut encoder,
            window,
            &view,
            &mut self.ui_state,
        );
        for change in changes {
            if self.ui_state.tunables.apply(change) {
                log::debug!("{} changed: {:?}", change.name(), change);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(Frame::Presented {
            fps,
            frame_time: avg_frame_time,
        })
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    sim_config: SimulationConfig,
    last_cursor_pos: Option<Vec2>,
}

impl App {
    /// Ask the session to stop; the next redraw observes it and exits
    fn request_stop(&mut self, event_loop: &ActiveEventLoop) {
        match (&mut self.gpu_state, &self.window) {
            (Some(gpu_state), Some(window)) => {
                gpu_state.simulation.stop();
                window.request_redraw();
            }
            _ => event_loop.exit(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Gravity Particles")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let source = SurfaceSource::from(window.clone());
        match pollster::block_on(GpuState::new(source, self.sim_config.clone())) {
            Ok(gpu_state) => {
                self.gpu_state = Some(gpu_state);
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                log::error!("Failed to start: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Handle GUI events. Releases always reach the controller so a drag
        // ending over a panel still drops the picked mass.
        if let (Some(gpu_state), Some(window)) = (&mut self.gpu_state, &self.window) {
            if gpu_state.gui.handle_event(window, &event) && !ends_pointer(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.request_stop(event_loop),

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    match state {
                        ElementState::Pressed => {
                            if let Some(position) = self.last_cursor_pos {
                                gpu_state.pointer_down(position, PointerKind::Mouse);
                            }
                        }
                        ElementState::Released => gpu_state.controller.pointer_up(),
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.last_cursor_pos = Some(position);

                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.pointer_move(position);
                }
            }

            WindowEvent::Touch(touch) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.touch(&touch);
                }
            }

            WindowEvent::RedrawRequested => {
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    match gpu_state.render(window) {
                        Ok(Frame::Presented { fps, frame_time }) => {
                            window.set_title(&format!(
                                "Gravity Particles - {:.0} FPS ({:.2}ms) - {} particles",
                                fps,
                                frame_time,
                                gpu_state.simulation.particle_count()
                            ));
                            window.request_redraw();
                        }
                        Ok(Frame::Stopped) => event_loop.exit(),
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            gpu_state.resize(window.inner_size());
                            window.request_redraw();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Surface out of memory, stopping");
                            gpu_state.simulation.stop();
                            event_loop.exit();
                        }
                        Err(e) => {
                            log::warn!("Render error: {:?}", e);
                            window.request_redraw();
                        }
                    }
                }
            }

            _ => {}
        }
    }
}

/// Button release or touch end/cancel
fn ends_pointer(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::MouseInput {
            state: ElementState::Released,
            ..
        } | WindowEvent::Touch(Touch {
            phase: TouchPhase::Ended | TouchPhase::Cancelled,
            ..
        })
    )
}

fn main() {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting gravity particle simulation...");

    let sim_config = SimulationConfig::from_lookup(|key| std::env::var(key).ok());

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        window: None,
        gpu_state: None,
        sim_config,
        last_cursor_pos: None,
    };

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    fn touch(phase: TouchPhase) -> WindowEvent {
        WindowEvent::Touch(Touch {
            device_id: unsafe { DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(10.0, 10.0),
            force: None,
            id: 1,
        })
    }

    fn mouse(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: unsafe { DeviceId::dummy() },
            state,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn releases_bypass_the_gui() {
        assert!(ends_pointer(&mouse(ElementState::Released)));
        assert!(ends_pointer(&touch(TouchPhase::Ended)));
        assert!(ends_pointer(&touch(TouchPhase::Cancelled)));
    }

    #[test]
    fn presses_and_moves_can_be_consumed() {
        assert!(!ends_pointer(&mouse(ElementState::Pressed)));
        assert!(!ends_pointer(&touch(TouchPhase::Started)));
        assert!(!ends_pointer(&touch(TouchPhase::Moved)));
        assert!(!ends_pointer(&WindowEvent::CloseRequested));
    }
}
