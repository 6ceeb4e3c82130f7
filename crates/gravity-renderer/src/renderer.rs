//! Particle rendering system

use gravity_simulation::{ParticleStore, SetIndex};

use crate::programs::PARTICLE_PROGRAM;
use crate::view::ViewUniform;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Begin the frame's main pass: clear to black, no depth attachment
pub fn begin_frame_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

/// Draws every particle of one buffer set as a soft round dot.
///
/// Holds one bind group per buffer set; callers only say which set to draw.
pub struct ParticleRenderer {
    render_pipeline: wgpu::RenderPipeline,
    view_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_groups: [wgpu::BindGroup; 2],
    bound_generation: u64,
}

impl ParticleRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, store: &ParticleStore) -> Self {
        let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("View Buffer"),
            size: std::mem::size_of::<ViewUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = PARTICLE_PROGRAM.create_module(device);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[
                // View (Uniform) - Binding 0
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Positions (Storage) - Binding 1
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Colors (Storage) - Binding 2
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vertex"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fragment"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let bind_groups = Self::create_bind_groups(device, &bind_group_layout, &view_buffer, store);

        Self {
            render_pipeline,
            view_buffer,
            bind_group_layout,
            bind_groups,
            bound_generation: store.generation(),
        }
    }

    fn create_bind_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        view_buffer: &wgpu::Buffer,
        store: &ParticleStore,
    ) -> [wgpu::BindGroup; 2] {
        [SetIndex::A, SetIndex::B].map(|index| {
            let set = store.set(index);
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Particle Bind Group {:?}", index)),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: view_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: set.position.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: set.color.as_entire_binding(),
                    },
                ],
            })
        })
    }

    /// Rebuild bind groups after the store was recreated
    pub fn rebind(&mut self, device: &wgpu::Device, store: &ParticleStore) {
        if self.bound_generation == store.generation() {
            return;
        }
        log::debug!("Rebinding particle renderer to store generation {}", store.generation());
        self.bind_groups =
            Self::create_bind_groups(device, &self.bind_group_layout, &self.view_buffer, store);
        self.bound_generation = store.generation();
    }

    /// Shared with the mass-marker renderer
    pub fn view_buffer(&self) -> &wgpu::Buffer {
        &self.view_buffer
    }

    pub fn update_view(&self, queue: &wgpu::Queue, view: &ViewUniform) {
        queue.write_buffer(&self.view_buffer, 0, bytemuck::cast_slice(&[*view]));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, set: SetIndex, count: u32) {
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, &self.bind_groups[set.as_usize()], &[]);
        render_pass.draw(0..6, 0..count);
    }
}
