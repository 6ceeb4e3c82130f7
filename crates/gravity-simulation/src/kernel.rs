//! The particle update compute pipeline

use gravity_physics::{MassRegistry, PackedMass, MAX_MASS_COUNT};

use crate::error::ResourceError;
use crate::params::PhysicsParams;
use crate::program::{UPDATE_PROGRAM, WORKGROUP_SIZE};
use crate::scheduler::SetIndex;
use crate::store::ParticleStore;

/// Number of workgroups covering `count` particles
pub fn workgroup_count(count: u32) -> u32 {
    count.div_ceil(WORKGROUP_SIZE)
}

/// Zero-padded contents of the `Masses` uniform block
pub fn mass_block(registry: &MassRegistry) -> Result<[PackedMass; MAX_MASS_COUNT], ResourceError> {
    if registry.len() > MAX_MASS_COUNT {
        return Err(ResourceError::TooManyMasses {
            requested: registry.len(),
            max: MAX_MASS_COUNT,
        });
    }

    let mut block = [PackedMass::default(); MAX_MASS_COUNT];
    for (slot, packed) in block.iter_mut().zip(registry.pack()) {
        *slot = packed;
    }
    Ok(block)
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Physics step on the GPU.
///
/// Holds one bind group per buffer set: bind group `i` reads set `i` and
/// writes the other one, so a dispatch never reads and writes the same buffers.
pub struct PhysicsKernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    mass_buffer: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
    bound_generation: u64,
}

impl PhysicsKernel {
    pub fn new(device: &wgpu::Device, store: &ParticleStore) -> Self {
        let shader = UPDATE_PROGRAM.create_module(device);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Update Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                storage_entry(2, true),
                storage_entry(3, true),
                storage_entry(4, true),
                storage_entry(5, false),
                storage_entry(6, false),
                storage_entry(7, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Update Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Update Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Physics Params Buffer"),
            size: std::mem::size_of::<PhysicsParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mass_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mass Block Buffer"),
            size: (std::mem::size_of::<PackedMass>() * MAX_MASS_COUNT) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_groups = Self::create_bind_groups(
            device,
            &bind_group_layout,
            &params_buffer,
            &mass_buffer,
            store,
        );

        Self {
            pipeline,
            bind_group_layout,
            params_buffer,
            mass_buffer,
            bind_groups,
            bound_generation: store.generation(),
        }
    }

    fn create_bind_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params_buffer: &wgpu::Buffer,
        mass_buffer: &wgpu::Buffer,
        store: &ParticleStore,
    ) -> [wgpu::BindGroup; 2] {
        [SetIndex::A, SetIndex::B].map(|source| {
            let src = store.set(source);
            let dst = store.set(source.other());
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Update Bind Group (source {:?})", source)),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: mass_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: src.position.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: src.color.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: src.velocity.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: dst.position.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: dst.color.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 7,
                        resource: dst.velocity.as_entire_binding(),
                    },
                ],
            })
        })
    }

    /// Rebuild bind groups if the store was recreated since the last bind
    pub fn rebind(&mut self, device: &wgpu::Device, store: &ParticleStore) {
        if self.bound_generation == store.generation() {
            return;
        }
        self.bind_groups = Self::create_bind_groups(
            device,
            &self.bind_group_layout,
            &self.params_buffer,
            &self.mass_buffer,
            store,
        );
        self.bound_generation = store.generation();
    }

    /// Write this tick's parameters and mass block
    pub fn upload(
        &self,
        queue: &wgpu::Queue,
        params: &PhysicsParams,
        registry: &MassRegistry,
    ) -> Result<(), ResourceError> {
        let block = mass_block(registry)?;
        queue.write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[*params]));
        queue.write_buffer(&self.mass_buffer, 0, bytemuck::cast_slice(&block));
        Ok(())
    }

    /// Record one step that reads `source` and writes the other set
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, source: SetIndex, count: u32) {
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Update Compute Pass"),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(&self.pipeline);
        compute_pass.set_bind_group(0, &self.bind_groups[source.as_usize()], &[]);
        compute_pass.dispatch_workgroups(workgroup_count(count), 1, 1);
    }
}
