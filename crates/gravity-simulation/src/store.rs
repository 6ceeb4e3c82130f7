//! Device-side particle storage: two identical buffer sets

use gravity_physics::{ParticleAttributes, ATTRIBUTE_STRIDE};
use rand::Rng;

use crate::error::ResourceError;
use crate::scheduler::SetIndex;

/// Position, color and velocity buffers of one set.
/// Each holds `count` tightly packed `[f32; 3]`.
pub struct BufferSet {
    pub position: wgpu::Buffer,
    pub color: wgpu::Buffer,
    pub velocity: wgpu::Buffer,
}

impl BufferSet {
    fn new(device: &wgpu::Device, set: SetIndex, size: u64) -> Self {
        let create = |attribute: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Particle {} Buffer {:?}", attribute, set)),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };

        Self {
            position: create("Position"),
            color: create("Color"),
            velocity: create("Velocity"),
        }
    }

    fn upload(&self, queue: &wgpu::Queue, attributes: &ParticleAttributes) {
        queue.write_buffer(
            &self.position,
            0,
            bytemuck::cast_slice(&attributes.positions),
        );
        queue.write_buffer(&self.color, 0, bytemuck::cast_slice(&attributes.colors));
        queue.write_buffer(
            &self.velocity,
            0,
            bytemuck::cast_slice(&attributes.velocities),
        );
    }

    fn destroy(&self) {
        self.position.destroy();
        self.color.destroy();
        self.velocity.destroy();
    }
}

/// Size in bytes of one attribute buffer for `count` particles, if the device can hold it
pub fn check_capacity(count: u32, limits: &wgpu::Limits) -> Result<u64, ResourceError> {
    if count == 0 {
        return Err(ResourceError::EmptyStore);
    }

    let requested = count as u64 * ATTRIBUTE_STRIDE;
    let limit = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
    if requested > limit {
        return Err(ResourceError::BufferTooLarge { requested, limit });
    }

    Ok(requested)
}

/// Owns both buffer sets for one particle count.
///
/// A new particle count always means a new generation: every buffer is
/// replaced and all particles are re-randomized.
pub struct ParticleStore {
    sets: [BufferSet; 2],
    count: u32,
    generation: u64,
}

impl ParticleStore {
    /// Allocate both sets and upload the same random particles into each
    pub fn initialize<R: Rng>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        count: u32,
        rng: &mut R,
    ) -> Result<Self, ResourceError> {
        let size = check_capacity(count, &device.limits())?;
        let sets = Self::allocate(device, queue, count, size, rng)?;

        log::info!("Particle store created: {} particles", count);

        Ok(Self {
            sets,
            count,
            generation: 0,
        })
    }

    /// Replace every buffer with `count` fresh particles.
    ///
    /// Fails without touching the current buffers if `count` does not fit
    /// or the device runs out of memory. The old sets are only destroyed
    /// once the new ones exist.
    pub fn recreate<R: Rng>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        count: u32,
        rng: &mut R,
    ) -> Result<(), ResourceError> {
        let size = check_capacity(count, &device.limits())?;
        let sets = Self::allocate(device, queue, count, size, rng)?;

        let old = std::mem::replace(&mut self.sets, sets);
        for set in &old {
            set.destroy();
        }
        self.count = count;
        self.generation += 1;

        log::info!(
            "Particle store recreated: {} particles (generation {})",
            count,
            self.generation
        );
        Ok(())
    }

    fn allocate<R: Rng>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        count: u32,
        size: u64,
        rng: &mut R,
    ) -> Result<[BufferSet; 2], ResourceError> {
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let sets = [
            BufferSet::new(device, SetIndex::A, size),
            BufferSet::new(device, SetIndex::B, size),
        ];
        let captured = pollster::block_on(device.pop_error_scope());

        if let Err(e) = allocation_result(captured) {
            log::error!("Particle store allocation of {} particles failed: {}", count, e);
            for set in &sets {
                set.destroy();
            }
            return Err(e);
        }

        let attributes = ParticleAttributes::random(count as usize, rng);
        for set in &sets {
            set.upload(queue, &attributes);
        }
        Ok(sets)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Bumped on every `recreate`; bind groups built for an older generation are stale
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set(&self, index: SetIndex) -> &BufferSet {
        &self.sets[index.as_usize()]
    }

    /// Copy one set back to the CPU. Blocks until the GPU is done.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        index: SetIndex,
    ) -> Result<ParticleAttributes, ResourceError> {
        let size = self.count as u64 * ATTRIBUTE_STRIDE;
        let set = self.set(index);

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Staging Buffer"),
            size: size * 3,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(&set.position, 0, &staging, 0, size);
        encoder.copy_buffer_to_buffer(&set.color, 0, &staging, size, size);
        encoder.copy_buffer_to_buffer(&set.velocity, 0, &staging, size * 2, size);
        queue.submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = std::sync::mpsc::channel();
        let slice = staging.slice(..);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| ResourceError::Readback(e.to_string()))?;

        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ResourceError::Readback(e.to_string())),
            Err(_) => {
                return Err(ResourceError::Readback(
                    "map callback never ran".to_string(),
                ))
            }
        }

        let attributes = {
            let data = slice.get_mapped_range();
            let bytes: &[u8] = &data;
            let size = size as usize;
            ParticleAttributes {
                positions: decode_vec3s(&bytes[..size]),
                colors: decode_vec3s(&bytes[size..size * 2]),
                velocities: decode_vec3s(&bytes[size * 2..]),
            }
        };
        staging.unmap();

        Ok(attributes)
    }
}

impl Drop for ParticleStore {
    fn drop(&mut self) {
        for set in &self.sets {
            set.destroy();
        }
    }
}

/// Map an error captured around buffer creation
fn allocation_result(captured: Option<wgpu::Error>) -> Result<(), ResourceError> {
    match captured {
        None => Ok(()),
        Some(e) => Err(ResourceError::OutOfMemory(e.to_string())),
    }
}

/// Little-endian `[f32; 3]` triples
fn decode_vec3s(bytes: &[u8]) -> Vec<[f32; 3]> {
    bytes
        .chunks_exact(ATTRIBUTE_STRIDE as usize)
        .map(|chunk| {
            let mut v = [0.0f32; 3];
            for (component, word) in v.iter_mut().zip(chunk.chunks_exact(4)) {
                *component = f32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            }
            v
        })
        .collect()
}
