//! GPU-resident gravity simulation session
//!
//! Ties together the particle store, the mass registry, the update kernel and
//! the frame scheduler. One `tick` is one physics step.

use std::sync::mpsc::{Receiver, Sender};

use gravity_physics::{MassRegistry, ParticleAttributes, MAX_MASS_COUNT};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::ResourceError;
use crate::interaction::{apply_commands, command_channel, MassCommand};
use crate::kernel::PhysicsKernel;
use crate::params::{PhysicsParams, SimulationConfig, Tunables};
use crate::scheduler::{FrameScheduler, SetIndex, Step};
use crate::store::ParticleStore;

/// What a completed tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub step: Step,
    /// The store was recreated for a new particle count before stepping
    pub recreated: bool,
    /// Mass commands applied this tick
    pub commands_applied: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Stepped(TickReport),
    /// The session was stopped; nothing was done
    Stopped,
}

pub struct GravitySimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,

    store: ParticleStore,
    kernel: PhysicsKernel,
    registry: MassRegistry,
    scheduler: FrameScheduler,

    commands: Receiver<MassCommand>,
    command_sender: Sender<MassCommand>,

    config: SimulationConfig,
    rng: StdRng,
}

impl GravitySimulation {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: SimulationConfig,
    ) -> Result<Self, ResourceError> {
        log::info!("Initializing GravitySimulation...");

        if config.mass_count > MAX_MASS_COUNT {
            return Err(ResourceError::TooManyMasses {
                requested: config.mass_count,
                max: MAX_MASS_COUNT,
            });
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let store =
            ParticleStore::initialize(&device, &queue, config.tunables.num_particles, &mut rng)?;
        let registry = MassRegistry::initialize(
            config.mass_count,
            config.tunables.gravity_strength,
            config.mass_placement,
            &mut rng,
        );
        let kernel = PhysicsKernel::new(&device, &store);
        let (command_sender, commands) = command_channel();

        log::info!(
            "{} masses ({:?}), falloff {}",
            registry.len(),
            config.mass_placement,
            config.falloff
        );

        Ok(Self {
            device,
            queue,
            store,
            kernel,
            registry,
            scheduler: FrameScheduler::new(),
            commands,
            command_sender,
            config,
            rng,
        })
    }

    /// Run one physics step with a snapshot of `tunables`.
    ///
    /// A failed recreate leaves the previous store in place and does not step.
    pub fn tick(&mut self, tunables: &Tunables) -> Result<TickOutcome, ResourceError> {
        if !self.scheduler.is_running() {
            return Ok(TickOutcome::Stopped);
        }
        let snapshot = *tunables;

        let recreated = snapshot.num_particles != self.store.count();
        if recreated {
            self.store.recreate(
                &self.device,
                &self.queue,
                snapshot.num_particles,
                &mut self.rng,
            )?;
            self.kernel.rebind(&self.device, &self.store);
        }

        let commands_applied = apply_commands(&mut self.registry, &self.commands);
        self.registry.set_strength(snapshot.gravity_strength);

        let params = PhysicsParams::new(
            self.store.count(),
            &snapshot,
            self.registry.len(),
            self.config.falloff,
            self.config.softening,
        );
        self.kernel.upload(&self.queue, &params, &self.registry)?;

        let Some(step) = self.scheduler.begin_tick() else {
            return Ok(TickOutcome::Stopped);
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Simulation Encoder"),
            });
        self.kernel
            .encode(&mut encoder, step.source, self.store.count());
        self.queue.submit(std::iter::once(encoder.finish()));

        self.scheduler.end_tick();

        Ok(TickOutcome::Stepped(TickReport {
            step,
            recreated,
            commands_applied,
        }))
    }

    /// Stop the session; observed by the next `tick`
    pub fn stop(&mut self) {
        log::info!("Stopping simulation after {} ticks", self.scheduler.ticks());
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// The set written by the last step, which is what should be drawn
    pub fn current(&self) -> SetIndex {
        self.scheduler.current()
    }

    pub fn ticks(&self) -> u64 {
        self.scheduler.ticks()
    }

    pub fn particle_count(&self) -> u32 {
        self.store.count()
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn registry(&self) -> &MassRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// A new handle for queueing mass commands
    pub fn command_sender(&self) -> Sender<MassCommand> {
        self.command_sender.clone()
    }

    /// Read one buffer set back to the CPU (blocking)
    pub fn read_back(&self, index: SetIndex) -> Result<ParticleAttributes, ResourceError> {
        self.store.read_back(&self.device, &self.queue, index)
    }

    pub fn read_current(&self) -> Result<ParticleAttributes, ResourceError> {
        self.read_back(self.current())
    }
}
