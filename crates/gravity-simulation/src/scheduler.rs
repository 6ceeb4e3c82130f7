//! Ping-pong frame scheduling
//!
//! Two buffer sets alternate between the "source" role (read by the kernel)
//! and the "destination" role (written by the kernel). Reading and writing the
//! same set inside one dispatch would alias, so the roles swap after every step.

/// Index of one of the two buffer sets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetIndex {
    A = 0,
    B = 1,
}

impl SetIndex {
    pub fn other(self) -> Self {
        match self {
            SetIndex::A => SetIndex::B,
            SetIndex::B => SetIndex::A,
        }
    }

    pub fn as_usize(self) -> usize {
        self as usize
    }
}

/// Source/destination roles for the two buffer sets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingPong {
    source: SetIndex,
}

impl Default for PingPong {
    fn default() -> Self {
        Self::new()
    }
}

impl PingPong {
    /// Starts with B as source, so the first step writes A
    pub fn new() -> Self {
        Self { source: SetIndex::B }
    }

    pub fn source(&self) -> SetIndex {
        self.source
    }

    pub fn destination(&self) -> SetIndex {
        self.source.other()
    }

    pub fn flip(&mut self) {
        self.source = self.source.other();
    }
}

/// Roles handed out for one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub source: SetIndex,
    pub destination: SetIndex,
}

/// Drives the tick loop: one physics step per tick, roles flipped after each.
///
/// The loop keeps going while `running` is set. Clearing it is the only way to
/// stop, and it is observed at the top of the next tick.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
    ping_pong: PingPong,
    running: bool,
    ticks: u64,
    in_step: bool,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            ping_pong: PingPong::new(),
            running: true,
            ticks: 0,
            in_step: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Request a stop; takes effect at the next `begin_tick`
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The set holding the most recent particle state
    pub fn current(&self) -> SetIndex {
        self.ping_pong.source()
    }

    pub fn ping_pong(&self) -> PingPong {
        self.ping_pong
    }

    /// Roles for this tick, or `None` once the loop has been stopped.
    /// Must be paired with exactly one `end_tick`.
    pub fn begin_tick(&mut self) -> Option<Step> {
        if !self.running {
            return None;
        }
        if self.in_step {
            log::warn!("begin_tick called twice without end_tick");
        }
        self.in_step = true;
        Some(Step {
            source: self.ping_pong.source(),
            destination: self.ping_pong.destination(),
        })
    }

    /// Flip roles after the kernel dispatch
    pub fn end_tick(&mut self) {
        if !self.in_step {
            log::warn!("end_tick without begin_tick ignored");
            return;
        }
        self.in_step = false;
        self.ping_pong.flip();
        self.ticks += 1;
    }
}
