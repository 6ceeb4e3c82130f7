//! Live tunables, setup-time configuration and the kernel parameter uniform

use std::ops::RangeInclusive;

use bytemuck::{Pod, Zeroable};
use gravity_physics::{
    Falloff, MassPlacement, DEFAULT_GRAVITY, DEFAULT_MASS_COUNT, DEFAULT_PARTICLE_COUNT,
    DEFAULT_POINT_SIZE, DEFAULT_SOFTENING, MAX_GRAVITY, MAX_MASS_COUNT, MAX_PARTICLE_COUNT,
    MAX_POINT_SIZE, MIN_GRAVITY, MIN_PARTICLE_COUNT, MIN_POINT_SIZE,
};

pub const NUM_PARTICLES_RANGE: RangeInclusive<u32> = MIN_PARTICLE_COUNT..=MAX_PARTICLE_COUNT;
pub const POINT_SIZE_RANGE: RangeInclusive<f32> = MIN_POINT_SIZE..=MAX_POINT_SIZE;
pub const GRAVITY_RANGE: RangeInclusive<f32> = MIN_GRAVITY..=MAX_GRAVITY;

/// Values the tunable panel edits while the simulation runs.
///
/// The scheduler copies this once at the top of every tick, so a change made
/// mid-frame only takes effect on the next step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tunables {
    pub num_particles: u32,
    pub point_size: f32,
    pub gravity_strength: f32,
    pub show_mass_markers: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            num_particles: DEFAULT_PARTICLE_COUNT,
            point_size: DEFAULT_POINT_SIZE,
            gravity_strength: DEFAULT_GRAVITY,
            show_mass_markers: true,
        }
    }
}

/// A single edit coming from the tunable panel
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TunableChange {
    NumParticles(u32),
    PointSize(f32),
    GravityStrength(f32),
    ShowMassMarkers(bool),
}

impl TunableChange {
    /// Field name as exposed to the panel
    pub fn name(&self) -> &'static str {
        match self {
            TunableChange::NumParticles(_) => "numParticles",
            TunableChange::PointSize(_) => "pointSize",
            TunableChange::GravityStrength(_) => "gravityStrength",
            TunableChange::ShowMassMarkers(_) => "showMassMarkers",
        }
    }
}

impl Tunables {
    pub const FIELD_NAMES: [&'static str; 4] = [
        "numParticles",
        "pointSize",
        "gravityStrength",
        "showMassMarkers",
    ];

    /// Apply one change, clamping into the field's range.
    /// Returns true when the stored value actually changed.
    pub fn apply(&mut self, change: TunableChange) -> bool {
        let before = *self;
        match change {
            TunableChange::NumParticles(n) => {
                self.num_particles = n.clamp(*NUM_PARTICLES_RANGE.start(), *NUM_PARTICLES_RANGE.end());
            }
            TunableChange::PointSize(size) if size.is_finite() => {
                self.point_size = size.clamp(*POINT_SIZE_RANGE.start(), *POINT_SIZE_RANGE.end());
            }
            TunableChange::GravityStrength(g) if g.is_finite() => {
                self.gravity_strength = g.clamp(*GRAVITY_RANGE.start(), *GRAVITY_RANGE.end());
            }
            TunableChange::ShowMassMarkers(show) => self.show_mass_markers = show,
            TunableChange::PointSize(_) | TunableChange::GravityStrength(_) => {
                log::warn!("Ignoring non-finite value for {}", change.name());
            }
        }
        *self != before
    }

    /// Every change between `self` and `other`, in field order
    pub fn diff(&self, other: &Tunables) -> Vec<TunableChange> {
        let mut changes = Vec::new();
        if self.num_particles != other.num_particles {
            changes.push(TunableChange::NumParticles(other.num_particles));
        }
        if self.point_size != other.point_size {
            changes.push(TunableChange::PointSize(other.point_size));
        }
        if self.gravity_strength != other.gravity_strength {
            changes.push(TunableChange::GravityStrength(other.gravity_strength));
        }
        if self.show_mass_markers != other.show_mass_markers {
            changes.push(TunableChange::ShowMassMarkers(other.show_mass_markers));
        }
        changes
    }
}

/// Setup-time configuration. None of these change while a session runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub mass_count: usize,
    pub mass_placement: MassPlacement,
    pub falloff: Falloff,
    pub softening: f32,
    /// Fixed RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
    pub tunables: Tunables,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mass_count: DEFAULT_MASS_COUNT,
            mass_placement: MassPlacement::Volume,
            falloff: Falloff::default(),
            softening: DEFAULT_SOFTENING,
            seed: None,
            tunables: Tunables::default(),
        }
    }
}

impl SimulationConfig {
    pub const ENV_PARTICLES: &'static str = "GRAVITY_PARTICLES";
    pub const ENV_MASSES: &'static str = "GRAVITY_MASSES";
    pub const ENV_FALLOFF: &'static str = "GRAVITY_FALLOFF";
    pub const ENV_MASS_PLANE: &'static str = "GRAVITY_MASS_PLANE";
    pub const ENV_SEED: &'static str = "GRAVITY_SEED";

    /// Defaults overlaid with overrides from `lookup` (usually `std::env::var`).
    /// Unparseable values keep the default and log a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(n) = parse_var::<u32, _>(&lookup, Self::ENV_PARTICLES) {
            config.tunables.apply(TunableChange::NumParticles(n));
        }
        if let Some(count) = parse_var::<usize, _>(&lookup, Self::ENV_MASSES) {
            if (1..=MAX_MASS_COUNT).contains(&count) {
                config.mass_count = count;
            } else {
                log::warn!(
                    "{}={} outside 1..={}, keeping {}",
                    Self::ENV_MASSES,
                    count,
                    MAX_MASS_COUNT,
                    config.mass_count
                );
            }
        }
        if let Some(falloff) = parse_var::<Falloff, _>(&lookup, Self::ENV_FALLOFF) {
            config.falloff = falloff;
        }
        if let Some(plane) = parse_var::<bool, _>(&lookup, Self::ENV_MASS_PLANE) {
            config.mass_placement = if plane {
                MassPlacement::Plane
            } else {
                MassPlacement::Volume
            };
        }
        config.seed = parse_var::<u64, _>(&lookup, Self::ENV_SEED);

        config
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}

/// Kernel parameter uniform. Layout matches `Params` in `update.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PhysicsParams {
    pub particle_count: u32,
    pub mass_count: u32,
    pub gravity: f32,
    pub point_size: f32,

    pub falloff_exponent: f32,
    pub softening: f32,
    pub _padding: [f32; 2],
}

impl PhysicsParams {
    pub fn new(
        particle_count: u32,
        tunables: &Tunables,
        mass_count: usize,
        falloff: Falloff,
        softening: f32,
    ) -> Self {
        Self {
            particle_count,
            mass_count: mass_count as u32,
            gravity: tunables.gravity_strength,
            point_size: tunables.point_size,
            falloff_exponent: falloff.exponent(),
            softening,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_panel_ranges() {
        let t = Tunables::default();
        assert_eq!(t.num_particles, 10_000);
        assert_eq!(t.point_size, 3.0);
        assert_eq!(t.gravity_strength, 0.000_02);
        assert!(t.show_mass_markers);
    }

    #[test]
    fn apply_clamps_into_range() {
        let mut t = Tunables::default();

        assert!(t.apply(TunableChange::NumParticles(50)));
        assert_eq!(t.num_particles, MIN_PARTICLE_COUNT);

        assert!(t.apply(TunableChange::PointSize(99.0)));
        assert_eq!(t.point_size, MAX_POINT_SIZE);

        assert!(t.apply(TunableChange::GravityStrength(1.0)));
        assert_eq!(t.gravity_strength, MAX_GRAVITY);

        assert!(!t.apply(TunableChange::GravityStrength(f32::NAN)));
        assert_eq!(t.gravity_strength, MAX_GRAVITY);

        assert!(t.apply(TunableChange::ShowMassMarkers(false)));
        assert!(!t.apply(TunableChange::ShowMassMarkers(false)));
    }

    #[test]
    fn particle_count_is_not_rounded() {
        let mut t = Tunables::default();
        assert!(t.apply(TunableChange::NumParticles(1234)));
        assert_eq!(t.num_particles, 1234);
    }

    #[test]
    fn diff_reports_changed_fields_in_order() {
        let a = Tunables::default();
        let mut b = a;
        b.point_size = 5.0;
        b.show_mass_markers = false;

        let changes = a.diff(&b);
        assert_eq!(
            changes,
            vec![
                TunableChange::PointSize(5.0),
                TunableChange::ShowMassMarkers(false)
            ]
        );
        assert_eq!(changes[0].name(), Tunables::FIELD_NAMES[1]);
        assert!(a.diff(&a).is_empty());
    }

    #[test]
    fn config_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GRAVITY_PARTICLES", "2500"),
            ("GRAVITY_MASSES", "10"),
            ("GRAVITY_FALLOFF", "inverse-distance"),
            ("GRAVITY_MASS_PLANE", "true"),
            ("GRAVITY_SEED", "42"),
        ]
        .into_iter()
        .collect();

        let config =
            SimulationConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.tunables.num_particles, 2500);
        assert_eq!(config.mass_count, 10);
        assert_eq!(config.falloff, Falloff::InverseDistance);
        assert_eq!(config.mass_placement, MassPlacement::Plane);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn config_ignores_bad_values() {
        let config = SimulationConfig::from_lookup(|key| match key {
            "GRAVITY_MASSES" => Some("99".into()),
            "GRAVITY_FALLOFF" => Some("cubic".into()),
            "GRAVITY_PARTICLES" => Some("lots".into()),
            _ => None,
        });

        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn params_layout_is_two_vec4s() {
        assert_eq!(std::mem::size_of::<PhysicsParams>(), 32);

        let params =
            PhysicsParams::new(1_000, &Tunables::default(), 3, Falloff::InverseSquare, 0.01);
        assert_eq!(params.particle_count, 1_000);
        assert_eq!(params.gravity, 0.000_02);
        assert_eq!(params.mass_count, 3);
        assert_eq!(params.falloff_exponent, 2.0);
    }
}
