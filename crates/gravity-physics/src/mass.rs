//! Attractor masses and the registry that owns them

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use rand::Rng;

use crate::constants::MAX_MASS_COUNT;

/// A point attractor: position plus strength
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mass {
    pub position: Vec3,
    pub strength: f32,
}

impl Mass {
    pub fn new(position: Vec3, strength: f32) -> Self {
        Self { position, strength }
    }

    /// `(x, y, z, strength)` as laid out in the `Masses` uniform block
    pub fn to_packed(&self) -> PackedMass {
        PackedMass([
            self.position.x,
            self.position.y,
            self.position.z,
            self.strength,
        ])
    }

    pub fn xy(&self) -> Vec2 {
        self.position.truncate()
    }
}

/// One `vec4<f32>` entry of the `Masses` uniform block
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PackedMass(pub [f32; 4]);

/// Where masses are placed when the registry is created
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MassPlacement {
    /// Random position in the full `[-1, 1]^3` cube
    #[default]
    Volume,
    /// Random x/y, z fixed at 0
    Plane,
}

/// Fixed, ordered set of masses.
///
/// The order is stable for the whole session: picking and the packed uniform
/// both address masses by index.
#[derive(Clone, Debug, PartialEq)]
pub struct MassRegistry {
    masses: Vec<Mass>,
}

impl MassRegistry {
    /// Create `count` masses at uniform random positions with the given strength.
    ///
    /// `count` is clamped to `1..=MAX_MASS_COUNT`; callers validate the
    /// configured value beforehand.
    pub fn initialize<R: Rng>(
        count: usize,
        strength: f32,
        placement: MassPlacement,
        rng: &mut R,
    ) -> Self {
        let count = count.clamp(1, MAX_MASS_COUNT);
        let masses = (0..count)
            .map(|_| {
                let x = rng.random_range(-1.0..=1.0);
                let y = rng.random_range(-1.0..=1.0);
                let z = match placement {
                    MassPlacement::Volume => rng.random_range(-1.0..=1.0),
                    MassPlacement::Plane => 0.0,
                };
                Mass::new(Vec3::new(x, y, z), strength)
            })
            .collect();

        Self { masses }
    }

    /// Build a registry from explicit masses (truncated to `MAX_MASS_COUNT`)
    pub fn from_masses(mut masses: Vec<Mass>) -> Self {
        masses.truncate(MAX_MASS_COUNT);
        Self { masses }
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Mass> {
        self.masses.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mass> {
        self.masses.iter()
    }

    pub fn as_slice(&self) -> &[Mass] {
        &self.masses
    }

    /// Flat `len() × 4` floats in index order
    pub fn pack(&self) -> Vec<PackedMass> {
        self.masses.iter().map(Mass::to_packed).collect()
    }

    /// Overwrite x/y of one mass; z is kept.
    /// Returns false for an out-of-range index.
    pub fn set_position(&mut self, index: usize, x: f32, y: f32) -> bool {
        match self.masses.get_mut(index) {
            Some(mass) => {
                mass.position.x = x;
                mass.position.y = y;
                true
            }
            None => false,
        }
    }

    /// Apply one strength to every mass
    pub fn set_strength(&mut self, strength: f32) {
        for mass in &mut self.masses {
            mass.strength = strength;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn initialize_places_masses_in_cube() {
        let mut rng = StdRng::seed_from_u64(11);
        let registry = MassRegistry::initialize(10, 0.5, MassPlacement::Volume, &mut rng);

        assert_eq!(registry.len(), 10);
        for mass in registry.iter() {
            assert!(mass.position.abs().max_element() <= 1.0);
            assert_eq!(mass.strength, 0.5);
        }
    }

    #[test]
    fn plane_placement_zeroes_z() {
        let mut rng = StdRng::seed_from_u64(5);
        let registry = MassRegistry::initialize(3, 1.0, MassPlacement::Plane, &mut rng);
        assert!(registry.iter().all(|m| m.position.z == 0.0));
    }

    #[test]
    fn count_is_clamped_to_block_capacity() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            MassRegistry::initialize(100, 1.0, MassPlacement::Volume, &mut rng).len(),
            MAX_MASS_COUNT
        );
        assert_eq!(
            MassRegistry::initialize(0, 1.0, MassPlacement::Volume, &mut rng).len(),
            1
        );
    }

    #[test]
    fn pack_keeps_index_order() {
        let registry = MassRegistry::from_masses(vec![
            Mass::new(Vec3::new(0.1, 0.2, 0.3), 1.0),
            Mass::new(Vec3::new(-0.4, -0.5, -0.6), 2.0),
        ]);

        let packed = registry.pack();
        assert_eq!(packed.len(), 2);
        assert_eq!(packed[0].0, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(packed[1].0, [-0.4, -0.5, -0.6, 2.0]);

        let floats: &[f32] = bytemuck::cast_slice(&packed);
        assert_eq!(floats.len(), 8);
    }

    #[test]
    fn set_position_keeps_z_and_rejects_bad_index() {
        let mut registry =
            MassRegistry::from_masses(vec![Mass::new(Vec3::new(0.0, 0.0, 0.7), 1.0)]);

        assert!(registry.set_position(0, 0.25, -0.75));
        assert_eq!(registry.get(0).unwrap().position, Vec3::new(0.25, -0.75, 0.7));

        assert!(!registry.set_position(1, 0.0, 0.0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn strength_follows_gravity() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut registry = MassRegistry::initialize(3, 0.1, MassPlacement::Volume, &mut rng);
        registry.set_strength(0.000_05);
        assert!(registry.pack().iter().all(|m| m.0[3] == 0.000_05));
    }
}
