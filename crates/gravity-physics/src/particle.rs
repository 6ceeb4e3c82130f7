//! Per-particle attribute arrays

use glam::Vec3;
use rand::Rng;

/// Three parallel attribute arrays describing `len()` particles.
///
/// Each element is three tightly packed `f32`, which is exactly the layout of
/// the GPU storage buffers, so the arrays upload with `bytemuck::cast_slice`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleAttributes {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub velocities: Vec<[f32; 3]>,
}

impl ParticleAttributes {
    /// Generate `count` particles with uniform random positions in `[-1, 1]^3`,
    /// uniform random colors in `[0, 1]^3` and zero velocity.
    pub fn random<R: Rng>(count: usize, rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        for _ in 0..count {
            positions.push([
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            ]);
            colors.push([rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>()]);
        }

        Self {
            positions,
            colors,
            velocities: vec![[0.0; 3]; count],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions.get(index).map(|p| Vec3::from_array(*p))
    }

    pub fn velocity(&self, index: usize) -> Option<Vec3> {
        self.velocities.get(index).map(|v| Vec3::from_array(*v))
    }

    /// True when all three arrays have the same length
    pub fn is_aligned(&self) -> bool {
        self.colors.len() == self.positions.len() && self.velocities.len() == self.positions.len()
    }

    /// True when every position and velocity component is finite
    pub fn is_finite(&self) -> bool {
        self.positions
            .iter()
            .chain(self.velocities.iter())
            .all(|v| v.iter().all(|c| c.is_finite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_attributes_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let attrs = ParticleAttributes::random(2_000, &mut rng);

        assert_eq!(attrs.len(), 2_000);
        assert!(attrs.is_aligned());
        assert!(attrs
            .positions
            .iter()
            .flatten()
            .all(|c| (-1.0..=1.0).contains(c)));
        assert!(attrs.colors.iter().flatten().all(|c| (0.0..=1.0).contains(c)));
        assert!(attrs.velocities.iter().flatten().all(|c| *c == 0.0));
    }

    #[test]
    fn same_seed_gives_same_particles() {
        let a = ParticleAttributes::random(64, &mut StdRng::seed_from_u64(1));
        let b = ParticleAttributes::random(64, &mut StdRng::seed_from_u64(1));
        let c = ParticleAttributes::random(64, &mut StdRng::seed_from_u64(2));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_generation() {
        let attrs = ParticleAttributes::random(0, &mut StdRng::seed_from_u64(0));
        assert!(attrs.is_empty());
        assert!(attrs.is_aligned());
        assert_eq!(attrs.position(0), None);
    }

    #[test]
    fn finiteness_check_catches_nan() {
        let mut attrs = ParticleAttributes::random(4, &mut StdRng::seed_from_u64(3));
        assert!(attrs.is_finite());
        attrs.velocities[2][1] = f32::NAN;
        assert!(!attrs.is_finite());
    }
}
