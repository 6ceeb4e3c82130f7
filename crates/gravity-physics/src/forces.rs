//! Attraction toward masses and the explicit Euler step
//!
//! NOTE: These are reference implementations for documentation and testing.
//! The actual simulation runs the same math in the `update.wgsl` compute shader.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::mass::Mass;

/// Distance falloff law of the attraction.
///
/// The acceleration toward a mass is `d̂ * strength / r^n` where `n` is the
/// exponent below.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Falloff {
    /// `n = 1`
    InverseDistance,
    /// `n = 2`
    #[default]
    InverseSquare,
    /// Arbitrary exponent
    Power(f32),
}

impl Falloff {
    pub fn exponent(&self) -> f32 {
        match self {
            Falloff::InverseDistance => 1.0,
            Falloff::InverseSquare => 2.0,
            Falloff::Power(n) => *n,
        }
    }
}

impl fmt::Display for Falloff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Falloff::InverseDistance => write!(f, "inverse-distance"),
            Falloff::InverseSquare => write!(f, "inverse-square"),
            Falloff::Power(n) => write!(f, "power({})", n),
        }
    }
}

/// Accepts `inverse-distance`, `inverse-square`, or a finite exponent such as `1.5`
impl FromStr for Falloff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inverse-distance" | "linear" => Ok(Falloff::InverseDistance),
            "inverse-square" | "square" => Ok(Falloff::InverseSquare),
            other => match other.parse::<f32>() {
                Ok(n) if n == 1.0 => Ok(Falloff::InverseDistance),
                Ok(n) if n == 2.0 => Ok(Falloff::InverseSquare),
                Ok(n) if n.is_finite() && n >= 0.0 => Ok(Falloff::Power(n)),
                _ => Err(format!("invalid falloff law: {s:?}")),
            },
        }
    }
}

/// Acceleration of a particle at `position` toward one mass
pub fn attraction(position: Vec3, mass: &Mass, falloff: Falloff, softening: f32) -> Vec3 {
    let d = mass.position - position;
    let r = (d.length_squared() + softening * softening).sqrt();
    d * (mass.strength / r.powf(falloff.exponent() + 1.0))
}

/// Summed acceleration over all masses
pub fn total_acceleration(position: Vec3, masses: &[Mass], falloff: Falloff, softening: f32) -> Vec3 {
    masses
        .iter()
        .map(|m| attraction(position, m, falloff, softening))
        .fold(Vec3::ZERO, |acc, a| acc + a)
}

/// One explicit Euler step: `v += a; p += v`
pub fn euler_step(
    position: Vec3,
    velocity: Vec3,
    masses: &[Mass],
    falloff: Falloff,
    softening: f32,
) -> (Vec3, Vec3) {
    let velocity = velocity + total_acceleration(position, masses, falloff, softening);
    (position + velocity, velocity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_mass_at(x: f32) -> Mass {
        Mass::new(Vec3::new(x, 0.0, 0.0), 1.0)
    }

    #[test]
    fn attraction_points_at_mass() {
        let a = attraction(Vec3::ZERO, &unit_mass_at(0.5), Falloff::InverseSquare, 0.0);
        assert!(a.x > 0.0);
        assert_eq!(a.y, 0.0);
        assert_eq!(a.z, 0.0);
    }

    #[test]
    fn falloff_laws_differ_with_distance() {
        let mass = unit_mass_at(2.0);
        let near = Vec3::new(1.0, 0.0, 0.0);
        let far = Vec3::ZERO;

        // r = 1 vs r = 2
        let linear_ratio = attraction(near, &mass, Falloff::InverseDistance, 0.0).length()
            / attraction(far, &mass, Falloff::InverseDistance, 0.0).length();
        let square_ratio = attraction(near, &mass, Falloff::InverseSquare, 0.0).length()
            / attraction(far, &mass, Falloff::InverseSquare, 0.0).length();

        assert!((linear_ratio - 2.0).abs() < 1e-5);
        assert!((square_ratio - 4.0).abs() < 1e-5);
    }

    #[test]
    fn softening_keeps_coincident_particle_finite() {
        let a = attraction(Vec3::ZERO, &unit_mass_at(0.0), Falloff::InverseSquare, 0.01);
        assert_eq!(a, Vec3::ZERO);
        assert!(a.is_finite());
    }

    #[test]
    fn accelerations_sum_over_masses() {
        let masses = [unit_mass_at(1.0), unit_mass_at(-1.0)];
        let a = total_acceleration(Vec3::ZERO, &masses, Falloff::InverseSquare, 0.0);
        assert!(a.length() < 1e-6);
    }

    #[test]
    fn euler_updates_velocity_before_position() {
        let masses = [Mass::new(Vec3::new(1.0, 0.0, 0.0), 0.01)];
        let (p, v) = euler_step(Vec3::ZERO, Vec3::ZERO, &masses, Falloff::InverseSquare, 0.0);

        assert!((v.x - 0.01).abs() < 1e-7);
        assert_eq!(p, v);
    }

    #[test]
    fn parse_falloff() {
        assert_eq!("inverse-square".parse::<Falloff>(), Ok(Falloff::InverseSquare));
        assert_eq!("Inverse-Distance".parse::<Falloff>(), Ok(Falloff::InverseDistance));
        assert_eq!("2".parse::<Falloff>(), Ok(Falloff::InverseSquare));
        assert_eq!("1.5".parse::<Falloff>(), Ok(Falloff::Power(1.5)));
        assert!("-1".parse::<Falloff>().is_err());
        assert!("cubic".parse::<Falloff>().is_err());
    }
}
