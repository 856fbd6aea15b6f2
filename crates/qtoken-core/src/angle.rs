//! Secret rotation angles.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the polar angle θ.
pub const THETA_RANGE: f64 = 180.0;

/// Upper bound (exclusive) of the azimuthal angle φ.
pub const PHI_RANGE: f64 = 360.0;

/// An angle in degrees.
///
/// Angles stay in degrees throughout the protocol and are converted to
/// radians only when a rotation is written into a program.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

impl Degrees {
    /// The angle in radians.
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    /// The raw value in degrees.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}°", self.0)
    }
}

impl std::ops::Neg for Degrees {
    type Output = Degrees;

    fn neg(self) -> Degrees {
        Degrees(-self.0)
    }
}

/// Supplier of secret rotation angles.
///
/// Draws are independent. Implementations make no promise of determinism
/// unless they say so.
pub trait AngleSource {
    /// Polar angle in `[0, 180)`.
    fn next_theta(&mut self) -> Degrees;

    /// Azimuthal angle in `[0, 360)`.
    fn next_phi(&mut self) -> Degrees;
}

/// Uniform angles drawn from a random number generator.
#[derive(Debug, Clone)]
pub struct RandomAngleSource<R = StdRng> {
    rng: R,
}

impl RandomAngleSource<StdRng> {
    /// Source seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible source for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomAngleSource<R> {
    /// Wrap an existing generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> AngleSource for RandomAngleSource<R> {
    fn next_theta(&mut self) -> Degrees {
        Degrees(self.rng.gen_range(0.0..THETA_RANGE))
    }

    fn next_phi(&mut self) -> Degrees {
        Degrees(self.rng.gen_range(0.0..PHI_RANGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angles_stay_in_range() {
        let mut source = RandomAngleSource::seeded(7);
        for _ in 0..10_000 {
            let theta = source.next_theta().value();
            let phi = source.next_phi().value();
            assert!((0.0..THETA_RANGE).contains(&theta));
            assert!((0.0..PHI_RANGE).contains(&phi));
        }
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = RandomAngleSource::seeded(99);
        let mut b = RandomAngleSource::seeded(99);
        for _ in 0..16 {
            assert_eq!(a.next_theta(), b.next_theta());
            assert_eq!(a.next_phi(), b.next_phi());
        }
    }

    #[test]
    fn test_degrees_conversion() {
        assert!((Degrees(180.0).to_radians() - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(-Degrees(30.0), Degrees(-30.0));
        assert_eq!(Degrees(12.5).to_string(), "12.500°");
    }
}
