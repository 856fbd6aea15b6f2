//! Rotation gates.

use serde::{Deserialize, Serialize};

/// Single-qubit rotations a token program may contain.
///
/// Angles are in radians. `Ry` moves population between |0⟩ and |1⟩;
/// `Rz` only changes the relative phase and is invisible to a Z-basis
/// measurement on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Rotation around the Y axis.
    Ry(f64),
    /// Rotation around the Z axis.
    Rz(f64),
}

impl Gate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Ry(_) => "ry",
            Gate::Rz(_) => "rz",
        }
    }

    /// Rotation angle in radians.
    #[inline]
    pub fn angle(&self) -> f64 {
        match self {
            Gate::Ry(theta) | Gate::Rz(theta) => *theta,
        }
    }

    /// The adjoint of this rotation: same axis, negated angle.
    ///
    /// - Ry(θ)† = Ry(-θ)
    /// - Rz(θ)† = Rz(-θ)
    pub fn inverse(&self) -> Gate {
        match self {
            Gate::Ry(theta) => Gate::Ry(-theta),
            Gate::Rz(theta) => Gate::Rz(-theta),
        }
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:.6})", self.name(), self.angle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_gate_names() {
        assert_eq!(Gate::Ry(0.0).name(), "ry");
        assert_eq!(Gate::Rz(0.0).name(), "rz");
    }

    #[test]
    fn test_inverse_negates_angle() {
        assert_eq!(Gate::Ry(PI / 3.0).inverse(), Gate::Ry(-PI / 3.0));
        assert_eq!(Gate::Rz(-1.25).inverse(), Gate::Rz(1.25));
    }

    #[test]
    fn test_inverse_is_involution() {
        let g = Gate::Rz(2.5);
        assert_eq!(g.inverse().inverse(), g);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Gate::Ry(0.5)), "ry(0.500000)");
    }
}
