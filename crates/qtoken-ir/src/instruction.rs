//! Program instructions combining gates with operands.

use serde::{Deserialize, Serialize};

use crate::gate::Gate;
use crate::qubit::{ClbitId, QubitId};

/// The kind of instruction in a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A rotation.
    Gate(Gate),
    /// Z-basis measurement into a classical slot.
    Measure {
        /// Slot receiving the outcome.
        clbit: ClbitId,
    },
}

/// A complete instruction with its target qubit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubit this instruction operates on.
    pub qubit: QubitId,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(gate: Gate, qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Gate(gate),
            qubit,
        }
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure { clbit },
            qubit,
        }
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure { .. })
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            InstructionKind::Measure { .. } => None,
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure { .. } => "measure",
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            InstructionKind::Gate(g) => write!(f, "{g} {}", self.qubit),
            InstructionKind::Measure { clbit } => write!(f, "measure {} -> {clbit}", self.qubit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::gate(Gate::Ry(0.3), QubitId(2));
        assert!(inst.is_gate());
        assert!(!inst.is_measure());
        assert_eq!(inst.name(), "ry");
        assert_eq!(inst.as_gate(), Some(&Gate::Ry(0.3)));
    }

    #[test]
    fn test_measure_instruction() {
        let inst = Instruction::measure(QubitId(4), ClbitId(0));
        assert!(inst.is_measure());
        assert_eq!(inst.name(), "measure");
        assert!(inst.as_gate().is_none());
        assert_eq!(format!("{inst}"), "measure q4 -> c0");
    }
}
