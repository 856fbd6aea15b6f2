//! Append-only rotation programs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// An ordered sequence of instructions awaiting execution.
///
/// Instructions can only be appended; nothing is ever removed or rewritten.
/// Once a measurement has been appended the program is *terminated*: further
/// measurements are accepted, rotations are not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::Ry(theta), qubit)
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, phi: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::Rz(phi), qubit)
    }

    /// Append an arbitrary rotation.
    pub fn gate(&mut self, gate: Gate, qubit: QubitId) -> IrResult<&mut Self> {
        if !gate.angle().is_finite() {
            return Err(IrError::NonFiniteAngle {
                gate_name: gate.name().to_string(),
                angle: gate.angle(),
            });
        }
        if self.is_terminated() {
            return Err(IrError::AfterMeasurement(gate.name().to_string()));
        }
        self.instructions.push(Instruction::gate(gate, qubit));
        Ok(self)
    }

    /// Measure `qubit` into classical slot `clbit`.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.instructions.push(Instruction::measure(qubit, clbit));
        Ok(self)
    }

    /// Return a copy of this program with a terminal measurement appended.
    ///
    /// `self` is left unchanged, so the same pending rotations can be
    /// executed any number of times.
    pub fn with_measurement(&self, qubit: QubitId, clbit: ClbitId) -> IrResult<Program> {
        let mut executable = self.clone();
        executable.measure(qubit, clbit)?;
        Ok(executable)
    }

    /// Whether a measurement has been appended.
    pub fn is_terminated(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    /// All instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Iterate over instructions in program order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// Rotations only, with their target qubits.
    pub fn gates(&self) -> impl Iterator<Item = (&Gate, QubitId)> {
        self.instructions
            .iter()
            .filter_map(|inst| inst.as_gate().map(|g| (g, inst.qubit)))
    }

    /// Measurements as `(qubit, clbit)` pairs.
    pub fn measurements(&self) -> impl Iterator<Item = (QubitId, ClbitId)> + '_ {
        self.instructions.iter().filter_map(|inst| match inst.kind {
            InstructionKind::Measure { clbit } => Some((inst.qubit, clbit)),
            InstructionKind::Gate(_) => None,
        })
    }

    /// Distinct qubits the program touches, ascending.
    pub fn qubits(&self) -> BTreeSet<QubitId> {
        self.instructions.iter().map(|inst| inst.qubit).collect()
    }

    /// Number of classical slots needed to hold every measurement.
    pub fn num_clbits(&self) -> usize {
        self.measurements()
            .map(|(_, c)| c.0 as usize + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, inst) in self.instructions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{inst}")?;
        }
        Ok(())
    }
}
