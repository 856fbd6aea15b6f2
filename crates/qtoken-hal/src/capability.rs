//! Backend capabilities.

use serde::{Deserialize, Serialize};

use qtoken_ir::Program;

/// Static description of what a backend can execute.
///
/// Capabilities are cached by the backend at construction time and
/// returned by reference; reading them never performs I/O.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Physical qubit indices `0..num_qubits` are addressable.
    pub num_qubits: u32,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Supported operation names (`"ry"`, `"rz"`, `"measure"`).
    pub gate_set: Vec<String>,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
}

impl Capabilities {
    /// Capabilities of a local simulator addressing `num_qubits` indices.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            max_shots: 100_000,
            gate_set: ["ry", "rz", "measure"].map(String::from).to_vec(),
            is_simulator: true,
        }
    }

    /// Override the shot limit.
    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Whether an operation name is supported.
    pub fn supports(&self, op: &str) -> bool {
        self.gate_set.iter().any(|g| g == op)
    }

    /// Reasons `program` cannot run here; empty when it can.
    pub fn check(&self, program: &Program) -> Vec<String> {
        let mut reasons = Vec::new();

        for qubit in program.qubits() {
            if qubit.0 >= self.num_qubits {
                reasons.push(format!(
                    "qubit {qubit} is outside the addressable range 0..{}",
                    self.num_qubits
                ));
            }
        }

        for inst in program {
            let name = inst.name();
            if !self.supports(name) {
                reasons.push(format!("operation '{name}' is not supported"));
            }
        }

        if !program.is_terminated() {
            reasons.push("program has no measurement".to_string());
        }

        reasons.dedup();
        reasons
    }
}
