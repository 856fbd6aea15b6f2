//! Statevector evolution and sampling.

use num_complex::Complex64;
use rand::Rng;

use qtoken_ir::Gate;

/// Amplitudes of a small register, indexed by basis state.
///
/// Qubit `k` of the register corresponds to bit `k` of the basis index.
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Apply a rotation to register qubit `qubit`.
    pub fn apply(&mut self, gate: &Gate, qubit: usize) {
        match *gate {
            Gate::Ry(theta) => self.apply_ry(qubit, theta),
            Gate::Rz(phi) => self.apply_rz(qubit, phi),
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, phi: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -phi / 2.0);
        let phase_1 = Complex64::from_polar(1.0, phi / 2.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                self.amplitudes[i] *= phase_0;
            } else {
                self.amplitudes[i] *= phase_1;
            }
        }
    }

    /// Probability of reading `1` on register qubit `qubit`.
    pub fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, amp)| amp.norm_sqr())
            .sum()
    }

    /// Cumulative distribution over basis states, for repeated sampling.
    pub fn cumulative(&self) -> Vec<f64> {
        let mut acc = 0.0;
        self.amplitudes
            .iter()
            .map(|amp| {
                acc += amp.norm_sqr();
                acc
            })
            .collect()
    }

    /// Draw one basis state from a distribution built by [`Self::cumulative`].
    pub fn sample_from<R: Rng>(cumulative: &[f64], rng: &mut R) -> usize {
        let total = cumulative.last().copied().unwrap_or(1.0);
        let r: f64 = rng.r#gen::<f64>() * total;
        cumulative
            .iter()
            .position(|&c| r < c)
            .unwrap_or(cumulative.len() - 1)
    }
}
