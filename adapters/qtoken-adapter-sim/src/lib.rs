//! qtoken Local Statevector Backend
//!
//! A [`MeasurementBackend`](qtoken_hal::MeasurementBackend) that executes
//! rotation programs on an in-memory statevector and samples measurement
//! outcomes. It is the reference backend for tests and the CLI.
//!
//! # Features
//!
//! - **Exact evolution**: amplitudes are computed exactly; the only
//!   randomness is shot sampling
//! - **Sparse addressing**: only the qubits a program touches are simulated,
//!   so a token qubit with physical index 90 costs two amplitudes, not 2^91
//! - **Reproducible sampling**: [`SimulatorBackend::with_seed`]
//! - **Readout error**: [`SimulatorBackend::with_readout_error`] flips each
//!   measured bit with a fixed probability, emulating hardware noise
//!
//! # Example
//!
//! ```ignore
//! use qtoken_adapter_sim::SimulatorBackend;
//! use qtoken_hal::MeasurementBackend;
//! use qtoken_ir::{ClbitId, Program, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::with_seed(42).with_readout_error(0.001)?;
//!
//!     let q = QubitId(7);
//!     let mut program = Program::new();
//!     program.ry(1.2, q)?.rz(0.4, q)?.rz(-0.4, q)?.ry(-1.2, q)?;
//!     let program = program.with_measurement(q, ClbitId(0))?;
//!
//!     // Back in the ground state: almost every shot reads "0".
//!     let counts = backend.execute(&program, 10_000).await?;
//!     println!("{counts}");
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
