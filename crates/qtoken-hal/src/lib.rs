//! qtoken Measurement Backend Abstraction
//!
//! This crate defines the seam between the token protocol and whatever
//! actually executes rotation programs: a local simulator, an emulator, or
//! real hardware. The protocol only ever talks to a [`MeasurementBackend`].
//!
//! # Overview
//!
//! - A common [`MeasurementBackend`] trait for job submission and management,
//!   with a provided [`MeasurementBackend::execute`] that runs one program to
//!   completion and returns checked [`Counts`]
//! - [`Capabilities`] to describe addressable qubits, shot limits and gates
//! - A [`BackendRegistry`] for creating backends by name from [`BackendConfig`]
//!
//! # Example: Measuring a Program
//!
//! ```ignore
//! use qtoken_adapter_sim::SimulatorBackend;
//! use qtoken_hal::MeasurementBackend;
//! use qtoken_ir::{ClbitId, Program, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let q = QubitId(1);
//!     let mut program = Program::new();
//!     program.ry(std::f64::consts::FRAC_PI_2, q)?;
//!     let program = program.with_measurement(q, ClbitId(0))?;
//!
//!     let backend = SimulatorBackend::new();
//!     let counts = backend.execute(&program, 1000).await?;
//!
//!     // Expect ~50% "0" and ~50% "1"
//!     println!("{counts}");
//!     Ok(())
//! }
//! ```
//!
//! # Implementing a Custom Backend
//!
//! ```ignore
//! use qtoken_hal::{
//!     Capabilities, ExecutionResult, HalResult, JobId, JobStatus, MeasurementBackend,
//! };
//! use qtoken_ir::Program;
//! use async_trait::async_trait;
//!
//! struct MyBackend {
//!     capabilities: Capabilities,
//! }
//!
//! #[async_trait]
//! impl MeasurementBackend for MyBackend {
//!     fn name(&self) -> &str { "my_backend" }
//!
//!     fn capabilities(&self) -> &Capabilities {
//!         &self.capabilities
//!     }
//!
//!     async fn submit(&self, program: &Program, shots: u32) -> HalResult<JobId> {
//!         # todo!()
//!     }
//!
//!     async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
//!         # todo!()
//!     }
//!
//!     async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
//!         # todo!()
//!     }
//!
//!     async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
//!         # todo!()
//!     }
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod registry;
pub mod result;

pub use backend::{BackendConfig, BackendFactory, MeasurementBackend};
pub use capability::Capabilities;
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use registry::BackendRegistry;
pub use result::{Counts, ExecutionResult};
