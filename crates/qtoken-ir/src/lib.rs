//! qtoken Program Representation
//!
//! This crate provides the data structures the token protocol writes into and
//! measurement backends read from: an ordered, append-only sequence of
//! single-qubit rotations terminated by a computational-basis measurement.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`] for addressing the
//!   physical qubit and the classical result slot
//! - **Gates**: [`Gate`] for the two rotation kinds (RY and RZ, radians)
//! - **Instructions**: [`Instruction`] combining a gate or measurement with its operands
//! - **Program**: [`Program`], the append-only builder handed to a backend
//!
//! # Example: Encode and Decode a Qubit
//!
//! ```rust
//! use qtoken_ir::{ClbitId, Program, QubitId};
//!
//! let q = QubitId(3);
//! let mut program = Program::new();
//!
//! // Encode: RY(θ) then RZ(φ)
//! program.ry(0.7, q).unwrap();
//! program.rz(1.9, q).unwrap();
//!
//! // Decode: RZ(-φ) then RY(-θ)
//! program.rz(-1.9, q).unwrap();
//! program.ry(-0.7, q).unwrap();
//!
//! // Execution copy with a terminal measurement; `program` itself is untouched.
//! let executable = program.with_measurement(q, ClbitId(0)).unwrap();
//!
//! assert_eq!(program.len(), 4);
//! assert_eq!(executable.len(), 5);
//! assert!(executable.is_terminated());
//! ```
//!
//! # Supported Operations
//!
//! | Operation | Qubits | Description |
//! |-----------|--------|-------------|
//! | `ry` | 1 | Rotation around Y (changes P(0)/P(1) in the Z basis) |
//! | `rz` | 1 | Rotation around Z (relative phase, invisible in the Z basis) |
//! | `measure` | 1 | Terminal Z-basis measurement into a classical slot |

pub mod error;
pub mod gate;
pub mod instruction;
pub mod program;
pub mod qubit;

pub use error::{IrError, IrResult};
pub use gate::Gate;
pub use instruction::{Instruction, InstructionKind};
pub use program::Program;
pub use qubit::{ClbitId, QubitId};
