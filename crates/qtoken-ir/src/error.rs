//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building a program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Rotation angle is NaN or infinite.
    #[error("Rotation angle must be finite, got {angle} (gate: {gate_name})")]
    NonFiniteAngle {
        /// Name of the gate.
        gate_name: String,
        /// The offending angle in radians.
        angle: f64,
    },

    /// An operation was appended after the terminal measurement.
    #[error("Program already ends in a measurement; cannot append '{0}'")]
    AfterMeasurement(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
