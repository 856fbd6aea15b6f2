//! Error types for the token protocol.

use thiserror::Error;

use qtoken_hal::HalError;
use qtoken_ir::{IrError, QubitId};

use crate::token::TokenId;

/// Errors raised while issuing, encoding or measuring tokens.
///
/// An expired or rejected token is not an error; verification always
/// resolves to a [`Verdict`](crate::Verdict).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// A token qubit has no private secret in the batch.
    #[error("No private secret is paired with qubit {0}")]
    UnpairedQubit(QubitId),

    /// The qubit id is already present in the token.
    #[error("Qubit {qubit} is already part of token {token}")]
    DuplicateQubit {
        /// Offending qubit.
        qubit: QubitId,
        /// Token it was added to.
        token: TokenId,
    },

    /// Two secrets in one batch share an id.
    #[error("Secret id {0} appears more than once in the batch")]
    DuplicateSecret(QubitId),

    /// An argument is outside its allowed range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend reported an outcome other than `"0"` or `"1"`.
    #[error("Unexpected outcome '{outcome}' measuring qubit {qubit}")]
    UnexpectedOutcome {
        /// Measured qubit.
        qubit: QubitId,
        /// The reported bitstring.
        outcome: String,
    },

    /// Program construction failed.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// The measurement backend failed.
    #[error(transparent)]
    Backend(#[from] HalError),
}

/// Result type for protocol operations.
pub type TokenResult<T> = Result<T, TokenError>;
