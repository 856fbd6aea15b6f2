//! Encoding and decoding rotations.
//!
//! `spin` writes `RY(θ)` then `RZ(φ)`; `reverse_spin` writes the inverse,
//! `RZ(-φ)` then `RY(-θ)`. Both only append to the qubit's pending program.

use tracing::{debug, info, warn};

use crate::angle::Degrees;
use crate::error::{TokenError, TokenResult};
use crate::secret::{PublicQubit, SecretBatch, find_private_secret};
use crate::token::Token;

/// Append the encoding rotation for `(theta, phi)`.
pub fn spin(qubit: &mut PublicQubit, theta: Degrees, phi: Degrees) -> TokenResult<()> {
    let id = qubit.id();
    qubit
        .program_mut()
        .ry(theta.to_radians(), id)?
        .rz(phi.to_radians(), id)?;
    debug!(qubit = %id, "spin");
    Ok(())
}

/// Append the decoding rotation for `(theta, phi)`.
pub fn reverse_spin(qubit: &mut PublicQubit, theta: Degrees, phi: Degrees) -> TokenResult<()> {
    let id = qubit.id();
    qubit
        .program_mut()
        .rz((-phi).to_radians(), id)?
        .ry((-theta).to_radians(), id)?;
    debug!(qubit = %id, "reverse spin");
    Ok(())
}

/// Angles for every token qubit, in token order.
///
/// Resolved up front so an unpaired qubit leaves the token untouched.
fn resolve_angles(token: &Token, secrets: &SecretBatch) -> TokenResult<Vec<(Degrees, Degrees)>> {
    token
        .qubits()
        .iter()
        .map(|qubit| {
            find_private_secret(secrets, qubit.id())
                .map(|secret| (secret.theta(), secret.phi()))
                .ok_or_else(|| {
                    warn!(token = %token.id(), qubit = %qubit.id(), "qubit has no paired secret");
                    TokenError::UnpairedQubit(qubit.id())
                })
        })
        .collect()
}

/// Encode every qubit of `token` with its paired secret and mark it active.
pub fn spin_token(token: &mut Token, secrets: &SecretBatch) -> TokenResult<()> {
    let angles = resolve_angles(token, secrets)?;
    for (qubit, (theta, phi)) in token.qubits_mut().iter_mut().zip(angles) {
        spin(qubit, theta, phi)?;
    }
    token.mark_encoded();
    info!(token = %token.id(), qubits = token.len(), "token encoded");
    Ok(())
}

/// Decode every qubit of `token` with its paired secret.
pub fn reverse_spin_token(token: &mut Token, secrets: &SecretBatch) -> TokenResult<()> {
    let angles = resolve_angles(token, secrets)?;
    for (qubit, (theta, phi)) in token.qubits_mut().iter_mut().zip(angles) {
        reverse_spin(qubit, theta, phi)?;
    }
    debug!(token = %token.id(), "token decoded");
    Ok(())
}
