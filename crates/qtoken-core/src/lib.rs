//! qtoken Protocol
//!
//! Issue and verify quantum tokens. An issuer draws secret rotation angles,
//! encodes them into a set of qubits and hands the qubits out. Later the
//! issuer applies the inverse rotations and measures: a genuine token
//! collapses back to `|0⟩` on (nearly) every shot, while a token decoded with
//! the wrong angles, or presented after its time-to-live, is rejected.
//!
//! # Life Cycle
//!
//! ```text
//!  AngleSource ──→ generate_private_secrets ──→ SecretBatch
//!                                                   │ make_public_qubits_array
//!                                                   ▼
//!                    Token::add_qubit ◀── PublicQubit (one per secret)
//!                          │
//!                  spin_token (encode) ──→ holder ──→ reverse_spin_token (decode)
//!                                                          │
//!                                   verify_token ◀─────────┘
//!                                   (TTL, then measure every qubit)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use qtoken_adapter_sim::SimulatorBackend;
//! use qtoken_core::{
//!     RandomAngleSource, Token, Tolerance, VerificationPolicy, generate_private_secrets,
//!     make_public_qubits_array, reverse_spin_token, spin_token, verify_token,
//! };
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let secrets = generate_private_secrets(4, &mut RandomAngleSource::from_entropy())?;
//! let mut token = Token::new(Duration::from_secs(60))?;
//! for qubit in make_public_qubits_array(&secrets) {
//!     token.add_qubit(qubit.clone())?;
//! }
//!
//! spin_token(&mut token, &secrets)?;
//! reverse_spin_token(&mut token, &secrets)?;
//!
//! let policy = VerificationPolicy::new(1000, Tolerance::Absolute(50))?;
//! assert!(verify_token(&SimulatorBackend::new(), &token, &policy).await);
//! # Ok(())
//! # }
//! ```

pub mod angle;
pub mod config;
pub mod error;
pub mod secret;
pub mod spin;
pub mod token;
pub mod verify;

pub use angle::{AngleSource, Degrees, RandomAngleSource};
pub use config::{ConfigError, ProtocolConfig};
pub use error::{TokenError, TokenResult};
pub use secret::{
    PrivateSecret, PublicQubit, RESULT_SLOT, SecretBatch, find_private_secret,
    generate_private_secrets, make_public_qubits_array,
};
pub use spin::{reverse_spin, reverse_spin_token, spin, spin_token};
pub use token::{Token, TokenId, TokenState};
pub use verify::{
    QubitReport, RejectReason, Tolerance, Verdict, Verification, VerificationPolicy,
    inspect_token, inspect_token_at, inspect_token_with_timeout, measure_qubit, verify_token,
    verify_token_with_timeout,
};
