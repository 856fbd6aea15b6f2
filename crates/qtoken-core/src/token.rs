//! Token issuance and lifecycle.
//!
//! ```text
//!   Token::new ──→ Issuing ──spin_token──→ Active ──ttl elapsed──→ Expired
//! ```
//!
//! `Expired` is terminal and is derived from the clock, never stored.
//! Accepted/rejected are verification results, not states.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use qtoken_ir::QubitId;

use crate::error::{TokenError, TokenResult};
use crate::secret::PublicQubit;

/// Unique identifier of a token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    /// A fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a token at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenState {
    /// Qubits are being added; not yet encoded.
    Issuing,
    /// Encoded and within its time-to-live.
    Active,
    /// Time-to-live elapsed. Terminal.
    Expired,
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenState::Issuing => write!(f, "Issuing"),
            TokenState::Active => write!(f, "Active"),
            TokenState::Expired => write!(f, "Expired"),
        }
    }
}

/// A set of public qubits issued together under one time-to-live.
#[derive(Debug, Clone)]
pub struct Token {
    id: TokenId,
    created_at: DateTime<Utc>,
    ttl: chrono::Duration,
    qubits: Vec<PublicQubit>,
    members: FxHashSet<QubitId>,
    tag: Option<String>,
    encoded: bool,
}

impl Token {
    /// Issue an empty token now.
    pub fn new(ttl: Duration) -> TokenResult<Self> {
        Self::issued_at(ttl, Utc::now())
    }

    /// Issue an empty token with an explicit creation time.
    pub fn issued_at(ttl: Duration, created_at: DateTime<Utc>) -> TokenResult<Self> {
        if ttl.is_zero() {
            return Err(TokenError::InvalidArgument(
                "token ttl must be positive".into(),
            ));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| TokenError::InvalidArgument(format!("token ttl out of range: {e}")))?;
        if created_at.checked_add_signed(ttl).is_none() {
            return Err(TokenError::InvalidArgument(format!(
                "token ttl of {}s overflows the expiry time",
                ttl.num_seconds()
            )));
        }

        Ok(Self {
            id: TokenId::generate(),
            created_at,
            ttl,
            qubits: Vec::new(),
            members: FxHashSet::default(),
            tag: None,
            encoded: false,
        })
    }

    /// Replace the generated id.
    #[must_use]
    pub fn with_id(mut self, id: TokenId) -> Self {
        self.id = id;
        self
    }

    /// Attach a label.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Append a qubit. Fails if its id is already present.
    pub fn add_qubit(&mut self, qubit: PublicQubit) -> TokenResult<()> {
        if !self.members.insert(qubit.id()) {
            return Err(TokenError::DuplicateQubit {
                qubit: qubit.id(),
                token: self.id.clone(),
            });
        }
        debug!(token = %self.id, qubit = %qubit.id(), "added qubit to token");
        self.qubits.push(qubit);
        Ok(())
    }

    pub fn id(&self) -> &TokenId {
        &self.id
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Instant after which the token can no longer be verified.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + self.ttl
    }

    /// Time elapsed since issuance as seen at `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    /// Whether more than `ttl` has elapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.age_at(now) > self.ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Lifecycle state at `now`. Expiry takes precedence.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.is_expired_at(now) {
            TokenState::Expired
        } else if self.encoded {
            TokenState::Active
        } else {
            TokenState::Issuing
        }
    }

    pub fn state(&self) -> TokenState {
        self.state_at(Utc::now())
    }

    /// Whether the token has been encoded with its secrets.
    pub fn is_encoded(&self) -> bool {
        self.encoded
    }

    pub(crate) fn mark_encoded(&mut self) {
        self.encoded = true;
    }

    /// Qubits in insertion order.
    pub fn qubits(&self) -> &[PublicQubit] {
        &self.qubits
    }

    /// Mutable access for applying rotations.
    pub fn qubits_mut(&mut self) -> &mut [PublicQubit] {
        &mut self.qubits
    }

    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }
}
