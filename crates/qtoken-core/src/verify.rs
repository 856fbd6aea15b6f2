//! Statistical verification of tokens.
//!
//! Verification decodes nothing itself: the caller applies
//! [`reverse_spin_token`](crate::reverse_spin_token) first, then every qubit
//! is measured and must read `1` at most `allowed` times. The TTL is checked
//! before the backend sees any program, and any backend failure rejects the
//! token.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use qtoken_hal::{Counts, HalError, MeasurementBackend};
use qtoken_ir::QubitId;

use crate::error::{TokenError, TokenResult};
use crate::secret::PublicQubit;
use crate::token::{Token, TokenId};

/// Default allowed fraction of `1` outcomes per qubit.
pub const DEFAULT_TOLERANCE_RATE: f64 = 0.005;

/// Default shots per qubit.
pub const DEFAULT_SHOTS: u32 = 10_000;

/// Default number of concurrent backend calls.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Upper bound on `1` outcomes a qubit may show and still pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// A fixed count.
    Absolute(u64),
    /// A fraction of the shots, rounded down.
    Rate(f64),
}

impl Tolerance {
    /// Allowed `1` outcomes at `shots`.
    pub fn allowed_ones(&self, shots: u32) -> u64 {
        match *self {
            Tolerance::Absolute(n) => n,
            Tolerance::Rate(rate) => {
                // 0.57 * 100 evaluates to 56.99..., snap products within rounding error.
                let exact = rate * f64::from(shots);
                let nearest = exact.round();
                if (exact - nearest).abs() <= exact * 1e-9 {
                    nearest as u64
                } else {
                    exact.floor() as u64
                }
            }
        }
    }

    /// Check that a rate lies within `[0, 1]`.
    pub fn validate(&self) -> TokenResult<()> {
        match *self {
            Tolerance::Absolute(_) => Ok(()),
            Tolerance::Rate(rate) if (0.0..=1.0).contains(&rate) => Ok(()),
            Tolerance::Rate(rate) => Err(TokenError::InvalidArgument(format!(
                "tolerance rate {rate} is outside [0, 1]"
            ))),
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Rate(DEFAULT_TOLERANCE_RATE)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tolerance::Absolute(n) => write!(f, "{n} ones"),
            Tolerance::Rate(rate) => write!(f, "{:.3}% of shots", rate * 100.0),
        }
    }
}

/// How a token is measured and judged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationPolicy {
    /// Shots per qubit.
    pub shots: u32,
    /// Per-qubit bound on `1` outcomes.
    pub tolerance: Tolerance,
    /// Concurrent backend calls.
    pub max_in_flight: usize,
}

impl VerificationPolicy {
    /// Policy with the default concurrency.
    pub fn new(shots: u32, tolerance: Tolerance) -> TokenResult<Self> {
        let policy = Self {
            shots,
            tolerance,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        };
        policy.validate()?;
        Ok(policy)
    }

    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Allowed `1` outcomes per qubit under this policy.
    pub fn allowed_ones(&self) -> u64 {
        self.tolerance.allowed_ones(self.shots)
    }

    pub fn validate(&self) -> TokenResult<()> {
        if self.shots == 0 {
            return Err(TokenError::InvalidArgument("shots must be positive".into()));
        }
        if self.max_in_flight == 0 {
            return Err(TokenError::InvalidArgument(
                "max_in_flight must be positive".into(),
            ));
        }
        self.tolerance.validate()
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            shots: DEFAULT_SHOTS,
            tolerance: Tolerance::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The time-to-live had elapsed; nothing was measured.
    Expired,
    /// A qubit read `1` too often.
    ExcessOnes {
        id: QubitId,
        ones: u64,
        allowed: u64,
    },
    /// The backend failed for some qubit.
    Backend(String),
    /// The token has no qubits.
    Empty,
    /// The deadline elapsed before every qubit was measured.
    DeadlineElapsed,
    /// The verification policy was out of range; nothing was measured.
    InvalidPolicy(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Expired => write!(f, "token expired"),
            RejectReason::ExcessOnes { id, ones, allowed } => {
                write!(f, "qubit {id} read 1 {ones} times (allowed {allowed})")
            }
            RejectReason::Backend(msg) => write!(f, "backend failure: {msg}"),
            RejectReason::Empty => write!(f, "token has no qubits"),
            RejectReason::DeadlineElapsed => write!(f, "verification deadline elapsed"),
            RejectReason::InvalidPolicy(msg) => write!(f, "invalid policy: {msg}"),
        }
    }
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "ACCEPTED"),
            Verdict::Rejected(reason) => write!(f, "REJECTED ({reason})"),
        }
    }
}

/// Measurement summary for one qubit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitReport {
    pub id: QubitId,
    pub ones: u64,
    pub shots: u32,
    pub passed: bool,
}

/// Full result of inspecting a token.
///
/// `reports` covers the qubits measured before the scan stopped, in token
/// order. It is informational only; the verdict is authoritative.
#[derive(Debug, Clone)]
pub struct Verification {
    pub token_id: TokenId,
    pub verdict: Verdict,
    pub reports: Vec<QubitReport>,
    pub age: chrono::Duration,
}

impl Verification {
    fn rejected(token: &Token, reason: RejectReason, age: chrono::Duration) -> Self {
        Self {
            token_id: token.id().clone(),
            verdict: Verdict::Rejected(reason),
            reports: Vec::new(),
            age,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }
}

/// Measure `qubit`'s pending program followed by a measurement, `shots` times.
///
/// The qubit is not modified. Fails if the returned outcomes are not
/// `"0"`/`"1"` or do not sum to `shots`.
#[instrument(skip(backend, qubit), fields(qubit = %qubit.id()))]
pub async fn measure_qubit<B>(backend: &B, qubit: &PublicQubit, shots: u32) -> TokenResult<Counts>
where
    B: MeasurementBackend + ?Sized,
{
    let program = qubit.measurement_program()?;
    let counts = backend.execute(&program, shots).await?;

    if let Some((outcome, _)) = counts.iter().find(|(k, _)| !matches!(k.as_str(), "0" | "1")) {
        return Err(TokenError::UnexpectedOutcome {
            qubit: qubit.id(),
            outcome: outcome.clone(),
        });
    }
    let reported = counts.total_shots();
    if reported != u64::from(shots) {
        return Err(HalError::InconsistentCounts {
            expected: u64::from(shots),
            reported,
        }
        .into());
    }

    debug!(zeros = counts.zeros(), ones = counts.ones(), "measured qubit");
    Ok(counts)
}

/// Inspect `token` against the current clock.
pub async fn inspect_token<B>(backend: &B, token: &Token, policy: &VerificationPolicy) -> Verification
where
    B: MeasurementBackend + ?Sized,
{
    inspect_token_at(backend, token, policy, Utc::now()).await
}

/// Inspect `token` as if the current time were `now`.
///
/// A policy that fails [`VerificationPolicy::validate`] rejects the token
/// before the clock or the backend is consulted.
#[instrument(skip(backend, token, policy), fields(token = %token.id(), qubits = token.len()))]
pub async fn inspect_token_at<B>(
    backend: &B,
    token: &Token,
    policy: &VerificationPolicy,
    now: DateTime<Utc>,
) -> Verification
where
    B: MeasurementBackend + ?Sized,
{
    let age = token.age_at(now);
    if let Err(e) = policy.validate() {
        warn!(error = %e, "refusing to verify under an invalid policy");
        return Verification::rejected(token, RejectReason::InvalidPolicy(e.to_string()), age);
    }
    if token.is_expired_at(now) {
        warn!(age_ms = age.num_milliseconds(), "token expired");
        return Verification::rejected(token, RejectReason::Expired, age);
    }
    if token.is_empty() {
        warn!("token has no qubits");
        return Verification::rejected(token, RejectReason::Empty, age);
    }

    let shots = policy.shots;
    let allowed = policy.allowed_ones();
    let mut measurements = stream::iter(token.qubits())
        .map(|qubit| async move { (qubit.id(), measure_qubit(backend, qubit, shots).await) })
        .buffered(policy.max_in_flight);

    let mut reports = Vec::with_capacity(token.len());
    let mut verdict = Verdict::Accepted;
    while let Some((id, result)) = measurements.next().await {
        match result {
            Ok(counts) => {
                let ones = counts.ones();
                let passed = ones <= allowed;
                reports.push(QubitReport {
                    id,
                    ones,
                    shots,
                    passed,
                });
                if !passed {
                    verdict = Verdict::Rejected(RejectReason::ExcessOnes { id, ones, allowed });
                    break;
                }
            }
            Err(e) => {
                warn!(qubit = %id, error = %e, "measurement failed");
                verdict = Verdict::Rejected(RejectReason::Backend(e.to_string()));
                break;
            }
        }
    }

    info!(%verdict, measured = reports.len(), "token inspected");
    Verification {
        token_id: token.id().clone(),
        verdict,
        reports,
        age,
    }
}

/// Inspect `token`, rejecting it if the check does not finish within `timeout`.
pub async fn inspect_token_with_timeout<B>(
    backend: &B,
    token: &Token,
    policy: &VerificationPolicy,
    timeout: Duration,
) -> Verification
where
    B: MeasurementBackend + ?Sized,
{
    let now = Utc::now();
    match tokio::time::timeout(timeout, inspect_token_at(backend, token, policy, now)).await {
        Ok(verification) => verification,
        Err(_) => {
            warn!(token = %token.id(), ?timeout, "verification deadline elapsed");
            Verification::rejected(token, RejectReason::DeadlineElapsed, token.age_at(Utc::now()))
        }
    }
}

/// Whether `token` is accepted right now.
pub async fn verify_token<B>(backend: &B, token: &Token, policy: &VerificationPolicy) -> bool
where
    B: MeasurementBackend + ?Sized,
{
    inspect_token(backend, token, policy).await.is_accepted()
}

/// Whether `token` is accepted within `timeout`.
pub async fn verify_token_with_timeout<B>(
    backend: &B,
    token: &Token,
    policy: &VerificationPolicy,
    timeout: Duration,
) -> bool
where
    B: MeasurementBackend + ?Sized,
{
    inspect_token_with_timeout(backend, token, policy, timeout)
        .await
        .is_accepted()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_rounds_down() {
        assert_eq!(Tolerance::Rate(0.005).allowed_ones(10_000), 50);
        assert_eq!(Tolerance::Rate(0.005).allowed_ones(1_000), 5);
        assert_eq!(Tolerance::Rate(0.005).allowed_ones(199), 0);
        assert_eq!(Tolerance::Absolute(50).allowed_ones(1_000), 50);

        // Products that land just below an integer in binary floating point.
        assert_eq!(Tolerance::Rate(0.57).allowed_ones(100), 57);
        assert_eq!(Tolerance::Rate(0.29).allowed_ones(100), 29);
        assert_eq!(Tolerance::Rate(0.1).allowed_ones(3), 0);
        assert_eq!(Tolerance::Rate(1.0).allowed_ones(u32::MAX), u64::from(u32::MAX));
    }

    #[test]
    fn test_tolerance_validation() {
        assert!(Tolerance::Rate(0.0).validate().is_ok());
        assert!(Tolerance::Rate(1.0).validate().is_ok());
        assert!(Tolerance::Rate(-0.1).validate().is_err());
        assert!(Tolerance::Rate(f64::NAN).validate().is_err());
        assert!(Tolerance::Absolute(0).validate().is_ok());
    }

    #[test]
    fn test_policy_validation() {
        assert!(VerificationPolicy::new(0, Tolerance::Absolute(1)).is_err());
        assert!(VerificationPolicy::new(100, Tolerance::Rate(2.0)).is_err());

        let policy = VerificationPolicy::new(1_000, Tolerance::Absolute(50)).unwrap();
        assert_eq!(policy.max_in_flight, DEFAULT_MAX_IN_FLIGHT);
        assert!(policy.with_max_in_flight(0).validate().is_err());
    }

    #[test]
    fn test_default_policy() {
        let policy = VerificationPolicy::default();
        assert_eq!(policy.shots, 10_000);
        assert_eq!(policy.allowed_ones(), 50);
    }

    #[test]
    fn test_verdict_display() {
        let reason = RejectReason::ExcessOnes {
            id: QubitId(2),
            ones: 80,
            allowed: 50,
        };
        assert_eq!(
            Verdict::Rejected(reason).to_string(),
            "REJECTED (qubit q2 read 1 80 times (allowed 50))"
        );
        assert_eq!(Verdict::Accepted.to_string(), "ACCEPTED");
        assert_eq!(Tolerance::Rate(0.005).to_string(), "0.500% of shots");
    }
}
