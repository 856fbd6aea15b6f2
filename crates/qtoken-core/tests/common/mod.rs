//! Test doubles for the measurement backend and fixed-angle sources.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use qtoken_core::{
    AngleSource, Degrees, SecretBatch, Token, generate_private_secrets, make_public_qubits_array,
};
use qtoken_hal::{
    Capabilities, Counts, ExecutionResult, HalError, HalResult, JobId, JobStatus,
    MeasurementBackend,
};
use qtoken_ir::Program;

/// Wraps a backend and counts submitted programs.
pub struct CountingBackend<B> {
    inner: B,
    submissions: AtomicUsize,
}

impl<B: MeasurementBackend> CountingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<B: MeasurementBackend> MeasurementBackend for CountingBackend<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capabilities(&self) -> &Capabilities {
        self.inner.capabilities()
    }

    async fn submit(&self, program: &Program, shots: u32) -> HalResult<JobId> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.inner.submit(program, shots).await
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.inner.status(job_id).await
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        self.inner.result(job_id).await
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.inner.cancel(job_id).await
    }
}

/// Delays every submission before handing it to the inner backend.
pub struct SlowBackend<B> {
    inner: B,
    delay: Duration,
}

impl<B: MeasurementBackend> SlowBackend<B> {
    pub fn new(inner: B, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<B: MeasurementBackend> MeasurementBackend for SlowBackend<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capabilities(&self) -> &Capabilities {
        self.inner.capabilities()
    }

    async fn submit(&self, program: &Program, shots: u32) -> HalResult<JobId> {
        tokio::time::sleep(self.delay).await;
        self.inner.submit(program, shots).await
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.inner.status(job_id).await
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        self.inner.result(job_id).await
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.inner.cancel(job_id).await
    }
}

/// Refuses every submission.
pub struct UnavailableBackend {
    capabilities: Capabilities,
}

impl UnavailableBackend {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::simulator(64),
        }
    }
}

#[async_trait]
impl MeasurementBackend for UnavailableBackend {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "unavailable"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn submit(&self, _program: &Program, _shots: u32) -> HalResult<JobId> {
        Err(HalError::BackendUnavailable("device offline".into()))
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        Err(HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        Err(HalError::JobNotFound(job_id.0.clone()))
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        Err(HalError::JobNotFound(job_id.0.clone()))
    }
}

/// How a [`MisreportingBackend`] corrupts its histogram.
#[derive(Debug, Clone, Copy)]
pub enum Misreport {
    /// Counts sum to one fewer than the requested shots.
    ShortCount,
    /// One shot is reported under a two-bit outcome.
    StrayOutcome,
}

/// Completes every job with a corrupted histogram.
pub struct MisreportingBackend {
    capabilities: Capabilities,
    mode: Misreport,
}

impl MisreportingBackend {
    pub fn new(mode: Misreport) -> Self {
        Self {
            capabilities: Capabilities::simulator(64),
            mode,
        }
    }
}

#[async_trait]
impl MeasurementBackend for MisreportingBackend {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "misreporting"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn submit(&self, _program: &Program, shots: u32) -> HalResult<JobId> {
        Ok(JobId::new(format!("misreport-{shots}")))
    }

    async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
        Ok(JobStatus::Completed)
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let shots: u32 = job_id
            .0
            .trim_start_matches("misreport-")
            .parse()
            .map_err(|_| HalError::JobNotFound(job_id.0.clone()))?;
        let total = u64::from(shots);
        let counts = match self.mode {
            Misreport::ShortCount => Counts::from_pairs([("0", total - 1)]),
            Misreport::StrayOutcome => Counts::from_pairs([("0", total - 1), ("01", 1)]),
        };
        Ok(ExecutionResult::new(counts, shots))
    }

    async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
        Ok(())
    }
}

/// Yields the same angles on every draw.
pub struct FixedAngles {
    pub theta: Degrees,
    pub phi: Degrees,
}

impl FixedAngles {
    pub fn new(theta: f64, phi: f64) -> Self {
        Self {
            theta: Degrees(theta),
            phi: Degrees(phi),
        }
    }
}

impl AngleSource for FixedAngles {
    fn next_theta(&mut self) -> Degrees {
        self.theta
    }

    fn next_phi(&mut self) -> Degrees {
        self.phi
    }
}

/// Generate `n` secrets and a token holding a copy of every public qubit.
pub fn issue<S: AngleSource>(n: u32, source: &mut S, ttl: Duration) -> (SecretBatch, Token) {
    let secrets = generate_private_secrets(n, source).unwrap();
    let mut token = Token::new(ttl).unwrap();
    for qubit in make_public_qubits_array(&secrets) {
        token.add_qubit(qubit.clone()).unwrap();
    }
    (secrets, token)
}
