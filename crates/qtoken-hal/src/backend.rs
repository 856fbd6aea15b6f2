//! Measurement backend trait and configuration.
//!
//! A [`MeasurementBackend`] is the measurement oracle of the token protocol:
//! given a rotation program ending in a measurement and a shot count, it
//! produces an outcome histogram. The lifecycle mirrors a job queue so the
//! same trait fits a local simulator and a remote device:
//!
//! ```text
//!   capabilities() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)        (sync)        (async)      (async)      (async)
//! ```
//!
//! Callers that just want counts use the provided [`MeasurementBackend::execute`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qtoken_ir::Program;

use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::{Counts, ExecutionResult};

/// Configuration for a backend instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name of the backend.
    pub name: String,
    /// Backend-specific settings (e.g. `seed`, `readout_error`, `max_qubits`).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Add a backend-specific setting.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A backend that executes rotation programs and reports outcome counts.
///
/// # Contract
///
/// - `capabilities()` MUST be synchronous and infallible.
/// - `submit()` MUST return a job that starts `Queued`.
/// - `result()` MUST only succeed once status is `Completed`.
/// - Counts of a completed job MUST sum to the requested shots.
#[async_trait]
pub trait MeasurementBackend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Check a program and shot count against the capabilities.
    fn validate(&self, program: &Program, shots: u32) -> HalResult<()> {
        let caps = self.capabilities();
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be at least 1".into()));
        }
        if shots > caps.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} exceeds the backend limit of {}",
                caps.max_shots
            )));
        }
        let reasons = caps.check(program);
        if !reasons.is_empty() {
            return Err(HalError::InvalidProgram(reasons.join("; ")));
        }
        Ok(())
    }

    /// Submit a program for execution.
    async fn submit(&self, program: &Program, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Cancel a pending job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Wait for a job to complete and return its result.
    ///
    /// Default implementation polls every 500ms for up to 5 minutes.
    async fn wait(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        use tokio::time::sleep;

        let poll_interval = Duration::from_millis(500);
        let max_polls = 600;

        for _ in 0..max_polls {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => sleep(poll_interval).await,
            }
        }

        Err(HalError::Timeout(job_id.0.clone()))
    }

    /// Run `program` for `shots` trials and return the checked histogram.
    ///
    /// Fails if the backend reports counts that do not sum to `shots`.
    async fn execute(&self, program: &Program, shots: u32) -> HalResult<Counts> {
        self.validate(program, shots)?;
        let job_id = self.submit(program, shots).await?;
        let result = self.wait(&job_id).await?;

        let reported = result.counts.total_shots();
        if reported != u64::from(shots) {
            return Err(HalError::InconsistentCounts {
                expected: u64::from(shots),
                reported,
            });
        }

        debug!(backend = self.name(), %job_id, shots, "execution complete");
        Ok(result.counts)
    }
}

/// Trait for creating backends from configuration.
pub trait BackendFactory: MeasurementBackend + Sized {
    /// Create a backend from configuration.
    fn from_config(config: BackendConfig) -> HalResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use qtoken_ir::{ClbitId, QubitId};

    /// Returns a fixed histogram regardless of the program.
    struct FixedBackend {
        capabilities: Capabilities,
        counts: Counts,
        status: JobStatus,
        submitted: Mutex<u32>,
    }

    impl FixedBackend {
        fn new(counts: Counts, status: JobStatus) -> Self {
            Self {
                capabilities: Capabilities::simulator(4).with_max_shots(1000),
                counts,
                status,
                submitted: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl MeasurementBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.capabilities
        }

        async fn submit(&self, _program: &Program, _shots: u32) -> HalResult<JobId> {
            *self.submitted.lock().unwrap() += 1;
            Ok(JobId::new("fixed-job"))
        }

        async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
            Ok(self.status.clone())
        }

        async fn result(&self, _job_id: &JobId) -> HalResult<ExecutionResult> {
            Ok(ExecutionResult::new(self.counts.clone(), 0))
        }

        async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
            Ok(())
        }
    }

    fn measured_program() -> Program {
        let q = QubitId(0);
        let mut program = Program::new();
        program.ry(0.2, q).unwrap();
        program.with_measurement(q, ClbitId(0)).unwrap()
    }

    #[test]
    fn test_backend_config() {
        let config = BackendConfig::new("test")
            .with_extra("seed", serde_json::json!(7))
            .with_extra("readout_error", serde_json::json!(0.01));

        assert_eq!(config.name, "test");
        assert_eq!(config.extra["seed"], serde_json::json!(7));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["name"], "test");
        assert_eq!(json["readout_error"], serde_json::json!(0.01));
    }

    #[test]
    fn test_validate_shots() {
        let backend = FixedBackend::new(Counts::new(), JobStatus::Completed);
        let program = measured_program();

        assert!(matches!(
            backend.validate(&program, 0),
            Err(HalError::InvalidShots(_))
        ));
        assert!(matches!(
            backend.validate(&program, 1001),
            Err(HalError::InvalidShots(_))
        ));
        assert!(backend.validate(&program, 1000).is_ok());
    }

    #[test]
    fn test_validate_requires_measurement() {
        let backend = FixedBackend::new(Counts::new(), JobStatus::Completed);
        let mut program = Program::new();
        program.ry(0.2, QubitId(0)).unwrap();

        assert!(matches!(
            backend.validate(&program, 10),
            Err(HalError::InvalidProgram(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_returns_counts() {
        let backend =
            FixedBackend::new(Counts::from_pairs([("0", 97), ("1", 3)]), JobStatus::Completed);
        let counts = backend.execute(&measured_program(), 100).await.unwrap();
        assert_eq!(counts.ones(), 3);
        assert_eq!(*backend.submitted.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_execute_rejects_inconsistent_counts() {
        let backend = FixedBackend::new(Counts::from_pairs([("0", 90)]), JobStatus::Completed);
        let err = backend.execute(&measured_program(), 100).await.unwrap_err();
        assert!(matches!(
            err,
            HalError::InconsistentCounts {
                expected: 100,
                reported: 90
            }
        ));
    }

    #[tokio::test]
    async fn test_execute_propagates_job_failure() {
        let backend = FixedBackend::new(Counts::new(), JobStatus::Failed("calibration".into()));
        let err = backend.execute(&measured_program(), 100).await.unwrap_err();
        assert!(matches!(err, HalError::JobFailed(ref msg) if msg == "calibration"));
    }

    #[tokio::test]
    async fn test_invalid_program_is_never_submitted() {
        let backend = FixedBackend::new(Counts::new(), JobStatus::Completed);
        let program = Program::new();
        assert!(backend.execute(&program, 10).await.is_err());
        assert_eq!(*backend.submitted.lock().unwrap(), 0);
    }
}
