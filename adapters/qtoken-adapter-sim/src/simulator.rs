//! Simulator backend implementation.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use qtoken_hal::{
    BackendConfig, BackendFactory, Capabilities, Counts, ExecutionResult, HalError, HalResult,
    Job, JobId, JobStatus, MeasurementBackend,
};
use qtoken_ir::Program;

use crate::statevector::Statevector;

/// Default number of addressable physical indices.
const DEFAULT_ADDRESSABLE_QUBITS: u32 = 1024;

/// Most distinct qubits a single program may touch.
const MAX_ACTIVE_QUBITS: usize = 20;

/// Finished jobs kept for `status`/`result` lookups; older ones are evicted.
const MAX_RETAINED_JOBS: usize = 1024;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Finished jobs in submission order, bounded by [`MAX_RETAINED_JOBS`].
#[derive(Default)]
struct JobTable {
    jobs: FxHashMap<String, SimJob>,
    order: VecDeque<String>,
}

impl JobTable {
    fn insert(&mut self, id: String, job: SimJob) {
        self.order.push_back(id.clone());
        self.jobs.insert(id, job);
        while self.order.len() > MAX_RETAINED_JOBS {
            if let Some(oldest) = self.order.pop_front() {
                self.jobs.remove(&oldest);
            }
        }
    }

    fn get(&self, id: &str) -> Option<&SimJob> {
        self.jobs.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut SimJob> {
        self.jobs.get_mut(id)
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}

/// Local statevector backend.
///
/// Programs are simulated over the distinct qubits they touch, so the
/// physical index only has to fall inside the addressable range. Sampling
/// runs on tokio's blocking pool and requires a runtime.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Recently finished jobs.
    jobs: Mutex<JobTable>,
    /// Shot sampler, shared with the blocking simulation task.
    rng: Arc<Mutex<StdRng>>,
    /// Probability that a measured bit is reported flipped.
    readout_error: f64,
}

impl SimulatorBackend {
    /// Create a simulator seeded from OS entropy.
    pub fn new() -> Self {
        Self::build(StdRng::from_entropy(), DEFAULT_ADDRESSABLE_QUBITS)
    }

    /// Create a simulator whose sampling is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(StdRng::seed_from_u64(seed), DEFAULT_ADDRESSABLE_QUBITS)
    }

    /// Restrict the addressable physical index range to `0..num_qubits`.
    #[must_use]
    pub fn with_addressable_qubits(mut self, num_qubits: u32) -> Self {
        self.capabilities.num_qubits = num_qubits;
        self
    }

    /// Flip each measured bit with probability `p`.
    pub fn with_readout_error(mut self, p: f64) -> HalResult<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(HalError::Configuration(format!(
                "readout error must be within [0, 1], got {p}"
            )));
        }
        self.readout_error = p;
        Ok(self)
    }

    /// Configured readout error probability.
    pub fn readout_error(&self) -> f64 {
        self.readout_error
    }

    fn build(rng: StdRng, num_qubits: u32) -> Self {
        Self {
            config: BackendConfig::new("simulator"),
            capabilities: Capabilities::simulator(num_qubits),
            jobs: Mutex::new(JobTable::default()),
            rng: Arc::new(Mutex::new(rng)),
            readout_error: 0.0,
        }
    }

    fn lock_jobs(&self) -> MutexGuard<'_, JobTable> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run simulation synchronously.
#[instrument(skip(program, rng))]
fn run_simulation(
    program: &Program,
    shots: u32,
    rng: &Mutex<StdRng>,
    readout_error: f64,
) -> HalResult<ExecutionResult> {
    let start = Instant::now();

    // Dense register over the qubits the program actually touches.
    let qubits: Vec<_> = program.qubits().into_iter().collect();
    if qubits.len() > MAX_ACTIVE_QUBITS {
        return Err(HalError::InvalidProgram(format!(
            "program touches {} qubits but the simulator handles at most {}",
            qubits.len(),
            MAX_ACTIVE_QUBITS
        )));
    }
    let local: FxHashMap<_, _> = qubits.iter().enumerate().map(|(i, q)| (*q, i)).collect();

    debug!(
        "Starting simulation: {} active qubits, {} shots",
        qubits.len(),
        shots
    );

    let mut state = Statevector::new(qubits.len());
    for (gate, qubit) in program.gates() {
        state.apply(gate, local[&qubit]);
    }

    let measurements: Vec<(usize, usize)> = program
        .measurements()
        .map(|(q, c)| (local[&q], c.0 as usize))
        .collect();
    let num_clbits = program.num_clbits();
    let cdf = state.cumulative();

    let mut counts = Counts::new();
    let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
    let mut bits = vec!['0'; num_clbits];

    for _ in 0..shots {
        let outcome = Statevector::sample_from(&cdf, &mut *rng);
        bits.fill('0');
        for &(qubit, clbit) in &measurements {
            let mut bit = (outcome >> qubit) & 1 == 1;
            if readout_error > 0.0 && rng.gen_bool(readout_error) {
                bit = !bit;
            }
            if bit {
                bits[clbit] = '1';
            }
        }
        counts.record(bits.iter().collect::<String>());
    }

    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!("Simulation completed in {} ms", elapsed_ms);

    Ok(ExecutionResult::new(counts, shots)
        .with_execution_time(elapsed_ms)
        .with_metadata("active_qubits", serde_json::json!(qubits.len()))
        .with_metadata("readout_error", serde_json::json!(readout_error)))
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeasurementBackend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self, program))]
    async fn submit(&self, program: &Program, shots: u32) -> HalResult<JobId> {
        self.validate(program, shots)?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let mut job = Job::new(job_id.clone(), shots, self.name());
        job.transition(JobStatus::Running);

        debug!("Submitted job: {}", job_id);

        // Local execution completes before submit returns. A dropped submit
        // leaves no entry behind.
        let owned = program.clone();
        let rng = Arc::clone(&self.rng);
        let readout_error = self.readout_error;
        let outcome = tokio::task::spawn_blocking(move || {
            run_simulation(&owned, shots, &rng, readout_error)
        })
        .await
        .map_err(|e| HalError::Backend(format!("simulation task failed: {e}")))?;

        let (result, status) = match outcome {
            Ok(result) => (Some(result), JobStatus::Completed),
            Err(e) => (None, JobStatus::Failed(e.to_string())),
        };
        job.transition(status);
        debug!(
            "Job {} finished as {} after {:?}",
            job_id,
            job.status,
            job.elapsed()
        );

        self.lock_jobs()
            .insert(job_id.0.clone(), SimJob { job, result });

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.lock_jobs()
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let jobs = self.lock_jobs();
        let sim_job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match (&sim_job.job.status, &sim_job.result) {
            (JobStatus::Completed, Some(result)) => Ok(result.clone()),
            (status, _) => Err(HalError::JobFailed(format!(
                "job {job_id} has no result (status: {status})"
            ))),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.lock_jobs();
        match jobs.get_mut(&job_id.0) {
            Some(sim_job) => {
                sim_job.job.transition(JobStatus::Cancelled);
                Ok(())
            }
            None => Err(HalError::JobNotFound(job_id.0.clone())),
        }
    }
}

impl BackendFactory for SimulatorBackend {
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let rng = match config.extra.get("seed").and_then(serde_json::Value::as_u64) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let num_qubits = config
            .extra
            .get("max_qubits")
            .and_then(serde_json::Value::as_u64)
            .map_or(Ok(DEFAULT_ADDRESSABLE_QUBITS), u32::try_from)
            .map_err(|_| HalError::Configuration("max_qubits does not fit in u32".into()))?;
        let readout_error = config
            .extra
            .get("readout_error")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0);

        let mut backend = Self::build(rng, num_qubits).with_readout_error(readout_error)?;
        backend.config = config;
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use qtoken_ir::{ClbitId, QubitId};
    use std::f64::consts::PI;

    fn measured(q: QubitId, build: impl FnOnce(&mut Program)) -> Program {
        let mut program = Program::new();
        build(&mut program);
        program.with_measurement(q, ClbitId(0)).unwrap()
    }

    #[test]
    fn test_simulator_capabilities() {
        let backend = SimulatorBackend::new();
        let caps = backend.capabilities();

        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, DEFAULT_ADDRESSABLE_QUBITS);
        assert_eq!(backend.name(), "simulator");
    }

    #[tokio::test]
    async fn test_ground_state_reads_zero() {
        let backend = SimulatorBackend::with_seed(1);
        let q = QubitId(0);
        let counts = backend
            .execute(&measured(q, |_| {}), 1000)
            .await
            .unwrap();
        assert_eq!(counts.zeros(), 1000);
        assert_eq!(counts.ones(), 0);
    }

    #[tokio::test]
    async fn test_high_physical_index() {
        let backend = SimulatorBackend::with_seed(2);
        let q = QubitId(90);
        let program = measured(q, |p| {
            p.ry(PI, q).unwrap();
        });

        let job_id = backend.submit(&program, 500).await.unwrap();
        assert!(backend.status(&job_id).await.unwrap().is_success());

        let result = backend.result(&job_id).await.unwrap();
        assert_eq!(result.shots, 500);
        assert_eq!(result.counts.ones(), 500);
    }

    #[tokio::test]
    async fn test_balanced_rotation() {
        let backend = SimulatorBackend::with_seed(3);
        let q = QubitId(4);
        let program = measured(q, |p| {
            p.ry(PI / 2.0, q).unwrap();
        });

        let counts = backend.execute(&program, 10_000).await.unwrap();
        let ones = counts.ones();
        assert!((4_500..=5_500).contains(&ones), "ones = {ones}");
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let q = QubitId(1);
        let program = measured(q, |p| {
            p.ry(1.0, q).unwrap().rz(0.5, q).unwrap();
        });

        let a = SimulatorBackend::with_seed(42)
            .execute(&program, 2000)
            .await
            .unwrap();
        let b = SimulatorBackend::with_seed(42)
            .execute(&program, 2000)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_readout_error_introduces_ones() {
        let backend = SimulatorBackend::with_seed(5)
            .with_readout_error(0.05)
            .unwrap();
        let q = QubitId(0);
        let counts = backend
            .execute(&measured(q, |_| {}), 10_000)
            .await
            .unwrap();

        let ones = counts.ones();
        assert!((300..=700).contains(&ones), "ones = {ones}");
        assert_eq!(counts.total_shots(), 10_000);
    }

    #[test]
    fn test_readout_error_out_of_range() {
        assert!(SimulatorBackend::new().with_readout_error(1.5).is_err());
        assert!(SimulatorBackend::new().with_readout_error(-0.1).is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_qubit_rejected() {
        let backend = SimulatorBackend::with_seed(6).with_addressable_qubits(8);
        let q = QubitId(8);
        let result = backend.submit(&measured(q, |_| {}), 10).await;
        assert!(matches!(result, Err(HalError::InvalidProgram(_))));
    }

    #[tokio::test]
    async fn test_too_many_active_qubits_fails_job() {
        let backend = SimulatorBackend::with_seed(7);
        let mut program = Program::new();
        for i in 0..=MAX_ACTIVE_QUBITS as u32 {
            program.ry(0.1, QubitId(i)).unwrap();
        }
        let program = program.with_measurement(QubitId(0), ClbitId(0)).unwrap();

        let job_id = backend.submit(&program, 10).await.unwrap();
        assert!(matches!(
            backend.status(&job_id).await.unwrap(),
            JobStatus::Failed(_)
        ));
        assert!(backend.result(&job_id).await.is_err());
    }

    #[tokio::test]
    async fn test_finished_jobs_are_bounded() {
        let backend = SimulatorBackend::with_seed(8);
        let program = measured(QubitId(1), |_| {});

        let first = backend.submit(&program, 1).await.unwrap();
        assert!(backend.result(&first).await.is_ok());

        for _ in 0..MAX_RETAINED_JOBS {
            backend.execute(&program, 1).await.unwrap();
        }

        assert_eq!(backend.lock_jobs().len(), MAX_RETAINED_JOBS);
        assert!(matches!(
            backend.result(&first).await,
            Err(HalError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let backend = SimulatorBackend::new();
        let missing = JobId::new("missing");
        assert!(matches!(
            backend.status(&missing).await,
            Err(HalError::JobNotFound(_))
        ));
        assert!(backend.cancel(&missing).await.is_err());
    }

    #[test]
    fn test_from_config() {
        let config = BackendConfig::new("simulator")
            .with_extra("seed", serde_json::json!(9))
            .with_extra("max_qubits", serde_json::json!(16))
            .with_extra("readout_error", serde_json::json!(0.01));

        let backend = SimulatorBackend::from_config(config).unwrap();
        assert_eq!(backend.capabilities().num_qubits, 16);
        assert!((backend.readout_error() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_from_config_rejects_bad_readout_error() {
        let config =
            BackendConfig::new("simulator").with_extra("readout_error", serde_json::json!(2.0));
        assert!(SimulatorBackend::from_config(config).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn counts_always_sum_to_shots(shots in 1u32..=100_000, theta in 0.0f64..PI, phi in 0.0f64..(2.0 * PI)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let q = QubitId(2);
            let program = measured(q, |p| {
                p.ry(theta, q).unwrap().rz(phi, q).unwrap();
            });
            let counts = runtime
                .block_on(SimulatorBackend::with_seed(11).execute(&program, shots))
                .unwrap();
            prop_assert_eq!(counts.zeros() + counts.ones(), u64::from(shots));
        }
    }
}
