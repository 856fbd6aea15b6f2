//! Shared helpers for CLI commands.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use qtoken_adapter_sim::SimulatorBackend;
use qtoken_core::{
    ProtocolConfig, RandomAngleSource, SecretBatch, Token, Verdict, Verification,
    make_public_qubits_array,
};
use qtoken_hal::{BackendConfig, BackendRegistry, Counts, MeasurementBackend};
use qtoken_ir::QubitId;

/// Protocol settings that override the configuration file and environment.
#[derive(Args, Debug, Clone)]
pub struct ProtocolArgs {
    /// Qubits per token
    #[arg(short = 'n', long)]
    pub qubits: Option<u32>,

    /// Shots per qubit
    #[arg(short, long)]
    pub shots: Option<u32>,

    /// Allowed `1` outcomes per qubit
    #[arg(long, conflicts_with = "tolerance_rate")]
    pub tolerance: Option<u64>,

    /// Allowed `1` outcomes as a fraction of shots
    #[arg(long)]
    pub tolerance_rate: Option<f64>,

    /// Token time-to-live in seconds
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Concurrent backend calls during verification
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Seed for angles and sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Backend to use
    #[arg(short, long, default_value = "simulator")]
    pub backend: String,

    /// Simulated readout error probability
    #[arg(long, default_value = "0.0")]
    pub readout_error: f64,
}

impl ProtocolArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, mut config: ProtocolConfig) -> ProtocolConfig {
        if let Some(qubits) = self.qubits {
            config.qubits = qubits;
        }
        if let Some(shots) = self.shots {
            config.shots = shots;
        }
        if let Some(rate) = self.tolerance_rate {
            config.tolerance_rate = rate;
            config.tolerance = None;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = Some(tolerance);
        }
        if let Some(ttl) = self.ttl {
            config.ttl_seconds = ttl;
        }
        if let Some(max_in_flight) = self.max_in_flight {
            config.max_in_flight = max_in_flight;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config
    }
}

/// Defaults, then file, then environment, then flags.
pub fn load_config(config_file: Option<&Path>, args: &ProtocolArgs) -> Result<ProtocolConfig> {
    let config = ProtocolConfig::resolve(config_file).context("Failed to load configuration")?;
    let config = args.apply(config);
    config.validate().context("Invalid protocol settings")?;
    debug!(?config, "resolved protocol configuration");
    Ok(config)
}

/// Every backend the CLI can create.
pub fn registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register::<SimulatorBackend>("simulator", "Local statevector simulator");
    registry.alias("sim", "simulator");
    registry
}

/// Create the backend named in `args`, seeded from `config` when a seed is set.
pub fn create_backend(
    args: &ProtocolArgs,
    config: &ProtocolConfig,
) -> Result<Box<dyn MeasurementBackend>> {
    let mut backend_config = BackendConfig::new(&args.backend)
        .with_extra("readout_error", serde_json::json!(args.readout_error));
    if let Some(seed) = config.seed {
        backend_config = backend_config.with_extra("seed", serde_json::json!(seed));
    }

    debug!(backend = %args.backend, ?backend_config, "creating backend");
    registry()
        .create(&args.backend.to_lowercase(), backend_config)
        .with_context(|| format!("Failed to create backend '{}'", args.backend))
}

/// Angle source for `config`.
pub fn angle_source(config: &ProtocolConfig) -> RandomAngleSource {
    match config.seed {
        Some(seed) => RandomAngleSource::seeded(seed),
        None => RandomAngleSource::from_entropy(),
    }
}

/// Issue a token holding every public qubit of `secrets`.
pub fn issue_token(config: &ProtocolConfig, secrets: &SecretBatch) -> Result<Token> {
    let mut token = Token::new(config.ttl())?;
    for qubit in make_public_qubits_array(secrets) {
        token.add_qubit(qubit.clone())?;
    }
    Ok(token)
}

/// Spinner for long-running steps.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print a one-qubit histogram.
pub fn print_counts(id: QubitId, counts: &Counts, shots: u32) {
    let ones = counts.ones();
    let rate = ones as f64 / f64::from(shots) * 100.0;
    println!(
        "    {}  0: {:>7}  1: {:>7}  ({:>6.2}% ones)",
        style(id).cyan(),
        counts.zeros(),
        ones,
        rate
    );
}

/// Print the per-qubit reports and verdict of a verification.
pub fn print_verification(verification: &Verification) {
    for report in &verification.reports {
        let mark = if report.passed {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "    {} {}  ones: {} / {} shots",
            mark,
            style(report.id).cyan(),
            report.ones,
            report.shots
        );
    }

    let age = verification.age.num_milliseconds() as f64 / 1000.0;
    match &verification.verdict {
        Verdict::Accepted => println!(
            "\n{} Token {} accepted ({:.1}s after issuance)",
            style("✓").green().bold(),
            style(&verification.token_id).yellow(),
            age
        ),
        Verdict::Rejected(reason) => println!(
            "\n{} Token {} rejected: {} ({:.1}s after issuance)",
            style("✗").red().bold(),
            style(&verification.token_id).yellow(),
            reason,
            age
        ),
    }
}
