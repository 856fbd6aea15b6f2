//! Run command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use qtoken_core::{
    Token, generate_private_secrets, inspect_token, make_public_qubits_array, measure_qubit,
    reverse_spin_token, spin_token,
};
use qtoken_hal::MeasurementBackend;

use super::common::{
    ProtocolArgs, angle_source, create_backend, issue_token, load_config, print_counts,
    print_verification, spinner,
};

/// Execute the run command.
pub async fn execute(config_file: Option<&Path>, args: &ProtocolArgs) -> Result<()> {
    let config = load_config(config_file, args)?;
    let backend = create_backend(args, &config)?;
    let policy = config.to_policy();

    println!(
        "{} Token life cycle: {} qubits on {} ({} shots, tolerance {}, ttl {}s)",
        style("→").cyan().bold(),
        config.qubits,
        style(backend.name()).yellow(),
        config.shots,
        config.tolerance(),
        config.ttl_seconds
    );

    // 1. Secrets and their fresh public qubits
    let secrets = generate_private_secrets(config.qubits, &mut angle_source(&config))?;
    println!("\n{} Private secrets", style("1.").bold());
    for (secret, qubit) in secrets.iter().zip(make_public_qubits_array(&secrets)) {
        println!(
            "    {}  θ = {}  φ = {}",
            style(secret.id()).cyan(),
            secret.theta(),
            secret.phi()
        );
        let counts = measure_qubit(backend.as_ref(), qubit, config.shots).await?;
        print_counts(qubit.id(), &counts, config.shots);
    }

    // 2. Issue and encode
    let mut token = issue_token(&config, &secrets)?;
    println!(
        "\n{} Issued token {} ({})",
        style("2.").bold(),
        style(token.id()).yellow(),
        token.state()
    );
    spin_token(&mut token, &secrets)?;
    println!("    After spin ({}):", token.state());
    print_stage(backend.as_ref(), &token, config.shots).await?;

    // 3. Decode
    reverse_spin_token(&mut token, &secrets)?;
    println!("\n{} After reverse spin:", style("3.").bold());
    print_stage(backend.as_ref(), &token, config.shots).await?;

    // 4. Verify
    println!("\n{} Verification", style("4.").bold());
    let progress = spinner(format!("Verifying {} qubits...", token.len()));
    let verification = inspect_token(backend.as_ref(), &token, &policy).await;
    progress.finish_and_clear();
    print_verification(&verification);

    Ok(())
}

/// Measure and print every qubit of `token`.
async fn print_stage(backend: &dyn MeasurementBackend, token: &Token, shots: u32) -> Result<()> {
    for qubit in token.qubits() {
        let counts = measure_qubit(backend, qubit, shots).await?;
        print_counts(qubit.id(), &counts, shots);
    }
    Ok(())
}
