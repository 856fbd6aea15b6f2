//! Verify command implementation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Result, bail};
use console::style;

use qtoken_core::{
    AngleSource, Degrees, RandomAngleSource, SecretBatch, generate_private_secrets,
    inspect_token, reverse_spin, spin_token,
};
use qtoken_ir::QubitId;

use super::common::{
    ProtocolArgs, angle_source, create_backend, issue_token, load_config, print_verification,
    spinner,
};

/// Angles used to decode qubit `id`: its own, or a stranger's for the impostor.
fn decoding_angles(
    secrets: &SecretBatch,
    id: QubitId,
    impostor: Option<QubitId>,
    source: &mut RandomAngleSource,
) -> Result<(Degrees, Degrees)> {
    let Some(own) = secrets.get(id) else {
        bail!("qubit {id} has no paired secret");
    };
    if impostor != Some(id) {
        return Ok((own.theta(), own.phi()));
    }

    // Borrow the next secret's angles; a single-qubit token gets fresh ones.
    let other = secrets
        .iter()
        .cycle()
        .skip_while(|s| s.id() != id)
        .nth(1)
        .filter(|s| s.id() != id);
    Ok(match other {
        Some(secret) => (secret.theta(), secret.phi()),
        None => (source.next_theta(), source.next_phi()),
    })
}

/// Execute the verify command.
pub async fn execute(
    config_file: Option<&Path>,
    args: &ProtocolArgs,
    wait: u64,
    impostor: Option<u32>,
) -> Result<()> {
    let config = load_config(config_file, args)?;
    let backend = create_backend(args, &config)?;
    let policy = config.to_policy();
    let impostor = impostor.map(QubitId);

    let mut source = angle_source(&config);
    let secrets = generate_private_secrets(config.qubits, &mut source)?;
    if let Some(id) = impostor {
        if secrets.get(id).is_none() {
            bail!(
                "impostor qubit {id} is not part of the token (ids 1..={})",
                config.qubits
            );
        }
    }

    let mut token = issue_token(&config, &secrets)?;
    spin_token(&mut token, &secrets)?;
    println!(
        "{} Issued token {} with {} qubits (ttl {}s)",
        style("→").cyan().bold(),
        style(token.id()).yellow(),
        token.len(),
        config.ttl_seconds
    );

    for qubit in token.qubits_mut() {
        let (theta, phi) = decoding_angles(&secrets, qubit.id(), impostor, &mut source)?;
        reverse_spin(qubit, theta, phi)?;
    }
    if let Some(id) = impostor {
        println!("  Decoded {} with the wrong angles", style(id).red());
    }

    if wait > 0 {
        let progress = spinner(format!("Waiting {wait}s before verification..."));
        tokio::time::sleep(Duration::from_secs(wait)).await;
        progress.finish_and_clear();
    }

    let progress = spinner(format!(
        "Verifying {} qubits at {} shots...",
        token.len(),
        policy.shots
    ));
    let verification = inspect_token(backend.as_ref(), &token, &policy).await;
    progress.finish_and_clear();
    print_verification(&verification);

    if !verification.is_accepted() {
        bail!("token {} was rejected", verification.token_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoding_angles() {
        let mut source = RandomAngleSource::seeded(3);
        let secrets = generate_private_secrets(3, &mut source).unwrap();
        let own = |id: u32| {
            let s = secrets.get(QubitId(id)).unwrap();
            (s.theta(), s.phi())
        };

        let honest = decoding_angles(&secrets, QubitId(2), None, &mut source).unwrap();
        assert_eq!(honest, own(2));

        let swapped =
            decoding_angles(&secrets, QubitId(2), Some(QubitId(2)), &mut source).unwrap();
        assert_eq!(swapped, own(3));

        let wrapped =
            decoding_angles(&secrets, QubitId(3), Some(QubitId(3)), &mut source).unwrap();
        assert_eq!(wrapped, own(1));

        assert!(decoding_angles(&secrets, QubitId(9), None, &mut source).is_err());
    }

    #[test]
    fn test_single_qubit_impostor_draws_fresh_angles() {
        let mut source = RandomAngleSource::seeded(4);
        let secrets = generate_private_secrets(1, &mut source).unwrap();
        let own = secrets.get(QubitId(1)).unwrap();

        let angles = decoding_angles(&secrets, QubitId(1), Some(QubitId(1)), &mut source).unwrap();
        assert_ne!(angles, (own.theta(), own.phi()));
    }
}
