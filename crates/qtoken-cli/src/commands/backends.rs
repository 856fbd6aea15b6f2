//! Backends command implementation.

use anyhow::Result;
use console::style;

use qtoken_hal::BackendConfig;

use super::common::registry;

/// Execute the backends command.
pub fn execute() -> Result<()> {
    println!("{} Available backends:\n", style("qtoken").cyan().bold());

    let registry = registry();
    for (name, description, aliases) in registry.describe() {
        let backend = registry.create(&name, BackendConfig::new(&name))?;
        let caps = backend.capabilities();

        println!(
            "  {} {} {}",
            style("●").green(),
            style(&name).bold(),
            if caps.is_simulator { "(local)" } else { "" }
        );
        println!("    {description}");
        if !aliases.is_empty() {
            println!("    Aliases: {}", aliases.join(", "));
        }
        println!("    Addressable qubits: 0..{}", caps.num_qubits);
        println!("    Max shots: {}", caps.max_shots);
        println!("    Operations: {}", caps.gate_set.join(", "));
        println!();
    }

    Ok(())
}
