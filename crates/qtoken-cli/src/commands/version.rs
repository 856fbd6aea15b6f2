//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - quantum token issuance and verification",
        style("qtoken").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qtoken-ir           Rotation program representation");
    println!("  qtoken-hal          Measurement backend abstraction");
    println!("  qtoken-core         Token protocol");
    println!("  qtoken-adapter-sim  Local statevector simulator");
    println!("  qtoken-cli          Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
