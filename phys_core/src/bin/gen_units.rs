//! Generate UNITS.md from the unit vocabulary.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin gen-units [output-path]
//! ```
//!
//! Without an argument the file is written to `phys_core/UNITS.md`.

use std::env;
use std::fs;
use std::path::PathBuf;

use phys_core::units::UnitSystem;

fn render() -> String {
    let units = UnitSystem::standard();
    let mut md = String::from("# Supported Units\n\n");
    md.push_str("Generated by `gen-units`. Do not edit by hand.\n\n");
    md.push_str("Prefixable units accept SI prefixes by symbol (`kN`) or name (`kilonewton`): ");
    md.push_str("T G M k h d c m u n p.\n\n");
    md.push_str(&units.markdown_table());
    md
}

fn main() {
    println!("Generating UNITS.md...");

    let markdown = render();
    let output_path = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("phys_core/UNITS.md"));

    match fs::write(&output_path, &markdown) {
        Ok(()) => {
            println!("Successfully wrote {} bytes to {}", markdown.len(), output_path.display());
        }
        Err(e) => {
            eprintln!("Error writing file: {}", e);
            std::process::exit(1);
        }
    }
}
