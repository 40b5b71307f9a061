//! Config command handlers

use crate::cli::ConfigInitArgs;
use colored::Colorize;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../spendwise.example.toml");

/// Handle `spendwise config init`
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!(
        "{} Configuration file created: {}",
        "✓".green(),
        args.output.display()
    );
    println!("  Set GOOGLE_API_KEY before running `spendwise serve`.");

    Ok(())
}
