//! CLI command definitions

use clap::Args;
use serde_json::Value;

/// Run a script
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to script YAML file
    #[arg(short, long)]
    pub file: String,

    /// Start argument, parsed as JSON when possible (repeatable; replaces the script's args)
    #[arg(long, value_parser = parse_arg)]
    pub arg: Vec<Value>,

    /// Override the script's timeout, in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Don't register an error handler, so a failing step aborts the run
    #[arg(long)]
    pub fail_fast: bool,

    /// Print the final sequencer state as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a script
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to script YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse a start argument; anything that isn't valid JSON becomes a string
pub fn parse_arg(s: &str) -> Result<Value, String> {
    Ok(serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string())))
}
