//! Environment file generation.
//!
//! # Usage
//!
//! ```bash
//! SUPABASE_URL=https://xyz.supabase.co SUPABASE_KEY=... st-cli env
//! st-cli env --output deploy/.env.production
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Project URL
//! - `SUPABASE_KEY` - Anon key
//!
//! Missing values are written empty with a warning; the server starts with
//! them anyway and reports backend errors per request.

use std::path::Path;

use thiserror::Error;

/// Variables copied into the env file, in output order.
pub const BACKEND_VARS: [&str; 2] = ["SUPABASE_URL", "SUPABASE_KEY"];

/// Errors that can occur while writing the env file.
#[derive(Debug, Error)]
pub enum EnvFileError {
    /// The file could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Render the env file for the given lookups, returning the names that were
/// missing or blank.
pub fn render(lookup: impl Fn(&str) -> Option<String>) -> (String, Vec<&'static str>) {
    let mut contents = String::from("# Generated by st-cli env\n");
    let mut missing = Vec::new();

    for name in BACKEND_VARS {
        let value = lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if value.is_none() {
            missing.push(name);
        }
        contents.push_str(name);
        contents.push('=');
        contents.push_str(value.as_deref().unwrap_or_default());
        contents.push('\n');
    }

    (contents, missing)
}

/// Write the backend settings from the process environment to `output`.
///
/// # Errors
///
/// Returns [`EnvFileError::Write`] if the file cannot be written. Missing
/// variables only log a warning.
pub fn write_env_file(output: &Path) -> Result<(), EnvFileError> {
    let (contents, missing) = render(|name| std::env::var(name).ok());

    for name in &missing {
        tracing::warn!("{name} is not set; writing an empty value");
    }

    std::fs::write(output, contents).map_err(|source| EnvFileError::Write {
        path: output.display().to_string(),
        source,
    })?;

    tracing::info!(
        path = %output.display(),
        missing = missing.len(),
        "Environment file written"
    );
    Ok(())
}
