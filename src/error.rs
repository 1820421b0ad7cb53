//! Error types.
//!
//! Infeasibility is never an error: unfilled shifts are reported in
//! [`GenerationResult::understaffed`](crate::models::GenerationResult).
//! Errors are reserved for malformed input and configuration.

use thiserror::Error;

use crate::validation::ValidationError;

/// Engine error.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("invalid scheduler context: {}", summarize(.0))]
    InvalidContext(Vec<ValidationError>),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}
