use capindex_core::{EngineError, ValidationError};
use capindex_warehouse::WarehouseError;
use thiserror::Error;

/// Top-level CLI failure, mapped to a process exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error("{0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Exit codes: 2 for usage and validation problems, 3 for data
    /// errors surfaced by the engine or warehouse, 4 for serialization
    /// failures, 10 for I/O failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Engine(_) | Self::Warehouse(_) => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_exit_with_code_two() {
        let error = CliError::Command(String::from("no observations loaded"));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn engine_errors_exit_with_code_three() {
        let error = CliError::Engine(EngineError::DuplicateDate {
            day: time::macros::date!(2026 - 01 - 05),
        });
        assert_eq!(error.exit_code(), 3);
    }
}
