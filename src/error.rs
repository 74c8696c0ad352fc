use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    EmpiricalFrequencies,
    EmpiricalSubstRates,
    EmpiricalPinv,
    DuplicateModelKey,
    ModelSetRejected,
    CheckpointMismatch,
    CheckpointCorrupt,
    InvalidInput,
    Io,
}

/// Error surface of the crate. Cloneable so that a failed statistic
/// computation can be memoized and returned again without re-running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionError {
    pub code: ErrorCode,
    pub message: String,
}

impl SelectionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for SelectionError {}

impl From<std::io::Error> for SelectionError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, err.to_string())
    }
}

impl From<serde_json::Error> for SelectionError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::Io, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SelectionError::new(ErrorCode::EmpiricalFrequencies, "state G never observed");
        assert_eq!(err.to_string(), "EmpiricalFrequencies: state G never observed");
    }

    #[test]
    fn test_serde_round_trip() {
        let err = SelectionError::new(ErrorCode::CheckpointMismatch, "descriptor differs");
        let json = serde_json::to_string(&err).unwrap();
        let back: SelectionError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
