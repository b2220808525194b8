// Consistent exit codes for the quire CLI.
//
//   0 = success
//   1 = general error
//   2 = usage/argument error (including invalid collection or document ids)
//   3 = version not found
//   4 = timed out waiting for the history lock

use std::process;

use quire_history::{ErrorCode, HistoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    NotFound = 3,
    LockTimeout = 4,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Map an anyhow error to an exit code by walking its chain for a
    /// `HistoryError`.
    pub fn from_error(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<HistoryError>())
            .map(|history| Self::from_history_code(history.code()))
            .unwrap_or(Self::Error)
    }

    pub fn from_history_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::NotFound => Self::NotFound,
            ErrorCode::InvalidId => Self::Usage,
            ErrorCode::LockTimeout => Self::LockTimeout,
            ErrorCode::IoFailure => Self::Error,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code())
    }
}
