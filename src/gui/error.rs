//! A nice little error we can return if things go wrong while driving
//! the terminal.

use std::{error::Error, fmt::Display, sync::mpsc};

/// Everything the TUI helpers can fail with.
#[derive(Debug)]
#[allow(missing_docs)]
pub enum ScopeGuiError {
    FmtError(std::fmt::Error),
    IOError(std::io::Error),
    MPSCSendError,
    MPSCRecvError(mpsc::RecvError),
    JoinError,
}

impl Display for ScopeGuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#?}", self)
    }
}

impl Error for ScopeGuiError {}

impl From<std::fmt::Error> for ScopeGuiError {
    fn from(value: std::fmt::Error) -> Self {
        Self::FmtError(value)
    }
}

impl From<std::io::Error> for ScopeGuiError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl<T> From<mpsc::SendError<T>> for ScopeGuiError {
    fn from(_: mpsc::SendError<T>) -> Self {
        Self::MPSCSendError
    }
}

impl From<mpsc::RecvError> for ScopeGuiError {
    fn from(value: mpsc::RecvError) -> Self {
        Self::MPSCRecvError(value)
    }
}
