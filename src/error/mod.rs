//! This module contains the primary error type for the library's interface. It
//! also re-exports the more specific error types that are subsystem-specific.

pub mod container;
pub mod guidance;
pub mod replay;

use thiserror::Error;

/// The interface result type for the library.
///
/// # Usage
///
/// Any function considered to be part of the public interface of the library
/// should return this result type. Subsystems should return the more-specific
/// child error types as appropriate.
pub type Result<T> = std::result::Result<T, Error>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by the
/// clients of the library) should be members of this enum.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Errors that come from replaying traces into the execution tree.
    #[error(transparent)]
    Replay(#[from] replay::LocatedError),

    /// Errors from the guidance engines.
    #[error(transparent)]
    Guidance(#[from] guidance::Error),

    /// An unknown error, represented as a string.
    #[error("Unknown Error: {_0:?}")]
    Other(String),
}

impl Error {
    /// Constructs an unknown error with the provided `message`.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
