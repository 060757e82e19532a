//! This module contains errors pertaining to the guidance engines.

use thiserror::Error;

use crate::tree::{location::SignedId, Guid};

/// Errors that occur while computing or applying a guidance model.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("No direction can be advanced through at the node with guid {guid}")]
    NoAdvanceableDirection { guid: Guid },

    #[error("The execution tree has no nodes to descend through")]
    EmptyTree,

    #[error("{target} cannot be used as a guidance target")]
    InvalidTarget { target: SignedId },
}

/// The result type for methods that may have guidance errors.
pub type Result<T> = std::result::Result<T, Error>;
