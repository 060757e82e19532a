//! This module contains errors pertaining to replaying traces into the
//! execution tree.

use thiserror::Error;

use crate::{
    error::container::{self, RecordLocation},
    tree::{location::LocationId, Guid, Phase},
};

/// Errors that occur while replaying traces into the
/// [`crate::tree::ExecutionTree`].
///
/// All of these are fatal to the load being performed: the trace data and the
/// tree disagree, so nothing further can be trusted.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error(
        "Expected location {expected_location} with guid {expected_guid} but the tree has \
         location {found_location} with guid {found_guid}"
    )]
    Inconsistency {
        expected_location: LocationId,
        expected_guid:     Guid,
        found_location:    LocationId,
        found_guid:        Guid,
    },

    #[error("Guid {guid} is already registered at a different position in the tree")]
    DuplicateGuid { guid: Guid },

    #[error("Cannot replay phase {requested} after phase {current} has been replayed")]
    PhaseRegression { requested: Phase, current: Phase },

    #[error("Location {location} cannot be used as a branch identifier")]
    InvalidLocation { location: LocationId },

    #[error("Trace with {records} records cannot be indexed")]
    TraceTooLong { records: usize },

    #[error("The tree cannot hold more than {} nodes", u32::MAX)]
    TooManyNodes,
}

/// A replay error with the position of the offending trace record.
pub type LocatedError = container::Located<Error>;

/// The result type for methods that may have replay errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, location: RecordLocation) -> Self::Located {
        container::Located {
            location,
            payload: self,
        }
    }
}
