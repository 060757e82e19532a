use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::Phase;

/// The position of a single record in the trace input, used to point at the
/// data that caused an error.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RecordLocation {
    /// The phase that was being replayed.
    pub phase: Phase,

    /// The number of the trace within the phase.
    pub trace: u32,

    /// The index of the record within the trace.
    pub record: u32,
}

impl RecordLocation {
    /// Constructs a new record location.
    #[must_use]
    pub fn new(phase: Phase, trace: u32, record: u32) -> Self {
        Self {
            phase,
            trace,
            record,
        }
    }
}

impl Display for RecordLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "phase {}, trace {}, record {}",
            self.phase, self.trace, self.record
        )
    }
}

/// An error that is localised to a particular record of the trace input.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Located<E>
where
    E: Clone,
{
    /// The record that was being replayed when the error occurred.
    pub location: RecordLocation,

    /// The error data
    pub payload: E,
}

/// Displays the error prefixed by the position of the offending record.
impl<E> Display for Located<E>
where
    E: Display + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.location, self.payload)
    }
}

/// A trait for types that can have a record location attached to them.
pub trait Locatable
where
    Self: Sized,
{
    /// The return type with the attached record location.
    type Located;

    /// Attach the record described by `location` to the error.
    fn locate(self, location: RecordLocation) -> Self::Located;
}

/// A blanket implementation that allows for attaching a location to any result.
impl<T, E> Locatable for Result<T, E>
where
    E: std::error::Error + Clone,
{
    type Located = Result<T, Located<E>>;

    fn locate(self, location: RecordLocation) -> Self::Located {
        self.map_err(|e| Located {
            location,
            payload: e,
        })
    }
}
