//! This module contains the already-parsed trace data that is replayed into the
//! [`crate::tree::ExecutionTree`].
//!
//! Parsing traces from disk is the job of an external loader. The types here
//! are the hand-off point between that loader and the tree.

use serde::{Deserialize, Serialize};

use crate::tree::{
    location::{Direction, LocationId},
    Guid,
};

/// A single branch decision recorded during execution of the target.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct TraceRecord {
    /// The branch that was reached.
    pub location: LocationId,

    /// The direction that was taken at the branch.
    pub direction: Direction,

    /// The size of the input that produced the trace.
    pub input_bytes: u32,

    /// The objective value observed at the branch.
    pub objective_value: f64,

    /// The identifier that the instrumented target assigned to the branch
    /// occurrence.
    pub guid: Guid,
}

impl TraceRecord {
    /// Constructs a new trace record.
    #[must_use]
    pub fn new(
        location: impl Into<LocationId>,
        direction: impl Into<Direction>,
        input_bytes: u32,
        objective_value: f64,
        guid: Guid,
    ) -> Self {
        let location = location.into();
        let direction = direction.into();
        Self {
            location,
            direction,
            input_bytes,
            objective_value,
            guid,
        }
    }
}

/// How the execution that produced a trace came to an end.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Termination {
    #[default]
    Normal,
    Exceptional,
}

/// The ordered branch decisions of one execution of the target.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Trace {
    /// The number of the trace within its phase. Traces in a phase are
    /// replayed in ascending order of this number.
    pub id: u32,

    /// The branch decisions, in execution order.
    pub records: Vec<TraceRecord>,

    /// How the execution ended.
    pub termination: Termination,
}

impl Trace {
    /// Constructs a new trace numbered `id`.
    #[must_use]
    pub fn new(id: u32, records: Vec<TraceRecord>, termination: Termination) -> Self {
        Self {
            id,
            records,
            termination,
        }
    }

    /// Gets the number of branch decisions in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Checks if the trace recorded no branch decisions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
