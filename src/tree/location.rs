//! This module contains the value types used to identify branches and the
//! directions taken at them.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The identifier of a branch point in the instrumented target.
///
/// Valid identifiers are strictly positive, as the sign is used to encode the
/// direction in a [`SignedId`].
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct LocationId(i32);

impl LocationId {
    /// Constructs a new location identifier from the raw `id`.
    #[must_use]
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Gets the raw identifier.
    #[must_use]
    pub fn id(self) -> i32 {
        self.0
    }

    /// Checks that the identifier can be encoded into a [`SignedId`].
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }

    /// Gets the signed identifier for taking `direction` at this location.
    #[must_use]
    pub fn signed(self, direction: Direction) -> SignedId {
        match direction {
            Direction::Left => SignedId(-self.0),
            Direction::Right => SignedId(self.0),
        }
    }
}

impl From<i32> for LocationId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Display for LocationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the two outcomes of a branch.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Direction {
    /// Direction `0`, the branch was not taken.
    Left,

    /// Direction `1`, the branch was taken.
    Right,
}

impl Direction {
    /// Both directions, in index order.
    pub const ALL: [Direction; 2] = [Direction::Left, Direction::Right];

    /// Gets the index of the direction (`0` for left, `1` for right).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
        }
    }

    /// Gets the direction for the provided `index`, treating anything non-zero
    /// as [`Direction::Right`].
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        if index == 0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    /// Gets the other direction at the same branch.
    #[must_use]
    pub fn sibling(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

impl From<bool> for Direction {
    fn from(value: bool) -> Self {
        if value {
            Direction::Right
        } else {
            Direction::Left
        }
    }
}

/// A location and direction packed into a single integer: negative values are
/// [`Direction::Left`], positive values are [`Direction::Right`].
///
/// `SignedId(0)` does not denote any branch. It is used as the "no unique
/// frontier" answer by coverage queries and as the key for aggregate
/// statistics in the guidance engines.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct SignedId(i32);

impl SignedId {
    /// The sentinel that does not correspond to any branch.
    pub const NONE: SignedId = SignedId(0);

    /// Constructs a signed identifier from its raw encoding.
    #[must_use]
    pub fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Gets the raw encoding.
    #[must_use]
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Checks whether this is the [`Self::NONE`] sentinel.
    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Gets the location that this identifier refers to.
    #[must_use]
    pub fn location(self) -> LocationId {
        LocationId(self.0.abs())
    }

    /// Gets the direction encoded by the sign, or [`None`] for the sentinel.
    #[must_use]
    pub fn direction(self) -> Option<Direction> {
        match self.0 {
            0 => None,
            x if x < 0 => Some(Direction::Left),
            _ => Some(Direction::Right),
        }
    }

    /// Gets the identifier for the other direction at the same location.
    #[must_use]
    pub fn sibling(self) -> Self {
        Self(-self.0)
    }
}

impl From<i32> for SignedId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Display for SignedId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
