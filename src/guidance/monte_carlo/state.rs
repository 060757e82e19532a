//! This module contains the state tracking functionality for the Monte Carlo
//! engine.

use std::fmt::Debug;

use crate::{guidance::monte_carlo::statistics::Statistics, tree::location::SignedId};

/// A marker trait that says that the type implementing it is a Monte Carlo
/// engine state.
///
/// States can be transitioned between as part of the
/// [`crate::guidance::monte_carlo::MonteCarlo`] state machine, and are intended
/// to enforce that statistics are only queried once they have been computed.
pub trait State
where
    Self: Debug + Sized,
{
}

/// The initial state for the engine, with no target selected.
#[derive(Debug)]
pub struct Empty;
impl State for Empty {}

/// The engine has a target but has not yet read the tree.
#[derive(Debug)]
pub struct Targeted {
    /// The branch that guidance is being computed for.
    pub target: SignedId,
}
impl State for Targeted {}

/// The engine has derived its statistics and fits from the tree, and is ready
/// to select nodes.
#[derive(Debug)]
pub struct Computed {
    pub statistics: Statistics,
}
impl State for Computed {}
