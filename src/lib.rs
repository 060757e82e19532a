//! This library analyzes the execution traces recorded over a fuzzing campaign
//! in order to guide further input generation toward branches that have not
//! yet been covered.
//!
//! # How it Works
//!
//! From a very high level, the guidance process is performed as follows:
//!
//! 1. The traces recorded during each phase of the campaign are replayed into
//!    a [`tree::ExecutionTree`]. Every branch occurrence becomes a
//!    [`tree::node::Node`] whose attributes are versioned by phase, so the tree
//!    can be inspected as it was at the end of any earlier phase.
//! 2. The tree tracks which directions of each branch location have been
//!    covered, and so which locations are on the frontier of the campaign. A
//!    frontier id carries the sign of the covered direction.
//! 3. For a chosen frontier id, one of the guidance engines
//!    ([`guidance::monte_carlo::MonteCarlo`] or
//!    [`guidance::navigator::Navigator`]) collects the paths leading to that
//!    location and fits their shape against the objective value.
//! 4. The engine then descends the tree toward the shape extrapolated for a
//!    target objective value, producing a [`guidance::Recommendation`] naming
//!    the node and direction to exercise next.
//!
//! # Basic Usage
//!
//! ```
//! use trace_guidance::{
//!     guidance::monte_carlo::{self, Config},
//!     tree::{
//!         location::{LocationId, SignedId},
//!         trace::{Termination, Trace, TraceRecord},
//!         ExecutionTree,
//!     },
//! };
//!
//! let mut tree = ExecutionTree::new();
//! tree.replay(
//!     0,
//!     vec![Trace::new(
//!         0,
//!         vec![
//!             TraceRecord::new(1, true, 4, 3.0, 100),
//!             TraceRecord::new(2, false, 4, 3.0, 101),
//!         ],
//!         Termination::Normal,
//!     )],
//! )
//! .unwrap();
//!
//! // Only the left direction of location 2 has been taken, so its frontier id
//! // is negative and the engine aims for the right direction.
//! let frontier = tree.uncovered_signed_id(LocationId::new(2));
//! assert_eq!(frontier, SignedId::new(-2));
//!
//! let engine = monte_carlo::new(Config::default())
//!     .target(frontier)
//!     .unwrap()
//!     .compute(&tree);
//! let recommendation = engine.select_node_for_value(&tree, 3.0).unwrap();
//! assert_eq!(recommendation.guid, 101);
//! assert_eq!(recommendation.signed_id, frontier.sibling());
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod constant;
pub mod data;
pub mod error;
pub mod guidance;
pub mod tree;

// Re-exports to provide the library interface.
pub use error::{Error, Result};
pub use guidance::Recommendation;
pub use tree::ExecutionTree;
