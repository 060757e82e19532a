//! This module contains the statistical guidance engines, which read the
//! execution tree and recommend the frontier node and direction that the
//! fuzzer should target next.
//!
//! Both engines share the same outline. They collect the root-to-node paths
//! leading to the target's location, fit each path's shape against the
//! objective value reached at its end, and then descend the tree greedily
//! toward the shape extrapolated for a chosen objective value.

pub mod descent;
pub mod fit;
pub mod monte_carlo;
pub mod navigator;
pub mod path;

pub use descent::Recommendation;
