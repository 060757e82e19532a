//! This module contains custom data structures used in the implementation of
//! the execution tree.

pub mod timeline;
