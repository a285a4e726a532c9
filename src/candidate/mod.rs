//! Candidate pruning utilities.
//!
//! Includes spatial non-maximum suppression over scored matches.

pub(crate) mod nms;
