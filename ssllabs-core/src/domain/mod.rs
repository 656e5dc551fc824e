//! Core domain types
//!
//! These types describe an assessment job from the caller's point of view:
//! what was requested, which state the remote job is in, and the report it
//! produced once it finished.

pub mod assessment;
pub mod report;
