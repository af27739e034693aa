//! Foundation utilities
//!
//! Math types and small helpers shared by every other module.

pub mod math;
