//! # IronTS Bench
//!
//! Schema fixtures for IronTS performance testing.

pub mod fixtures;
