//! Integration test utilities for the Redis transport
//!
//! This crate provides helpers for running end-to-end tests against a live
//! Redis instance.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
