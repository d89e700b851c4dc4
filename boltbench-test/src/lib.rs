//! Test utilities for the benchmark server.
//!
//! This crate provides utilities to facilitate end-to-end testing of the server. See the modules
//! for all available utilities.

pub mod server;
pub mod tracing;
