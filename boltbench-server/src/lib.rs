//! The benchmark server component.
//!
//! This builds on top of [`boltbench_perf`] and [`boltbench_service`], and exposes benchmarks,
//! content validation, the auto-heal check and single store operations as an `HTTP` API. The same
//! binary can run one benchmark directly from the command line.

pub mod cli;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod healthcheck;
pub mod observability;
pub mod state;
pub mod web;
