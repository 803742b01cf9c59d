//! fs-drift-rs - distributed filesystem aging and stress workload generator
//!
//! fs-drift-rs drives a target POSIX filesystem (or raw block device) through a
//! user-specified mixture of file operations at a user-chosen intensity for a
//! user-chosen duration, aging it toward a realistic steady state before
//! subsequent performance experiments run against it.
//!
//! # Architecture
//!
//! - **Event generator**: weighted random selection of an operation code
//! - **Filename generator**: uniform or time-drifting Gaussian file index model
//! - **FSOp**: the eleven filesystem operation contracts and their counters
//! - **Worker**: per-thread lifecycle (starting gate, main loop, termination)
//! - **Coordinator**: multi-host rendezvous over a shared directory

pub mod config;
pub mod coordinator;
pub mod counters;
pub mod distribution;
pub mod error;
pub mod event;
pub mod fsop;
pub mod paths;
pub mod result;
pub mod shared_dir;
pub mod worker;

pub use config::Parameters;
pub use counters::Counters;

/// Result type used throughout fs-drift-rs
pub type Result<T> = anyhow::Result<T>;
