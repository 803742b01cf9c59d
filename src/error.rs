//! Typed configuration/driver faults (§7.1).
//!
//! Classified I/O errors (§4.3, §7.2) are not part of this enum — they are
//! absorbed into `Counters` fields and never propagate as a `Result::Err`.
//! `FsDriftError` covers only the faults that keep workers from starting at
//! all: bad parameters, unparseable workload tables, and rendezvous
//! timeouts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsDriftError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("workload table error: {0}")]
    WorkloadTable(String),

    #[error("rendezvous timeout waiting for hosts: {0}")]
    RendezvousTimeout(String),

    #[error("aborted")]
    Aborted,
}
