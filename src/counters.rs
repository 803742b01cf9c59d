//! Per-worker counters: a fixed schema of non-negative integers, mergeable
//! by pointwise addition.
//!
//! Mirrors the field-list-plus-`add_to` shape of the original `FSOPCounters`
//! (see `original_source/fsop_counters.py`), generalized to the richer op
//! set named in the specification (readdir, random_discard, stale_fh
//! handling, dir_not_found).

use serde::{Deserialize, Serialize};

/// A fixed schema of non-negative integer counters for one worker.
///
/// Invariant (I1): fields on a live `Counters` never decrease. Invariant
/// (I2)/(I3): every operation increments exactly one success counter xor
/// exactly one error counter (see `fsop::dispatch`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    // --- operation-success counts ---
    pub created: u64,
    pub deleted: u64,
    pub softlinked: u64,
    pub hardlinked: u64,
    pub appended: u64,
    pub randomly_written: u64,
    pub read: u64,
    pub randomly_read: u64,
    pub renamed: u64,
    pub truncated: u64,
    pub remounted: u64,
    pub readdir: u64,
    pub randomly_discarded: u64,
    /// Whole-file overwrite (the `write` op, distinct from `append`).
    pub written: u64,

    // --- throughput ---
    pub read_requests: u64,
    pub read_bytes: u64,
    pub randread_requests: u64,
    pub randread_bytes: u64,
    pub write_requests: u64,
    pub write_bytes: u64,
    pub randwrite_requests: u64,
    pub randwrite_bytes: u64,
    pub randdiscard_requests: u64,
    pub randdiscard_bytes: u64,
    pub fsyncs: u64,
    pub fdatasyncs: u64,
    pub dirs_created: u64,

    // --- errors ---
    pub already_exists: u64,
    pub file_not_found: u64,
    pub no_dir_space: u64,
    pub no_inode_space: u64,
    pub no_space: u64,
    pub not_mounted: u64,
    pub could_not_mount: u64,
    pub could_not_unmount: u64,
    pub stale_fh: u64,
    pub dir_not_found: u64,

    /// Unclassified I/O errors (logged, not attributed to a specific
    /// errno-derived counter). Not part of the "exactly one counter per
    /// op" invariant; tracked by the worker loop per §4.4/§7.3.
    pub total_errors: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointwise addition; the only aggregation operation over counters
    /// (per §3). Used to roll worker counters into a per-host total and
    /// per-host totals into the cluster total.
    pub fn merge(&mut self, other: &Counters) {
        self.created += other.created;
        self.deleted += other.deleted;
        self.softlinked += other.softlinked;
        self.hardlinked += other.hardlinked;
        self.appended += other.appended;
        self.randomly_written += other.randomly_written;
        self.read += other.read;
        self.randomly_read += other.randomly_read;
        self.renamed += other.renamed;
        self.truncated += other.truncated;
        self.remounted += other.remounted;
        self.readdir += other.readdir;
        self.randomly_discarded += other.randomly_discarded;
        self.written += other.written;

        self.read_requests += other.read_requests;
        self.read_bytes += other.read_bytes;
        self.randread_requests += other.randread_requests;
        self.randread_bytes += other.randread_bytes;
        self.write_requests += other.write_requests;
        self.write_bytes += other.write_bytes;
        self.randwrite_requests += other.randwrite_requests;
        self.randwrite_bytes += other.randwrite_bytes;
        self.randdiscard_requests += other.randdiscard_requests;
        self.randdiscard_bytes += other.randdiscard_bytes;
        self.fsyncs += other.fsyncs;
        self.fdatasyncs += other.fdatasyncs;
        self.dirs_created += other.dirs_created;

        self.already_exists += other.already_exists;
        self.file_not_found += other.file_not_found;
        self.no_dir_space += other.no_dir_space;
        self.no_inode_space += other.no_inode_space;
        self.no_space += other.no_space;
        self.not_mounted += other.not_mounted;
        self.could_not_mount += other.could_not_mount;
        self.could_not_unmount += other.could_not_unmount;
        self.stale_fh += other.stale_fh;
        self.dir_not_found += other.dir_not_found;

        self.total_errors += other.total_errors;
    }

    /// Total file-level operations performed (success counters only).
    pub fn total_files(&self) -> u64 {
        self.created
            + self.deleted
            + self.softlinked
            + self.hardlinked
            + self.truncated
            + self.appended
            + self.written
            + self.randomly_written
            + self.read
            + self.randomly_read
    }

    /// Total IO requests across all read/write/discard families.
    pub fn total_ios(&self) -> u64 {
        self.read_requests + self.randread_requests + self.write_requests + self.randwrite_requests
    }

    /// Total bytes transferred.
    ///
    /// Several original variants compute this as
    /// `read_bytes + read_bytes + randwrite_bytes + write_bytes` (read
    /// counted twice, randread omitted). Per §9 this is treated as a bug;
    /// we sum each throughput family exactly once.
    pub fn total_bytes(&self) -> u64 {
        self.read_bytes + self.randread_bytes + self.write_bytes + self.randwrite_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_pointwise_addition() {
        let mut a = Counters::new();
        a.created = 3;
        a.read_bytes = 100;
        let mut b = Counters::new();
        b.created = 2;
        b.read_bytes = 50;
        b.file_not_found = 1;

        a.merge(&b);
        assert_eq!(a.created, 5);
        assert_eq!(a.read_bytes, 150);
        assert_eq!(a.file_not_found, 1);
    }

    #[test]
    fn total_bytes_does_not_double_count_reads() {
        let mut c = Counters::new();
        c.read_bytes = 10;
        c.randread_bytes = 20;
        c.write_bytes = 30;
        c.randwrite_bytes = 40;
        assert_eq!(c.total_bytes(), 100);
    }

    #[test]
    fn merge_is_associative_and_commutative_enough_for_three_workers() {
        let mut w1 = Counters::new();
        w1.created = 1;
        let mut w2 = Counters::new();
        w2.created = 2;
        let mut w3 = Counters::new();
        w3.created = 3;

        let mut host = Counters::new();
        host.merge(&w1);
        host.merge(&w2);
        host.merge(&w3);
        assert_eq!(host.created, 6);
    }
}
