//! Final result JSON (§6 "Final result JSON"): per-thread, per-host, and
//! cluster-level aggregation, with the single-host collapse rule.

use crate::counters::Counters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derived throughput figures computed once from a `Counters` and the
/// elapsed wall-clock time of the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Throughput {
    pub files: u64,
    pub ios: u64,
    #[serde(rename = "MiB")]
    pub mib: f64,
    #[serde(rename = "files-per-sec")]
    pub files_per_sec: f64,
    #[serde(rename = "IOPS")]
    pub iops: f64,
    #[serde(rename = "MiB-per-sec")]
    pub mib_per_sec: f64,
}

impl Throughput {
    pub fn compute(counters: &Counters, elapsed_secs: f64) -> Self {
        let elapsed = elapsed_secs.max(f64::EPSILON);
        let files = counters.total_files();
        let ios = counters.total_ios();
        let mib = counters.total_bytes() as f64 / (1024.0 * 1024.0);
        Throughput {
            files,
            ios,
            mib,
            files_per_sec: files as f64 / elapsed,
            iops: ios as f64 / elapsed,
            mib_per_sec: mib / elapsed,
        }
    }
}

/// One worker thread's contribution (§6: nested under `in-host.in-thread`,
/// or directly under `results` when there is exactly one host).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadResult {
    pub thread_id: usize,
    pub status: String,
    #[serde(flatten)]
    pub throughput: Throughput,
    #[serde(rename = "fsop-counters")]
    pub counters: Counters,
}

/// One host's aggregate across its worker threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostResult {
    #[serde(rename = "in-thread")]
    pub in_thread: Vec<ThreadResult>,
    #[serde(flatten)]
    pub throughput: Throughput,
    #[serde(rename = "fsop-counters")]
    pub counters: Counters,
}

impl HostResult {
    pub fn from_threads(threads: Vec<ThreadResult>, elapsed_secs: f64) -> Self {
        let mut total = Counters::new();
        for t in &threads {
            total.merge(&t.counters);
        }
        HostResult {
            throughput: Throughput::compute(&total, elapsed_secs),
            counters: total,
            in_thread: threads,
        }
    }
}

/// The cluster-wide result (§6). When `host_set` has exactly one host (or
/// is empty, meaning local-only), the `in-host` layer is collapsed away
/// and `in_thread` is populated directly at this level instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResult {
    pub elapsed: f64,
    #[serde(flatten)]
    pub throughput: Throughput,
    #[serde(rename = "fsop-counters")]
    pub counters: Counters,
    pub start_time: String,
    pub date: String,
    #[serde(rename = "in-host", skip_serializing_if = "Option::is_none")]
    pub in_host: Option<BTreeMap<String, HostResult>>,
    #[serde(rename = "in-thread", skip_serializing_if = "Option::is_none")]
    pub in_thread: Option<Vec<ThreadResult>>,
}

impl ClusterResult {
    /// Build the cluster result from per-host thread results, collapsing
    /// the `in-host` layer away when there is only a single host (§6).
    pub fn aggregate(
        by_host: BTreeMap<String, Vec<ThreadResult>>,
        elapsed_secs: f64,
        start_time: String,
        date: String,
    ) -> Self {
        let mut total = Counters::new();
        for threads in by_host.values() {
            for t in threads {
                total.merge(&t.counters);
            }
        }
        let throughput = Throughput::compute(&total, elapsed_secs);

        if by_host.len() <= 1 {
            let in_thread = by_host.into_values().next().unwrap_or_default();
            ClusterResult {
                elapsed: elapsed_secs,
                throughput,
                counters: total,
                start_time,
                date,
                in_host: None,
                in_thread: Some(in_thread),
            }
        } else {
            let in_host = by_host
                .into_iter()
                .map(|(host, threads)| (host, HostResult::from_threads(threads, elapsed_secs)))
                .collect();
            ClusterResult {
                elapsed: elapsed_secs,
                throughput,
                counters: total,
                start_time,
                date,
                in_host: Some(in_host),
                in_thread: None,
            }
        }
    }

    /// Exit code per §6: 0 if every thread reported `OK`, 1 otherwise.
    pub fn all_ok(&self) -> bool {
        let threads: Vec<&ThreadResult> = match (&self.in_host, &self.in_thread) {
            (Some(hosts), _) => hosts.values().flat_map(|h| h.in_thread.iter()).collect(),
            (None, Some(t)) => t.iter().collect(),
            (None, None) => vec![],
        };
        !threads.is_empty() && threads.iter().all(|t| t.status == "OK")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(id: usize, status: &str, created: u64) -> ThreadResult {
        let mut counters = Counters::new();
        counters.created = created;
        ThreadResult {
            thread_id: id,
            status: status.to_string(),
            throughput: Throughput::compute(&counters, 1.0),
            counters,
        }
    }

    #[test]
    fn single_host_collapses_in_host_layer() {
        let mut by_host = BTreeMap::new();
        by_host.insert("local".to_string(), vec![thread(0, "OK", 5)]);
        let result = ClusterResult::aggregate(by_host, 1.0, "t0".into(), "d0".into());
        assert!(result.in_host.is_none());
        assert!(result.in_thread.is_some());
        assert_eq!(result.counters.created, 5);
    }

    #[test]
    fn multi_host_keeps_in_host_layer() {
        let mut by_host = BTreeMap::new();
        by_host.insert("host-a".to_string(), vec![thread(0, "OK", 3)]);
        by_host.insert("host-b".to_string(), vec![thread(0, "OK", 4)]);
        let result = ClusterResult::aggregate(by_host, 1.0, "t0".into(), "d0".into());
        assert!(result.in_host.is_some());
        assert!(result.in_thread.is_none());
        assert_eq!(result.counters.created, 7);
    }

    #[test]
    fn all_ok_is_false_if_any_thread_failed() {
        let mut by_host = BTreeMap::new();
        by_host.insert("local".to_string(), vec![thread(0, "OK", 1), thread(1, "NOTOK", 0)]);
        let result = ClusterResult::aggregate(by_host, 1.0, "t0".into(), "d0".into());
        assert!(!result.all_ok());
    }

    #[test]
    fn all_ok_is_true_when_every_thread_ok() {
        let mut by_host = BTreeMap::new();
        by_host.insert("local".to_string(), vec![thread(0, "OK", 1), thread(1, "OK", 0)]);
        let result = ClusterResult::aggregate(by_host, 1.0, "t0".into(), "d0".into());
        assert!(result.all_ok());
    }

    #[test]
    fn throughput_divides_by_elapsed_seconds() {
        let mut counters = Counters::new();
        counters.created = 100;
        let t = Throughput::compute(&counters, 10.0);
        assert_eq!(t.files_per_sec, 10.0);
    }
}
