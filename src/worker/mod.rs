//! Per-worker lifecycle (§4.4/§7.3): starting-gate rendezvous, the main
//! operation loop, periodic counter snapshots, and orderly termination.
//!
//! Grounded on `original_source/worker_thread.py::FsDriftWorkload` —
//! `wait_for_gate`, `do_workload`'s main `while True` loop (pause-file
//! check, stop-file check every 1000 events, response-time bracketing,
//! `end_test`/`thread_done_record`'s checkered-flag write) — restructured
//! around the teacher's worker-thread module shape.

use crate::config::Parameters;
use crate::counters::Counters;
use crate::event;
use crate::fsop::FSOpCtx;
use crate::result::{ThreadResult, Throughput};
use crate::shared_dir::{self, SharedPaths};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of operations between cheap periodic checks (stop file, pause
/// file, fullness refresh) — avoids a `stat` call on every single op
/// (§4.4, `files_between_checks` in the original).
const CHECK_INTERVAL: u64 = 1000;

const GATE_POLL: Duration = Duration::from_millis(300);
const PAUSE_FILE_POLL: Duration = Duration::from_secs(5);

pub struct Worker {
    pub id: usize,
    pub host: String,
    pub params: Arc<Parameters>,
    pub shared: SharedPaths,
}

impl Worker {
    pub fn new(id: usize, host: String, params: Arc<Parameters>) -> Self {
        let shared = SharedPaths::new(&params.network_shared_dir());
        Self {
            id,
            host,
            params,
            shared,
        }
    }

    /// Run the worker to completion and return its final status/counters
    /// (§6). Errors from unclassified I/O faults are logged and folded
    /// into `total_errors` rather than aborting the loop (§7.3); only a
    /// hard abort signal or a configuration problem returns `Err`.
    pub fn run(&self) -> Result<ThreadResult> {
        self.shared.ensure_exists()?;
        shared_dir::touch(&self.shared.thread_ready(&self.host, self.id))
            .context("failed to publish thread-ready sentinel")?;

        let abort_file = self.shared.abort_file();
        let gun = self.shared.starting_gun();
        let reached_gate = shared_dir::wait_for(&gun, GATE_POLL, || abort_file.exists());
        if !reached_gate {
            anyhow::bail!("worker {} on {} saw abort flag before the starting gun", self.id, self.host);
        }

        let weights = event::parse_weights(&self.params.workload_table)?;
        event::check_gates(&weights, self.params.allow_remount, self.params.raw_device)?;
        let normalized = event::normalize_weights(&weights);

        let checkpoint_path = matches!(
            self.params.random_distribution,
            crate::config::AccessDistribution::Gaussian
        )
        .then(|| self.shared.simtime_checkpoint(&self.host, self.id));
        let mut ctx = FSOpCtx::new(self.params.clone(), checkpoint_path)?;

        let mut counters = Counters::new();
        let mut rsptimes: Vec<(String, f64, f64)> = Vec::new();
        let start = Instant::now();
        let stop_file = self.shared.stop_file();
        let pause_file = self.shared.pause_file();
        let duration = Duration::from_secs(self.params.duration_secs);
        let mut event_count: u64 = 0;
        let mut last_stat = Instant::now();
        let mut snapshots = if self.params.stats_report_interval_secs > 0 {
            Some(shared_dir::SnapshotWriter::create(
                &self.shared.counters_file(self.id, &self.host),
            )?)
        } else {
            None
        };

        loop {
            if pause_file.exists() {
                std::thread::sleep(PAUSE_FILE_POLL);
                continue;
            }

            event_count += 1;
            if event_count.is_multiple_of(CHECK_INTERVAL) {
                if stop_file.exists() {
                    break;
                }
                ctx.refresh_fullness(&self.params.top).ok();
                if self.params.duration_secs > 0 && start.elapsed() >= duration {
                    break;
                }
            }

            let op = event::gen_event(&normalized, &mut ctx.rng);
            let op_start = self.params.response_times.then(Instant::now);

            if let Err(e) = ctx.execute(op, &mut counters) {
                if self.params.verbosity & 0x1 != 0 {
                    eprintln!("fs-drift-rs: worker {} host {}: {e:#}", self.id, self.host);
                }
            }

            if let Some(t0) = op_start {
                let elapsed = t0.elapsed().as_secs_f64();
                rsptimes.push((op.name().to_string(), t0.duration_since(start).as_secs_f64(), elapsed));
            }

            if let Some(writer) = snapshots.as_mut() {
                if last_stat.elapsed() >= Duration::from_secs(self.params.stats_report_interval_secs) {
                    writer.append(&serde_json::to_vec(&counters)?)?;
                    last_stat = Instant::now();
                }
            }

            if self.params.pause_between_ops_us > 0 {
                std::thread::sleep(Duration::from_micros(self.params.pause_between_ops_us));
            }

            if self.params.duration_secs > 0 && start.elapsed() >= duration {
                break;
            }
        }

        let elapsed_secs = start.elapsed().as_secs_f64();

        if let Some(writer) = snapshots {
            writer.close()?;
        }
        if self.params.response_times {
            self.save_rsptimes(&rsptimes)?;
        }
        self.append_checkered_flag(elapsed_secs)?;

        let status = if counters.total_errors == 0 { "OK" } else { "NOTOK" };
        Ok(ThreadResult {
            thread_id: self.id,
            status: status.to_string(),
            throughput: Throughput::compute(&counters, elapsed_secs),
            counters,
        })
    }

    fn save_rsptimes(&self, rsptimes: &[(String, f64, f64)]) -> Result<()> {
        let path = self.shared.rsptimes_file(&self.host, self.id);
        let mut f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        for (opname, offset, rsp) in rsptimes {
            writeln!(f, "{opname:>8}, {offset:9.6}, {rsp:9.6}")?;
        }
        f.sync_all().ok();
        Ok(())
    }

    /// Append a fixed-width "thread done" record to `checkered_flag.tmp`
    /// (§4.4); every record is the same length so the coordinator can
    /// count finished threads from the file's size alone.
    fn append_checkered_flag(&self, elapsed_secs: f64) -> Result<()> {
        let path = self.shared.checkered_flag();
        let record = format!("{elapsed_secs:012.6} {:>12} {:>60}\n", self.id, self.host);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        f.write_all(record.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn params_for(dir: &Path) -> Arc<Parameters> {
        let mut p = Parameters::sample(dir);
        p.duration_secs = 1;
        Arc::new(p)
    }

    #[test]
    fn worker_runs_to_completion_against_starting_gun() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_for(dir.path());
        fs::write(&params.workload_table, "create,1\ndelete,1\n").unwrap();

        let worker = Worker::new(0, "local".to_string(), params.clone());
        worker.shared.ensure_exists().unwrap();
        shared_dir::touch(&worker.shared.root().join("starting-gun.tmp")).unwrap();

        let report = worker.run().unwrap();
        assert_eq!(report.status, "OK");
        assert!(report.counters.created > 0 || report.counters.deleted > 0);
    }

    #[test]
    fn worker_stops_immediately_on_stop_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Parameters::sample(dir.path());
        p.duration_secs = 3600;
        let params = Arc::new(p);
        fs::write(&params.workload_table, "create,1\n").unwrap();

        let worker = Worker::new(0, "local".to_string(), params.clone());
        worker.shared.ensure_exists().unwrap();
        shared_dir::touch(&worker.shared.starting_gun()).unwrap();
        shared_dir::touch(&worker.shared.stop_file()).unwrap();

        let start = Instant::now();
        let report = worker.run().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(report.status, "OK");
    }

    #[test]
    fn worker_errors_out_on_abort_before_gate() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_for(dir.path());
        fs::write(&params.workload_table, "create,1\n").unwrap();

        let worker = Worker::new(0, "local".to_string(), params.clone());
        worker.shared.ensure_exists().unwrap();
        shared_dir::touch(&worker.shared.abort_file()).unwrap();

        assert!(worker.run().is_err());
    }

    #[test]
    fn checkered_flag_is_appended_with_fixed_width_records() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_for(dir.path());
        fs::write(&params.workload_table, "create,1\n").unwrap();
        let worker = Worker::new(0, "local".to_string(), params.clone());
        worker.shared.ensure_exists().unwrap();
        shared_dir::touch(&worker.shared.starting_gun()).unwrap();

        worker.run().unwrap();
        let contents = fs::read_to_string(worker.shared.checkered_flag()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
    }
}
