//! Configuration: the immutable parameter set consumed by every other
//! component (§3, §6).
//!
//! CLI/YAML parsing is an external-collaborator concern per the
//! specification; this module still owns the `Parameters` struct itself
//! (the data model), plus thin loaders in the teacher's `config::cli` /
//! `config::toml` style.

pub mod cli;
pub mod validator;
pub mod yaml;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Random access distribution for the filename generator (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessDistribution {
    #[default]
    Uniform,
    Gaussian,
}

/// `record_size`: either a fixed scalar or a `[lo, hi]` range, both in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordSize {
    Scalar(u64),
    Range(u64, u64),
}

impl RecordSize {
    /// Resolve to an inclusive `(lo, hi)` byte range.
    pub fn range(&self) -> (u64, u64) {
        match *self {
            RecordSize::Scalar(v) => (1, v.max(1)),
            RecordSize::Range(lo, hi) => (lo.max(1), hi.max(lo.max(1))),
        }
    }
}

impl Default for RecordSize {
    fn default() -> Self {
        RecordSize::Scalar(64 * 1024)
    }
}

/// Immutable run configuration (§3 "Parameters", §6 option table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    /// Root directory of the tree. Must exist; length >= 6 (§6).
    pub top: PathBuf,
    /// Comma list of hostnames; empty = local-only.
    #[serde(default)]
    pub host_set: Vec<String>,
    /// Workers per host.
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Run duration in seconds.
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Opcode weight table path (CSV of `opname,weight`).
    pub workload_table: PathBuf,

    // --- file-tree shape ---
    #[serde(default = "default_levels")]
    pub levels: usize,
    #[serde(default = "default_dirs_per_level")]
    pub dirs_per_level: u64,
    #[serde(default = "default_max_files")]
    pub max_files: u64,

    // --- size knobs ---
    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u64,
    #[serde(default)]
    pub record_size: RecordSize,
    /// Legacy knob; when set, takes precedence over `record_size` and is
    /// promoted to `(1, max_record_size_kb * 1024)` (§9).
    pub max_record_size_kb: Option<u64>,

    // --- random-IO caps ---
    #[serde(default = "default_max_random_reads")]
    pub max_random_reads: usize,
    #[serde(default = "default_max_random_writes")]
    pub max_random_writes: usize,

    // --- sync knobs ---
    #[serde(default)]
    pub fsync_pct: u8,
    #[serde(default)]
    pub fdatasync_pct: u8,

    // --- access distribution ---
    #[serde(default)]
    pub random_distribution: AccessDistribution,
    #[serde(default = "default_mean_velocity")]
    pub mean_index_velocity: f64,
    #[serde(default = "default_gaussian_stddev")]
    pub gaussian_stddev: f64,
    #[serde(default = "default_stddevs_ahead")]
    pub create_stddevs_ahead: f64,
    /// -1 means simulated time advances every `gen_random_fn` call (§4.2).
    #[serde(default = "default_drift_time")]
    pub drift_time: i64,

    // --- data shape ---
    #[serde(default)]
    pub incompressible: bool,
    #[serde(default)]
    pub compress_ratio: f64,
    #[serde(default)]
    pub dedupe_pct: u8,
    #[serde(default)]
    pub direct_io: bool,
    #[serde(default)]
    pub raw_device: bool,

    // --- pacing ---
    #[serde(default)]
    pub pause_between_ops_us: u64,
    #[serde(default)]
    pub stats_report_interval_secs: u64,

    // --- safety ---
    #[serde(default = "default_fullness_limit")]
    pub fullness_limit_pct: u8,
    #[serde(default)]
    pub tolerate_stale_fh: bool,
    pub mount_command: Option<String>,
    pub unmount_command: Option<String>,
    /// Privileged and unsafe (§9); the event generator refuses a workload
    /// table that weights `remount` unless this is true.
    #[serde(default)]
    pub allow_remount: bool,

    // --- verbosity / output ---
    #[serde(default)]
    pub verbosity: u32,
    #[serde(default)]
    pub response_times: bool,
    pub output_json: Option<PathBuf>,
}

fn default_threads() -> usize {
    1
}
fn default_duration() -> u64 {
    60
}
fn default_levels() -> usize {
    1
}
fn default_dirs_per_level() -> u64 {
    4
}
fn default_max_files() -> u64 {
    1000
}
fn default_max_file_size_kb() -> u64 {
    1024
}
fn default_max_random_reads() -> usize {
    4
}
fn default_max_random_writes() -> usize {
    4
}
fn default_mean_velocity() -> f64 {
    1.0
}
fn default_gaussian_stddev() -> f64 {
    100.0
}
fn default_stddevs_ahead() -> f64 {
    3.0
}
fn default_drift_time() -> i64 {
    -1
}
fn default_fullness_limit() -> u8 {
    90
}

impl Parameters {
    /// `<top>/network-shared`, the rendezvous directory (§3).
    pub fn network_shared_dir(&self) -> PathBuf {
        self.top.join("network-shared")
    }

    /// Resolve the effective record size range in bytes, honoring the
    /// `max_record_size_kb` legacy precedence and (if `direct_io`) 4 KiB
    /// alignment (§9, §4.3).
    pub fn record_size_range(&self) -> (u64, u64) {
        let (mut lo, mut hi) = match self.max_record_size_kb {
            Some(kb) => (1, kb * 1024),
            None => self.record_size.range(),
        };
        if self.direct_io {
            const ALIGN: u64 = 4096;
            lo = align_up(lo.max(ALIGN), ALIGN);
            hi = align_up(hi.max(ALIGN), ALIGN);
        }
        (lo, hi.max(lo))
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        let bytes = self.max_file_size_kb * 1024;
        if self.direct_io {
            align_down(bytes.max(4096), 4096)
        } else {
            bytes
        }
    }
}

fn align_up(v: u64, align: u64) -> u64 {
    v.div_ceil(align) * align
}

fn align_down(v: u64, align: u64) -> u64 {
    v / align * align
}

#[cfg(test)]
impl Parameters {
    /// A minimal, valid parameter set for use by other modules' tests.
    pub fn sample(top: &Path) -> Parameters {
        Parameters {
            top: top.to_path_buf(),
            host_set: vec![],
            threads: 1,
            duration_secs: 1,
            workload_table: top.join("weights.csv"),
            levels: 1,
            dirs_per_level: 4,
            max_files: 100,
            max_file_size_kb: 64,
            record_size: RecordSize::default(),
            max_record_size_kb: None,
            max_random_reads: 4,
            max_random_writes: 4,
            fsync_pct: 0,
            fdatasync_pct: 0,
            random_distribution: AccessDistribution::Uniform,
            mean_index_velocity: 1.0,
            gaussian_stddev: 10.0,
            create_stddevs_ahead: 3.0,
            drift_time: -1,
            incompressible: false,
            compress_ratio: 1.0,
            dedupe_pct: 0,
            direct_io: false,
            raw_device: false,
            pause_between_ops_us: 0,
            stats_report_interval_secs: 0,
            fullness_limit_pct: 90,
            tolerate_stale_fh: false,
            mount_command: None,
            unmount_command: None,
            allow_remount: false,
            verbosity: 0,
            response_times: false,
            output_json: None,
        }
    }
}

/// Load parameters from a YAML file at `path` (§6: "Either command-line
/// flags or a YAML file naming the same keys").
pub fn load_yaml(path: &Path) -> crate::Result<Parameters> {
    yaml::parse_yaml_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_size_scalar_becomes_one_to_n_range() {
        let rs = RecordSize::Scalar(4096);
        assert_eq!(rs.range(), (1, 4096));
    }

    #[test]
    fn record_size_range_passthrough() {
        let rs = RecordSize::Range(512, 2048);
        assert_eq!(rs.range(), (512, 2048));
    }

    #[test]
    fn max_record_size_kb_takes_precedence() {
        let mut p = Parameters::sample(Path::new("/tmp/fsdrift-test"));
        p.record_size = RecordSize::Range(1, 100);
        p.max_record_size_kb = Some(8);
        assert_eq!(p.record_size_range(), (1, 8192));
    }

    #[test]
    fn direct_io_aligns_record_size_to_4k() {
        let mut p = Parameters::sample(Path::new("/tmp/fsdrift-test"));
        p.direct_io = true;
        p.record_size = RecordSize::Range(100, 5000);
        let (lo, hi) = p.record_size_range();
        assert_eq!(lo % 4096, 0);
        assert_eq!(hi % 4096, 0);
        assert!(lo >= 4096);
    }
}
