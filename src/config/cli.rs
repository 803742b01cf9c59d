//! Minimal CLI argument parsing, in the teacher's `clap::Parser` derive
//! style. The full flag surface (§6 lists the options this covers) is an
//! external-collaborator concern; this is the thin entry point used by
//! `main.rs` and integration tests, not a faithful reproduction of the
//! original tool's entire option set.

use super::{AccessDistribution, Parameters, RecordSize};
use clap::Parser;
use std::path::PathBuf;

/// fs-drift-rs - distributed filesystem aging and stress workload generator
#[derive(Parser, Debug)]
#[command(name = "fs-drift-rs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Root directory of the tree to age (must already exist)
    #[arg(long)]
    pub top: PathBuf,

    /// CSV file of `opname,weight` records
    #[arg(long)]
    pub workload_table: PathBuf,

    /// Comma-separated list of hostnames (empty = local-only)
    #[arg(long, default_value = "")]
    pub host_set: String,

    /// Worker threads per host
    #[arg(short = 't', long, default_value_t = 1)]
    pub threads: usize,

    /// Run duration in seconds
    #[arg(short = 'd', long, default_value_t = 60)]
    pub duration: u64,

    /// Directory tree depth
    #[arg(long, default_value_t = 1)]
    pub levels: usize,

    /// Subdirectories per directory level
    #[arg(long, default_value_t = 4)]
    pub dirs_per_level: u64,

    /// Maximum number of files in the tree
    #[arg(long, default_value_t = 1000)]
    pub max_files: u64,

    /// Maximum created-file size in KiB
    #[arg(long, default_value_t = 1024)]
    pub max_file_size_kb: u64,

    /// Random access distribution
    #[arg(long, value_enum, default_value = "uniform")]
    pub random_distribution: CliDistribution,

    /// Gaussian standard deviation (file-index units)
    #[arg(long, default_value_t = 100.0)]
    pub gaussian_stddev: f64,

    /// Mean index velocity (files / simulated tick) for Gaussian mode
    #[arg(long, default_value_t = 1.0)]
    pub mean_index_velocity: f64,

    /// Percent chance of fsync after a write-family op
    #[arg(long, default_value_t = 0)]
    pub fsync_pct: u8,

    /// Percent chance of fdatasync after a write-family op
    #[arg(long, default_value_t = 0)]
    pub fdatasync_pct: u8,

    /// Inhibit space-consuming ops above this filesystem-fullness percent
    #[arg(long, default_value_t = 90)]
    pub fullness_limit_pct: u8,

    /// Map ESTALE to a counter instead of a hard failure
    #[arg(long)]
    pub tolerate_stale_fh: bool,

    /// Microseconds to sleep between operations
    #[arg(long, default_value_t = 0)]
    pub pause_between_ops_us: u64,

    /// Seconds between counter snapshots (0 disables)
    #[arg(long, default_value_t = 0)]
    pub stats_report_interval: u64,

    /// Record a per-operation response-time CSV
    #[arg(long)]
    pub response_times: bool,

    /// Bypass the page cache (O_DIRECT) / operate on a raw block device
    #[arg(long)]
    pub direct_io: bool,

    /// Allow the privileged `remount` operation if weighted
    #[arg(long)]
    pub allow_remount: bool,

    /// Verbosity bitmask (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0", value_parser = parse_verbosity)]
    pub verbosity: u32,

    /// Path to write the final cluster result JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Load full configuration from a YAML file instead (overrides most
    /// other flags with the file's values)
    #[arg(long)]
    pub config_file: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum CliDistribution {
    Uniform,
    Gaussian,
}

fn parse_verbosity(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())
    }
}

impl Cli {
    /// Build a `Parameters` from CLI flags, or from `config_file` if given.
    pub fn into_parameters(self) -> crate::Result<Parameters> {
        if let Some(path) = &self.config_file {
            return super::load_yaml(path);
        }

        let host_set = self
            .host_set
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(Parameters {
            top: self.top,
            host_set,
            threads: self.threads,
            duration_secs: self.duration,
            workload_table: self.workload_table,
            levels: self.levels,
            dirs_per_level: self.dirs_per_level,
            max_files: self.max_files,
            max_file_size_kb: self.max_file_size_kb,
            record_size: RecordSize::default(),
            max_record_size_kb: None,
            max_random_reads: 4,
            max_random_writes: 4,
            fsync_pct: self.fsync_pct,
            fdatasync_pct: self.fdatasync_pct,
            random_distribution: match self.random_distribution {
                CliDistribution::Uniform => AccessDistribution::Uniform,
                CliDistribution::Gaussian => AccessDistribution::Gaussian,
            },
            mean_index_velocity: self.mean_index_velocity,
            gaussian_stddev: self.gaussian_stddev,
            create_stddevs_ahead: 3.0,
            drift_time: -1,
            incompressible: false,
            compress_ratio: 1.0,
            dedupe_pct: 0,
            direct_io: self.direct_io,
            raw_device: false,
            pause_between_ops_us: self.pause_between_ops_us,
            stats_report_interval_secs: self.stats_report_interval,
            fullness_limit_pct: self.fullness_limit_pct,
            tolerate_stale_fh: self.tolerate_stale_fh,
            mount_command: None,
            unmount_command: None,
            allow_remount: self.allow_remount,
            verbosity: self.verbosity,
            response_times: self.response_times,
            output_json: self.output_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_verbosity() {
        assert_eq!(parse_verbosity("0x20").unwrap(), 0x20);
        assert_eq!(parse_verbosity("32").unwrap(), 32);
    }
}
