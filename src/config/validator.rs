//! Parse-time configuration validation, in the teacher's `config::validator`
//! style: a single entry point that raises a typed fault (§7.1) before any
//! worker starts.

use super::Parameters;
use crate::error::FsDriftError;

/// Validate a fully-built `Parameters`. Called once by the driver before
/// any worker or coordinator thread is spawned.
pub fn validate(p: &Parameters) -> Result<(), FsDriftError> {
    let top = p.top.to_string_lossy();
    if top.len() < 6 {
        return Err(FsDriftError::Configuration(format!(
            "top directory path '{}' is too short (minimum 6 characters, to avoid accidentally pointing at a system path)",
            top
        )));
    }
    if !p.top.is_dir() {
        return Err(FsDriftError::Configuration(format!(
            "top directory '{}' does not exist",
            top
        )));
    }

    if p.threads == 0 {
        return Err(FsDriftError::Configuration("threads must be >= 1".into()));
    }

    if p.levels > 0 && p.dirs_per_level == 0 {
        return Err(FsDriftError::Configuration(
            "dirs_per_level must be >= 1 when levels > 0".into(),
        ));
    }

    // Redesigned per §9: reject rather than silently starving fdatasync.
    if (p.fsync_pct as u16) + (p.fdatasync_pct as u16) > 100 {
        return Err(FsDriftError::Configuration(format!(
            "fsync_pct ({}) + fdatasync_pct ({}) exceeds 100",
            p.fsync_pct, p.fdatasync_pct
        )));
    }

    if p.fullness_limit_pct > 100 {
        return Err(FsDriftError::Configuration(
            "fullness_limit_pct must be <= 100".into(),
        ));
    }

    if !p.workload_table.is_file() {
        return Err(FsDriftError::Configuration(format!(
            "workload table '{}' does not exist",
            p.workload_table.display()
        )));
    }

    if p.allow_remount && (p.mount_command.is_none() || p.unmount_command.is_none()) {
        return Err(FsDriftError::Configuration(
            "allow_remount requires both mount_command and unmount_command".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn rejects_short_top_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Parameters::sample(dir.path());
        p.top = std::path::PathBuf::from("/x");
        fs::write(&p.workload_table, "create,1\n").unwrap();
        assert!(validate(&p).is_err());
    }

    #[test]
    fn rejects_fsync_pct_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Parameters::sample(dir.path());
        fs::write(&p.workload_table, "create,1\n").unwrap();
        p.fsync_pct = 60;
        p.fdatasync_pct = 50;
        assert!(validate(&p).is_err());
    }

    #[test]
    fn accepts_valid_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let p = Parameters::sample(dir.path());
        fs::write(&p.workload_table, "create,1\n").unwrap();
        assert!(validate(&p).is_ok());
    }
}
