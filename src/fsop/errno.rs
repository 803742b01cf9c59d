//! Errno → counter classification (§4.3 "Errno classification").

use crate::counters::Counters;

/// Which counter family an operation's errno maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrClass {
    FileNotFound,
    DirNotFound,
    AlreadyExists,
    NoDirSpace,
    NoInodeSpace,
    NoSpace,
    StaleFh,
    /// Not classified: the caller should log with context and count it as
    /// a hard failure (`total_errors`), per §7.3.
    Unclassified,
}

/// Operation context needed to disambiguate errno meaning (e.g. `ENOSPC`
/// means something different on a directory create vs. a file open vs. a
/// write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStage {
    DirCreate,
    FileOpenCreate,
    Write,
    Other,
}

/// Classify a raw `errno` value for the given operation stage. `ESTALE`
/// only resolves to the lenient `StaleFh` counter when `tolerate_stale_fh`
/// is set (§4.3: "ESTALE and `tolerate_stale_fh` -> `stale_fh`"); otherwise
/// it is an unclassified hard failure, same as any other unmapped errno.
pub fn classify(errno: i32, stage: OpStage, is_readdir: bool, tolerate_stale_fh: bool) -> ErrClass {
    match errno {
        libc::ENOENT => {
            if is_readdir {
                ErrClass::DirNotFound
            } else {
                ErrClass::FileNotFound
            }
        }
        libc::EEXIST => ErrClass::AlreadyExists,
        libc::ENOSPC => match stage {
            OpStage::DirCreate => ErrClass::NoDirSpace,
            OpStage::FileOpenCreate => ErrClass::NoInodeSpace,
            OpStage::Write => ErrClass::NoSpace,
            OpStage::Other => ErrClass::NoSpace,
        },
        libc::EDQUOT if stage == OpStage::Write => ErrClass::NoSpace,
        libc::ESTALE if tolerate_stale_fh => ErrClass::StaleFh,
        _ => ErrClass::Unclassified,
    }
}

/// Apply a classified error to the counters it owns (I3: exactly one error
/// counter increases). Returns `false` for `ErrClass::Unclassified` so the
/// caller can additionally log context and bump `total_errors`.
pub fn record(counters: &mut Counters, class: ErrClass) -> bool {
    match class {
        ErrClass::FileNotFound => counters.file_not_found += 1,
        ErrClass::DirNotFound => counters.dir_not_found += 1,
        ErrClass::AlreadyExists => counters.already_exists += 1,
        ErrClass::NoDirSpace => counters.no_dir_space += 1,
        ErrClass::NoInodeSpace => counters.no_inode_space += 1,
        ErrClass::NoSpace => counters.no_space += 1,
        ErrClass::StaleFh => counters.stale_fh += 1,
        ErrClass::Unclassified => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enoent_on_readdir_is_dir_not_found() {
        assert_eq!(
            classify(libc::ENOENT, OpStage::Other, true, false),
            ErrClass::DirNotFound
        );
    }

    #[test]
    fn enoent_elsewhere_is_file_not_found() {
        assert_eq!(
            classify(libc::ENOENT, OpStage::Other, false, false),
            ErrClass::FileNotFound
        );
    }

    #[test]
    fn enospc_depends_on_stage() {
        assert_eq!(
            classify(libc::ENOSPC, OpStage::DirCreate, false, false),
            ErrClass::NoDirSpace
        );
        assert_eq!(
            classify(libc::ENOSPC, OpStage::FileOpenCreate, false, false),
            ErrClass::NoInodeSpace
        );
        assert_eq!(
            classify(libc::ENOSPC, OpStage::Write, false, false),
            ErrClass::NoSpace
        );
    }

    #[test]
    fn estale_is_stale_fh_only_when_tolerated() {
        assert_eq!(
            classify(libc::ESTALE, OpStage::Other, false, true),
            ErrClass::StaleFh
        );
        assert_eq!(
            classify(libc::ESTALE, OpStage::Other, false, false),
            ErrClass::Unclassified
        );
    }

    #[test]
    fn unclassified_errno_is_not_recorded() {
        let mut c = Counters::new();
        assert!(!record(&mut c, ErrClass::Unclassified));
        assert_eq!(c.total_errors, 0);
    }

    #[test]
    fn classified_errno_increments_exactly_one_counter() {
        let mut c = Counters::new();
        assert!(record(&mut c, ErrClass::AlreadyExists));
        assert_eq!(c.already_exists, 1);
        assert_eq!(c.file_not_found, 0);
    }
}
