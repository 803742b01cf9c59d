//! The eleven-to-fourteen filesystem operation implementations (§4.3).
//!
//! Grounded on `original_source/fsop.py` for the operation set and
//! errno-handling shape, and on the teacher's `engine::sync` raw-syscall
//! style (`libc::open`/`pread`/`pwrite`) for how a single operation talks
//! to the kernel and turns a negative return into a classified counter
//! bump rather than an early `?`.

use super::errno::{classify, record, OpStage};
use super::{FSOpCtx, MountState, OpCode};
use crate::counters::Counters;
use anyhow::{anyhow, Result};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

fn cpath(p: &Path) -> Result<CString> {
    Ok(CString::new(p.as_os_str().as_bytes())?)
}

fn last_errno() -> i32 {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(libc::EIO)
}

/// Handle a failed syscall: absorb a classified errno into `counters` and
/// return `Ok(())`, or surface an unclassified one as `Err` with context
/// for the worker loop to log (§7.3).
fn absorb(
    counters: &mut Counters,
    op: &str,
    path: &Path,
    stage: OpStage,
    is_readdir: bool,
    tolerate_stale_fh: bool,
) -> Result<()> {
    let errno = last_errno();
    let class = classify(errno, stage, is_readdir, tolerate_stale_fh);
    if record(counters, class) {
        Ok(())
    } else {
        counters.total_errors += 1;
        Err(anyhow!(
            "{op} on {} failed with unclassified errno {errno}",
            path.display()
        ))
    }
}

/// `mkdir -p` the parent directories of a leaf path, relative to `top`.
/// `EEXIST` on an intermediate directory is not an error.
///
/// Returns `Ok(true)` when the caller should proceed with its own
/// operation, `Ok(false)` when a directory-create failure already
/// recorded a classified counter and the caller must stop without
/// recording a second one for the same op (I3).
fn ensure_parents(
    top: &Path,
    rel: &Path,
    counters: &mut Counters,
    tolerate_stale_fh: bool,
) -> Result<bool> {
    let mut dir = top.to_path_buf();
    let parent = rel.parent().unwrap_or_else(|| Path::new(""));
    for component in parent.components() {
        dir.push(component);
        let c = cpath(&dir)?;
        let rc = unsafe { libc::mkdir(c.as_ptr(), 0o755) };
        if rc != 0 {
            let errno = last_errno();
            if errno == libc::EEXIST {
                continue;
            }
            let class = classify(errno, OpStage::DirCreate, false, tolerate_stale_fh);
            if !record(counters, class) {
                counters.total_errors += 1;
                return Err(anyhow!("mkdir {} failed with errno {errno}", dir.display()));
            }
            return Ok(false);
        }
        counters.dirs_created += 1;
    }
    Ok(true)
}

fn open_raw(path: &Path, flags: i32, mode: libc::mode_t) -> Result<i32, i32> {
    let c = CString::new(path.as_os_str().as_bytes()).map_err(|_| libc::EINVAL)?;
    let fd = unsafe { libc::open(c.as_ptr(), flags, mode) };
    if fd < 0 {
        Err(last_errno())
    } else {
        Ok(fd)
    }
}

fn fill_random(ctx: &mut FSOpCtx, len: usize) -> &[u8] {
    if ctx.buf.len() < len {
        ctx.buf.resize(len, 0);
    }
    use rand::RngCore;
    if !ctx.params.incompressible {
        for b in ctx.buf[..len].iter_mut() {
            *b = 0;
        }
    } else {
        ctx.rng.fill_bytes(&mut ctx.buf[..len]);
    }
    &ctx.buf[..len]
}

fn pwrite_all(fd: i32, buf: &[u8], offset: i64) -> Result<u64, i32> {
    let mut written: usize = 0;
    while written < buf.len() {
        let rc = unsafe {
            libc::pwrite(
                fd,
                buf[written..].as_ptr() as *const libc::c_void,
                buf.len() - written,
                offset + written as i64,
            )
        };
        if rc < 0 {
            return Err(std::io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO));
        }
        if rc == 0 {
            break;
        }
        written += rc as usize;
    }
    Ok(written as u64)
}

fn pread_all(fd: i32, buf: &mut [u8], offset: i64) -> Result<u64, i32> {
    let mut total: usize = 0;
    while total < buf.len() {
        let rc = unsafe {
            libc::pread(
                fd,
                buf[total..].as_mut_ptr() as *mut libc::c_void,
                buf.len() - total,
                offset + total as i64,
            )
        };
        if rc < 0 {
            return Err(std::io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO));
        }
        if rc == 0 {
            break;
        }
        total += rc as usize;
    }
    Ok(total as u64)
}

fn file_size(fd: i32) -> Option<u64> {
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    if unsafe { libc::fstat(fd, &mut stat) } == 0 {
        Some(stat.st_size as u64)
    } else {
        None
    }
}

pub fn create(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    if ctx.fullness_gate(OpCode::Create) {
        counters.no_space += 1;
        return Ok(());
    }
    let rel = ctx.gen_path_for_create();
    if !ensure_parents(&ctx.params.top, &rel, counters, ctx.params.tolerate_stale_fh)? {
        return Ok(());
    }
    let full = ctx.params.top.join(&rel);

    let fd = match open_raw(&full, libc::O_CREAT | libc::O_EXCL | libc::O_WRONLY, 0o644) {
        Ok(fd) => fd,
        Err(errno) => {
            let class = classify(errno, OpStage::FileOpenCreate, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("create {} failed with errno {errno}", full.display()))
            };
        }
    };

    let size = ctx.random_file_size() as usize;
    let data = fill_random(ctx, size).to_vec();
    match pwrite_all(fd, &data, 0) {
        Ok(n) => {
            counters.write_requests += 1;
            counters.write_bytes += n;
            counters.created += 1;
            ctx.maybe_fsync(fd, counters);
            ctx.close(fd, counters);
            Ok(())
        }
        Err(errno) => {
            ctx.close(fd, counters);
            let class = classify(errno, OpStage::Write, false, ctx.params.tolerate_stale_fh);
            if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("create-write {} failed with errno {errno}", full.display()))
            }
        }
    }
}

pub fn append(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    if ctx.fullness_gate(OpCode::Append) {
        counters.no_space += 1;
        return Ok(());
    }
    let rel = ctx.gen_path();
    let full = ctx.params.top.join(&rel);

    let fd = match open_raw(&full, libc::O_WRONLY | libc::O_APPEND, 0) {
        Ok(fd) => fd,
        Err(errno) => {
            let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("append {} failed with errno {errno}", full.display()))
            };
        }
    };

    let size = ctx.random_record_size() as usize;
    let data = fill_random(ctx, size).to_vec();
    // `O_APPEND` makes the kernel seek to the current end before every
    // `write`, so a plain `write` (not `pwrite`) is what "append" means.
    let rc = unsafe { libc::write(fd, data.as_ptr() as *const libc::c_void, data.len()) };
    if rc < 0 {
        let errno = last_errno();
        ctx.close(fd, counters);
        let class = classify(errno, OpStage::Write, false, ctx.params.tolerate_stale_fh);
        return if record(counters, class) {
            Ok(())
        } else {
            counters.total_errors += 1;
            Err(anyhow!("append-write {} failed with errno {errno}", full.display()))
        };
    }
    counters.write_requests += 1;
    counters.write_bytes += rc as u64;
    counters.appended += 1;
    ctx.maybe_fsync(fd, counters);
    ctx.close(fd, counters);
    Ok(())
}

pub fn write_whole(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    if ctx.fullness_gate(OpCode::Write) {
        counters.no_space += 1;
        return Ok(());
    }
    let rel = ctx.gen_path();
    let full = ctx.params.top.join(&rel);

    let fd = match open_raw(&full, libc::O_WRONLY, 0) {
        Ok(fd) => fd,
        Err(errno) => {
            let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("write {} failed with errno {errno}", full.display()))
            };
        }
    };

    let size = ctx.random_file_size() as usize;
    let data = fill_random(ctx, size).to_vec();
    match pwrite_all(fd, &data, 0) {
        Ok(n) => {
            counters.write_requests += 1;
            counters.write_bytes += n;
            counters.written += 1;
            ctx.maybe_fsync(fd, counters);
            ctx.close(fd, counters);
            Ok(())
        }
        Err(errno) => {
            ctx.close(fd, counters);
            let class = classify(errno, OpStage::Write, false, ctx.params.tolerate_stale_fh);
            if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("write {} failed with errno {errno}", full.display()))
            }
        }
    }
}

/// `random_write` (§4.3): open once, then issue a random number of
/// segments (capped at `max_random_writes`, the "per-op segment cap" from
/// §6), each seeking to a random offset <= the file's *actual current
/// size* minus the segment's record size, and writing `random_record_size()`
/// bytes there, maybe-fsyncing after each segment. Stops early once the
/// cumulative bytes written reach `random_file_size()` (the "up to ...
/// bytes total in segments" from the op table).
pub fn random_write(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    let rel = ctx.gen_path();
    let full = ctx.params.top.join(&rel);

    let fd = match open_raw(&full, libc::O_WRONLY, 0) {
        Ok(fd) => fd,
        Err(errno) => {
            let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("random_write {} failed with errno {errno}", full.display()))
            };
        }
    };

    use rand::Rng;
    let target_bytes = ctx.random_file_size().max(1);
    let segment_cap = ctx.rng.gen_range(1..=ctx.params.max_random_writes.max(1));
    let mut total: u64 = 0;

    for _ in 0..segment_cap {
        if total >= target_bytes {
            break;
        }
        let filesize = file_size(fd).unwrap_or(0);
        let record_size = ctx.random_record_size();
        let offset = random_offset_within(&mut ctx.rng, filesize, record_size);
        let size = record_size as usize;
        let data = fill_random(ctx, size).to_vec();

        match pwrite_all(fd, &data, offset) {
            Ok(n) => {
                counters.randwrite_requests += 1;
                counters.randwrite_bytes += n;
                total += n;
                ctx.maybe_fsync(fd, counters);
            }
            Err(errno) => {
                ctx.close(fd, counters);
                let class = classify(errno, OpStage::Write, false, ctx.params.tolerate_stale_fh);
                return if record(counters, class) {
                    Ok(())
                } else {
                    counters.total_errors += 1;
                    Err(anyhow!("random_write {} failed with errno {errno}", full.display()))
                };
            }
        }
    }
    counters.randomly_written += 1;
    ctx.close(fd, counters);
    Ok(())
}

/// Draw a random offset in `[0, filesize - recsz]` (clamped to 0 when the
/// file is smaller than one record), per §4.3's "seeking to a random
/// offset <= filesize - recsz".
fn random_offset_within(rng: &mut impl rand::Rng, filesize: u64, recsz: u64) -> i64 {
    let max_offset = filesize.saturating_sub(recsz);
    rng.gen_range(0..=max_offset) as i64
}

/// Sequential read (§4.3): read the whole file in `random_record_size()`
/// chunks until EOF, so `record_size`/`max_record_size_kb`/`direct_io`
/// govern the chunk size the same way they do for the write-family ops.
pub fn read(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    let rel = ctx.gen_path();
    let full = ctx.params.top.join(&rel);

    let fd = match open_raw(&full, libc::O_RDONLY, 0) {
        Ok(fd) => fd,
        Err(errno) => {
            let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("read {} failed with errno {errno}", full.display()))
            };
        }
    };

    let mut total: u64 = 0;
    loop {
        let chunk = ctx.random_record_size().max(1) as usize;
        if ctx.buf.len() < chunk {
            ctx.buf.resize(chunk, 0);
        }
        let rc = unsafe {
            libc::read(fd, ctx.buf.as_mut_ptr() as *mut libc::c_void, chunk)
        };
        if rc < 0 {
            let errno = last_errno();
            ctx.close(fd, counters);
            let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("read {} failed with errno {errno}", full.display()))
            };
        }
        if rc == 0 {
            break;
        }
        total += rc as u64;
    }
    counters.read_requests += 1;
    counters.read_bytes += total;
    counters.read += 1;
    ctx.close(fd, counters);
    Ok(())
}

/// `random_read` (§4.3): open once, then issue a random number of segments
/// (capped at `max_random_reads`), each seeking to a random offset within
/// the file's actual current size and reading `random_record_size()`
/// bytes, stopping early once cumulative bytes read reach
/// `random_file_size()`.
pub fn random_read(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    let rel = ctx.gen_path();
    let full = ctx.params.top.join(&rel);

    let fd = match open_raw(&full, libc::O_RDONLY, 0) {
        Ok(fd) => fd,
        Err(errno) => {
            let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("random_read {} failed with errno {errno}", full.display()))
            };
        }
    };

    let filesize = file_size(fd).unwrap_or(0);
    if filesize == 0 {
        ctx.close(fd, counters);
        counters.randread_requests += 1;
        counters.randomly_read += 1;
        return Ok(());
    }

    use rand::Rng;
    let target_bytes = ctx.random_file_size().max(1);
    let segment_cap = ctx.rng.gen_range(1..=ctx.params.max_random_reads.max(1));
    let mut total: u64 = 0;

    for _ in 0..segment_cap {
        if total >= target_bytes {
            break;
        }
        let record_size = ctx.random_record_size();
        let offset = random_offset_within(&mut ctx.rng, filesize, record_size);
        let want = record_size.min(filesize.saturating_sub(offset as u64)).max(1) as usize;
        if ctx.buf.len() < want {
            ctx.buf.resize(want, 0);
        }
        let mut tmp = vec![0u8; want];
        match pread_all(fd, &mut tmp, offset) {
            Ok(n) => {
                counters.randread_requests += 1;
                counters.randread_bytes += n;
                total += n;
            }
            Err(errno) => {
                ctx.close(fd, counters);
                let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
                return if record(counters, class) {
                    Ok(())
                } else {
                    counters.total_errors += 1;
                    Err(anyhow!("random_read {} failed with errno {errno}", full.display()))
                };
            }
        }
    }
    counters.randomly_read += 1;
    ctx.close(fd, counters);
    Ok(())
}

pub fn truncate(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    let rel = ctx.gen_path();
    let full = ctx.params.top.join(&rel);

    let fd = match open_raw(&full, libc::O_WRONLY, 0) {
        Ok(fd) => fd,
        Err(errno) => {
            let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("truncate {} failed with errno {errno}", full.display()))
            };
        }
    };

    let new_size = ctx.random_file_size();
    let rc = unsafe { libc::ftruncate(fd, new_size as libc::off_t) };
    if rc != 0 {
        let errno = last_errno();
        ctx.close(fd, counters);
        let class = classify(errno, OpStage::Write, false, ctx.params.tolerate_stale_fh);
        return if record(counters, class) {
            Ok(())
        } else {
            counters.total_errors += 1;
            Err(anyhow!("truncate {} failed with errno {errno}", full.display()))
        };
    }
    counters.truncated += 1;
    ctx.close(fd, counters);
    Ok(())
}

pub fn softlink(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    if ctx.fullness_gate(OpCode::Softlink) {
        counters.no_space += 1;
        return Ok(());
    }
    let target = ctx.gen_path();
    let link_rel = ctx.gen_path_for_create();
    if !ensure_parents(&ctx.params.top, &link_rel, counters, ctx.params.tolerate_stale_fh)? {
        return Ok(());
    }
    let link_full = ctx.params.top.join(&link_rel);

    let target_c = cpath(&target)?;
    let link_c = cpath(&link_full)?;
    let rc = unsafe { libc::symlink(target_c.as_ptr(), link_c.as_ptr()) };
    if rc != 0 {
        return absorb(counters, "softlink", &link_full, OpStage::Other, false, ctx.params.tolerate_stale_fh);
    }
    counters.softlinked += 1;
    Ok(())
}

pub fn hardlink(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    if ctx.fullness_gate(OpCode::Hardlink) {
        counters.no_space += 1;
        return Ok(());
    }
    let target_rel = ctx.gen_path();
    let link_rel = ctx.gen_path_for_create();
    if !ensure_parents(&ctx.params.top, &link_rel, counters, ctx.params.tolerate_stale_fh)? {
        return Ok(());
    }
    let target_full = ctx.params.top.join(&target_rel);
    let link_full = ctx.params.top.join(&link_rel);

    let target_c = cpath(&target_full)?;
    let link_c = cpath(&link_full)?;
    let rc = unsafe { libc::link(target_c.as_ptr(), link_c.as_ptr()) };
    if rc != 0 {
        return absorb(counters, "hardlink", &link_full, OpStage::Other, false, ctx.params.tolerate_stale_fh);
    }
    counters.hardlinked += 1;
    Ok(())
}

pub fn delete(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    let rel = ctx.gen_path();
    let full = ctx.params.top.join(&rel);
    let c = cpath(&full)?;
    let rc = unsafe { libc::unlink(c.as_ptr()) };
    if rc != 0 {
        return absorb(counters, "delete", &full, OpStage::Other, false, ctx.params.tolerate_stale_fh);
    }
    counters.deleted += 1;
    Ok(())
}

pub fn rename(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    let src_rel = ctx.gen_path();
    let dst_rel = ctx.gen_path_for_create();
    if !ensure_parents(&ctx.params.top, &dst_rel, counters, ctx.params.tolerate_stale_fh)? {
        return Ok(());
    }
    let src_full = ctx.params.top.join(&src_rel);
    let dst_full = ctx.params.top.join(&dst_rel);

    let src_c = cpath(&src_full)?;
    let dst_c = cpath(&dst_full)?;
    let rc = unsafe { libc::rename(src_c.as_ptr(), dst_c.as_ptr()) };
    if rc != 0 {
        return absorb(counters, "rename", &src_full, OpStage::Other, false, ctx.params.tolerate_stale_fh);
    }
    counters.renamed += 1;
    Ok(())
}

pub fn readdir(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    let rel = ctx.gen_path();
    let dir_rel = rel.parent().unwrap_or_else(|| Path::new("."));
    let dir_full = ctx.params.top.join(dir_rel);
    let c = cpath(&dir_full)?;

    let dirp = unsafe { libc::opendir(c.as_ptr()) };
    if dirp.is_null() {
        return absorb(counters, "readdir", &dir_full, OpStage::Other, true, ctx.params.tolerate_stale_fh);
    }

    let mut count: u64 = 0;
    loop {
        unsafe { *libc::__errno_location() = 0 };
        let entry = unsafe { libc::readdir(dirp) };
        if entry.is_null() {
            let errno = unsafe { *libc::__errno_location() };
            if errno != 0 {
                unsafe { libc::closedir(dirp) };
                let class = classify(errno, OpStage::Other, true, ctx.params.tolerate_stale_fh);
                return if record(counters, class) {
                    Ok(())
                } else {
                    counters.total_errors += 1;
                    Err(anyhow!("readdir {} failed with errno {errno}", dir_full.display()))
                };
            }
            break;
        }
        count += 1;
    }
    unsafe { libc::closedir(dirp) };
    counters.readdir += 1;
    let _ = count;
    Ok(())
}

const BLKDISCARD: libc::c_ulong = 0x1277;

pub fn random_discard(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    if !ctx.params.raw_device {
        // Gated at configuration time (§9): a workload table cannot weight
        // `random_discard` unless `raw_device` is set, so this is
        // unreachable in a validated run.
        return Ok(());
    }
    let full = ctx.params.top.clone();
    let fd = match open_raw(&full, libc::O_WRONLY, 0) {
        Ok(fd) => fd,
        Err(errno) => {
            let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
            return if record(counters, class) {
                Ok(())
            } else {
                counters.total_errors += 1;
                Err(anyhow!("random_discard {} failed with errno {errno}", full.display()))
            };
        }
    };

    let size = file_size(fd).unwrap_or(0).max(1);
    use rand::Rng;
    let len = ctx.random_record_size().min(size);
    let start = ctx.rng.gen_range(0..size.saturating_sub(len).max(1) + 1);
    let range: [u64; 2] = [start, len];

    let rc = unsafe { libc::ioctl(fd, BLKDISCARD, range.as_ptr()) };
    if rc != 0 {
        let errno = last_errno();
        ctx.close(fd, counters);
        let class = classify(errno, OpStage::Other, false, ctx.params.tolerate_stale_fh);
        return if record(counters, class) {
            Ok(())
        } else {
            counters.total_errors += 1;
            Err(anyhow!("random_discard {} failed with errno {errno}", full.display()))
        };
    }
    counters.randdiscard_requests += 1;
    counters.randdiscard_bytes += len;
    counters.randomly_discarded += 1;
    ctx.close(fd, counters);
    Ok(())
}

fn run_shell(cmd: &str) -> std::io::Result<std::process::ExitStatus> {
    std::process::Command::new("sh").arg("-c").arg(cmd).status()
}

pub fn remount(ctx: &mut FSOpCtx, counters: &mut Counters) -> Result<()> {
    if !ctx.params.allow_remount {
        // Gated at configuration time; unreachable in a validated run.
        return Ok(());
    }

    match ctx.mount_state {
        MountState::Mounted => {
            let cmd = ctx
                .params
                .unmount_command
                .clone()
                .ok_or_else(|| anyhow!("allow_remount set without unmount_command"))?;
            match run_shell(&cmd) {
                Ok(status) if status.success() => {
                    ctx.mount_state = MountState::Unmounted;
                    counters.remounted += 1;
                    Ok(())
                }
                _ => {
                    ctx.mount_state = MountState::Broken;
                    counters.could_not_unmount += 1;
                    Ok(())
                }
            }
        }
        MountState::Unmounted => {
            let cmd = ctx
                .params
                .mount_command
                .clone()
                .ok_or_else(|| anyhow!("allow_remount set without mount_command"))?;
            match run_shell(&cmd) {
                Ok(status) if status.success() => {
                    ctx.mount_state = MountState::Mounted;
                    counters.remounted += 1;
                    Ok(())
                }
                _ => {
                    ctx.mount_state = MountState::Broken;
                    counters.could_not_mount += 1;
                    Ok(())
                }
            }
        }
        MountState::Broken => {
            counters.not_mounted += 1;
            Ok(())
        }
    }
}
