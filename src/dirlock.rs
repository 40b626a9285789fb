//! Advisory shared/exclusive locks scoped to a directory, via a sentinel
//! `.lock` file.
//!
//! Uses `fs4::FileExt` to take a whole-file advisory lock, scoped to a leaf
//! directory rather than one global file: there is no one database-wide
//! lock, every leaf has its own `.lock`.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::FileExt;

use crate::error::Result;

/// A held advisory lock on some directory's `.lock` file. Releases on drop.
pub struct LockHandle {
    file: File,
    path: PathBuf,
}

impl LockHandle {
    fn open(dir: &Path, create_if_missing: bool) -> Result<File> {
        let lock_path = dir.join(".lock");
        let mut opts = OpenOptions::new();
        opts.read(true).write(true);
        if create_if_missing {
            opts.create(true);
        }
        Ok(opts.open(&lock_path)?)
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            log::warn!("failed to release lock on {}: {err}", self.path.display());
        }
    }
}

/// Re-verifies that `dir` still exists after a lock was acquired: another
/// writer may have erased the leaf between our probe and the lock grant.
fn verify_still_exists(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} vanished before lock was confirmed", dir.display()),
        )
        .into())
    }
}

/// Blocking exclusive lock on `dir/.lock`.
pub fn lock_write(dir: &Path, create_if_missing: bool) -> Result<LockHandle> {
    log::debug!("acquiring exclusive lock on {}", dir.display());
    let file = LockHandle::open(dir, create_if_missing)?;
    FileExt::lock_exclusive(&file)?;
    verify_still_exists(dir)?;
    Ok(LockHandle { file, path: dir.to_path_buf() })
}

/// Non-blocking exclusive lock on `dir/.lock`; `None` if already held.
pub fn try_lock_write(dir: &Path, create_if_missing: bool) -> Result<Option<LockHandle>> {
    let file = LockHandle::open(dir, create_if_missing)?;
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => return Ok(None),
        Err(err) => return Err(err.into()),
    }
    if verify_still_exists(dir).is_err() {
        drop(FileExt::unlock(&file));
        return Ok(None);
    }
    log::debug!("acquired exclusive lock on {}", dir.display());
    Ok(Some(LockHandle { file, path: dir.to_path_buf() }))
}

/// Blocking shared lock on `dir/.lock`.
pub fn lock_read(dir: &Path) -> Result<LockHandle> {
    log::debug!("acquiring shared lock on {}", dir.display());
    // Readers never create the leaf: a shared lock on a key that doesn't
    // exist is meaningless and `open` with `create(false)` surfaces that
    // as `NotFound` to the caller rather than materializing an empty dir.
    let file = LockHandle::open(dir, false)?;
    FileExt::lock_shared(&file)?;
    verify_still_exists(dir)?;
    Ok(LockHandle { file, path: dir.to_path_buf() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn exclusive_lock_excludes_try_lock() {
        let tmp = TempDir::new().unwrap();
        let _held = lock_write(tmp.path(), true).unwrap();
        assert!(try_lock_write(tmp.path(), true).unwrap().is_none());
    }

    #[test]
    fn lock_released_on_drop() {
        let tmp = TempDir::new().unwrap();
        {
            let _held = lock_write(tmp.path(), true).unwrap();
        }
        assert!(try_lock_write(tmp.path(), true).unwrap().is_some());
    }

    #[test]
    fn shared_lock_requires_existing_dir() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("leaf");
        assert!(lock_read(&missing).is_err());
    }
}
