//! The public API: a directory-backed key/value store with automatic key
//! assignment, multi-slot values, ordered enumeration, and bulk wipe.
//!
//! This is the façade over every other module: [`crate::keycodec`] maps
//! keys to paths, [`crate::dirlock`] scopes concurrent mutation to a leaf,
//! [`crate::slotio`] streams the actual bytes, and [`crate::keyfinder`]
//! drives both enumeration and automatic key assignment.

use std::path::{Path, PathBuf};

use crate::dirlock::{lock_read, lock_write, try_lock_write};
use crate::dirscan::{list_digits, Order};
use crate::error::{Error, Result};
use crate::intser::{decode_u32, encode_u32};
use crate::keycodec::{decompose, depth_for_base, MAX_BASE, MIN_BASE};
use crate::keyfinder::{dir_for_level, find_free_key, find_key_at_or_beyond, leaf_dir};
use crate::slotio;

/// Default base used by [`Database::open`] when the caller passes `0`.
pub const DEFAULT_BASE: u32 = 16;

const LABEL: &str = "lazydb";

/// Configuration for [`Database::open_with`]. Mirrors `open`'s single
/// `base` parameter as a named struct so the open call reads the same way
/// whether or not more fields are added later.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    /// Key base to create the database with. Ignored if `root` already
    /// holds a mark file; `0` means [`DEFAULT_BASE`].
    pub base: u32,
}

impl OpenOptions {
    pub fn new(base: u32) -> Self {
        Self { base }
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { base: DEFAULT_BASE }
    }
}

/// An open handle onto a filesystem-backed key/value database.
///
/// Opening the same `root` twice yields two independent handles sharing
/// the directory; all coordination between them happens through advisory
/// filesystem locks, not in-process state.
#[derive(Debug, Clone)]
pub struct Database {
    root: PathBuf,
    base: u32,
    depth: usize,
}

fn mark_path(root: &Path) -> PathBuf {
    root.join(format!(".{LABEL}"))
}

fn wiping_path(root: &Path) -> PathBuf {
    root.join(format!(".{LABEL}.wiping"))
}

impl Database {
    /// Opens `root`, creating it with key base `base` (or [`DEFAULT_BASE`]
    /// if `base == 0`) if it doesn't already hold a database.
    pub fn open(root: impl Into<PathBuf>, base: u32) -> Result<Self> {
        Self::open_with(root, OpenOptions::new(base))
    }

    pub fn open_with(root: impl Into<PathBuf>, opts: OpenOptions) -> Result<Self> {
        let root = root.into();
        let mark = mark_path(&root);

        match std::fs::read(&mark) {
            Ok(bytes) => {
                let base = decode_u32(&bytes).ok_or_else(|| Error::NotADatabase { path: root.clone() })?;
                log::debug!("opened existing database {} (base {base})", root.display());
                let depth = depth_for_base(base);
                Ok(Self { root, base, depth })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if wiping_path(&root).try_exists()? {
                    return Err(Error::NotADatabase { path: root });
                }
                std::fs::create_dir_all(&root)?;
                if std::fs::read_dir(&root)?.next().is_some() {
                    return Err(Error::NotADatabase { path: root });
                }
                let base = if opts.base == 0 { DEFAULT_BASE } else { opts.base };
                if !(MIN_BASE..=MAX_BASE).contains(&base) {
                    return Err(Error::InvalidBase { base });
                }
                std::fs::write(&mark, encode_u32(base))?;
                log::info!("created database {} (base {base})", root.display());
                let depth = depth_for_base(base);
                Ok(Self { root, base, depth })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    fn leaf(&self, key: u32) -> PathBuf {
        leaf_dir(&self.root, self.base, key)
    }

    /// Writes each `(slot, data)` pair to `key`'s leaf, leaving any slot not
    /// named in `slots` untouched. Creates the leaf directory if needed.
    pub fn save_as(&self, key: u32, slots: &[(u32, &[u8])]) -> Result<Vec<usize>> {
        let leaf = self.leaf(key);
        std::fs::create_dir_all(&leaf)?;
        let _lock = lock_write(&leaf, true)?;
        slotio::save_slots(&leaf, slots)
    }

    /// Assigns and returns the smallest currently-free key, writing the
    /// given slots to it. Retries against contending writers converging on
    /// the same candidate leaf.
    pub fn save(&self, slots: &[(u32, &[u8])]) -> Result<(u32, Vec<usize>)> {
        loop {
            let Some(key) = find_free_key(&self.root, self.base)? else {
                return Err(Error::KeyNotFound);
            };
            let leaf = self.leaf(key);
            std::fs::create_dir_all(&leaf)?;
            let Some(_lock) = try_lock_write(&leaf, true)? else {
                continue;
            };
            let counts = slotio::save_slots(&leaf, slots)?;
            return Ok((key, counts));
        }
    }

    /// Reads each requested slot of `key`. Fails if any requested slot is
    /// absent.
    pub fn load(&self, key: u32, slots: &[u32]) -> Result<Vec<Vec<u8>>> {
        let leaf = self.leaf(key);
        let _lock = lock_read(&leaf)?;
        let wrapped: Vec<Option<u32>> = slots.iter().copied().map(Some).collect();
        let results = slotio::load_slots(&leaf, &wrapped)?;
        results.into_iter().map(|r| r.ok_or_else(|| Error::Io(std::io::ErrorKind::NotFound.into()))).collect()
    }

    /// Removes every slot of `key` and prunes now-empty ancestor
    /// directories and their stale `.full` marks.
    pub fn erase(&self, key: u32) -> Result<()> {
        let leaf = self.leaf(key);
        {
            let _lock = lock_write(&leaf, false)?;
            std::fs::remove_dir_all(&leaf)?;
        }

        // Two independent passes walking the same prefix path upward,
        // starting at level 0 (the directory that held `key`'s own
        // directory as a `char(d_0)`-named entry, now possibly empty): full
        // marks are removed unconditionally at every level (a stale mark
        // anywhere on the path could otherwise hide a freed key from
        // `save` forever), while directory pruning stops as soon as an
        // ancestor turns out non-empty, since everything above it must
        // still contain that ancestor and thus can't be empty either.
        let broken = decompose(key, self.base, self.depth);
        let mut still_pruning = true;
        for level in 0..self.depth {
            let dir = dir_for_level(&self.root, &broken, level);
            let full_mark = dir.join(".full");
            if full_mark.try_exists()? {
                std::fs::remove_file(&full_mark)?;
            }
            if dir == self.root {
                break;
            }
            if still_pruning {
                if list_digits(&dir, self.base, Order::Ascending)?.is_empty() {
                    std::fs::remove_dir(&dir)?;
                } else {
                    still_pruning = false;
                }
            }
        }
        Ok(())
    }

    /// Whether slot `slot` of `key` exists.
    pub fn exists(&self, key: u32, slot: u32) -> Result<bool> {
        slotio::slot_exists(&self.leaf(key), slot)
    }

    /// The smallest (`ascending`) or largest (`!ascending`) existing key
    /// `>= key` / `<= key`.
    pub fn find_key(&self, key: u32, ascending: bool) -> Result<u32> {
        find_key_at_or_beyond(&self.root, self.base, key, ascending)?.ok_or(Error::KeyNotFound)
    }

    /// Iterates every existing key in order starting from `0` (ascending)
    /// or `u32::MAX` (descending).
    pub fn iter(&self, ascending: bool) -> KeyIter<'_> {
        KeyIter { db: self, next: Some(if ascending { 0 } else { u32::MAX }), ascending, started: false }
    }

    /// Finishes this handle by wiping its database. Equivalent to
    /// `wipe(db.root())` but consumes the handle so it can't be reused
    /// against a directory it no longer owns a valid mark in.
    pub fn wipe(self) -> Result<()> {
        wipe(&self.root)
    }
}

/// Forward-only iterator over existing keys, built on repeated
/// [`Database::find_key`] calls. Not linearizable against concurrent
/// writers: see the module docs on [`crate::keyfinder`].
pub struct KeyIter<'a> {
    db: &'a Database,
    next: Option<u32>,
    ascending: bool,
    started: bool,
}

impl Iterator for KeyIter<'_> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        let probe = self.next?;
        let probe = if self.started {
            if self.ascending {
                probe.checked_add(1)?
            } else {
                probe.checked_sub(1)?
            }
        } else {
            self.started = true;
            probe
        };
        match self.db.find_key(probe, self.ascending) {
            Ok(key) => {
                self.next = Some(key);
                Some(Ok(key))
            }
            Err(Error::KeyNotFound) => {
                self.next = None;
                None
            }
            Err(err) => {
                self.next = None;
                Some(Err(err))
            }
        }
    }
}

/// Wipes the database at `root`: renames the mark file to a wiping mark,
/// removes every other entry, then removes the wiping mark itself.
/// Resumable: if a prior wipe was interrupted after the rename, calling
/// this again finishes the job rather than failing as "not a database".
pub fn wipe(root: &Path) -> Result<()> {
    let mark = mark_path(root);
    let wiping = wiping_path(root);

    match std::fs::rename(&mark, &wiping) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && wiping.try_exists()? => {
            log::warn!("resuming interrupted wipe of {}", root.display());
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotADatabase { path: root.to_path_buf() });
        }
        Err(err) => return Err(err.into()),
    }

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.path() == wiping {
            continue;
        }
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }
    std::fs::remove_file(&wiping)?;
    log::info!("wiped database {}", root.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_mark_with_default_base() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 0).unwrap();
        assert_eq!(db.base(), DEFAULT_BASE);
        assert!(mark_path(tmp.path()).exists());
    }

    #[test]
    fn open_rejects_invalid_base() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(Database::open(tmp.path(), 1), Err(Error::InvalidBase { base: 1 })));
    }

    #[test]
    fn reopen_ignores_base_argument() {
        let tmp = TempDir::new().unwrap();
        Database::open(tmp.path(), 16).unwrap();
        let db = Database::open(tmp.path(), 10).unwrap();
        assert_eq!(db.base(), 16);
    }

    #[test]
    fn save_as_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        db.save_as(7, &[(0, b"hello".as_slice())]).unwrap();
        let loaded = db.load(7, &[0]).unwrap();
        assert_eq!(loaded, vec![b"hello".to_vec()]);
    }

    #[test]
    fn save_assigns_distinct_keys() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        let (k1, _) = db.save(&[(0, b"a".as_slice())]).unwrap();
        let (k2, _) = db.save(&[(0, b"b".as_slice())]).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn erase_then_find_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        db.save_as(7, &[(0, b"x".as_slice())]).unwrap();
        db.erase(7).unwrap();
        assert!(!db.exists(7, 0).unwrap());
    }

    #[test]
    fn erase_then_resave_round_trips() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        db.save_as(7, &[(0, b"x".as_slice())]).unwrap();
        db.erase(7).unwrap();
        db.save_as(7, &[(0, b"y".as_slice())]).unwrap();
        assert_eq!(db.load(7, &[0]).unwrap(), vec![b"y".to_vec()]);
    }

    #[test]
    fn find_key_on_empty_database_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        assert!(matches!(db.find_key(0, true), Err(Error::KeyNotFound)));
    }

    #[test]
    fn iter_visits_keys_in_order() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        db.save_as(300, &[(0, b"a".as_slice())]).unwrap();
        db.save_as(5, &[(0, b"b".as_slice())]).unwrap();
        db.save_as(70, &[(0, b"c".as_slice())]).unwrap();
        let keys: Result<Vec<u32>> = db.iter(true).collect();
        assert_eq!(keys.unwrap(), vec![5, 70, 300]);
    }

    #[test]
    fn wipe_empties_root_and_allows_recreation() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        db.save_as(1, &[(0, b"x".as_slice())]).unwrap();
        db.wipe().unwrap();
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
        let db = Database::open(tmp.path(), 16).unwrap();
        assert!(!db.exists(1, 0).unwrap());
    }

    #[test]
    fn wipe_resumes_after_simulated_crash() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        db.save_as(1, &[(0, b"x".as_slice())]).unwrap();
        std::fs::rename(mark_path(tmp.path()), wiping_path(tmp.path())).unwrap();
        wipe(tmp.path()).unwrap();
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn concurrent_saves_never_collide_on_a_key() {
        use rand::Rng;
        use std::sync::Arc;

        let tmp = TempDir::new().unwrap();
        let db = Arc::new(Database::open(tmp.path(), 16).unwrap());
        const THREADS: usize = 4;
        const PER_THREAD: usize = 15;

        let keys = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let db = Arc::clone(&db);
                    scope.spawn(move || {
                        let mut rng = rand::thread_rng();
                        let mut mine = Vec::with_capacity(PER_THREAD);
                        for _ in 0..PER_THREAD {
                            let payload = [rng.gen::<u8>()];
                            let (key, _) = db.save(&[(0, payload.as_slice())]).unwrap();
                            mine.push(key);
                        }
                        mine
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect::<Vec<_>>()
        });

        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), THREADS * PER_THREAD);
    }

    #[test]
    fn multi_slot_save_leaves_unrequested_slots_untouched() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path(), 16).unwrap();
        db.save_as(0, &[(0, b"a".as_slice()), (1, b"b".as_slice()), (2, b"c".as_slice())]).unwrap();
        db.save_as(0, &[(1, b"bb".as_slice())]).unwrap();
        assert_eq!(db.load(0, &[0, 1, 2]).unwrap(), vec![b"a".to_vec(), b"bb".to_vec(), b"c".to_vec()]);
    }
}
