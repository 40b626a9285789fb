//! The two traversal algorithms that make a directory tree behave like a
//! sorted, sparse key space: nearest-key search (for enumeration) and
//! free-key search (for automatic key assignment on [`crate::database::Database::save`]).
//!
//! Both walk the `{root}/char(d_{D-1})/…/char(d_1)` prefix structure that
//! [`crate::keycodec`] defines. `dir_for_level(.., 0)` is the directory
//! whose entries are named `char(d_0)` — one per key sharing that prefix —
//! so each key owns its *own* directory, named by its least-significant
//! digit, nested one level below `dir_for_level(.., 0)`. Slot files (see
//! [`crate::slotio`]) live inside that per-key directory, named `char(s)`;
//! keeping the digit namespace (sibling keys under a shared prefix) and the
//! slot namespace (sibling values within one key) in two different
//! directories is what lets the two share a character alphabet without
//! colliding.

use std::path::{Path, PathBuf};

use crate::charmap::char_of;
use crate::dirscan::{list_digits, Order};
use crate::error::Result;
use crate::keycodec::{decompose, depth_for_base, BrokenKey};

/// Directory holding the digit-`level` entries for `key`'s prefix: built
/// from `key`'s digits strictly above `level`, most-significant first.
/// `level == depth - 1` yields `root` itself; `level == 0` yields the
/// directory whose entries are the `char(d_0)`-named per-key directories
/// (see [`leaf_dir`] for the key's own directory, one level deeper still).
pub(crate) fn dir_for_level(root: &Path, key: &BrokenKey, level: usize) -> PathBuf {
    let depth = key.depth();
    let mut path = root.to_path_buf();
    for digit in key.digits_msb_first().take(depth - 1 - level) {
        path.push(char_of(digit).expect("digit always in range").to_string());
    }
    path
}

/// The directory a key owns: `dir_for_level(.., 0)` plus one more path
/// component for the key's own least-significant digit. Slot files for
/// this key (see [`crate::slotio`]) live directly inside it, so no other
/// key's slot files can ever share this directory.
pub(crate) fn leaf_dir(root: &Path, base: u32, key: u32) -> PathBuf {
    let depth = depth_for_base(base);
    let broken = decompose(key, base, depth);
    let mut dir = dir_for_level(root, &broken, 0);
    dir.push(entry_name(broken.digit(0)));
    dir
}

fn entry_name(digit: u32) -> String {
    char_of(digit).expect("digit always in range").to_string()
}

/// Smallest (`ascending`) or largest (`!ascending`) key whose leaf holds at
/// least one slot file and which is `>= threshold` (ascending) or
/// `<= threshold` (descending).
///
/// Tries `threshold` itself first, then widens level by level: at each
/// level every candidate digit satisfying the bound is tried in order, and
/// only the candidate equal to the original threshold digit recurses with
/// the threshold still in force below it — any other candidate is already
/// past the bound, so its subtree is searched unconstrained (smallest, or
/// largest, key present).
pub fn find_key_at_or_beyond(root: &Path, base: u32, threshold: u32, ascending: bool) -> Result<Option<u32>> {
    let depth = depth_for_base(base);
    let mut key = decompose(threshold, base, depth);
    search(root, base, ascending, &mut key, depth - 1)
}

fn search(root: &Path, base: u32, ascending: bool, key: &mut BrokenKey, level: usize) -> Result<Option<u32>> {
    let dir = dir_for_level(root, key, level);
    let order = if ascending { Order::Ascending } else { Order::Descending };
    let original = key.digit(level);

    let candidates: Vec<u32> = list_digits(&dir, base, order)?
        .into_iter()
        .filter(|&d| if ascending { d >= original } else { d <= original })
        .collect();

    for d in candidates {
        let tight = d == original;
        key.set_digit(level, d);

        if level == 0 {
            if let Ok(k) = key.compose() {
                return Ok(Some(k));
            }
            continue;
        }

        if !tight {
            key.fill_below(level, if ascending { 0 } else { base - 1 });
        }
        if let Some(k) = search(root, base, ascending, key, level - 1)? {
            return Ok(Some(k));
        }
    }
    Ok(None)
}

/// Smallest currently-free key, observable at probe time. Descends from
/// root toward the leaf, taking the first digit whose child is absent at
/// each level; a `.full` mark (written when a subtree is exhausted) prunes
/// the whole subtree without a directory scan.
pub fn find_free_key(root: &Path, base: u32) -> Result<Option<u32>> {
    let depth = depth_for_base(base);
    let mut key = BrokenKey::filled(base, depth, 0);
    descend(root, base, &mut key, depth - 1)
}

fn descend(root: &Path, base: u32, key: &mut BrokenKey, level: usize) -> Result<Option<u32>> {
    let dir = dir_for_level(root, key, level);
    if dir.join(".full").try_exists()? {
        return Ok(None);
    }

    for d in 0..base {
        let child = dir.join(entry_name(d));
        if !child.try_exists()? {
            key.set_digit(level, d);
            key.fill_below(level, 0);
            return Ok(key.compose().ok());
        }
        if level > 0 {
            key.set_digit(level, d);
            if let Some(k) = descend(root, base, key, level - 1)? {
                return Ok(Some(k));
            }
        }
    }

    log::debug!("marking {} full", dir.display());
    std::fs::write(dir.join(".full"), b"")?;
    Ok(None)
}
