//! Enumerates digit-character entries in a directory, filtered to valid
//! digits `< base`, in ascending or descending order.
//!
//! Never blocks on a lock: callers hold (or don't hold) whatever lock is
//! appropriate before calling in; a missing directory is not an error, it
//! simply yields no digits (this lets [`crate::keyfinder`] probe
//! speculative paths without pre-checking existence).

use std::path::Path;

use itertools::Itertools;

use crate::charmap::digit_of_name;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// All digit values `< base` present as entries of `dir`, sorted per `order`.
pub fn list_digits(dir: &Path, base: u32, order: Order) -> Result<Vec<u32>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut digits = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(digit) = digit_of_name(name, base) {
            digits.push(digit);
        }
    }
    let sorted = match order {
        Order::Ascending => digits.into_iter().sorted().collect(),
        Order::Descending => digits.into_iter().sorted_by(|a, b| b.cmp(a)).collect(),
    };
    Ok(sorted)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindMode {
    /// First digit in directory order (used by `find_free_key`'s "any child").
    Any,
    /// First digit `>= threshold`.
    AtOrAbove(u32),
    /// First digit `<= threshold`.
    AtOrBelow(u32),
}

/// Scans `dir` once (conceptually; this implementation lists then filters,
/// which is equivalent for any alphabet size the crate supports) and
/// returns the first digit satisfying `mode`, per `list_digits`'s order.
pub fn find_digit(dir: &Path, base: u32, mode: FindMode) -> Result<Option<u32>> {
    let order = match mode {
        FindMode::Any | FindMode::AtOrAbove(_) => Order::Ascending,
        FindMode::AtOrBelow(_) => Order::Descending,
    };
    let digits = list_digits(dir, base, order)?;
    let found = match mode {
        FindMode::Any => digits.into_iter().next(),
        FindMode::AtOrAbove(threshold) => digits.into_iter().find(|&d| d >= threshold),
        FindMode::AtOrBelow(threshold) => digits.into_iter().find(|&d| d <= threshold),
    };
    Ok(found)
}
