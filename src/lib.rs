#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::too_long_first_doc_paragraph)]

//! A filesystem-backed key/value store with automatic key assignment.
//!
//! A database is a directory: keys are `u32`s, mapped deterministically
//! onto a tree of subdirectories so the filesystem itself acts as the
//! index (see [`keycodec`] for the mapping and [`keyfinder`] for the
//! traversal that makes ordered enumeration and free-key assignment work
//! without a separate in-memory index). Values are multi-slot byte
//! streams ([`slotio`]); an optional [`typed`] layer serializes structured
//! values on top via a closed, statically-dispatched binary codec.

pub mod charmap;
pub mod database;
pub mod dirlock;
pub mod dirscan;
pub mod error;
pub mod intser;
pub mod keycodec;
pub mod keyfinder;
pub mod slotio;
pub mod typed;

pub use database::{wipe, Database, OpenOptions};
pub use error::{Error, Result};
