//! Binds a single typed placeholder value to key `0` of a [`Database`].
//!
//! Key 0 is reserved for the binding's own bookkeeping: slot 0 holds the
//! ASCII label `"Keep"`, slot 1 the placeholder's canonical signature, and
//! slot 2 the placeholder's current encoded value. Every other key in the
//! same database is free for ordinary [`Database::save_as`]/[`Database::load`]
//! use — the reservation is scoped to key 0 only.

use std::marker::PhantomData;
use std::path::PathBuf;

use crate::database::Database;
use crate::error::{Error, Result};

use super::Codec;

const LABEL: &[u8] = b"Keep";
const LABEL_SLOT: u32 = 0;
const SIGNATURE_SLOT: u32 = 1;
const VALUE_SLOT: u32 = 2;

/// A database holding exactly one typed value, bound at open time by a
/// label and signature check against key 0.
pub struct TypedDb<T> {
    db: Database,
    _marker: PhantomData<T>,
}

impl<T: Codec> TypedDb<T> {
    pub fn open(root: impl Into<PathBuf>, base: u32) -> Result<Self> {
        Self::bind(Database::open(root, base)?)
    }

    fn bind(db: Database) -> Result<Self> {
        let signature = T::signature();
        match db.load(0, &[LABEL_SLOT, SIGNATURE_SLOT]) {
            Ok(parts) => {
                if parts[0] != LABEL {
                    return Err(Error::TypeSignatureMismatch {
                        expected: String::from_utf8_lossy(LABEL).into_owned(),
                        found: String::from_utf8_lossy(&parts[0]).into_owned(),
                    });
                }
                let found = String::from_utf8_lossy(&parts[1]).into_owned();
                if found != signature {
                    return Err(Error::TypeSignatureMismatch { expected: signature, found });
                }
            }
            Err(ref err) if err.is_not_found() => {
                log::info!("binding new typed database to signature {signature}");
                db.save_as(0, &[(LABEL_SLOT, LABEL), (SIGNATURE_SLOT, signature.as_bytes())])?;
            }
            Err(err) => return Err(err),
        }
        Ok(Self { db, _marker: PhantomData })
    }

    /// Current value of the placeholder, or `None` if never set.
    pub fn get(&self) -> Result<Option<T>> {
        match self.db.load(0, &[VALUE_SLOT]) {
            Ok(parts) => {
                let mut pos = 0;
                Ok(Some(T::decode(&parts[0], &mut pos).ok_or_else(|| Error::TypeSignatureMismatch {
                    expected: T::signature(),
                    found: "corrupt payload".to_string(),
                })?))
            }
            Err(ref err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Replaces the placeholder's value.
    pub fn set(&self, value: &T) -> Result<()> {
        let encoded = super::encode(value);
        self.db.save_as(0, &[(VALUE_SLOT, encoded.as_slice())])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn binds_and_round_trips_a_value() {
        let tmp = TempDir::new().unwrap();
        let typed = TypedDb::<u32>::open(tmp.path(), 16).unwrap();
        assert_eq!(typed.get().unwrap(), None);
        typed.set(&42).unwrap();
        assert_eq!(typed.get().unwrap(), Some(42));
    }

    #[test]
    fn reopen_with_same_type_succeeds() {
        let tmp = TempDir::new().unwrap();
        TypedDb::<u32>::open(tmp.path(), 16).unwrap().set(&7).unwrap();
        let reopened = TypedDb::<u32>::open(tmp.path(), 16).unwrap();
        assert_eq!(reopened.get().unwrap(), Some(7));
    }

    #[test]
    fn reopen_with_different_type_is_rejected() {
        let tmp = TempDir::new().unwrap();
        TypedDb::<u32>::open(tmp.path(), 16).unwrap();
        assert!(matches!(TypedDb::<String>::open(tmp.path(), 16), Err(Error::TypeSignatureMismatch { .. })));
    }
}
