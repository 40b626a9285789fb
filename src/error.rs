use std::fmt::{self, Display};
use std::path::PathBuf;

/// The crate-wide result alias. Every public function returns this.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type.
///
/// `Overflow` never escapes the crate boundary: callers inside `keyfinder`
/// and `keycodec` convert it to `KeyNotFound` or treat it as "no such
/// probe" per the key-mapping contract.
#[derive(Debug)]
pub enum Error {
    /// No key satisfies the enumeration query. Not a hard failure.
    KeyNotFound,
    /// `root` does not carry a valid mark file.
    NotADatabase { path: PathBuf },
    /// `open` was given a base outside `[MinBase, MaxBase]`.
    InvalidBase { base: u32 },
    /// A caller observed the leaf already locked by another writer.
    AlreadyInUse { path: PathBuf },
    /// TypedCodec signature recorded at key 0 doesn't match the caller's type.
    TypeSignatureMismatch { expected: String, found: String },
    /// Internal: a `BrokenKey` composed to a value exceeding `u32::MAX`.
    Overflow,
    /// Any other filesystem failure.
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyNotFound => write!(f, "key not found"),
            Error::NotADatabase { path } => {
                write!(f, "{} is not a lazydb database", path.display())
            }
            Error::InvalidBase { base } => write!(f, "invalid key base {base}"),
            Error::AlreadyInUse { path } => write!(f, "{} is locked by another writer", path.display()),
            Error::TypeSignatureMismatch { expected, found } => {
                write!(f, "type signature mismatch: expected {expected}, found {found}")
            }
            Error::Overflow => write!(f, "key composition overflow"),
            Error::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl Error {
    /// True for an `io::Error` of kind `NotFound`.
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}
