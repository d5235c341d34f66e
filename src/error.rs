//! # error
//!
//! Error types returned by the smb context and its handles

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type returned by every operation of this crate
pub type SmbResult<T> = Result<T, SmbError>;

/// Numeric error code reported by the smb library (an `errno` value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub i32);

impl Errno {
    pub const NOT_FOUND: Errno = Errno(libc::ENOENT);
    pub const PERMISSION_DENIED: Errno = Errno(libc::EACCES);
    pub const ALREADY_EXISTS: Errno = Errno(libc::EEXIST);
    pub const NOT_A_DIRECTORY: Errno = Errno(libc::ENOTDIR);
    pub const IS_A_DIRECTORY: Errno = Errno(libc::EISDIR);
    pub const INVALID_ARGUMENT: Errno = Errno(libc::EINVAL);
    pub const BAD_DESCRIPTOR: Errno = Errno(libc::EBADF);
    pub const IO: Errno = Errno(libc::EIO);

    /// Get the raw code
    pub fn code(self) -> i32 {
        self.0
    }

    /// Get the errno of the calling thread, `EIO` if it is not set
    #[cfg(all(target_family = "unix", feature = "libsmbclient"))]
    pub(crate) fn last() -> Self {
        match errno::errno().0 {
            0 => Errno::IO,
            code => Errno(code),
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", io::Error::from_raw_os_error(self.0))
    }
}

/// Credential field written by the authentication bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Domain,
    Username,
    Password,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Domain => "domain",
            Self::Username => "username",
            Self::Password => "password",
        };
        f.write_str(name)
    }
}

/// Smb client error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmbError {
    #[error("could not initialize smb context: {0}")]
    Init(Errno),
    #[error("could not open: {0}")]
    Open(Errno),
    #[error("I/O error: {0}")]
    Io(Errno),
    #[error("seek failed: {0}")]
    Seek(Errno),
    #[error("handle or context used after close")]
    UseAfterClose,
    #[error("{field} does not fit into {capacity} bytes")]
    CredentialTooLong {
        field: CredentialField,
        capacity: usize,
    },
    #[error("authentication required for {server}/{share}")]
    AuthRequired { server: String, share: String },
    #[error("context is busy with another operation")]
    Busy,
}

impl SmbError {
    /// Get the underlying library code, if the error carries one
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Init(e) | Self::Open(e) | Self::Io(e) | Self::Seek(e) => Some(*e),
            _ => None,
        }
    }
}

impl From<SmbError> for io::Error {
    fn from(err: SmbError) -> Self {
        match err.errno() {
            Some(errno) => io::Error::from_raw_os_error(errno.code()),
            None => io::Error::other(err),
        }
    }
}
