//! # backend
//!
//! The smb library seen by the context: one implementation calling
//! libsmbclient, one keeping shares in memory.

mod memory;
#[cfg(all(target_family = "unix", feature = "libsmbclient"))]
mod native;

pub use memory::{MemoryBackend, MemoryDir, MemoryFile};
#[cfg(all(target_family = "unix", feature = "libsmbclient"))]
pub use native::{NativeBackend, NativeDir, NativeFile};

use crate::auth::AuthBridge;
use crate::dirent::SmbDirent;
use crate::error::Errno;
use crate::options::SmbOptions;

/// Origin of a seek operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

impl Whence {
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Start => libc::SEEK_SET,
            Self::Current => libc::SEEK_CUR,
            Self::End => libc::SEEK_END,
        }
    }
}

/// Operations of a smb client library context.
///
/// Every operation which may reach the network receives the context's
/// [`AuthBridge`]; the backend calls [`AuthBridge::supply`] whenever the
/// server asks for credentials, before returning.
pub trait SmbBackend {
    /// Open remote file
    type File;
    /// Open remote directory stream
    type Dir;

    /// Apply options. Called before `init` and whenever options change.
    fn configure(&mut self, options: &SmbOptions) -> Result<(), Errno>;

    /// Initialize the context; called once
    fn init(&mut self) -> Result<(), Errno>;

    fn open(
        &mut self,
        auth: &mut AuthBridge,
        uri: &str,
        flags: i32,
        mode: u32,
    ) -> Result<Self::File, Errno>;

    fn open_dir(&mut self, auth: &mut AuthBridge, uri: &str) -> Result<Self::Dir, Errno>;

    /// Read into `buf`; 0 means end of file
    fn read(
        &mut self,
        auth: &mut AuthBridge,
        file: &mut Self::File,
        buf: &mut [u8],
    ) -> Result<usize, Errno>;

    fn write(
        &mut self,
        auth: &mut AuthBridge,
        file: &mut Self::File,
        buf: &[u8],
    ) -> Result<usize, Errno>;

    /// Reposition the file offset, returning the new one
    fn seek(
        &mut self,
        auth: &mut AuthBridge,
        file: &mut Self::File,
        offset: i64,
        whence: Whence,
    ) -> Result<u64, Errno>;

    /// Next entry of the stream; `None` once exhausted
    fn read_dir(
        &mut self,
        auth: &mut AuthBridge,
        dir: &mut Self::Dir,
    ) -> Result<Option<SmbDirent>, Errno>;

    fn close(&mut self, file: Self::File) -> Result<(), Errno>;

    fn close_dir(&mut self, dir: Self::Dir) -> Result<(), Errno>;

    /// Release the context. With `force`, open files are closed by the library.
    fn shutdown(&mut self, force: bool) -> Result<(), Errno>;
}
