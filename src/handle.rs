//! # handle
//!
//! File and directory handles opened through a [`SmbContext`](crate::SmbContext)

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::rc::Weak;

use crate::backend::{SmbBackend, Whence};
use crate::context::ContextState;
use crate::dirent::SmbDirent;
use crate::error::{Errno, SmbError, SmbResult};

type SharedState<B> = Weak<RefCell<ContextState<B>>>;

/// Run `f` on the context state, if the context is still alive
fn with_state<B, T, F>(context: &SharedState<B>, f: F) -> SmbResult<T>
where
    B: SmbBackend,
    F: FnOnce(&mut ContextState<B>) -> SmbResult<T>,
{
    let shared = context.upgrade().ok_or(SmbError::UseAfterClose)?;
    let mut state = shared.try_borrow_mut().map_err(|_| SmbError::Busy)?;
    f(&mut state)
}

/// Close the handle in `slot` through `close`.
/// The handle is only taken out once the context can be borrowed; on `Busy`
/// it stays open.
fn release<B, H, F>(context: &SharedState<B>, slot: &mut Option<H>, close: F) -> SmbResult<()>
where
    B: SmbBackend,
    F: FnOnce(&mut B, H) -> Result<(), Errno>,
{
    if slot.is_none() {
        return Err(SmbError::UseAfterClose);
    }
    let Some(shared) = context.upgrade() else {
        // released by the backend together with the context
        *slot = None;
        return Err(SmbError::UseAfterClose);
    };
    let mut state = shared.try_borrow_mut().map_err(|_| SmbError::Busy)?;
    let handle = slot.take().ok_or(SmbError::UseAfterClose)?;
    state.open_handles = state.open_handles.saturating_sub(1);
    close(&mut state.backend, handle).map_err(SmbError::Io)
}

/// An open remote file.
///
/// Reads and writes start at the current offset and advance it.
/// The handle is closed on drop if [`FileHandle::close`] was never called.
pub struct FileHandle<B: SmbBackend> {
    context: SharedState<B>,
    file: Option<B::File>,
    uri: String,
}

impl<B: SmbBackend> FileHandle<B> {
    pub(crate) fn new(context: SharedState<B>, file: B::File, uri: String) -> Self {
        Self {
            context,
            file: Some(file),
            uri,
        }
    }

    /// Uri the file was opened at
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether the handle can still be used
    pub fn is_open(&self) -> bool {
        self.file.is_some() && self.context.strong_count() > 0
    }

    /// Read up to `buf.len()` bytes; `Ok(0)` means end of file
    pub fn read(&mut self, buf: &mut [u8]) -> SmbResult<usize> {
        let file = self.file.as_mut().ok_or(SmbError::UseAfterClose)?;
        with_state(&self.context, |state| {
            let result = state.backend.read(&mut state.bridge, file, buf);
            state.settle(result, SmbError::Io)
        })
    }

    /// Write `buf`, returning the amount of bytes written
    pub fn write(&mut self, buf: &[u8]) -> SmbResult<usize> {
        let file = self.file.as_mut().ok_or(SmbError::UseAfterClose)?;
        with_state(&self.context, |state| {
            let result = state.backend.write(&mut state.bridge, file, buf);
            state.settle(result, SmbError::Io)
        })
    }

    /// Move the offset, returning the new position from the start of file
    pub fn seek(&mut self, pos: SeekFrom) -> SmbResult<u64> {
        let (offset, whence) = match pos {
            SeekFrom::Start(offset) => (
                i64::try_from(offset).map_err(|_| SmbError::Seek(Errno(libc::EOVERFLOW)))?,
                Whence::Start,
            ),
            SeekFrom::Current(offset) => (offset, Whence::Current),
            SeekFrom::End(offset) => (offset, Whence::End),
        };
        let file = self.file.as_mut().ok_or(SmbError::UseAfterClose)?;
        with_state(&self.context, |state| {
            let result = state.backend.seek(&mut state.bridge, file, offset, whence);
            state.settle(result, SmbError::Seek)
        })
    }

    /// Close the file. The handle is closed even if the library reports an
    /// error; any further call fails with `UseAfterClose`.
    /// While the context is busy the handle stays open and `Busy` is returned.
    pub fn close(&mut self) -> SmbResult<()> {
        trace!("closing file {}", self.uri);
        let result = release(&self.context, &mut self.file, |backend, file| backend.close(file));
        if let Err(SmbError::Io(errno)) = &result {
            error!("could not close file {}: {}", self.uri, errno);
        }
        result
    }
}

impl<B: SmbBackend> Drop for FileHandle<B> {
    fn drop(&mut self) {
        if self.file.is_some() {
            match self.close() {
                Ok(()) | Err(SmbError::UseAfterClose) => {}
                Err(err) => warn!("could not close file {} on drop: {}", self.uri, err),
            }
        }
    }
}

impl<B: SmbBackend> fmt::Debug for FileHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("uri", &self.uri)
            .field("open", &self.is_open())
            .finish()
    }
}

impl<B: SmbBackend> Read for FileHandle<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileHandle::read(self, buf).map_err(io::Error::from)
    }
}

impl<B: SmbBackend> Write for FileHandle<B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FileHandle::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<B: SmbBackend> Seek for FileHandle<B> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        FileHandle::seek(self, pos).map_err(io::Error::from)
    }
}

/// An open directory stream
pub struct DirHandle<B: SmbBackend> {
    context: SharedState<B>,
    dir: Option<B::Dir>,
    uri: String,
}

impl<B: SmbBackend> DirHandle<B> {
    pub(crate) fn new(context: SharedState<B>, dir: B::Dir, uri: String) -> Self {
        Self {
            context,
            dir: Some(dir),
            uri,
        }
    }

    /// Uri the directory was opened at
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether the handle can still be used
    pub fn is_open(&self) -> bool {
        self.dir.is_some() && self.context.strong_count() > 0
    }

    /// Get the next entry; `Ok(None)` once the stream is exhausted, on every
    /// following call too
    pub fn next_entry(&mut self) -> SmbResult<Option<SmbDirent>> {
        let dir = self.dir.as_mut().ok_or(SmbError::UseAfterClose)?;
        with_state(&self.context, |state| {
            let result = state.backend.read_dir(&mut state.bridge, dir);
            state.settle(result, SmbError::Io)
        })
    }

    /// Close the directory stream; same contract as [`FileHandle::close`]
    pub fn close(&mut self) -> SmbResult<()> {
        trace!("closing directory {}", self.uri);
        let result = release(&self.context, &mut self.dir, |backend, dir| {
            backend.close_dir(dir)
        });
        if let Err(SmbError::Io(errno)) = &result {
            error!("could not close directory {}: {}", self.uri, errno);
        }
        result
    }
}

/// Yields entries until the end of the stream; yields nothing on a closed handle
impl<B: SmbBackend> Iterator for DirHandle<B> {
    type Item = SmbResult<SmbDirent>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.is_open() {
            return None;
        }
        self.next_entry().transpose()
    }
}

impl<B: SmbBackend> Drop for DirHandle<B> {
    fn drop(&mut self) {
        if self.dir.is_some() {
            match self.close() {
                Ok(()) | Err(SmbError::UseAfterClose) => {}
                Err(err) => warn!("could not close directory {} on drop: {}", self.uri, err),
            }
        }
    }
}

impl<B: SmbBackend> fmt::Debug for DirHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirHandle")
            .field("uri", &self.uri)
            .field("open", &self.is_open())
            .finish()
    }
}
