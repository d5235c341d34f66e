//! # context
//!
//! Smb client context: owns the backend, the options and the authentication
//! bridge; opens file and directory handles.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

#[cfg(all(target_family = "unix", feature = "libsmbclient"))]
use crate::backend::NativeBackend;
use crate::auth::{AuthBridge, AuthRequest, AuthResponse};
use crate::backend::SmbBackend;
use crate::dirent::SmbDirent;
use crate::error::{Errno, SmbError, SmbResult};
use crate::handle::{DirHandle, FileHandle};
use crate::options::{SmbOpenOptions, SmbOptions};
use crate::utils::uri;

/// State shared between the context and the handles it opened
pub(crate) struct ContextState<B: SmbBackend> {
    pub(crate) backend: B,
    pub(crate) bridge: AuthBridge,
    pub(crate) options: SmbOptions,
    pub(crate) open_handles: usize,
}

impl<B: SmbBackend> ContextState<B> {
    /// Turn the outcome of a backend call into the context result.
    /// A failure raised by the bridge during the call wins over the outcome.
    pub(crate) fn settle<T>(
        &mut self,
        result: Result<T, Errno>,
        kind: fn(Errno) -> SmbError,
    ) -> SmbResult<T> {
        match (result, self.bridge.take_failure()) {
            (_, Some(err)) => Err(err),
            (Ok(value), None) => Ok(value),
            (Err(errno), None) => Err(kind(errno)),
        }
    }
}

/// Smb client context.
///
/// Not internally synchronized: the context and its handles are meant for a
/// single caller at a time. Every call blocks for the duration of the
/// underlying network operation.
pub struct SmbContext<B: SmbBackend> {
    state: Option<Rc<RefCell<ContextState<B>>>>,
}

#[cfg(all(target_family = "unix", feature = "libsmbclient"))]
impl SmbContext<NativeBackend> {
    /// Create a context backed by libsmbclient
    pub fn native(options: SmbOptions) -> SmbResult<Self> {
        Self::create(options, NativeBackend::new()?)
    }
}

impl<B: SmbBackend> SmbContext<B> {
    /// Configure and initialize `backend`, installing the options' resolver.
    /// Fails if the backend cannot be configured or initialized.
    pub fn create(mut options: SmbOptions, mut backend: B) -> SmbResult<Self> {
        let mut bridge = AuthBridge::new(options.credential_overflow, options.missing_resolver);
        bridge.set_resolver(options.auth_resolver.take());
        backend.configure(&options).map_err(|errno| {
            error!("could not configure smb context: {}", errno);
            SmbError::Init(errno)
        })?;
        backend.init().map_err(|errno| {
            error!("could not initialize smb context: {}", errno);
            SmbError::Init(errno)
        })?;
        debug!("smb context created for {}", options.server);
        Ok(Self {
            state: Some(Rc::new(RefCell::new(ContextState {
                backend,
                bridge,
                options,
                open_handles: 0,
            }))),
        })
    }

    /// Release the context.
    ///
    /// Handles still open are closed by the backend and fail with
    /// `UseAfterClose` afterwards. Any further use of the context, a second
    /// destroy included, fails with `UseAfterClose`.
    pub fn destroy(&mut self) -> SmbResult<()> {
        let shared = self.state.take().ok_or(SmbError::UseAfterClose)?;
        let mut state = match shared.try_borrow_mut() {
            Ok(state) => state,
            Err(_) => {
                self.state = Some(shared.clone());
                return Err(SmbError::Busy);
            }
        };
        let force = state.open_handles > 0;
        if force {
            warn!(
                "destroying smb context with {} open handles",
                state.open_handles
            );
        }
        let result = state.backend.shutdown(force).map_err(|errno| {
            error!("could not free smb context: {}", errno);
            SmbError::Io(errno)
        });
        debug!("smb context destroyed");
        result
    }

    /// Whether the context has not been destroyed yet
    pub fn is_alive(&self) -> bool {
        self.state.is_some()
    }

    /// Attach the authentication resolver, replacing the current one.
    /// Takes effect from the next operation.
    pub fn set_auth_resolver<F>(&mut self, resolver: F) -> SmbResult<()>
    where
        F: FnMut(&AuthRequest<'_>) -> AuthResponse + 'static,
    {
        self.state()?.bridge.set_resolver(Some(Box::new(resolver)));
        Ok(())
    }

    /// Detach the authentication resolver
    pub fn clear_auth_resolver(&mut self) -> SmbResult<()> {
        self.state()?.bridge.set_resolver(None);
        Ok(())
    }

    /// Return a reference to the backend
    pub fn backend(&self) -> SmbResult<Ref<'_, B>> {
        let shared = self.state.as_ref().ok_or(SmbError::UseAfterClose)?;
        let state = shared.try_borrow().map_err(|_| SmbError::Busy)?;
        Ok(Ref::map(state, |state| &state.backend))
    }

    /// Return a mutable reference to the backend
    pub fn backend_mut(&mut self) -> SmbResult<RefMut<'_, B>> {
        Ok(RefMut::map(self.state()?, |state| &mut state.backend))
    }

    /// Number of handles opened through this context and not closed yet
    pub fn open_handles(&self) -> SmbResult<usize> {
        Ok(self.state()?.open_handles)
    }

    // -- options

    pub fn get_server(&self) -> SmbResult<String> {
        Ok(self.state()?.options.server.clone())
    }

    pub fn get_workgroup(&self) -> SmbResult<Option<String>> {
        Ok(self.state()?.options.workgroup.clone())
    }

    pub fn set_workgroup<S: AsRef<str>>(&mut self, workgroup: S) -> SmbResult<()> {
        self.reconfigure(|options| options.workgroup = Some(workgroup.as_ref().to_string()))
    }

    pub fn get_user(&self) -> SmbResult<Option<String>> {
        Ok(self.state()?.options.user.clone())
    }

    pub fn set_user<S: AsRef<str>>(&mut self, user: S) -> SmbResult<()> {
        self.reconfigure(|options| options.user = Some(user.as_ref().to_string()))
    }

    pub fn get_debug(&self) -> SmbResult<i32> {
        Ok(self.state()?.options.debug)
    }

    pub fn set_debug(&mut self, level: i32) -> SmbResult<()> {
        self.reconfigure(|options| options.debug = level)
    }

    // -- handles

    /// Open the file at `path` for reading
    pub fn open<S: AsRef<str>>(&self, path: S) -> SmbResult<FileHandle<B>> {
        self.open_with(path, SmbOpenOptions::default().read(true))
    }

    /// Open the file at `path` with `options`.
    /// `path` is either a `smb://` URI or a path below the configured server.
    pub fn open_with<S: AsRef<str>>(
        &self,
        path: S,
        options: SmbOpenOptions,
    ) -> SmbResult<FileHandle<B>> {
        let shared = self.shared()?;
        let mut state = shared.try_borrow_mut().map_err(|_| SmbError::Busy)?;
        let uri = uri::resolve(&state.options.server, path.as_ref()).to_string();
        trace!("opening file at {} with flags {:#o}", uri, options.flags());
        let ContextState {
            backend, bridge, ..
        } = &mut *state;
        let result = backend.open(bridge, &uri, options.flags(), options.get_mode());
        let file = match (result, bridge.take_failure()) {
            (Ok(file), None) => file,
            (Ok(file), Some(err)) => {
                if let Err(errno) = backend.close(file) {
                    warn!("could not close {} after failed authentication: {}", uri, errno);
                }
                return Err(err);
            }
            (Err(_), Some(err)) => return Err(err),
            (Err(errno), None) => {
                error!("could not open {}: {}", uri, errno);
                return Err(SmbError::Open(errno));
            }
        };
        state.open_handles += 1;
        debug!("opened file {}", uri);
        Ok(FileHandle::new(Rc::downgrade(shared), file, uri))
    }

    /// Open the directory at `path`
    pub fn open_dir<S: AsRef<str>>(&self, path: S) -> SmbResult<DirHandle<B>> {
        let shared = self.shared()?;
        let mut state = shared.try_borrow_mut().map_err(|_| SmbError::Busy)?;
        let uri = uri::resolve(&state.options.server, path.as_ref()).to_string();
        trace!("opening directory at {}", uri);
        let ContextState {
            backend, bridge, ..
        } = &mut *state;
        let result = backend.open_dir(bridge, &uri);
        let dir = match (result, bridge.take_failure()) {
            (Ok(dir), None) => dir,
            (Ok(dir), Some(err)) => {
                if let Err(errno) = backend.close_dir(dir) {
                    warn!("could not close {} after failed authentication: {}", uri, errno);
                }
                return Err(err);
            }
            (Err(_), Some(err)) => return Err(err),
            (Err(errno), None) => {
                error!("could not open directory {}: {}", uri, errno);
                return Err(SmbError::Open(errno));
            }
        };
        state.open_handles += 1;
        debug!("opened directory {}", uri);
        Ok(DirHandle::new(Rc::downgrade(shared), dir, uri))
    }

    /// List the entries of the directory at `path`
    pub fn list_dir<S: AsRef<str>>(&self, path: S) -> SmbResult<Vec<SmbDirent>> {
        let mut dir = self.open_dir(path)?;
        let mut entries = Vec::new();
        let listed = loop {
            match dir.next_entry() {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => break Ok(entries),
                Err(err) => break Err(err),
            }
        };
        let closed = dir.close();
        let entries = listed?;
        closed?;
        Ok(entries)
    }

    // -- private

    fn shared(&self) -> SmbResult<&Rc<RefCell<ContextState<B>>>> {
        self.state.as_ref().ok_or(SmbError::UseAfterClose)
    }

    fn state(&self) -> SmbResult<RefMut<'_, ContextState<B>>> {
        self.shared()?
            .try_borrow_mut()
            .map_err(|_| SmbError::Busy)
    }

    fn reconfigure<F>(&mut self, f: F) -> SmbResult<()>
    where
        F: FnOnce(&mut SmbOptions),
    {
        let mut state = self.state()?;
        // the resolver was moved into the bridge on create
        let mut options = state.options.settings();
        f(&mut options);
        state.backend.configure(&options).map_err(|errno| {
            error!("could not configure smb context: {}", errno);
            SmbError::Init(errno)
        })?;
        state.options = options;
        Ok(())
    }
}

impl<B: SmbBackend> Drop for SmbContext<B> {
    fn drop(&mut self) {
        if self.state.is_some() {
            if let Err(err) = self.destroy() {
                error!("could not destroy smb context on drop: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod test {

    use std::cell::Cell;
    use std::io::{self, Read, SeekFrom, Write};

    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::*;
    use crate::auth::{CredentialOverflow, MissingResolver};
    use crate::backend::MemoryBackend;
    use crate::dirent::SmbDirentType;
    use crate::error::CredentialField;

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_file("smb://host/share/a.txt", b"hello world")
            .with_file("smb://host/share/two/1.txt", b"1")
            .with_file("smb://host/share/two/2.txt", b"2")
            .with_dir("smb://host/share/empty")
            .with_file("smb://host/share/secured.txt", b"secret data")
            .with_protected_share(
                "host",
                "private",
                AuthResponse::new("WORKGROUP", "alice", "secret"),
            )
            .with_file("smb://host/private/secured.txt", b"top secret")
    }

    fn init_context(options: SmbOptions) -> SmbContext<MemoryBackend> {
        SmbContext::create(options.server("smb://host"), backend()).unwrap()
    }

    #[test]
    fn should_create_context() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default().workgroup("pavao").user("test"));
        assert!(context.is_alive());
        assert!(context.backend().unwrap().is_initialized());
        assert_eq!(context.backend().unwrap().workgroup(), Some("pavao"));
        assert_eq!(context.get_server().unwrap().as_str(), "smb://host");
        assert_eq!(context.open_handles().unwrap(), 0);
    }

    #[test]
    fn should_fail_creating_context() {
        crate::mock::logger();
        assert_eq!(
            SmbContext::create(SmbOptions::default(), MemoryBackend::new().failing_init())
                .err()
                .unwrap(),
            SmbError::Init(Errno(libc::ENOMEM))
        );
    }

    #[test]
    fn should_not_open_missing_file() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        let err = context.open("/share/nofile.txt").err().unwrap();
        assert_eq!(err, SmbError::Open(Errno::NOT_FOUND));
        assert_eq!(err.errno(), Some(Errno::NOT_FOUND));
        assert_eq!(context.open_handles().unwrap(), 0);
    }

    #[test]
    fn should_ask_resolver_once_and_open() {
        crate::mock::logger();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let calls_ref = calls.clone();
        let context = init_context(SmbOptions::default().auth_resolver(move |req| {
            calls_ref
                .borrow_mut()
                .push((req.server.to_string(), req.share.to_string()));
            AuthResponse::new("WORKGROUP", "alice", "secret")
        }));
        let mut file = context.open("/share/secured.txt").unwrap();
        assert_eq!(
            calls.borrow().as_slice(),
            &[("host".to_string(), "share".to_string())]
        );
        let mut buf = String::new();
        file.read_to_string(&mut buf).unwrap();
        assert_eq!(buf.as_str(), "secret data");
        // the session is kept
        assert!(context.open("/share/a.txt").is_ok());
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn should_open_protected_share_with_resolver() {
        crate::mock::logger();
        let context = init_context(
            SmbOptions::default().auth_resolver(|_| AuthResponse::new("WORKGROUP", "alice", "secret")),
        );
        let mut file = context.open("/private/secured.txt").unwrap();
        let mut buf = Vec::new();
        io::copy(&mut file, &mut buf).unwrap();
        assert_eq!(buf.as_slice(), b"top secret");
    }

    #[test]
    fn should_deny_protected_share_without_credentials() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        assert_eq!(
            context.open("/private/secured.txt").err().unwrap(),
            SmbError::Open(Errno::PERMISSION_DENIED)
        );
    }

    #[test]
    fn should_fail_when_resolver_is_required() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default().missing_resolver(MissingResolver::Fail));
        // even public shares fail: the triggering operation is rejected
        assert_eq!(
            context.open("/share/a.txt").err().unwrap(),
            SmbError::AuthRequired {
                server: "host".to_string(),
                share: "share".to_string()
            }
        );
        assert_eq!(
            context.open_dir("/private").err().unwrap(),
            SmbError::AuthRequired {
                server: "host".to_string(),
                share: "private".to_string()
            }
        );
        assert_eq!(context.open_handles().unwrap(), 0);
    }

    #[test]
    fn should_reject_long_credentials() {
        crate::mock::logger();
        let context = SmbContext::create(
            SmbOptions::default()
                .server("smb://host")
                .credential_overflow(CredentialOverflow::Reject)
                .auth_resolver(|_| AuthResponse::new("WG", "alice-the-admin", "secret")),
            backend().with_credential_capacity(8),
        )
        .unwrap();
        assert_eq!(
            context.open("/share/a.txt").err().unwrap(),
            SmbError::CredentialTooLong {
                field: CredentialField::Username,
                capacity: 8
            }
        );
        assert_eq!(context.open_handles().unwrap(), 0);
    }

    #[test]
    fn should_truncate_long_credentials() {
        crate::mock::logger();
        let context = SmbContext::create(
            SmbOptions::default()
                .server("smb://host")
                .auth_resolver(|_| AuthResponse::new("WORKGR", "alice-the-admin", "secret")),
            MemoryBackend::new()
                .with_credential_capacity(7)
                .with_protected_share("host", "share", AuthResponse::new("WORKGR", "alice-", "secret"))
                .with_file("smb://host/share/a.txt", b"a"),
        )
        .unwrap();
        assert!(context.open("/share/a.txt").is_ok());
    }

    #[test]
    fn should_replace_resolver() {
        crate::mock::logger();
        let mut context =
            init_context(SmbOptions::default().auth_resolver(|_| AuthResponse::new("WORKGROUP", "bob", "nope")));
        assert_eq!(
            context.open_dir("/private").err().unwrap(),
            SmbError::Open(Errno::PERMISSION_DENIED)
        );
        context
            .set_auth_resolver(|_| AuthResponse::new("WORKGROUP", "alice", "secret"))
            .unwrap();
        assert!(context.open_dir("/private").is_ok());
        assert!(context.clear_auth_resolver().is_ok());
    }

    #[test]
    fn should_enumerate_two_entries_then_end() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        let mut dir = context.open_dir("/share/two").unwrap();
        assert_eq!(
            dir.next_entry().unwrap(),
            Some(SmbDirent::new(SmbDirentType::File, "1.txt", ""))
        );
        assert_eq!(
            dir.next_entry().unwrap(),
            Some(SmbDirent::new(SmbDirentType::File, "2.txt", ""))
        );
        assert_eq!(dir.next_entry().unwrap(), None);
        assert_eq!(dir.next_entry().unwrap(), None);
        assert!(dir.close().is_ok());
    }

    #[test]
    fn should_enumerate_exactly_n_entries() {
        crate::mock::logger();
        for n in 0..6 {
            let mut backend = MemoryBackend::new().with_dir("smb://host/share/dir");
            for i in 0..n {
                backend = backend.with_file(format!("smb://host/share/dir/{}.bin", i), b"");
            }
            let context =
                SmbContext::create(SmbOptions::default().server("smb://host"), backend).unwrap();
            let mut dir = context.open_dir("/share/dir").unwrap();
            let mut count = 0;
            while let Some(entry) = dir.next_entry().unwrap() {
                assert_eq!(entry.get_type(), SmbDirentType::File);
                count += 1;
            }
            assert_eq!(count, n);
            assert_eq!(dir.next_entry().unwrap(), None);
        }
    }

    #[test]
    fn should_list_dir() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        let names: Vec<String> = context
            .list_dir("/share")
            .unwrap()
            .into_iter()
            .map(|entry| entry.name().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "empty", "secured.txt", "two"]);
        assert!(context.list_dir("/share/empty").unwrap().is_empty());
        let shares = context.list_dir("/").unwrap();
        assert_eq!(shares.len(), 2);
        assert!(shares
            .iter()
            .all(|share| share.get_type() == SmbDirentType::FileShare));
        assert_eq!(
            context.list_dir("/share/a.txt").err().unwrap(),
            SmbError::Open(Errno::NOT_A_DIRECTORY)
        );
        assert_eq!(context.open_handles().unwrap(), 0);
    }

    #[test]
    fn should_write_and_read_back() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        let mut rng = rand::thread_rng();
        for _ in 0..16 {
            let payload: Vec<u8> = (0..rng.gen_range(1..512)).map(|_| rng.gen()).collect();
            let offset: u64 = rng.gen_range(0..1024);
            let mut file = context
                .open_with(
                    "/share/round-trip.bin",
                    SmbOpenOptions::default()
                        .read(true)
                        .write(true)
                        .create(true),
                )
                .unwrap();
            assert_eq!(file.seek(SeekFrom::Start(offset)).unwrap(), offset);
            file.write_all(&payload).unwrap();
            assert_eq!(file.seek(SeekFrom::Start(offset)).unwrap(), offset);
            let mut buf = vec![0u8; payload.len()];
            file.read_exact(&mut buf).unwrap();
            assert_eq!(buf, payload);
            assert!(file.close().is_ok());
        }
        assert_eq!(context.open_handles().unwrap(), 0);
    }

    #[test]
    fn should_read_to_end_of_file() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        let mut file = context.open("smb://host/share/a.txt").unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 8);
        assert_eq!(&buf, b"hello wo");
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        assert_eq!(file.seek(SeekFrom::End(-5)).unwrap(), 6);
        assert_eq!(file.seek(SeekFrom::Current(1)).unwrap(), 7);
        assert_eq!(file.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"orld");
    }

    #[test]
    fn should_report_seek_errors() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        let mut file = context.open("/share/a.txt").unwrap();
        assert_eq!(
            file.seek(SeekFrom::Current(-1)).err().unwrap(),
            SmbError::Seek(Errno::INVALID_ARGUMENT)
        );
        assert_eq!(
            file.seek(SeekFrom::Start(u64::MAX)).err().unwrap(),
            SmbError::Seek(Errno(libc::EOVERFLOW))
        );
    }

    #[test]
    fn should_report_io_errors() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        let mut file = context.open("/share/a.txt").unwrap();
        assert_eq!(
            file.write(b"nope").err().unwrap(),
            SmbError::Io(Errno::BAD_DESCRIPTOR)
        );
    }

    #[test]
    fn should_not_use_handles_after_close() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        let mut file = context.open("/share/a.txt").unwrap();
        assert_eq!(context.open_handles().unwrap(), 1);
        assert!(file.is_open());
        assert!(file.close().is_ok());
        assert!(!file.is_open());
        assert_eq!(context.open_handles().unwrap(), 0);
        let mut buf = [0u8; 4];
        assert_eq!(file.read(&mut buf).err().unwrap(), SmbError::UseAfterClose);
        assert_eq!(file.write(b"x").err().unwrap(), SmbError::UseAfterClose);
        assert_eq!(
            file.seek(SeekFrom::Start(0)).err().unwrap(),
            SmbError::UseAfterClose
        );
        assert_eq!(file.close().err().unwrap(), SmbError::UseAfterClose);
        let mut dir = context.open_dir("/share").unwrap();
        assert!(dir.close().is_ok());
        assert_eq!(dir.next_entry().err().unwrap(), SmbError::UseAfterClose);
        assert_eq!(dir.close().err().unwrap(), SmbError::UseAfterClose);
        assert!(dir.next().is_none());
    }

    #[test]
    fn should_close_handles_on_drop() {
        crate::mock::logger();
        let context = init_context(SmbOptions::default());
        {
            let _file = context.open("/share/a.txt").unwrap();
            let _dir = context.open_dir("/share").unwrap();
            assert_eq!(context.open_handles().unwrap(), 2);
        }
        assert_eq!(context.open_handles().unwrap(), 0);
    }

    #[test]
    fn should_destroy_context() {
        crate::mock::logger();
        let mut context = init_context(SmbOptions::default());
        let mut file = context.open("/share/a.txt").unwrap();
        let mut dir = context.open_dir("/share").unwrap();
        assert!(context.destroy().is_ok());
        assert!(!context.is_alive());
        // handles are invalidated with the context
        assert!(!file.is_open());
        let mut buf = [0u8; 4];
        assert_eq!(file.read(&mut buf).err().unwrap(), SmbError::UseAfterClose);
        assert_eq!(dir.next_entry().err().unwrap(), SmbError::UseAfterClose);
        assert_eq!(file.close().err().unwrap(), SmbError::UseAfterClose);
        // context
        assert_eq!(context.destroy().err().unwrap(), SmbError::UseAfterClose);
        assert_eq!(
            context.open("/share/a.txt").err().unwrap(),
            SmbError::UseAfterClose
        );
        assert_eq!(
            context.open_dir("/share").err().unwrap(),
            SmbError::UseAfterClose
        );
        assert_eq!(
            context.set_workgroup("pavao").err().unwrap(),
            SmbError::UseAfterClose
        );
        assert!(context.backend().is_err());
    }

    #[test]
    fn should_get_and_set_options() {
        crate::mock::logger();
        let mut context = init_context(SmbOptions::default().debug(1));
        assert_eq!(context.get_workgroup().unwrap(), None);
        assert_eq!(context.get_debug().unwrap(), 1);
        context.set_workgroup("pavao").unwrap();
        context.set_user("test").unwrap();
        context.set_debug(4).unwrap();
        assert_eq!(context.get_workgroup().unwrap().as_deref(), Some("pavao"));
        assert_eq!(context.get_user().unwrap().as_deref(), Some("test"));
        assert_eq!(context.get_debug().unwrap(), 4);
        let backend = context.backend().unwrap();
        assert_eq!(backend.workgroup(), Some("pavao"));
        assert_eq!(backend.user(), Some("test"));
        assert_eq!(backend.debug(), 4);
    }

    #[test]
    fn should_keep_options_when_reconfiguration_fails() {
        crate::mock::logger();
        let mut context = init_context(SmbOptions::default().workgroup("pavao"));
        context.backend_mut().unwrap().fail_configure(true);
        assert_eq!(
            context.set_workgroup("other").err().unwrap(),
            SmbError::Init(Errno::INVALID_ARGUMENT)
        );
        assert_eq!(context.get_workgroup().unwrap().as_deref(), Some("pavao"));
        assert_eq!(context.backend().unwrap().workgroup(), Some("pavao"));
        context.backend_mut().unwrap().fail_configure(false);
        context.set_workgroup("other").unwrap();
        assert_eq!(context.get_workgroup().unwrap().as_deref(), Some("other"));
    }

    #[test]
    fn should_give_mutable_access_to_backend() {
        crate::mock::logger();
        let mut context = init_context(SmbOptions::default());
        assert!(!context.backend_mut().unwrap().is_shut_down());
    }

    #[test]
    fn should_not_reenter_context_from_resolver() {
        crate::mock::logger();
        let context = Rc::new(RefCell::new(None::<SmbContext<MemoryBackend>>));
        let inner = context.clone();
        let reentered = Rc::new(Cell::new(None));
        let outcome = reentered.clone();
        let created = init_context(SmbOptions::default().auth_resolver(move |_| {
            if let Some(context) = inner.borrow().as_ref() {
                outcome.set(Some(context.open("/share/a.txt").err()));
            }
            AuthResponse::anonymous()
        }));
        *context.borrow_mut() = Some(created);
        assert!(context
            .borrow()
            .as_ref()
            .unwrap()
            .open("/share/a.txt")
            .is_ok());
        assert_eq!(reentered.take(), Some(Some(SmbError::Busy)));
        // break the cycle between the context and its resolver
        context.borrow_mut().take();
    }
}
