//! # native
//!
//! Backend calling libsmbclient. Every operation is resolved through the
//! context function table; credential requests reach the context's
//! [`AuthBridge`] through the user data pointer, which is only set for the
//! duration of a call.

mod ffi;
mod trampoline;

use std::ffi::{CStr, CString};
use std::ptr;

use libc::{c_int, c_void, mode_t};

use self::ffi::{SMBCCTX, SMBCFILE};
use self::trampoline::auth_trampoline;
use super::{SmbBackend, Whence};
use crate::auth::AuthBridge;
use crate::dirent::{SmbDirent, SmbDirentType};
use crate::error::{Errno, SmbError, SmbResult};
use crate::options::{SmbEncryptionLevel, SmbOptions};

/// Open file of [`NativeBackend`]
#[derive(Debug)]
pub struct NativeFile(*mut SMBCFILE);

/// Open directory stream of [`NativeBackend`]
#[derive(Debug)]
pub struct NativeDir(*mut SMBCFILE);

/// libsmbclient context
#[derive(Debug)]
pub struct NativeBackend {
    ctx: *mut SMBCCTX,
}

impl NativeBackend {
    /// Allocate a new libsmbclient context
    pub fn new() -> SmbResult<Self> {
        let ctx = unsafe { ffi::smbc_new_context() };
        if ctx.is_null() {
            let errno = Errno::last();
            error!("could not allocate smb context: {}", errno);
            return Err(SmbError::Init(errno));
        }
        trace!("allocated smb context");
        Ok(Self { ctx })
    }

    fn context(&self) -> Result<*mut SMBCCTX, Errno> {
        if self.ctx.is_null() {
            Err(Errno::BAD_DESCRIPTOR)
        } else {
            Ok(self.ctx)
        }
    }

    /// Run `f` with `auth` published as the context user data
    fn with_auth<T, F>(&mut self, auth: &mut AuthBridge, f: F) -> Result<T, Errno>
    where
        F: FnOnce(*mut SMBCCTX) -> Result<T, Errno>,
    {
        let ctx = self.context()?;
        unsafe { ffi::smbc_setOptionUserData(ctx, auth as *mut AuthBridge as *mut c_void) };
        let result = f(ctx);
        unsafe { ffi::smbc_setOptionUserData(ctx, ptr::null_mut()) };
        result
    }
}

impl Drop for NativeBackend {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            debug!("freeing smb context on drop");
            unsafe { ffi::smbc_free_context(self.ctx, 1) };
            self.ctx = ptr::null_mut();
        }
    }
}

impl SmbBackend for NativeBackend {
    type File = NativeFile;
    type Dir = NativeDir;

    fn configure(&mut self, options: &SmbOptions) -> Result<(), Errno> {
        let ctx = self.context()?;
        let workgroup = options.workgroup.as_deref().map(to_cstring).transpose()?;
        let user = options.user.as_deref().map(to_cstring).transpose()?;
        let netbios_name = options.netbios_name.as_deref().map(to_cstring).transpose()?;
        let encryption_level = match options.encryption_level {
            SmbEncryptionLevel::None => ffi::SMBC_ENCRYPTLEVEL_NONE,
            SmbEncryptionLevel::Request => ffi::SMBC_ENCRYPTLEVEL_REQUEST,
            SmbEncryptionLevel::Require => ffi::SMBC_ENCRYPTLEVEL_REQUIRE,
        };
        // the library copies every string it is given
        unsafe {
            ffi::smbc_setDebug(ctx, options.debug);
            if let Some(workgroup) = &workgroup {
                ffi::smbc_setWorkgroup(ctx, workgroup.as_ptr());
            }
            if let Some(user) = &user {
                ffi::smbc_setUser(ctx, user.as_ptr());
            }
            if let Some(netbios_name) = &netbios_name {
                ffi::smbc_setNetbiosName(ctx, netbios_name.as_ptr());
            }
            if let Some(timeout) = options.timeout {
                ffi::smbc_setTimeout(
                    ctx,
                    c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX),
                );
            }
            ffi::smbc_setOptionSmbEncryptionLevel(ctx, encryption_level);
            ffi::smbc_setOptionCaseSensitive(ctx, options.case_sensitive as c_int);
            ffi::smbc_setOptionOneSharePerServer(ctx, options.one_share_per_server as c_int);
            ffi::smbc_setOptionUseKerberos(ctx, options.use_kerberos as c_int);
            ffi::smbc_setOptionFallbackAfterKerberos(
                ctx,
                options.fallback_after_kerberos as c_int,
            );
            ffi::smbc_setOptionNoAutoAnonymousLogin(
                ctx,
                options.no_auto_anonymous_login as c_int,
            );
        }
        Ok(())
    }

    fn init(&mut self) -> Result<(), Errno> {
        let ctx = self.context()?;
        unsafe {
            ffi::smbc_setOptionUserData(ctx, ptr::null_mut());
            ffi::smbc_setFunctionAuthDataWithContext(ctx, auth_trampoline);
            if ffi::smbc_init_context(ctx).is_null() {
                return Err(Errno::last());
            }
        }
        debug!("smb context initialized");
        Ok(())
    }

    fn open(
        &mut self,
        auth: &mut AuthBridge,
        uri: &str,
        flags: i32,
        mode: u32,
    ) -> Result<Self::File, Errno> {
        let uri = to_cstring(uri)?;
        self.with_auth(auth, |ctx| unsafe {
            let open = ffi::smbc_getFunctionOpen(ctx).ok_or(Errno::INVALID_ARGUMENT)?;
            let file = open(ctx, uri.as_ptr(), flags, mode as mode_t);
            if file.is_null() {
                Err(Errno::last())
            } else {
                Ok(NativeFile(file))
            }
        })
    }

    fn open_dir(&mut self, auth: &mut AuthBridge, uri: &str) -> Result<Self::Dir, Errno> {
        let uri = to_cstring(uri)?;
        self.with_auth(auth, |ctx| unsafe {
            let opendir = ffi::smbc_getFunctionOpendir(ctx).ok_or(Errno::INVALID_ARGUMENT)?;
            let dir = opendir(ctx, uri.as_ptr());
            if dir.is_null() {
                Err(Errno::last())
            } else {
                Ok(NativeDir(dir))
            }
        })
    }

    fn read(
        &mut self,
        auth: &mut AuthBridge,
        file: &mut Self::File,
        buf: &mut [u8],
    ) -> Result<usize, Errno> {
        self.with_auth(auth, |ctx| unsafe {
            let read = ffi::smbc_getFunctionRead(ctx).ok_or(Errno::INVALID_ARGUMENT)?;
            let count = read(ctx, file.0, buf.as_mut_ptr() as *mut c_void, buf.len());
            usize::try_from(count).map_err(|_| Errno::last())
        })
    }

    fn write(
        &mut self,
        auth: &mut AuthBridge,
        file: &mut Self::File,
        buf: &[u8],
    ) -> Result<usize, Errno> {
        self.with_auth(auth, |ctx| unsafe {
            let write = ffi::smbc_getFunctionWrite(ctx).ok_or(Errno::INVALID_ARGUMENT)?;
            let count = write(ctx, file.0, buf.as_ptr() as *const c_void, buf.len());
            usize::try_from(count).map_err(|_| Errno::last())
        })
    }

    fn seek(
        &mut self,
        auth: &mut AuthBridge,
        file: &mut Self::File,
        offset: i64,
        whence: Whence,
    ) -> Result<u64, Errno> {
        self.with_auth(auth, |ctx| unsafe {
            let lseek = ffi::smbc_getFunctionLseek(ctx).ok_or(Errno::INVALID_ARGUMENT)?;
            let position = lseek(ctx, file.0, offset, whence.to_raw());
            u64::try_from(position).map_err(|_| Errno::last())
        })
    }

    fn read_dir(
        &mut self,
        auth: &mut AuthBridge,
        dir: &mut Self::Dir,
    ) -> Result<Option<SmbDirent>, Errno> {
        self.with_auth(auth, |ctx| unsafe {
            let readdir = ffi::smbc_getFunctionReaddir(ctx).ok_or(Errno::INVALID_ARGUMENT)?;
            loop {
                // NULL is both the end of the stream and a failure; errno tells
                errno::set_errno(errno::Errno(0));
                let dirent = readdir(ctx, dir.0);
                let Some(dirent) = dirent.as_ref() else {
                    return match errno::errno().0 {
                        0 => Ok(None),
                        code => Err(Errno(code)),
                    };
                };
                let name = CStr::from_ptr(dirent.name.as_ptr())
                    .to_string_lossy()
                    .to_string();
                if name == "." || name == ".." {
                    continue;
                }
                let comment = if dirent.comment.is_null() {
                    String::new()
                } else {
                    CStr::from_ptr(dirent.comment).to_string_lossy().to_string()
                };
                let kind = SmbDirentType::try_from(dirent.smbc_type).map_err(|kind| {
                    error!("unknown directory entry type {}", kind);
                    Errno::IO
                })?;
                return Ok(Some(SmbDirent::new(kind, name, comment)));
            }
        })
    }

    fn close(&mut self, file: Self::File) -> Result<(), Errno> {
        let ctx = self.context()?;
        unsafe {
            let close = ffi::smbc_getFunctionClose(ctx).ok_or(Errno::INVALID_ARGUMENT)?;
            if close(ctx, file.0) < 0 {
                return Err(Errno::last());
            }
        }
        Ok(())
    }

    fn close_dir(&mut self, dir: Self::Dir) -> Result<(), Errno> {
        let ctx = self.context()?;
        unsafe {
            let closedir = ffi::smbc_getFunctionClosedir(ctx).ok_or(Errno::INVALID_ARGUMENT)?;
            if closedir(ctx, dir.0) < 0 {
                return Err(Errno::last());
            }
        }
        Ok(())
    }

    fn shutdown(&mut self, force: bool) -> Result<(), Errno> {
        let ctx = self.context()?;
        if unsafe { ffi::smbc_free_context(ctx, force as c_int) } != 0 {
            return Err(Errno::last());
        }
        self.ctx = ptr::null_mut();
        debug!("smb context freed");
        Ok(())
    }
}

fn to_cstring(s: &str) -> Result<CString, Errno> {
    CString::new(s).map_err(|_| Errno::INVALID_ARGUMENT)
}

#[cfg(test)]
#[cfg(feature = "with-containers")]
mod test {

    use std::cell::Cell;
    use std::io::{Read, Seek, SeekFrom, Write};
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    use serial_test::serial;

    use crate::{AuthResponse, SmbContext, SmbOpenOptions, SmbOptions};

    use super::*;

    #[test]
    #[serial]
    fn should_list_shares() {
        crate::mock::logger();
        let context = init_context();
        let shares = context.list_dir("smb://localhost:3445").unwrap();
        assert!(shares.iter().any(|share| share.name() == "temp"));
        finalize_context(context);
    }

    #[test]
    #[serial]
    fn should_not_open_missing_file() {
        crate::mock::logger();
        let context = init_context();
        assert_eq!(
            context.open("/nofile.txt").err().unwrap(),
            SmbError::Open(Errno::NOT_FOUND)
        );
        finalize_context(context);
    }

    #[test]
    #[serial]
    fn should_write_and_read_back() {
        crate::mock::logger();
        let context = init_context();
        let name = format!("/{}.txt", random_name());
        let mut file = context
            .open_with(
                &name,
                SmbOpenOptions::default()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true),
            )
            .unwrap();
        file.write_all(b"test data\n").unwrap();
        assert_eq!(file.seek(SeekFrom::Start(5)).unwrap(), 5);
        let mut buf = String::new();
        file.read_to_string(&mut buf).unwrap();
        assert_eq!(buf.as_str(), "data\n");
        assert!(file.close().is_ok());
        assert!(context
            .list_dir("/")
            .unwrap()
            .iter()
            .any(|entry| format!("/{}", entry.name()) == name));
        finalize_context(context);
    }

    #[test]
    #[serial]
    fn should_not_read_after_close() {
        crate::mock::logger();
        let context = init_context();
        let mut dir = context.open_dir("/").unwrap();
        assert!(dir.close().is_ok());
        assert_eq!(dir.next_entry().unwrap_err(), SmbError::UseAfterClose);
        assert_eq!(dir.close().unwrap_err(), SmbError::UseAfterClose);
        finalize_context(context);
    }

    #[test]
    #[serial]
    fn should_ask_credentials_to_resolver() {
        crate::mock::logger();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let context = SmbContext::native(
            SmbOptions::default()
                .server("smb://localhost:3445/temp")
                .one_share_per_server(true)
                .auth_resolver(move |req| {
                    assert_eq!(req.server, "localhost");
                    counter.set(counter.get() + 1);
                    AuthResponse::new("pavao", "test", "test")
                }),
        )
        .unwrap();
        assert!(context.list_dir("/").is_ok());
        assert!(calls.get() >= 1);
        finalize_context(context);
    }

    fn init_context() -> SmbContext<NativeBackend> {
        SmbContext::native(
            SmbOptions::default()
                .server("smb://localhost:3445/temp")
                .workgroup("pavao")
                .case_sensitive(true)
                .one_share_per_server(true)
                .auth_resolver(|_| AuthResponse::new("pavao", "test", "test")),
        )
        .unwrap()
    }

    fn finalize_context(mut context: SmbContext<NativeBackend>) {
        assert!(context.destroy().is_ok());
    }

    fn random_name() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect()
    }
}
