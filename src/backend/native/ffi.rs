//! # ffi
//!
//! libsmbclient declarations used by the native backend

#![allow(non_camel_case_types, non_snake_case)]

use libc::{c_char, c_int, c_uint, c_void, mode_t, size_t, ssize_t};

/// Opaque `SMBCCTX`
#[repr(C)]
pub struct SMBCCTX {
    _private: [u8; 0],
}

/// Opaque `SMBCFILE`
#[repr(C)]
pub struct SMBCFILE {
    _private: [u8; 0],
}

/// `struct smbc_dirent`; `name` is NUL-terminated and extends past the struct
#[repr(C)]
pub struct smbc_dirent {
    pub smbc_type: c_uint,
    pub dirlen: c_uint,
    pub commentlen: c_uint,
    pub comment: *mut c_char,
    pub namelen: c_uint,
    pub name: [c_char; 1],
}

pub type smbc_bool = c_int;

/// libsmbclient is always built with large file support, so its `off_t` is
/// 64 bits wide even where the platform default is 32
pub type smbc_off_t = i64;

pub const SMBC_ENCRYPTLEVEL_NONE: c_int = 0;
pub const SMBC_ENCRYPTLEVEL_REQUEST: c_int = 1;
pub const SMBC_ENCRYPTLEVEL_REQUIRE: c_int = 2;

pub type smbc_get_auth_data_with_context_fn = extern "C" fn(
    c: *mut SMBCCTX,
    srv: *const c_char,
    shr: *const c_char,
    wg: *mut c_char,
    wglen: c_int,
    un: *mut c_char,
    unlen: c_int,
    pw: *mut c_char,
    pwlen: c_int,
);

pub type smbc_open_fn = Option<
    unsafe extern "C" fn(
        c: *mut SMBCCTX,
        fname: *const c_char,
        flags: c_int,
        mode: mode_t,
    ) -> *mut SMBCFILE,
>;
pub type smbc_read_fn = Option<
    unsafe extern "C" fn(
        c: *mut SMBCCTX,
        file: *mut SMBCFILE,
        buf: *mut c_void,
        count: size_t,
    ) -> ssize_t,
>;
pub type smbc_write_fn = Option<
    unsafe extern "C" fn(
        c: *mut SMBCCTX,
        file: *mut SMBCFILE,
        buf: *const c_void,
        count: size_t,
    ) -> ssize_t,
>;
pub type smbc_lseek_fn = Option<
    unsafe extern "C" fn(
        c: *mut SMBCCTX,
        file: *mut SMBCFILE,
        offset: smbc_off_t,
        whence: c_int,
    ) -> smbc_off_t,
>;
pub type smbc_close_fn =
    Option<unsafe extern "C" fn(c: *mut SMBCCTX, file: *mut SMBCFILE) -> c_int>;
pub type smbc_opendir_fn =
    Option<unsafe extern "C" fn(c: *mut SMBCCTX, fname: *const c_char) -> *mut SMBCFILE>;
pub type smbc_readdir_fn =
    Option<unsafe extern "C" fn(c: *mut SMBCCTX, dir: *mut SMBCFILE) -> *mut smbc_dirent>;
pub type smbc_closedir_fn =
    Option<unsafe extern "C" fn(c: *mut SMBCCTX, dir: *mut SMBCFILE) -> c_int>;

#[link(name = "smbclient")]
extern "C" {
    pub fn smbc_new_context() -> *mut SMBCCTX;
    pub fn smbc_init_context(context: *mut SMBCCTX) -> *mut SMBCCTX;
    pub fn smbc_free_context(context: *mut SMBCCTX, shutdown_ctx: c_int) -> c_int;

    pub fn smbc_setDebug(c: *mut SMBCCTX, debug: c_int);
    pub fn smbc_setNetbiosName(c: *mut SMBCCTX, netbios_name: *const c_char);
    pub fn smbc_setWorkgroup(c: *mut SMBCCTX, workgroup: *const c_char);
    pub fn smbc_setUser(c: *mut SMBCCTX, user: *const c_char);
    pub fn smbc_setTimeout(c: *mut SMBCCTX, timeout: c_int);
    pub fn smbc_setOptionSmbEncryptionLevel(c: *mut SMBCCTX, level: c_int);
    pub fn smbc_setOptionCaseSensitive(c: *mut SMBCCTX, b: smbc_bool);
    pub fn smbc_setOptionOneSharePerServer(c: *mut SMBCCTX, b: smbc_bool);
    pub fn smbc_setOptionUseKerberos(c: *mut SMBCCTX, b: smbc_bool);
    pub fn smbc_setOptionFallbackAfterKerberos(c: *mut SMBCCTX, b: smbc_bool);
    pub fn smbc_setOptionNoAutoAnonymousLogin(c: *mut SMBCCTX, b: smbc_bool);
    pub fn smbc_setOptionUserData(c: *mut SMBCCTX, user_data: *mut c_void);
    pub fn smbc_getOptionUserData(c: *mut SMBCCTX) -> *mut c_void;
    pub fn smbc_setFunctionAuthDataWithContext(
        c: *mut SMBCCTX,
        f: smbc_get_auth_data_with_context_fn,
    );

    pub fn smbc_getFunctionOpen(c: *mut SMBCCTX) -> smbc_open_fn;
    pub fn smbc_getFunctionRead(c: *mut SMBCCTX) -> smbc_read_fn;
    pub fn smbc_getFunctionWrite(c: *mut SMBCCTX) -> smbc_write_fn;
    pub fn smbc_getFunctionLseek(c: *mut SMBCCTX) -> smbc_lseek_fn;
    pub fn smbc_getFunctionClose(c: *mut SMBCCTX) -> smbc_close_fn;
    pub fn smbc_getFunctionOpendir(c: *mut SMBCCTX) -> smbc_opendir_fn;
    pub fn smbc_getFunctionReaddir(c: *mut SMBCCTX) -> smbc_readdir_fn;
    pub fn smbc_getFunctionClosedir(c: *mut SMBCCTX) -> smbc_closedir_fn;
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_use_64_bit_offsets() {
        assert_eq!(std::mem::size_of::<smbc_off_t>(), 8);
        // offsets past 2 GiB and the -1 error sentinel are representable
        assert!(smbc_off_t::try_from(3u64 << 30).is_ok());
        assert_eq!(smbc_off_t::from(-1i32), -1);
    }
}
