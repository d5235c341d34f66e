//! # trampoline
//!
//! Credential callback handed to libsmbclient. It forwards each request to the
//! [`AuthBridge`] published as the context user data.

use std::ffi::CStr;
use std::panic::{self, AssertUnwindSafe};

use libc::{c_char, c_int};

use super::ffi::{self, SMBCCTX};
use crate::auth::{AuthBridge, AuthRequest, CredentialBuffers};

/// Output buffer as handed by libsmbclient: pointer and capacity
type RawBuffer = (*mut c_char, c_int);

/// Credential callback registered on every context
pub(super) extern "C" fn auth_trampoline(
    ctx: *mut SMBCCTX,
    srv: *const c_char,
    shr: *const c_char,
    wg: *mut c_char,
    wglen: c_int,
    un: *mut c_char,
    unlen: c_int,
    pw: *mut c_char,
    pwlen: c_int,
) {
    unsafe {
        let bridge = ffi::smbc_getOptionUserData(ctx) as *mut AuthBridge;
        supply_credentials(bridge, srv, shr, [(wg, wglen), (un, unlen), (pw, pwlen)]);
    }
}

/// Answer a credential request through `bridge`.
///
/// Never unwinds: a panicking resolver, like a missing bridge, leaves empty
/// strings in every buffer.
///
/// # Safety
///
/// `bridge` is null or valid for the call; `srv` and `shr` are null or
/// NUL-terminated; each buffer is null or writable for its capacity.
pub(super) unsafe fn supply_credentials(
    bridge: *mut AuthBridge,
    srv: *const c_char,
    shr: *const c_char,
    out: [RawBuffer; 3],
) {
    let [wg, un, pw] = out;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
        let server = c_str_lossy(srv);
        let share = c_str_lossy(shr);
        let out = CredentialBuffers {
            domain: out_buffer(wg),
            username: out_buffer(un),
            password: out_buffer(pw),
        };
        match bridge.as_mut() {
            Some(bridge) => bridge.supply(
                AuthRequest {
                    server: &server,
                    share: &share,
                },
                out,
            ),
            None => {
                warn!(
                    "credentials requested for {}/{} outside of an operation",
                    server, share
                );
                clear(out.domain);
                clear(out.username);
                clear(out.password);
            }
        }
    }));
    if outcome.is_err() {
        error!("authentication resolver panicked; supplying empty credentials");
        for buf in [wg, un, pw] {
            unsafe { clear(out_buffer(buf)) };
        }
    }
}

unsafe fn c_str_lossy(s: *const c_char) -> String {
    if s.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(s) }.to_string_lossy().to_string()
    }
}

unsafe fn out_buffer<'a>((buf, len): RawBuffer) -> &'a mut [u8] {
    match usize::try_from(len) {
        Ok(len) if len > 0 && !buf.is_null() => unsafe {
            std::slice::from_raw_parts_mut(buf as *mut u8, len)
        },
        _ => &mut [],
    }
}

fn clear(buf: &mut [u8]) {
    if let Some(first) = buf.first_mut() {
        *first = 0;
    }
}
