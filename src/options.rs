//! # options
//!
//! Smb context and open options

use std::fmt;
use std::time::Duration;

use crate::auth::{AuthRequest, AuthResolver, AuthResponse, CredentialOverflow, MissingResolver};

/// Access mode bits of open flags
const ACCESS_MODE: i32 = libc::O_RDONLY | libc::O_WRONLY | libc::O_RDWR;

/// Smb encryption level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmbEncryptionLevel {
    #[default]
    None,
    Request,
    Require,
}

/// Smb context options.
///
/// Paths given to the context which are not `smb://` URIs are joined onto
/// `server`.
pub struct SmbOptions {
    pub(crate) server: String,
    pub(crate) workgroup: Option<String>,
    pub(crate) user: Option<String>,
    pub(crate) netbios_name: Option<String>,
    pub(crate) debug: i32,
    pub(crate) timeout: Option<Duration>,
    pub(crate) encryption_level: SmbEncryptionLevel,
    pub(crate) case_sensitive: bool,
    pub(crate) one_share_per_server: bool,
    pub(crate) use_kerberos: bool,
    pub(crate) fallback_after_kerberos: bool,
    pub(crate) no_auto_anonymous_login: bool,
    pub(crate) credential_overflow: CredentialOverflow,
    pub(crate) missing_resolver: MissingResolver,
    pub(crate) auth_resolver: Option<AuthResolver>,
}

impl Default for SmbOptions {
    fn default() -> Self {
        Self {
            server: String::from("smb://localhost"),
            workgroup: None,
            user: None,
            netbios_name: None,
            debug: 0,
            timeout: None,
            encryption_level: SmbEncryptionLevel::default(),
            case_sensitive: false,
            one_share_per_server: false,
            use_kerberos: false,
            fallback_after_kerberos: false,
            no_auto_anonymous_login: false,
            credential_overflow: CredentialOverflow::default(),
            missing_resolver: MissingResolver::default(),
            auth_resolver: None,
        }
    }
}

impl fmt::Debug for SmbOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmbOptions")
            .field("server", &self.server)
            .field("workgroup", &self.workgroup)
            .field("user", &self.user)
            .field("netbios_name", &self.netbios_name)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .field("encryption_level", &self.encryption_level)
            .field("case_sensitive", &self.case_sensitive)
            .field("one_share_per_server", &self.one_share_per_server)
            .field("use_kerberos", &self.use_kerberos)
            .field("fallback_after_kerberos", &self.fallback_after_kerberos)
            .field("no_auto_anonymous_login", &self.no_auto_anonymous_login)
            .field("credential_overflow", &self.credential_overflow)
            .field("missing_resolver", &self.missing_resolver)
            .field("auth_resolver", &self.auth_resolver.is_some())
            .finish()
    }
}

impl SmbOptions {
    /// Copy of every option but the resolver
    pub(crate) fn settings(&self) -> Self {
        Self {
            server: self.server.clone(),
            workgroup: self.workgroup.clone(),
            user: self.user.clone(),
            netbios_name: self.netbios_name.clone(),
            debug: self.debug,
            timeout: self.timeout,
            encryption_level: self.encryption_level,
            case_sensitive: self.case_sensitive,
            one_share_per_server: self.one_share_per_server,
            use_kerberos: self.use_kerberos,
            fallback_after_kerberos: self.fallback_after_kerberos,
            no_auto_anonymous_login: self.no_auto_anonymous_login,
            credential_overflow: self.credential_overflow,
            missing_resolver: self.missing_resolver,
            auth_resolver: None,
        }
    }

    /// Construct SmbOptions with the server URI (e.g. `smb://localhost:445`)
    pub fn server<S: AsRef<str>>(mut self, server: S) -> Self {
        self.server = server.as_ref().to_string();
        self
    }

    /// Construct SmbOptions with the provided workgroup
    pub fn workgroup<S: AsRef<str>>(mut self, workgroup: S) -> Self {
        self.workgroup = Some(workgroup.as_ref().to_string());
        self
    }

    /// Construct SmbOptions with the default username
    pub fn user<S: AsRef<str>>(mut self, user: S) -> Self {
        self.user = Some(user.as_ref().to_string());
        self
    }

    /// Construct SmbOptions with the netbios name of the client
    pub fn netbios_name<S: AsRef<str>>(mut self, name: S) -> Self {
        self.netbios_name = Some(name.as_ref().to_string());
        self
    }

    /// Set the library debug level (0 to 10)
    pub fn debug(mut self, level: i32) -> Self {
        self.debug = level;
        self
    }

    /// Set the library timeout for network operations
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn encryption_level(mut self, level: SmbEncryptionLevel) -> Self {
        self.encryption_level = level;
        self
    }

    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    pub fn one_share_per_server(mut self, value: bool) -> Self {
        self.one_share_per_server = value;
        self
    }

    pub fn use_kerberos(mut self, value: bool) -> Self {
        self.use_kerberos = value;
        self
    }

    pub fn fallback_after_kerberos(mut self, value: bool) -> Self {
        self.fallback_after_kerberos = value;
        self
    }

    pub fn no_auto_anonymous_login(mut self, value: bool) -> Self {
        self.no_auto_anonymous_login = value;
        self
    }

    /// Set the policy applied to credentials longer than the library buffers
    pub fn credential_overflow(mut self, policy: CredentialOverflow) -> Self {
        self.credential_overflow = policy;
        self
    }

    /// Set the policy applied when credentials are requested without a resolver
    pub fn missing_resolver(mut self, policy: MissingResolver) -> Self {
        self.missing_resolver = policy;
        self
    }

    /// Attach the authentication resolver
    pub fn auth_resolver<F>(mut self, resolver: F) -> Self
    where
        F: FnMut(&AuthRequest<'_>) -> AuthResponse + 'static,
    {
        self.auth_resolver = Some(Box::new(resolver));
        self
    }

    // -- getters

    pub fn get_server(&self) -> &str {
        &self.server
    }

    pub fn get_workgroup(&self) -> Option<&str> {
        self.workgroup.as_deref()
    }

    pub fn get_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn get_netbios_name(&self) -> Option<&str> {
        self.netbios_name.as_deref()
    }

    pub fn get_debug(&self) -> i32 {
        self.debug
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_encryption_level(&self) -> SmbEncryptionLevel {
        self.encryption_level
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn is_one_share_per_server(&self) -> bool {
        self.one_share_per_server
    }

    pub fn is_use_kerberos(&self) -> bool {
        self.use_kerberos
    }

    pub fn is_fallback_after_kerberos(&self) -> bool {
        self.fallback_after_kerberos
    }

    pub fn is_no_auto_anonymous_login(&self) -> bool {
        self.no_auto_anonymous_login
    }
}

/// Options used to open a remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmbOpenOptions {
    read: bool,
    write: bool,
    append: bool,
    create: bool,
    truncate: bool,
    exclusive: bool,
    mode: u32,
}

impl Default for SmbOpenOptions {
    fn default() -> Self {
        Self {
            read: false,
            write: false,
            append: false,
            create: false,
            truncate: false,
            exclusive: false,
            mode: 0o644,
        }
    }
}

impl SmbOpenOptions {
    /// Decode POSIX open flags and mode
    pub fn from_flags(flags: i32, mode: u32) -> Self {
        let access = flags & ACCESS_MODE;
        Self {
            read: access == libc::O_RDONLY || access == libc::O_RDWR,
            write: access == libc::O_WRONLY || access == libc::O_RDWR,
            append: flags & libc::O_APPEND != 0,
            create: flags & libc::O_CREAT != 0,
            truncate: flags & libc::O_TRUNC != 0,
            exclusive: flags & libc::O_EXCL != 0,
            mode,
        }
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Writes always go to the end of file; implies write
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Fail if the file already exists; only meaningful with create
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Permissions given to a created file
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn is_write(&self) -> bool {
        self.write || self.append
    }

    pub fn is_append(&self) -> bool {
        self.append
    }

    pub fn is_create(&self) -> bool {
        self.create
    }

    pub fn is_truncate(&self) -> bool {
        self.truncate
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn get_mode(&self) -> u32 {
        self.mode
    }

    /// Encode as POSIX open flags
    pub fn flags(&self) -> i32 {
        let mut flags = match (self.read, self.is_write()) {
            (true, true) => libc::O_RDWR,
            (false, true) => libc::O_WRONLY,
            _ => libc::O_RDONLY,
        };
        if self.create {
            flags |= libc::O_CREAT;
        }
        if self.truncate {
            flags |= libc::O_TRUNC;
        }
        if self.exclusive {
            flags |= libc::O_EXCL;
        }
        if self.append {
            flags |= libc::O_APPEND;
        }
        flags
    }
}
