//! # auth
//!
//! Bridge between the credential requests issued by the smb library and the
//! user-supplied authentication resolver.

use crate::error::{CredentialField, SmbError, SmbResult};

/// Authentication resolver.
///
/// Called synchronously, from inside the operation which triggered the request
/// (usually an `open`). It must not re-enter the context it is attached to.
pub type AuthResolver = Box<dyn FnMut(&AuthRequest<'_>) -> AuthResponse>;

/// Credentials requested by the smb library for a server/share pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequest<'a> {
    pub server: &'a str,
    pub share: &'a str,
}

/// Credentials returned by the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthResponse {
    pub domain: String,
    pub username: String,
    pub password: String,
}

impl AuthResponse {
    pub fn new<S: AsRef<str>>(domain: S, username: S, password: S) -> Self {
        Self {
            domain: domain.as_ref().to_string(),
            username: username.as_ref().to_string(),
            password: password.as_ref().to_string(),
        }
    }

    /// Empty credentials
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Output buffers owned by the smb library.
///
/// Each buffer receives a NUL-terminated string, so at most `len() - 1` bytes
/// of the value are delivered.
#[derive(Debug)]
pub struct CredentialBuffers<'a> {
    pub domain: &'a mut [u8],
    pub username: &'a mut [u8],
    pub password: &'a mut [u8],
}

impl CredentialBuffers<'_> {
    fn clear(&mut self) {
        for buf in [
            &mut *self.domain,
            &mut *self.username,
            &mut *self.password,
        ] {
            if let Some(first) = buf.first_mut() {
                *first = 0;
            }
        }
    }
}

/// What to do when a credential does not fit into its output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialOverflow {
    /// Deliver the first bytes that fit
    #[default]
    Truncate,
    /// Deliver empty credentials and fail the operation with `CredentialTooLong`
    Reject,
}

/// What to do when credentials are requested and no resolver is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingResolver {
    /// Deliver empty credentials
    #[default]
    Anonymous,
    /// Deliver empty credentials and fail the operation with `AuthRequired`
    Fail,
}

/// Authentication bridge stored on the smb context.
///
/// The only state kept across requests is the resolver and the policies; a
/// failure raised during a request is parked until the operation which
/// triggered it returns, then taken by the context.
pub struct AuthBridge {
    resolver: Option<AuthResolver>,
    overflow: CredentialOverflow,
    missing: MissingResolver,
    failure: Option<SmbError>,
}

impl Default for AuthBridge {
    fn default() -> Self {
        Self::new(CredentialOverflow::default(), MissingResolver::default())
    }
}

impl std::fmt::Debug for AuthBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthBridge")
            .field("resolver", &self.resolver.is_some())
            .field("overflow", &self.overflow)
            .field("missing", &self.missing)
            .field("failure", &self.failure)
            .finish()
    }
}

impl AuthBridge {
    pub fn new(overflow: CredentialOverflow, missing: MissingResolver) -> Self {
        Self {
            resolver: None,
            overflow,
            missing,
            failure: None,
        }
    }

    /// Attach (or replace, or remove) the resolver
    pub fn set_resolver(&mut self, resolver: Option<AuthResolver>) {
        self.resolver = resolver;
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Answer a credential request, writing the credentials into `out`.
    ///
    /// Never fails towards the library: policy violations leave empty strings
    /// in every buffer and are reported to the context afterwards.
    pub fn supply(&mut self, request: AuthRequest<'_>, mut out: CredentialBuffers<'_>) {
        trace!(
            "credentials requested for server {} share {}",
            request.server,
            request.share
        );
        let response = match self.resolver.as_mut() {
            Some(resolver) => resolver(&request),
            None if self.missing == MissingResolver::Fail => {
                error!(
                    "no authentication resolver for {}/{}",
                    request.server, request.share
                );
                out.clear();
                self.failure = Some(SmbError::AuthRequired {
                    server: request.server.to_string(),
                    share: request.share.to_string(),
                });
                return;
            }
            None => {
                debug!(
                    "no authentication resolver; using anonymous credentials for {}/{}",
                    request.server, request.share
                );
                AuthResponse::anonymous()
            }
        };
        if let Err(err) = self.write_credentials(&response, &mut out) {
            error!("could not deliver credentials: {}", err);
            out.clear();
            self.failure = Some(err);
        }
    }

    /// Take the failure raised by the last request, if any
    pub fn take_failure(&mut self) -> Option<SmbError> {
        self.failure.take()
    }

    fn write_credentials(
        &self,
        response: &AuthResponse,
        out: &mut CredentialBuffers<'_>,
    ) -> SmbResult<()> {
        write_field(
            CredentialField::Domain,
            &response.domain,
            out.domain,
            self.overflow,
        )?;
        write_field(
            CredentialField::Username,
            &response.username,
            out.username,
            self.overflow,
        )?;
        write_field(
            CredentialField::Password,
            &response.password,
            out.password,
            self.overflow,
        )
    }
}

/// Write `value` into `buf` as a NUL-terminated string
fn write_field(
    field: CredentialField,
    value: &str,
    buf: &mut [u8],
    overflow: CredentialOverflow,
) -> SmbResult<()> {
    let bytes = value.as_bytes();
    let capacity = buf.len();
    let max = capacity.saturating_sub(1);
    if bytes.len() > max && overflow == CredentialOverflow::Reject {
        return Err(SmbError::CredentialTooLong { field, capacity });
    }
    if capacity == 0 {
        return Ok(());
    }
    let len = bytes.len().min(max);
    if len < bytes.len() {
        debug!("{} truncated to {} bytes", field, len);
    }
    buf[..len].copy_from_slice(&bytes[..len]);
    buf[len] = 0;
    Ok(())
}

/// Read a NUL-terminated string out of a credential buffer
pub(crate) fn read_field(buf: &[u8]) -> String {
    let len = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).to_string()
}
