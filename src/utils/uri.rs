//! # uri
//!
//! smb:// URI utilities

use std::fmt;

const SCHEME: &str = "smb://";

/// A parsed `smb://server/share/path` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbUri {
    /// Authority, possibly with userinfo and port
    authority: String,
    /// Share followed by the path components
    components: Vec<String>,
}

impl SmbUri {
    /// Parse an URI; the scheme is optional
    pub fn parse(uri: &str) -> Self {
        let rest = uri.strip_prefix(SCHEME).unwrap_or(uri);
        let mut parts = rest.splitn(2, '/');
        let authority = parts.next().unwrap_or_default().to_string();
        let mut this = Self {
            authority,
            components: Vec::new(),
        };
        if let Some(path) = parts.next() {
            this.push(path);
        }
        this
    }

    /// Join `path` to this URI. Absolute paths are still relative to the URI.
    pub fn join(mut self, path: &str) -> Self {
        self.push(path);
        self
    }

    /// Server name, without userinfo and port
    pub fn host(&self) -> &str {
        let host = self
            .authority
            .rsplit_once('@')
            .map(|(_, host)| host)
            .unwrap_or(&self.authority);
        match host.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => host,
        }
    }

    pub fn share(&self) -> Option<&str> {
        self.components.first().map(|s| s.as_str())
    }

    /// Path components below the share
    pub fn path(&self) -> &[String] {
        self.components.get(1..).unwrap_or_default()
    }

    fn push(&mut self, path: &str) {
        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    self.components.pop();
                }
                name => self.components.push(name.to_string()),
            }
        }
    }
}

impl fmt::Display for SmbUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SCHEME, self.authority)?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/// Resolve `path` against `server`; full `smb://` URIs are taken as they are
pub fn resolve(server: &str, path: &str) -> SmbUri {
    if path.starts_with(SCHEME) {
        SmbUri::parse(path)
    } else {
        SmbUri::parse(server).join(path)
    }
}
