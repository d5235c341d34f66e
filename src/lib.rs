#![crate_name = "smbc_client"]
#![crate_type = "lib"]

//! # smbc-client
//!
//! smbc-client is a small, safe client for SMB shares built on top of libsmbclient.
//! It owns the lifecycle of a client context, hands out file and directory handles
//! and lets you answer credential requests with a plain closure.
//!
//! ## Get started
//!
//! First of all you need to add **smbc-client** to your project dependencies:
//!
//! ```toml
//! smbc-client = { version = "^0.1", features = ["libsmbclient"] }
//! ```
//!
//! these features are supported:
//!
//! - `libsmbclient`: enable the native backend, linked against `libsmbclient` (UNIX only).
//! - `no-log`: disable logging. By default, this library will log via the `log` crate.
//! - `with-containers`: run the tests which require a live smb server.
//!
//! ### Smb context
//!
//! Here is a basic usage example, with the in-memory backend.
//! With the `libsmbclient` feature, `SmbContext::native(options)` returns the very same context
//! talking to real servers.
//!
//! ```rust
//! use std::io::Read;
//!
//! use smbc_client::{AuthResponse, MemoryBackend, SmbContext, SmbOptions};
//!
//! let backend = MemoryBackend::new()
//!     .with_protected_share("localhost", "temp", AuthResponse::new("pavao", "test", "test"))
//!     .with_file("smb://localhost/temp/README.md", b"hello");
//!
//! let mut context = SmbContext::create(
//!     SmbOptions::default()
//!         .server("smb://localhost")
//!         .workgroup("pavao")
//!         .auth_resolver(|req| {
//!             println!("credentials requested for {}/{}", req.server, req.share);
//!             AuthResponse::new("pavao", "test", "test")
//!         }),
//!     backend,
//! )
//! .unwrap();
//!
//! // list directory
//! for entry in context.list_dir("/temp").unwrap() {
//!     println!("{}", entry.name());
//! }
//! // read file
//! let mut file = context.open("/temp/README.md").unwrap();
//! let mut content = String::new();
//! file.read_to_string(&mut content).unwrap();
//! assert_eq!(content.as_str(), "hello");
//! assert!(file.close().is_ok());
//! // destroy context
//! assert!(context.destroy().is_ok());
//! ```
//!

#![doc(html_playground_url = "https://play.rust-lang.org")]

// -- crates
#[macro_use]
extern crate log;

mod auth;
mod backend;
mod context;
mod dirent;
mod error;
mod handle;
mod options;

pub use auth::{
    AuthBridge, AuthRequest, AuthResolver, AuthResponse, CredentialBuffers, CredentialOverflow,
    MissingResolver,
};
#[cfg(all(target_family = "unix", feature = "libsmbclient"))]
pub use backend::{NativeBackend, NativeDir, NativeFile};
pub use backend::{MemoryBackend, MemoryDir, MemoryFile, SmbBackend, Whence};
pub use context::SmbContext;
pub use dirent::{SmbDirent, SmbDirentType};
pub use error::{CredentialField, Errno, SmbError, SmbResult};
pub use handle::{DirHandle, FileHandle};
pub use options::{SmbEncryptionLevel, SmbOpenOptions, SmbOptions};

// -- utils
pub(crate) mod utils;
// -- mock
#[cfg(test)]
pub(crate) mod mock;
