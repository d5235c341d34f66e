//! # memory
//!
//! In-memory smb backend. Servers, shares, directories and files live in a
//! tree; shares may require credentials, which are requested through the
//! authentication bridge once per server/share session.

use std::collections::{BTreeMap, HashSet, VecDeque};

use super::{SmbBackend, Whence};
use crate::auth::{read_field, AuthBridge, AuthRequest, AuthResponse, CredentialBuffers};
use crate::dirent::{SmbDirent, SmbDirentType};
use crate::error::Errno;
use crate::options::{SmbOpenOptions, SmbOptions};
use crate::utils::uri::SmbUri;

/// Size of each credential buffer handed to the bridge, as in libsmbclient
const DEFAULT_CREDENTIAL_CAPACITY: usize = 256;
/// Largest file a share accepts
const MAX_FILE_SIZE: usize = u32::MAX as usize;

#[derive(Debug)]
enum Node {
    File(Vec<u8>),
    Dir(BTreeMap<String, Node>),
}

impl Node {
    fn dir() -> Self {
        Self::Dir(BTreeMap::new())
    }

    fn lookup(&self, path: &[String]) -> Option<&Node> {
        match path.split_first() {
            None => Some(self),
            Some((name, rest)) => match self {
                Self::Dir(children) => children.get(name)?.lookup(rest),
                Self::File(_) => None,
            },
        }
    }

    fn lookup_mut(&mut self, path: &[String]) -> Option<&mut Node> {
        match path.split_first() {
            None => Some(self),
            Some((name, rest)) => match self {
                Self::Dir(children) => children.get_mut(name)?.lookup_mut(rest),
                Self::File(_) => None,
            },
        }
    }

    /// Get or create the directory at `path`; `None` if a file is in the way
    fn make_dirs(&mut self, path: &[String]) -> Option<&mut Node> {
        match path.split_first() {
            None => Some(self),
            Some((name, rest)) => match self {
                Self::Dir(children) => children
                    .entry(name.clone())
                    .or_insert_with(Node::dir)
                    .make_dirs(rest),
                Self::File(_) => None,
            },
        }
    }
}

#[derive(Debug)]
struct Share {
    root: Node,
    comment: String,
    credentials: Option<AuthResponse>,
}

impl Default for Share {
    fn default() -> Self {
        Self {
            root: Node::dir(),
            comment: String::new(),
            credentials: None,
        }
    }
}

/// Open file of [`MemoryBackend`]
#[derive(Debug)]
pub struct MemoryFile {
    uri: SmbUri,
    offset: u64,
    options: SmbOpenOptions,
}

/// Open directory stream of [`MemoryBackend`]
#[derive(Debug)]
pub struct MemoryDir {
    entries: VecDeque<SmbDirent>,
}

/// In-memory smb backend
#[derive(Debug)]
pub struct MemoryBackend {
    servers: BTreeMap<String, BTreeMap<String, Share>>,
    sessions: HashSet<(String, String)>,
    credential_capacity: usize,
    fail_init: bool,
    fail_configure: bool,
    initialized: bool,
    shut_down: bool,
    workgroup: Option<String>,
    user: Option<String>,
    debug: i32,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            servers: BTreeMap::new(),
            sessions: HashSet::new(),
            credential_capacity: DEFAULT_CREDENTIAL_CAPACITY,
            fail_init: false,
            fail_configure: false,
            initialized: false,
            shut_down: false,
            workgroup: None,
            user: None,
            debug: 0,
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct MemoryBackend with an empty share
    pub fn with_share<S: AsRef<str>>(mut self, server: S, share: S) -> Self {
        self.share_entry(server.as_ref(), share.as_ref());
        self
    }

    /// Construct MemoryBackend with a share described by `comment`
    pub fn with_share_comment<S: AsRef<str>>(mut self, server: S, share: S, comment: S) -> Self {
        self.share_entry(server.as_ref(), share.as_ref()).comment = comment.as_ref().to_string();
        self
    }

    /// Construct MemoryBackend with a share which only accepts `credentials`
    pub fn with_protected_share<S: AsRef<str>>(
        mut self,
        server: S,
        share: S,
        credentials: AuthResponse,
    ) -> Self {
        self.share_entry(server.as_ref(), share.as_ref()).credentials = Some(credentials);
        self
    }

    /// Construct MemoryBackend with a directory at `uri`, parents included
    pub fn with_dir<S: AsRef<str>>(mut self, uri: S) -> Self {
        let uri = SmbUri::parse(uri.as_ref());
        if let Some(share) = uri.share() {
            let _ = self
                .share_entry(uri.host(), share)
                .root
                .make_dirs(uri.path());
        }
        self
    }

    /// Construct MemoryBackend with a file at `uri`, parents included
    pub fn with_file<S: AsRef<str>>(mut self, uri: S, content: &[u8]) -> Self {
        let uri = SmbUri::parse(uri.as_ref());
        if let (Some(share), Some((name, parent))) = (uri.share(), uri.path().split_last()) {
            if let Some(Node::Dir(children)) =
                self.share_entry(uri.host(), share).root.make_dirs(parent)
            {
                children.insert(name.clone(), Node::File(content.to_vec()));
            }
        }
        self
    }

    /// Set the size of the credential buffers handed to the bridge
    pub fn with_credential_capacity(mut self, capacity: usize) -> Self {
        self.credential_capacity = capacity;
        self
    }

    /// Make `init` fail, as a library which cannot allocate a context
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Content of the file at `uri`
    pub fn file_content(&self, uri: &str) -> Option<&[u8]> {
        let uri = SmbUri::parse(uri);
        let share = self.servers.get(uri.host())?.get(uri.share()?)?;
        match share.root.lookup(uri.path())? {
            Node::File(content) => Some(content.as_slice()),
            Node::Dir(_) => None,
        }
    }

    /// Make every following configuration fail with `EINVAL`
    pub fn fail_configure(&mut self, fail: bool) {
        self.fail_configure = fail;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn workgroup(&self) -> Option<&str> {
        self.workgroup.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn debug(&self) -> i32 {
        self.debug
    }

    // -- private

    fn share_entry(&mut self, server: &str, share: &str) -> &mut Share {
        self.servers
            .entry(server.to_string())
            .or_default()
            .entry(share.to_string())
            .or_default()
    }

    fn check_alive(&self) -> Result<(), Errno> {
        if self.initialized && !self.shut_down {
            Ok(())
        } else {
            Err(Errno::BAD_DESCRIPTOR)
        }
    }

    /// Open a session on the share of `uri`, asking credentials if it is new
    fn authenticate(&mut self, auth: &mut AuthBridge, uri: &SmbUri) -> Result<(), Errno> {
        let (host, share) = match uri.share() {
            Some(share) => (uri.host(), share),
            None => return Ok(()),
        };
        let required = self
            .servers
            .get(host)
            .and_then(|shares| shares.get(share))
            .map(|share| share.credentials.clone())
            .ok_or(Errno::NOT_FOUND)?;
        let key = (host.to_string(), share.to_string());
        if self.sessions.contains(&key) {
            return Ok(());
        }
        let mut domain = vec![0u8; self.credential_capacity];
        let mut username = vec![0u8; self.credential_capacity];
        let mut password = vec![0u8; self.credential_capacity];
        auth.supply(
            AuthRequest {
                server: host,
                share,
            },
            CredentialBuffers {
                domain: &mut domain,
                username: &mut username,
                password: &mut password,
            },
        );
        let given = AuthResponse {
            domain: read_field(&domain),
            username: read_field(&username),
            password: read_field(&password),
        };
        match required {
            Some(required) if required != given => {
                debug!("access denied to {}/{}", host, share);
                Err(Errno::PERMISSION_DENIED)
            }
            _ => {
                debug!("new session on {}/{}", host, share);
                self.sessions.insert(key);
                Ok(())
            }
        }
    }

    fn share_root(&self, uri: &SmbUri) -> Result<&Node, Errno> {
        let share = uri.share().ok_or(Errno::NOT_FOUND)?;
        self.servers
            .get(uri.host())
            .and_then(|shares| shares.get(share))
            .map(|share| &share.root)
            .ok_or(Errno::NOT_FOUND)
    }

    fn share_root_mut(&mut self, uri: &SmbUri) -> Result<&mut Node, Errno> {
        let share = uri.share().ok_or(Errno::NOT_FOUND)?;
        self.servers
            .get_mut(uri.host())
            .and_then(|shares| shares.get_mut(share))
            .map(|share| &mut share.root)
            .ok_or(Errno::NOT_FOUND)
    }

    fn file_data(&self, file: &MemoryFile) -> Result<&Vec<u8>, Errno> {
        match self.share_root(&file.uri)?.lookup(file.uri.path()) {
            Some(Node::File(data)) => Ok(data),
            _ => Err(Errno::BAD_DESCRIPTOR),
        }
    }

    fn file_data_mut(&mut self, file: &MemoryFile) -> Result<&mut Vec<u8>, Errno> {
        match self.share_root_mut(&file.uri)?.lookup_mut(file.uri.path()) {
            Some(Node::File(data)) => Ok(data),
            _ => Err(Errno::BAD_DESCRIPTOR),
        }
    }
}

impl SmbBackend for MemoryBackend {
    type File = MemoryFile;
    type Dir = MemoryDir;

    fn configure(&mut self, options: &SmbOptions) -> Result<(), Errno> {
        if self.fail_configure {
            return Err(Errno::INVALID_ARGUMENT);
        }
        self.workgroup = options.workgroup.clone();
        self.user = options.user.clone();
        self.debug = options.debug;
        Ok(())
    }

    fn init(&mut self) -> Result<(), Errno> {
        if self.fail_init {
            return Err(Errno(libc::ENOMEM));
        }
        self.initialized = true;
        Ok(())
    }

    fn open(
        &mut self,
        auth: &mut AuthBridge,
        uri: &str,
        flags: i32,
        mode: u32,
    ) -> Result<Self::File, Errno> {
        self.check_alive()?;
        let uri = SmbUri::parse(uri);
        let options = SmbOpenOptions::from_flags(flags, mode);
        self.authenticate(auth, &uri)?;
        let (name, parent) = uri.path().split_last().ok_or(Errno::IS_A_DIRECTORY)?;
        let children = match self.share_root_mut(&uri)?.lookup_mut(parent) {
            Some(Node::Dir(children)) => children,
            Some(Node::File(_)) => return Err(Errno::NOT_A_DIRECTORY),
            None => return Err(Errno::NOT_FOUND),
        };
        match children.get_mut(name) {
            Some(Node::Dir(_)) => return Err(Errno::IS_A_DIRECTORY),
            Some(Node::File(_)) if options.is_create() && options.is_exclusive() => {
                return Err(Errno::ALREADY_EXISTS)
            }
            Some(Node::File(data)) => {
                if options.is_truncate() && options.is_write() {
                    data.clear();
                }
            }
            None if options.is_create() => {
                children.insert(name.clone(), Node::File(Vec::new()));
            }
            None => return Err(Errno::NOT_FOUND),
        }
        Ok(MemoryFile {
            uri,
            offset: 0,
            options,
        })
    }

    fn open_dir(&mut self, auth: &mut AuthBridge, uri: &str) -> Result<Self::Dir, Errno> {
        self.check_alive()?;
        let uri = SmbUri::parse(uri);
        let entries = if uri.host().is_empty() {
            self.servers
                .keys()
                .map(|server| SmbDirent::new(SmbDirentType::Server, server.as_str(), ""))
                .collect()
        } else if uri.share().is_none() {
            self.servers
                .get(uri.host())
                .ok_or(Errno::NOT_FOUND)?
                .iter()
                .map(|(name, share)| {
                    SmbDirent::new(
                        SmbDirentType::FileShare,
                        name.as_str(),
                        share.comment.as_str(),
                    )
                })
                .collect()
        } else {
            self.authenticate(auth, &uri)?;
            match self.share_root(&uri)?.lookup(uri.path()) {
                Some(Node::Dir(children)) => children
                    .iter()
                    .map(|(name, node)| {
                        let kind = match node {
                            Node::Dir(_) => SmbDirentType::Dir,
                            Node::File(_) => SmbDirentType::File,
                        };
                        SmbDirent::new(kind, name.as_str(), "")
                    })
                    .collect(),
                Some(Node::File(_)) => return Err(Errno::NOT_A_DIRECTORY),
                None => return Err(Errno::NOT_FOUND),
            }
        };
        Ok(MemoryDir { entries })
    }

    fn read(
        &mut self,
        _auth: &mut AuthBridge,
        file: &mut Self::File,
        buf: &mut [u8],
    ) -> Result<usize, Errno> {
        self.check_alive()?;
        if !file.options.is_read() {
            return Err(Errno::BAD_DESCRIPTOR);
        }
        let data = self.file_data(file)?;
        let start = usize::try_from(file.offset)
            .unwrap_or(usize::MAX)
            .min(data.len());
        let len = buf.len().min(data.len() - start);
        buf[..len].copy_from_slice(&data[start..start + len]);
        file.offset += len as u64;
        Ok(len)
    }

    fn write(
        &mut self,
        _auth: &mut AuthBridge,
        file: &mut Self::File,
        buf: &[u8],
    ) -> Result<usize, Errno> {
        self.check_alive()?;
        if !file.options.is_write() {
            return Err(Errno::BAD_DESCRIPTOR);
        }
        let append = file.options.is_append();
        let offset = file.offset;
        let data = self.file_data_mut(file)?;
        let start = if append {
            data.len()
        } else {
            usize::try_from(offset).map_err(|_| Errno(libc::EFBIG))?
        };
        let end = start
            .checked_add(buf.len())
            .filter(|end| *end <= MAX_FILE_SIZE)
            .ok_or(Errno(libc::EFBIG))?;
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        file.offset = end as u64;
        Ok(buf.len())
    }

    fn seek(
        &mut self,
        _auth: &mut AuthBridge,
        file: &mut Self::File,
        offset: i64,
        whence: Whence,
    ) -> Result<u64, Errno> {
        self.check_alive()?;
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => file.offset,
            Whence::End => self.file_data(file)?.len() as u64,
        };
        let position = i64::try_from(base)
            .ok()
            .and_then(|base| base.checked_add(offset))
            .filter(|position| *position >= 0)
            .ok_or(Errno::INVALID_ARGUMENT)?;
        file.offset = position as u64;
        Ok(file.offset)
    }

    fn read_dir(
        &mut self,
        _auth: &mut AuthBridge,
        dir: &mut Self::Dir,
    ) -> Result<Option<SmbDirent>, Errno> {
        self.check_alive()?;
        Ok(dir.entries.pop_front())
    }

    fn close(&mut self, _file: Self::File) -> Result<(), Errno> {
        self.check_alive()
    }

    fn close_dir(&mut self, _dir: Self::Dir) -> Result<(), Errno> {
        self.check_alive()
    }

    fn shutdown(&mut self, _force: bool) -> Result<(), Errno> {
        self.sessions.clear();
        self.shut_down = true;
        Ok(())
    }
}
