//! # dirent
//!
//! Directory entries returned by directory handles

/// Type of a directory entry, with the numeric values used by libsmbclient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SmbDirentType {
    Workgroup = 1,
    Server = 2,
    FileShare = 3,
    PrinterShare = 4,
    CommsShare = 5,
    IpcShare = 6,
    Dir = 7,
    File = 8,
    Link = 9,
}

impl TryFrom<u32> for SmbDirentType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Workgroup),
            2 => Ok(Self::Server),
            3 => Ok(Self::FileShare),
            4 => Ok(Self::PrinterShare),
            5 => Ok(Self::CommsShare),
            6 => Ok(Self::IpcShare),
            7 => Ok(Self::Dir),
            8 => Ok(Self::File),
            9 => Ok(Self::Link),
            other => Err(other),
        }
    }
}

/// A directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbDirent {
    kind: SmbDirentType,
    name: String,
    comment: String,
}

impl SmbDirent {
    pub fn new<S: AsRef<str>>(kind: SmbDirentType, name: S, comment: S) -> Self {
        Self {
            kind,
            name: name.as_ref().to_string(),
            comment: comment.as_ref().to_string(),
        }
    }

    pub fn get_type(&self) -> SmbDirentType {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Whether the entry is a file or a directory
    pub fn is_fs_entry(&self) -> bool {
        matches!(self.kind, SmbDirentType::File | SmbDirentType::Dir)
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_convert_dirent_type() {
        for kind in [
            SmbDirentType::Workgroup,
            SmbDirentType::Server,
            SmbDirentType::FileShare,
            SmbDirentType::PrinterShare,
            SmbDirentType::CommsShare,
            SmbDirentType::IpcShare,
            SmbDirentType::Dir,
            SmbDirentType::File,
            SmbDirentType::Link,
        ] {
            assert_eq!(SmbDirentType::try_from(kind as u32), Ok(kind));
        }
        assert_eq!(SmbDirentType::try_from(0), Err(0));
        assert_eq!(SmbDirentType::try_from(42), Err(42));
    }

    #[test]
    fn should_init_dirent() {
        let dirent = SmbDirent::new(SmbDirentType::FileShare, "public", "guest share");
        assert_eq!(dirent.get_type(), SmbDirentType::FileShare);
        assert_eq!(dirent.name(), "public");
        assert_eq!(dirent.comment(), "guest share");
        assert!(!dirent.is_fs_entry());
        assert!(SmbDirent::new(SmbDirentType::Dir, "a", "").is_fs_entry());
    }
}
