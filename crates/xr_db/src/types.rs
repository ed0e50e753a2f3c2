//! Base types for the structure of db archives.

use std::path::Path;

use binrw::BinRead;

/// Chunk id bit marking a packed payload
pub const CHUNK_COMPRESSED: u32 = 0x8000_0000;

/// Chunk id of the bulk data blob
pub const CHUNK_ID_DATA: u32 = 0;

/// Chunk id of the directory index
pub const CHUNK_ID_HEADER: u32 = 1;

/// Chunk id of free-form tool metadata
pub const CHUNK_ID_USERDATA: u32 = 0x29a;

/// Format revision of a db archive
///
/// The engine build picks the revision; plain `.db?` archives carry no marker of their own,
/// so callers must supply the version when the extension does not imply one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DbVersion {
    /// Builds up to 1114 (`.xrp` archives)
    V1114,
    /// Builds around 2215 (`.xp?` archives)
    V2215,
    /// Builds around 2945
    V2945,
    /// The 2947 RU release
    V2947Ru,
    /// The 2947 worldwide release
    V2947Ww,
    /// Clear Sky / Call of Pripyat `.xdb?` archives
    Xdb,
}

impl DbVersion {
    /// All version names accepted by [`DbVersion::from_name`]
    pub const NAMES: [&'static str; 6] = ["11xx", "2215", "2945", "2947ru", "2947ww", "xdb"];

    /// Parse a version from its conventional name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "11xx" => Some(Self::V1114),
            "2215" => Some(Self::V2215),
            "2945" => Some(Self::V2945),
            "2947ru" => Some(Self::V2947Ru),
            "2947ww" => Some(Self::V2947Ww),
            "xdb" => Some(Self::Xdb),
            _ => None,
        }
    }

    /// Try to detect the version from a file extension.
    ///
    /// `.xrp` is 1114, `.xp<c>` is 2215 and `.xdb<c>` is xdb, with `<c>` one alphanumeric
    /// character. Plain `.db<c>` archives are ambiguous and return `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext == "xrp" {
            Some(Self::V1114)
        } else if ext.len() == 3 && ext.starts_with("xp") && ext[2..].chars().all(char::is_alphanumeric) {
            Some(Self::V2215)
        } else if ext.len() == 4 && ext.starts_with("xdb") && ext[3..].chars().all(char::is_alphanumeric) {
            Some(Self::Xdb)
        } else {
            None
        }
    }

    /// Resolve the version for an archive: an explicit name when given, the file extension
    /// otherwise.
    pub fn detect(path: &Path, name: Option<&str>) -> crate::error::Result<Self> {
        match name {
            Some(name) => Self::from_name(name)
                .ok_or_else(|| crate::error::Error::UnsupportedVersion(name.to_owned())),
            None => Self::from_path(path).ok_or_else(|| {
                crate::error::Error::UnsupportedVersion(path.display().to_string())
            }),
        }
    }

    /// Conventional name of the version.
    pub fn name(self) -> &'static str {
        match self {
            Self::V1114 => "11xx",
            Self::V2215 => "2215",
            Self::V2945 => "2945",
            Self::V2947Ru => "2947ru",
            Self::V2947Ww => "2947ww",
            Self::Xdb => "xdb",
        }
    }

    /// Key schedule used to scramble packed header payloads, if this version scrambles at all.
    pub fn scrambler_key(self) -> Option<crate::scrambler::ScramblerKey> {
        match self {
            Self::V2947Ru => Some(crate::scrambler::ScramblerKey::Ru),
            Self::V2947Ww => Some(crate::scrambler::ScramblerKey::Ww),
            _ => None,
        }
    }
}

impl std::fmt::Display for DbVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a chunk, decoded from the masked chunk id
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChunkKind {
    /// Bulk file data blob
    Data,
    /// Directory index
    Header,
    /// Free-form tool metadata
    UserData,
    /// Any other chunk id
    Other(u32),
}

impl From<u32> for ChunkKind {
    fn from(id: u32) -> Self {
        match id & !CHUNK_COMPRESSED {
            CHUNK_ID_DATA => ChunkKind::Data,
            CHUNK_ID_HEADER => ChunkKind::Header,
            CHUNK_ID_USERDATA => ChunkKind::UserData,
            other => ChunkKind::Other(other),
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkKind::Data => f.write_str("DATA"),
            ChunkKind::Header => f.write_str("HEADER"),
            ChunkKind::UserData => f.write_str("USERDATA"),
            ChunkKind::Other(id) => write!(f, "OTHER({id:#x})"),
        }
    }
}

/// Eight byte head in front of every chunk payload
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(little)]
pub struct ChunkHead {
    /// Chunk id with [`CHUNK_COMPRESSED`] folded into bit 31
    pub ty: u32,

    /// Payload size in bytes
    pub size: u32,
}

/// Directory record tail for 1114 archives, following the null-terminated name
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct Record1114 {
    /// Size of the file once decoded
    pub size_real: u32,

    /// Absolute offset of the file bytes, `0` for folders
    pub offset: u32,

    /// Size of the file as stored
    pub size_compressed: u32,
}

/// Directory record tail for 2215 archives, following the null-terminated name
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct Record2215 {
    /// Absolute offset of the file bytes, `0` for folders
    pub offset: u32,

    /// Size of the file once decoded
    pub size_real: u32,

    /// Size of the file as stored
    pub size_compressed: u32,
}

/// Directory record tail for 2945 archives, following the null-terminated name
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct Record2945 {
    /// CRC-32 of the decoded file bytes
    pub crc: u32,

    /// Absolute offset of the file bytes, `0` for folders
    pub offset: u32,

    /// Size of the file once decoded
    pub size_real: u32,

    /// Size of the file as stored
    pub size_compressed: u32,
}

/// Fixed head of a 2947/xdb directory record; the name bytes and the offset follow it
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct Record2947 {
    /// Record size minus the name bytes; the name occupies `name_size - 16` bytes
    pub name_size: u16,

    /// Size of the file once decoded
    pub size_real: u32,

    /// Size of the file as stored
    pub size_compressed: u32,

    /// CRC-32 of the decoded file bytes
    pub crc: u32,
}
