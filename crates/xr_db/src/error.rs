//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for [`CodecError`]
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// file is not a well-formed db archive
    #[error("file is not a well-formed db archive")]
    MalformedContainer,

    /// the version tag does not match any known header layout
    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(String),

    /// stored checksum does not match the decoded bytes
    #[error("checksum mismatch for {name}: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// entry path
        name: String,
        /// checksum carried by the directory record
        stored: u32,
        /// checksum of the decoded bytes
        computed: u32,
    },

    /// unable to find requested file
    #[error(transparent)]
    FileNotFound(#[from] FileNotFoundError),
}

/// Block codec failures while decoding untrusted payload bytes
#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// input ended before the declared output size was produced
    #[error("compressed block is truncated")]
    Truncated,

    /// the stream decodes to an impossible state or the wrong size
    #[error("compressed block is corrupt")]
    Corrupt,
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// by name {0}
    #[error("by name {0}")]
    Name(String),

    /// {0} is a folder, not a file
    #[error("{0} is a folder, not a file")]
    NotAFile(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
