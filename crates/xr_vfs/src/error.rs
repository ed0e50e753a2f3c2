//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`xr_db::error::Error`]
    #[error(transparent)]
    Db(#[from] xr_db::error::Error),

    /// pattern does not compile
    #[error("invalid glob pattern {pattern}")]
    Pattern {
        /// the offending pattern
        pattern: String,
        /// underlying regex error
        source: regex::Error,
    },

    /// the layer set is sealed and can no longer change
    #[error("layered filesystem is already sealed")]
    AlreadySealed,

    /// persisting an extracted file failed
    #[error("unable to persist {path}: {source}")]
    Persist {
        /// destination path
        path: String,
        /// underlying error
        source: std::io::Error,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
