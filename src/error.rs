//! Error types for the XTVFS decoder.
//!
//! Mirrors the convention used throughout this crate's file system modules:
//! a single `thiserror`-derived enum per concern, boxed behind
//! `Box<dyn std::error::Error>` at call sites so it composes with foreign
//! errors (I/O, a caller's write sink) through the same `?` operator.

/// Boxed error type returned from essentially every fallible operation.
pub type DYNERR = Box<dyn std::error::Error>;
/// Shorthand for operations that return nothing on success.
pub type STDRESULT = Result<(), DYNERR>;

/// Enumerates the ways a volume, directory entry, or cluster chain can be
/// found inconsistent, plus the propagation of a caller's write sink error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("underlying block device read failed or returned fewer bytes than requested")]
    Io,
    #[error("volume failed boot sector sanity checks")]
    BadVolume,
    #[error("path component not found, or a non-directory appeared mid-path")]
    NotFound,
    #[error("directory entry is inconsistent with its cluster chain")]
    Corrupt,
    #[error("cluster chain ended before the expected length was delivered")]
    ShortChain,
    #[error("cluster chain continued past the expected end of file")]
    Overrun,
    #[error("cluster chain revisited an already-visited cluster")]
    LoopDetected,
    #[error("write sink failed")]
    SinkError(DYNERR),
}
