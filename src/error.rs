use std::{io, string::FromUtf8Error};

use async_std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file to read lines from doesn't exist
    #[error("file {} does not exist", .0.display())]
    SourceNotFound(PathBuf),

    /// Index is missing
    #[error("index file {} does not exist", .0.display())]
    MissingIndex(PathBuf),

    /// On request for a line which has no entry in the index, or whose offset points behind the
    /// end of the file
    #[error("line {0} not found, possibly exceeding the length of the file")]
    LineNotFound(u64),

    /// Index is not built properly
    #[error("index is malformed")]
    MalformedIndex,

    /// A line starts at an offset which can't be represented by an index record
    #[error("offset {0} exceeds the maximum supported file size")]
    FileTooLarge(u64),

    #[error("line is not valid UTF-8")]
    Utf8(#[from] FromUtf8Error),
}

impl Error {
    /// Maps a `NotFound` io error for `path` into the error created by `missing`. Every other
    /// error is kept as `Error::Io`.
    pub(crate) fn not_found_as<F>(err: io::Error, path: &Path, missing: F) -> Self
    where
        F: FnOnce(PathBuf) -> Error,
    {
        if err.kind() == io::ErrorKind::NotFound {
            missing(path.to_path_buf())
        } else {
            Error::Io(err)
        }
    }
}
