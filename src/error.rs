//! Error types returned while building a [`Model`](crate::Model)

use std::io;
use std::str::Utf8Error;

/// A specialized Result type for this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for model construction and byte-level input
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The corpus source could not be opened or read
    #[error("failed to read corpus: {0}")]
    CorpusRead(#[source] io::Error),

    /// Parsing the corpus produced no usable words
    #[error("corpus contains no usable words")]
    EmptyCorpus,

    /// Input handed to [`Model::split_utf8()`](crate::Model::split_utf8) is not UTF-8
    #[error("input is not valid UTF-8: {0}")]
    InvalidInput(#[from] Utf8Error),

    /// A [`Config`](crate::Config) value is out of range
    #[error("invalid argument {arg}: {msg}")]
    InvalidArgument {
        /// Name of the offending field
        arg: &'static str,
        /// What is wrong with it
        msg: String,
    },
}

impl Error {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument {
            arg,
            msg: msg.into(),
        }
    }
}
