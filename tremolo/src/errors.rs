//! Definition of errors.

use std::error::Error;
use std::fmt;

/// A specialized Result type for Tremolo.
pub type Result<T, E = TremoloError> = std::result::Result<T, E>;

/// The error type for Tremolo.
#[derive(Debug, thiserror::Error)]
pub enum TremoloError {
    /// The error variant for [`InvalidArgumentError`].
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// The error variant for [`MalformedDataError`].
    #[error(transparent)]
    MalformedData(MalformedDataError),

    /// The error variant for [`InvalidFormatError`].
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// The error variant for [`CapacityExceededError`].
    #[error(transparent)]
    CapacityExceeded(CapacityExceededError),

    /// The error variant for [`UnresolvedReferenceError`].
    #[error(transparent)]
    UnresolvedReference(UnresolvedReferenceError),

    /// The error variant for [`ConfigurationGapError`].
    #[error(transparent)]
    ConfigurationGap(ConfigurationGapError),

    /// The error variant for [`TryFromIntError`](std::num::TryFromIntError).
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// The error variant for [`ParseIntError`](std::num::ParseIntError).
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    /// The error variant for [`std::io::Error`].
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl TremoloError {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn malformed_data<S>(block: &'static str, offset: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::MalformedData(MalformedDataError {
            block,
            offset,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_format<S>(name: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            name,
            msg: msg.into(),
        })
    }

    pub(crate) fn capacity_exceeded<S>(what: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::CapacityExceeded(CapacityExceededError {
            what,
            msg: msg.into(),
        })
    }

    pub(crate) fn unresolved_reference<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::UnresolvedReference(UnresolvedReferenceError { msg: msg.into() })
    }

    pub(crate) const fn configuration_gap(offset: usize) -> Self {
        Self::ConfigurationGap(ConfigurationGapError { offset })
    }
}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// Error used when a binary buffer is corrupt or truncated.
#[derive(Debug)]
pub struct MalformedDataError {
    /// Name of the block where the error was found.
    pub(crate) block: &'static str,

    /// Byte offset in the block.
    pub(crate) offset: usize,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for MalformedDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MalformedDataError: {} (offset {}): {}",
            self.block, self.offset, self.msg
        )
    }
}

impl Error for MalformedDataError {}

/// Error used when a text input (CSV lexicon, matrix, character definitions) is invalid.
#[derive(Debug)]
pub struct InvalidFormatError {
    /// Name of the input.
    pub(crate) name: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.name, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// Error used when a table or a field exceeds its representable size.
#[derive(Debug)]
pub struct CapacityExceededError {
    /// What overflowed.
    pub(crate) what: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for CapacityExceededError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CapacityExceededError: {}: {}", self.what, self.msg)
    }
}

impl Error for CapacityExceededError {}

/// Error used when a word reference points to no word.
#[derive(Debug)]
pub struct UnresolvedReferenceError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for UnresolvedReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UnresolvedReferenceError: {}", self.msg)
    }
}

impl Error for UnresolvedReferenceError {}

/// Error used when no candidate covers an input position.
#[derive(Debug)]
pub struct ConfigurationGapError {
    /// Byte offset of the uncovered position.
    pub(crate) offset: usize,
}

impl fmt::Display for ConfigurationGapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ConfigurationGapError: no morpheme can start at byte {}",
            self.offset
        )
    }
}

impl Error for ConfigurationGapError {}
