//! Error types for the BATS core.
//!
//! Parameter derivation and batch generation are pure arithmetic over
//! validated inputs, so most contract violations are panics at the call
//! boundary. The recoverable failures that remain come from configuration,
//! distribution tables and symbol storage, and are reported through
//! [`Error`], classified by [`ErrorKind`].
//!
//! # Error Categories
//!
//! - **Configuration**: invalid session parameters or field order
//! - **Distribution**: malformed or missing degree distribution
//! - **Symbols**: packet size, index or presence problems
//! - **Precode**: check packets requested before they exist
//! - **Batch**: encoding vector requested out of sequence

use core::fmt;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Configuration ===
    /// Session parameters or field order are invalid.
    InvalidParams,

    // === Distribution ===
    /// Degree probability table is malformed.
    InvalidDistribution,
    /// Degree sampling was requested before a distribution was set.
    MissingDistribution,

    // === Symbols ===
    /// Packet length does not match the session packet size.
    SymbolSizeMismatch,
    /// Packet index is outside the source range.
    InvalidPacketIndex,
    /// A participating packet has not been loaded.
    MissingPacket,

    // === Precode ===
    /// Check packets have not been generated yet.
    PrecodeMissing,

    // === Batch ===
    /// The PRNG no longer holds the stream of the sampled degree.
    StaleDegreeSample,
}

impl ErrorKind {
    /// Returns the error category for this kind.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidParams => ErrorCategory::Configuration,
            Self::InvalidDistribution | Self::MissingDistribution => ErrorCategory::Distribution,
            Self::SymbolSizeMismatch | Self::InvalidPacketIndex | Self::MissingPacket => {
                ErrorCategory::Symbols
            }
            Self::PrecodeMissing => ErrorCategory::Precode,
            Self::StaleDegreeSample => ErrorCategory::Batch,
        }
    }

    /// Short, stable name used in `Display`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidParams => "invalid parameters",
            Self::InvalidDistribution => "invalid degree distribution",
            Self::MissingDistribution => "degree distribution not set",
            Self::SymbolSizeMismatch => "symbol size mismatch",
            Self::InvalidPacketIndex => "invalid packet index",
            Self::MissingPacket => "missing packet",
            Self::PrecodeMissing => "precode not generated",
            Self::StaleDegreeSample => "stale degree sample",
        }
    }
}

/// High-level error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Session configuration failures.
    Configuration,
    /// Degree distribution failures.
    Distribution,
    /// Symbol storage failures.
    Symbols,
    /// Precode lifecycle failures.
    Precode,
    /// Batch sequencing failures.
    Batch,
}

/// The main error type for BATS operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {msg}", self.kind.as_str()),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// A specialized Result type for BATS operations.
pub type Result<T> = core::result::Result<T, Error>;
