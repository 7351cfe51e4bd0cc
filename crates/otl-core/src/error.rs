//! Error types and handling for otl-core operations.
//!
//! Errors are categorized for easier handling and include context about
//! recoverability: a failed host-outline nudge is worth retrying with
//! backoff, a malformed heading or a negative debounce delay is not.
//!
//! The engine deliberately keeps most failures local. Per-cell parse
//! problems are logged and treated as "no headings in this cell", and a
//! failed refresh degrades the view model to an empty structure instead of
//! propagating. The variants here cover the places where an error does
//! cross an API boundary.

use thiserror::Error;

/// The main error type for otl-core operations.
///
/// All public fallible functions in otl-core return `Result<T, Error>`.
#[derive(Error, Debug)]
pub enum Error {
    /// Heading or document parsing failed.
    ///
    /// Parse errors never abort a whole-document scan; they surface only
    /// when a caller asks to parse a single cell directly.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid.
    ///
    /// Covers malformed TOML settings and values outside their valid
    /// ranges (for example `max_retries == 0`).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller supplied an invalid argument.
    ///
    /// Rejected synchronously at the call site with no state mutation.
    /// The canonical case is a negative debounce delay.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Best-effort synchronization with the host outline pane failed.
    ///
    /// These failures are transient by nature (the host may be busy or
    /// mid-layout) and are retried with exponential backoff before being
    /// logged and swallowed.
    #[error("Outline sync error: {0}")]
    Sync(String),

    /// The target notebook editor is closed or no longer valid.
    #[error("Notebook editor is closed")]
    EditorClosed,

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Returns `true` for errors that are typically temporary and might
    /// succeed if the operation is retried after a delay. Host-outline
    /// sync failures and closed-editor races qualify; parse, config, and
    /// argument errors are permanent.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Sync(_) | Self::EditorClosed)
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for grouping errors in logs or metrics.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Sync(_) => "sync",
            Self::EditorClosed => "editor_closed",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
