use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ItemNotFound,
    CorruptRecord,
    StoreReadFailed,
    StoreWriteFailed,
    LockContention,
    MediaUnreadable,
    UploadRejected,
    UploadTransport,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ItemNotFound => "E2001",
            Self::CorruptRecord => "E3001",
            Self::StoreReadFailed => "E5001",
            Self::StoreWriteFailed => "E5002",
            Self::LockContention => "E5003",
            Self::MediaUnreadable => "E6001",
            Self::UploadRejected => "E6002",
            Self::UploadTransport => "E6003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Board not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ItemNotFound => "Item not found",
            Self::CorruptRecord => "Stored record could not be decoded",
            Self::StoreReadFailed => "Item store read failed",
            Self::StoreWriteFailed => "Item store write failed",
            Self::LockContention => "Lock contention",
            Self::MediaUnreadable => "Media file could not be read",
            Self::UploadRejected => "Media host rejected the upload",
            Self::UploadTransport => "Media host unreachable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `insp init` to create a board in this directory."),
            Self::ConfigParseError => Some("Fix syntax in .inspo/config.toml and retry."),
            Self::ItemNotFound => Some("Run `insp list` to see current item ids."),
            Self::CorruptRecord => Some("Inspect .inspo/items.json for hand edits."),
            Self::StoreReadFailed | Self::StoreWriteFailed => {
                Some("Check disk space and permissions on the .inspo directory.")
            }
            Self::LockContention => Some("Retry after the other `insp` process finishes."),
            Self::MediaUnreadable => Some("Check that the file exists and is readable."),
            Self::UploadRejected => Some("Verify the media host settings in .inspo/config.toml."),
            Self::UploadTransport => Some("Check network connectivity and retry the upload."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
