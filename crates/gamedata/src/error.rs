use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to find \"{0}\" section")]
    EngineSectionNotFound(String),

    #[error("Section is empty")]
    EmptySection,

    #[error("Failed to get \"{key}\" key at \"{entry}\"")]
    MissingKey { key: String, entry: String },

    #[error("Failed to get platform (\"{platform}\" key) at \"{entry}\"")]
    MissingPlatform { platform: String, entry: String },

    #[error("Invalid value at \"{entry}\": {message}")]
    InvalidValue { entry: String, message: String },

    #[error("Unknown \"{library}\" library at \"{entry}\"")]
    UnknownLibrary { library: String, entry: String },

    #[error("Failed to find \"{0}\" signature")]
    PatternNotFound(String),

    #[error("Failed to find \"{name}\" virtual table at \"{entry}\"")]
    VTableNotFound { name: String, entry: String },

    #[error("Failed to get \"{reference}\" signature in \"{entry}\" address")]
    UnresolvedReference { reference: String, entry: String },

    #[error("Failed to read memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Unknown \"{action}\" action at \"{entry}\"")]
    UnknownAction { action: String, entry: String },

    #[error("Failed to get \"{entry}\" address action: {source}")]
    AddressAction {
        entry: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid signature pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required section or key is missing, empty or malformed.
    Structural,
    /// A library, pattern, vtable, reference or memory read could not be resolved.
    Resolution,
    /// An address action the resolver does not understand.
    UnrecognizedAction,
    /// Failure while reading or parsing a document from disk.
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EngineSectionNotFound(_)
            | Error::EmptySection
            | Error::MissingKey { .. }
            | Error::MissingPlatform { .. }
            | Error::InvalidValue { .. }
            | Error::InvalidPattern(_) => ErrorKind::Structural,
            Error::UnknownLibrary { .. }
            | Error::PatternNotFound(_)
            | Error::VTableNotFound { .. }
            | Error::UnresolvedReference { .. }
            | Error::MemoryReadFailed { .. } => ErrorKind::Resolution,
            Error::UnknownAction { .. } => ErrorKind::UnrecognizedAction,
            Error::AddressAction { source, .. } => source.kind(),
            Error::Io(_) | Error::Json(_) => ErrorKind::Io,
        }
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
