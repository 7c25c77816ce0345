use core::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ZoneError>;

/// Stable numeric codes for the error taxonomy.
///
/// These are what [`ZoneError::code`] returns and what the cli turns into
/// exit codes, so sinks written against the numeric contract keep working
/// even if the enum grows variants.
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const SYNTAX_ERROR: i32 = -1;
    pub const SEMANTIC_ERROR: i32 = -2;
    pub const BAD_PARAMETER: i32 = -3;
    pub const OUT_OF_MEMORY: i32 = -4;
    pub const IO_ERROR: i32 = -5;
    pub const NOT_IMPLEMENTED: i32 = -6;
    pub const READ_ERROR: i32 = -7;
}

/// Error type for zone parsing operations.
#[derive(Debug)]
pub enum ZoneError {
    /// Malformed input at the lexical level. Always fatal.
    Syntax {
        file: Box<str>,
        line: u32,
        what: &'static str,
    },
    /// Well-formed tokens forming an invalid record or directive.
    /// `fatal` decides whether the parser unwinds or skips the record.
    Semantic {
        file: Box<str>,
        line: u32,
        what: &'static str,
        fatal: bool,
    },
    /// Caller-supplied options failed validation.
    BadParameter(&'static str),
    /// An allocation or buffer-capacity failure.
    OutOfMemory(&'static str),
    /// Unrecoverable error from the underlying stream.
    Io(std::io::Error),
    /// A directive or record form that is recognized but unsupported.
    NotImplemented(&'static str),
    /// Truncated input where more bytes were expected.
    ReadError,
    /// The sink rejected a record; the parse aborted with this code.
    SinkAbort(i32),
}

impl ZoneError {
    /// The stable negative code for this error, never `codes::SUCCESS`.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Syntax { .. } => codes::SYNTAX_ERROR,
            Self::Semantic { .. } => codes::SEMANTIC_ERROR,
            Self::BadParameter(_) => codes::BAD_PARAMETER,
            Self::OutOfMemory(_) => codes::OUT_OF_MEMORY,
            Self::Io(_) => codes::IO_ERROR,
            Self::NotImplemented(_) => codes::NOT_IMPLEMENTED,
            Self::ReadError => codes::READ_ERROR,
            Self::SinkAbort(code) => *code,
        }
    }

    /// Whether the parser may skip the offending record and continue.
    #[must_use]
    pub const fn recoverable(&self) -> bool {
        matches!(self, Self::Semantic { fatal: false, .. })
    }
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { file, line, what } => {
                write!(f, "{file}:{line}: syntax error: {what}")
            }
            Self::Semantic {
                file, line, what, ..
            } => {
                write!(f, "{file}:{line}: {what}")
            }
            Self::BadParameter(what) => write!(f, "bad parameter: {what}"),
            Self::OutOfMemory(what) => write!(f, "out of memory: {what}"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::NotImplemented(what) => write!(f, "not implemented: {what}"),
            Self::ReadError => write!(f, "truncated input"),
            Self::SinkAbort(code) => write!(f, "aborted by sink ({code})"),
        }
    }
}

impl std::error::Error for ZoneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ZoneError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
