use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A data line could not be decoded into a record at all.
    #[error("malformed record at line {line}: {reason}")]
    Structural { line: usize, reason: String },

    /// A record uses an INFO key the header never declared, so its values cannot be
    /// attributed to individual alleles.
    #[error("INFO key {key:?} at line {line} is not declared in the header")]
    SchemaInconsistency { line: usize, key: String },

    #[error("malformed header at line {line}: {reason}")]
    Header { line: usize, reason: String },

    #[error("data line encountered before the #CHROM header line")]
    MissingColumnHeader,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Compression(#[from] niffler::Error),
}

impl Error {
    pub(crate) fn structural<S: Into<String>>(line: usize, reason: S) -> Self {
        Error::Structural {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn header<S: Into<String>>(line: usize, reason: S) -> Self {
        Error::Header {
            line,
            reason: reason.into(),
        }
    }

    /// Attach a line number to errors raised without one.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Error::Structural { reason, .. } => Error::Structural { line, reason },
            Error::Header { reason, .. } => Error::Header { line, reason },
            Error::SchemaInconsistency { key, .. } => Error::SchemaInconsistency { line, key },
            e => e,
        }
    }
}
