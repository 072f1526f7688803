use thiserror::Error;

/// Error parsing or building a DNS packet
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Protocol(String),
    #[error("packet is smaller than header size")]
    HeaderTooShort,
    #[error("packet is has incomplete data")]
    UnexpectedEOF,
    #[error("wrong (too short or too long) size of RDATA")]
    WrongRdataLength,
    #[error("label in domain name has unknown label format")]
    UnknownLabelFormat,
    #[error("compression pointers followed more than {0} times")]
    CompressionLoop(usize),
    #[error("domain name is longer than 255 bytes")]
    NameTooLong,
    #[error("label {0:?} is longer than 63 bytes")]
    LabelTooLong(String),
    #[error("invalid characters encountered while writing label")]
    LabelIsNotAscii,
    #[error("record type {0} is not implemented")]
    UnsupportedRecordType(u16),
}

impl Error {
    /// Whether the error means the bytes on the wire are not a valid message
    pub fn is_malformed(&self) -> bool {
        match *self {
            Error::HeaderTooShort
            | Error::UnexpectedEOF
            | Error::WrongRdataLength
            | Error::UnknownLabelFormat
            | Error::CompressionLoop(_)
            | Error::NameTooLong
            | Error::LabelTooLong(_)
            | Error::LabelIsNotAscii => true,
            Error::Protocol(_) | Error::UnsupportedRecordType(_) => false,
        }
    }
}

/// Unwraps a value that must be present before a packet can be built.
///
/// Every field that can be left unresolved (an unknown opcode read off the
/// wire, a type that isn't in the catalog) goes through here.
pub fn required<T>(field: &str, value: Option<T>) -> Result<T, Error> {
    value.ok_or_else(|| Error::Protocol(format!("{} cannot be null", field)))
}
