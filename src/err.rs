use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvtxError>;
pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;

/// Errors produced while decoding the wire format (headers, BinXml, values).
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("Offset {offset}: An I/O error has occurred while trying to read {t}")]
    FailedToRead {
        offset: u64,
        t: &'static str,
        source: std::io::Error,
    },

    #[error("Offset {offset}: unexpected end of data while reading {what} (need {need}, have {have})")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("Invalid EVTX file header magic, expected `ElfFile0`, found `{magic:02x?}`")]
    InvalidEvtxFileHeaderMagic { magic: [u8; 8] },

    #[error("Invalid EVTX chunk header magic, expected `ElfChnk0`, found `{magic:02x?}`")]
    InvalidEvtxChunkMagic { magic: [u8; 8] },

    #[error("Invalid EVTX record header magic, expected `2a2a0000`, found `{magic:02x?}`")]
    InvalidEvtxRecordHeaderMagic { magic: [u8; 4] },

    #[error("Unsupported EVTX file version {major}.{minor}, only 3.1 is supported")]
    UnsupportedFileVersion { major: u16, minor: u16 },

    #[error("Offset {offset}: Tried to read an invalid byte `{value:#04x}` as binxml token")]
    InvalidToken { value: u8, offset: u64 },

    #[error("Offset {offset}: Unsupported template instance version `{value:#04x}`")]
    InvalidTemplateInstanceVersion { value: u8, offset: u64 },

    #[error("Offset {offset}: SID value of declared size {size} is too short")]
    InvalidSid { size: u16, offset: u64 },

    #[error("FILETIME value {filetime:#018x} is out of the representable range")]
    InvalidFileTime { filetime: u64 },

    #[error("Record {record_id} declares an invalid total size {size}")]
    InvalidRecordDataSize { record_id: u64, size: u32 },
}

#[derive(Debug, Error)]
pub enum EvtxError {
    #[error("An I/O error has occurred")]
    IO {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to open file {}", path.display())]
    FailedToOpenFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    DeserializationError(#[from] DeserializationError),

    #[error("Failed to parse record {record_id}")]
    FailedToParseRecord {
        record_id: u64,
        source: Box<EvtxError>,
    },

    #[error("An unexpected error has occurred: {detail}")]
    Any { detail: String },
}

/// Generic error handler for quick prototyping, inspired by failure's `format_err!` macro.
#[macro_export]
macro_rules! format_err {
   ($($arg:tt)*) => { $crate::err::EvtxError::Any { detail: format!($($arg)*) } }
}
