use crate::err::{DeserializationError, DeserializationResult};
use crate::utils::datetime_from_filetime;

use byteorder::ReadBytesExt;
use chrono::{DateTime, Utc};
use std::io::{Cursor, Read};

pub(crate) const EVTX_RECORD_HEADER_SIZE: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvtxRecordHeader {
    /// Total record size: header, BinXml payload and the trailing size copy.
    pub data_size: u32,
    pub event_record_id: u64,
    pub timestamp: DateTime<Utc>,
}

impl EvtxRecordHeader {
    pub fn from_reader(input: &mut Cursor<&[u8]>) -> DeserializationResult<EvtxRecordHeader> {
        let mut magic = [0_u8; 4];
        input
            .take(4)
            .read_exact(&mut magic)
            .map_err(|e| DeserializationError::FailedToRead {
                offset: input.position(),
                t: "record_header_magic",
                source: e,
            })?;

        if &magic != b"\x2a\x2a\x00\x00" {
            return Err(DeserializationError::InvalidEvtxRecordHeaderMagic { magic });
        }

        let size = try_read!(input, u32, "record_data_size")?;
        let record_id = try_read!(input, u64, "record_event_record_id")?;
        let filetime = try_read!(input, u64, "record_filetime")?;

        let timestamp = datetime_from_filetime(filetime)
            .ok_or(DeserializationError::InvalidFileTime { filetime })?;

        Ok(EvtxRecordHeader {
            data_size: size,
            event_record_id: record_id,
            timestamp,
        })
    }

    /// A record cannot be smaller than its own header plus the trailing size
    /// replica; a smaller value would stall the walk in place.
    pub fn is_valid_size(&self) -> bool {
        self.data_size >= (EVTX_RECORD_HEADER_SIZE + 4) as u32
    }
}
