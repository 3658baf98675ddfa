use crate::err::{DeserializationError, DeserializationResult};

use byteorder::ReadBytesExt;
use std::io::{Cursor, Read, Seek, SeekFrom};

#[derive(Debug, PartialEq, Eq)]
pub struct EvtxFileHeader {
    pub first_chunk_number: u64,
    pub last_chunk_number: u64,
    pub next_record_id: u64,
    pub header_size: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub header_block_size: u16,
    pub chunk_count: u16,
    pub flags: HeaderFlags,
    // Checksum is of first 120 bytes of header, never verified here.
    pub checksum: u32,
}

bitflags! {
    #[derive(Debug, PartialEq, Eq)]
    pub struct HeaderFlags: u32 {
        const EMPTY = 0x0;
        const DIRTY = 0x1;
        const FULL = 0x2;
        const NO_CRC32 = 0x4;
    }
}

impl EvtxFileHeader {
    pub fn from_stream(stream: &mut Cursor<&[u8]>) -> DeserializationResult<EvtxFileHeader> {
        let mut magic = [0_u8; 8];
        stream
            .take(8)
            .read_exact(&mut magic)
            .map_err(|e| DeserializationError::FailedToRead {
                offset: 0,
                t: "file_header_magic",
                source: e,
            })?;

        if &magic != b"ElfFile\x00" {
            return Err(DeserializationError::InvalidEvtxFileHeaderMagic { magic });
        }

        let oldest_chunk = try_read!(stream, u64, "file_header_oldest_chunk")?;
        let current_chunk_num = try_read!(stream, u64, "file_header_current_chunk_num")?;
        let next_record_num = try_read!(stream, u64, "file_header_next_record_num")?;
        let header_size = try_read!(stream, u32, "file_header_header_size")?;
        let minor_version = try_read!(stream, u16, "file_header_minor_version")?;
        let major_version = try_read!(stream, u16, "file_header_major_version")?;
        let header_block_size = try_read!(stream, u16, "file_header_header_block_size")?;
        let chunk_count = try_read!(stream, u16, "file_header_chunk_count")?;

        // unused
        stream
            .seek(SeekFrom::Current(76))
            .map_err(|e| DeserializationError::FailedToRead {
                offset: stream.position(),
                t: "file_header_reserved",
                source: e,
            })?;

        let raw_flags = try_read!(stream, u32, "file_header_flags")?;
        let flags = HeaderFlags::from_bits_truncate(raw_flags);
        let checksum = try_read!(stream, u32, "file_header_checksum")?;

        Ok(EvtxFileHeader {
            first_chunk_number: oldest_chunk,
            last_chunk_number: current_chunk_num,
            next_record_id: next_record_num,
            header_block_size,
            minor_version,
            major_version,
            header_size,
            chunk_count,
            flags,
            checksum,
        })
    }

    /// Only 3.1 files are supported; everything seen in the wild is 3.1
    /// (the combined version dword `0x00030001`).
    pub fn is_supported_version(&self) -> bool {
        self.major_version == 3 && self.minor_version == 1
    }
}
