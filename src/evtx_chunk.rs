use crate::binxml::deserializer::{decode_fragment, ChunkDecodeState, ParseCtx};
use crate::err::{DeserializationError, DeserializationResult, EvtxError, Result};
use crate::event_descriptions::EventDescriptions;
use crate::evtx_record::{EvtxRecordHeader, EVTX_RECORD_HEADER_SIZE};
use crate::utils::ByteCursor;

use byteorder::ReadBytesExt;
use log::{debug, info, trace};
use std::fmt::Write as _;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

pub(crate) const EVTX_CHUNK_HEADER_SIZE: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvtxChunkHeader {
    pub first_event_record_number: u64,
    pub last_event_record_number: u64,
    pub first_event_record_id: u64,
    pub last_event_record_id: u64,
    pub header_size: u32,
}

impl EvtxChunkHeader {
    pub fn from_reader(input: &mut Cursor<&[u8]>) -> DeserializationResult<EvtxChunkHeader> {
        let mut magic = [0_u8; 8];
        input
            .take(8)
            .read_exact(&mut magic)
            .map_err(|e| DeserializationError::FailedToRead {
                offset: input.position(),
                t: "chunk_header_magic",
                source: e,
            })?;

        if &magic != b"ElfChnk\x00" {
            return Err(DeserializationError::InvalidEvtxChunkMagic { magic });
        }

        let first_event_record_number = try_read!(input, u64, "chunk_first_event_record_number")?;
        let last_event_record_number = try_read!(input, u64, "chunk_last_event_record_number")?;
        let first_event_record_id = try_read!(input, u64, "chunk_first_event_record_id")?;
        let last_event_record_id = try_read!(input, u64, "chunk_last_event_record_id")?;
        let header_size = try_read!(input, u32, "chunk_header_size")?;

        // The rest of the 0x200 header (offsets, checksums, string and
        // template tables) is not needed for a flat dump.
        input
            .seek(SeekFrom::Start(EVTX_CHUNK_HEADER_SIZE as u64))
            .map_err(|e| DeserializationError::FailedToRead {
                offset: input.position(),
                t: "chunk_header_reserved",
                source: e,
            })?;

        Ok(EvtxChunkHeader {
            first_event_record_number,
            last_event_record_number,
            first_event_record_id,
            last_event_record_id,
            header_size,
        })
    }

    fn declares_record(&self, record_id: u64) -> bool {
        self.first_event_record_number <= record_id && record_id <= self.last_event_record_number
    }
}

/// One 64 KiB chunk together with the decode state scoped to it. The
/// template cache and name stack are created fresh with the chunk and die
/// with it, which is what keeps chunks independently parseable.
pub struct EvtxChunk<'a, 'd> {
    pub data: &'a [u8],
    pub header: EvtxChunkHeader,
    state: ChunkDecodeState<'d>,
}

impl<'a, 'd> EvtxChunk<'a, 'd> {
    pub fn new(
        data: &'a [u8],
        header: EvtxChunkHeader,
        descriptions: &'d EventDescriptions,
    ) -> EvtxChunk<'a, 'd> {
        EvtxChunk {
            data,
            header,
            state: ChunkDecodeState::new(descriptions),
        }
    }

    /// Walks the records of the chunk, writing one line per event.
    ///
    /// Returns the in-chunk offset the walk stopped at. A record that fails
    /// to decode ends the chunk: silently if its record number is outside the
    /// range the chunk header declares, as a hard error otherwise. The failed
    /// record's partial line is left on the output either way.
    pub fn dump_records<W: Write>(&mut self, out: &mut W) -> Result<u64> {
        let mut offset = EVTX_CHUNK_HEADER_SIZE as u64;

        loop {
            if offset as usize + EVTX_RECORD_HEADER_SIZE > self.data.len() {
                break;
            }

            let mut cursor = Cursor::new(self.data);
            cursor.set_position(offset);

            let record_header = match EvtxRecordHeader::from_reader(&mut cursor) {
                Ok(record_header) => record_header,
                Err(DeserializationError::InvalidEvtxRecordHeaderMagic { .. }) => {
                    trace!("record magic mismatch at in-chunk offset {offset}, ending chunk");
                    break;
                }
                Err(e @ DeserializationError::InvalidFileTime { .. }) => {
                    return Err(e.into());
                }
                Err(e) => {
                    debug!("unreadable record header at in-chunk offset {offset}: {e}");
                    break;
                }
            };

            info!("Record id - {}", record_header.event_record_id);
            debug!("Record header - {:?}", record_header);

            if !record_header.is_valid_size() {
                let err = DeserializationError::InvalidRecordDataSize {
                    record_id: record_header.event_record_id,
                    size: record_header.data_size,
                };
                if self.header.declares_record(record_header.event_record_id) {
                    return Err(EvtxError::FailedToParseRecord {
                        record_id: record_header.event_record_id,
                        source: Box::new(err.into()),
                    });
                }
                debug!("{err}, record is outside the declared range, ending chunk");
                break;
            }

            let mut line = String::with_capacity(256);
            let _ = write!(
                line,
                "Record #{} {} ",
                record_header.event_record_id,
                record_header.timestamp.format("%Y-%m-%dT%H:%M:%SZ")
            );

            let body_offset = offset as usize + EVTX_RECORD_HEADER_SIZE;
            let mut ctx = ParseCtx::new(ByteCursor::with_pos(self.data, body_offset));

            match decode_fragment(&mut ctx, &mut self.state, &mut line) {
                Ok(()) => {
                    line.push('\n');
                    out.write_all(line.as_bytes())?;
                }
                Err(e) => {
                    // Keep whatever was rendered before the failure.
                    out.write_all(line.as_bytes())?;

                    if self.header.declares_record(record_header.event_record_id) {
                        return Err(EvtxError::FailedToParseRecord {
                            record_id: record_header.event_record_id,
                            source: Box::new(e.into()),
                        });
                    }

                    debug!(
                        "record {} failed ({e}) outside the declared range {}..={}, ending chunk",
                        record_header.event_record_id,
                        self.header.first_event_record_number,
                        self.header.last_event_record_number
                    );
                    break;
                }
            }

            offset += u64::from(record_header.data_size);
        }

        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk_header_bytes(first: u64, last: u64) -> Vec<u8> {
        let mut buf = Vec::with_capacity(EVTX_CHUNK_HEADER_SIZE);
        buf.extend_from_slice(b"ElfChnk\x00");
        buf.extend_from_slice(&first.to_le_bytes());
        buf.extend_from_slice(&last.to_le_bytes());
        buf.extend_from_slice(&first.to_le_bytes());
        buf.extend_from_slice(&last.to_le_bytes());
        buf.extend_from_slice(&128_u32.to_le_bytes());
        buf.resize(EVTX_CHUNK_HEADER_SIZE, 0);
        buf
    }

    #[test]
    fn test_parses_chunk_header() {
        let bytes = chunk_header_bytes(1, 91);
        let mut cursor = Cursor::new(bytes.as_slice());

        let header = EvtxChunkHeader::from_reader(&mut cursor).unwrap();
        assert_eq!(
            header,
            EvtxChunkHeader {
                first_event_record_number: 1,
                last_event_record_number: 91,
                first_event_record_id: 1,
                last_event_record_id: 91,
                header_size: 128,
            }
        );
        assert_eq!(cursor.position(), EVTX_CHUNK_HEADER_SIZE as u64);
        assert!(header.declares_record(1));
        assert!(header.declares_record(91));
        assert!(!header.declares_record(92));
    }

    #[test]
    fn test_rejects_bad_chunk_magic() {
        let bytes = vec![0_u8; EVTX_CHUNK_HEADER_SIZE];
        let mut cursor = Cursor::new(bytes.as_slice());

        assert!(matches!(
            EvtxChunkHeader::from_reader(&mut cursor),
            Err(DeserializationError::InvalidEvtxChunkMagic { .. })
        ));
    }

    #[test]
    fn test_empty_record_area_yields_no_output() {
        let mut chunk_data = chunk_header_bytes(0, 0);
        chunk_data.resize(65536, 0);

        let header = EvtxChunkHeader::from_reader(&mut Cursor::new(chunk_data.as_slice())).unwrap();
        let descriptions = EventDescriptions::default();
        let mut chunk = EvtxChunk::new(&chunk_data, header, &descriptions);

        let mut out = Vec::new();
        let end = chunk.dump_records(&mut out).unwrap();

        assert!(out.is_empty());
        assert_eq!(end, EVTX_CHUNK_HEADER_SIZE as u64);
    }
}
