use crate::err::{DeserializationError, EvtxError, Result};
use crate::event_descriptions::EventDescriptions;
use crate::evtx_chunk::{EvtxChunk, EvtxChunkHeader};
use crate::evtx_file_header::EvtxFileHeader;

use log::{debug, info};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

pub const EVTX_CHUNK_SIZE: usize = 65536;
pub const EVTX_FILE_HEADER_SIZE: usize = 4096;

pub trait ReadSeek: Read + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

impl<T: Read + Seek> ReadSeek for T {}

/// Walks an EVTX container chunk by chunk, dumping each record as a flat
/// `'key':value, ` line.
pub struct EvtxParser<T: ReadSeek> {
    data: T,
    header: EvtxFileHeader,
}

impl EvtxParser<File> {
    /// Attempts to load an evtx file, validating its header.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| EvtxError::FailedToOpenFile {
            source: e,
            path: path.to_path_buf(),
        })?;

        Self::from_read_seek(f)
    }
}

impl EvtxParser<Cursor<Vec<u8>>> {
    /// Attempts to load an evtx container from an in-memory buffer.
    pub fn from_buffer(buffer: Vec<u8>) -> Result<Self> {
        Self::from_read_seek(Cursor::new(buffer))
    }
}

impl<T: ReadSeek> EvtxParser<T> {
    pub fn from_read_seek(mut data: T) -> Result<Self> {
        let mut header_bytes = vec![0_u8; EVTX_FILE_HEADER_SIZE];
        data.seek(SeekFrom::Start(0))?;
        data.read_exact(&mut header_bytes)?;

        let header = EvtxFileHeader::from_stream(&mut Cursor::new(header_bytes.as_slice()))?;

        if !header.is_supported_version() {
            return Err(DeserializationError::UnsupportedFileVersion {
                major: header.major_version,
                minor: header.minor_version,
            }
            .into());
        }

        debug!("EVTX header: {:?}", header);

        Ok(EvtxParser { data, header })
    }

    pub fn header(&self) -> &EvtxFileHeader {
        &self.header
    }

    /// Dumps every record of every chunk to `out`.
    ///
    /// Iteration ends quietly at the first short chunk read or chunk-magic
    /// mismatch; those are how EVTX files normally end. An `Err` means the
    /// walk genuinely failed: an undecodable record inside a chunk's declared
    /// range, a record overrunning its chunk, or I/O trouble.
    pub fn dump_records<W: Write>(
        &mut self,
        descriptions: &EventDescriptions,
        out: &mut W,
    ) -> Result<()> {
        let mut chunk_data = vec![0_u8; EVTX_CHUNK_SIZE];
        let mut chunk_number: u64 = 0;

        loop {
            let chunk_offset =
                EVTX_FILE_HEADER_SIZE as u64 + chunk_number * EVTX_CHUNK_SIZE as u64;

            self.data.seek(SeekFrom::Start(chunk_offset))?;
            if !read_exact_or_eof(&mut self.data, &mut chunk_data)? {
                debug!("short read at chunk {chunk_number}, end of file");
                break;
            }

            let mut cursor = Cursor::new(chunk_data.as_slice());
            let chunk_header = match EvtxChunkHeader::from_reader(&mut cursor) {
                Ok(chunk_header) => chunk_header,
                Err(DeserializationError::InvalidEvtxChunkMagic { .. }) => {
                    debug!("chunk magic mismatch at chunk {chunk_number}, end of records");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            info!(
                "Chunk {chunk_number}: records {}..={}",
                chunk_header.first_event_record_number, chunk_header.last_event_record_number
            );

            let mut chunk = EvtxChunk::new(&chunk_data, chunk_header, descriptions);
            let records_end = chunk.dump_records(out)?;

            chunk_number += 1;

            // A record whose declared size runs past the next chunk base
            // poisons everything after it.
            let next_chunk_offset = EVTX_FILE_HEADER_SIZE as u64 + chunk_number * EVTX_CHUNK_SIZE as u64;
            if records_end > next_chunk_offset {
                return Err(crate::format_err!(
                    "records of chunk {} overran the next chunk base ({} > {})",
                    chunk_number - 1,
                    records_end,
                    next_chunk_offset
                ));
            }
        }

        Ok(())
    }
}

/// Fills `buf` completely, or reports `false` if EOF arrives first.
fn read_exact_or_eof<T: Read>(data: &mut T, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;

    while filled < buf.len() {
        match data.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(true)
}
