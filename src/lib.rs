#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]
#[macro_use]
extern crate bitflags;

pub use event_descriptions::EventDescriptions;
pub use evtx_chunk::{EvtxChunk, EvtxChunkHeader};
pub use evtx_file_header::{EvtxFileHeader, HeaderFlags};
pub use evtx_parser::{EvtxParser, ReadSeek, EVTX_CHUNK_SIZE, EVTX_FILE_HEADER_SIZE};
pub use evtx_record::EvtxRecordHeader;

pub mod binxml;
pub mod err;

#[macro_use]
mod macros;

mod event_descriptions;
mod evtx_chunk;
mod evtx_file_header;
mod evtx_parser;
mod evtx_record;
mod guid;
mod name_stack;
mod ntsid;
mod template_cache;
mod utils;

/// Offset relative to the start of a 64 KiB chunk buffer.
pub type ChunkOffset = u32;
pub type FileOffset = u64;

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
