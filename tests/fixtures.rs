#![allow(dead_code)]

use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

pub const EVTX_FILE_HEADER_SIZE: usize = 4096;
pub const EVTX_CHUNK_SIZE: usize = 65536;
pub const EVTX_RECORD_HEADER_SIZE: usize = 24;

/// FILETIME for 2020-01-01T00:00:00Z.
pub const FILETIME_2020_01_01: u64 = 132_223_104_000_000_000;

/// A 4096-byte EVTX file header with the given version.
pub fn file_header_with_version(minor: u16, major: u16, chunk_count: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(EVTX_FILE_HEADER_SIZE);
    buf.extend_from_slice(b"ElfFile\x00");
    buf.extend_from_slice(&0_u64.to_le_bytes()); // oldest chunk
    buf.extend_from_slice(&u64::from(chunk_count.saturating_sub(1)).to_le_bytes());
    buf.extend_from_slice(&1_u64.to_le_bytes()); // next record id
    buf.extend_from_slice(&128_u32.to_le_bytes()); // header size
    buf.extend_from_slice(&minor.to_le_bytes());
    buf.extend_from_slice(&major.to_le_bytes());
    buf.extend_from_slice(&4096_u16.to_le_bytes()); // block size
    buf.extend_from_slice(&chunk_count.to_le_bytes());
    buf.resize(EVTX_FILE_HEADER_SIZE, 0);
    buf
}

pub fn file_header(chunk_count: u16) -> Vec<u8> {
    file_header_with_version(1, 3, chunk_count)
}

/// Glues a file header and finished chunks into a complete container.
pub fn build_file(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut file = file_header(chunks.len() as u16);
    for chunk in chunks {
        assert_eq!(chunk.len(), EVTX_CHUNK_SIZE, "chunks must be finished");
        file.extend_from_slice(chunk);
    }
    file
}

/// Builds a 64 KiB chunk: a 0x200-byte header followed by records.
pub struct ChunkBuilder {
    data: Vec<u8>,
}

impl ChunkBuilder {
    pub fn new(first_record_number: u64, last_record_number: u64) -> Self {
        let mut data = Vec::with_capacity(EVTX_CHUNK_SIZE);
        data.extend_from_slice(b"ElfChnk\x00");
        data.extend_from_slice(&first_record_number.to_le_bytes());
        data.extend_from_slice(&last_record_number.to_le_bytes());
        data.extend_from_slice(&first_record_number.to_le_bytes());
        data.extend_from_slice(&last_record_number.to_le_bytes());
        data.extend_from_slice(&128_u32.to_le_bytes());
        data.resize(0x200, 0);

        ChunkBuilder { data }
    }

    /// Appends one record whose BinXml payload is produced by `build`.
    /// The builder passed to the closure knows its absolute position within
    /// the chunk, which is what inline name offsets are measured against.
    pub fn add_record(
        &mut self,
        record_id: u64,
        filetime: u64,
        build: impl FnOnce(&mut BinXmlBuilder),
    ) {
        let body_start = self.data.len() + EVTX_RECORD_HEADER_SIZE;
        let mut builder = BinXmlBuilder::new(body_start);
        build(&mut builder);
        let binxml = builder.into_bytes();

        let total_size = (EVTX_RECORD_HEADER_SIZE + binxml.len() + 4) as u32;
        self.data.extend_from_slice(b"\x2a\x2a\x00\x00");
        self.data.extend_from_slice(&total_size.to_le_bytes());
        self.data.extend_from_slice(&record_id.to_le_bytes());
        self.data.extend_from_slice(&filetime.to_le_bytes());
        self.data.extend_from_slice(&binxml);
        self.data.extend_from_slice(&total_size.to_le_bytes());
    }

    /// Appends a record with a raw payload and an explicit size field.
    pub fn add_raw_record(&mut self, record_id: u64, filetime: u64, payload: &[u8], size: u32) {
        self.data.extend_from_slice(b"\x2a\x2a\x00\x00");
        self.data.extend_from_slice(&size.to_le_bytes());
        self.data.extend_from_slice(&record_id.to_le_bytes());
        self.data.extend_from_slice(&filetime.to_le_bytes());
        self.data.extend_from_slice(payload);
    }

    pub fn finish(mut self) -> Vec<u8> {
        assert!(self.data.len() <= EVTX_CHUNK_SIZE, "chunk overflow");
        self.data.resize(EVTX_CHUNK_SIZE, 0);
        self.data
    }
}

/// Emits BinXml token streams with chunk-absolute name offsets.
pub struct BinXmlBuilder {
    start: usize,
    buf: Vec<u8>,
    body_len_patch: Option<usize>,
}

impl BinXmlBuilder {
    pub fn new(start: usize) -> Self {
        BinXmlBuilder {
            start,
            buf: Vec::new(),
            body_len_patch: None,
        }
    }

    /// Absolute position of the next byte within the chunk.
    pub fn pos(&self) -> usize {
        self.start + self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        assert!(
            self.body_len_patch.is_none(),
            "unfinished template definition"
        );
        self.buf
    }

    pub fn fragment_header(&mut self) {
        self.buf.extend_from_slice(&[0x0f, 0x01, 0x01, 0x00]);
    }

    pub fn eof(&mut self) {
        self.buf.push(0x00);
    }

    /// `u32 next link + u16 hash + u16 unit count + UTF-16LE + u16 NUL`,
    /// preceded by the offset field pointing right past itself.
    /// Returns the chunk offset of the name structure for back references.
    fn inline_name(&mut self, name: &str) -> u32 {
        let name_offset = (self.pos() + 4) as u32;
        self.buf.extend_from_slice(&name_offset.to_le_bytes());
        self.buf.extend_from_slice(&0_u32.to_le_bytes()); // next link
        self.buf.extend_from_slice(&0_u16.to_le_bytes()); // hash

        let units: Vec<u16> = name.encode_utf16().collect();
        self.buf
            .extend_from_slice(&(units.len() as u16).to_le_bytes());
        for unit in units {
            self.buf.extend_from_slice(&unit.to_le_bytes());
        }
        self.buf.extend_from_slice(&[0, 0]);

        name_offset
    }

    pub fn open_element(&mut self, name: &str) -> u32 {
        self.buf.push(0x01);
        self.buf.extend_from_slice(&0_u16.to_le_bytes()); // dependency id
        self.buf.extend_from_slice(&0_u32.to_le_bytes()); // element length, unused
        self.inline_name(name)
    }

    pub fn open_element_with_attrs(&mut self, name: &str) -> u32 {
        self.buf.push(0x41);
        self.buf.extend_from_slice(&0_u16.to_le_bytes());
        self.buf.extend_from_slice(&0_u32.to_le_bytes());
        let offset = self.inline_name(name);
        self.buf.extend_from_slice(&0_u32.to_le_bytes()); // attribute list length, unused
        offset
    }

    /// Opens an element through a back reference to an earlier name.
    pub fn open_element_ref(&mut self, name_offset: u32) {
        self.buf.push(0x01);
        self.buf.extend_from_slice(&0_u16.to_le_bytes());
        self.buf.extend_from_slice(&0_u32.to_le_bytes());
        self.buf.extend_from_slice(&name_offset.to_le_bytes());
    }

    pub fn close_start(&mut self) {
        self.buf.push(0x02);
    }

    pub fn close_empty(&mut self) {
        self.buf.push(0x03);
    }

    pub fn close_element(&mut self) {
        self.buf.push(0x04);
    }

    pub fn attribute(&mut self, name: &str) {
        self.buf.push(0x06);
        self.inline_name(name);
    }

    pub fn value_text(&mut self, value: &str) {
        self.buf.push(0x05);
        self.buf.push(0x01); // string type discriminator
        let units: Vec<u16> = value.encode_utf16().collect();
        self.buf
            .extend_from_slice(&(units.len() as u16).to_le_bytes());
        for unit in units {
            self.buf.extend_from_slice(&unit.to_le_bytes());
        }
    }

    pub fn substitution(&mut self, index: u16, value_type: u8) {
        self.buf.push(0x0e);
        self.buf.extend_from_slice(&index.to_le_bytes());
        self.buf.push(value_type);
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Starts a template instance with an inline definition. Write the body
    /// tokens next, then `end_template_definition`, then `instance_args`.
    pub fn begin_template_instance_with_definition(&mut self, template_id: u32) {
        self.buf.push(0x0c);
        self.buf.push(0x01); // instance version
        self.buf.extend_from_slice(&template_id.to_le_bytes());
        self.buf.extend_from_slice(&0_u32.to_le_bytes()); // residual length
        self.buf.extend_from_slice(&0_u32.to_le_bytes()); // pre-definition count
        self.buf.extend_from_slice(&[0_u8; 16]); // template GUID

        // Body length gets patched once the body is written.
        self.body_len_patch = Some(self.buf.len());
        self.buf.extend_from_slice(&0_u32.to_le_bytes());
    }

    pub fn end_template_definition(&mut self) {
        let patch_at = self
            .body_len_patch
            .take()
            .expect("no template definition in progress");
        let body_len = (self.buf.len() - patch_at - 4) as u32;
        self.buf[patch_at..patch_at + 4].copy_from_slice(&body_len.to_le_bytes());
    }

    /// Starts an instance of an already-defined template.
    pub fn template_instance_known(&mut self, template_id: u32) {
        self.buf.push(0x0c);
        self.buf.push(0x01);
        self.buf.extend_from_slice(&template_id.to_le_bytes());
        self.buf.extend_from_slice(&0_u32.to_le_bytes()); // residual length
    }

    /// The instance's argument table: `(size, type)` descriptors followed by
    /// the concatenated value blobs.
    pub fn instance_args(&mut self, descriptors: &[(u16, u16)], values: &[u8]) {
        self.buf
            .extend_from_slice(&(descriptors.len() as u32).to_le_bytes());
        for (size, value_type) in descriptors {
            self.buf.extend_from_slice(&size.to_le_bytes());
            self.buf.extend_from_slice(&value_type.to_le_bytes());
        }
        self.buf.extend_from_slice(values);
    }
}

/// UTF-16LE bytes of `s`, without a terminator.
pub fn utf16_bytes(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() * 2);
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}
