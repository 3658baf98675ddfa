use crate::err::DeserializationResult;
use crate::utils::{read_len_prefixed_utf16_string, ByteCursor};

use log::trace;
use std::fmt::{self, Formatter};

/// An element or attribute name.
///
/// Each distinct name is stored once per chunk and referenced by a 32-bit
/// chunk-absolute offset thereafter. The first reference usually points at
/// the bytes immediately following it, in which case the name is read in
/// place; later references jump back through the chunk buffer.
#[derive(Debug, PartialEq, Eq, PartialOrd, Clone, Hash)]
pub struct BinXmlName {
    str: String,
}

impl BinXmlName {
    pub(crate) fn from_binxml_stream(
        cursor: &mut ByteCursor<'_>,
    ) -> DeserializationResult<BinXmlName> {
        let name_offset = cursor.u32_named("name_offset")?;

        if u64::from(name_offset) == cursor.position() {
            return Self::read_at(cursor);
        }

        trace!(
            "Name offset {:#x} differs from current position {:#x}, following it",
            name_offset,
            cursor.position()
        );

        // The target is resolved against the enclosing chunk, not the
        // current window; the in-stream cursor stays where it is.
        let mut linked = cursor.at_offset(name_offset);
        Self::read_at(&mut linked)
    }

    fn read_at(cursor: &mut ByteCursor<'_>) -> DeserializationResult<BinXmlName> {
        let _next_string_offset = cursor.u32_named("name_next_string_offset")?;
        let _name_hash = cursor.u16_named("name_hash")?;
        let str = read_len_prefixed_utf16_string(cursor, true)?;

        Ok(BinXmlName { str })
    }

    pub fn as_str(&self) -> &str {
        &self.str
    }

    #[cfg(test)]
    pub(crate) fn from_str(s: &str) -> Self {
        BinXmlName { str: s.to_string() }
    }
}

impl fmt::Display for BinXmlName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.str)
    }
}
