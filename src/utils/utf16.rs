use crate::err::DeserializationResult;
use crate::utils::ByteCursor;

use encoding::all::UTF_16LE;
use encoding::{DecoderTrap, Encoding};

/// Names and literal values live in fixed 256-byte scratch buffers on the
/// wire-compatible implementations; we keep the same bound so oversized
/// strings truncate instead of growing without limit.
pub(crate) const MAX_STRING_BYTES: usize = 256;

/// A single UTF-16 code unit decoded in isolation. Unpaired surrogates are
/// mapped to U+FFFD, which occupies the same three bytes a BMP unit would.
#[inline]
pub(crate) fn decode_utf16_unit(unit: u16) -> char {
    char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Appends one decoded unit to `out`, never growing it to `cap` bytes or more.
pub(crate) fn push_utf16_unit(unit: u16, out: &mut String, cap: usize) {
    let c = decode_utf16_unit(unit);
    if out.len() + c.len_utf8() >= cap {
        return;
    }
    out.push(c);
}

/// Reads a 16-bit-length-prefixed UTF-16LE string into a bounded UTF-8 buffer.
///
/// At most 128 units are decoded (a full 256-byte scratch); the remaining
/// units, and the trailing NUL if `is_null_terminated`, are skipped so the
/// cursor always lands just past the string.
pub(crate) fn read_len_prefixed_utf16_string(
    cursor: &mut ByteCursor<'_>,
    is_null_terminated: bool,
) -> DeserializationResult<String> {
    let expected_units = cursor.u16_named("string_unit_count")?;

    let mut out = String::new();
    let mut read_units: u16 = 0;
    while read_units < expected_units && usize::from(read_units) * 2 < MAX_STRING_BYTES - 1 {
        let unit = cursor.u16_named("string_unit")?;
        push_utf16_unit(unit, &mut out, MAX_STRING_BYTES);
        read_units += 1;
    }

    let terminator_units = usize::from(is_null_terminated);
    let tail_units = usize::from(expected_units - read_units) + terminator_units;
    cursor.skip(tail_units * 2);

    Ok(out)
}

/// Decodes `size` bytes (rounded down to whole units) of UTF-16LE without a
/// length bound; used for string substitution payloads whose length comes
/// from the instance's value descriptor.
pub(crate) fn read_utf16_by_size(
    cursor: &mut ByteCursor<'_>,
    size: usize,
) -> DeserializationResult<String> {
    let bytes = cursor.take_bytes(size / 2 * 2, "utf16_value_data")?;

    Ok(UTF_16LE
        .decode(bytes, DecoderTrap::Replace)
        .unwrap_or_default())
}
