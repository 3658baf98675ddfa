mod byte_cursor;
mod time;
mod utf16;

pub(crate) use self::byte_cursor::ByteCursor;
pub use self::time::datetime_from_filetime;
pub(crate) use self::utf16::{
    decode_utf16_unit, read_len_prefixed_utf16_string, read_utf16_by_size,
};
