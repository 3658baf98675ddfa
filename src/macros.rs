/// Tries to read a little-endian value from the cursor, capturing the position
/// and field name nicely on failure.
macro_rules! try_read {
    ($cursor: expr, u8, $what: expr) => {
        $cursor
            .read_u8()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                offset: $cursor.position(),
                t: $what,
                source: e,
            })
    };

    ($cursor: expr, u16, $what: expr) => {
        $cursor
            .read_u16::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                offset: $cursor.position(),
                t: $what,
                source: e,
            })
    };

    ($cursor: expr, u32, $what: expr) => {
        $cursor
            .read_u32::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                offset: $cursor.position(),
                t: $what,
                source: e,
            })
    };

    ($cursor: expr, u64, $what: expr) => {
        $cursor
            .read_u64::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                offset: $cursor.position(),
                t: $what,
                source: e,
            })
    };
}
