use crate::err::{DeserializationError, DeserializationResult};
use crate::ChunkOffset;

/// A lightweight cursor over an immutable byte slice with an explicit window.
///
/// This is the slice/offset equivalent of `Cursor<&[u8]>`, intended for the
/// BinXml hot path where:
/// - the data is already in memory (one chunk buffer), and
/// - reads must never cross the current window, while absolute name lookups
///   must still be able to reach the whole chunk.
///
/// Positions are always absolute within the underlying buffer, so a child
/// window shares the coordinate space of its parent. All reads are
/// little-endian and advance the cursor on success.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        ByteCursor {
            buf,
            pos: 0,
            end: buf.len(),
        }
    }

    /// A cursor starting at `pos` whose window spans the whole buffer.
    pub(crate) fn with_pos(buf: &'a [u8], pos: usize) -> Self {
        ByteCursor {
            buf,
            pos,
            end: buf.len(),
        }
    }

    /// A child window over the next `len` bytes, clamped to the parent window.
    pub(crate) fn sub_window(&self, len: usize) -> Self {
        ByteCursor {
            buf: self.buf,
            pos: self.pos,
            end: self.end.min(self.pos.saturating_add(len)),
        }
    }

    /// A temporary cursor over the enclosing chunk buffer, used to resolve
    /// absolute name offsets outside the current window.
    pub(crate) fn at_offset(&self, offset: ChunkOffset) -> Self {
        ByteCursor {
            buf: self.buf,
            pos: offset as usize,
            end: self.buf.len(),
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn position(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    pub(crate) fn window_end(&self) -> usize {
        self.end
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    #[inline]
    pub(crate) fn has_data(&self) -> bool {
        self.pos < self.end
    }

    /// Advances without bounds checking; a position past the window simply
    /// makes subsequent reads fail and ends the token loop.
    #[inline]
    pub(crate) fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    #[inline]
    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub(crate) fn seek_to_end(&mut self) {
        self.pos = self.end;
    }

    #[inline]
    fn check(&self, need: usize, what: &'static str) -> DeserializationResult<()> {
        let available = self.remaining();
        if need > available {
            return Err(DeserializationError::Truncated {
                what,
                offset: self.position(),
                need,
                have: available,
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn u8_named(&mut self, what: &'static str) -> DeserializationResult<u8> {
        self.check(1, what)?;
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    #[inline]
    pub(crate) fn u16_named(&mut self, what: &'static str) -> DeserializationResult<u16> {
        self.check(2, what)?;
        let v = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    pub(crate) fn u32_named(&mut self, what: &'static str) -> DeserializationResult<u32> {
        let bytes = self.array::<4>(what)?;
        Ok(u32::from_le_bytes(bytes))
    }

    #[inline]
    pub(crate) fn u64_named(&mut self, what: &'static str) -> DeserializationResult<u64> {
        let bytes = self.array::<8>(what)?;
        Ok(u64::from_le_bytes(bytes))
    }

    #[inline]
    pub(crate) fn array<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> DeserializationResult<[u8; N]> {
        self.check(N, what)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    #[inline]
    pub(crate) fn take_bytes(
        &mut self,
        len: usize,
        what: &'static str,
    ) -> DeserializationResult<&'a [u8]> {
        self.check(len, what)?;
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }
}
