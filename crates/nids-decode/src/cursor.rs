//! Bounds-checked cursor over an immutable byte buffer
//!
//! Every protocol decoder reads its header through [`ByteCursor`]. A read
//! either returns the requested bytes or fails without advancing; the cursor
//! never panics and never copies.

use thiserror::Error;

/// A read ran past the end of the buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unexpected end of input at offset {position}: requested {requested} bytes, {available} available")]
pub struct CursorError {
    /// Read offset at the time of the failed read.
    pub position: usize,
    /// Number of bytes the caller asked for.
    pub requested: usize,
    /// Number of bytes that were actually left.
    pub available: usize,
}

/// Read position over a borrowed byte slice.
///
/// Invariant: `pos <= data.len()` at all times. Every successful read
/// advances `pos` by exactly the consumed length; a failed read leaves the
/// cursor untouched.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    /// The unread tail, without advancing.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), CursorError> {
        if n > self.remaining() {
            Err(CursorError {
                position: self.pos,
                requested: n,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Return the next `n` bytes without advancing.
    pub fn peek(&self, n: usize) -> Result<&'a [u8], CursorError> {
        self.check(n)?;
        Ok(&self.data[self.pos..self.pos + n])
    }

    /// Return the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Ok(bytes)
    }

    /// Advance past `n` bytes without returning them.
    pub fn skip(&mut self, n: usize) -> Result<(), CursorError> {
        self.check(n)?;
        self.pos += n;
        Ok(())
    }

    /// Return everything left and advance to the end.
    pub fn take_all(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    /// Shrink the readable window to the next `n` bytes.
    ///
    /// Used when a lower layer declares its payload length: trailing bytes
    /// (e.g. Ethernet padding) must never leak into upper-layer decoders.
    pub fn limit(&mut self, n: usize) -> Result<(), CursorError> {
        self.check(n)?;
        self.data = &self.data[..self.pos + n];
        Ok(())
    }

    pub fn take_u8(&mut self) -> Result<u8, CursorError> {
        let b = self.take(1)?;
        Ok(b[0])
    }

    pub fn take_u16_be(&mut self) -> Result<u16, CursorError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn take_u16_le(&mut self) -> Result<u16, CursorError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn take_u32_be(&mut self) -> Result<u32, CursorError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn take_u32_le(&mut self) -> Result<u32, CursorError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn take_u64_be(&mut self) -> Result<u64, CursorError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}
