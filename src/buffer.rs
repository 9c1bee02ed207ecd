//! Zeroizing byte buffers and a small recycling pool.

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut, RangeBounds};
use std::vec::Drain;

use zeroize::Zeroize;

/// Pool of reusable [`Buf`] values.
///
/// Record processing churns through per-record scratch buffers (raw packet,
/// plaintext, wire image). The pool recycles them so steady-state operation
/// does not allocate.
#[derive(Default)]
pub struct BufferPool {
    free: VecDeque<Buf>,
}

impl BufferPool {
    /// Take a buffer from the pool.
    ///
    /// Creates a new buffer if none is free.
    pub fn pop(&mut self) -> Buf {
        self.free.pop_front().unwrap_or_default()
    }

    /// Return a buffer to the pool.
    ///
    /// The contents are wiped before the buffer becomes available again.
    pub fn push(&mut self, mut buffer: Buf) {
        buffer.0.zeroize();
        buffer.0.clear();
        self.free.push_back(buffer);
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("free", &self.free.len())
            .finish()
    }
}

/// A growable byte buffer that wipes its contents on drop.
///
/// Record payloads pass through plaintext stages; zeroizing keeps key
/// material and application data out of freed heap memory.
#[derive(Default)]
pub struct Buf(Vec<u8>);

impl Buf {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all contents.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Append the given bytes.
    pub fn extend_from_slice(&mut self, other: &[u8]) {
        self.0.extend_from_slice(other);
    }

    /// Append a single byte.
    pub fn push(&mut self, byte: u8) {
        self.0.push(byte);
    }

    /// Resize to `len`, filling new space with `value`.
    pub fn resize(&mut self, len: usize, value: u8) {
        self.0.resize(len, value);
    }

    /// Shorten to `len`. No-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Remove and iterate the given range.
    pub fn drain(&mut self, r: impl RangeBounds<usize>) -> Drain<'_, u8> {
        self.0.drain(r)
    }
}

impl Drop for Buf {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl aes_gcm::aead::Buffer for Buf {
    fn extend_from_slice(&mut self, other: &[u8]) -> aes_gcm::aead::Result<()> {
        self.0.extend_from_slice(other);
        Ok(())
    }

    fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl Deref for Buf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Buf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AsRef<[u8]> for Buf {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for Buf {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl fmt::Debug for Buf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buf").field("len", &self.0.len()).finish()
    }
}

/// Conversion into a [`Buf`].
pub trait ToBuf {
    /// Move or copy these bytes into a `Buf`.
    fn to_buf(self) -> Buf;
}

impl ToBuf for Vec<u8> {
    fn to_buf(self) -> Buf {
        Buf(self)
    }
}

impl ToBuf for &[u8] {
    fn to_buf(self) -> Buf {
        self.to_vec().to_buf()
    }
}
