#![allow(clippy::multiple_unsafe_ops_per_block)] //annoying convention

use core::mem::MaybeUninit;

/// Total capacity of a sliding input window.
///
/// Must exceed the SIMD stride plus the longest legal token. The worst
/// legal token is the base64 text of a 65535-octet RDATA blob (~87 KiB),
/// so 128 KiB leaves comfortable headroom.
pub const WINDOW_SIZE: usize = 128 * 1024;

/// Slack past the valid length for the EOF sentinel and vector overreads.
pub const WINDOW_PAD: usize = 64;

/**
 A 64-byte-aligned, lazily-initialised byte store for the scanner.

 The structural indexer reads this memory in full vector lanes, so the
 start must sit on a 64-byte boundary and the tail carries `WINDOW_PAD`
 bytes of slack that the indexer may read (never report) past the valid
 length.

 # Safety
 The store uses `MaybeUninit` internally, so callers must only read back
 ranges they have written. All unsafe methods document their requirements.
*/
#[repr(C, align(64))]
pub struct AlignedStore<const SIZE: usize> {
    data: MaybeUninit<[u8; SIZE]>,
}

#[allow(clippy::new_without_default)]
impl<const SIZE: usize> AlignedStore<SIZE> {
    /// Creates a new uninitialised store.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            data: MaybeUninit::uninit(),
        }
    }

    /// Returns a mutable pointer to the store's data.
    #[inline]
    #[must_use]
    pub const fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr().cast()
    }

    /// Returns a const pointer to the store's data.
    #[inline]
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr().cast()
    }

    /**
     Returns a shared slice over `len` bytes from the front.

     # Safety
     The first `len` bytes must have been initialised.
    */
    #[inline]
    pub const unsafe fn slice(&self, len: usize) -> &[u8] {
        debug_assert!(len <= SIZE);
        // SAFETY: caller guarantees the prefix is initialised
        unsafe { core::slice::from_raw_parts(self.as_ptr(), len) }
    }

    /**
     Returns a mutable slice over `len` bytes from the front.

     # Safety
     The first `len` bytes must have been initialised.
    */
    #[inline]
    pub const unsafe fn slice_mut(&mut self, len: usize) -> &mut [u8] {
        debug_assert!(len <= SIZE);
        // SAFETY: caller guarantees the prefix is initialised
        unsafe { core::slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }
}

/**
 The sliding input window a file frame reads through.

 `data[pos..len]` is unread input, `data[..pos]` is consumed. Refilling
 compacts the unread span to the front and tops the window up from the
 stream, so token offsets are only stable between refills. The byte at
 `data[len]` is a NUL sentinel once the stream hits EOF.
*/
pub struct Window {
    store: Box<AlignedStore<{ WINDOW_SIZE + WINDOW_PAD }>>,
    /// Bytes of `store` holding valid input.
    len: usize,
    /// Read cursor, `<= len`.
    pos: usize,
}

#[allow(clippy::new_without_default)]
impl Window {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Box::new(AlignedStore::new()),
            len: 0,
            pos: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub const fn set_pos(&mut self, pos: usize) {
        debug_assert!(pos <= self.len);
        self.pos = pos;
    }

    /// The full valid span, consumed bytes included.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        // SAFETY: data[..len] is always written before len is advanced
        unsafe { self.store.slice(self.len) }
    }

    /// One byte of the valid span.
    #[inline]
    #[must_use]
    pub fn byte(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.len);
        self.bytes()[offset]
    }

    /// A sub-span of the valid bytes.
    #[inline]
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.bytes()[start..end]
    }

    /// Free capacity past the valid length (the pad slack excluded).
    #[inline]
    #[must_use]
    pub const fn spare(&self) -> usize {
        WINDOW_SIZE - self.len
    }

    /**
     Slides `data[keep_from..len]` to the front of the window.

     Returns the shift amount so callers can rebase any offsets they kept.
     After the call `pos` is 0 and the kept bytes start the window.
    */
    pub fn compact(&mut self, keep_from: usize) -> usize {
        debug_assert!(keep_from <= self.len);
        let kept = self.len - keep_from;
        if keep_from != 0 && kept != 0 {
            let ptr = self.store.as_mut_ptr();
            // SAFETY: both ranges lie in the initialised prefix; copy handles overlap
            unsafe { core::ptr::copy(ptr.add(keep_from), ptr, kept) };
        }
        self.len = kept;
        self.pos = 0;
        keep_from
    }

    /**
     Tops the window up from `read`, looping until full or EOF.

     Returns `true` when the stream is exhausted. On EOF the NUL sentinel
     is written at `data[len]` (the pad slack guarantees room).
    */
    pub fn fill_from<R: std::io::Read>(&mut self, read: &mut R) -> std::io::Result<bool> {
        // MaybeUninit tail handed to read(): zero it once up front so every
        // slice we lend out is initialised memory.
        let zero_from = self.len;
        {
            let ptr = self.store.as_mut_ptr();
            // SAFETY: zeroing the tail up to capacity, all in bounds
            unsafe {
                core::slice::from_raw_parts_mut(ptr.add(zero_from), WINDOW_SIZE - zero_from)
            }
            .fill(0);
        }
        while self.len < WINDOW_SIZE {
            let ptr = self.store.as_mut_ptr();
            // SAFETY: the whole tail was zeroed above, so this span is
            // initialised and in bounds
            let dst = unsafe {
                core::slice::from_raw_parts_mut(ptr.add(self.len), WINDOW_SIZE - self.len)
            };
            match read.read(dst) {
                Ok(0) => {
                    self.set_sentinel();
                    return Ok(true);
                }
                Ok(n) => self.len += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }

    /// Adopts `bytes` wholesale, for in-memory input up to `WINDOW_SIZE`.
    pub fn load(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= WINDOW_SIZE);
        let ptr = self.store.as_mut_ptr();
        // SAFETY: length checked against capacity above
        unsafe { core::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len()) };
        self.len = bytes.len();
        self.pos = 0;
    }

    /// Writes the EOF sentinel just past the valid bytes.
    #[inline]
    pub fn set_sentinel(&mut self) {
        let ptr = self.store.as_mut_ptr();
        // SAFETY: len <= WINDOW_SIZE and the pad guarantees len is in bounds
        unsafe { ptr.add(self.len).write(0) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_cache_line_aligned() {
        let store = Box::new(AlignedStore::<{ WINDOW_SIZE + WINDOW_PAD }>::new());
        assert!((store.as_ptr() as usize) % 64 == 0, "window must sit on a 64-byte boundary");
    }

    #[test]
    fn compact_rebases_unread_bytes() {
        let mut w = Window::new();
        w.load(b"consumed-KEEP");
        w.set_pos(9);
        let shift = w.compact(9);
        assert_eq!(shift, 9);
        assert_eq!(w.bytes(), b"KEEP");
        assert_eq!(w.pos(), 0);
    }

    #[test]
    fn fill_sets_sentinel_at_eof() {
        let mut w = Window::new();
        let mut src: &[u8] = b"abc";
        let eof = w.fill_from(&mut src).unwrap();
        assert!(eof);
        assert_eq!(w.bytes(), b"abc");
    }
}
