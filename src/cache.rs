//! The reusable RDATA accumulators handed to the sink.
//!
//! Blocks sit in a ring. The builder fills the current block, the sink
//! gets a stable slice into it, and the sink's return value names the
//! block the parser writes next. A sink that keeps returning a different
//! slot therefore gets a one-record look-behind for free: the slice it
//! saw last call stays untouched until the ring comes back around.

use crate::error::{Result, ZoneError};

/// Hard wire-format bound on a record's data.
pub const MAX_RDATA: usize = 65535;

/// One reusable RDATA accumulator.
pub struct Block {
    data: Vec<u8>,
}

#[allow(clippy::new_without_default)]
impl Block {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_RDATA),
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Appends raw octets, failing once the wire bound would break.
    #[inline]
    pub fn put(&mut self, octets: &[u8]) -> core::result::Result<(), &'static str> {
        if self.data.len() + octets.len() > MAX_RDATA {
            return Err("RDATA exceeds 65535 octets");
        }
        self.data.extend_from_slice(octets);
        Ok(())
    }

    #[inline]
    pub fn put_u8(&mut self, value: u8) -> core::result::Result<(), &'static str> {
        self.put(&[value])
    }

    #[inline]
    pub fn put_u16(&mut self, value: u16) -> core::result::Result<(), &'static str> {
        self.put(&value.to_be_bytes())
    }

    #[inline]
    pub fn put_u32(&mut self, value: u32) -> core::result::Result<(), &'static str> {
        self.put(&value.to_be_bytes())
    }
}

/// The ring itself. Size is fixed at open time and must be at least 1.
pub struct RdataCache {
    blocks: Vec<Block>,
    current: usize,
}

impl RdataCache {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ZoneError::BadParameter("rdata cache must hold at least one block"));
        }
        Ok(Self {
            blocks: (0..size).map(|_| Block::new()).collect(),
            current: 0,
        })
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> &Block {
        &self.blocks[self.current]
    }

    #[inline]
    #[must_use]
    pub fn current_mut(&mut self) -> &mut Block {
        &mut self.blocks[self.current]
    }

    /// Adopts the sink's choice of next writable block.
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.blocks.len() {
            return Err(ZoneError::BadParameter(
                "sink returned a block index past the cache size",
            ));
        }
        self.current = index;
        self.blocks[self.current].clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_cache_is_refused() {
        assert!(RdataCache::new(0).is_err());
    }

    #[test]
    fn blocks_refuse_to_grow_past_the_wire_bound() {
        let mut block = Block::new();
        block.put(&[0u8; MAX_RDATA]).unwrap();
        assert!(block.put(&[0]).is_err());
        assert_eq!(block.len(), MAX_RDATA);
    }

    #[test]
    fn select_rotates_and_clears() {
        let mut cache = RdataCache::new(2).unwrap();
        cache.current_mut().put(b"one").unwrap();
        cache.select(1).unwrap();
        cache.current_mut().put(b"two").unwrap();
        // the slice handed out for record one is still intact
        assert_eq!(cache.blocks[0].as_slice(), b"one");
        assert!(cache.select(2).is_err());
    }
}
