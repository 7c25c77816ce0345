//! Portable scalar scanner. Also classifies the partial tail block for the
//! vector variants, so every implementation ends a window identically.

use super::{CLASS, CLASS_BLANK, CLASS_SPECIAL, ScanState, Tape, flush_block};

/// Builds the (special, blank) masks for up to 64 bytes.
#[inline]
pub(super) fn block_masks(block: &[u8]) -> (u64, u64) {
    debug_assert!(block.len() <= 64);
    let mut special = 0u64;
    let mut blank = 0u64;
    for (i, &byte) in block.iter().enumerate() {
        let class = CLASS[byte as usize];
        special |= u64::from(class & CLASS_SPECIAL) << i;
        blank |= u64::from((class & CLASS_BLANK) >> 1) << i;
    }
    (special, blank)
}

pub(super) fn scan(bytes: &[u8], tape: &mut Tape) {
    let mut state = ScanState::default();
    for (block_index, block) in bytes.chunks(64).enumerate() {
        let (special, blank) = block_masks(block);
        let valid = if block.len() == 64 {
            !0
        } else {
            (1u64 << block.len()) - 1
        };
        flush_block(block_index * 64, special, blank, valid, &mut state, tape);
    }
}
