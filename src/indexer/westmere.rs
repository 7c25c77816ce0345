//! SSE4.2-class scanner, 16-byte lanes.

use super::{ScanState, Tape, fallback, flush_block};
use core::arch::x86_64::{
    __m128i, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8, _mm_or_si128, _mm_set1_epi8,
};

/// Classifies 16 bytes into (special, blank) movemask bits.
#[target_feature(enable = "sse4.2")]
#[inline]
unsafe fn masks16(ptr: *const u8) -> (u32, u32) {
    // SAFETY: caller guarantees 16 readable bytes at ptr
    unsafe {
        let lane = _mm_loadu_si128(ptr.cast::<__m128i>());

        let nul = _mm_cmpeq_epi8(lane, _mm_set1_epi8(0x00));
        let newline = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b'\n' as i8));
        let quote = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b'"' as i8));
        let open = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b'(' as i8));
        let close = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b')' as i8));
        let semi = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b';' as i8));
        let slash = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b'\\' as i8));
        let special = _mm_or_si128(
            _mm_or_si128(_mm_or_si128(nul, newline), _mm_or_si128(quote, open)),
            _mm_or_si128(_mm_or_si128(close, semi), slash),
        );

        let space = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b' ' as i8));
        let tab = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b'\t' as i8));
        let cr = _mm_cmpeq_epi8(lane, _mm_set1_epi8(b'\r' as i8));
        let blank = _mm_or_si128(_mm_or_si128(space, tab), cr);

        (
            _mm_movemask_epi8(special) as u32,
            _mm_movemask_epi8(blank) as u32,
        )
    }
}

#[target_feature(enable = "sse4.2")]
pub(super) unsafe fn scan(bytes: &[u8], tape: &mut Tape) {
    let mut state = ScanState::default();
    let full_blocks = bytes.len() / 64;
    let ptr = bytes.as_ptr();

    for block in 0..full_blocks {
        let base = block * 64;
        let mut special = 0u64;
        let mut blank = 0u64;
        for lane in 0..4 {
            // SAFETY: base + lane * 16 + 16 <= full_blocks * 64 <= len
            let (s, b) = unsafe { masks16(ptr.add(base + lane * 16)) };
            special |= u64::from(s) << (lane * 16);
            blank |= u64::from(b) << (lane * 16);
        }
        flush_block(base, special, blank, !0, &mut state, tape);
    }

    // partial tail through the scalar classifier, no overread
    let tail = &bytes[full_blocks * 64..];
    if !tail.is_empty() {
        let (special, blank) = fallback::block_masks(tail);
        let valid = (1u64 << tail.len()) - 1;
        flush_block(full_blocks * 64, special, blank, valid, &mut state, tape);
    }
}
