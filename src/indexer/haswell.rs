//! AVX2-class scanner, 32-byte lanes.

use super::{ScanState, Tape, fallback, flush_block};
use core::arch::x86_64::{
    __m256i, _mm256_cmpeq_epi8, _mm256_loadu_si256, _mm256_movemask_epi8, _mm256_or_si256,
    _mm256_set1_epi8,
};

/// Classifies 32 bytes into (special, blank) movemask bits.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn masks32(ptr: *const u8) -> (u32, u32) {
    // SAFETY: caller guarantees 32 readable bytes at ptr
    unsafe {
        let lane = _mm256_loadu_si256(ptr.cast::<__m256i>());

        let nul = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(0x00));
        let newline = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b'\n' as i8));
        let quote = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b'"' as i8));
        let open = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b'(' as i8));
        let close = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b')' as i8));
        let semi = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b';' as i8));
        let slash = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b'\\' as i8));
        let special = _mm256_or_si256(
            _mm256_or_si256(_mm256_or_si256(nul, newline), _mm256_or_si256(quote, open)),
            _mm256_or_si256(_mm256_or_si256(close, semi), slash),
        );

        let space = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b' ' as i8));
        let tab = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b'\t' as i8));
        let cr = _mm256_cmpeq_epi8(lane, _mm256_set1_epi8(b'\r' as i8));
        let blank = _mm256_or_si256(_mm256_or_si256(space, tab), cr);

        (
            _mm256_movemask_epi8(special) as u32,
            _mm256_movemask_epi8(blank) as u32,
        )
    }
}

#[target_feature(enable = "avx2")]
pub(super) unsafe fn scan(bytes: &[u8], tape: &mut Tape) {
    let mut state = ScanState::default();
    let full_blocks = bytes.len() / 64;
    let ptr = bytes.as_ptr();

    for block in 0..full_blocks {
        let base = block * 64;
        // SAFETY: base + 64 <= full_blocks * 64 <= len
        let (lo_special, lo_blank) = unsafe { masks32(ptr.add(base)) };
        // SAFETY: as above
        let (hi_special, hi_blank) = unsafe { masks32(ptr.add(base + 32)) };
        let special = u64::from(lo_special) | (u64::from(hi_special) << 32);
        let blank = u64::from(lo_blank) | (u64::from(hi_blank) << 32);
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
