//! The structural indexer: finds the bytes the lexer cares about.
//!
//! The scanner walks the window in 64-byte blocks and derives two bitmasks
//! per block, one for special characters (`"` `(` `)` `;` `\` newline NUL)
//! and one for blanks (space, tab, CR). From those it computes the offsets
//! of every special byte and every blank/ordinary run boundary and appends
//! them to the tape. The lexer slices the window between consecutive tape
//! entries, so "find interesting bytes" stays branch-free and vector-wide
//! while "interpret them" stays scalar and stateful.
//!
//! Three implementations exist. All must produce byte-identical tapes for
//! identical input, which the differential tests below enforce.

mod fallback;
#[cfg(target_arch = "x86_64")]
mod haswell;
#[cfg(target_arch = "x86_64")]
mod westmere;

/// Environment variable naming the preferred scanner variant.
/// Unknown or unavailable names silently fall back to CPU detection.
pub const TARGET_ENV: &str = "ZONE_TARGET";

/// Bit 0 of the class table: special structural byte.
const CLASS_SPECIAL: u8 = 1;
/// Bit 1 of the class table: blank.
const CLASS_BLANK: u8 = 2;

/// Byte classifier shared by the scalar scanner and the tests.
static CLASS: [u8; 256] = build_class();

const fn build_class() -> [u8; 256] {
    let mut table = [0u8; 256];
    table[0x00] = CLASS_SPECIAL; // NUL, embedded or the EOF sentinel
    table[b'\n' as usize] = CLASS_SPECIAL;
    table[b'"' as usize] = CLASS_SPECIAL;
    table[b'(' as usize] = CLASS_SPECIAL;
    table[b')' as usize] = CLASS_SPECIAL;
    table[b';' as usize] = CLASS_SPECIAL;
    table[b'\\' as usize] = CLASS_SPECIAL;
    table[b' ' as usize] = CLASS_BLANK;
    table[b'\t' as usize] = CLASS_BLANK;
    table[b'\r' as usize] = CLASS_BLANK;
    table
}

/// The ordered stream of structural byte offsets for one window.
///
/// The indexer writes ahead, the lexer reads behind through `head`.
pub struct Tape {
    entries: Vec<u32>,
    head: usize,
}

#[allow(clippy::new_without_default)]
impl Tape {
    #[must_use]
    pub fn new() -> Self {
        Self {
            // one entry per eight input bytes is the common texture,
            // pathological input just grows the vec
            entries: Vec::with_capacity(crate::buffer::WINDOW_SIZE / 8),
            head: 0,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
        self.head = 0;
    }

    #[inline]
    pub fn push(&mut self, offset: u32) {
        self.entries.push(offset);
    }

    /// Next unconsumed offset, if any.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Option<u32> {
        self.entries.get(self.head).copied()
    }

    /// Consumes the entry `peek` reported.
    #[inline]
    pub const fn bump(&mut self) {
        self.head += 1;
    }

    #[inline]
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.head >= self.entries.len()
    }

    #[cfg(test)]
    #[must_use]
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }
}

/// Whether the lexer should treat `byte` as a token separator.
#[inline]
#[must_use]
pub(crate) fn is_blank(byte: u8) -> bool {
    CLASS[byte as usize] & CLASS_BLANK != 0
}

/// Whether `byte` is one of the structural specials.
#[inline]
#[must_use]
pub(crate) fn is_special(byte: u8) -> bool {
    CLASS[byte as usize] & CLASS_SPECIAL != 0
}

/// Run-boundary carries threaded across blocks within one scan.
#[derive(Default)]
struct ScanState {
    carry_ordinary: u64,
    carry_blank: u64,
}

/// Derives boundary bits for one block and appends set offsets to the tape.
///
/// `valid` masks the live bytes of a partial tail block. The boundary rule:
/// every special byte is structural, and so is the first byte of every
/// ordinary run and every blank run. Benign extra entries (a blank-run
/// start following a special) are fine, the lexer filters them.
#[inline]
fn flush_block(
    base: usize,
    special: u64,
    blank: u64,
    valid: u64,
    state: &mut ScanState,
    tape: &mut Tape,
) {
    let special = special & valid;
    let blank = blank & valid;
    let ordinary = !(special | blank) & valid;

    let ordinary_start = ordinary & !((ordinary << 1) | state.carry_ordinary);
    let blank_start = blank & !((blank << 1) | state.carry_blank);
    state.carry_ordinary = ordinary >> 63;
    state.carry_blank = blank >> 63;

    let mut bits = special | ordinary_start | blank_start;
    while bits != 0 {
        #[allow(clippy::cast_possible_truncation)]
        tape.push((base + bits.trailing_zeros() as usize) as u32);
        bits &= bits - 1;
    }
}

/// A scanner implementation, named after the CPU generation that carries
/// its feature set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Variant {
    /// AVX2, 32-byte lanes.
    Haswell,
    /// SSE4.2, 16-byte lanes.
    Westmere,
    /// Portable table-classified scalar.
    Fallback,
}

impl Variant {
    /// Every variant, best first. Selection falls through this order.
    pub const ALL: [Self; 3] = [Self::Haswell, Self::Westmere, Self::Fallback];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Haswell => "haswell",
            Self::Westmere => "westmere",
            Self::Fallback => "fallback",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "haswell" => Some(Self::Haswell),
            "westmere" => Some(Self::Westmere),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }

    /// Whether the running CPU can execute this variant.
    #[must_use]
    pub fn available(self) -> bool {
        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Haswell => std::arch::is_x86_feature_detected!("avx2"),
            #[cfg(target_arch = "x86_64")]
            Self::Westmere => std::arch::is_x86_feature_detected!("sse4.2"),
            #[cfg(not(target_arch = "x86_64"))]
            Self::Haswell | Self::Westmere => false,
            Self::Fallback => true,
        }
    }

    /// Picks the scanner for this parse: the `ZONE_TARGET` override when it
    /// names an available variant, otherwise the best the CPU supports.
    /// Safe to re-evaluate, there is no cached global beyond what the
    /// feature-detection macro keeps.
    #[must_use]
    pub fn select() -> Self {
        if let Ok(name) = std::env::var(TARGET_ENV)
            && let Some(forced) = Self::from_name(&name)
            && forced.available()
        {
            return forced;
        }
        for variant in Self::ALL {
            if variant.available() {
                return variant;
            }
        }
        Self::Fallback
    }
}

/// Rebuilds the tape for `bytes` with the chosen variant.
///
/// The contract across variants: byte-identical offset sequences for
/// identical input, no structural byte ever elided, and re-running over the
/// same window reproduces the same tape.
pub fn scan(variant: Variant, bytes: &[u8], tape: &mut Tape) {
    tape.clear();
    match variant {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: select()/available() proved the feature bits before this call
        Variant::Haswell => unsafe { haswell::scan(bytes, tape) },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: as above
        Variant::Westmere => unsafe { westmere::scan(bytes, tape) },
        #[cfg(not(target_arch = "x86_64"))]
        Variant::Haswell | Variant::Westmere => fallback::scan(bytes, tape),
        Variant::Fallback => fallback::scan(bytes, tape),
    }
}
