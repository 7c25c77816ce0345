#![allow(clippy::inline_always)]

//! zff: a fast, SIMD-accelerated DNS zone-file parser.
//!
//! Master-file text goes in, wire-format resource records come out through
//! a caller-supplied sink, one callback per record. A vectorized structural
//! indexer finds token boundaries, a contour-aware lexer assembles tokens,
//! and per-type field encoders build RDATA into a reusable ring of buffers.
//!
//! ```no_run
//! use zff::{Class, Options, Record, parse_string};
//!
//! let options = Options::new("example.com.", 3600, Class::In).unwrap();
//! let mut count = 0u64;
//! let mut sink = |record: &Record<'_>| -> Result<usize, i32> {
//!     count += 1;
//!     println!("{} type {} with {} rdata octets",
//!         record.owner, record.rtype, record.rdata.len());
//!     Ok(0)
//! };
//! parse_string(&options, b"www 300 IN A 192.0.2.1\n", &mut sink).unwrap();
//! ```

mod buffer;
mod cache;
mod directive;
mod error;
pub mod indexer;
mod lexer;
mod name;
mod options;
mod parser;
mod rdata;
mod rr;
mod source;
mod types;

pub use cache::MAX_RDATA;
pub use error::{Result, ZoneError, codes};
pub use name::{MAX_LABEL_OCTETS, MAX_NAME_OCTETS, Name};
pub use options::{Class, LogFn, Options, log};
pub use parser::{Record, Sink, Stats, parse_file, parse_string};
pub use types::{class_from_text, class_to_name, type_from_text, type_to_name};

//this allocator is more efficient than jemalloc through my testing
#[cfg(all(
    feature = "mimalloc",
    any(target_os = "linux", target_os = "macos", target_os = "android")
))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod test;
