//! The parser context: a stack of file frames, the RR state machine, and
//! the delivery contract to the sink.
//!
//! Control flow is plain `Result` propagation. Deep field encoders fail
//! with an error value that unwinds through `?` to [`parse_file`] /
//! [`parse_string`]; recoverable semantic errors are caught one level up,
//! logged, and the parse resumes at the next record boundary. Nothing
//! leaks on abort because every frame, window and cache block is owned by
//! the parser value being dropped.

use std::path::{Path, PathBuf};

use crate::buffer::Window;
use crate::cache::RdataCache;
use crate::error::{Result, ZoneError};
use crate::indexer::{Tape, Variant, scan};
use crate::lexer::{LexStep, Lexer, Tok, TokKind};
use crate::name::Name;
use crate::options::{Options, log};
use crate::rdata::parse_period;
use crate::rr;
use crate::source::Stream;
use crate::types::{class_from_text, type_from_text};

/// A finished record as handed to the sink. Slices stay valid until the
/// parser next writes the block the sink selected.
pub struct Record<'a> {
    pub owner: &'a Name,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: &'a [u8],
}

/**
 Receives each record.

 `Ok(index)` names the RDATA block the parser writes next, giving the
 sink a one-record look-behind when it rotates through a cache of two or
 more. Any `Err` aborts the parse immediately; the code is surfaced as
 [`ZoneError::SinkAbort`] and is clamped negative so it can never collide
 with success.
*/
pub trait Sink {
    fn accept(&mut self, record: &Record<'_>) -> core::result::Result<usize, i32>;
}

impl<F> Sink for F
where
    F: FnMut(&Record<'_>) -> core::result::Result<usize, i32>,
{
    #[inline]
    fn accept(&mut self, record: &Record<'_>) -> core::result::Result<usize, i32> {
        self(record)
    }
}

/// Totals for a completed parse.
#[derive(Copy, Clone, Debug, Default)]
pub struct Stats {
    pub records: u64,
    pub lines: u64,
    pub files: u32,
}

/// Sentinel display name for in-memory input.
const STRING_INPUT: &str = "<string>";

/// One input frame: a source, its window and tape, lexer state, and the
/// per-file defaults RFC 1035 threads through a zone.
pub struct Frame<'a> {
    pub(crate) display_name: Box<str>,
    /// Canonical path, for `$INCLUDE` cycle checks. `None` for string input.
    pub(crate) resolved: Option<PathBuf>,
    stream: Stream<'a>,
    window: Window,
    tape: Tape,
    lexer: Lexer,
    pending: Option<Tok>,
    pub(crate) variant: Variant,
    /// Bumped on every reload; token offsets from an older generation no
    /// longer index the window.
    generation: u64,
    // per-file defaults
    pub(crate) origin: Name,
    pub(crate) last_owner: Option<Name>,
    pub(crate) last_ttl: Option<u32>,
    pub(crate) file_ttl: Option<u32>,
    pub(crate) last_class: Option<u16>,
    pub(crate) last_type: Option<u16>,
}

impl<'a> Frame<'a> {
    pub(crate) fn open(path: &Path, variant: Variant, origin: Name) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        // canonicalize after open so the cycle check sees what we read
        let resolved = std::fs::canonicalize(path).ok();
        Ok(Self {
            display_name: path.to_string_lossy().into_owned().into_boxed_str(),
            resolved,
            stream: Stream::from_file(file),
            window: Window::new(),
            tape: Tape::new(),
            lexer: Lexer::new(),
            pending: None,
            variant,
            generation: 0,
            origin,
            last_owner: None,
            last_ttl: None,
            file_ttl: None,
            last_class: None,
            last_type: None,
        })
    }

    fn from_bytes(bytes: &'a [u8], variant: Variant, origin: Name) -> Self {
        Self {
            display_name: STRING_INPUT.into(),
            resolved: None,
            stream: Stream::from_bytes(bytes),
            window: Window::new(),
            tape: Tape::new(),
            lexer: Lexer::new(),
            pending: None,
            variant,
            generation: 0,
            origin,
            last_owner: None,
            last_ttl: None,
            file_ttl: None,
            last_class: None,
            last_type: None,
        }
    }

    /// Compacts from `keep_from`, refills, rescans. The lexer restarts any
    /// in-flight token at offset 0 afterwards.
    fn reload(&mut self, keep_from: usize) -> Result<()> {
        self.window.compact(keep_from);
        if self.window.spare() == 0 {
            return Err(ZoneError::OutOfMemory("token exceeds the input window"));
        }
        self.stream.refill(&mut self.window)?;
        scan(self.variant, self.window.bytes(), &mut self.tape);
        self.lexer.rebased();
        self.generation += 1;
        Ok(())
    }

    /// Changes whenever a reload slides the window.
    #[inline]
    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn next_token(&mut self) -> Result<Tok> {
        if let Some(tok) = self.pending.take() {
            return Ok(tok);
        }
        loop {
            match self
                .lexer
                .try_next(&self.window, &mut self.tape, self.stream.eof())
            {
                Ok(LexStep::Token(tok)) => return Ok(tok),
                Ok(LexStep::Refill { keep_from }) => self.reload(keep_from)?,
                Err(what) => {
                    return Err(ZoneError::Syntax {
                        file: self.display_name.clone(),
                        line: self.lexer.line(),
                        what,
                    });
                }
            }
        }
    }

    /// One-token lookahead. The pushed token must be re-read before the
    /// next refill can move the window under it.
    pub(crate) fn push_back(&mut self, tok: Tok) {
        debug_assert!(self.pending.is_none(), "single-slot pushback");
        self.pending = Some(tok);
    }

    /// Raw bytes of a token, escapes intact.
    #[inline]
    pub(crate) fn text(&self, tok: Tok) -> &[u8] {
        self.window.slice(tok.start as usize, tok.end as usize)
    }

    #[inline]
    pub(crate) fn line(&self) -> u32 {
        self.lexer.line()
    }

    pub(crate) fn semantic(&self, line: u32, what: &'static str) -> ZoneError {
        ZoneError::Semantic {
            file: self.display_name.clone(),
            line,
            what,
            fatal: false,
        }
    }

    pub(crate) fn semantic_fatal(&self, line: u32, what: &'static str) -> ZoneError {
        ZoneError::Semantic {
            file: self.display_name.clone(),
            line,
            what,
            fatal: true,
        }
    }

    pub(crate) fn syntax(&self, line: u32, what: &'static str) -> ZoneError {
        ZoneError::Syntax {
            file: self.display_name.clone(),
            line,
            what,
        }
    }
}

pub(crate) struct Parser<'a, S: Sink> {
    pub(crate) options: &'a Options,
    pub(crate) frames: Vec<Frame<'a>>,
    pub(crate) cache: RdataCache,
    pub(crate) sink: &'a mut S,
    pub(crate) stats: Stats,
}

impl<'a, S: Sink> Parser<'a, S> {
    pub(crate) fn frame(&mut self) -> &mut Frame<'a> {
        self.frames.last_mut().expect("frame stack is never empty mid-parse")
    }

    fn run(mut self) -> Result<Stats> {
        loop {
            let tok = self.frame().next_token()?;
            match tok.kind {
                TokKind::Eof => {
                    let frame = self.frames.pop().expect("frame stack is never empty mid-parse");
                    self.stats.lines += u64::from(frame.lexer.line());
                    if self.frames.is_empty() {
                        return Ok(self.stats);
                    }
                }
                TokKind::Delimiter => {}
                TokKind::Contiguous | TokKind::Quoted => {
                    let is_directive =
                        tok.starts_line && self.frame().text(tok).first() == Some(&b'$');
                    let outcome = if is_directive {
                        self.directive(tok)
                    } else {
                        self.record(tok)
                    };
                    if let Err(err) = outcome {
                        if !err.recoverable() {
                            return Err(err);
                        }
                        // recoverable() only holds for Semantic errors
                        if let ZoneError::Semantic {
                            file, line, what, ..
                        } = &err
                        {
                            self.options.emit_log(log::ERROR, file, *line, what);
                        }
                        self.resync()?;
                    }
                }
            }
        }
    }

    /// Skips to the next record boundary after a recoverable error.
    fn resync(&mut self) -> Result<()> {
        loop {
            let tok = self.frame().next_token()?;
            match tok.kind {
                TokKind::Delimiter => return Ok(()),
                TokKind::Eof => {
                    self.frame().push_back(tok);
                    return Ok(());
                }
                TokKind::Contiguous | TokKind::Quoted => {}
            }
        }
    }

    fn record(&mut self, first: Tok) -> Result<()> {
        let Self {
            frames,
            cache,
            options,
            sink,
            stats,
        } = self;
        let frame = frames.last_mut().expect("frame stack is never empty mid-parse");

        // owner slot
        let mut tok;
        let owner: Name;
        if first.starts_line {
            owner = Name::from_text(frame.text(first), Some(&frame.origin))
                .map_err(|what| frame.semantic(first.line, what))?;
            tok = frame.next_token()?;
        } else {
            owner = frame
                .last_owner
                .clone()
                .ok_or_else(|| frame.syntax(first.line, "indented record with no previous owner"))?;
            tok = first;
        }

        // [ttl] [class] in either order, then the mandatory type
        let mut ttl: Option<u32> = None;
        let mut class: Option<u16> = None;
        let rtype = loop {
            if !tok.is_data() {
                // leave the boundary for resynchronization
                frame.push_back(tok);
                return Err(frame.semantic(tok.line, "record is missing its type"));
            }
            let raw = frame.text(tok);
            if ttl.is_none() && raw.first().is_some_and(u8::is_ascii_digit) {
                let value =
                    parse_period(raw).map_err(|what| frame.semantic(tok.line, what))?;
                ttl = Some(value);
            } else if let Some(code) = class_from_text(raw).filter(|_| class.is_none()) {
                class = Some(code);
            } else if let Some(code) = type_from_text(raw) {
                break code;
            } else {
                return Err(frame.semantic(tok.line, "unrecognized RR type"));
            }
            tok = frame.next_token()?;
        };

        let class = class.or(frame.last_class).unwrap_or(options.default_class);
        let ttl = ttl
            .or(frame.last_ttl)
            .or(frame.file_ttl)
            .unwrap_or(options.default_ttl);

        // RDATA into the current cache block
        let block = cache.current_mut();
        block.clear();
        let mut cx = rr::FieldCx { frame, block };
        rr::parse_rdata(rtype, &mut cx)?;
        let rr::FieldCx { frame, block } = cx;

        let outcome = {
            let record = Record {
                owner: &owner,
                rtype,
                class,
                ttl,
                rdata: block.as_slice(),
            };
            sink.accept(&record)
        };

        // defaults update only once the record fully assembled
        frame.last_owner = Some(owner);
        frame.last_ttl = Some(ttl);
        frame.last_class = Some(class);
        frame.last_type = Some(rtype);

        match outcome {
            Ok(next) => {
                stats.records += 1;
                cache.select(next)
            }
            Err(code) => Err(ZoneError::SinkAbort(code.min(-1))),
        }
    }

}

/// Parses `path` to completion or first fatal error.
pub fn parse_file<S: Sink>(
    options: &Options,
    path: impl AsRef<Path>,
    sink: &mut S,
) -> Result<Stats> {
    let variant = Variant::select();
    let frame = Frame::open(path.as_ref(), variant, options.origin.clone())?;
    parse_frames(options, frame, sink)
}

/// Parses an in-memory buffer. The buffer is borrowed, never written.
pub fn parse_string<S: Sink>(options: &Options, bytes: &[u8], sink: &mut S) -> Result<Stats> {
    let variant = Variant::select();
    let frame = Frame::from_bytes(bytes, variant, options.origin.clone());
    parse_frames(options, frame, sink)
}

fn parse_frames<'a, S: Sink>(
    options: &'a Options,
    bottom: Frame<'a>,
    sink: &'a mut S,
) -> Result<Stats> {
    let cache = RdataCache::new(options.cache_size)?;
    let parser = Parser {
        options,
        frames: vec![bottom],
        cache,
        sink,
        stats: Stats {
            records: 0,
            lines: 0,
            files: 1,
        },
    };
    parser.run()
}
