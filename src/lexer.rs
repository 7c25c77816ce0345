#![allow(clippy::cast_possible_truncation)] //offsets are window-bounded, far below u32::MAX

//! Token assembly over the indexer tape.
//!
//! The lexer never touches a byte the indexer did not flag. It walks tape
//! entries, skipping blanks and comment bytes, folding parentheses into
//! whitespace, and stitching escape sequences back into the token they
//! belong to. Tokens are (start, end) ranges into the window with the raw
//! escape bytes intact; escape-sensitive consumers (the name encoder)
//! decode them in place, everything else goes through [`unescape`].
//!
//! A token must sit fully inside the window before it can be emitted. When
//! the tape drains mid-token the lexer hands back `Refill` naming the
//! offset to keep, the frame slides the window, rescans, and the token is
//! lexed again from its first byte. The line counter is rewound to the
//! token start on every retry so re-lexing stays idempotent.

use crate::buffer::Window;
use crate::indexer::{Tape, is_blank, is_special};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokKind {
    /// A run of unquoted bytes.
    Contiguous,
    /// A `"`-bounded run, quotes stripped.
    Quoted,
    /// A newline at parenthesis depth 0.
    Delimiter,
    /// The end of the current file frame.
    Eof,
}

/// One logical token. `start..end` indexes the frame's window and is only
/// valid until the next refill, which is why tokens are consumed before
/// the lexer is asked for another.
#[derive(Copy, Clone, Debug)]
pub struct Tok {
    pub kind: TokKind,
    pub start: u32,
    pub end: u32,
    /// Line the token started on, 1-origin.
    pub line: u32,
    /// True when this token is the first of its line at column 0,
    /// which is what arms the owner slot.
    pub starts_line: bool,
    /// True when the raw bytes contain at least one backslash escape.
    pub escaped: bool,
}

impl Tok {
    #[inline]
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self.kind, TokKind::Contiguous | TokKind::Quoted)
    }
}

/// What the frame should do next.
pub enum LexStep {
    Token(Tok),
    /// Slide the window so `keep_from` becomes offset 0, refill, rescan.
    Refill { keep_from: usize },
}

const NO_ESCAPE: usize = usize::MAX;

pub struct Lexer {
    /// First window offset the lexer has not consumed, the compaction
    /// baseline when no token is in flight.
    pos: usize,
    /// 1-origin diagnostic line counter.
    line: u32,
    /// Line the in-progress token started on, restored on re-lex.
    token_line: u32,
    /// Parenthesis nesting depth. Newlines inside are whitespace.
    depth: u32,
    fresh_line: bool,
    saw_blank: bool,
    in_comment: bool,
}

#[allow(clippy::new_without_default)]
impl Lexer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pos: 0,
            line: 1,
            token_line: 1,
            depth: 0,
            fresh_line: true,
            saw_blank: false,
            in_comment: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// The frame slid the window; offsets restart at 0.
    #[inline]
    pub const fn rebased(&mut self) {
        self.pos = 0;
    }

    /// Assembles the next token, or asks for a refill.
    ///
    /// `eof` is the stream's verdict; with it set, a drained tape means the
    /// input genuinely ends here.
    pub fn try_next(
        &mut self,
        window: &Window,
        tape: &mut Tape,
        eof: bool,
    ) -> Result<LexStep, &'static str> {
        loop {
            let Some(offset) = tape.peek() else {
                if !eof {
                    return Ok(LexStep::Refill {
                        keep_from: self.pos,
                    });
                }
                if self.depth != 0 {
                    return Err("unbalanced parentheses at end of input");
                }
                return Ok(LexStep::Token(Tok {
                    kind: TokKind::Eof,
                    start: window.len() as u32,
                    end: window.len() as u32,
                    line: self.line,
                    starts_line: false,
                    escaped: false,
                }));
            };
            let offset = offset as usize;
            let byte = window.byte(offset);

            if self.in_comment {
                if byte != b'\n' {
                    tape.bump();
                    self.pos = offset + 1;
                    continue;
                }
                self.in_comment = false;
                // fall through so the newline terminates the line normally
            }

            match byte {
                b' ' | b'\t' | b'\r' => {
                    tape.bump();
                    self.pos = offset + 1;
                    self.saw_blank = true;
                }
                b'\n' => {
                    tape.bump();
                    self.pos = offset + 1;
                    let token_line = self.line;
                    self.line += 1;
                    if self.depth == 0 {
                        self.fresh_line = true;
                        self.saw_blank = false;
                        return Ok(LexStep::Token(Tok {
                            kind: TokKind::Delimiter,
                            start: offset as u32,
                            end: offset as u32 + 1,
                            line: token_line,
                            starts_line: false,
                            escaped: false,
                        }));
                    }
                    // inside parentheses a newline is just whitespace
                    self.saw_blank = true;
                }
                b'(' => {
                    tape.bump();
                    self.pos = offset + 1;
                    self.depth += 1;
                    self.saw_blank = true;
                }
                b')' => {
                    if self.depth == 0 {
                        return Err("closing parenthesis without a matching open");
                    }
                    tape.bump();
                    self.pos = offset + 1;
                    self.depth -= 1;
                    self.saw_blank = true;
                }
                b';' => {
                    tape.bump();
                    self.pos = offset + 1;
                    self.in_comment = true;
                }
                0 => return Err("NUL byte in input"),
                b'"' => return self.lex_quoted(window, tape, eof, offset),
                _ => return self.lex_contiguous(window, tape, eof, offset),
            }
        }
    }

    fn lex_contiguous(
        &mut self,
        window: &Window,
        tape: &mut Tape,
        eof: bool,
        start: usize,
    ) -> Result<LexStep, &'static str> {
        self.token_line = self.line;
        let starts_line = self.fresh_line && !self.saw_blank;
        let mut escaped = false;
        let mut escape_at = NO_ESCAPE;

        // the opening byte may itself be a backslash, e.g. the \# marker
        if window.byte(start) == b'\\' {
            escaped = true;
            escape_at = start + 1;
        }
        tape.bump();
        self.pos = start + 1;

        let end = loop {
            let Some(offset) = tape.peek() else {
                if !eof {
                    self.line = self.token_line;
                    return Ok(LexStep::Refill { keep_from: start });
                }
                break window.len();
            };
            let offset = offset as usize;
            let byte = window.byte(offset);

            if offset == escape_at {
                tape.bump();
                self.pos = offset + 1;
                if byte == b'\n' {
                    self.line += 1;
                }
                escape_at = NO_ESCAPE;
                continue;
            }
            if byte == b'\\' {
                escaped = true;
                escape_at = offset + 1;
                tape.bump();
                self.pos = offset + 1;
                continue;
            }
            if is_blank(byte) || is_special(byte) {
                break offset;
            }
            // an interior ordinary-run start, e.g. right after an escape
            tape.bump();
            self.pos = offset + 1;
        };

        self.fresh_line = false;
        Ok(LexStep::Token(Tok {
            kind: TokKind::Contiguous,
            start: start as u32,
            end: end as u32,
            line: self.token_line,
            starts_line,
            escaped,
        }))
    }

    fn lex_quoted(
        &mut self,
        window: &Window,
        tape: &mut Tape,
        eof: bool,
        quote: usize,
    ) -> Result<LexStep, &'static str> {
        self.token_line = self.line;
        let starts_line = self.fresh_line && !self.saw_blank;
        let start = quote + 1;
        let mut escaped = false;
        let mut escape_at = NO_ESCAPE;
        tape.bump();
        self.pos = start;

        let end = loop {
            let Some(offset) = tape.peek() else {
                if !eof {
                    self.line = self.token_line;
                    return Ok(LexStep::Refill { keep_from: quote });
                }
                return Err("unterminated quoted string");
            };
            let offset = offset as usize;
            let byte = window.byte(offset);
            tape.bump();
            self.pos = offset + 1;

            if offset == escape_at {
                if byte == b'\n' {
                    self.line += 1;
                }
                escape_at = NO_ESCAPE;
                continue;
            }
            match byte {
                b'\\' => {
                    escaped = true;
                    escape_at = offset + 1;
                }
                b'"' => break offset,
                // a quoted string may span lines; count them for diagnostics
                b'\n' => self.line += 1,
                _ => {}
            }
        };

        self.fresh_line = false;
        Ok(LexStep::Token(Tok {
            kind: TokKind::Quoted,
            start: start as u32,
            end: end as u32,
            line: self.token_line,
            starts_line,
            escaped,
        }))
    }
}

/// Decodes the escape sequence opening at `raw[0]` (the backslash).
/// Returns the decoded byte and how many input bytes it consumed.
pub(crate) fn unescape_one(raw: &[u8]) -> Result<(u8, usize), &'static str> {
    debug_assert!(raw[0] == b'\\');
    let rest = &raw[1..];
    if rest.is_empty() {
        return Err("incomplete escape at end of token");
    }
    if rest.len() >= 3 && rest[..3].iter().all(u8::is_ascii_digit) {
        let value = u32::from(rest[0] - b'0') * 100
            + u32::from(rest[1] - b'0') * 10
            + u32::from(rest[2] - b'0');
        if value > 255 {
            return Err("decimal escape out of range");
        }
        Ok((value as u8, 4))
    } else {
        Ok((rest[0], 2))
    }
}

/**
 Decodes RFC 1035 escapes from a raw token into `out`.

 `\DDD` with three decimal digits becomes the byte DDD (0..=255), any
 other `\X` becomes the literal byte X. A trailing lone backslash is an
 error, as is a `\DDD` value past 255.
*/
pub fn unescape(raw: &[u8], out: &mut Vec<u8>) -> Result<(), &'static str> {
    let mut i = 0;
    while i < raw.len() {
        let byte = raw[i];
        if byte != b'\\' {
            out.push(byte);
            i += 1;
            continue;
        }
        let (decoded, consumed) = unescape_one(&raw[i..])?;
        out.push(decoded);
        i += consumed;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{Variant, scan};

    struct Fixture {
        window: Window,
        tape: Tape,
        lexer: Lexer,
    }

    impl Fixture {
        fn new(text: &[u8]) -> Self {
            let mut window = Window::new();
            window.load(text);
            let mut tape = Tape::new();
            scan(Variant::Fallback, window.bytes(), &mut tape);
            Self {
                window,
                tape,
                lexer: Lexer::new(),
            }
        }

        fn next(&mut self) -> Tok {
            match self
                .lexer
                .try_next(&self.window, &mut self.tape, true)
                .expect("lex failure")
            {
                LexStep::Token(tok) => tok,
                LexStep::Refill { .. } => panic!("refill on complete input"),
            }
        }

        fn next_err(&mut self) -> &'static str {
            loop {
                match self.lexer.try_next(&self.window, &mut self.tape, true) {
                    Ok(LexStep::Token(tok)) if tok.kind == TokKind::Eof => {
                        panic!("input lexed cleanly")
                    }
                    Ok(_) => {}
                    Err(what) => return what,
                }
            }
        }

        fn bytes(&self, tok: Tok) -> &[u8] {
            self.window.slice(tok.start as usize, tok.end as usize)
        }
    }

    #[test]
    fn splits_a_record_line() {
        let mut fx = Fixture::new(b"www 3600 IN A 192.0.2.1\n");
        let kinds: Vec<(TokKind, Vec<u8>)> = core::iter::from_fn(|| {
            let tok = fx.next();
            (tok.kind != TokKind::Eof).then(|| (tok.kind, fx.bytes(tok).to_vec()))
        })
        .collect();
        assert_eq!(
            kinds,
            vec![
                (TokKind::Contiguous, b"www".to_vec()),
                (TokKind::Contiguous, b"3600".to_vec()),
                (TokKind::Contiguous, b"IN".to_vec()),
                (TokKind::Contiguous, b"A".to_vec()),
                (TokKind::Contiguous, b"192.0.2.1".to_vec()),
                (TokKind::Delimiter, b"\n".to_vec()),
            ]
        );
    }

    #[test]
    fn only_the_column_zero_token_starts_the_line() {
        let mut fx = Fixture::new(b"owner A 1.2.3.4\n  A 5.6.7.8\n");
        let first = fx.next();
        assert!(first.starts_line);
        let second = fx.next();
        assert!(!second.starts_line);
        // drain the first line
        while fx.next().kind != TokKind::Delimiter {}
        let indented = fx.next();
        assert_eq!(fx.bytes(indented), b"A");
        assert!(!indented.starts_line);
    }

    #[test]
    fn parentheses_mask_newlines_and_count_lines() {
        let mut fx = Fixture::new(b"soa (\n 1\n 2 )\nnext\n");
        let mut toks = Vec::new();
        loop {
            let tok = fx.next();
            if tok.kind == TokKind::Eof {
                break;
            }
            toks.push((tok.kind, fx.bytes(tok).to_vec(), tok.line));
        }
        assert_eq!(
            toks,
            vec![
                (TokKind::Contiguous, b"soa".to_vec(), 1),
                (TokKind::Contiguous, b"1".to_vec(), 2),
                (TokKind::Contiguous, b"2".to_vec(), 3),
                (TokKind::Delimiter, b"\n".to_vec(), 3),
                (TokKind::Contiguous, b"next".to_vec(), 4),
                (TokKind::Delimiter, b"\n".to_vec(), 4),
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let mut fx = Fixture::new(b"a ; the rest ( is \" ignored\nb\n");
        let a = fx.next();
        assert_eq!(fx.bytes(a), b"a");
        assert_eq!(fx.next().kind, TokKind::Delimiter);
        let b = fx.next();
        assert_eq!(fx.bytes(b), b"b");
    }

    #[test]
    fn quoted_strings_preserve_blanks_and_specials() {
        let mut fx = Fixture::new(b"\"hello (; world\" tail\n");
        let tok = fx.next();
        assert_eq!(tok.kind, TokKind::Quoted);
        assert_eq!(fx.bytes(tok), b"hello (; world");
        let tail = fx.next();
        assert_eq!(fx.bytes(tail), b"tail");
    }

    #[test]
    fn escaped_quote_stays_inside_the_string() {
        let mut fx = Fixture::new(b"\"a \\\" b\"\n");
        let tok = fx.next();
        assert_eq!(tok.kind, TokKind::Quoted);
        assert!(tok.escaped);
        assert_eq!(fx.bytes(tok), b"a \\\" b");
    }

    #[test]
    fn escaped_blank_extends_a_contiguous_token() {
        let mut fx = Fixture::new(b"a\\ b c\n");
        let tok = fx.next();
        assert_eq!(fx.bytes(tok), b"a\\ b");
        assert!(tok.escaped);
        let c = fx.next();
        assert_eq!(fx.bytes(c), b"c");
    }

    #[test]
    fn unterminated_quote_is_fatal() {
        let mut fx = Fixture::new(b"txt \"oops\n");
        let first = fx.next();
        assert_eq!(fx.bytes(first), b"txt");
        assert_eq!(fx.next_err(), "unterminated quoted string");
    }

    #[test]
    fn unbalanced_parens_at_eof_are_fatal() {
        let mut fx = Fixture::new(b"soa ( 1 2\n");
        loop {
            let tok = fx.next();
            if fx.bytes(tok) == b"2" {
                break;
            }
        }
        assert_eq!(fx.next_err(), "unbalanced parentheses at end of input");
    }

    #[test]
    fn close_paren_underflow_is_fatal() {
        let mut fx = Fixture::new(b"a ) b\n");
        let first = fx.next();
        assert_eq!(fx.bytes(first), b"a");
        assert_eq!(fx.next_err(), "closing parenthesis without a matching open");
    }

    #[test]
    fn unescape_decodes_decimal_and_literal_forms() {
        let mut out = Vec::new();
        unescape(br"a\046b\\c\065", &mut out).unwrap();
        assert_eq!(out, b"a.b\\cA");
    }

    #[test]
    fn unescape_rejects_trailing_backslash() {
        let mut out = Vec::new();
        assert!(unescape(br"abc\", &mut out).is_err());
    }

    #[test]
    fn unescape_rejects_out_of_range_decimal() {
        let mut out = Vec::new();
        assert!(unescape(br"\999", &mut out).is_err());
    }
}
