//! The `$`-prefixed control lines: `$ORIGIN`, `$TTL`, `$INCLUDE`, and the
//! reserved `$GENERATE`.
//!
//! Directive arguments that fail to parse are fatal, unlike record-level
//! semantic errors: a zone whose origin or default TTL is broken cannot
//! meaningfully continue, and an include that cannot be opened or would
//! cycle back into an open file ends the parse outright.

use std::path::{Path, PathBuf};

use crate::error::{Result, ZoneError};
use crate::lexer::{Tok, TokKind, unescape};
use crate::name::Name;
use crate::parser::{Frame, Parser, Sink};
use crate::rdata::parse_period;

impl<'a, S: Sink> Parser<'a, S> {
    pub(crate) fn directive(&mut self, tok: Tok) -> Result<()> {
        let name = self.frame().text(tok).to_vec();
        if name.eq_ignore_ascii_case(b"$ORIGIN") {
            self.dollar_origin(tok)
        } else if name.eq_ignore_ascii_case(b"$TTL") {
            self.dollar_ttl(tok)
        } else if name.eq_ignore_ascii_case(b"$INCLUDE") {
            self.dollar_include(tok)
        } else if name.eq_ignore_ascii_case(b"$GENERATE") {
            Err(ZoneError::NotImplemented("$GENERATE"))
        } else {
            Err(self.frame().syntax(tok.line, "unknown $ directive"))
        }
    }

    fn dollar_origin(&mut self, at: Tok) -> Result<()> {
        let frame = self.frame();
        let arg = frame.next_token()?;
        if !arg.is_data() {
            return Err(frame.semantic_fatal(at.line, "$ORIGIN needs a domain name"));
        }
        let origin = Name::from_text(frame.text(arg), Some(&frame.origin))
            .map_err(|_| frame.semantic_fatal(arg.line, "bad $ORIGIN domain name"))?;
        frame.origin = origin;
        self.expect_directive_eol()
    }

    fn dollar_ttl(&mut self, at: Tok) -> Result<()> {
        let frame = self.frame();
        let arg = frame.next_token()?;
        if !arg.is_data() {
            return Err(frame.semantic_fatal(at.line, "$TTL needs a duration"));
        }
        let value = parse_period(frame.text(arg))
            .map_err(|_| frame.semantic_fatal(arg.line, "bad $TTL duration"))?;
        frame.file_ttl = Some(value);
        self.expect_directive_eol()
    }

    fn dollar_include(&mut self, at: Tok) -> Result<()> {
        if self.frames.len() as u32 >= self.options.include_limit {
            return Err(self
                .frame()
                .semantic_fatal(at.line, "$INCLUDE nesting too deep"));
        }
        let frame = self.frame();
        let arg = frame.next_token()?;
        if !arg.is_data() {
            return Err(frame.semantic_fatal(at.line, "$INCLUDE needs a path"));
        }
        let mut path_bytes = Vec::new();
        unescape(frame.text(arg), &mut path_bytes)
            .map_err(|what| frame.semantic_fatal(arg.line, what))?;
        let path_text = String::from_utf8(path_bytes)
            .map_err(|_| frame.semantic_fatal(arg.line, "include path is not UTF-8"))?;

        // optional origin argument
        let next = frame.next_token()?;
        let origin = if next.is_data() {
            let parsed = Name::from_text(frame.text(next), Some(&frame.origin))
                .map_err(|_| frame.semantic_fatal(next.line, "bad $INCLUDE origin"))?;
            self.expect_directive_eol()?;
            parsed
        } else {
            if next.kind == TokKind::Eof {
                frame.push_back(next);
            }
            frame.origin.clone()
        };

        // paths resolve against the including file's directory
        let frame = self.frame();
        let base = frame
            .resolved
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        let path = match base {
            Some(dir) => dir.join(&path_text),
            None => PathBuf::from(&path_text),
        };

        let mut pushed = Frame::open(&path, frame.variant, origin)?;
        if let Some(resolved) = &pushed.resolved
            && self
                .frames
                .iter()
                .any(|open| open.resolved.as_deref() == Some(resolved.as_path()))
        {
            return Err(self
                .frame()
                .semantic_fatal(at.line, "$INCLUDE cycle detected"));
        }

        // class and TTL defaults flow into the include, the origin was
        // fixed above, and the owner carries across the boundary
        let frame = self.frame();
        pushed.last_owner = frame.last_owner.clone();
        pushed.last_ttl = frame.last_ttl;
        pushed.file_ttl = frame.file_ttl;
        pushed.last_class = frame.last_class;
        pushed.last_type = frame.last_type;

        self.frames.push(pushed);
        self.stats.files += 1;
        Ok(())
    }

    /// A directive line ends here or the whole parse does.
    fn expect_directive_eol(&mut self) -> Result<()> {
        let frame = self.frame();
        let tok = frame.next_token()?;
        match tok.kind {
            TokKind::Delimiter => Ok(()),
            TokKind::Eof => {
                frame.push_back(tok);
                Ok(())
            }
            TokKind::Contiguous | TokKind::Quoted => {
                Err(frame.semantic_fatal(tok.line, "trailing data after directive"))
            }
        }
    }
}
