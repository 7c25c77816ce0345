#![allow(clippy::cast_possible_truncation)] //every narrowing here is bounds-checked first

//! Per-type RDATA assembly.
//!
//! [`parse_rdata`] is the dispatch table: one arm per type the builder can
//! encode from its typed presentation, each a field sequence pulled token
//! by token from the frame. Every type also accepts the RFC 3597 generic
//! form `\# <len> <hex>`, which is the only way in for types without a
//! typed encoder.

use crate::cache::Block;
use crate::error::{Result, ZoneError};
use crate::lexer::{Tok, TokKind};
use crate::parser::Frame;
use crate::rdata;
use crate::types::{algorithm_from_text, type_from_text};

/// The field driver's working set: the token stream and the block being
/// filled. Splitting the borrows here keeps every encoder free to read
/// the window while appending wire octets.
pub(crate) struct FieldCx<'p, 'f> {
    pub frame: &'f mut Frame<'p>,
    pub block: &'f mut Block,
}

impl FieldCx<'_, '_> {
    /// Next token that must carry data; a record boundary here means the
    /// field is missing.
    fn field(&mut self, what: &'static str) -> Result<Tok> {
        let tok = self.frame.next_token()?;
        if tok.is_data() {
            Ok(tok)
        } else {
            // leave the boundary for resynchronization
            self.frame.push_back(tok);
            Err(self.frame.semantic(tok.line, what))
        }
    }

    /// End of the field sequence: nothing but the record boundary may
    /// remain.
    fn end(&mut self) -> Result<()> {
        let tok = self.frame.next_token()?;
        match tok.kind {
            TokKind::Delimiter => Ok(()),
            TokKind::Eof => {
                self.frame.push_back(tok);
                Ok(())
            }
            TokKind::Contiguous | TokKind::Quoted => {
                Err(self.frame.semantic(tok.line, "trailing data after RDATA"))
            }
        }
    }

    /// Next token if the line continues, `None` at the record boundary.
    /// The boundary token stays pending either way, so a later failure
    /// resynchronizes on this record and `end` still has something to eat.
    fn rest(&mut self) -> Result<Option<Tok>> {
        let tok = self.frame.next_token()?;
        match tok.kind {
            TokKind::Delimiter | TokKind::Eof => {
                self.frame.push_back(tok);
                Ok(None)
            }
            TokKind::Contiguous | TokKind::Quoted => Ok(Some(tok)),
        }
    }

    fn fail(&self, tok: Tok, what: &'static str) -> ZoneError {
        self.frame.semantic(tok.line, what)
    }
}

/// Applies `encode` to one mandatory field token.
fn simple(
    cx: &mut FieldCx,
    what: &'static str,
    encode: impl FnOnce(&mut Block, &[u8]) -> rdata::FieldResult,
) -> Result<()> {
    let tok = cx.field(what)?;
    encode(cx.block, cx.frame.text(tok)).map_err(|why| cx.fail(tok, why))
}

fn name(cx: &mut FieldCx, what: &'static str) -> Result<()> {
    let tok = cx.field(what)?;
    rdata::name(cx.block, cx.frame.text(tok), &cx.frame.origin).map_err(|why| cx.fail(tok, why))
}

/// A security algorithm: number or mnemonic.
fn algorithm(cx: &mut FieldCx) -> Result<()> {
    let tok = cx.field("missing algorithm")?;
    let raw = cx.frame.text(tok);
    if raw.first().is_some_and(u8::is_ascii_digit) {
        return rdata::int8(cx.block, raw).map_err(|why| cx.fail(tok, why));
    }
    let code = algorithm_from_text(raw).ok_or_else(|| cx.fail(tok, "unknown algorithm"))?;
    cx.block.put_u8(code).map_err(|why| cx.fail(tok, why))
}

/// An RR type by mnemonic or `TYPE<n>`, as a 16-bit field (RRSIG covered
/// type).
fn type_field(cx: &mut FieldCx) -> Result<()> {
    let tok = cx.field("missing type field")?;
    let code = type_from_text(cx.frame.text(tok))
        .ok_or_else(|| cx.fail(tok, "unrecognized type in RDATA"))?;
    cx.block.put_u16(code).map_err(|why| cx.fail(tok, why))
}

/// Base64 spread over the remaining tokens of the line.
fn base64_rest(cx: &mut FieldCx) -> Result<()> {
    let mut ascii = Vec::new();
    let line = cx.frame.line();
    while let Some(tok) = cx.rest()? {
        ascii.extend_from_slice(cx.frame.text(tok));
    }
    if ascii.is_empty() {
        return Err(cx.frame.semantic(line, "missing base64 data"));
    }
    rdata::base64(cx.block, &ascii).map_err(|why| cx.frame.semantic(line, why))
}

/// Hex digits spread over the remaining tokens of the line.
fn hex_rest(cx: &mut FieldCx, required: bool) -> Result<()> {
    let mut nibbles = Vec::new();
    let line = cx.frame.line();
    while let Some(tok) = cx.rest()? {
        nibbles.extend_from_slice(cx.frame.text(tok));
    }
    if nibbles.is_empty() {
        if required {
            return Err(cx.frame.semantic(line, "missing hex data"));
        }
        return Ok(());
    }
    rdata::hex(cx.block, &nibbles).map_err(|why| cx.frame.semantic(line, why))
}

/// One or more character strings, the TXT shape.
fn strings_rest(cx: &mut FieldCx) -> Result<()> {
    let first = cx.field("missing string data")?;
    rdata::char_string(cx.block, cx.frame.text(first)).map_err(|why| cx.fail(first, why))?;
    while let Some(tok) = cx.rest()? {
        rdata::char_string(cx.block, cx.frame.text(tok)).map_err(|why| cx.fail(tok, why))?;
    }
    Ok(())
}

/// The NSEC/CSYNC trailing type list.
fn bitmap_rest(cx: &mut FieldCx) -> Result<()> {
    let mut codes = Vec::new();
    let line = cx.frame.line();
    while let Some(tok) = cx.rest()? {
        let code = type_from_text(cx.frame.text(tok))
            .ok_or_else(|| cx.fail(tok, "unrecognized type in bitmap"))?;
        codes.push(code);
    }
    rdata::type_bitmap(cx.block, &mut codes).map_err(|why| cx.frame.semantic(line, why))
}

/// WKS: protocol then a numeric port list collapsed into a bitmap.
fn wks_rest(cx: &mut FieldCx) -> Result<()> {
    let proto = cx.field("missing protocol")?;
    let raw = cx.frame.text(proto);
    let number = if raw.eq_ignore_ascii_case(b"tcp") {
        6
    } else if raw.eq_ignore_ascii_case(b"udp") {
        17
    } else {
        #[allow(clippy::cast_possible_truncation)]
        {
            rdata::parse_uint(raw, u64::from(u8::MAX)).map_err(|why| cx.fail(proto, why))? as u8
        }
    };
    cx.block.put_u8(number).map_err(|why| cx.fail(proto, why))?;

    let mut bits: Vec<u8> = Vec::new();
    while let Some(tok) = cx.rest()? {
        let port = rdata::parse_uint(cx.frame.text(tok), u64::from(u16::MAX))
            .map_err(|why| cx.fail(tok, why))? as usize;
        if bits.len() <= port / 8 {
            bits.resize(port / 8 + 1, 0);
        }
        bits[port / 8] |= 0x80 >> (port % 8);
    }
    let line = cx.frame.line();
    cx.block
        .put(&bits)
        .map_err(|why| cx.frame.semantic(line, why))
}

/// CAA: flags, a 1..15 byte tag with its length octet, then the bare
/// value bytes.
fn caa_tail(cx: &mut FieldCx) -> Result<()> {
    let tag = cx.field("missing CAA tag")?;
    let raw = cx.frame.text(tag);
    if raw.is_empty() || raw.len() > 15 || !raw.iter().all(u8::is_ascii_alphanumeric) {
        return Err(cx.fail(tag, "bad CAA tag"));
    }
    #[allow(clippy::cast_possible_truncation)]
    cx.block.put_u8(raw.len() as u8).map_err(|why| cx.fail(tag, why))?;
    let tag_bytes = raw.to_vec();
    cx.block.put(&tag_bytes).map_err(|why| cx.fail(tag, why))?;

    let value = cx.field("missing CAA value")?;
    rdata::raw_string(cx.block, cx.frame.text(value)).map_err(|why| cx.fail(value, why))?;
    cx.end()
}

/// URI: the target is the remaining quoted token, raw and unprefixed.
fn uri_tail(cx: &mut FieldCx) -> Result<()> {
    let target = cx.field("missing URI target")?;
    rdata::raw_string(cx.block, cx.frame.text(target)).map_err(|why| cx.fail(target, why))?;
    cx.end()
}

/// CERT certificate types, RFC 4398 mnemonics or a number.
fn cert_type(cx: &mut FieldCx) -> Result<()> {
    let tok = cx.field("missing certificate type")?;
    let raw = cx.frame.text(tok);
    if raw.first().is_some_and(u8::is_ascii_digit) {
        return rdata::int16(cx.block, raw).map_err(|why| cx.fail(tok, why));
    }
    let code: u16 = match raw.to_ascii_uppercase().as_slice() {
        b"PKIX" => 1,
        b"SPKI" => 2,
        b"PGP" => 3,
        b"IPKIX" => 4,
        b"ISPKI" => 5,
        b"IPGP" => 6,
        b"ACPKIX" => 7,
        b"IACPKIX" => 8,
        b"URI" => 253,
        b"OID" => 254,
        _ => return Err(cx.fail(tok, "unknown certificate type")),
    };
    cx.block.put_u16(code).map_err(|why| cx.fail(tok, why))
}

/// The RFC 3597 escape hatch: `\# <len> <hex...>`.
fn generic_rdata(cx: &mut FieldCx) -> Result<()> {
    let len_tok = cx.field("missing RDATA length after \\#")?;
    let declared = rdata::parse_uint(cx.frame.text(len_tok), u64::from(u16::MAX))
        .map_err(|why| cx.fail(len_tok, why))? as usize;
    let line = cx.frame.line();
    hex_rest(cx, declared != 0)?;
    if cx.block.len() != declared {
        return Err(cx
            .frame
            .semantic(line, "generic RDATA length does not match its data"));
    }
    cx.end()
}

/// Splits raw presentation bytes at unescaped occurrences of `sep`.
fn split_unescaped(raw: &[u8], sep: u8) -> Vec<&[u8]> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' {
            // length of the escape, 4 for \DDD else 2
            let skip = if raw.len() - i >= 4 && raw[i + 1..i + 4].iter().all(u8::is_ascii_digit) {
                4
            } else {
                2
            };
            i += skip.min(raw.len() - i);
        } else if raw[i] == sep {
            pieces.push(&raw[start..i]);
            start = i + 1;
            i += 1;
        } else {
            i += 1;
        }
    }
    pieces.push(&raw[start..]);
    pieces
}

/// SVCB/HTTPS service parameters: `key` or `key=value` tokens, encoded in
/// strictly ascending key order with duplicates refused.
fn svc_params_rest(cx: &mut FieldCx) -> Result<()> {
    let line = cx.frame.line();
    let mut params: Vec<(u16, Vec<u8>)> = Vec::new();

    while let Some(tok) = cx.rest()? {
        let mut raw = cx.frame.text(tok).to_vec();
        // `key="quoted value"` lexes as two tokens; stitch them back, but
        // only when the quote really abuts the = (base64 padding also ends
        // a token with =)
        if raw.ends_with(b"=") && tok.kind == TokKind::Contiguous {
            let generation = cx.frame.generation();
            let next = cx.frame.next_token()?;
            let adjacent =
                cx.frame.generation() == generation && next.start == tok.end + 1;
            if next.kind == TokKind::Quoted && adjacent {
                raw.extend_from_slice(cx.frame.text(next));
            } else {
                cx.frame.push_back(next);
            }
        }

        let (key_raw, value_raw) = match split_unescaped(&raw, b'=').as_slice() {
            [key] => (*key, None),
            [key, value @ ..] => {
                // '=' inside the value is legal, rejoin everything after the key
                let joined_len: usize = value.iter().map(|v| v.len()).sum::<usize>() + value.len() - 1;
                let offset = key.len() + 1;
                (*key, Some(&raw[offset..offset + joined_len]))
            }
            [] => (&raw[..], None),
        };

        let key = svc_key(key_raw).ok_or_else(|| cx.fail(tok, "unknown service parameter"))?;
        let wire = svc_value(key, value_raw).map_err(|why| cx.fail(tok, why))?;
        if params.iter().any(|(existing, _)| *existing == key) {
            return Err(cx.fail(tok, "duplicate service parameter"));
        }
        params.push((key, wire));
    }

    params.sort_unstable_by_key(|(key, _)| *key);
    for (key, value) in params {
        cx.block
            .put_u16(key)
            .and_then(|()| {
                #[allow(clippy::cast_possible_truncation)]
                cx.block.put_u16(value.len() as u16)
            })
            .and_then(|()| cx.block.put(&value))
            .map_err(|why| cx.frame.semantic(line, why))?;
    }
    Ok(())
}

fn svc_key(raw: &[u8]) -> Option<u16> {
    let lower: Vec<u8> = raw.iter().map(u8::to_ascii_lowercase).collect();
    let code = match lower.as_slice() {
        b"mandatory" => 0,
        b"alpn" => 1,
        b"no-default-alpn" => 2,
        b"port" => 3,
        b"ipv4hint" => 4,
        b"ech" => 5,
        b"ipv6hint" => 6,
        b"dohpath" => 7,
        _ => {
            let digits = lower.strip_prefix(b"key")?;
            return rdata::parse_uint(digits, u64::from(u16::MAX))
                .ok()
                .map(|v| v as u16);
        }
    };
    Some(code)
}

fn svc_value(key: u16, raw: Option<&[u8]>) -> core::result::Result<Vec<u8>, &'static str> {
    let mut scratch = Block::new();
    match key {
        // mandatory: a list of parameter keys
        0 => {
            let raw = raw.ok_or("mandatory needs a value")?;
            let mut keys: Vec<u16> = split_unescaped(raw, b',')
                .into_iter()
                .map(|piece| svc_key(piece).ok_or("unknown key in mandatory list"))
                .collect::<core::result::Result<_, _>>()?;
            keys.sort_unstable();
            keys.dedup();
            for key in keys {
                scratch.put_u16(key)?;
            }
        }
        // alpn: length-prefixed protocol ids
        1 => {
            let raw = raw.ok_or("alpn needs a value")?;
            for piece in split_unescaped(raw, b',') {
                let mut id = Vec::new();
                crate::lexer::unescape(piece, &mut id)?;
                if id.is_empty() || id.len() > 255 {
                    return Err("bad alpn protocol id");
                }
                #[allow(clippy::cast_possible_truncation)]
                scratch.put_u8(id.len() as u8)?;
                scratch.put(&id)?;
            }
        }
        2 => {
            if raw.is_some() {
                return Err("no-default-alpn takes no value");
            }
        }
        3 => {
            let raw = raw.ok_or("port needs a value")?;
            #[allow(clippy::cast_possible_truncation)]
            scratch.put_u16(rdata::parse_uint(raw, u64::from(u16::MAX))? as u16)?;
        }
        4 | 6 => {
            let raw = raw.ok_or("address hint needs a value")?;
            for piece in split_unescaped(raw, b',') {
                if key == 4 {
                    rdata::ipv4(&mut scratch, piece)?;
                } else {
                    rdata::ipv6(&mut scratch, piece)?;
                }
            }
        }
        5 => {
            let raw = raw.ok_or("ech needs a value")?;
            rdata::base64(&mut scratch, raw)?;
        }
        // dohpath and unknown keys carry their bytes verbatim
        _ => {
            if let Some(raw) = raw {
                rdata::raw_string(&mut scratch, raw)?;
            }
        }
    }
    Ok(scratch.as_slice().to_vec())
}

/**
 Drives the field sequence for `rtype`, consuming the rest of the record
 line including its terminating boundary.

 Types with no typed encoder are accepted only through the generic form;
 hitting one in typed presentation is a record-level semantic error, so
 the offending record is logged and skipped like any other bad record.
*/
pub(crate) fn parse_rdata(rtype: u16, cx: &mut FieldCx) -> Result<()> {
    // the generic form trumps the typed grammar for every type
    let first = cx.frame.next_token()?;
    if first.is_data() && cx.frame.text(first) == br"\#" {
        return generic_rdata(cx);
    }
    if !first.is_data() {
        cx.frame.push_back(first);
        return Err(cx.frame.semantic(first.line, "record has no RDATA"));
    }
    cx.frame.push_back(first);

    match rtype {
        // A
        1 => {
            simple(cx, "missing address", rdata::ipv4)?;
            cx.end()
        }
        // NS, MD, MF, CNAME, MB, MG, MR, PTR, DNAME
        2..=5 | 7..=9 | 12 | 39 => {
            name(cx, "missing domain name")?;
            cx.end()
        }
        // SOA
        6 => {
            name(cx, "missing primary server")?;
            name(cx, "missing responsible mailbox")?;
            simple(cx, "missing serial", rdata::int32)?;
            simple(cx, "missing refresh", rdata::period)?;
            simple(cx, "missing retry", rdata::period)?;
            simple(cx, "missing expire", rdata::period)?;
            simple(cx, "missing minimum", rdata::period)?;
            cx.end()
        }
        // WKS
        11 => {
            simple(cx, "missing address", rdata::ipv4)?;
            wks_rest(cx)?;
            cx.end()
        }
        // HINFO
        13 => {
            simple(cx, "missing CPU string", rdata::char_string)?;
            simple(cx, "missing OS string", rdata::char_string)?;
            cx.end()
        }
        // MINFO, RP
        14 | 17 => {
            name(cx, "missing mailbox")?;
            name(cx, "missing mailbox")?;
            cx.end()
        }
        // MX, AFSDB, RT, KX, LP
        15 | 18 | 21 | 36 | 107 => {
            simple(cx, "missing preference", rdata::int16)?;
            name(cx, "missing domain name")?;
            cx.end()
        }
        // TXT, SPF
        16 | 99 => {
            strings_rest(cx)?;
            cx.end()
        }
        // X25
        19 => {
            simple(cx, "missing PSDN address", rdata::char_string)?;
            cx.end()
        }
        // ISDN: address plus optional subaddress
        20 => {
            simple(cx, "missing ISDN address", rdata::char_string)?;
            if let Some(tok) = cx.rest()? {
                rdata::char_string(cx.block, cx.frame.text(tok))
                    .map_err(|why| cx.fail(tok, why))?;
            }
            cx.end()
        }
        // AAAA
        28 => {
            simple(cx, "missing address", rdata::ipv6)?;
            cx.end()
        }
        // SRV
        33 => {
            simple(cx, "missing priority", rdata::int16)?;
            simple(cx, "missing weight", rdata::int16)?;
            simple(cx, "missing port", rdata::int16)?;
            name(cx, "missing target")?;
            cx.end()
        }
        // NAPTR
        35 => {
            simple(cx, "missing order", rdata::int16)?;
            simple(cx, "missing preference", rdata::int16)?;
            simple(cx, "missing flags string", rdata::char_string)?;
            simple(cx, "missing services string", rdata::char_string)?;
            simple(cx, "missing regexp string", rdata::char_string)?;
            name(cx, "missing replacement")?;
            cx.end()
        }
        // CERT
        37 => {
            cert_type(cx)?;
            simple(cx, "missing key tag", rdata::int16)?;
            algorithm(cx)?;
            base64_rest(cx)?;
            cx.end()
        }
        // DS, CDS, DLV
        43 | 59 | 32769 => {
            simple(cx, "missing key tag", rdata::int16)?;
            algorithm(cx)?;
            simple(cx, "missing digest type", rdata::int8)?;
            hex_rest(cx, true)?;
            cx.end()
        }
        // SSHFP
        44 => {
            algorithm(cx)?;
            simple(cx, "missing fingerprint type", rdata::int8)?;
            hex_rest(cx, true)?;
            cx.end()
        }
        // RRSIG
        46 => {
            type_field(cx)?;
            algorithm(cx)?;
            simple(cx, "missing label count", rdata::int8)?;
            simple(cx, "missing original TTL", rdata::period)?;
            simple(cx, "missing expiration", rdata::timestamp)?;
            simple(cx, "missing inception", rdata::timestamp)?;
            simple(cx, "missing key tag", rdata::int16)?;
            name(cx, "missing signer name")?;
            base64_rest(cx)?;
            cx.end()
        }
        // NSEC
        47 => {
            name(cx, "missing next owner")?;
            bitmap_rest(cx)?;
            cx.end()
        }
        // DNSKEY, CDNSKEY
        48 | 60 => {
            simple(cx, "missing flags", rdata::int16)?;
            simple(cx, "missing protocol", rdata::int8)?;
            algorithm(cx)?;
            base64_rest(cx)?;
            cx.end()
        }
        // DHCID, OPENPGPKEY
        49 | 61 => {
            base64_rest(cx)?;
            cx.end()
        }
        // NSEC3
        50 => {
            simple(cx, "missing hash algorithm", rdata::int8)?;
            simple(cx, "missing flags", rdata::int8)?;
            simple(cx, "missing iterations", rdata::int16)?;
            simple(cx, "missing salt", rdata::salt)?;
            simple(cx, "missing next hashed owner", rdata::base32hex_prefixed)?;
            bitmap_rest(cx)?;
            cx.end()
        }
        // NSEC3PARAM
        51 => {
            simple(cx, "missing hash algorithm", rdata::int8)?;
            simple(cx, "missing flags", rdata::int8)?;
            simple(cx, "missing iterations", rdata::int16)?;
            simple(cx, "missing salt", rdata::salt)?;
            cx.end()
        }
        // TLSA, SMIMEA
        52 | 53 => {
            simple(cx, "missing usage", rdata::int8)?;
            simple(cx, "missing selector", rdata::int8)?;
            simple(cx, "missing matching type", rdata::int8)?;
            hex_rest(cx, true)?;
            cx.end()
        }
        // CSYNC
        62 => {
            simple(cx, "missing SOA serial", rdata::int32)?;
            simple(cx, "missing flags", rdata::int16)?;
            bitmap_rest(cx)?;
            cx.end()
        }
        // ZONEMD
        63 => {
            simple(cx, "missing serial", rdata::int32)?;
            simple(cx, "missing scheme", rdata::int8)?;
            simple(cx, "missing hash algorithm", rdata::int8)?;
            hex_rest(cx, true)?;
            cx.end()
        }
        // SVCB, HTTPS
        64 | 65 => {
            simple(cx, "missing priority", rdata::int16)?;
            name(cx, "missing target")?;
            svc_params_rest(cx)?;
            cx.end()
        }
        // NID, L64
        104 | 106 => {
            simple(cx, "missing preference", rdata::int16)?;
            simple(cx, "missing locator", rdata::ilnp64)?;
            cx.end()
        }
        // L32
        105 => {
            simple(cx, "missing preference", rdata::int16)?;
            simple(cx, "missing locator", rdata::ipv4)?;
            cx.end()
        }
        // EUI48
        108 => {
            simple(cx, "missing address", |block, text| {
                rdata::eui(block, text, 6)
            })?;
            cx.end()
        }
        // EUI64
        109 => {
            simple(cx, "missing address", |block, text| {
                rdata::eui(block, text, 8)
            })?;
            cx.end()
        }
        // URI
        256 => {
            simple(cx, "missing priority", rdata::int16)?;
            simple(cx, "missing weight", rdata::int16)?;
            uri_tail(cx)
        }
        // CAA
        257 => {
            simple(cx, "missing flags", rdata::int8)?;
            caa_tail(cx)
        }
        _ => Err(cx
            .frame
            .semantic(first.line, "RR type has no typed encoder; use the \\# generic form")),
    }
}
