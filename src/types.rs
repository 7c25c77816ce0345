//! RR type and class mnemonic tables, both directions.
//!
//! Lookups are case-insensitive and accept the RFC 3597 generic forms
//! `TYPE<n>` and `CLASS<n>` for anything without a mnemonic.

/// Longest mnemonic is 10 bytes (NSEC3PARAM, OPENPGPKEY); `TYPE65535`
/// is 9. Anything longer cannot match.
const MAX_MNEMONIC: usize = 12;

/// Uppercases `text` into a stack buffer, `None` when it cannot be a
/// mnemonic at all.
#[inline]
fn upper(text: &[u8]) -> Option<([u8; MAX_MNEMONIC], usize)> {
    if text.is_empty() || text.len() > MAX_MNEMONIC {
        return None;
    }
    let mut buf = [0u8; MAX_MNEMONIC];
    for (dst, src) in buf.iter_mut().zip(text) {
        *dst = src.to_ascii_uppercase();
    }
    Some((buf, text.len()))
}

/// Strict decimal after a generic prefix: no sign, no leading zeros
/// except a bare `0`, bounded by u16.
fn generic_suffix(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() || digits.len() > 5 {
        return None;
    }
    if digits[0] == b'0' && digits.len() > 1 {
        return None;
    }
    let mut value = 0u32;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u32::from(byte - b'0');
    }
    u16::try_from(value).ok()
}

/// Numeric code for an RR type mnemonic or its `TYPE<n>` form.
///
/// Meta and query types (OPT, TSIG, AXFR, ...) have no mnemonic here on
/// purpose, they cannot appear in master files; their codes still pass
/// through the generic form.
#[must_use]
pub fn type_from_text(text: &[u8]) -> Option<u16> {
    let (buf, len) = upper(text)?;
    let up = &buf[..len];
    let code = match up {
        b"A" => 1,
        b"NS" => 2,
        b"MD" => 3,
        b"MF" => 4,
        b"CNAME" => 5,
        b"SOA" => 6,
        b"MB" => 7,
        b"MG" => 8,
        b"MR" => 9,
        b"WKS" => 11,
        b"PTR" => 12,
        b"HINFO" => 13,
        b"MINFO" => 14,
        b"MX" => 15,
        b"TXT" => 16,
        b"RP" => 17,
        b"AFSDB" => 18,
        b"X25" => 19,
        b"ISDN" => 20,
        b"RT" => 21,
        b"AAAA" => 28,
        b"LOC" => 29,
        b"SRV" => 33,
        b"NAPTR" => 35,
        b"KX" => 36,
        b"CERT" => 37,
        b"DNAME" => 39,
        b"DS" => 43,
        b"SSHFP" => 44,
        b"IPSECKEY" => 45,
        b"RRSIG" => 46,
        b"NSEC" => 47,
        b"DNSKEY" => 48,
        b"DHCID" => 49,
        b"NSEC3" => 50,
        b"NSEC3PARAM" => 51,
        b"TLSA" => 52,
        b"SMIMEA" => 53,
        b"CDS" => 59,
        b"CDNSKEY" => 60,
        b"OPENPGPKEY" => 61,
        b"CSYNC" => 62,
        b"ZONEMD" => 63,
        b"SVCB" => 64,
        b"HTTPS" => 65,
        b"SPF" => 99,
        b"NID" => 104,
        b"L32" => 105,
        b"L64" => 106,
        b"LP" => 107,
        b"EUI48" => 108,
        b"EUI64" => 109,
        b"URI" => 256,
        b"CAA" => 257,
        b"DLV" => 32769,
        _ => return up.strip_prefix(b"TYPE").and_then(generic_suffix),
    };
    Some(code)
}

/// Numeric code for a class mnemonic or its `CLASS<n>` form.
#[must_use]
pub fn class_from_text(text: &[u8]) -> Option<u16> {
    let (buf, len) = upper(text)?;
    let up = &buf[..len];
    let code = match up {
        b"IN" => 1,
        b"CS" => 2,
        b"CH" => 3,
        b"HS" => 4,
        _ => return up.strip_prefix(b"CLASS").and_then(generic_suffix),
    };
    Some(code)
}

/// Mnemonic for a type code, `None` when only `TYPE<n>` represents it.
#[must_use]
pub const fn type_to_name(code: u16) -> Option<&'static str> {
    Some(match code {
        1 => "A",
        2 => "NS",
        3 => "MD",
        4 => "MF",
        5 => "CNAME",
        6 => "SOA",
        7 => "MB",
        8 => "MG",
        9 => "MR",
        11 => "WKS",
        12 => "PTR",
        13 => "HINFO",
        14 => "MINFO",
        15 => "MX",
        16 => "TXT",
        17 => "RP",
        18 => "AFSDB",
        19 => "X25",
        20 => "ISDN",
        21 => "RT",
        28 => "AAAA",
        29 => "LOC",
        33 => "SRV",
        35 => "NAPTR",
        36 => "KX",
        37 => "CERT",
        39 => "DNAME",
        43 => "DS",
        44 => "SSHFP",
        45 => "IPSECKEY",
        46 => "RRSIG",
        47 => "NSEC",
        48 => "DNSKEY",
        49 => "DHCID",
        50 => "NSEC3",
        51 => "NSEC3PARAM",
        52 => "TLSA",
        53 => "SMIMEA",
        59 => "CDS",
        60 => "CDNSKEY",
        61 => "OPENPGPKEY",
        62 => "CSYNC",
        63 => "ZONEMD",
        64 => "SVCB",
        65 => "HTTPS",
        99 => "SPF",
        104 => "NID",
        105 => "L32",
        106 => "L64",
        107 => "LP",
        108 => "EUI48",
        109 => "EUI64",
        256 => "URI",
        257 => "CAA",
        32769 => "DLV",
        _ => return None,
    })
}

/// Mnemonic for a class code, `None` when only `CLASS<n>` represents it.
#[must_use]
pub const fn class_to_name(code: u16) -> Option<&'static str> {
    Some(match code {
        1 => "IN",
        2 => "CS",
        3 => "CH",
        4 => "HS",
        _ => return None,
    })
}

/// DNSSEC algorithm mnemonics, accepted where a zone file may spell the
/// algorithm field by name instead of number.
#[must_use]
pub fn algorithm_from_text(text: &[u8]) -> Option<u8> {
    const MAX_ALG: usize = 18; // RSASHA1-NSEC3-SHA1
    if text.is_empty() || text.len() > MAX_ALG {
        return None;
    }
    let mut buf = [0u8; MAX_ALG];
    for (dst, src) in buf.iter_mut().zip(text) {
        *dst = src.to_ascii_uppercase();
    }
    let code = match &buf[..text.len()] {
        b"RSAMD5" => 1,
        b"DH" => 2,
        b"DSA" => 3,
        b"RSASHA1" => 5,
        b"DSA-NSEC3-SHA1" => 6,
        b"RSASHA1-NSEC3-SHA1" => 7,
        b"RSASHA256" => 8,
        b"RSASHA512" => 10,
        b"ECC-GOST" => 12,
        b"ECDSAP256SHA256" => 13,
        b"ECDSAP384SHA384" => 14,
        b"ED25519" => 15,
        b"ED448" => 16,
        b"INDIRECT" => 252,
        b"PRIVATEDNS" => 253,
        b"PRIVATEOID" => 254,
        _ => return None,
    };
    Some(code)
}
