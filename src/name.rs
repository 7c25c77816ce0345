//! Wire-format DNS names.
//!
//! A name is the concatenation `<len><label bytes>…<0>`, at most 255
//! octets with every label at most 63. Text parsing honors RFC 1035
//! escapes, so `\.` stays inside a label while a bare `.` splits one, and
//! relative names complete against the current origin.

use core::fmt;

use crate::lexer::unescape_one;

pub const MAX_NAME_OCTETS: usize = 255;
pub const MAX_LABEL_OCTETS: usize = 63;

/// An owned, fixed-capacity wire name. Copying 256 bytes beats chasing a
/// heap pointer at this size, and it keeps owner tracking allocation-free.
#[derive(Clone, PartialEq, Eq)]
pub struct Name {
    octets: [u8; MAX_NAME_OCTETS],
    len: u8,
}

impl Name {
    /// The root name, a single empty label.
    #[must_use]
    pub const fn root() -> Self {
        let mut octets = [0u8; MAX_NAME_OCTETS];
        octets[0] = 0;
        Self { octets, len: 1 }
    }

    /// The encoded octets, terminal root label included.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.octets[..usize::from(self.len)]
    }

    #[inline]
    #[must_use]
    pub const fn wire_len(&self) -> usize {
        self.len as usize
    }

    /**
     Parses the presentation form in `text` (raw token bytes, escapes
     intact) into wire format.

     `@` is the origin, a trailing unescaped dot makes the name absolute,
     anything else is completed against `origin`. Passing `None` for the
     origin makes relative names (and `@`) an error.
    */
    pub fn from_text(text: &[u8], origin: Option<&Self>) -> Result<Self, &'static str> {
        if text.is_empty() {
            return Err("empty domain name");
        }
        if text == b"@" {
            return origin.cloned().ok_or("@ used with no origin in scope");
        }
        if text == b"." {
            return Ok(Self::root());
        }

        let mut name = Self {
            octets: [0u8; MAX_NAME_OCTETS],
            len: 0,
        };
        let mut label = [0u8; MAX_LABEL_OCTETS];
        let mut label_len = 0usize;
        let mut absolute = false;
        let mut i = 0;

        while i < text.len() {
            match text[i] {
                b'.' => {
                    if label_len == 0 {
                        return Err("empty label");
                    }
                    name.push_label(&label[..label_len])?;
                    label_len = 0;
                    i += 1;
                    if i == text.len() {
                        absolute = true;
                    }
                }
                b'\\' => {
                    let (byte, consumed) = unescape_one(&text[i..])?;
                    if label_len == MAX_LABEL_OCTETS {
                        return Err("label exceeds 63 octets");
                    }
                    label[label_len] = byte;
                    label_len += 1;
                    i += consumed;
                }
                byte => {
                    if label_len == MAX_LABEL_OCTETS {
                        return Err("label exceeds 63 octets");
                    }
                    label[label_len] = byte;
                    label_len += 1;
                    i += 1;
                }
            }
        }
        if label_len != 0 {
            name.push_label(&label[..label_len])?;
        }

        if absolute {
            name.push_root()?;
            Ok(name)
        } else {
            let origin = origin.ok_or("relative name with no origin in scope")?;
            name.append(origin)?;
            Ok(name)
        }
    }

    fn push_label(&mut self, label: &[u8]) -> Result<(), &'static str> {
        debug_assert!(!label.is_empty() && label.len() <= MAX_LABEL_OCTETS);
        let len = usize::from(self.len);
        // every name still needs its terminal root octet
        if len + 1 + label.len() + 1 > MAX_NAME_OCTETS {
            return Err("domain name exceeds 255 octets");
        }
        #[allow(clippy::cast_possible_truncation)]
        {
            self.octets[len] = label.len() as u8;
        }
        self.octets[len + 1..len + 1 + label.len()].copy_from_slice(label);
        #[allow(clippy::cast_possible_truncation)]
        {
            self.len = (len + 1 + label.len()) as u8;
        }
        Ok(())
    }

    fn push_root(&mut self) -> Result<(), &'static str> {
        let len = usize::from(self.len);
        if len + 1 > MAX_NAME_OCTETS {
            return Err("domain name exceeds 255 octets");
        }
        self.octets[len] = 0;
        self.len += 1;
        Ok(())
    }

    /// Appends an absolute `tail` (the origin) to this partial name.
    fn append(&mut self, tail: &Self) -> Result<(), &'static str> {
        let len = usize::from(self.len);
        if len + tail.wire_len() > MAX_NAME_OCTETS {
            return Err("domain name exceeds 255 octets");
        }
        self.octets[len..len + tail.wire_len()].copy_from_slice(tail.as_bytes());
        #[allow(clippy::cast_possible_truncation)]
        {
            self.len = (len + tail.wire_len()) as u8;
        }
        Ok(())
    }
}

impl fmt::Display for Name {
    /// Presentation form: labels dot-joined, absolute, with `.` `\` `"`
    /// and non-printable bytes escaped so the output re-parses to the
    /// same octets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.as_bytes();
        if bytes == [0] {
            return f.write_str(".");
        }
        let mut at = 0;
        while at < bytes.len() {
            let len = usize::from(bytes[at]);
            if len == 0 {
                break;
            }
            for &byte in &bytes[at + 1..at + 1 + len] {
                match byte {
                    b'.' | b'\\' | b'"' => write!(f, "\\{}", byte as char)?,
                    0x21..=0x7E => write!(f, "{}", byte as char)?,
                    _ => write!(f, "\\{byte:03}")?,
                }
            }
            f.write_str(".")?;
            at += 1 + len;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}
