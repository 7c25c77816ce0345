//! Parse options, validated eagerly the way the cli validates its inputs.

use crate::error::{Result, ZoneError};
use crate::name::Name;
use crate::rdata::MAX_TTL;

/// DNS class mnemonics a zone may carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Class {
    In,
    Cs,
    Ch,
    Hs,
}

impl Class {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::In => 1,
            Self::Cs => 2,
            Self::Ch => 3,
            Self::Hs => 4,
        }
    }
}

/// Log categories for the diagnostics callback.
pub mod log {
    pub const ERROR: u32 = 1 << 0;
    pub const WARNING: u32 = 1 << 1;
    pub const INFO: u32 = 1 << 2;
    pub const ALL: u32 = ERROR | WARNING | INFO;
}

/// Diagnostics callback: category bit, file, line, message.
///
/// A plain function pointer keeps `Options` cheap to snapshot and clone,
/// no trait object needed.
pub type LogFn = fn(category: u32, file: &str, line: u32, message: &str);

/// Everything a parse invocation needs to know up front.
#[derive(Clone)]
pub struct Options {
    pub(crate) origin: Name,
    pub(crate) default_ttl: u32,
    pub(crate) default_class: u16,
    pub(crate) cache_size: usize,
    pub(crate) log: Option<LogFn>,
    pub(crate) log_mask: u32,
    pub(crate) include_limit: u32,
}

impl Options {
    /**
     Builds a validated options set.

     The origin must be an absolute name, the TTL must fit 1..=2^31-1.
     Everything else starts at sane defaults: a single-block RDATA cache,
     no logging, include nesting capped at 10.
    */
    pub fn new(origin: &str, default_ttl: u32, default_class: Class) -> Result<Self> {
        let origin = Name::from_text(origin.as_bytes(), None)
            .map_err(|_| ZoneError::BadParameter("origin must be an absolute domain name"))?;
        if default_ttl == 0 || default_ttl > MAX_TTL {
            return Err(ZoneError::BadParameter("default TTL outside 1..=2^31-1"));
        }
        Ok(Self {
            origin,
            default_ttl,
            default_class: default_class.code(),
            cache_size: 1,
            log: None,
            log_mask: 0,
            include_limit: 10,
        })
    }

    /// Number of RDATA blocks in the ring, at least 1.
    #[must_use]
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    /// Install the diagnostics callback and the categories it wants.
    #[must_use]
    pub fn with_log(mut self, log: LogFn, mask: u32) -> Self {
        self.log = Some(log);
        self.log_mask = mask;
        self
    }

    /// Maximum `$INCLUDE` nesting depth.
    #[must_use]
    pub fn with_include_limit(mut self, limit: u32) -> Self {
        self.include_limit = limit;
        self
    }

    #[must_use]
    pub const fn origin(&self) -> &Name {
        &self.origin
    }

    pub(crate) fn emit_log(&self, category: u32, file: &str, line: u32, message: &str) {
        if let Some(log) = self.log
            && self.log_mask & category != 0
        {
            log(category, file, line, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_must_be_absolute() {
        assert!(Options::new("example.com.", 3600, Class::In).is_ok());
        assert!(Options::new("example.com", 3600, Class::In).is_err());
    }

    #[test]
    fn ttl_bounds() {
        assert!(Options::new("a.", 0, Class::In).is_err());
        assert!(Options::new("a.", u32::MAX, Class::In).is_err());
        assert!(Options::new("a.", MAX_TTL, Class::In).is_ok());
    }
}
