use std::io::Write;

use zff::{Record, class_to_name, type_to_name};

/// An owned, formatted record that can cross the worker channel.
pub struct PrintedRecord {
    pub owner: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl PrintedRecord {
    #[inline]
    #[must_use]
    pub fn from_record(record: &Record<'_>) -> Self {
        Self {
            owner: record.owner.to_string(),
            rtype: record.rtype,
            class: record.class,
            ttl: record.ttl,
            rdata: record.rdata.to_vec(),
        }
    }
}

/// Writes one record in a dig-flavoured tab-separated line with the RDATA
/// in the RFC 3597 generic form, so the output re-parses as a zone.
pub fn write_record<W: Write>(writer: &mut W, record: &PrintedRecord) -> std::io::Result<()> {
    write!(
        writer,
        "{}\t{}\t",
        record.owner, record.ttl
    )?;
    match class_to_name(record.class) {
        Some(name) => write!(writer, "{name}\t")?,
        None => write!(writer, "CLASS{}\t", record.class)?,
    }
    match type_to_name(record.rtype) {
        Some(name) => write!(writer, "{name}\t")?,
        None => write!(writer, "TYPE{}\t", record.rtype)?,
    }
    write!(writer, "\\# {} ", record.rdata.len())?;
    for byte in &record.rdata {
        write!(writer, "{byte:02X}")?;
    }
    writer.write_all(b"\n")
}
