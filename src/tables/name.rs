//! `name` naming table.
//!
//! String bytes are copied into an owned storage arena; records index into
//! it by offset and length.

use std::borrow::Cow;
use std::io::{Read, Seek};

use encoding_rs::{MACINTOSH, UTF_16BE};

use crate::binary::read::{ByteReader, ReadBinary, ReadCtxt, ReadScope};
use crate::error::ParseError;
use crate::tables::{read_table_data, TableDirectory};
use crate::tag;

/// Name identifier codes. These are Apple's codes, not Microsoft's.
pub mod name_id {
    pub const COPYRIGHT_NOTICE: u16 = 0;
    pub const FONT_FAMILY: u16 = 1;
    pub const FONT_SUBFAMILY: u16 = 2;
    pub const UNIQUE_SUBFAMILY_IDENTIFICATION: u16 = 3;
    pub const FULL_NAME: u16 = 4;
    pub const NAME_TABLE_VERSION: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
    pub const TRADEMARK_NOTICE: u16 = 7;
    pub const MANUFACTURER_NAME: u16 = 8;
    pub const DESIGNER: u16 = 9;
    pub const DESCRIPTION: u16 = 10;
    pub const FONT_VENDOR_URL: u16 = 11;
    pub const FONT_DESIGNER_URL: u16 = 12;
    pub const LICENSE_DESCRIPTION: u16 = 13;
    pub const LICENSE_INFORMATION_URL: u16 = 14;
    pub const PREFERRED_FAMILY: u16 = 16;
    pub const PREFERRED_SUBFAMILY: u16 = 17;
    pub const COMPATIBLE_FULL: u16 = 18;
    pub const SAMPLE_TEXT: u16 = 19;
    pub const VARIATIONS_POSTSCRIPT_NAME_PREFIX: u16 = 25;
}

/// `name` table: name records plus the string storage they point into.
#[derive(Clone, Debug)]
pub struct NameTable {
    pub format: u16,
    pub string_offset: u16,
    pub name_records: Vec<NameRecord>,
    /// The string storage area, owned.
    pub string_data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub length: u16,
    pub offset: u16,
}

impl NameTable {
    /// The first record carrying `name_id`, or `None`.
    pub fn find_name(&self, name_id: u16) -> Option<&NameRecord> {
        self.name_records
            .iter()
            .find(|record| record.name_id == name_id)
    }

    /// The raw string bytes of a record.
    pub fn record_bytes(&self, record: &NameRecord) -> &[u8] {
        let start = usize::from(record.offset);
        let end = start + usize::from(record.length);
        &self.string_data[start..end]
    }

    /// Decode a record to text, when the platform encoding is known.
    ///
    /// Unicode and Microsoft Unicode records are UTF-16BE; Macintosh Roman
    /// records use the MacRoman encoding. Other encodings return `None`.
    pub fn string(&self, record: &NameRecord) -> Option<Cow<'_, str>> {
        let bytes = self.record_bytes(record);
        match (record.platform_id, record.encoding_id) {
            (0, _) | (3, 1) | (3, 10) => {
                let (text, _) = UTF_16BE.decode_without_bom_handling(bytes);
                Some(text)
            }
            (1, 0) => {
                let (text, _) = MACINTOSH.decode_without_bom_handling(bytes);
                Some(text)
            }
            _ => None,
        }
    }
}

impl ReadBinary for NameTable {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16()?;
        let count = ctxt.read_u16()?;
        let string_offset = ctxt.read_u16()?;

        let string_data = {
            let data = scope.data();
            if usize::from(string_offset) > data.len() {
                return Err(ParseError::Truncated);
            }
            data[usize::from(string_offset)..].to_vec()
        };

        let mut name_records = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let platform_id = ctxt.read_u16()?;
            let encoding_id = ctxt.read_u16()?;
            let language_id = ctxt.read_u16()?;
            let name_id = ctxt.read_u16()?;
            let length = ctxt.read_u16()?;
            let offset = ctxt.read_u16()?;
            if usize::from(offset) + usize::from(length) > string_data.len() {
                return Err(ParseError::Truncated);
            }
            name_records.push(NameRecord {
                platform_id,
                encoding_id,
                language_id,
                name_id,
                length,
                offset,
            });
        }

        Ok(NameTable {
            format,
            string_offset,
            name_records,
            string_data,
        })
    }
}

pub fn read_name<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
) -> Result<Option<NameTable>, ParseError> {
    match directory.find(tag::NAME) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            ReadScope::new(&data).read::<NameTable>().map(Some)
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::write::WriteBuffer;

    fn name_fixture() -> NameTable {
        let family_utf16: Vec<u8> = "Example".encode_utf16().flat_map(|unit| unit.to_be_bytes().to_vec()).collect();
        let subfamily_mac = b"Regular";

        let mut buffer = WriteBuffer::new();
        buffer.write_u16(0); // format
        buffer.write_u16(2); // count
        let string_offset = 6 + 2 * 12;
        buffer.write_u16(string_offset as u16);
        // Record 0: Microsoft Unicode BMP family name.
        buffer.write_u16(3);
        buffer.write_u16(1);
        buffer.write_u16(0x0409);
        buffer.write_u16(name_id::FONT_FAMILY);
        buffer.write_u16(family_utf16.len() as u16);
        buffer.write_u16(0);
        // Record 1: Macintosh Roman subfamily name.
        buffer.write_u16(1);
        buffer.write_u16(0);
        buffer.write_u16(0);
        buffer.write_u16(name_id::FONT_SUBFAMILY);
        buffer.write_u16(subfamily_mac.len() as u16);
        buffer.write_u16(family_utf16.len() as u16);
        buffer.write_bytes(&family_utf16);
        buffer.write_bytes(subfamily_mac);
        let data = buffer.into_inner();
        ReadScope::new(&data).read::<NameTable>().unwrap()
    }

    #[test]
    fn test_find_name() {
        let name = name_fixture();
        let record = name.find_name(name_id::FONT_FAMILY).unwrap();
        assert_eq!(record.platform_id, 3);
        assert_eq!(name.string(record).unwrap(), "Example");
        assert!(name.find_name(name_id::SAMPLE_TEXT).is_none());
    }

    #[test]
    fn test_macintosh_string() {
        let name = name_fixture();
        let record = name.find_name(name_id::FONT_SUBFAMILY).unwrap();
        assert_eq!(name.string(record).unwrap(), "Regular");
    }

    #[test]
    fn test_record_past_storage_is_truncated() {
        let mut buffer = WriteBuffer::new();
        buffer.write_u16(0);
        buffer.write_u16(1);
        buffer.write_u16(18); // string storage starts at the end
        buffer.write_u16(0);
        buffer.write_u16(0);
        buffer.write_u16(0);
        buffer.write_u16(name_id::FULL_NAME);
        buffer.write_u16(4); // length runs past the storage
        buffer.write_u16(0);
        let data = buffer.into_inner();
        assert!(matches!(
            ReadScope::new(&data).read::<NameTable>(),
            Err(ParseError::Truncated)
        ));
    }
}
