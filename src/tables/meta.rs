//! `meta` metadata table.
//!
//! Carries opaque metadata strings such as the design (`dlng`) and
//! supported (`slng`) language tags.

use std::convert::TryFrom;
use std::io::{Read, Seek};

use crate::binary::read::{ByteReader, ReadBinary, ReadCtxt, ReadScope};
use crate::error::ParseError;
use crate::tables::{read_table_data, TableDirectory};
use crate::tag;

/// `meta` table: data maps over an owned copy of the table bytes.
#[derive(Clone, Debug)]
pub struct MetaTable {
    pub version: u32,
    pub flags: u32,
    pub data_maps: Vec<DataMap>,
    /// The whole table contents, owned. Data map offsets are relative to
    /// the start of this buffer.
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataMap {
    pub tag: u32,
    pub data_offset: u32,
    pub data_length: u32,
}

impl MetaTable {
    /// The raw bytes for `map_tag` (such as `tag::DLNG`), or `None`.
    pub fn find_metadata(&self, map_tag: u32) -> Option<&[u8]> {
        let map = self.data_maps.iter().find(|map| map.tag == map_tag)?;
        let start = map.data_offset as usize;
        let end = start + map.data_length as usize;
        Some(&self.data[start..end])
    }

    /// `find_metadata` decoded as UTF-8, for the text valued tags.
    pub fn find_metadata_str(&self, map_tag: u32) -> Option<&str> {
        std::str::from_utf8(self.find_metadata(map_tag)?).ok()
    }
}

impl ReadBinary for MetaTable {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let data = ctxt.scope().data().to_vec();
        let version = ctxt.read_u32()?;
        let flags = ctxt.read_u32()?;
        let _data_offset = ctxt.read_u32()?;
        let num_data_maps = ctxt.read_u32()?;

        let num_data_maps = usize::try_from(num_data_maps)?;
        let mut data_maps = Vec::with_capacity(num_data_maps.min(ctxt.bytes_available() / 12));
        for _ in 0..num_data_maps {
            let map_tag = ctxt.read_u32()?;
            let data_offset = ctxt.read_u32()?;
            let data_length = ctxt.read_u32()?;
            let end = u64::from(data_offset) + u64::from(data_length);
            if end > data.len() as u64 {
                return Err(ParseError::Truncated);
            }
            data_maps.push(DataMap {
                tag: map_tag,
                data_offset,
                data_length,
            });
        }

        Ok(MetaTable {
            version,
            flags,
            data_maps,
            data,
        })
    }
}

pub fn read_meta<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
) -> Result<Option<MetaTable>, ParseError> {
    match directory.find(tag::META) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            ReadScope::new(&data).read::<MetaTable>().map(Some)
        }
        None => Ok(None),
    }
}
