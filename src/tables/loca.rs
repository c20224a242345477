//! `loca` glyph location index table.

use std::io::{Read, Seek};

use crate::binary::read::{ByteReader, ReadBinaryDep, ReadCtxt, ReadScope};
use crate::error::ParseError;
use crate::tables::{read_table_data, HeadTable, IndexToLocFormat, MaxpTable, TableDirectory};
use crate::tag;

/// The glyph location index table.
///
/// Holds `num_glyphs + 1` byte offsets into the `glyf` table. Short format
/// offsets are stored halved in the font and are doubled on load, so
/// `offsets` is always in bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocaTable {
    pub offsets: Vec<u32>,
}

impl LocaTable {
    pub fn num_glyphs(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// The byte range of `glyph_index` within the `glyf` table, or `None`
    /// when the index is out of range.
    pub fn glyph_range(&self, glyph_index: u16) -> Option<(u32, u32)> {
        let index = usize::from(glyph_index);
        match (self.offsets.get(index), self.offsets.get(index + 1)) {
            (Some(&start), Some(&end)) => Some((start, end)),
            _ => None,
        }
    }
}

impl ReadBinaryDep for LocaTable {
    /// (num glyphs, offset format)
    type Args = (usize, IndexToLocFormat);

    fn read_dep(
        ctxt: &mut ReadCtxt<'_>,
        (num_glyphs, index_to_loc_format): Self::Args,
    ) -> Result<Self, ParseError> {
        let num_offsets = num_glyphs + 1;
        let offsets = match index_to_loc_format {
            IndexToLocFormat::Short => ctxt
                .read_u16_array(num_offsets)?
                .into_iter()
                .map(|offset| u32::from(offset) * 2)
                .collect(),
            IndexToLocFormat::Long => ctxt.read_u32_array(num_offsets)?,
        };

        let non_decreasing = offsets.windows(2).all(|pair| pair[0] <= pair[1]);
        if !non_decreasing {
            return Err(ParseError::BadFormat);
        }

        Ok(LocaTable { offsets })
    }
}

pub fn read_loca<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
    head: &HeadTable,
    maxp: &MaxpTable,
) -> Result<Option<LocaTable>, ParseError> {
    match directory.find(tag::LOCA) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            let args = (usize::from(maxp.num_glyphs), head.index_to_loc_format);
            ReadScope::new(&data).read_dep::<LocaTable>(args).map(Some)
        }
        None => Ok(None),
    }
}
