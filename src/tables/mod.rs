//! The table directory and fixed-size font tables.
//!
//! > A TrueType font file consists of a sequence of concatenated tables. A
//! > table directory at the beginning of the file allows access to the
//! > tables within.
//!
//! — <https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6.html>

pub mod cmap;
pub mod glyf;
pub mod loca;
pub mod meta;
pub mod name;

use std::io::{Read, Seek};

use log::debug;

use crate::binary::read::{ByteReader, ReadBinary, ReadBinaryDep, ReadCtxt, ReadScope};
use crate::binary::write::WriteBuffer;
use crate::error::ParseError;
use crate::tag::{self, DisplayTag};

/// An entry in the table directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The offset subtable and table directory at the start of an SFNT file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDirectory {
    pub scaler_type: u32,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    /// Directory records, sorted by tag.
    pub table_records: Vec<TableRecord>,
}

/// `head` font header table.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadTable {
    pub version: u32,
    pub font_revision: i32,
    pub check_sum_adjustment: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: i64,
    pub modified: i64,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    pub index_to_loc_format: IndexToLocFormat,
    pub glyph_data_format: i16,
}

/// The format of the offsets in the `loca` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexToLocFormat {
    Short,
    Long,
}

/// `hhea` horizontal header table.
#[derive(Clone, Debug, PartialEq)]
pub struct HheaTable {
    pub version: u32,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub metric_data_format: i16,
    pub num_h_metrics: u16,
}

/// `maxp` maximum profile table.
#[derive(Clone, Debug, PartialEq)]
pub struct MaxpTable {
    pub version: u32,
    pub num_glyphs: u16,
    /// Extra fields present in version 1.0 of the table. Absent in version
    /// 0.5, which CFF flavoured fonts use.
    pub version1_sub_table: Option<MaxpVersion1SubTable>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaxpVersion1SubTable {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

/// An entry for a single glyph in the `hmtx` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

/// `hmtx` horizontal metrics table.
///
/// Glyphs at or past `h_metrics.len()` take their advance from the last
/// entry of `h_metrics` and their left side bearing from
/// `left_side_bearings`.
#[derive(Clone, Debug, PartialEq)]
pub struct HmtxTable {
    pub h_metrics: Vec<LongHorMetric>,
    pub left_side_bearings: Vec<i16>,
}

impl HeadTable {
    pub const MAGIC: u32 = 0x5F0F3CF5;
}

impl TableDirectory {
    /// Look up the record for `table_tag`, or `None` if the font does not
    /// contain that table.
    pub fn find(&self, table_tag: u32) -> Option<&TableRecord> {
        self.table_records
            .binary_search_by_key(&table_tag, |record| record.table_tag)
            .ok()
            .map(|index| &self.table_records[index])
    }

    pub fn num_tables(&self) -> u16 {
        self.table_records.len() as u16
    }

    /// Re-encode the directory. For a font that satisfies the SFNT
    /// requirement that records be sorted by tag, the output is
    /// byte-identical to the input.
    pub fn write(&self, buffer: &mut WriteBuffer) {
        buffer.write_u32(self.scaler_type);
        buffer.write_u16(self.num_tables());
        buffer.write_u16(self.search_range);
        buffer.write_u16(self.entry_selector);
        buffer.write_u16(self.range_shift);
        for record in &self.table_records {
            buffer.write_u32(record.table_tag);
            buffer.write_u32(record.checksum);
            buffer.write_u32(record.offset);
            buffer.write_u32(record.length);
        }
    }
}

/// Read the offset subtable and table directory from absolute offset 0.
pub fn read_table_directory<R: Read + Seek>(
    reader: &mut ByteReader<R>,
) -> Result<TableDirectory, ParseError> {
    reader.seek(0)?;
    let scaler_type = reader.read_u32()?;
    match scaler_type {
        tag::TRUE | tag::VER1 | tag::TYP1 | tag::OTTO => {}
        _ => return Err(ParseError::BadFormat),
    }
    let num_tables = reader.read_u16()?;
    let search_range = reader.read_u16()?;
    let entry_selector = reader.read_u16()?;
    let range_shift = reader.read_u16()?;

    let mut table_records = Vec::with_capacity(usize::from(num_tables));
    for _ in 0..num_tables {
        let table_tag = reader.read_u32()?;
        let checksum = reader.read_u32()?;
        let offset = reader.read_u32()?;
        let length = reader.read_u32()?;
        let end = u64::from(offset)
            .checked_add(u64::from(length))
            .ok_or(ParseError::Truncated)?;
        if end > reader.len() {
            debug!(
                "table {} extends past the end of the file",
                DisplayTag(table_tag)
            );
            return Err(ParseError::Truncated);
        }
        table_records.push(TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        });
    }

    let sorted = table_records
        .windows(2)
        .all(|pair| pair[0].table_tag < pair[1].table_tag);
    if !sorted {
        debug!("table directory records are not sorted by tag");
        table_records.sort_by_key(|record| record.table_tag);
    }

    Ok(TableDirectory {
        scaler_type,
        search_range,
        entry_selector,
        range_shift,
        table_records,
    })
}

/// Fetch the raw bytes of a table.
pub fn read_table_data<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    record: &TableRecord,
) -> Result<Vec<u8>, ParseError> {
    reader
        .at(u64::from(record.offset), u64::from(record.length))?
        .read_to_vec()
}

impl ReadBinary for HeadTable {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32()?;
        let font_revision = ctxt.read_i32()?;
        let check_sum_adjustment = ctxt.read_u32()?;
        let magic = ctxt.read_u32()?;
        if magic != Self::MAGIC {
            return Err(ParseError::BadMagic);
        }
        let flags = ctxt.read_u16()?;
        let units_per_em = ctxt.read_u16()?;
        if units_per_em < 1 || units_per_em > 16384 {
            return Err(ParseError::BadFormat);
        }
        let created = read_long_date_time(ctxt)?;
        let modified = read_long_date_time(ctxt)?;
        let x_min = ctxt.read_i16()?;
        let y_min = ctxt.read_i16()?;
        let x_max = ctxt.read_i16()?;
        let y_max = ctxt.read_i16()?;
        let mac_style = ctxt.read_u16()?;
        let lowest_rec_ppem = ctxt.read_u16()?;
        let font_direction_hint = ctxt.read_i16()?;
        let index_to_loc_format = match ctxt.read_i16()? {
            0 => IndexToLocFormat::Short,
            1 => IndexToLocFormat::Long,
            _ => return Err(ParseError::BadFormat),
        };
        let glyph_data_format = ctxt.read_i16()?;

        Ok(HeadTable {
            version,
            font_revision,
            check_sum_adjustment,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

fn read_long_date_time(ctxt: &mut ReadCtxt<'_>) -> Result<i64, ParseError> {
    let high = ctxt.read_u32()?;
    let low = ctxt.read_u32()?;
    Ok(((i64::from(high)) << 32) | i64::from(low))
}

impl ReadBinary for HheaTable {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32()?;
        let ascender = ctxt.read_i16()?;
        let descender = ctxt.read_i16()?;
        let line_gap = ctxt.read_i16()?;
        let advance_width_max = ctxt.read_u16()?;
        let min_left_side_bearing = ctxt.read_i16()?;
        let min_right_side_bearing = ctxt.read_i16()?;
        let x_max_extent = ctxt.read_i16()?;
        let caret_slope_rise = ctxt.read_i16()?;
        let caret_slope_run = ctxt.read_i16()?;
        let caret_offset = ctxt.read_i16()?;
        ctxt.skip(4 * 2)?; // reserved
        let metric_data_format = ctxt.read_i16()?;
        let num_h_metrics = ctxt.read_u16()?;

        Ok(HheaTable {
            version,
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            metric_data_format,
            num_h_metrics,
        })
    }
}

impl ReadBinary for MaxpTable {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32()?;
        let num_glyphs = ctxt.read_u16()?;
        let version1_sub_table = if version >= 0x00010000 {
            Some(MaxpVersion1SubTable::read(ctxt)?)
        } else {
            None
        };

        Ok(MaxpTable {
            version,
            num_glyphs,
            version1_sub_table,
        })
    }
}

impl ReadBinary for MaxpVersion1SubTable {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let max_points = ctxt.read_u16()?;
        let max_contours = ctxt.read_u16()?;
        let max_composite_points = ctxt.read_u16()?;
        let max_composite_contours = ctxt.read_u16()?;
        let max_zones = ctxt.read_u16()?;
        let max_twilight_points = ctxt.read_u16()?;
        let max_storage = ctxt.read_u16()?;
        let max_function_defs = ctxt.read_u16()?;
        let max_instruction_defs = ctxt.read_u16()?;
        let max_stack_elements = ctxt.read_u16()?;
        let max_size_of_instructions = ctxt.read_u16()?;
        let max_component_elements = ctxt.read_u16()?;
        let max_component_depth = ctxt.read_u16()?;

        Ok(MaxpVersion1SubTable {
            max_points,
            max_contours,
            max_composite_points,
            max_composite_contours,
            max_zones,
            max_twilight_points,
            max_storage,
            max_function_defs,
            max_instruction_defs,
            max_stack_elements,
            max_size_of_instructions,
            max_component_elements,
            max_component_depth,
        })
    }
}

impl ReadBinaryDep for HmtxTable {
    /// (num glyphs, num long horizontal metrics)
    type Args = (usize, usize);

    fn read_dep(ctxt: &mut ReadCtxt<'_>, (num_glyphs, num_h_metrics): Self::Args) -> Result<Self, ParseError> {
        if num_h_metrics < 1 || num_h_metrics > num_glyphs {
            return Err(ParseError::BadFormat);
        }
        let mut h_metrics = Vec::with_capacity(num_h_metrics);
        for _ in 0..num_h_metrics {
            let advance_width = ctxt.read_u16()?;
            let lsb = ctxt.read_i16()?;
            h_metrics.push(LongHorMetric { advance_width, lsb });
        }
        let left_side_bearings = ctxt.read_i16_array(num_glyphs - num_h_metrics)?;

        Ok(HmtxTable {
            h_metrics,
            left_side_bearings,
        })
    }
}

pub fn read_head<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
) -> Result<Option<HeadTable>, ParseError> {
    match directory.find(tag::HEAD) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            ReadScope::new(&data).read::<HeadTable>().map(Some)
        }
        None => Ok(None),
    }
}

pub fn read_hhea<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
) -> Result<Option<HheaTable>, ParseError> {
    match directory.find(tag::HHEA) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            ReadScope::new(&data).read::<HheaTable>().map(Some)
        }
        None => Ok(None),
    }
}

pub fn read_maxp<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
) -> Result<Option<MaxpTable>, ParseError> {
    match directory.find(tag::MAXP) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            ReadScope::new(&data).read::<MaxpTable>().map(Some)
        }
        None => Ok(None),
    }
}

pub fn read_hmtx<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
    hhea: &HheaTable,
    maxp: &MaxpTable,
) -> Result<Option<HmtxTable>, ParseError> {
    match directory.find(tag::HMTX) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            let args = (
                usize::from(maxp.num_glyphs),
                usize::from(hhea.num_h_metrics),
            );
            ReadScope::new(&data).read_dep::<HmtxTable>(args).map(Some)
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;
    use std::io::Cursor;

    fn directory_fixture() -> Vec<u8> {
        let mut buffer = WriteBuffer::new();
        buffer.write_u32(tag::TRUE);
        buffer.write_u16(2); // num tables
        buffer.write_u16(32);
        buffer.write_u16(1);
        buffer.write_u16(0);
        // cmap record
        buffer.write_u32(tag::CMAP);
        buffer.write_u32(0);
        buffer.write_u32(44);
        buffer.write_u32(4);
        // head record
        buffer.write_u32(tag::HEAD);
        buffer.write_u32(0);
        buffer.write_u32(48);
        buffer.write_u32(8);
        buffer.write_bytes(&[0; 12]); // table bodies
        buffer.into_inner()
    }

    #[test]
    fn test_read_table_directory() {
        let data = directory_fixture();
        let mut reader = ByteReader::new(Cursor::new(data)).unwrap();
        let directory = read_table_directory(&mut reader).unwrap();

        assert_eq!(directory.scaler_type, tag::TRUE);
        assert_eq!(directory.num_tables(), 2);
        let head = directory.find(tag::HEAD).unwrap();
        assert_eq!(head.offset, 48);
        assert_eq!(head.length, 8);
        assert!(directory.find(tag::GLYF).is_none());
    }

    #[test]
    fn test_table_directory_round_trip() {
        let data = directory_fixture();
        let mut reader = ByteReader::new(Cursor::new(data.clone())).unwrap();
        let directory = read_table_directory(&mut reader).unwrap();

        let mut buffer = WriteBuffer::new();
        directory.write(&mut buffer);
        let directory_len = 12 + 16 * usize::from(directory.num_tables());
        assert_eq!(buffer.bytes(), &data[..directory_len]);
    }

    #[test]
    fn test_directory_rejects_bad_scaler_type() {
        let mut buffer = WriteBuffer::new();
        buffer.write_u32(crate::tag!(b"junk"));
        buffer.write_bytes(&[0; 8]);
        let mut reader = ByteReader::new(Cursor::new(buffer.into_inner())).unwrap();
        assert!(matches!(
            read_table_directory(&mut reader),
            Err(ParseError::BadFormat)
        ));
    }

    #[test]
    fn test_directory_rejects_table_past_eof() {
        let mut buffer = WriteBuffer::new();
        buffer.write_u32(tag::VER1);
        buffer.write_u16(1);
        buffer.write_u16(16);
        buffer.write_u16(0);
        buffer.write_u16(0);
        buffer.write_u32(tag::HEAD);
        buffer.write_u32(0);
        buffer.write_u32(28);
        buffer.write_u32(100); // extends past the end
        let mut reader = ByteReader::new(Cursor::new(buffer.into_inner())).unwrap();
        assert!(matches!(
            read_table_directory(&mut reader),
            Err(ParseError::Truncated)
        ));
    }

    fn head_fixture(units_per_em: u16, index_to_loc_format: i16) -> Vec<u8> {
        let mut buffer = WriteBuffer::new();
        buffer.write_u32(0x00010000); // version
        buffer.write_i32(0x00010000); // font revision
        buffer.write_u32(0); // checksum adjustment
        buffer.write_u32(HeadTable::MAGIC);
        buffer.write_u16(0); // flags
        buffer.write_u16(units_per_em);
        buffer.write_bytes(&[0; 16]); // created + modified
        buffer.write_i16(-10); // x min
        buffer.write_i16(-20); // y min
        buffer.write_i16(100); // x max
        buffer.write_i16(200); // y max
        buffer.write_u16(0); // mac style
        buffer.write_u16(8); // lowest rec ppem
        buffer.write_i16(2); // font direction hint
        buffer.write_i16(index_to_loc_format);
        buffer.write_i16(0); // glyph data format
        buffer.into_inner()
    }

    #[test]
    fn test_read_head() {
        let data = head_fixture(2048, 0);
        let head = ReadScope::new(&data).read::<HeadTable>().unwrap();
        assert_eq!(head.units_per_em, 2048);
        assert_eq!(head.index_to_loc_format, IndexToLocFormat::Short);
        assert_eq!(head.x_min, -10);
        assert_eq!(head.y_max, 200);
    }

    #[test]
    fn test_head_bad_magic() {
        let mut data = head_fixture(2048, 0);
        data[12] = 0xDE; // corrupt the magic number
        assert!(matches!(
            ReadScope::new(&data).read::<HeadTable>(),
            Err(ParseError::BadMagic)
        ));
    }

    #[test]
    fn test_head_rejects_bad_loca_format() {
        let data = head_fixture(2048, 2);
        assert!(matches!(
            ReadScope::new(&data).read::<HeadTable>(),
            Err(ParseError::BadFormat)
        ));
    }

    #[test]
    fn test_head_rejects_bad_units_per_em() {
        let data = head_fixture(0, 0);
        assert!(matches!(
            ReadScope::new(&data).read::<HeadTable>(),
            Err(ParseError::BadFormat)
        ));
    }

    #[test]
    fn test_read_maxp_version_05() {
        let mut buffer = WriteBuffer::new();
        buffer.write_u32(0x00005000);
        buffer.write_u16(7);
        let data = buffer.into_inner();
        let maxp = ReadScope::new(&data).read::<MaxpTable>().unwrap();
        assert_eq!(maxp.num_glyphs, 7);
        assert!(maxp.version1_sub_table.is_none());
    }

    #[test]
    fn test_read_maxp_version_10() {
        let mut buffer = WriteBuffer::new();
        buffer.write_u32(0x00010000);
        buffer.write_u16(7);
        for value in 1..=13u16 {
            buffer.write_u16(value);
        }
        let data = buffer.into_inner();
        let maxp = ReadScope::new(&data).read::<MaxpTable>().unwrap();
        let sub = maxp.version1_sub_table.unwrap();
        assert_eq!(sub.max_points, 1);
        assert_eq!(sub.max_component_depth, 13);
    }

    #[test]
    fn test_read_hmtx_with_tail() {
        let mut buffer = WriteBuffer::new();
        // Two long metrics then two bare left side bearings.
        buffer.write_u16(500);
        buffer.write_i16(10);
        buffer.write_u16(600);
        buffer.write_i16(20);
        buffer.write_i16(-5);
        buffer.write_i16(30);
        let data = buffer.into_inner();
        let hmtx = ReadScope::new(&data).read_dep::<HmtxTable>((4, 2)).unwrap();
        assert_eq!(hmtx.h_metrics.len(), 2);
        assert_eq!(
            hmtx.h_metrics[1],
            LongHorMetric {
                advance_width: 600,
                lsb: 20
            }
        );
        assert_eq!(hmtx.left_side_bearings, vec![-5, 30]);
    }

    #[test]
    fn test_hmtx_rejects_bad_metric_count() {
        let data = [0u8; 8];
        assert!(matches!(
            ReadScope::new(&data).read_dep::<HmtxTable>((2, 3)),
            Err(ParseError::BadFormat)
        ));
    }

    #[test]
    fn test_hmtx_truncated() {
        let data = [0u8; 3];
        assert!(matches!(
            ReadScope::new(&data).read_dep::<HmtxTable>((1, 1)),
            Err(ParseError::Truncated)
        ));
    }
}
