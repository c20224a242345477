//! `cmap` character to glyph index mapping table.
//!
//! > The 'cmap' table maps character codes to glyph indices. A font may
//! > contain multiple encoding subtables covering different platforms.
//!
//! — <https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html>
//!
//! Subtable formats 0, 2, 4, 6, 8 and 12 are supported. Lookups are total:
//! out-of-range, unmapped, and inconsistent character codes map to glyph 0,
//! the `.notdef` glyph.

use std::convert::TryFrom;
use std::io::{Read, Seek};

use log::warn;

use crate::binary::read::{ByteReader, ReadBinary, ReadCtxt, ReadScope};
use crate::error::ParseError;
use crate::tables::{read_table_data, TableDirectory};
use crate::tag;

pub const PLATFORM_UNICODE: u16 = 0;
pub const PLATFORM_MACINTOSH: u16 = 1;
pub const PLATFORM_MICROSOFT: u16 = 3;

/// `cmap` table: the top-level record and its encoding subtables.
#[derive(Clone, Debug)]
pub struct Cmap {
    pub version: u16,
    pub encoding_records: Vec<EncodingRecord>,
}

/// One encoding subtable of the `cmap` table.
///
/// `subtable` is `None` when the subtable uses a format this crate does not
/// support (10, 13, 14, or an unknown value).
#[derive(Clone, Debug)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
    pub subtable: Option<CmapSubtable>,
}

/// A decoded encoding subtable.
#[derive(Clone, Debug, PartialEq)]
pub enum CmapSubtable {
    Format0 {
        language: u16,
        glyph_id_array: Vec<u8>,
    },
    Format2 {
        language: u16,
        sub_header_keys: Vec<u16>,
        sub_headers: Vec<SubHeader>,
        glyph_id_array: Vec<u16>,
    },
    Format4 {
        language: u16,
        end_codes: Vec<u16>,
        start_codes: Vec<u16>,
        id_deltas: Vec<i16>,
        id_range_offsets: Vec<u16>,
        glyph_id_array: Vec<u16>,
    },
    Format6 {
        language: u16,
        first_code: u16,
        glyph_id_array: Vec<u16>,
    },
    Format8 {
        language: u32,
        is32: Vec<u8>,
        groups: Vec<SequentialMapGroup>,
    },
    Format12 {
        language: u32,
        groups: Vec<SequentialMapGroup>,
    },
}

/// A subheader of a format 2 subtable.
///
/// `id_range_index` is the subtable's `id_range_offset` converted at decode
/// time into an index into `glyph_id_array` (`None` when the offset was 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubHeader {
    pub first_code: u16,
    pub entry_count: u16,
    pub id_delta: i16,
    pub id_range_index: Option<usize>,
}

/// A group of sequential character codes in a format 8 or 12 subtable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl CmapSubtable {
    fn supports(format: u16) -> bool {
        match format {
            0 | 2 | 4 | 6 | 8 | 12 => true,
            _ => false,
        }
    }

    /// Map a character code to a glyph index.
    ///
    /// Unmapped and out-of-range codes return glyph 0. This operation never
    /// fails.
    pub fn lookup_glyph(&self, ch: u32) -> u16 {
        match self {
            CmapSubtable::Format0 { glyph_id_array, .. } => match glyph_id_array.get(ch as usize) {
                Some(&glyph) if ch < 256 => u16::from(glyph),
                _ => 0,
            },
            CmapSubtable::Format2 {
                sub_header_keys,
                sub_headers,
                glyph_id_array,
                ..
            } => lookup_format_2(ch, sub_header_keys, sub_headers, glyph_id_array),
            CmapSubtable::Format4 {
                end_codes,
                start_codes,
                id_deltas,
                id_range_offsets,
                glyph_id_array,
                ..
            } => lookup_format_4(
                ch,
                end_codes,
                start_codes,
                id_deltas,
                id_range_offsets,
                glyph_id_array,
            ),
            CmapSubtable::Format6 {
                first_code,
                glyph_id_array,
                ..
            } => {
                let first = u32::from(*first_code);
                match ch.checked_sub(first) {
                    Some(index) => glyph_id_array
                        .get(index as usize)
                        .copied()
                        .unwrap_or(0),
                    None => 0,
                }
            }
            CmapSubtable::Format8 { is32, groups, .. } => {
                // A 16-bit value whose is32 bit is set denotes the lead half
                // of a 32-bit code and never maps directly.
                if ch <= 0xFFFF && is32_bit_set(is32, ch as usize) {
                    return 0;
                }
                lookup_groups(ch, groups)
            }
            CmapSubtable::Format12 { groups, .. } => lookup_groups(ch, groups),
        }
    }
}

fn is32_bit_set(is32: &[u8], index: usize) -> bool {
    match is32.get(index / 8) {
        Some(&byte) => byte & (0x80 >> (index % 8)) != 0,
        None => false,
    }
}

fn lookup_format_2(
    ch: u32,
    sub_header_keys: &[u16],
    sub_headers: &[SubHeader],
    glyph_id_array: &[u16],
) -> u16 {
    if ch > 0xFFFF {
        return 0;
    }
    let high = (ch >> 8) as usize;
    let key = match sub_header_keys.get(high) {
        Some(&key) => key,
        None => return 0,
    };
    let sub_header_index = usize::from(key / 8);
    // Key 0 covers single byte codes; a two byte code whose high byte maps
    // to subheader 0 has no mapping.
    if sub_header_index == 0 && ch > 0xFF {
        return 0;
    }
    let sub_header = match sub_headers.get(sub_header_index) {
        Some(sub_header) => sub_header,
        None => return 0,
    };
    let low = (ch & 0xFF) as u16;
    let index_in_range = match low.checked_sub(sub_header.first_code) {
        Some(index) if index < sub_header.entry_count => index,
        _ => return 0,
    };
    match sub_header.id_range_index {
        None => add_delta(low, sub_header.id_delta),
        Some(range_index) => {
            match glyph_id_array.get(range_index + usize::from(index_in_range)) {
                Some(&glyph) if glyph != 0 => add_delta(glyph, sub_header.id_delta),
                _ => 0,
            }
        }
    }
}

fn lookup_format_4(
    ch: u32,
    end_codes: &[u16],
    start_codes: &[u16],
    id_deltas: &[i16],
    id_range_offsets: &[u16],
    glyph_id_array: &[u16],
) -> u16 {
    if ch > 0xFFFF {
        return 0;
    }
    let ch = ch as u16;
    // Smallest segment whose end code is >= ch.
    let segment = match end_codes.binary_search(&ch) {
        Ok(index) => index,
        Err(index) => index,
    };
    if segment >= end_codes.len() {
        return 0;
    }
    let start_code = start_codes[segment];
    if start_code > ch {
        return 0;
    }
    let id_range_offset = id_range_offsets[segment];
    if id_range_offset == 0 {
        return add_delta(ch, id_deltas[segment]);
    }
    // The offset is specified in bytes from the id_range_offset entry
    // itself, which sits seg_count - segment entries before the glyph index
    // array.
    let index = usize::from(id_range_offset / 2) + usize::from(ch - start_code);
    let index = match index.checked_sub(end_codes.len() - segment) {
        Some(index) => index,
        None => return 0,
    };
    match glyph_id_array.get(index) {
        Some(&glyph) if glyph != 0 => add_delta(glyph, id_deltas[segment]),
        _ => 0,
    }
}

fn lookup_groups(ch: u32, groups: &[SequentialMapGroup]) -> u16 {
    let index = match groups.binary_search_by_key(&ch, |group| group.start_char_code) {
        Ok(index) => index,
        Err(0) => return 0,
        Err(index) => index - 1,
    };
    let group = &groups[index];
    if ch > group.end_char_code {
        return 0;
    }
    let glyph = group.start_glyph_id + (ch - group.start_char_code);
    u16::try_from(glyph).unwrap_or(0)
}

/// Glyph index arithmetic is modulo 65536.
fn add_delta(glyph: u16, id_delta: i16) -> u16 {
    glyph.wrapping_add(id_delta as u16)
}

impl ReadBinary for Cmap {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16()?;
        let num_tables = ctxt.read_u16()?;

        let mut encoding_records = Vec::with_capacity(usize::from(num_tables));
        for _ in 0..num_tables {
            let platform_id = ctxt.read_u16()?;
            let encoding_id = ctxt.read_u16()?;
            let offset = ctxt.read_u32()?;
            encoding_records.push(EncodingRecord {
                platform_id,
                encoding_id,
                offset,
                subtable: None,
            });
        }

        for record in encoding_records.iter_mut() {
            let subtable_scope = scope.offset(usize::try_from(record.offset)?);
            let format = subtable_scope.ctxt().read_u16()?;
            if CmapSubtable::supports(format) {
                record.subtable = Some(subtable_scope.read::<CmapSubtable>()?);
            } else {
                warn!(
                    "skipping unsupported cmap subtable format {} (platform {}, encoding {})",
                    format, record.platform_id, record.encoding_id
                );
            }
        }

        Ok(Cmap {
            version,
            encoding_records,
        })
    }
}

impl ReadBinary for CmapSubtable {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let format = ctxt.read_u16()?;
        match format {
            0 => read_format_0(ctxt),
            2 => read_format_2(ctxt),
            4 => read_format_4(ctxt),
            6 => read_format_6(ctxt),
            8 => read_format_8(ctxt),
            12 => read_format_12(ctxt),
            _ => Err(ParseError::BadFormat),
        }
    }
}

fn read_format_0(ctxt: &mut ReadCtxt<'_>) -> Result<CmapSubtable, ParseError> {
    let length = ctxt.read_u16()?;
    if length < 262 {
        return Err(ParseError::Truncated);
    }
    let language = ctxt.read_u16()?;
    let glyph_id_array = ctxt.read_slice(256)?.to_vec();
    Ok(CmapSubtable::Format0 {
        language,
        glyph_id_array,
    })
}

// Layout of a format 2 subtable, in bytes:
//   0   format, length, language
//   6   sub_header_keys[256]
//   518 sub_headers (8 bytes each)
//   518 + 8 * n  glyph_id_array
fn read_format_2(ctxt: &mut ReadCtxt<'_>) -> Result<CmapSubtable, ParseError> {
    let length = usize::from(ctxt.read_u16()?);
    let language = ctxt.read_u16()?;
    let sub_header_keys = ctxt.read_u16_array(256)?;

    let mut max_key = 0;
    for &key in &sub_header_keys {
        if key % 8 != 0 {
            return Err(ParseError::BadFormat);
        }
        max_key = max_key.max(key / 8);
    }
    let sub_header_count = usize::from(max_key) + 1;

    let array_start = 518 + 8 * sub_header_count;
    let glyph_id_count = length
        .checked_sub(array_start)
        .ok_or(ParseError::BadFormat)?
        / 2;

    let mut sub_headers = Vec::with_capacity(sub_header_count);
    for sub_header_index in 0..sub_header_count {
        let first_code = ctxt.read_u16()?;
        let entry_count = ctxt.read_u16()?;
        let id_delta = ctxt.read_i16()?;
        let id_range_offset = ctxt.read_u16()?;
        let id_range_index = if id_range_offset == 0 {
            None
        } else {
            // The offset counts from the position of the id_range_offset
            // field itself.
            let field_position = 518 + 8 * sub_header_index + 6;
            let target = field_position + usize::from(id_range_offset);
            if target < array_start || (target - array_start) % 2 != 0 {
                return Err(ParseError::BadFormat);
            }
            let index = (target - array_start) / 2;
            if index + usize::from(entry_count) > glyph_id_count {
                return Err(ParseError::BadFormat);
            }
            Some(index)
        };
        sub_headers.push(SubHeader {
            first_code,
            entry_count,
            id_delta,
            id_range_index,
        });
    }
    let glyph_id_array = ctxt.read_u16_array(glyph_id_count)?;

    Ok(CmapSubtable::Format2 {
        language,
        sub_header_keys,
        sub_headers,
        glyph_id_array,
    })
}

fn read_format_4(ctxt: &mut ReadCtxt<'_>) -> Result<CmapSubtable, ParseError> {
    let length = usize::from(ctxt.read_u16()?);
    let language = ctxt.read_u16()?;
    let seg_count_x2 = ctxt.read_u16()?;
    if seg_count_x2 == 0 || seg_count_x2 % 2 != 0 {
        return Err(ParseError::BadFormat);
    }
    let seg_count = usize::from(seg_count_x2 / 2);
    ctxt.skip(3 * 2)?; // search_range, entry_selector, range_shift

    let end_codes = ctxt.read_u16_array(seg_count)?;
    if end_codes.last() != Some(&0xFFFF) {
        return Err(ParseError::BadFormat);
    }
    let _reserved_pad = ctxt.read_u16()?;
    let start_codes = ctxt.read_u16_array(seg_count)?;
    let id_deltas = ctxt.read_i16_array(seg_count)?;
    let id_range_offsets = ctxt.read_u16_array(seg_count)?;

    // Whatever the declared length leaves after the fixed part and the four
    // parallel segment arrays belongs to the glyph index array.
    let fixed_part = 16 + 8 * seg_count;
    let glyph_id_count = length
        .checked_sub(fixed_part)
        .ok_or(ParseError::BadFormat)?
        / 2;
    let glyph_id_array = ctxt.read_u16_array(glyph_id_count)?;

    Ok(CmapSubtable::Format4 {
        language,
        end_codes,
        start_codes,
        id_deltas,
        id_range_offsets,
        glyph_id_array,
    })
}

fn read_format_6(ctxt: &mut ReadCtxt<'_>) -> Result<CmapSubtable, ParseError> {
    let _length = ctxt.read_u16()?;
    let language = ctxt.read_u16()?;
    let first_code = ctxt.read_u16()?;
    let entry_count = ctxt.read_u16()?;
    let glyph_id_array = ctxt.read_u16_array(usize::from(entry_count))?;
    Ok(CmapSubtable::Format6 {
        language,
        first_code,
        glyph_id_array,
    })
}

fn read_format_8(ctxt: &mut ReadCtxt<'_>) -> Result<CmapSubtable, ParseError> {
    let _reserved = ctxt.read_u16()?;
    let _length = ctxt.read_u32()?;
    let language = ctxt.read_u32()?;
    let is32 = ctxt.read_slice(8192)?.to_vec();
    let num_groups = ctxt.read_u32()?;
    let groups = read_groups(ctxt, num_groups)?;
    Ok(CmapSubtable::Format8 {
        language,
        is32,
        groups,
    })
}

fn read_format_12(ctxt: &mut ReadCtxt<'_>) -> Result<CmapSubtable, ParseError> {
    let _reserved = ctxt.read_u16()?;
    let _length = ctxt.read_u32()?;
    let language = ctxt.read_u32()?;
    let num_groups = ctxt.read_u32()?;
    let groups = read_groups(ctxt, num_groups)?;
    Ok(CmapSubtable::Format12 { language, groups })
}

fn read_groups(
    ctxt: &mut ReadCtxt<'_>,
    num_groups: u32,
) -> Result<Vec<SequentialMapGroup>, ParseError> {
    let num_groups = usize::try_from(num_groups)?;
    let mut groups = Vec::with_capacity(num_groups.min(ctxt.bytes_available() / 12));
    let mut previous_end = None;
    for _ in 0..num_groups {
        let start_char_code = ctxt.read_u32()?;
        let end_char_code = ctxt.read_u32()?;
        let start_glyph_id = ctxt.read_u32()?;
        if start_char_code > end_char_code {
            return Err(ParseError::BadFormat);
        }
        // Groups must be sorted by start code and must not overlap.
        match previous_end {
            Some(previous_end) if start_char_code <= previous_end => {
                return Err(ParseError::BadFormat)
            }
            _ => {}
        }
        previous_end = Some(end_char_code);
        groups.push(SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        });
    }
    Ok(groups)
}

pub fn read_cmap<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
) -> Result<Option<Cmap>, ParseError> {
    match directory.find(tag::CMAP) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            ReadScope::new(&data).read::<Cmap>().map(Some)
        }
        None => Ok(None),
    }
}
