//! `glyf` glyph data table.
//!
//! Glyph descriptions are addressed through the `loca` table. A simple glyph
//! carries its own contours; a composite glyph assembles other glyphs by
//! affine reference. Hinting instructions are retained but never executed.

use std::convert::TryFrom;
use std::io::{Read, Seek};

use bitflags::bitflags;
use tinyvec::TinyVec;

use crate::binary::read::{ByteReader, ReadBinary, ReadCtxt, ReadScope};
use crate::error::ParseError;
use crate::fixed::F2Dot14;
use crate::tables::loca::LocaTable;
use crate::tables::{read_table_data, TableDirectory};
use crate::tag;

/// The raw bytes of the `glyf` table.
#[derive(Clone, Debug)]
pub struct GlyfTable {
    pub data: Vec<u8>,
}

bitflags! {
    pub struct SimpleGlyphFlag: u8 {
        const ON_CURVE_POINT = 0x01;
        const X_SHORT_VECTOR = 0x02;
        const Y_SHORT_VECTOR = 0x04;
        const REPEAT_FLAG = 0x08;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0x10;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0x20;
    }
}

bitflags! {
    pub struct CompositeGlyphFlag: u16 {
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        const ARGS_ARE_XY_VALUES = 0x0002;
        const ROUND_XY_TO_GRID = 0x0004;
        const WE_HAVE_A_SCALE = 0x0008;
        const MORE_COMPONENTS = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        const USE_MY_METRICS = 0x0200;
        const OVERLAP_COMPOUND = 0x0400;
        const SCALED_COMPONENT_OFFSET = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// A point in font design units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point(pub i16, pub i16);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

/// A glyph description read from the `glyf` table.
#[derive(Clone, Debug)]
pub struct Glyph {
    pub number_of_contours: i16,
    pub bounding_box: BoundingBox,
    pub data: GlyphData,
}

#[derive(Clone, Debug)]
pub enum GlyphData {
    /// A glyph with no outline, such as the space.
    Empty,
    Simple(SimpleGlyph),
    Composite {
        glyphs: Vec<CompositeGlyph>,
        instructions: Vec<u8>,
    },
}

#[derive(Clone, Debug)]
pub struct SimpleGlyph {
    pub end_pts_of_contours: TinyVec<[u16; 8]>,
    pub instructions: Vec<u8>,
    pub flags: Vec<SimpleGlyphFlag>,
    pub coordinates: Vec<Point>,
}

/// One component of a composite glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeGlyph {
    pub flags: CompositeGlyphFlag,
    pub glyph_index: u16,
    pub argument1: CompositeGlyphArgument,
    pub argument2: CompositeGlyphArgument,
    pub scale: Option<CompositeGlyphScale>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeGlyphArgument {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CompositeGlyphScale {
    Scale(F2Dot14),
    XY {
        x_scale: F2Dot14,
        y_scale: F2Dot14,
    },
    Matrix([[F2Dot14; 2]; 2]),
}

impl Glyph {
    /// The empty glyph produced by a zero-length `loca` entry.
    pub fn empty() -> Glyph {
        Glyph {
            number_of_contours: 0,
            bounding_box: BoundingBox::default(),
            data: GlyphData::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.data {
            GlyphData::Empty => true,
            _ => false,
        }
    }
}

impl SimpleGlyph {
    pub fn number_of_points(&self) -> usize {
        self.coordinates.len()
    }

    /// The range of point indices belonging to `contour`.
    pub fn contour_range(&self, contour: usize) -> Option<std::ops::Range<usize>> {
        let end = usize::from(*self.end_pts_of_contours.get(contour)?) + 1;
        let start = if contour == 0 {
            0
        } else {
            usize::from(self.end_pts_of_contours[contour - 1]) + 1
        };
        Some(start..end)
    }
}

impl CompositeGlyphArgument {
    pub fn to_i32(self) -> i32 {
        match self {
            CompositeGlyphArgument::U8(value) => i32::from(value),
            CompositeGlyphArgument::I8(value) => i32::from(value),
            CompositeGlyphArgument::U16(value) => i32::from(value),
            CompositeGlyphArgument::I16(value) => i32::from(value),
        }
    }
}

impl ReadBinary for Glyph {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let number_of_contours = ctxt.read_i16()?;
        let bounding_box = BoundingBox::read(ctxt)?;
        let data = if number_of_contours >= 0 {
            let simple = read_simple_glyph(ctxt, usize::try_from(number_of_contours)?)?;
            GlyphData::Simple(simple)
        } else if number_of_contours == -1 {
            let (glyphs, instructions) = read_composite_glyph(ctxt)?;
            GlyphData::Composite {
                glyphs,
                instructions,
            }
        } else {
            return Err(ParseError::BadFormat);
        };

        Ok(Glyph {
            number_of_contours,
            bounding_box,
            data,
        })
    }
}

impl ReadBinary for BoundingBox {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let x_min = ctxt.read_i16()?;
        let y_min = ctxt.read_i16()?;
        let x_max = ctxt.read_i16()?;
        let y_max = ctxt.read_i16()?;
        Ok(BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }
}

fn read_simple_glyph(
    ctxt: &mut ReadCtxt<'_>,
    number_of_contours: usize,
) -> Result<SimpleGlyph, ParseError> {
    let mut end_pts_of_contours = TinyVec::default();
    let mut previous = None;
    for _ in 0..number_of_contours {
        let end_pt = ctxt.read_u16()?;
        // Contour end points must increase, each contour holding at least
        // one point.
        match previous {
            Some(prev) if end_pt <= prev => return Err(ParseError::BadFormat),
            _ => {}
        }
        previous = Some(end_pt);
        end_pts_of_contours.push(end_pt);
    }
    let number_of_points = match end_pts_of_contours.last() {
        Some(&last) => usize::from(last) + 1,
        None => 0,
    };

    let instruction_length = usize::from(ctxt.read_u16()?);
    let instructions = ctxt.read_slice(instruction_length)?.to_vec();

    let mut flags = Vec::with_capacity(number_of_points);
    while flags.len() < number_of_points {
        let flag = SimpleGlyphFlag::from_bits_truncate(ctxt.read_u8()?);
        flags.push(flag);
        if flag.contains(SimpleGlyphFlag::REPEAT_FLAG) {
            let repeats = ctxt.read_u8()?;
            for _ in 0..repeats {
                if flags.len() < number_of_points {
                    flags.push(flag);
                }
            }
        }
    }

    let x_coordinates = read_coordinates(
        ctxt,
        &flags,
        SimpleGlyphFlag::X_SHORT_VECTOR,
        SimpleGlyphFlag::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
    )?;
    let y_coordinates = read_coordinates(
        ctxt,
        &flags,
        SimpleGlyphFlag::Y_SHORT_VECTOR,
        SimpleGlyphFlag::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
    )?;
    let coordinates = x_coordinates
        .into_iter()
        .zip(y_coordinates)
        .map(|(x, y)| Point(x, y))
        .collect();

    Ok(SimpleGlyph {
        end_pts_of_contours,
        instructions,
        flags,
        coordinates,
    })
}

/// Decode one delta-encoded coordinate axis into absolute funits.
fn read_coordinates(
    ctxt: &mut ReadCtxt<'_>,
    flags: &[SimpleGlyphFlag],
    short_vector: SimpleGlyphFlag,
    same_or_positive: SimpleGlyphFlag,
) -> Result<Vec<i16>, ParseError> {
    let mut coordinates = Vec::with_capacity(flags.len());
    let mut value = 0i32;
    for flag in flags {
        let delta = if flag.contains(short_vector) {
            let magnitude = i32::from(ctxt.read_u8()?);
            if flag.contains(same_or_positive) {
                magnitude
            } else {
                -magnitude
            }
        } else if flag.contains(same_or_positive) {
            0
        } else {
            i32::from(ctxt.read_i16()?)
        };
        value += delta;
        let value = i16::try_from(value).map_err(|_| ParseError::BadFormat)?;
        coordinates.push(value);
    }
    Ok(coordinates)
}

fn read_composite_glyph(
    ctxt: &mut ReadCtxt<'_>,
) -> Result<(Vec<CompositeGlyph>, Vec<u8>), ParseError> {
    let mut glyphs = Vec::new();
    let mut have_instructions = false;
    loop {
        let flags = CompositeGlyphFlag::from_bits_truncate(ctxt.read_u16()?);
        let glyph_index = ctxt.read_u16()?;
        let words = flags.contains(CompositeGlyphFlag::ARG_1_AND_2_ARE_WORDS);
        let signed = flags.contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES);
        let (argument1, argument2) = match (words, signed) {
            (true, true) => (
                CompositeGlyphArgument::I16(ctxt.read_i16()?),
                CompositeGlyphArgument::I16(ctxt.read_i16()?),
            ),
            (true, false) => (
                CompositeGlyphArgument::U16(ctxt.read_u16()?),
                CompositeGlyphArgument::U16(ctxt.read_u16()?),
            ),
            (false, true) => (
                CompositeGlyphArgument::I8(ctxt.read_i8()?),
                CompositeGlyphArgument::I8(ctxt.read_i8()?),
            ),
            (false, false) => (
                CompositeGlyphArgument::U8(ctxt.read_u8()?),
                CompositeGlyphArgument::U8(ctxt.read_u8()?),
            ),
        };

        let scale = if flags.contains(CompositeGlyphFlag::WE_HAVE_A_SCALE) {
            Some(CompositeGlyphScale::Scale(F2Dot14(ctxt.read_i16()?)))
        } else if flags.contains(CompositeGlyphFlag::WE_HAVE_AN_X_AND_Y_SCALE) {
            Some(CompositeGlyphScale::XY {
                x_scale: F2Dot14(ctxt.read_i16()?),
                y_scale: F2Dot14(ctxt.read_i16()?),
            })
        } else if flags.contains(CompositeGlyphFlag::WE_HAVE_A_TWO_BY_TWO) {
            let xx = F2Dot14(ctxt.read_i16()?);
            let scale01 = F2Dot14(ctxt.read_i16()?);
            let scale10 = F2Dot14(ctxt.read_i16()?);
            let yy = F2Dot14(ctxt.read_i16()?);
            Some(CompositeGlyphScale::Matrix([[xx, scale01], [scale10, yy]]))
        } else {
            None
        };

        have_instructions |= flags.contains(CompositeGlyphFlag::WE_HAVE_INSTRUCTIONS);
        glyphs.push(CompositeGlyph {
            flags,
            glyph_index,
            argument1,
            argument2,
            scale,
        });

        if !flags.contains(CompositeGlyphFlag::MORE_COMPONENTS) {
            break;
        }
    }

    let instructions = if have_instructions {
        let instruction_length = usize::from(ctxt.read_u16()?);
        ctxt.read_slice(instruction_length)?.to_vec()
    } else {
        Vec::new()
    };

    Ok((glyphs, instructions))
}

/// Resolve `glyph_index` through `loca` and parse its description.
///
/// A zero-length `loca` entry yields the empty glyph.
pub fn read_glyph(
    glyph_index: u16,
    glyf: &GlyfTable,
    loca: &LocaTable,
) -> Result<Glyph, ParseError> {
    let (start, end) = loca
        .glyph_range(glyph_index)
        .ok_or(ParseError::BadGlyph)?;
    if start == end {
        return Ok(Glyph::empty());
    }
    let start = usize::try_from(start)?;
    let end = usize::try_from(end)?;
    if end > glyf.data.len() {
        return Err(ParseError::Truncated);
    }
    ReadScope::new(&glyf.data[start..end]).read::<Glyph>()
}

pub fn read_glyf<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    directory: &TableDirectory,
) -> Result<Option<GlyfTable>, ParseError> {
    match directory.find(tag::GLYF) {
        Some(record) => {
            let data = read_table_data(reader, record)?;
            Ok(Some(GlyfTable { data }))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::write::WriteBuffer;
    use crate::tables::IndexToLocFormat;

    /// A triangle with vertices (0,0), (500,0), (250,500), all on-curve.
    pub(super) fn triangle_glyph() -> Vec<u8> {
        let mut buffer = WriteBuffer::new();
        buffer.write_i16(1); // number of contours
        buffer.write_i16(0); // x min
        buffer.write_i16(0); // y min
        buffer.write_i16(500); // x max
        buffer.write_i16(500); // y max
        buffer.write_u16(2); // end point of contour 0
        buffer.write_u16(0); // instruction length
        let on = SimpleGlyphFlag::ON_CURVE_POINT;
        let x_same = SimpleGlyphFlag::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR;
        let y_same = SimpleGlyphFlag::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR;
        buffer.write_u8((on | x_same | y_same).bits());
        buffer.write_u8((on | y_same).bits());
        buffer.write_u8(on.bits());
        buffer.write_i16(500); // x deltas
        buffer.write_i16(-250);
        buffer.write_i16(500); // y delta for the final point
        buffer.into_inner()
    }

    #[test]
    fn test_read_simple_glyph() {
        let data = triangle_glyph();
        let glyph = ReadScope::new(&data).read::<Glyph>().unwrap();

        assert_eq!(glyph.number_of_contours, 1);
        assert_eq!(glyph.bounding_box.x_max, 500);
        match glyph.data {
            GlyphData::Simple(simple) => {
                assert_eq!(
                    simple.coordinates,
                    vec![Point(0, 0), Point(500, 0), Point(250, 500)]
                );
                assert!(simple
                    .flags
                    .iter()
                    .all(|flag| flag.contains(SimpleGlyphFlag::ON_CURVE_POINT)));
                assert_eq!(simple.contour_range(0), Some(0..3));
                assert_eq!(simple.contour_range(1), None);
            }
            _ => panic!("expected simple glyph"),
        }
    }

    #[test]
    fn test_repeat_flag_expansion() {
        let mut buffer = WriteBuffer::new();
        buffer.write_i16(1);
        buffer.write_bytes(&[0; 8]); // bounding box
        buffer.write_u16(3); // four points
        buffer.write_u16(0); // no instructions
        let on = SimpleGlyphFlag::ON_CURVE_POINT
            | SimpleGlyphFlag::X_SHORT_VECTOR
            | SimpleGlyphFlag::Y_SHORT_VECTOR
            | SimpleGlyphFlag::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR
            | SimpleGlyphFlag::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR;
        buffer.write_u8((on | SimpleGlyphFlag::REPEAT_FLAG).bits());
        buffer.write_u8(3); // three repeats
        buffer.write_bytes(&[1, 2, 3, 4]); // x deltas
        buffer.write_bytes(&[5, 6, 7, 8]); // y deltas
        let data = buffer.into_inner();

        let glyph = ReadScope::new(&data).read::<Glyph>().unwrap();
        match glyph.data {
            GlyphData::Simple(simple) => {
                assert_eq!(simple.flags.len(), 4);
                assert_eq!(
                    simple.coordinates,
                    vec![Point(1, 5), Point(3, 11), Point(6, 18), Point(10, 26)]
                );
            }
            _ => panic!("expected simple glyph"),
        }
    }

    #[test]
    fn test_read_composite_glyph() {
        let mut buffer = WriteBuffer::new();
        buffer.write_i16(-1);
        buffer.write_bytes(&[0; 8]); // bounding box
        // First component: word xy offsets, more components follow.
        let flags = CompositeGlyphFlag::ARG_1_AND_2_ARE_WORDS
            | CompositeGlyphFlag::ARGS_ARE_XY_VALUES
            | CompositeGlyphFlag::MORE_COMPONENTS;
        buffer.write_u16(flags.bits());
        buffer.write_u16(4); // glyph index
        buffer.write_i16(100);
        buffer.write_i16(-50);
        // Second component: byte offsets and a uniform scale of one half.
        let flags = CompositeGlyphFlag::ARGS_ARE_XY_VALUES | CompositeGlyphFlag::WE_HAVE_A_SCALE;
        buffer.write_u16(flags.bits());
        buffer.write_u16(5);
        buffer.write_u8(0i8 as u8);
        buffer.write_u8((-3i8) as u8);
        buffer.write_i16(0x2000);
        let data = buffer.into_inner();

        let glyph = ReadScope::new(&data).read::<Glyph>().unwrap();
        match glyph.data {
            GlyphData::Composite {
                glyphs,
                instructions,
            } => {
                assert_eq!(glyphs.len(), 2);
                assert_eq!(glyphs[0].glyph_index, 4);
                assert_eq!(glyphs[0].argument1, CompositeGlyphArgument::I16(100));
                assert_eq!(glyphs[0].argument2, CompositeGlyphArgument::I16(-50));
                assert_eq!(glyphs[0].scale, None);
                assert_eq!(glyphs[1].argument2, CompositeGlyphArgument::I8(-3));
                assert_eq!(
                    glyphs[1].scale,
                    Some(CompositeGlyphScale::Scale(F2Dot14(0x2000)))
                );
                assert!(instructions.is_empty());
            }
            _ => panic!("expected composite glyph"),
        }
    }

    #[test]
    fn test_read_glyph_through_loca() {
        // Short loca with offsets (already divided by two) 0, 5, 5, 9.
        let mut buffer = WriteBuffer::new();
        for offset in &[0u16, 5, 5, 9] {
            buffer.write_u16(*offset);
        }
        let loca_data = buffer.into_inner();
        let loca = ReadScope::new(&loca_data)
            .read_dep::<LocaTable>((3, IndexToLocFormat::Short))
            .unwrap();

        let mut glyf_data = triangle_glyph();
        glyf_data.resize(18, 0); // matches the final loca offset
        let glyf = GlyfTable { data: glyf_data };

        // Glyph 1 has a zero length entry and is empty.
        let glyph = read_glyph(1, &glyf, &loca).unwrap();
        assert!(glyph.is_empty());
        assert_eq!(glyph.number_of_contours, 0);
        assert_eq!(glyph.bounding_box, BoundingBox::default());

        assert!(matches!(
            read_glyph(3, &glyf, &loca),
            Err(ParseError::BadGlyph)
        ));
    }

    #[test]
    fn test_glyph_truncated() {
        let mut data = triangle_glyph();
        data.truncate(12);
        assert!(matches!(
            ReadScope::new(&data).read::<Glyph>(),
            Err(ParseError::Truncated)
        ));
    }

    #[test]
    fn test_rejects_decreasing_contour_end_points() {
        let mut buffer = WriteBuffer::new();
        buffer.write_i16(2);
        buffer.write_bytes(&[0; 8]);
        buffer.write_u16(4);
        buffer.write_u16(2); // decreasing
        let data = buffer.into_inner();
        assert!(matches!(
            ReadScope::new(&data).read::<Glyph>(),
            Err(ParseError::BadFormat)
        ));
    }
}
