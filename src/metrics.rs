//! Glyph metrics lookup.

use crate::error::ParseError;
use crate::fixed::Fixed;
use crate::tables::{HeadTable, HmtxTable, MaxpTable};

/// Horizontal metrics of a single glyph.
///
/// Values are 16.16 fixed point pixels when a pixel size was supplied to the
/// lookup, otherwise whole font design units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Distance between the origin and the left edge of the glyph.
    /// Positive values move rightwards.
    pub lbearing: Fixed,
    /// Advance to the next glyph's origin.
    pub advance: Fixed,
}

/// Look up the advance and left side bearing of `glyph`.
///
/// Glyphs past the long metrics take the advance of the last long metric and
/// their bearing from the trailing bearing array. With `pixel_size` of
/// `None` the result is in funits; otherwise it is scaled by
/// `pixel_size / units_per_em` into 16.16 fixed point pixels.
pub fn lookup_glyph_metrics(
    glyph: u16,
    pixel_size: Option<Fixed>,
    head: &HeadTable,
    maxp: &MaxpTable,
    hmtx: &HmtxTable,
) -> Result<GlyphMetrics, ParseError> {
    if glyph >= maxp.num_glyphs {
        return Err(ParseError::BadGlyph);
    }
    let index = usize::from(glyph);
    let (advance, lsb) = match hmtx.h_metrics.get(index) {
        Some(metric) => (metric.advance_width, metric.lsb),
        None => {
            let last = hmtx.h_metrics.last().ok_or(ParseError::BadFormat)?;
            let lsb = hmtx
                .left_side_bearings
                .get(index - hmtx.h_metrics.len())
                .copied()
                .ok_or(ParseError::BadFormat)?;
            (last.advance_width, lsb)
        }
    };

    match pixel_size {
        Some(pixel_size) => Ok(GlyphMetrics {
            lbearing: scale_funits(i32::from(lsb), pixel_size, head.units_per_em),
            advance: scale_funits(i32::from(advance), pixel_size, head.units_per_em),
        }),
        None => Ok(GlyphMetrics {
            lbearing: Fixed::from_i32(i32::from(lsb)),
            advance: Fixed::from_i32(i32::from(advance)),
        }),
    }
}

/// `value * pixel_size / units_per_em`, computed in one widened step so the
/// result is exact to the last fixed point bit.
fn scale_funits(value: i32, pixel_size: Fixed, units_per_em: u16) -> Fixed {
    let scaled = i64::from(value) * i64::from(pixel_size.raw()) / i64::from(units_per_em);
    Fixed::from_raw(scaled as i32)
}
