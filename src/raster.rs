//! Polygon rasterization.
//!
//! Scan-converts a closed outline into an 8-bit coverage raster with a
//! vertically supersampled active edge table and the non-zero winding rule.
//! Each pixel row is sampled on `POLY_SAMPLE` sub-rows; horizontal coverage
//! within a sub-row is weighted by the covered fraction of each pixel, and
//! the per-pixel sum saturates at 255.

use std::convert::TryFrom;

use itertools::Itertools;

use crate::error::ParseError;
use crate::outline::{GlyphOutline, OutlineCommand};

pub const POLY_SHIFT: u32 = 2;
pub const POLY_SAMPLE: i32 = 1 << POLY_SHIFT;
pub const POLY_STEP: i32 = 0x10000 >> POLY_SHIFT;
pub const POLY_START: i32 = POLY_STEP >> 1;

/// Row-major 8-bit coverage, top row first.
///
/// `offx` and `offy` record the outline's bottom-left corner in the
/// caller's coordinate space. The stride is rounded up to a multiple of
/// four bytes.
#[derive(Clone, Debug)]
pub struct Raster {
    pub cells: Vec<u8>,
    pub width: u16,
    pub height: u16,
    pub offx: i16,
    pub offy: i16,
    pub stride: u16,
}

/// An edge of the outline crossing the sweep line.
#[derive(Clone, Copy, Debug)]
struct Edge {
    /// Current X, advanced by `step_x` per sub-row.
    x: i64,
    /// X distance covered per `POLY_STEP` of Y.
    step_x: i64,
    /// First sample row the edge covers.
    top: i32,
    /// Y below which the edge no longer applies. Not grid-aligned.
    bottom: i32,
    /// +1 if Y increases along the edge, -1 otherwise.
    winding: i32,
}

impl Raster {
    /// Coverage at `(x, y)` with `y = 0` the top row.
    pub fn coverage(&self, x: u16, y: u16) -> u8 {
        self.cells[usize::from(y) * usize::from(self.stride) + usize::from(x)]
    }

    /// Sum of all coverage bytes divided by 255: the covered area in
    /// pixels.
    pub fn area(&self) -> f64 {
        let total: u64 = self.cells.iter().map(|&cell| u64::from(cell)).sum();
        total as f64 / 255.0
    }
}

/// Compute the dimensions and offsets of the raster an outline needs, with
/// all cells zero.
pub fn prepare_raster(outline: &GlyphOutline) -> Result<Raster, ParseError> {
    let offx = outline.x_min.floor_to_i32();
    let offy = outline.y_min.floor_to_i32();
    let width = (outline.x_max.ceil_to_i32() - offx).max(0);
    let height = (outline.y_max.ceil_to_i32() - offy).max(0);

    let width = u16::try_from(width).map_err(|_| ParseError::Oom)?;
    let height = u16::try_from(height).map_err(|_| ParseError::Oom)?;
    let stride = width.checked_add(3).ok_or(ParseError::Oom)? & !3;
    let size = usize::from(stride)
        .checked_mul(usize::from(height))
        .ok_or(ParseError::Oom)?;

    Ok(Raster {
        cells: vec![0; size],
        width,
        height,
        offx: i16::try_from(offx).map_err(|_| ParseError::Oom)?,
        offy: i16::try_from(offy).map_err(|_| ParseError::Oom)?,
        stride,
    })
}

/// Rasterize `outline` into a coverage raster.
///
/// Degenerate outlines produce a zero-sized raster.
pub fn raster_glyph_outline(outline: &GlyphOutline) -> Result<Raster, ParseError> {
    let mut raster = prepare_raster(outline)?;
    if raster.width == 0 || raster.height == 0 {
        return Ok(raster);
    }

    let mut edges = build_edges(outline);
    if edges.is_empty() {
        return Ok(raster);
    }
    edges.sort_by_key(|edge| edge.top);
    poly_edges(&mut raster, &edges);
    Ok(raster)
}

/// The smallest sample row at or above `y`. Sample rows sit at
/// `POLY_START` past each multiple of `POLY_STEP`.
fn poly_grid_ceil(y: i32) -> i32 {
    (y + POLY_STEP - 1 - POLY_START).div_euclid(POLY_STEP) * POLY_STEP + POLY_START
}

/// Convert the outline's segments into edge records, translated so the
/// raster origin is at zero. Horizontal segments contribute nothing.
fn build_edges(outline: &GlyphOutline) -> Vec<Edge> {
    let offx = outline.x_min.floor();
    let offy = outline.y_min.floor();

    let mut edges = Vec::new();
    for (from, to) in outline.commands.iter().tuple_windows() {
        let end = match to {
            OutlineCommand::LineTo(point) => *point,
            OutlineCommand::MoveTo(_) => continue,
        };
        let start = from.point();
        let x0 = i64::from((start.x - offx).raw());
        let y0 = (start.y - offy).raw();
        let x1 = i64::from((end.x - offx).raw());
        let y1 = (end.y - offy).raw();
        if y0 == y1 {
            continue;
        }

        let winding = if y1 > y0 { 1 } else { -1 };
        let (x_at_top, y_top, x_at_bottom, y_bottom) = if y0 < y1 {
            (x0, y0, x1, y1)
        } else {
            (x1, y1, x0, y0)
        };

        let top = poly_grid_ceil(y_top);
        // Too short to cross a sample row.
        if top >= y_bottom {
            continue;
        }
        let dy = i64::from(y_bottom - y_top);
        let dx = x_at_bottom - x_at_top;
        let x = x_at_top + i64::from(top - y_top) * dx / dy;
        let step_x = dx * i64::from(POLY_STEP) / dy;

        edges.push(Edge {
            x,
            step_x,
            top,
            bottom: y_bottom,
            winding,
        });
    }
    edges
}

/// Sweep the sample rows, maintaining the active edge table and filling
/// the spans the non-zero winding rule selects.
fn poly_edges(raster: &mut Raster, edges: &[Edge]) {
    let height = i32::from(raster.height) << 16;
    let mut active: Vec<Edge> = Vec::new();
    let mut next = 0;
    let mut y = edges[0].top;

    while y < height && (next < edges.len() || !active.is_empty()) {
        while next < edges.len() && edges[next].top <= y {
            active.push(edges[next]);
            next += 1;
        }
        active.retain(|edge| edge.bottom > y);
        active.sort_by_key(|edge| edge.x);

        let mut winding = 0;
        let mut span_start = 0;
        for edge in &active {
            if winding == 0 {
                span_start = edge.x;
            }
            winding += edge.winding;
            if winding == 0 {
                fill_span(raster, y, span_start, edge.x);
            }
        }

        for edge in active.iter_mut() {
            edge.x += edge.step_x;
        }
        y += POLY_STEP;
        if active.is_empty() && next < edges.len() && edges[next].top > y {
            y = edges[next].top;
        }
    }
}

/// Deposit one sub-row span into the raster, weighting partially covered
/// pixels by the covered fraction.
fn fill_span(raster: &mut Raster, y: i32, x0: i64, x1: i64) {
    let row = (y >> 16) as usize;
    if row >= usize::from(raster.height) {
        return;
    }
    // Outline Y points up; rows are stored top-down.
    let dest_row = usize::from(raster.height) - 1 - row;

    let width = i64::from(raster.width) << 16;
    let x0 = x0.max(0);
    let x1 = x1.min(width);
    if x0 >= x1 {
        return;
    }

    let first = (x0 >> 16) as usize;
    let last = ((x1 + 0xFFFF) >> 16) as usize;
    let row_cells = &mut raster.cells
        [dest_row * usize::from(raster.stride)..(dest_row + 1) * usize::from(raster.stride)];
    for (column, cell) in row_cells
        .iter_mut()
        .enumerate()
        .take(last.min(usize::from(raster.width)))
        .skip(first)
    {
        let left = x0.max((column as i64) << 16);
        let right = x1.min(((column + 1) as i64) << 16);
        let covered = (right - left).max(0);
        let contribution = (covered * i64::from(256 >> POLY_SHIFT)) >> 16;
        *cell = cell.saturating_add(contribution as u8);
    }
}
