//! Umbrella interface to a font file.
//!
//! `Font` reads the table directory and the tables this crate understands,
//! then answers character lookups, metrics queries, and glyph rasterization
//! without further parsing decisions from the caller.

use std::io::{Read, Seek};

use log::warn;

use crate::binary::read::ByteReader;
use crate::error::ParseError;
use crate::fixed::Fixed;
use crate::metrics::{lookup_glyph_metrics, GlyphMetrics};
use crate::outline::{build_glyph_outline, GlyphOutline, ResolveGlyph};
use crate::raster::{raster_glyph_outline, Raster};
use crate::tables::cmap::{
    read_cmap, Cmap, CmapSubtable, PLATFORM_MACINTOSH, PLATFORM_MICROSOFT, PLATFORM_UNICODE,
};
use crate::tables::glyf::{read_glyf, read_glyph, GlyfTable, Glyph};
use crate::tables::loca::{read_loca, LocaTable};
use crate::tables::meta::{read_meta, MetaTable};
use crate::tables::name::{read_name, NameTable};
use crate::tables::{
    read_head, read_hhea, read_hmtx, read_maxp, read_table_directory, HeadTable, HheaTable,
    HmtxTable, MaxpTable, TableDirectory,
};

/// A font file with its decoded tables.
///
/// `head` and `maxp` are required. Every other table is optional and its
/// absence surfaces from the operations that need it.
pub struct Font<R> {
    reader: ByteReader<R>,
    pub directory: TableDirectory,
    pub head: HeadTable,
    pub maxp: MaxpTable,
    pub hhea: Option<HheaTable>,
    pub hmtx: Option<HmtxTable>,
    pub loca: Option<LocaTable>,
    pub glyf: Option<GlyfTable>,
    pub cmap: Option<Cmap>,
    pub name: Option<NameTable>,
    pub meta: Option<MetaTable>,
}

/// Resolves composite components straight from the `glyf` and `loca`
/// tables.
pub struct GlyphSource<'a> {
    pub glyf: &'a GlyfTable,
    pub loca: &'a LocaTable,
}

impl<'a> ResolveGlyph for GlyphSource<'a> {
    fn resolve_glyph(&mut self, glyph_index: u16) -> Result<Glyph, ParseError> {
        read_glyph(glyph_index, self.glyf, self.loca)
    }
}

/// Pick the encoding subtable best suited to Unicode lookups: full
/// repertoire subtables first, then the basic multilingual plane, then
/// legacy Macintosh encodings.
pub fn read_cmap_subtable(cmap: &Cmap) -> Option<&CmapSubtable> {
    fn priority(platform_id: u16, encoding_id: u16) -> Option<u8> {
        match (platform_id, encoding_id) {
            (PLATFORM_MICROSOFT, 10) => Some(5),
            (PLATFORM_UNICODE, 4) | (PLATFORM_UNICODE, 6) => Some(4),
            (PLATFORM_UNICODE, _) => Some(3),
            (PLATFORM_MICROSOFT, 1) => Some(2),
            (PLATFORM_MACINTOSH, 0) => Some(1),
            _ => None,
        }
    }

    let mut best: Option<(u8, &CmapSubtable)> = None;
    for record in &cmap.encoding_records {
        let subtable = match &record.subtable {
            Some(subtable) => subtable,
            None => continue,
        };
        let priority = match priority(record.platform_id, record.encoding_id) {
            Some(priority) => priority,
            None => continue,
        };
        match best {
            Some((best_priority, _)) if best_priority >= priority => {}
            _ => best = Some((priority, subtable)),
        }
    }
    best.map(|(_, subtable)| subtable)
}

impl<R: Read + Seek> Font<R> {
    /// Read the table directory and every supported table from `source`.
    ///
    /// Fails when the directory, `head`, or `maxp` cannot be read. A
    /// malformed optional table is degraded to absent.
    pub fn read(source: R) -> Result<Font<R>, ParseError> {
        let mut reader = ByteReader::new(source)?;
        let directory = read_table_directory(&mut reader)?;
        let head = read_head(&mut reader, &directory)?.ok_or(ParseError::BadFormat)?;
        let maxp = read_maxp(&mut reader, &directory)?.ok_or(ParseError::BadFormat)?;
        let hhea = read_hhea(&mut reader, &directory)?;
        let hmtx = match &hhea {
            Some(hhea) => read_hmtx(&mut reader, &directory, hhea, &maxp)?,
            None => None,
        };
        let loca = read_loca(&mut reader, &directory, &head, &maxp)?;
        let glyf = read_glyf(&mut reader, &directory)?;
        let cmap = optional("cmap", read_cmap(&mut reader, &directory))?;
        let name = optional("name", read_name(&mut reader, &directory))?;
        let meta = optional("meta", read_meta(&mut reader, &directory))?;

        Ok(Font {
            reader,
            directory,
            head,
            maxp,
            hhea,
            hmtx,
            loca,
            glyf,
            cmap,
            name,
            meta,
        })
    }

    pub fn num_glyphs(&self) -> u16 {
        self.maxp.num_glyphs
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    /// Map a character to a glyph index through the preferred cmap
    /// subtable. Unmapped characters and fonts without a usable cmap map
    /// to glyph 0.
    pub fn lookup_glyph(&self, ch: char) -> u16 {
        match self.cmap.as_ref().and_then(read_cmap_subtable) {
            Some(subtable) => subtable.lookup_glyph(u32::from(ch)),
            None => 0,
        }
    }

    /// Load the description of `glyph_index` from `glyf`.
    pub fn glyph(&self, glyph_index: u16) -> Result<Glyph, ParseError> {
        if glyph_index >= self.maxp.num_glyphs {
            return Err(ParseError::BadGlyph);
        }
        let (glyf, loca) = self.glyph_tables()?;
        read_glyph(glyph_index, glyf, loca)
    }

    /// Advance and left side bearing of `glyph_index`, scaled to
    /// `pixel_size` when one is given.
    pub fn glyph_metrics(
        &self,
        glyph_index: u16,
        pixel_size: Option<Fixed>,
    ) -> Result<GlyphMetrics, ParseError> {
        let hmtx = self.hmtx.as_ref().ok_or(ParseError::BadFormat)?;
        lookup_glyph_metrics(glyph_index, pixel_size, &self.head, &self.maxp, hmtx)
    }

    /// Build the scaled outline of `glyph_index`.
    pub fn build_outline(
        &self,
        glyph_index: u16,
        pixel_size: Fixed,
    ) -> Result<GlyphOutline, ParseError> {
        let glyph = self.glyph(glyph_index)?;
        let (glyf, loca) = self.glyph_tables()?;
        let mut resolver = GlyphSource { glyf, loca };
        build_glyph_outline(&glyph, &self.head, pixel_size, &mut resolver)
    }

    /// Outline and rasterize `glyph_index` in one step.
    pub fn rasterize(&self, glyph_index: u16, pixel_size: Fixed) -> Result<Raster, ParseError> {
        let outline = self.build_outline(glyph_index, pixel_size)?;
        raster_glyph_outline(&outline)
    }

    /// Give back the underlying byte source.
    pub fn into_inner(self) -> ByteReader<R> {
        self.reader
    }

    fn glyph_tables(&self) -> Result<(&GlyfTable, &LocaTable), ParseError> {
        match (&self.glyf, &self.loca) {
            (Some(glyf), Some(loca)) => Ok((glyf, loca)),
            _ => Err(ParseError::BadGlyph),
        }
    }
}

/// Degrade a failed optional table to absent, keeping I/O failures fatal.
fn optional<T>(
    table: &str,
    result: Result<Option<T>, ParseError>,
) -> Result<Option<T>, ParseError> {
    match result {
        Ok(table) => Ok(table),
        Err(err @ ParseError::Io(_)) => Err(err),
        Err(err) => {
            warn!("failed to read {} table: {}", table, err);
            Ok(None)
        }
    }
}
