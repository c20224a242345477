//! # Rastrum
//!
//! Rastrum reads SFNT packaged TrueType fonts and rasterizes their glyphs.
//! Given a seekable byte source it decodes the table directory and the
//! `head`, `hhea`, `hmtx`, `maxp`, `loca`, `glyf`, `cmap`, `name`, and
//! `meta` tables, converts glyphs into resolution independent outlines,
//! scales them to a pixel size, and scan-converts the result into 8-bit
//! coverage rasters. Horizontal metrics, Unicode to glyph mapping, name
//! records, and metadata strings are exposed alongside.
//!
//! Shaping, hinting execution, kerning, variable fonts, and color glyphs
//! are out of scope.
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::File;
//!
//! use rastrum::fixed::Fixed;
//! use rastrum::Font;
//!
//! # fn run() -> Result<(), rastrum::ParseError> {
//! let file = File::open("fonts/example.ttf")?;
//! let font = Font::read(file)?;
//! let glyph = font.lookup_glyph('a');
//! let raster = font.rasterize(glyph, Fixed::from_i32(16))?;
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod error;
pub mod fixed;
pub mod font;
pub mod metrics;
pub mod outline;
pub mod raster;
pub mod tables;
pub mod tag;

pub use crate::error::ParseError;
pub use crate::font::Font;
