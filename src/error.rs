//! Error types.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors that can occur when reading or rasterizing a font.
///
/// A failed decode surfaces to the caller and is never recovered internally.
/// One malformed table fails only its own decoder; the rest of the font
/// remains usable.
#[derive(Debug)]
pub enum ParseError {
    /// The underlying byte source failed.
    Io(io::Error),
    /// A read ran off the end of the byte source.
    ShortRead,
    /// A declared table or record length exceeds the available bytes.
    Truncated,
    /// The `head` table magic number did not match.
    BadMagic,
    /// A table value is structurally invalid, or a subtable format is
    /// unsupported.
    BadFormat,
    /// A glyph index is out of range, or a glyph is missing.
    BadGlyph,
    /// A compound glyph is cyclic, too deeply nested, or refers to an
    /// unresolvable component.
    BadCompound,
    /// An allocation size overflowed.
    Oom,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Io(err) => write!(f, "io error: {}", err),
            ParseError::ShortRead => write!(f, "short read"),
            ParseError::Truncated => write!(f, "table truncated"),
            ParseError::BadMagic => write!(f, "bad magic number"),
            ParseError::BadFormat => write!(f, "bad or unsupported format"),
            ParseError::BadGlyph => write!(f, "bad glyph index"),
            ParseError::BadCompound => write!(f, "bad compound glyph"),
            ParseError::Oom => write!(f, "allocation size overflow"),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ParseError::ShortRead
        } else {
            ParseError::Io(err)
        }
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_err: std::num::TryFromIntError) -> Self {
        ParseError::BadFormat
    }
}
