//! Reading binary data.
//!
//! Two layers are provided. `ByteReader` is a positioned, bounds-checked
//! big-endian cursor over a seekable byte source; it is used to read the
//! table directory and to fetch the bytes of individual tables. `ReadScope`
//! and `ReadCtxt` then decode fetched table bytes in place.

use std::convert::TryFrom;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder};

use crate::error::ParseError;

/// Read a structure from a `ReadCtxt`.
pub trait ReadBinary: Sized {
    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError>;
}

/// Read a structure that requires external arguments, such as counts from
/// another table.
pub trait ReadBinaryDep: Sized {
    type Args;

    fn read_dep(ctxt: &mut ReadCtxt<'_>, args: Self::Args) -> Result<Self, ParseError>;
}

/// A positioned big-endian reader over a seekable byte source.
///
/// Every read is checked against the source length before it is issued, so a
/// failed read does not partially advance the cursor.
pub struct ByteReader<R> {
    source: R,
    length: u64,
    position: u64,
}

/// A view over a `ByteReader` that refuses reads crossing a length bound.
pub struct TableReader<'a, R> {
    reader: &'a mut ByteReader<R>,
    start: u64,
    limit: u64,
}

impl<R: Read + Seek> ByteReader<R> {
    pub fn new(mut source: R) -> Result<Self, ParseError> {
        let length = source.seek(SeekFrom::End(0)).map_err(ParseError::Io)?;
        source.seek(SeekFrom::Start(0)).map_err(ParseError::Io)?;
        Ok(ByteReader {
            source,
            length,
            position: 0,
        })
    }

    /// Total length of the byte source.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Seek to an absolute offset.
    pub fn seek(&mut self, position: u64) -> Result<(), ParseError> {
        if position > self.length {
            return Err(ParseError::ShortRead);
        }
        self.source
            .seek(SeekFrom::Start(position))
            .map_err(ParseError::Io)?;
        self.position = position;
        Ok(())
    }

    fn check_available(&self, count: u64) -> Result<(), ParseError> {
        match self.position.checked_add(count) {
            Some(end) if end <= self.length => Ok(()),
            _ => Err(ParseError::ShortRead),
        }
    }

    /// Read exactly `buf.len()` bytes.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        self.check_available(buf.len() as u64)?;
        self.source.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        let mut buf = [0; 2];
        self.read_exact(&mut buf)?;
        Ok(BigEndian::read_u16(&buf))
    }

    pub fn read_i16(&mut self) -> Result<i16, ParseError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        let mut buf = [0; 4];
        self.read_exact(&mut buf)?;
        Ok(BigEndian::read_u32(&buf))
    }

    pub fn read_i32(&mut self) -> Result<i32, ParseError> {
        Ok(self.read_u32()? as i32)
    }

    /// Seek to `offset` and return a view that refuses any read crossing
    /// `offset + length`.
    pub fn at(&mut self, offset: u64, length: u64) -> Result<TableReader<'_, R>, ParseError> {
        let limit = offset.checked_add(length).ok_or(ParseError::Truncated)?;
        if limit > self.length {
            return Err(ParseError::Truncated);
        }
        self.seek(offset)?;
        Ok(TableReader {
            reader: self,
            start: offset,
            limit,
        })
    }
}

impl<'a, R: Read + Seek> TableReader<'a, R> {
    pub fn len(&self) -> u64 {
        self.limit - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.limit == self.start
    }

    fn check_available(&self, count: u64) -> Result<(), ParseError> {
        match self.reader.position().checked_add(count) {
            Some(end) if end <= self.limit => Ok(()),
            _ => Err(ParseError::Truncated),
        }
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        self.check_available(buf.len() as u64)?;
        self.reader.read_exact(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        self.check_available(1)?;
        self.reader.read_u8()
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.check_available(2)?;
        self.reader.read_u16()
    }

    pub fn read_i16(&mut self) -> Result<i16, ParseError> {
        self.check_available(2)?;
        self.reader.read_i16()
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.check_available(4)?;
        self.reader.read_u32()
    }

    pub fn read_i32(&mut self) -> Result<i32, ParseError> {
        self.check_available(4)?;
        self.reader.read_i32()
    }

    /// Read the entire bounded range into an owned buffer.
    pub fn read_to_vec(mut self) -> Result<Vec<u8>, ParseError> {
        self.reader.seek(self.start)?;
        let len = usize::try_from(self.limit - self.start).map_err(|_| ParseError::Oom)?;
        let mut data = vec![0; len];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }
}

/// A range of bytes under decode, carrying its offset from the start of the
/// enclosing table for offset-relative jumps.
#[derive(Clone, Copy)]
pub struct ReadScope<'a> {
    base: usize,
    data: &'a [u8],
}

/// A cursor over a `ReadScope`.
pub struct ReadCtxt<'a> {
    scope: ReadScope<'a>,
    offset: usize,
}

impl<'a> ReadScope<'a> {
    pub fn new(data: &'a [u8]) -> ReadScope<'a> {
        ReadScope { base: 0, data }
    }

    /// A scope beginning `offset` bytes into this one.
    pub fn offset(&self, offset: usize) -> ReadScope<'a> {
        let data = if offset <= self.data.len() {
            &self.data[offset..]
        } else {
            &[]
        };
        ReadScope {
            base: self.base + offset,
            data,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn ctxt(&self) -> ReadCtxt<'a> {
        ReadCtxt {
            scope: *self,
            offset: 0,
        }
    }

    pub fn read<T: ReadBinary>(&self) -> Result<T, ParseError> {
        T::read(&mut self.ctxt())
    }

    pub fn read_dep<T: ReadBinaryDep>(&self, args: T::Args) -> Result<T, ParseError> {
        T::read_dep(&mut self.ctxt(), args)
    }
}

impl<'a> ReadCtxt<'a> {
    /// The scope this context started from.
    pub fn scope(&self) -> ReadScope<'a> {
        self.scope
    }

    /// Offset of the cursor from the start of the scope.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn bytes_available(&self) -> usize {
        self.scope.data.len() - self.offset
    }

    fn check_available(&self, count: usize) -> Result<(), ParseError> {
        match self.offset.checked_add(count) {
            Some(end) if end <= self.scope.data.len() => Ok(()),
            _ => Err(ParseError::Truncated),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        self.check_available(1)?;
        let value = self.scope.data[self.offset];
        self.offset += 1;
        Ok(value)
    }

    pub fn read_i8(&mut self) -> Result<i8, ParseError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.check_available(2)?;
        let value = BigEndian::read_u16(&self.scope.data[self.offset..]);
        self.offset += 2;
        Ok(value)
    }

    pub fn read_i16(&mut self) -> Result<i16, ParseError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.check_available(4)?;
        let value = BigEndian::read_u32(&self.scope.data[self.offset..]);
        self.offset += 4;
        Ok(value)
    }

    pub fn read_i32(&mut self) -> Result<i32, ParseError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_slice(&mut self, count: usize) -> Result<&'a [u8], ParseError> {
        self.check_available(count)?;
        let slice = &self.scope.data[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    pub fn skip(&mut self, count: usize) -> Result<(), ParseError> {
        self.check_available(count)?;
        self.offset += count;
        Ok(())
    }

    /// Read `count` big-endian u16 values.
    pub fn read_u16_array(&mut self, count: usize) -> Result<Vec<u16>, ParseError> {
        self.check_available(count.checked_mul(2).ok_or(ParseError::Oom)?)?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_u16()?);
        }
        Ok(values)
    }

    /// Read `count` big-endian i16 values.
    pub fn read_i16_array(&mut self, count: usize) -> Result<Vec<i16>, ParseError> {
        self.check_available(count.checked_mul(2).ok_or(ParseError::Oom)?)?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_i16()?);
        }
        Ok(values)
    }

    /// Read `count` big-endian u32 values.
    pub fn read_u32_array(&mut self, count: usize) -> Result<Vec<u32>, ParseError> {
        self.check_available(count.checked_mul(4).ok_or(ParseError::Oom)?)?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_u32()?);
        }
        Ok(values)
    }
}
