//! Writing binary data.

use byteorder::{BigEndian, ByteOrder};

/// A growable big-endian write buffer.
///
/// Used to re-encode the table directory and to assemble synthetic fonts in
/// tests and benches.
#[derive(Clone, Debug, Default)]
pub struct WriteBuffer {
    data: Vec<u8>,
}

impl WriteBuffer {
    pub fn new() -> Self {
        WriteBuffer { data: Vec::new() }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_written(&self) -> usize {
        self.data.len()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut buf = [0; 2];
        BigEndian::write_u16(&mut buf, value);
        self.data.extend_from_slice(&buf);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut buf = [0; 4];
        BigEndian::write_u32(&mut buf, value);
        self.data.extend_from_slice(&buf);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Pad with zero bytes until the length is a multiple of `align`.
    pub fn pad_to(&mut self, align: usize) {
        while self.data.len() % align != 0 {
            self.data.push(0);
        }
    }
}
