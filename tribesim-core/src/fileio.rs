//! Binary field reader/writer used by the save format.
//!
//! Numbers are little-endian; strings are NUL-terminated bytes.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("String is not valid UTF-8")]
    InvalidString,
}

/// Source of typed fields.
pub trait FieldRead {
    fn unsigned16(&mut self) -> Result<u16, FileError>;
    fn unsigned32(&mut self) -> Result<u32, FileError>;
    fn c_string(&mut self) -> Result<String, FileError>;
}

/// Sink of typed fields.
pub trait FieldWrite {
    fn unsigned16(&mut self, value: u16) -> Result<(), FileError>;
    fn unsigned32(&mut self, value: u32) -> Result<(), FileError>;
    fn c_string(&mut self, value: &str) -> Result<(), FileError>;
}

#[derive(Debug)]
pub struct FileRead<R> {
    inner: R,
}

impl<R: Read> FileRead<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> FieldRead for FileRead<R> {
    fn unsigned16(&mut self) -> Result<u16, FileError> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    fn unsigned32(&mut self) -> Result<u32, FileError> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    fn c_string(&mut self) -> Result<String, FileError> {
        let mut bytes = Vec::new();
        loop {
            match self.inner.read_u8()? {
                0 => break,
                b => bytes.push(b),
            }
        }
        String::from_utf8(bytes).map_err(|_| FileError::InvalidString)
    }
}

#[derive(Debug)]
pub struct FileWrite<W> {
    inner: W,
}

impl<W: Write> FileWrite<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FieldWrite for FileWrite<W> {
    fn unsigned16(&mut self, value: u16) -> Result<(), FileError> {
        Ok(self.inner.write_u16::<LittleEndian>(value)?)
    }

    fn unsigned32(&mut self, value: u32) -> Result<(), FileError> {
        Ok(self.inner.write_u32::<LittleEndian>(value)?)
    }

    fn c_string(&mut self, value: &str) -> Result<(), FileError> {
        self.inner.write_all(value.as_bytes())?;
        Ok(self.inner.write_u8(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_little_endian() {
        let mut w = FileWrite::new(Vec::new());
        w.unsigned16(0x0102).unwrap();
        w.unsigned32(0x0304_0506).unwrap();
        w.c_string("ax").unwrap();
        assert_eq!(
            w.into_inner(),
            vec![0x02, 0x01, 0x06, 0x05, 0x04, 0x03, b'a', b'x', 0]
        );
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let mut r = FileRead::new(&[0x01u8][..]);
        assert!(matches!(r.unsigned16(), Err(FileError::Io(_))));
        let mut r = FileRead::new(&b"abc"[..]);
        assert!(r.c_string().is_err());
    }
}
