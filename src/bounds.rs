//! Bounds checks and a checked little-endian record reader
//!
//! Every offset or handle read from the file goes through here before it is
//! dereferenced. Failures are `ConvertError::Bounds`.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{ConvertError, Result};
use crate::geometry::{PointL, RectL, XForm};

/// Fails when `len` bytes starting at `offset` do not fit inside `end`.
pub fn check_in_bounds(end: usize, offset: usize, len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(stop) if stop <= end => Ok(()),
        _ => Err(ConvertError::bounds(format!(
            "{} bytes at offset {} exceed buffer of {}",
            len, offset, end
        ))),
    }
}

/// Fails when `index` is past the object table. Index 0 is reserved but
/// addressable, matching the table layout.
pub fn check_object_index(table_size: usize, index: u32) -> Result<()> {
    if index as usize > table_size {
        return Err(ConvertError::bounds(format!(
            "object index {} outside table of {}",
            index, table_size
        )));
    }
    Ok(())
}

/// Borrow `len` bytes at `offset`, checked.
pub fn slice_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    check_in_bounds(data.len(), offset, len)?;
    Ok(&data[offset..offset + len])
}

/// Cursor over one record (or any byte slice) whose reads never go past the end.
pub struct RecordReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(data) }
    }

    /// Reader positioned at `offset` (the record header is usually skipped this way).
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        let mut reader = Self::new(data);
        reader.seek(offset)?;
        Ok(reader)
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    pub fn seek(&mut self, offset: usize) -> Result<()> {
        check_in_bounds(self.len(), offset, 0)?;
        self.cursor.set_position(offset as u64);
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        check_in_bounds(self.len(), self.position(), count)?;
        self.cursor.set_position((self.position() + count) as u64);
        Ok(())
    }

    /// Ensure `count` more bytes can be read.
    pub fn require(&self, count: usize) -> Result<()> {
        check_in_bounds(self.len(), self.position(), count)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(eof)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.cursor.read_u16::<LittleEndian>().map_err(eof)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.cursor.read_i16::<LittleEndian>().map_err(eof)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.cursor.read_u32::<LittleEndian>().map_err(eof)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.cursor.read_i32::<LittleEndian>().map_err(eof)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.cursor.read_f32::<LittleEndian>().map_err(eof)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let start = self.position();
        let bytes = slice_at(self.cursor.get_ref(), start, count)?;
        self.cursor.set_position((start + count) as u64);
        Ok(bytes)
    }

    pub fn read_point_l(&mut self) -> Result<PointL> {
        Ok(PointL { x: self.read_i32()?, y: self.read_i32()? })
    }

    pub fn read_point_s(&mut self) -> Result<PointL> {
        Ok(PointL {
            x: self.read_i16()? as i32,
            y: self.read_i16()? as i32,
        })
    }

    pub fn read_rect_l(&mut self) -> Result<RectL> {
        Ok(RectL {
            left: self.read_i32()?,
            top: self.read_i32()?,
            right: self.read_i32()?,
            bottom: self.read_i32()?,
        })
    }

    /// Six f32 values in m11, m12, m21, m22, dx, dy order.
    pub fn read_xform(&mut self) -> Result<XForm> {
        Ok(XForm::new(
            self.read_f32()? as f64,
            self.read_f32()? as f64,
            self.read_f32()? as f64,
            self.read_f32()? as f64,
            self.read_f32()? as f64,
            self.read_f32()? as f64,
        ))
    }

    /// `count` points, 32-bit or 16-bit, after checking the whole array fits.
    pub fn read_points(&mut self, count: usize, short: bool) -> Result<Vec<PointL>> {
        let width = if short { 4 } else { 8 };
        let total = count
            .checked_mul(width)
            .ok_or_else(|| ConvertError::bounds("point count overflow"))?;
        self.require(total)?;
        (0..count)
            .map(|_| if short { self.read_point_s() } else { self.read_point_l() })
            .collect()
    }

    /// UTF-16LE string of `count` code units, cut at the first NUL.
    pub fn read_utf16(&mut self, count: usize) -> Result<String> {
        let total = count
            .checked_mul(2)
            .ok_or_else(|| ConvertError::bounds("string length overflow"))?;
        self.require(total)?;
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            units.push(self.read_u16()?);
        }
        let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        Ok(String::from_utf16_lossy(&units[..end]))
    }
}

fn eof(err: std::io::Error) -> ConvertError {
    ConvertError::bounds(format!("read past end of record: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_in_bounds() {
        assert!(check_in_bounds(10, 0, 10).is_ok());
        assert!(check_in_bounds(10, 5, 6).is_err());
        assert!(check_in_bounds(10, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_check_object_index() {
        assert!(check_object_index(4, 4).is_ok());
        assert!(check_object_index(4, 5).is_err());
    }

    #[test]
    fn test_reader_reads_little_endian() {
        let data = [0x01, 0x00, 0x00, 0x00, 0xFE, 0xFF];
        let mut reader = RecordReader::new(&data);
        assert_eq!(reader.read_u32().unwrap(), 1);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.remaining(), 0);
        assert!(matches!(reader.read_u8(), Err(ConvertError::Bounds(_))));
    }

    #[test]
    fn test_read_points_checks_whole_array() {
        let data = [0u8; 12];
        let mut reader = RecordReader::new(&data);
        assert!(reader.read_points(2, false).is_err());
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_points(3, true).unwrap().len(), 3);
    }

    #[test]
    fn test_read_utf16_stops_at_nul() {
        let data = [b'H', 0, b'i', 0, 0, 0, b'x', 0];
        let mut reader = RecordReader::new(&data);
        assert_eq!(reader.read_utf16(4).unwrap(), "Hi");
        assert_eq!(reader.position(), 8);
    }
}
