//! 小端二进制读取器
//!
//! 所有越界读取统一报告为 `WpError::Format`。

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::{Result, WpError};

pub struct BinaryReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    fn truncated(&self, what: &str) -> WpError {
        WpError::Format(format!(
            "读取 {} 时越界 (偏移 {}, 总长 {})",
            what,
            self.position(),
            self.len()
        ))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| self.truncated("u8"))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.cursor
            .read_i16::<LittleEndian>()
            .map_err(|_| self.truncated("i16"))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated("u16"))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| self.truncated("i32"))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated("u32"))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.cursor
            .read_f32::<LittleEndian>()
            .map_err(|_| self.truncated("f32"))
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0.0f32; N];
        self.cursor
            .read_f32_into::<LittleEndian>(&mut out)
            .map_err(|_| self.truncated("f32 数组"))?;
        Ok(out)
    }

    pub fn read_u32_array<const N: usize>(&mut self) -> Result<[u32; N]> {
        let mut out = [0u32; N];
        self.cursor
            .read_u32_into::<LittleEndian>(&mut out)
            .map_err(|_| self.truncated("u32 数组"))?;
        Ok(out)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(self.truncated("字节块"));
        }
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + count) as u64);
        Ok(&data[start..start + count])
    }

    /// i32 长度前缀字符串；长度 <= 0 时为空串
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len <= 0 {
            return Ok(String::new());
        }
        let bytes = self.read_bytes(len as usize)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }
}
