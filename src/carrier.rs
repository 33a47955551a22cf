//! # 载体容量与头部模块
//!
//! 本工具对 BMP 格式的全部了解都在这里：固定 54 字节的头部，
//! 以及偏移 18、22 处的宽度和高度字段。其它头部字段一概不解析。

use crate::constants::{
    BMP_HEADER_SIZE, BMP_HEIGHT_OFFSET, BMP_WIDTH_OFFSET, BYTE_WINDOW, BYTES_PER_PIXEL, SIZE_WINDOW,
};
use crate::error::{FormatError, Result, StegoError};
use log::debug;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// 24 位 BMP 的可用容量 (bit)：每个颜色通道字节存 1 bit。
pub fn carrier_capacity(width: u32, height: u32) -> u64 {
    u64::from(width) * u64::from(height) * BYTES_PER_PIXEL
}

/// 返回流的总长度，并把读写位置恢复原处。
pub fn stream_len<S: Seek>(stream: &mut S) -> io::Result<u64> {
    let position = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if len != position {
        stream.seek(SeekFrom::Start(position))?;
    }
    Ok(len)
}

/// 确认载体至少包含完整的头部，返回载体总长度。
pub fn ensure_header<S: Seek>(carrier: &mut S) -> Result<u64> {
    let len = stream_len(carrier)?;
    if len < BMP_HEADER_SIZE as u64 {
        return Err(FormatError::TruncatedHeader {
            len,
            required: BMP_HEADER_SIZE,
        }
        .into());
    }
    Ok(len)
}

/// 读取头部偏移 18 和 22 处的宽度与高度 (小端)。
pub fn read_dimensions<R: Read + Seek>(carrier: &mut R) -> Result<(u32, u32)> {
    carrier.seek(SeekFrom::Start(BMP_WIDTH_OFFSET))?;
    let mut field = [0u8; 4];
    carrier.read_exact(&mut field)?;
    let width = u32::from_le_bytes(field);
    carrier.seek(SeekFrom::Start(BMP_HEIGHT_OFFSET))?;
    carrier.read_exact(&mut field)?;
    let height = u32::from_le_bytes(field);
    debug!("carrier dimensions: {width}x{height}");
    Ok((width, height))
}

/// 完整隐写记录所需的载体字节数 (即 bit 数)。
pub fn required_bits(magic_len: usize, extension_len: usize, payload_len: u64) -> u64 {
    let byte_bits = BYTE_WINDOW as u64;
    byte_bits * magic_len as u64
        + SIZE_WINDOW as u64
        + byte_bits * extension_len as u64
        + SIZE_WINDOW as u64
        + byte_bits * payload_len
}

/// 容量检查：可用 bit 数必须严格大于所需 bit 数，恰好相等同样拒绝。
pub fn check_capacity(available_bits: u64, required_bits: u64) -> Result<()> {
    if available_bits > required_bits {
        Ok(())
    } else {
        Err(StegoError::Capacity {
            required: required_bits,
            available: available_bits,
        })
    }
}

/// 从头复制 54 字节头部，并校验两条流的位置一致。
pub fn copy_header<R, W>(carrier_in: &mut R, carrier_out: &mut W) -> Result<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    carrier_in.rewind()?;
    let mut header = [0u8; BMP_HEADER_SIZE];
    carrier_in.read_exact(&mut header)?;
    carrier_out.write_all(&header)?;

    let in_position = carrier_in.stream_position()?;
    let out_position = carrier_out.stream_position()?;
    if in_position != out_position {
        return Err(StegoError::Io(io::Error::other(format!(
            "header copy left streams out of step: carrier at {in_position}, output at {out_position}"
        ))));
    }
    Ok(())
}

/// 跳过头部，定位到像素数据开始处。
pub fn skip_header<S: Seek>(carrier: &mut S) -> Result<()> {
    carrier.seek(SeekFrom::Start(BMP_HEADER_SIZE as u64))?;
    Ok(())
}

/// 原样复制载体剩余的全部字节，返回复制的字节数。
pub fn copy_remainder<R: Read, W: Write>(carrier_in: &mut R, carrier_out: &mut W) -> Result<u64> {
    Ok(io::copy(carrier_in, carrier_out)?)
}
