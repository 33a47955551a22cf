//! # 字段编解码模块
//!
//! 把魔数、扩展名、长度和载荷等逻辑字段顺序地写入或读出载体流。
//! 两个方向都只向前读写，从不回退。

use crate::constants::{BYTE_WINDOW, MAX_EXTENSION_LEN, SIZE_WINDOW};
use crate::error::{FormatError, Result, SizeField};
use crate::steganography::{pack_byte, pack_u32, unpack_byte, unpack_u32};
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// 逐字节隐写 `bytes`：每个字节从 `carrier_in` 读 8 字节，打包后写入 `carrier_out`。
pub fn encode_field<R: Read, W: Write>(
    bytes: &[u8],
    carrier_in: &mut R,
    carrier_out: &mut W,
) -> io::Result<()> {
    let mut window = [0u8; BYTE_WINDOW];
    for &byte in bytes {
        carrier_in.read_exact(&mut window)?;
        pack_byte(byte, &mut window);
        carrier_out.write_all(&window)?;
    }
    Ok(())
}

/// 从 `carrier_in` 还原 `length` 个字节。
pub fn decode_field<R: Read>(length: usize, carrier_in: &mut R) -> io::Result<Vec<u8>> {
    let mut window = [0u8; BYTE_WINDOW];
    let mut bytes = Vec::with_capacity(length);
    for _ in 0..length {
        carrier_in.read_exact(&mut window)?;
        bytes.push(unpack_byte(&window));
    }
    Ok(bytes)
}

/// 隐写一个 32 位长度字段。
pub fn encode_size<R: Read, W: Write>(
    size: u32,
    carrier_in: &mut R,
    carrier_out: &mut W,
) -> io::Result<()> {
    let mut window = [0u8; SIZE_WINDOW];
    carrier_in.read_exact(&mut window)?;
    pack_u32(size, &mut window);
    carrier_out.write_all(&window)
}

/// 还原一个 32 位长度字段。
///
/// 线上格式把长度当作有符号整数，最高位为 1 的值即为负数，按格式错误处理。
pub fn decode_size<R: Read>(field: SizeField, carrier_in: &mut R) -> Result<u32> {
    let mut window = [0u8; SIZE_WINDOW];
    carrier_in.read_exact(&mut window)?;
    let raw = unpack_u32(&window);
    if i32::try_from(raw).is_err() {
        return Err(FormatError::NegativeLength {
            field,
            value: raw as i32,
        }
        .into());
    }
    Ok(raw)
}

/// 检查扩展名是否可以安全地拼接到文件名上：
/// 长度不超过上限，只含可打印 ASCII，且不含路径分隔符。
pub fn validate_extension(extension: &[u8]) -> Result<()> {
    if extension.len() > MAX_EXTENSION_LEN {
        return Err(FormatError::ExtensionTooLong {
            len: extension.len(),
            max: MAX_EXTENSION_LEN,
        }
        .into());
    }
    let valid = extension
        .iter()
        .all(|&b| b.is_ascii_graphic() && b != b'/' && b != b'\\');
    if !valid {
        return Err(FormatError::InvalidExtension(extension.to_vec()).into());
    }
    Ok(())
}

/// 根据还原出的扩展名确定最终输出路径。
///
/// 只有当 `base` 尚未以 `extension` 结尾时才追加，避免产生 `out.txt.txt`。
pub fn output_path(base: &Path, extension: &str) -> PathBuf {
    if base.as_os_str().to_string_lossy().ends_with(extension) {
        return base.to_path_buf();
    }
    let mut name = OsString::from(base.as_os_str());
    name.push(extension);
    PathBuf::from(name)
}
