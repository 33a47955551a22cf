//! # 编解码流水线模块
//!
//! [`Encoder`] 和 [`Decoder`] 是一次编码或解码会话的上下文，持有所有数据流、
//! 计算出的长度和文件名，并按固定顺序逐个执行各阶段。
//! 任一阶段失败都会立即中止后续阶段；已打开的流随会话一起被释放。

use crate::carrier::{
    carrier_capacity, check_capacity, copy_header, copy_remainder, ensure_header,
    read_dimensions, required_bits, skip_header, stream_len,
};
use crate::codec::{
    decode_field, decode_size, encode_field, encode_size, output_path, validate_extension,
};
use crate::constants::{
    BMP_HEADER_SIZE, BYTE_WINDOW, MAGIC_STRING, MAX_EXTENSION_LEN, PAYLOAD_CHUNK, SIZE_WINDOW,
};
use crate::error::{FormatError, Result, SizeField, StegoError};
use log::{debug, info};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// 编码成功后的统计信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeReport {
    pub capacity_bits: u64,
    pub required_bits: u64,
    pub payload_len: u32,
    pub extension: String,
}

/// 解码成功后的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    /// 实际写入的输出文件路径 (已补全扩展名)。
    pub output: PathBuf,
    pub extension: String,
    pub payload_len: u32,
}

/// 一次编码会话。
///
/// `carrier` 是原始 BMP，`secret` 是待隐藏的文件内容，
/// `extension` 是秘密文件的扩展名 (包含前导 `.`)。
pub struct Encoder<C, S> {
    carrier: C,
    secret: S,
    extension: String,
    payload_len: u32,
}

impl<C: Read + Seek, S: Read + Seek> Encoder<C, S> {
    /// 创建编码会话，扩展名不合法时返回参数错误。
    pub fn new(carrier: C, secret: S, extension: impl Into<String>) -> Result<Self> {
        let extension = extension.into();
        validate_extension(extension.as_bytes())
            .map_err(|e| StegoError::Argument(format!("secret file extension {extension:?}: {e}")))?;
        Ok(Self {
            carrier,
            secret,
            extension,
            payload_len: 0,
        })
    }

    /// 执行完整的编码流程。
    ///
    /// `open_dest` 只会在容量检查通过后被调用，容量不足时不会创建任何输出。
    pub fn encode<W, F>(mut self, open_dest: F) -> Result<EncodeReport>
    where
        W: Write + Seek,
        F: FnOnce() -> Result<W>,
    {
        info!("checking carrier capacity");
        let (capacity_bits, required_bits) = self.check_capacity()?;

        let mut dest = open_dest()?;

        info!("copying BMP header");
        copy_header(&mut self.carrier, &mut dest)?;

        info!("encoding magic string");
        encode_field(MAGIC_STRING, &mut self.carrier, &mut dest)?;

        info!("encoding extension size");
        encode_size(self.extension.len() as u32, &mut self.carrier, &mut dest)?;

        info!("encoding extension {:?}", self.extension);
        encode_field(self.extension.as_bytes(), &mut self.carrier, &mut dest)?;

        info!("encoding payload size");
        encode_size(self.payload_len, &mut self.carrier, &mut dest)?;

        info!("encoding payload data");
        self.encode_payload_data(&mut dest)?;

        info!("copying remaining carrier data");
        let trailing = copy_remainder(&mut self.carrier, &mut dest)?;
        debug!("copied {trailing} trailing carrier bytes");

        dest.flush()?;

        Ok(EncodeReport {
            capacity_bits,
            required_bits,
            payload_len: self.payload_len,
            extension: self.extension,
        })
    }

    /// 计算可用与所需的 bit 数，容量不足时返回 `Capacity` 错误。
    fn check_capacity(&mut self) -> Result<(u64, u64)> {
        let carrier_len = ensure_header(&mut self.carrier)?;
        let (width, height) = read_dimensions(&mut self.carrier)?;
        let pixel_bytes = carrier_len - BMP_HEADER_SIZE as u64;
        let available = carrier_capacity(width, height).min(pixel_bytes);

        let secret_len = stream_len(&mut self.secret)?;
        let required = required_bits(MAGIC_STRING.len(), self.extension.len(), secret_len);
        debug!("capacity: available {available} bits, required {required} bits");

        // 长度字段在线上是有符号 32 位整数。
        self.payload_len = u32::try_from(secret_len)
            .ok()
            .filter(|&len| i32::try_from(len).is_ok())
            .ok_or(StegoError::Capacity {
                required,
                available,
            })?;

        check_capacity(available, required)?;
        Ok((available, required))
    }

    fn encode_payload_data<W: Write>(&mut self, dest: &mut W) -> Result<()> {
        self.secret.rewind()?;
        let mut chunk = vec![0u8; PAYLOAD_CHUNK];
        let mut remaining = self.payload_len as usize;
        while remaining > 0 {
            let n = remaining.min(chunk.len());
            self.secret.read_exact(&mut chunk[..n])?;
            encode_field(&chunk[..n], &mut self.carrier, dest)?;
            remaining -= n;
        }

        let mut probe = [0u8; 1];
        if self.secret.read(&mut probe)? != 0 {
            return Err(StegoError::Io(io::Error::other(
                "secret file grew while it was being encoded",
            )));
        }
        Ok(())
    }
}

/// 一次解码会话。
///
/// `output_base` 是调用方给出的输出文件名，最终路径会按还原出的扩展名补全。
pub struct Decoder<C> {
    carrier: C,
    output_base: PathBuf,
    remaining: u64,
}

impl<C: Read + Seek> Decoder<C> {
    pub fn new(carrier: C, output_base: impl Into<PathBuf>) -> Self {
        Self {
            carrier,
            output_base: output_base.into(),
            remaining: 0,
        }
    }

    /// 执行完整的解码流程。
    ///
    /// 魔数校验先于一切输出；`open_output` 在扩展名还原之后才以最终路径被调用。
    pub fn decode<W, F>(mut self, open_output: F) -> Result<DecodeReport>
    where
        W: Write,
        F: FnOnce(&Path) -> Result<W>,
    {
        let carrier_len = ensure_header(&mut self.carrier)?;
        skip_header(&mut self.carrier)?;
        self.remaining = carrier_len - BMP_HEADER_SIZE as u64;

        info!("decoding magic string");
        self.decode_magic()?;

        info!("decoding extension size");
        let extension_len = self.decode_length(SizeField::Extension)?;

        info!("decoding extension");
        let extension = self.decode_extension(extension_len)?;
        let output = output_path(&self.output_base, &extension);
        debug!("output file: {}", output.display());

        let mut out = open_output(&output)?;

        info!("decoding payload size");
        let payload_len = self.decode_length(SizeField::Payload)?;

        info!("decoding payload data");
        self.decode_payload_data(payload_len, &mut out)?;
        out.flush()?;

        Ok(DecodeReport {
            output,
            extension,
            payload_len,
        })
    }

    /// 扣减剩余载体字节；不足时说明记录在载体结束前被截断。
    fn consume(&mut self, carrier_bytes: u64) -> Result<()> {
        if carrier_bytes > self.remaining {
            return Err(FormatError::TruncatedRecord {
                remaining: self.remaining,
            }
            .into());
        }
        self.remaining -= carrier_bytes;
        Ok(())
    }

    /// 扣减一个变长字段占用的载体字节。
    fn consume_field(&mut self, field: SizeField, len: u32) -> Result<()> {
        let required = u64::from(len) * BYTE_WINDOW as u64;
        if required > self.remaining {
            return Err(FormatError::LengthExceedsCarrier {
                field,
                required,
                remaining: self.remaining,
            }
            .into());
        }
        self.remaining -= required;
        Ok(())
    }

    fn decode_magic(&mut self) -> Result<()> {
        self.consume((MAGIC_STRING.len() * BYTE_WINDOW) as u64)?;
        let actual = decode_field(MAGIC_STRING.len(), &mut self.carrier)?;
        if actual != MAGIC_STRING {
            return Err(FormatError::MagicMismatch {
                expected: MAGIC_STRING.to_vec(),
                actual,
            }
            .into());
        }
        debug!("magic string matched");
        Ok(())
    }

    fn decode_length(&mut self, field: SizeField) -> Result<u32> {
        self.consume(SIZE_WINDOW as u64)?;
        let len = decode_size(field, &mut self.carrier)?;
        debug!("{field}: {len}");
        Ok(len)
    }

    fn decode_extension(&mut self, len: u32) -> Result<String> {
        let len = len as usize;
        if len > MAX_EXTENSION_LEN {
            return Err(FormatError::ExtensionTooLong {
                len,
                max: MAX_EXTENSION_LEN,
            }
            .into());
        }
        self.consume_field(SizeField::Extension, len as u32)?;
        let bytes = decode_field(len, &mut self.carrier)?;
        validate_extension(&bytes)?;
        String::from_utf8(bytes).map_err(|e| FormatError::InvalidExtension(e.into_bytes()).into())
    }

    fn decode_payload_data<W: Write>(&mut self, len: u32, out: &mut W) -> Result<()> {
        self.consume_field(SizeField::Payload, len)?;
        let mut remaining = len as usize;
        while remaining > 0 {
            let n = remaining.min(PAYLOAD_CHUNK);
            let bytes = decode_field(n, &mut self.carrier)?;
            out.write_all(&bytes)?;
            remaining -= n;
        }
        Ok(())
    }
}
