//! # bmp_stego 库
//!
//! 本库包含 BMP LSB 隐写工具的核心逻辑：位打包、字段编解码、
//! 载体容量检查以及编码/解码流水线。

// 声明库包含的所有模块。

pub mod carrier;
pub mod cli;
pub mod codec;
pub mod constants;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod steganography;

pub use error::{FormatError, Result, SizeField, StegoError};
pub use pipeline::{DecodeReport, Decoder, EncodeReport, Encoder};
