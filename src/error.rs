//! # 错误类型模块
//!
//! 隐写流水线的所有失败都归入 [`StegoError`] 的四个分支。
//! `Capacity` 和 `Format` 表示对合法输入的正常拒绝，而不是程序故障，
//! 调用方可以通过匹配分支把它们与 `Io` 区分开。

use std::fmt;
use std::io;
use thiserror::Error;

/// 隐写流水线的顶层错误类型。
#[derive(Debug, Error)]
pub enum StegoError {
    /// 在接触任何数据流之前发现的参数问题 (文件名、扩展名等)。
    #[error("invalid argument: {0}")]
    Argument(String),

    /// 载体、秘密文件或输出文件的读写失败。
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 载体图像容纳不下完整的隐写记录。
    #[error("not enough space in the carrier: required {required} bits, available {available} bits")]
    Capacity { required: u64, available: u64 },

    /// 载体中的数据不符合隐写格式。
    #[error("invalid stego format: {0}")]
    Format(#[from] FormatError),
}

/// 格式层面的错误。
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("carrier is {len} bytes, shorter than the {required}-byte BMP header")]
    TruncatedHeader { len: u64, required: usize },

    #[error("carrier ends after {remaining} pixel bytes, before the stego record is complete")]
    TruncatedRecord { remaining: u64 },

    #[error("magic string mismatch: expected {expected:?}, found {actual:?}")]
    MagicMismatch { expected: Vec<u8>, actual: Vec<u8> },

    #[error("decoded {field} is negative ({value})")]
    NegativeLength { field: SizeField, value: i32 },

    #[error("decoded extension length {len} exceeds the limit of {max}")]
    ExtensionTooLong { len: usize, max: usize },

    #[error("decoded extension {0:?} is not a valid file extension")]
    InvalidExtension(Vec<u8>),

    #[error("decoded {field} needs {required} carrier bytes but only {remaining} remain")]
    LengthExceedsCarrier {
        field: SizeField,
        required: u64,
        remaining: u64,
    },
}

/// 线上格式中的两个长度字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    Extension,
    Payload,
}

impl fmt::Display for SizeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeField::Extension => f.write_str("extension length"),
            SizeField::Payload => f.write_str("payload length"),
        }
    }
}

/// 使用 [`StegoError`] 的 `Result` 别名。
pub type Result<T> = std::result::Result<T, StegoError>;
