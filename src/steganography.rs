//! # 位打包模块
//!
//! 载荷的每一个 bit 都只在这里落到载体字节上。
//! 每个载体字节只使用最低位 (bit 0)，其余 7 位保持不变，
//! 因此每个颜色通道的取值最多变化 1。
//! 所有字段都按最高位在前的顺序写入：值的最高位进入窗口的第一个字节。

use crate::constants::{BYTE_WINDOW, SIZE_WINDOW};

/// 把 `value` 的低 `window.len()` 位按最高位在前的顺序写入窗口各字节的最低位。
fn pack_bits(value: u64, window: &mut [u8]) {
    let width = window.len();
    for (i, byte) in window.iter_mut().enumerate() {
        let bit = ((value >> (width - 1 - i)) & 1) as u8;
        *byte = (*byte & 0xFE) | bit;
    }
}

/// 依次读取窗口各字节的最低位，左移累加还原出数值。
fn unpack_bits(window: &[u8]) -> u64 {
    window
        .iter()
        .fold(0u64, |acc, &byte| (acc << 1) | u64::from(byte & 1))
}

/// 把一个字节隐写进 8 个载体字节。
///
/// 第 `i` 个载体字节的最低位被替换为 `value` 从高位数起的第 `i` 位。
pub fn pack_byte(value: u8, window: &mut [u8; BYTE_WINDOW]) {
    pack_bits(u64::from(value), window);
}

/// 从 8 个载体字节中还原一个字节。
pub fn unpack_byte(window: &[u8; BYTE_WINDOW]) -> u8 {
    unpack_bits(window) as u8
}

/// 把一个 32 位整数隐写进 32 个载体字节，位序与 [`pack_byte`] 相同。
pub fn pack_u32(value: u32, window: &mut [u8; SIZE_WINDOW]) {
    pack_bits(u64::from(value), window);
}

/// 从 32 个载体字节中还原一个 32 位整数。
pub fn unpack_u32(window: &[u8; SIZE_WINDOW]) -> u32 {
    unpack_bits(window) as u32
}
