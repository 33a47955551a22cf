//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，可把任意文件隐藏进 24 位 BMP 图像，并原样恢复。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，可把任意文件隐藏进 24 位未压缩 BMP 图像，并逐字节原样恢复。"
)]
pub struct Cli {
    /// 输出更详细的日志 (-v 显示各阶段进度，-vv 显示调试信息)。
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// 根据 `-v` 出现的次数确定日志级别。
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

/// 可用的子命令：encode (隐藏) 和 decode (恢复)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 把秘密文件隐藏进 BMP 图像。
    Encode(EncodeArgs),

    /// 从经过隐写的 BMP 图像中恢复秘密文件。
    Decode(DecodeArgs),
}

/// 'encode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// 用作载体的 24 位 BMP 图像。
    pub image: PathBuf,

    /// 要隐藏的秘密文件，文件名必须带扩展名。
    pub secret: PathBuf,

    /// 输出图像路径 (.bmp)。默认为载体所在目录下的 `default_stego.bmp`。
    pub dest: Option<PathBuf>,

    /// 输出文件已存在时直接覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// 已隐藏数据的 BMP 图像。
    pub image: PathBuf,

    /// 输出文件名，缺少扩展名时自动补全。默认为图像所在目录下的 `decoded`。
    pub output: Option<PathBuf>,

    /// 输出文件已存在时直接覆盖。
    #[arg(short, long)]
    pub force: bool,
}
