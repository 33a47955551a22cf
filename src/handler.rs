//! # 命令处理逻辑模块
//!
//! 包含处理 `encode` 和 `decode` 子命令的高级业务逻辑。
//! 本模块负责校验参数、打开文件、调用编解码流水线以及向用户报告结果。

use crate::cli::{DecodeArgs, EncodeArgs};
use crate::constants::{DEFAULT_DECODED_NAME, DEFAULT_STEGO_NAME};
use crate::error::StegoError;
use crate::pipeline::{Decoder, Encoder};
use anyhow::{Context, Result};
use colored::Colorize;
use log::warn;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

/// 处理 'Encode' 命令的执行逻辑。
///
/// 校验文件名后打开载体和秘密文件，交给 [`Encoder`] 完成隐写。
/// 输出文件只有在容量检查通过后才会被创建；之后任一阶段失败都会删除不完整的输出。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 载体或输出文件不是 `.bmp`，或秘密文件没有扩展名 (`StegoError::Argument`)。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取输入文件或写入输出文件。
/// * 图像没有足够的空间容纳秘密文件 (`StegoError::Capacity`)。
pub fn handle_encode(args: EncodeArgs) -> Result<()> {
    ensure_bmp(&args.image)?;
    let extension = secret_extension(&args.secret)?;
    let dest = args
        .dest
        .unwrap_or_else(|| sibling_path(&args.image, DEFAULT_STEGO_NAME));
    ensure_bmp(&dest)?;
    ensure_distinct(&args.image, &dest)?;
    ensure_distinct(&args.secret, &dest)?;
    if dest.exists() && !args.force {
        return Err(already_exists(&dest).into());
    }

    let carrier = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let secret = File::open(&args.secret).with_context(|| {
        format!(
            "Unable to read secret file: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;

    let mut created = false;
    let report = Encoder::new(BufReader::new(carrier), BufReader::new(secret), extension)?
        .encode(|| {
            let file = create_output(&dest, args.force)?;
            created = true;
            Ok(BufWriter::new(file))
        })
        .inspect_err(|_| {
            if created {
                discard_partial_output(&dest);
            }
        })?;

    println!(
        "The secret file has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    println!(
        "Used {} of {} available bits.",
        report.required_bits.to_string().green(),
        report.capacity_bits.to_string().green()
    );

    Ok(())
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 打开隐写图像，交给 [`Decoder`] 校验魔数并还原秘密文件。
/// 输出文件名按还原出的扩展名补全，魔数不匹配时不会创建任何文件；
/// 输出创建后的失败同样不会留下不完整的文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `DecodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输入文件不是 `.bmp` (`StegoError::Argument`)。
/// * 无法读取图像文件或写入输出文件。
/// * 图像中没有有效的隐写记录 (`StegoError::Format`)。
pub fn handle_decode(args: DecodeArgs) -> Result<()> {
    ensure_bmp(&args.image)?;
    let output_base = args
        .output
        .unwrap_or_else(|| sibling_path(&args.image, DEFAULT_DECODED_NAME));

    let stego = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let mut created: Option<PathBuf> = None;
    let report = Decoder::new(BufReader::new(stego), output_base)
        .decode(|output| {
            ensure_distinct(&args.image, output)?;
            let file = create_output(output, args.force)?;
            created = Some(output.to_path_buf());
            Ok(BufWriter::new(file))
        })
        .inspect_err(|_| {
            if let Some(output) = &created {
                discard_partial_output(output);
            }
        })?;

    println!(
        "The secret file has been successfully recovered and saved: {}",
        report.output.to_string_lossy().green().bold()
    );
    println!(
        "Recovered {} bytes with extension {}.",
        report.payload_len.to_string().green(),
        report.extension.green()
    );

    Ok(())
}

/// 与 `image` 位于同一目录下、名为 `name` 的路径。
fn sibling_path(image: &Path, name: &str) -> PathBuf {
    image
        .parent()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

fn ensure_bmp(path: &Path) -> Result<(), StegoError> {
    let is_bmp = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bmp"));
    if !is_bmp {
        return Err(StegoError::Argument(format!(
            "{} must be a .bmp file",
            path.display()
        )));
    }
    Ok(())
}

/// 取出秘密文件的扩展名：文件名中第一个 `.` 起的全部内容，如 `archive.tar.gz` 得到 `.tar.gz`。
/// 文件名开头的 `.` (隐藏文件) 不算作扩展名的起点。
fn secret_extension(secret: &Path) -> Result<String, StegoError> {
    secret
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| {
            name.char_indices()
                .skip(1)
                .find(|&(_, c)| c == '.')
                .map(|(i, _)| &name[i..])
        })
        .filter(|ext| ext.len() > 1)
        .map(str::to_owned)
        .ok_or_else(|| {
            StegoError::Argument(format!(
                "secret file {} must have a file extension",
                secret.display()
            ))
        })
}

/// 拒绝指向某个输入文件本身的输出路径，否则打开输出时会截断正在读取的文件。
fn ensure_distinct(input: &Path, output: &Path) -> Result<(), StegoError> {
    let same = output.exists()
        && matches!(
            (fs::canonicalize(input), fs::canonicalize(output)),
            (Ok(a), Ok(b)) if a == b
        );
    if same {
        return Err(StegoError::Argument(format!(
            "output {} would overwrite the input file {}",
            output.display(),
            input.display()
        )));
    }
    Ok(())
}

/// 流水线在输出文件创建之后失败时，删除留下的不完整文件。
fn discard_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => warn!("removed incomplete output {}", path.display()),
        Err(e) => warn!("unable to remove incomplete output {}: {e}", path.display()),
    }
}

fn already_exists(path: &Path) -> StegoError {
    StegoError::Argument(format!(
        "Output file already exists: {} (use --force to overwrite)",
        path.display()
    ))
}

/// 创建输出文件；未指定 `force` 时绝不覆盖已有文件。
fn create_output(path: &Path, force: bool) -> Result<File, StegoError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    options.open(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => already_exists(path),
        _ => StegoError::Io(e),
    })
}
