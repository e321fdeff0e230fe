//! # 命令处理逻辑模块
//!
//! 包含处理各个子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心编解码流程以及向用户报告结果。

use crate::chunking::PageSize;
use crate::cli::{DecodeFileArgs, DecodeTextArgs, EncodeArgs};
use crate::constants::{
    IMAGE_EXTENSION, INVALID_SALT_MESSAGE, LOSSLESS_EXTENSIONS, PAGE_SUFFIX_SEPARATOR,
    RECOVERED_FILE_PREFIX,
};
use crate::framing::LengthUnit;
use crate::pipeline::{Content, Options, decode_bits, decode_file, encode_to_store, load_pages};
use crate::raster::{DirectoryStore, RasterStore, page_index};
use anyhow::{Context, Result};
use colored::Colorize;
use image::RgbaImage;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// 处理 'EncodeText' 命令的执行逻辑。
///
/// 读取文本文件并编码为一张或多张图像。非 ASCII 字符无法无损还原，会给出警告。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的文本文件。
/// * 页面尺寸过小。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法写入输出图像。
pub fn handle_encode_text(args: EncodeArgs) -> Result<()> {
    let text = fs::read_to_string(&args.input).with_context(|| {
        format!(
            "Unable to read text file: {}",
            args.input.to_string_lossy().red().bold()
        )
    })?;

    if !text.is_ascii() {
        warn!("input contains non-ASCII characters, they will not survive decoding unchanged");
    }

    encode_to_images(Content::Text(&text), &args)
}

/// 处理 'EncodeFile' 命令的执行逻辑。
///
/// # Errors
///
/// 与 [`handle_encode_text`] 相同，只是输入按原始字节读取。
pub fn handle_encode_file(args: EncodeArgs) -> Result<()> {
    let data = fs::read(&args.input).with_context(|| {
        format!(
            "Unable to read input file: {}",
            args.input.to_string_lossy().red().bold()
        )
    })?;

    encode_to_images(Content::File(&data), &args)
}

fn encode_to_images(content: Content<'_>, args: &EncodeArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| args.input.with_extension(IMAGE_EXTENSION));
    let (store, name) = open_image_path(&dest)?;

    let mut options = Options::new();
    options.salt = args.salt.clone();
    if let (Some(width), Some(height)) = (args.width, args.height) {
        options.page = Some(PageSize::new(width, height).with_context(|| {
            format!(
                "Page size {}x{} cannot hold a single byte.",
                width.to_string().red().bold(),
                height.to_string().red().bold()
            )
        })?);
    }

    fs::create_dir_all(store.root()).with_context(|| {
        format!(
            "Unable to create output directory: {}",
            store.root().to_string_lossy().red().bold()
        )
    })?;
    let previous = previous_output(&store, &name, args.force)?;

    let names = encode_to_store(content, &options, &store, &name).with_context(|| {
        format!(
            "Unable to write image file(s) for: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;
    remove_stale_output(&store, &previous, &names)?;

    println!(
        "The content has been successfully encoded into {} image(s): {}",
        names.len().to_string().green().bold(),
        store.path_for(&names[0]).to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'DecodeText' 命令的执行逻辑。
///
/// 盐值错误不会导致命令失败：只在终端打印一条固定的提示信息，不写出任何文件。
///
/// # Errors
///
/// * 找不到图像或无法读取图像。
/// * 无法写入目标文本文件。
pub fn handle_decode_text(args: DecodeTextArgs) -> Result<()> {
    let pages = read_pages(&args.image)?;

    let mut options = Options::new();
    options.salt = args.salt;
    let text = match decode_bits(&pages, &options, LengthUnit::Bits) {
        Ok(bits) => bits.to_text(),
        Err(e) => {
            warn!("text decoding failed: {}", e);
            eprintln!("{}", INVALID_SALT_MESSAGE.yellow().bold());
            return Ok(());
        }
    };

    match args.text {
        Some(path) => {
            ensure_writable(&path, args.force)?;
            fs::write(&path, &text).with_context(|| {
                format!(
                    "Unable to write to target text file: {}",
                    path.to_string_lossy().red().bold()
                )
            })?;
            println!(
                "The text has been successfully recovered and saved: {}",
                path.to_string_lossy().green().bold()
            );
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// 处理 'DecodeFile' 命令的执行逻辑。
///
/// # Errors
///
/// * 找不到图像或无法读取图像。
/// * 帧头无法解析 (盐值错误或图像损坏) 或数据不完整，此时不会写出任何文件。
/// * 输出文件已存在且未指定 `--force`，或无法写入。
pub fn handle_decode_file(args: DecodeFileArgs) -> Result<()> {
    let pages = read_pages(&args.image)?;

    let mut options = Options::new();
    options.salt = args.salt;
    let data = decode_file(&pages, &options).with_context(|| {
        format!(
            "Failed to decode a file from '{}'. \nThe salt may be wrong, or some pages are missing or corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let dest = match args.dest {
        Some(dest) => dest,
        None => default_recovered_path(&args.image)?,
    };
    ensure_writable(&dest, args.force)?;
    fs::write(&dest, &data).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The file ({} bytes) has been successfully recovered and saved: {}",
        data.len().to_string().green().bold(),
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 把图像路径拆分为所在目录的存储和不含扩展名的名称。
/// 存储沿用路径的扩展名 (没有扩展名时为 png)，只接受无损格式。
fn open_image_path(path: &Path) -> Result<(DirectoryStore, String)> {
    let extension = match path.extension() {
        Some(ext) => ext.to_str().with_context(|| {
            format!(
                "Invalid image path: {}",
                path.to_string_lossy().red().bold()
            )
        })?,
        None => IMAGE_EXTENSION,
    };
    anyhow::ensure!(
        LOSSLESS_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension)),
        "Unsupported image format: {}\nUse a lossless format: {}.",
        path.to_string_lossy().red().bold(),
        LOSSLESS_EXTENSIONS.join(", ")
    );

    let root = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| {
            format!(
                "Invalid image path: {}",
                path.to_string_lossy().red().bold()
            )
        })?;
    Ok((
        DirectoryStore::new(root).with_extension(extension),
        name.to_string(),
    ))
}

/// 如果给出的是某一页 (如 `secret_1.png`)，而同目录下还有同一组的其他页，
/// 则改为加载整组页面。
fn resolve_page_set(store: &DirectoryStore, name: &str) -> String {
    let base = name
        .rsplit_once(PAGE_SUFFIX_SEPARATOR)
        .filter(|(base, _)| page_index(base, name).is_some())
        .map(|(base, _)| base);

    if let Some(base) = base {
        if store.discover(base).is_ok_and(|pages| pages.len() > 1) {
            debug!("'{}' is one page of '{}', loading the whole set", name, base);
            return base.to_string();
        }
    }
    name.to_string()
}

fn read_pages(image: &Path) -> Result<Vec<RgbaImage>> {
    let (store, name) = open_image_path(image)?;
    let name = resolve_page_set(&store, &name);

    load_pages(&store, &name).with_context(|| {
        format!(
            "Unable to read image(s) for: {}",
            image.to_string_lossy().red().bold()
        )
    })
}

/// 找出 `name` 已有的输出。未指定 `--force` 时，存在旧输出即报错。
fn previous_output(store: &DirectoryStore, name: &str, force: bool) -> Result<Vec<String>> {
    let Ok(existing) = store.discover(name) else {
        return Ok(Vec::new());
    };

    let first = store.path_for(&existing[0]);
    anyhow::ensure!(
        force,
        "Output file already exists: {}\nUse --force to overwrite it.",
        first.to_string_lossy().red().bold()
    );
    Ok(existing)
}

/// 新输出全部写完后，删除没有被覆盖的旧单图或页面，
/// 避免页数减少后残留的旧页被当作新数据加载。
fn remove_stale_output(store: &DirectoryStore, previous: &[String], written: &[String]) -> Result<()> {
    for page in previous.iter().filter(|page| !written.contains(page)) {
        let path = store.path_for(page);
        fs::remove_file(&path).with_context(|| {
            format!(
                "Unable to remove previous output: {}",
                path.to_string_lossy().red().bold()
            )
        })?;
        debug!("removed stale page {}", path.display());
    }
    Ok(())
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}\nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

fn default_recovered_path(image: &Path) -> Result<PathBuf> {
    let (store, name) = open_image_path(image)?;
    Ok(store
        .root()
        .join(format!("{}{}.bin", RECOVERED_FILE_PREFIX, name)))
}
