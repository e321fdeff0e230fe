//! # 编解码流程模块
//!
//! 把各个组件串联成完整的编码和解码流程：
//!
//! ```text
//! 编码: 内容 -> 比特流 -> 加长度头 -> (加盐) -> 分页 -> 渲染图像
//! 解码: 读取图像 -> 比特流 -> (去盐) -> 拼接各页 -> 扫描长度头并截断 -> 内容
//! ```
//!
//! 文本与文件使用不同的长度单位：文本帧记录比特数，文件帧记录字节数。
//! 文本解码失败时返回固定的提示信息，文件解码失败时返回带类型的错误。

use crate::bits::BitSequence;
use crate::chunking::{PageSize, plan_chunks, reassemble};
use crate::constants::INVALID_SALT_MESSAGE;
use crate::error::Result;
use crate::framing::{FrameHeader, LengthUnit, frame};
use crate::raster::{RasterStore, page_name, read_monochrome, render_monochrome};
use crate::salt::Salt;
use image::RgbaImage;
use log::{debug, info, warn};

/// 编解码选项。
///
/// * `salt`：编码与解码必须一致；`None` 表示不加盐。
/// * `page`：固定的页面尺寸，内容放不下时会分成多页；
///   `None` 表示自动选择一张刚好放得下的正方形图像。解码时忽略。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub salt: Option<Salt>,
    pub page: Option<PageSize>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_salt(mut self, salt: Salt) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn with_page(mut self, page: PageSize) -> Self {
        self.page = Some(page);
        self
    }
}

/// 待编码的内容。
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    /// 文本，按单字节字符编码，长度头记录比特数。
    Text(&'a str),
    /// 任意二进制文件内容，长度头记录字节数。
    File(&'a [u8]),
}

impl Content<'_> {
    fn unit(&self) -> LengthUnit {
        match self {
            Content::Text(_) => LengthUnit::Bits,
            Content::File(_) => LengthUnit::Bytes,
        }
    }

    /// 转换为比特流并加上对应单位的长度头。
    pub fn to_framed_bits(&self) -> BitSequence {
        match *self {
            Content::Text(text) => {
                let payload = BitSequence::from_text(text);
                frame(&FrameHeader::for_bits(&payload), &payload)
            }
            Content::File(bytes) => {
                let payload = BitSequence::from_bytes(bytes);
                frame(&FrameHeader::for_bytes(bytes.len()), &payload)
            }
        }
    }
}

/// 把内容编码为一张或多张单色图像，按页序返回。
pub fn encode(content: Content<'_>, options: &Options) -> Vec<RgbaImage> {
    let mut stream = content.to_framed_bits();
    if let Some(salt) = &options.salt {
        salt.apply_in_place(&mut stream);
    }

    let page = options
        .page
        .unwrap_or_else(|| PageSize::square_for(stream.len()));
    debug!(
        "encoding {:?} content: {} framed bits into {}x{} page(s)",
        content.unit(),
        stream.len(),
        page.width(),
        page.height()
    );

    plan_chunks(&stream, &page)
        .iter()
        .map(|bits| render_monochrome(bits, &page))
        .collect()
}

/// 编码并把每一页保存到 `store`，返回保存时使用的名称。
///
/// 自动尺寸时只有一页，直接以 `name` 保存；
/// 指定页面尺寸时，各页依次命名为 `name_0`, `name_1`, ...
pub fn encode_to_store(
    content: Content<'_>,
    options: &Options,
    store: &dyn RasterStore,
    name: &str,
) -> Result<Vec<String>> {
    let pages = encode(content, options);
    let names: Vec<String> = if options.page.is_none() {
        vec![name.to_string()]
    } else {
        (0..pages.len()).map(|index| page_name(name, index)).collect()
    };

    for (raster, page) in pages.iter().zip(&names) {
        store.persist(raster, page)?;
    }
    info!("stored {} page(s) as '{}'", names.len(), name);
    Ok(names)
}

/// 从 `store` 中加载 `name` 对应的全部页面，按页序返回。
pub fn load_pages(store: &dyn RasterStore, name: &str) -> Result<Vec<RgbaImage>> {
    store
        .discover(name)?
        .iter()
        .map(|page| store.load(page))
        .collect()
}

/// 读出每一页的比特，去盐后重组为负载比特流。
pub fn decode_bits(pages: &[RgbaImage], options: &Options, unit: LengthUnit) -> Result<BitSequence> {
    let page_bits: Vec<BitSequence> = pages
        .iter()
        .map(|raster| {
            let mut bits = read_monochrome(raster);
            if let Some(salt) = &options.salt {
                salt.apply_in_place(&mut bits);
            }
            bits
        })
        .collect();

    reassemble(&page_bits, unit)
}

/// 解码文本。
///
/// 盐值错误会产生无法解析的帧头，这与图像损坏无法区分，
/// 因此任何失败都不会返回错误，而是返回 `INVALID_SALT_MESSAGE`。
pub fn decode_text(pages: &[RgbaImage], options: &Options) -> String {
    match decode_bits(pages, options, LengthUnit::Bits) {
        Ok(bits) => bits.to_text(),
        Err(err) => {
            warn!("text decode failed: {}", err);
            INVALID_SALT_MESSAGE.to_string()
        }
    }
}

/// 解码文件内容。
///
/// # Errors
///
/// 所有核心错误 (`MalformedFrame`, `TruncatedInput`) 都会原样返回，
/// 调用方据此避免写出错误的文件。
pub fn decode_file(pages: &[RgbaImage], options: &Options) -> Result<Vec<u8>> {
    let bits = decode_bits(pages, options, LengthUnit::Bytes)?;
    Ok(bits.to_bytes())
}
