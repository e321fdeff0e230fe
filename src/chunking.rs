//! # 分页与重组模块
//!
//! 编码时，把一条比特流切分为若干固定容量的页面，每一页对应一张图像；
//! 解码时，按顺序拼接各页，扫描长度头，并把结果截断到声明长度。
//!
//! 页面容量为像素数向下取整到 8 的倍数，因此每一页都按字节对齐，
//! 盐值的模 8 周期在页与页之间保持一致。

use crate::bits::BitSequence;
use crate::constants::BITS_PER_BYTE;
use crate::error::{Error, Result};
use crate::framing::{LengthUnit, extract_payload, scan_header};
use log::debug;

/// 单张图像的尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    width: u32,
    height: u32,
}

impl PageSize {
    /// 创建页面尺寸。
    ///
    /// # Errors
    ///
    /// 像素数不足 8 个 (容量为 0) 时返回 `Error::InvalidPageSize`。
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let page = Self { width, height };
        if page.capacity_bits() == 0 {
            return Err(Error::InvalidPageSize { width, height });
        }
        Ok(page)
    }

    /// 能容纳 `total_bits` 的最小正方形页面。
    pub fn square_for(total_bits: usize) -> Self {
        let side = square_side(total_bits);
        Self {
            width: side,
            height: side,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// `floor(width * height / 8) * 8`
    pub fn capacity_bits(&self) -> usize {
        page_capacity(self.pixel_count())
    }
}

/// 把像素数向下取整到 8 的倍数。
pub fn page_capacity(pixel_count: usize) -> usize {
    pixel_count - pixel_count % BITS_PER_BYTE
}

/// 正方形页面的边长：从 `ceil(sqrt(total_bits))` 开始，
/// 必要时继续增大，直到按字节取整后的容量能放下全部比特 (且至少一个字节)。
pub fn square_side(total_bits: usize) -> u32 {
    let mut side = (total_bits as f64).sqrt() as usize;
    while side * side > total_bits {
        side -= 1;
    }
    while side * side < total_bits {
        side += 1;
    }

    let required = total_bits.max(BITS_PER_BYTE);
    while page_capacity(side * side) < required {
        side += 1;
    }

    u32::try_from(side).unwrap_or(u32::MAX)
}

/// `ceil(total_bits / capacity_bits)`
pub fn page_count(total_bits: usize, capacity_bits: usize) -> usize {
    total_bits.div_ceil(capacity_bits)
}

/// 把 `bits` 切分为连续且互不重叠的页面，按升序排列。
///
/// 最后一页可能不满，补 0 由渲染器负责。
pub fn plan_chunks(bits: &BitSequence, page: &PageSize) -> Vec<BitSequence> {
    let capacity = page.capacity_bits();
    let pages: Vec<BitSequence> = (0..page_count(bits.len(), capacity))
        .map(|index| bits.slice(index * capacity..(index + 1) * capacity))
        .collect();

    debug!(
        "planned {} page(s) of {}x{} ({} bits each) for {} bits",
        pages.len(),
        page.width,
        page.height,
        capacity,
        bits.len()
    );
    pages
}

/// 按给定顺序拼接所有页面，扫描长度头 (帧头可以跨页)，
/// 并把负载截断到声明长度，丢弃最后一页的填充。
///
/// # Errors
///
/// * `Error::MalformedFrame`：找不到帧头或长度非法。
/// * `Error::TruncatedInput`：所有页面加起来仍少于声明的长度。
pub fn reassemble(pages: &[BitSequence], unit: LengthUnit) -> Result<BitSequence> {
    let total: usize = pages.iter().map(BitSequence::len).sum();
    let mut stream = BitSequence::with_capacity(total);
    for page in pages {
        stream.append(page);
    }

    let info = scan_header(&stream, unit)?;
    debug!(
        "reassembling {} page(s): payload starts at bit {}, {} bits declared",
        pages.len(),
        info.payload_start,
        info.declared_bits
    );
    extract_payload(&stream, &info)
}
