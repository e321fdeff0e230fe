//! # 比特流编解码模块
//!
//! 把字节或文本展开为有序的比特序列，以及反向还原。
//! 每个字节固定展开为 8 个比特，按最高有效位 (MSB) 优先的顺序排列。
//!
//! # 填充规则
//! - `BitSequence` 始终精确记录比特数，即使不是 8 的倍数。
//! - `to_bytes` 在最后一组不足 8 比特时在右侧补 0。
//!   调用方需要先按帧头声明的长度截断，否则补齐的部分会变成一个多余的字节。
//!
//! # 示例
//! ```
//! use bit_raster::bits::BitSequence;
//!
//! let bits = BitSequence::from_text("Hi!");
//! assert_eq!(bits.to_string(), "010010000110100100100001");
//! assert_eq!(bits.to_text(), "Hi!");
//! ```

use crate::constants::BITS_PER_BYTE;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// 有序的比特序列，支持随机访问并精确记录长度。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitSequence {
    bits: Vec<bool>,
}

impl BitSequence {
    /// 创建一个空序列。
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// 创建一个预留了 `capacity` 个比特空间的空序列。
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// 每个字节展开为 8 个比特，MSB 优先，按输入顺序拼接。
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(bytes.len() * BITS_PER_BYTE);
        for &byte in bytes {
            for shift in (0..BITS_PER_BYTE).rev() {
                bits.push((byte >> shift) & 1 == 1);
            }
        }
        Self { bits }
    }

    /// 以单字节字符编码文本。
    ///
    /// 只有 7 位 ASCII 能保证无损往返；码点超过 `0xFF` 的字符只保留低 8 位。
    pub fn from_text(text: &str) -> Self {
        let bytes: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
        Self::from_bytes(&bytes)
    }

    /// 每 8 个比特组成一个字节，MSB 优先。
    /// 最后一组不足 8 比特时在右侧补 0。
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(BITS_PER_BYTE)
            .map(|group| {
                group
                    .iter()
                    .chain(std::iter::repeat(&false))
                    .take(BITS_PER_BYTE)
                    .fold(0u8, |acc, &bit| (acc << 1) | bit as u8)
            })
            .collect()
    }

    /// 按单字节字符解码为文本，每个字节映射到同值的码点。
    pub fn to_text(&self) -> String {
        self.to_bytes().into_iter().map(char::from).collect()
    }

    /// 比特数。
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// 读取 `index` 处的比特，越界返回 `None`。
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// 翻转 `index` 处的比特，越界时不做任何事。
    pub fn flip(&mut self, index: usize) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit = !*bit;
        }
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// 把另一个序列追加到末尾。
    pub fn append(&mut self, other: &BitSequence) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// 复制 `range` 范围内的比特，范围会被裁剪到序列长度之内。
    pub fn slice(&self, range: Range<usize>) -> BitSequence {
        let end = range.end.min(self.bits.len());
        let start = range.start.min(end);
        Self {
            bits: self.bits[start..end].to_vec(),
        }
    }

    /// 截断到 `len` 个比特；`len` 大于当前长度时不做任何事。
    pub fn truncate(&mut self, len: usize) {
        self.bits.truncate(len);
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// 以只读切片形式访问底层比特。
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}

impl FromIterator<bool> for BitSequence {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<bool>> for BitSequence {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

/// 以 `'0'`/`'1'` 字符串的形式输出。
impl fmt::Display for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// 解析 `'0'`/`'1'` 字符串时遇到的非法字符。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bit character {character:?} at position {position}")]
pub struct ParseBitsError {
    pub character: char,
    pub position: usize,
}

impl FromStr for BitSequence {
    type Err = ParseBitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .enumerate()
            .map(|(position, character)| match character {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(ParseBitsError {
                    character,
                    position,
                }),
            })
            .collect()
    }
}
