//! # 长度帧模块
//!
//! 在比特流前面嵌入一个自描述的 ASCII 长度头，以便解码时能从填充过的图像中
//! 精确还原原始长度。
//!
//! # 帧格式
//!
//! ```text
//! +--------------------------+----------------+------------------+
//! | 十进制长度 (ASCII, 8b/字) | '!' (8 bits)   | 负载比特          |
//! +--------------------------+----------------+------------------+
//! ```
//!
//! 长度有两种单位：
//! - `LengthUnit::Bits`：通用帧，记录负载的比特数 (文本模式)。
//! - `LengthUnit::Bytes`：整文件帧，记录源文件的字节数，解码时乘以 8。
//!
//! 同一条编解码路径只能使用其中一种单位。
//! 扫描以 8 比特为粒度进行，帧头可以跨越页面边界。

use crate::bits::BitSequence;
use crate::constants::{BITS_PER_BYTE, LENGTH_SENTINEL, MAX_LENGTH_DIGITS};
use crate::error::{Error, FrameError, Result};
use log::debug;

/// 帧头中长度数字的单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Bits,
    Bytes,
}

impl LengthUnit {
    fn bits_per_unit(self) -> usize {
        match self {
            LengthUnit::Bits => 1,
            LengthUnit::Bytes => BITS_PER_BYTE,
        }
    }
}

/// 长度帧头：十进制长度加上终止符 `!`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    unit: LengthUnit,
    declared: usize,
}

impl FrameHeader {
    /// 以比特数为单位描述 `payload`。
    pub fn for_bits(payload: &BitSequence) -> Self {
        Self {
            unit: LengthUnit::Bits,
            declared: payload.len(),
        }
    }

    /// 以字节数为单位描述一个 `byte_len` 字节的文件。
    pub fn for_bytes(byte_len: usize) -> Self {
        Self {
            unit: LengthUnit::Bytes,
            declared: byte_len,
        }
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    /// 帧头中写入的原始数值 (单位由 `unit` 决定)。
    pub fn declared(&self) -> usize {
        self.declared
    }

    /// 负载的比特数。
    pub fn declared_bits(&self) -> usize {
        self.declared * self.unit.bits_per_unit()
    }

    /// 帧头文本，例如 `"24!"`。
    pub fn text(&self) -> String {
        format!("{}{}", self.declared, LENGTH_SENTINEL as char)
    }

    pub fn to_bits(&self) -> BitSequence {
        BitSequence::from_text(&self.text())
    }

    /// 帧头本身占用的比特数。
    pub fn bit_len(&self) -> usize {
        self.text().len() * BITS_PER_BYTE
    }
}

/// 扫描帧头得到的定位信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// 负载起始位置 (比特偏移，紧跟在 `!` 之后，始终按字节对齐)。
    pub payload_start: usize,
    /// 帧头声明的负载比特数。
    pub declared_bits: usize,
}

impl FrameInfo {
    pub fn payload_end(&self) -> usize {
        self.payload_start + self.declared_bits
    }
}

/// 返回 `header ++ payload`。
pub fn frame(header: &FrameHeader, payload: &BitSequence) -> BitSequence {
    let mut framed = header.to_bits();
    framed.append(payload);
    framed
}

/// 以比特数为单位给 `bits` 加上长度头。
pub fn add_header(bits: &BitSequence) -> BitSequence {
    frame(&FrameHeader::for_bits(bits), bits)
}

/// 每次读取 8 个比特并解释为 ASCII 字符，累积十进制数字，直到遇到终止符。
///
/// 只返回定位信息，不复制负载；多页解码需要按这个信息在拼接后的缓冲区中切片。
///
/// # Errors
///
/// * `FrameError::MissingSentinel`：整个缓冲区中都没有终止符。
/// * `FrameError::InvalidLength`：终止符前出现非数字字符、数字为空、位数过多或数值溢出。
pub fn scan_header(bits: &BitSequence, unit: LengthUnit) -> Result<FrameInfo> {
    let mut digits = String::new();

    for (index, group) in bits.as_slice().chunks_exact(BITS_PER_BYTE).enumerate() {
        let byte = group.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8);

        if byte == LENGTH_SENTINEL {
            let declared = parse_declared(&digits, unit)?;
            let info = FrameInfo {
                payload_start: (index + 1) * BITS_PER_BYTE,
                declared_bits: declared,
            };
            debug!("frame header {:?} found: {:?}", digits, info);
            return Ok(info);
        }

        digits.push(char::from(byte));
        if !byte.is_ascii_digit() || digits.len() > MAX_LENGTH_DIGITS {
            return Err(FrameError::InvalidLength { digits }.into());
        }
    }

    Err(FrameError::MissingSentinel {
        scanned_bits: bits.len(),
    }
    .into())
}

fn parse_declared(digits: &str, unit: LengthUnit) -> Result<usize> {
    digits
        .parse::<usize>()
        .ok()
        .and_then(|value| value.checked_mul(unit.bits_per_unit()))
        .ok_or_else(|| {
            FrameError::InvalidLength {
                digits: digits.to_string(),
            }
            .into()
        })
}

/// 按 `info` 从 `bits` 中切出负载，丢弃尾部填充。
///
/// # Errors
///
/// 可用比特不足声明长度时返回 `Error::TruncatedInput`。
pub fn extract_payload(bits: &BitSequence, info: &FrameInfo) -> Result<BitSequence> {
    let available = bits.len().saturating_sub(info.payload_start);
    if available < info.declared_bits {
        return Err(Error::TruncatedInput {
            declared: info.declared_bits,
            available,
        });
    }
    Ok(bits.slice(info.payload_start..info.payload_end()))
}

/// 去掉比特数单位的长度头，返回负载及其声明长度。
pub fn strip_header(bits: &BitSequence) -> Result<(BitSequence, usize)> {
    let info = scan_header(bits, LengthUnit::Bits)?;
    let payload = extract_payload(bits, &info)?;
    Ok((payload, info.declared_bits))
}
