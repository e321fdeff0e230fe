//! # 错误类型模块
//!
//! 核心编解码流程中所有可能出现的错误都集中定义在这里。
//! 命令行层 (`handler`) 使用 `anyhow` 为这些错误附加上下文信息。

use thiserror::Error;

/// 核心库的顶层错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// 帧头无法解析，通常是盐值错误或图像损坏导致的。
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] FrameError),

    /// 可用比特数少于帧头声明的长度。
    #[error("truncated input: header declares {declared} bits but only {available} are available")]
    TruncatedInput { declared: usize, available: usize },

    /// 找不到指定的图像或页面集合。
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// 页面尺寸太小，无法容纳哪怕一个完整字节。
    #[error("invalid page size {width}x{height}: a page must hold at least 8 pixels")]
    InvalidPageSize { width: u32, height: u32 },

    /// 图像编码或解码失败。
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// 文件系统错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 帧头扫描过程中的错误。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// 扫描完所有比特后仍未遇到终止符 `!`。
    #[error("length terminator not found after scanning {scanned_bits} bits")]
    MissingSentinel { scanned_bits: usize },

    /// 终止符之前的文本不是合法的十进制长度。
    #[error("declared length {digits:?} is not a valid decimal number")]
    InvalidLength { digits: String },
}

/// 使用本库 `Error` 类型的 `Result` 别名。
pub type Result<T> = std::result::Result<T, Error>;
