//! # bit_raster 库
//!
//! 把文本或任意文件编码为一张或多张单色图像 (每个像素一个比特)，并从图像还原原始内容。
//! 可选的盐值会在固定的比特偏移处翻转比特，仅用于混淆，不提供加密安全性。
//!
//! # 模块
//!
//! - `bits`：字节/文本与比特序列之间的转换
//! - `framing`：自描述的十进制长度头
//! - `salt`：可逆的比特翻转
//! - `chunking`：分页与重组
//! - `raster`：单色图像的渲染、读取与存储
//! - `pipeline`：完整的编码与解码流程
//! - `cli` / `handler`：命令行接口与命令处理
//!
//! # 示例
//! ```
//! use bit_raster::{Content, Options, Salt, decode_text, encode};
//!
//! let options = Options::new().with_salt(Salt::new([1, 4]));
//! let pages = encode(Content::Text("Hi!"), &options);
//! assert_eq!(decode_text(&pages, &options), "Hi!");
//! ```

// 声明库包含的所有模块。

pub mod bits;
pub mod chunking;
pub mod cli;
pub mod constants;
pub mod error;
pub mod framing;
pub mod handler;
pub mod pipeline;
pub mod raster;
pub mod salt;

pub use bits::BitSequence;
pub use chunking::PageSize;
pub use error::{Error, FrameError, Result};
pub use pipeline::{
    Content, Options, decode_file, decode_text, encode, encode_to_store, load_pages,
};
pub use raster::{DirectoryStore, MemoryStore, RasterStore};
pub use salt::Salt;
