//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use crate::salt::Salt;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 把文本或文件编码为黑白图像 (每个像素一个比特)，或从这些图像中还原内容。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "把文本或文件编码为黑白图像 (每个像素一个比特)，或从这些图像中还原内容。\n内容放不下一张图像时，会按指定尺寸拆分为 name_0.png, name_1.png, ..."
)]
pub struct Cli {
    /// 输出调试日志 (也可以通过 RUST_LOG 环境变量控制)。
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 把文本文件编码为图像。
    EncodeText(EncodeArgs),

    /// 从图像中还原文本。
    DecodeText(DecodeTextArgs),

    /// 把任意文件编码为图像。
    EncodeFile(EncodeArgs),

    /// 从图像中还原文件。
    DecodeFile(DecodeFileArgs),
}

/// 'encode-text' 与 'encode-file' 共用的参数。
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// 要编码的输入文件路径。
    #[arg(short, long)]
    pub input: PathBuf,

    /// 输出图像路径 (如 out/secret.png)。默认与输入文件同目录、同名的 .png 文件。
    /// 指定页面尺寸时，实际写出 out/secret_0.png, out/secret_1.png, ...
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 盐值：以逗号分隔的比特偏移 (0-7)，如 "1,3,5"。
    #[arg(short, long)]
    pub salt: Option<Salt>,

    /// 每页的宽度 (像素)，必须与 --height 一起使用。
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// 每页的高度 (像素)，必须与 --width 一起使用。
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// 覆盖已经存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode-text' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct DecodeTextArgs {
    /// 图像路径。多页时给出不带序号的路径 (如 out/secret.png) 或任意一页的路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 编码时使用的盐值。
    #[arg(short, long)]
    pub salt: Option<Salt>,

    /// 保存还原文本的路径。不指定时直接输出到终端。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 覆盖已经存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode-file' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct DecodeFileArgs {
    /// 图像路径。多页时给出不带序号的路径 (如 out/secret.png) 或任意一页的路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 编码时使用的盐值。
    #[arg(short, long)]
    pub salt: Option<Salt>,

    /// 保存还原文件的路径。默认为图像所在目录下的 recovered_<名称>.bin。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 覆盖已经存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}
