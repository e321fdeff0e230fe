use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

use bit_raster::{
    cli::{Cli, Commands},
    handler::{handle_decode_file, handle_decode_text, handle_encode_file, handle_encode_text},
};

/// 初始化日志：默认只输出警告，`--verbose` 时输出调试信息，`RUST_LOG` 优先级最高。
fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    Builder::new()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// 程序的主入口点
///
/// 负责解析命令行参数，并根据指定的子命令将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();
    init_logger(cli.verbose);

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::EncodeText(args) => handle_encode_text(args),
        Commands::DecodeText(args) => handle_decode_text(args),
        Commands::EncodeFile(args) => handle_encode_file(args),
        Commands::DecodeFile(args) => handle_decode_file(args),
    }
}
