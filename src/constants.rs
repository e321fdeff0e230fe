/// 每个字节展开后的比特数，同时也是盐值偏移的周期。
pub const BITS_PER_BYTE: usize = 8;

/// 长度帧头的终止符。
/// 帧头为十进制数字加上该字符，终止符不能与数字冲突。
pub const LENGTH_SENTINEL: u8 = b'!';

/// 帧头中长度数字的最大位数。
/// `u64::MAX` 有 20 位十进制数字，超过这个长度的帧头必然是损坏的数据，
/// 因此扫描无需继续读完整个缓冲区。
pub const MAX_LENGTH_DIGITS: usize = 20;

/// 读取图像时判定像素为白色 (比特 1) 的亮度阈值。
pub const LUMA_THRESHOLD: u8 = 128;

/// 多页输出时页面名称与序号之间的分隔符，例如 `secret_0`, `secret_1`。
pub const PAGE_SUFFIX_SEPARATOR: char = '_';

/// 目录存储写出图像时使用的默认文件扩展名。
pub const IMAGE_EXTENSION: &str = "png";

/// 可以用来保存页面的无损图像格式的扩展名。
/// 有损格式会改变像素亮度，保存后的页面无法还原。
pub const LOSSLESS_EXTENSIONS: [&str; 6] = ["png", "bmp", "tif", "tiff", "webp", "qoi"];

/// 解码文本失败时返回的固定提示。
/// 盐值错误与图像损坏无法区分，因此文本解码不会返回错误，而是返回这条信息。
pub const INVALID_SALT_MESSAGE: &str =
    "Invalid salt or corrupted image: the hidden text could not be decoded.";

/// `decode-file` 未指定输出路径时，默认文件名的前缀。
pub const RECOVERED_FILE_PREFIX: &str = "recovered_";
