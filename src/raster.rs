//! # 图像读写模块
//!
//! 负责比特序列与单色图像之间的转换，以及图像的持久化。
//!
//! - 比特位置 `y * width + x` 对应像素 `(x, y)`。
//! - 比特 1 渲染为不透明白色，比特 0 渲染为不透明黑色；
//!   超出序列长度的像素一律为黑色。
//! - 读取时按亮度阈值判定像素，并把结果截断到 8 的倍数。
//!
//! 多页输出的命名规则为 `name_0`, `name_1`, ...，加载时按数字后缀排序。

use crate::bits::BitSequence;
use crate::chunking::{PageSize, page_capacity};
use crate::constants::{IMAGE_EXTENSION, LUMA_THRESHOLD, PAGE_SUFFIX_SEPARATOR};
use crate::error::{Error, Result};
use image::error::{
    ImageError, ImageFormatHint, UnsupportedError, UnsupportedErrorKind,
};
use image::{ImageFormat, Pixel, Rgba, RgbaImage};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 把 `bits` 渲染为一张 `page` 尺寸的单色图像。
pub fn render_monochrome(bits: &BitSequence, page: &PageSize) -> RgbaImage {
    let width = page.width();
    RgbaImage::from_fn(width, page.height(), |x, y| {
        let index = y as usize * width as usize + x as usize;
        if bits.get(index).unwrap_or(false) {
            WHITE
        } else {
            BLACK
        }
    })
}

/// 按行优先顺序读出所有像素，丢弃末尾不足一个字节的部分。
pub fn read_monochrome(raster: &RgbaImage) -> BitSequence {
    let capacity = page_capacity(raster.width() as usize * raster.height() as usize);
    raster
        .pixels()
        .take(capacity)
        .map(|pixel| pixel.to_luma()[0] >= LUMA_THRESHOLD)
        .collect()
}

/// 第 `index` 页的名称，例如 `secret_3`。
pub fn page_name(base: &str, index: usize) -> String {
    format!("{}{}{}", base, PAGE_SUFFIX_SEPARATOR, index)
}

/// 如果 `name` 是 `base` 的某一页，返回它的序号。
pub fn page_index(base: &str, name: &str) -> Option<usize> {
    let suffix = name
        .strip_prefix(base)?
        .strip_prefix(PAGE_SUFFIX_SEPARATOR)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// 从一组名称中挑出 `base` 的所有页面，并按序号升序排列。
pub fn order_pages<I, S>(base: &str, names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut pages: Vec<(usize, String)> = names
        .into_iter()
        .map(Into::<String>::into)
        .filter_map(|name| page_index(base, &name).map(|index| (index, name)))
        .collect();
    pages.sort_by_key(|(index, _)| *index);
    pages.into_iter().map(|(_, name)| name).collect()
}

/// 图像的持久化后端。
///
/// 名称是不透明的字符串，由实现决定如何映射到实际资源。
pub trait RasterStore {
    /// 以 `name` 保存一张图像，已存在的同名图像会被覆盖。
    fn persist(&self, raster: &RgbaImage, name: &str) -> Result<()>;

    /// 读取名为 `name` 的图像。
    ///
    /// # Errors
    ///
    /// 不存在时返回 `Error::ResourceNotFound`。
    fn load(&self, name: &str) -> Result<RgbaImage>;

    /// 列出所有已保存图像的名称 (顺序不限)。
    fn names(&self) -> Result<Vec<String>>;

    /// 找出 `base` 对应的页面集合。
    ///
    /// 如果存在名为 `base` 的单张图像，只返回它；
    /// 否则返回所有 `base_<n>`，按 `n` 升序排列。
    fn discover(&self, base: &str) -> Result<Vec<String>> {
        let names = self.names()?;
        if names.iter().any(|name| name == base) {
            return Ok(vec![base.to_string()]);
        }

        let pages = order_pages(base, names);
        if pages.is_empty() {
            return Err(Error::ResourceNotFound(format!(
                "no image or page set named '{}'",
                base
            )));
        }
        debug!("discovered {} page(s) for '{}': {:?}", pages.len(), base, pages);
        Ok(pages)
    }
}

/// 把图像以文件形式保存在一个目录下，名称即文件名 (不含扩展名)。
///
/// 默认使用 PNG；图像格式由扩展名决定，只有同一扩展名的文件才属于这个存储。
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    extension: String,
}

impl DirectoryStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            extension: IMAGE_EXTENSION.to_string(),
        }
    }

    /// 改用 `extension` (如 `bmp`) 对应的图像格式读写。
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// 名称对应的文件路径。
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, self.extension))
    }
}

impl RasterStore for DirectoryStore {
    fn persist(&self, raster: &RgbaImage, name: &str) -> Result<()> {
        let path = self.path_for(name);
        let format = ImageFormat::from_extension(&self.extension).ok_or_else(|| {
            ImageError::Unsupported(UnsupportedError::from_format_and_kind(
                ImageFormatHint::PathExtension(path.clone()),
                UnsupportedErrorKind::Format(ImageFormatHint::PathExtension(path.clone())),
            ))
        })?;
        raster.save_with_format(&path, format)?;
        debug!("wrote {}", path.display());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<RgbaImage> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(Error::ResourceNotFound(path.display().to_string()));
        }
        Ok(image::open(&path)?.to_rgba8())
    }

    fn names(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(Error::ResourceNotFound(self.root.display().to_string()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
            if !is_image {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }
}

/// 在内存中保存图像，适合测试或把结果交给调用方自行处理。
#[derive(Debug, Default)]
pub struct MemoryStore {
    rasters: Mutex<HashMap<String, RgbaImage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// 删除一张图像，返回它是否存在。
    pub fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.lock()?.remove(name).is_some())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, RgbaImage>>> {
        self.rasters
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("memory store lock poisoned")))
    }
}

impl RasterStore for MemoryStore {
    fn persist(&self, raster: &RgbaImage, name: &str) -> Result<()> {
        self.lock()?.insert(name.to_string(), raster.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<RgbaImage> {
        self.lock()?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ResourceNotFound(name.to_string()))
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
