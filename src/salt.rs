//! # 盐值变换模块
//!
//! 在固定的模 8 偏移处翻转比特。这是一种可逆的混淆手段，而不是加密：
//! 对同一序列应用两次相同的盐值会得到原序列。

use crate::bits::BitSequence;
use crate::constants::BITS_PER_BYTE;
use std::fmt;
use std::str::FromStr;

/// 一组比特偏移。编码与解码必须使用完全相同的集合。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Salt {
    offsets: Vec<usize>,
}

impl Salt {
    /// 去重并排序后保存偏移。
    ///
    /// 偏移应位于 `0..=7`；更大的值不会被拒绝，但翻转的位置将与字节周期不一致。
    pub fn new<I: IntoIterator<Item = usize>>(offsets: I) -> Self {
        let mut offsets: Vec<usize> = offsets.into_iter().collect();
        offsets.sort_unstable();
        offsets.dedup();
        Self { offsets }
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// 对每个偏移 `o`，翻转 `o, o+8, o+16, ...` 处的比特。
    /// 加盐和去盐是同一个操作。
    pub fn apply_in_place(&self, bits: &mut BitSequence) {
        for &offset in &self.offsets {
            for index in (offset..bits.len()).step_by(BITS_PER_BYTE) {
                bits.flip(index);
            }
        }
    }

    /// `apply_in_place` 的纯函数版本，返回新的序列。
    pub fn apply(&self, bits: &BitSequence) -> BitSequence {
        let mut salted = bits.clone();
        self.apply_in_place(&mut salted);
        salted
    }
}

/// 输出为逗号分隔的偏移列表，例如 `1,3,5`。
impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<String> = self.offsets.iter().map(usize::to_string).collect();
        f.write_str(&text.join(","))
    }
}

/// 解析盐值文本时的错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaltParseError {
    #[error("salt offset {0:?} is not a number")]
    NotANumber(String),

    #[error("salt offset {0} is out of range, offsets must be between 0 and 7")]
    OutOfRange(usize),
}

/// 从 `"0,3,5"` 这样的文本解析盐值，空白会被忽略，空文本得到空盐值。
impl FromStr for Salt {
    type Err = SaltParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let offsets = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let offset: usize = part
                    .parse()
                    .map_err(|_| SaltParseError::NotANumber(part.to_string()))?;
                if offset >= BITS_PER_BYTE {
                    return Err(SaltParseError::OutOfRange(offset));
                }
                Ok(offset)
            })
            .collect::<Result<Vec<usize>, SaltParseError>>()?;

        Ok(Salt::new(offsets))
    }
}
