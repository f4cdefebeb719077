//! 核心库的错误类型。
//!
//! 只有契约被破坏或配置非法时才会返回错误；"没有种子" 与 "带内无可行路径"
//! 属于正常结果，分别编码在返回值里，不走这里。

use thiserror::Error;

/// 参考序列无法构建索引的原因。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("reference sequence is empty")]
    EmptyReference,
    #[error("reference contains invalid base {base:#04x} at position {position}")]
    InvalidBase { position: usize, base: u8 },
    #[error("reference of {len} bases does not fit a 32-bit index")]
    TooLong { len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("index construction failed: {0}")]
    Construction(#[from] ConstructionError),

    #[error("unknown symbol code {0}")]
    UnknownSymbol(u8),

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("band width must be non-negative, got {0}")]
    InvalidBandWidth(i64),

    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: i64 },

    #[error("corrupt index: {0}")]
    CorruptIndex(String),
}

pub type Result<T> = std::result::Result<T, Error>;
