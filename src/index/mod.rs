//! FM 索引：后缀数组 → BWT + 采样 SA → rank 检查点 → 反向搜索 / 定位。

pub mod sa;
pub mod bwt;
pub mod rank;
pub mod fm;

pub use fm::{FMIndex, IndexMeta, IndexParams, SaInterval};
