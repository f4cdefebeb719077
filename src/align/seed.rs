use crate::error::{Error, Result};
use crate::index::{FMIndex, SaInterval};
use crate::util::dna::Symbol;

/// 种子：read 上 `[read_offset, read_offset + len)` 在参考中的精确匹配区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed {
    pub read_offset: usize,
    pub len: usize,
    pub interval: SaInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedParams {
    /// 窗口长度 L
    pub seed_length: usize,
    /// 相邻窗口起点间距；等于 L 时窗口互不重叠
    pub stride: usize,
    /// SA 区间宽于此值的种子视作重复序列丢弃，0 表示不限
    pub max_occurrences: usize,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self { seed_length: 19, stride: 19, max_occurrences: 0 }
    }
}

impl SeedParams {
    pub fn validate(&self) -> Result<()> {
        if self.seed_length == 0 {
            return Err(Error::InvalidParameter { name: "seed_length", value: 0 });
        }
        if self.stride == 0 {
            return Err(Error::InvalidParameter { name: "seed_stride", value: 0 });
        }
        Ok(())
    }
}

/// 对 read 的每个窗口做反向搜索，保留有精确匹配的窗口。
///
/// 没有任何窗口命中时返回空集合，调用方按未比对处理。
pub fn generate_seeds(fm: &FMIndex, read: &[Symbol], p: &SeedParams) -> Result<Vec<Seed>> {
    p.validate()?;
    let l = p.seed_length;
    let mut seeds = Vec::new();
    if read.len() < l {
        return Ok(seeds);
    }
    for read_offset in (0..=read.len() - l).step_by(p.stride) {
        let window = &read[read_offset..read_offset + l];
        let Some(interval) = fm.backward_search(window)? else { continue };
        if p.max_occurrences > 0 && interval.width() > p.max_occurrences {
            continue;
        }
        seeds.push(Seed { read_offset, len: l, interval });
    }
    Ok(seeds)
}

/// 种子区间内每一行对应的参考偏移，按行序返回。
pub fn seed_positions(fm: &FMIndex, seed: &Seed) -> Result<Vec<u32>> {
    fm.locate_interval(seed.interval)
}
