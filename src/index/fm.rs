use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::bwt::build_transform;
use super::rank::RankIndex;
use super::sa::SampledSuffixArray;
use crate::error::{Error, Result};
use crate::util::dna::{self, Symbol};

/// 索引文件格式版本，结构变化时递增
pub const FORMAT_VERSION: u32 = 1;

/// 索引构建参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParams {
    /// 后缀数组采样间隔 K
    pub sample_interval: u32,
    /// rank 检查点间隔 C
    pub checkpoint_interval: u32,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self { sample_interval: 5, checkpoint_interval: 5 }
    }
}

impl IndexParams {
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval == 0 {
            return Err(Error::InvalidParameter { name: "sample_interval", value: 0 });
        }
        if self.checkpoint_interval == 0 {
            return Err(Error::InvalidParameter { name: "checkpoint_interval", value: 0 });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub reference_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// SA 行区间 `[lo, hi)`，构造时保证非空。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaInterval {
    lo: usize,
    hi: usize,
}

impl SaInterval {
    #[inline]
    pub fn new(lo: usize, hi: usize) -> Option<Self> {
        (lo < hi).then_some(Self { lo, hi })
    }

    #[inline]
    pub fn lo(&self) -> usize {
        self.lo
    }

    #[inline]
    pub fn hi(&self) -> usize {
        self.hi
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.hi - self.lo
    }

    pub fn rows(&self) -> std::ops::Range<usize> {
        self.lo..self.hi
    }
}

/// 单条参考序列上的 FM 索引。
///
/// 构建完成后只读，可以 `&FMIndex` 的形式在线程间共享。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FMIndex {
    pub format_version: u32,
    pub params: IndexParams,
    pub reference_name: String,
    /// 规范化后的参考序列（大写 ASCII，不含哨兵）
    pub reference: Vec<u8>,
    pub rank: RankIndex,
    pub sampled_sa: SampledSuffixArray,
    pub meta: IndexMeta,
}

impl FMIndex {
    pub fn build(reference_name: &str, reference: &[u8], params: IndexParams) -> Result<Self> {
        params.validate()?;
        let start = Instant::now();
        let transform = build_transform(reference, params.sample_interval)?;
        let rank = RankIndex::build(&transform.bwt, params.checkpoint_interval)?;
        info!(
            reference = reference_name,
            len = reference.len(),
            samples = transform.sampled_sa.num_samples(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "FM index built"
        );
        Ok(Self {
            format_version: FORMAT_VERSION,
            params,
            reference_name: reference_name.to_string(),
            reference: dna::normalize_seq(reference),
            rank,
            sampled_sa: transform.sampled_sa,
            meta: IndexMeta::default(),
        })
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }

    /// 文本长度（含哨兵），即 BWT 行数
    #[inline]
    pub fn text_len(&self) -> usize {
        self.rank.len()
    }

    #[inline]
    pub fn full_interval(&self) -> SaInterval {
        SaInterval { lo: 0, hi: self.text_len() }
    }

    /// 用字母 c 向左扩展区间；结果为空时返回 None。
    #[inline]
    pub fn extend_left(&self, iv: SaInterval, c: Symbol) -> Result<Option<SaInterval>> {
        let c0 = self.rank.first_occurrence(c) as usize;
        let lo = c0 + self.rank.rank(c, iv.lo)? as usize;
        let hi = c0 + self.rank.rank(c, iv.hi)? as usize;
        Ok(SaInterval::new(lo, hi))
    }

    /// 反向搜索精确匹配。`Ok(None)` 表示模式在参考中不出现。
    pub fn backward_search(&self, pat: &[Symbol]) -> Result<Option<SaInterval>> {
        let mut iv = self.full_interval();
        for &c in pat.iter().rev() {
            match self.extend_left(iv, c)? {
                Some(next) => iv = next,
                None => return Ok(None),
            }
        }
        Ok(Some(iv))
    }

    /// 行号 → 参考偏移。未采样的行沿 LF 向左走，最多 K 步必遇采样行。
    pub fn locate(&self, row: usize) -> Result<u32> {
        let n = self.text_len();
        if row >= n {
            return Err(Error::IndexOutOfRange { index: row, len: n });
        }
        let k = self.sampled_sa.interval();
        let mut cur = row;
        for steps in 0..=k {
            if let Some(off) = self.sampled_sa.get(cur) {
                return Ok(((off as u64 + steps as u64) % n as u64) as u32);
            }
            cur = self.rank.lf(cur)?;
        }
        Err(Error::CorruptIndex(format!("no sampled row within {} LF steps of row {}", k, row)))
    }

    pub fn locate_interval(&self, iv: SaInterval) -> Result<Vec<u32>> {
        iv.rows().map(|row| self.locate(row)).collect()
    }

    /// 精确查找所有出现位置（升序）。
    pub fn find(&self, pat: &[Symbol]) -> Result<Vec<u32>> {
        let mut positions = match self.backward_search(pat)? {
            Some(iv) => self.locate_interval(iv)?,
            None => Vec::new(),
        };
        positions.sort_unstable();
        Ok(positions)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let f = std::fs::File::create(path)
            .with_context(|| format!("cannot create index file '{}'", path.display()))?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)
            .with_context(|| format!("cannot write index file '{}'", path.display()))?;
        // drop 时的 flush 会吞掉错误
        w.flush().with_context(|| format!("cannot write index file '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("cannot open index file '{}'", path.display()))?;
        let idx: Self = bincode::deserialize_from(std::io::BufReader::new(f))
            .with_context(|| format!("cannot decode index file '{}'", path.display()))?;
        if idx.format_version != FORMAT_VERSION {
            anyhow::bail!(
                "index '{}' has format version {}, expected {}",
                path.display(),
                idx.format_version,
                FORMAT_VERSION
            );
        }
        idx.check_consistency()?;
        Ok(idx)
    }

    fn check_consistency(&self) -> Result<()> {
        self.rank.check_consistency()?;
        self.sampled_sa.check_consistency()?;
        if self.rank.len() != self.reference.len() + 1 || self.sampled_sa.len() != self.rank.len() {
            return Err(Error::CorruptIndex("reference, BWT and suffix array lengths disagree".into()));
        }
        Ok(())
    }
}
