use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::dna::Symbol;

/// 构建后缀数组（倍增法，每轮一次比较排序，O(n log² n)）。
/// 输入须以唯一的哨兵 `$` 结尾，此时后缀序与轮转序一致。
pub fn build_sa(text: &[Symbol]) -> Vec<u32> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    let mut sa: Vec<u32> = (0..n as u32).collect();
    let mut rank: Vec<u32> = text.iter().map(|s| s.code() as u32).collect();
    let mut next = vec![0u32; n];

    // 越过文本末尾的后缀视作最小，用 0 表示，真实秩整体 +1
    let key = |rank: &[u32], i: usize, k: usize| -> (u32, u32) {
        let second = if i + k < n { rank[i + k] + 1 } else { 0 };
        (rank[i], second)
    };

    let mut k = 1usize;
    loop {
        sa.sort_unstable_by_key(|&i| key(&rank, i as usize, k));

        next[sa[0] as usize] = 0;
        for w in 1..n {
            let (a, b) = (sa[w - 1] as usize, sa[w] as usize);
            let bump = u32::from(key(&rank, a, k) != key(&rank, b, k));
            next[b] = next[a] + bump;
        }
        std::mem::swap(&mut rank, &mut next);

        if rank[sa[n - 1] as usize] as usize == n - 1 || k >= n {
            break;
        }
        k <<= 1;
    }
    sa
}

/// 采样后缀数组：只保存文本偏移为 K 倍数的行，外加第 0 行。
///
/// 行号用位图标记，`block_ranks[w]` 记录前 w 个 64 位字中置位总数，
/// 于是 "第 row 行是第几个采样" 是一次 popcount，值按行序紧凑存放。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledSuffixArray {
    interval: u32,
    len: u32,
    marks: Vec<u64>,
    block_ranks: Vec<u32>,
    values: Vec<u32>,
}

impl SampledSuffixArray {
    pub fn from_full(sa: &[u32], interval: u32) -> Result<Self> {
        if interval == 0 {
            return Err(Error::InvalidParameter { name: "sample_interval", value: 0 });
        }
        let n = sa.len();
        let words = (n + 63) / 64;
        let mut marks = vec![0u64; words];
        let mut values = Vec::with_capacity(n / interval as usize + 2);
        for (row, &off) in sa.iter().enumerate() {
            if row == 0 || off % interval == 0 {
                marks[row / 64] |= 1u64 << (row % 64);
                values.push(off);
            }
        }
        let mut block_ranks = Vec::with_capacity(words);
        let mut acc = 0u32;
        for w in &marks {
            block_ranks.push(acc);
            acc += w.count_ones();
        }
        Ok(Self { interval, len: n as u32, marks, block_ranks, values })
    }

    #[inline]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_samples(&self) -> usize {
        self.values.len()
    }

    /// 该行若被采样则返回其文本偏移。
    #[inline]
    pub fn get(&self, row: usize) -> Option<u32> {
        if row >= self.len as usize {
            return None;
        }
        let (w, bit) = (row / 64, row % 64);
        let word = self.marks[w];
        if word & (1u64 << bit) == 0 {
            return None;
        }
        let below = (word & ((1u64 << bit) - 1)).count_ones();
        let slot = self.block_ranks[w] + below;
        self.values.get(slot as usize).copied()
    }

    /// 反序列化得到的结构需要自检，防止 get() 越界读到错误偏移。
    pub(crate) fn check_consistency(&self) -> Result<()> {
        let words = (self.len as usize + 63) / 64;
        let total: u32 = self.marks.iter().map(|w| w.count_ones()).sum();
        if self.interval == 0
            || self.marks.len() != words
            || self.block_ranks.len() != words
            || total as usize != self.values.len()
        {
            return Err(Error::CorruptIndex("sampled suffix array is inconsistent".into()));
        }
        Ok(())
    }
}
