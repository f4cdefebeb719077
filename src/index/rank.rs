use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::dna::{Symbol, SIGMA};

/// BWT 上的 rank 结构：首次出现表 + 定长间隔的累计计数检查点。
///
/// 第 j 个检查点记录 `bwt[0 .. j*C)` 中每个字母的出现次数，
/// 行优先展平：`checkpoints[j * SIGMA + c]`。共 `len / C + 1` 个检查点，
/// 因此 `i == len` 也能直接查到。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankIndex {
    interval: u32,
    /// `first[c]` = BWT 中字母序严格小于 c 的符号总数
    first: [u32; SIGMA],
    checkpoints: Vec<u32>,
    /// BWT，按字母编码存放
    bwt: Vec<u8>,
}

impl RankIndex {
    pub fn build(bwt: &[Symbol], interval: u32) -> Result<Self> {
        if interval == 0 {
            return Err(Error::InvalidParameter { name: "checkpoint_interval", value: 0 });
        }
        let c = interval as usize;
        let n = bwt.len();
        let codes: Vec<u8> = bwt.iter().map(|s| s.code()).collect();

        let num_checkpoints = n / c + 1;
        let mut checkpoints = Vec::with_capacity(num_checkpoints * SIGMA);
        let mut running = [0u32; SIGMA];
        for (i, &code) in codes.iter().enumerate() {
            if i % c == 0 {
                checkpoints.extend_from_slice(&running);
            }
            running[code as usize] += 1;
        }
        if n % c == 0 {
            checkpoints.extend_from_slice(&running);
        }
        debug_assert_eq!(checkpoints.len(), num_checkpoints * SIGMA);

        let mut first = [0u32; SIGMA];
        let mut acc = 0u32;
        for (slot, count) in first.iter_mut().zip(running) {
            *slot = acc;
            acc += count;
        }

        Ok(Self { interval, first, checkpoints, bwt: codes })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bwt.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bwt.is_empty()
    }

    #[inline]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    #[inline]
    pub fn first_occurrence(&self, s: Symbol) -> u32 {
        self.first[s.code() as usize]
    }

    pub fn first_occurrence_table(&self) -> &[u32; SIGMA] {
        &self.first
    }

    pub fn checkpoints(&self) -> &[u32] {
        &self.checkpoints
    }

    #[inline]
    pub fn symbol_at(&self, row: usize) -> Result<Symbol> {
        let code = *self.bwt.get(row).ok_or(Error::IndexOutOfRange { index: row, len: self.bwt.len() })?;
        Symbol::from_code(code)
    }

    /// 返回 `bwt[0..i)` 中 s 的出现次数，`i` 取值范围 `[0, len]`。
    #[inline]
    pub fn rank(&self, s: Symbol, i: usize) -> Result<u32> {
        let n = self.bwt.len();
        if i > n {
            return Err(Error::IndexOutOfRange { index: i, len: n });
        }
        let c = self.interval as usize;
        let cp = i / c;
        let code = s.code();
        let base = self.checkpoints[cp * SIGMA + code as usize];
        let extra = self.bwt[cp * c..i].iter().filter(|&&b| b == code).count() as u32;
        Ok(base + extra)
    }

    /// 以原始编码查询，用于外部传入未经校验的符号。
    pub fn rank_code(&self, code: u8, i: usize) -> Result<u32> {
        self.rank(Symbol::from_code(code)?, i)
    }

    /// LF 映射：第 row 行左移一个字符后所在的行。
    #[inline]
    pub fn lf(&self, row: usize) -> Result<usize> {
        let s = self.symbol_at(row)?;
        Ok((self.first_occurrence(s) + self.rank(s, row)?) as usize)
    }

    pub(crate) fn check_consistency(&self) -> Result<()> {
        let c = self.interval as usize;
        if c == 0
            || self.checkpoints.len() != (self.bwt.len() / c + 1) * SIGMA
            || self.bwt.iter().any(|&b| b as usize >= SIGMA)
        {
            return Err(Error::CorruptIndex("rank checkpoints do not match BWT".into()));
        }
        Ok(())
    }
}
