//! 单条 read 的比对流程：`NoSeed → SeedsFound → Extended → BestSelected`。
//!
//! 每个状态只持有本 read 的数据，中途丢弃不会留下任何副作用。

use tracing::trace;

use super::cigar::EditOps;
use super::extend::{extend_with_buf, BandBuffer, ExtendParams, Extension};
use super::seed::{generate_seeds, seed_positions, SeedParams};
use crate::error::Result;
use crate::index::FMIndex;
use crate::util::dna;

pub const MAX_MAPQ: u8 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub ref_start: u32,
    pub score: i32,
    pub ops: EditOps,
    pub nm: u32,
    pub mapq: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadAlignment {
    Unaligned,
    Aligned(Alignment),
}

impl ReadAlignment {
    pub fn is_aligned(&self) -> bool {
        matches!(self, ReadAlignment::Aligned(_))
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        match self {
            ReadAlignment::Aligned(a) => Some(a),
            ReadAlignment::Unaligned => None,
        }
    }
}

/// 候选锚点及其扩展结果；`extension == None` 表示带内无可行路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub anchor: i64,
    pub extension: Option<Extension>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyState {
    /// 没有任何窗口精确命中，终态
    NoSeed,
    /// 去重后按升序排列的候选锚点（参考坐标，可能为负）
    SeedsFound { anchors: Vec<i64> },
    Extended { candidates: Vec<Candidate> },
    /// 终态
    BestSelected(ReadAlignment),
}

impl AssemblyState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssemblyState::NoSeed | AssemblyState::BestSelected(_))
    }
}

/// 持有共享索引引用和本线程的 DP 缓冲区。
pub struct ReadAligner<'a> {
    fm: &'a FMIndex,
    seed: SeedParams,
    extend: ExtendParams,
    buf: BandBuffer,
}

impl<'a> ReadAligner<'a> {
    pub fn new(fm: &'a FMIndex, seed: SeedParams, extend: ExtendParams) -> Result<Self> {
        seed.validate()?;
        extend.validate()?;
        Ok(Self { fm, seed, extend, buf: BandBuffer::new() })
    }

    /// 初始状态：生成种子并换算成候选锚点。
    pub fn start(&self, read: &[u8]) -> Result<AssemblyState> {
        let symbols = dna::encode_read(read);
        let seeds = generate_seeds(self.fm, &symbols, &self.seed)?;
        let mut anchors = Vec::new();
        for s in &seeds {
            for pos in seed_positions(self.fm, s)? {
                anchors.push(pos as i64 - s.read_offset as i64);
            }
        }
        if anchors.is_empty() {
            return Ok(AssemblyState::NoSeed);
        }
        anchors.sort_unstable();
        anchors.dedup();
        trace!(seeds = seeds.len(), anchors = anchors.len(), "seeds found");
        Ok(AssemblyState::SeedsFound { anchors })
    }

    /// 推进一步；终态原样返回。
    pub fn step(&mut self, state: AssemblyState, read: &[u8]) -> Result<AssemblyState> {
        match state {
            AssemblyState::SeedsFound { anchors } => {
                let norm = dna::normalize_seq(read);
                let mut candidates = Vec::with_capacity(anchors.len());
                for anchor in anchors {
                    let extension = extend_with_buf(&self.fm.reference, &norm, anchor, &self.extend, &mut self.buf)?;
                    candidates.push(Candidate { anchor, extension });
                }
                Ok(AssemblyState::Extended { candidates })
            }
            AssemblyState::Extended { candidates } => {
                Ok(AssemblyState::BestSelected(self.select_best(candidates, read.len())))
            }
            terminal => Ok(terminal),
        }
    }

    pub fn align(&mut self, read: &[u8]) -> Result<ReadAlignment> {
        let mut state = self.start(read)?;
        while !state.is_terminal() {
            state = self.step(state, read)?;
        }
        Ok(match state {
            AssemblyState::BestSelected(result) => result,
            _ => ReadAlignment::Unaligned,
        })
    }

    /// 代价最低者胜出，同分取参考坐标最小者（候选已按锚点升序）。
    fn select_best(&self, candidates: Vec<Candidate>, read_len: usize) -> ReadAlignment {
        let mut best: Option<(i64, Extension)> = None;
        for c in &candidates {
            let Some(ext) = &c.extension else { continue };
            let better = match &best {
                None => true,
                Some((_, b)) => ext.score < b.score || (ext.score == b.score && ext.ref_start < b.ref_start),
            };
            if better {
                best = Some((c.anchor, ext.clone()));
            }
        }
        let Some((best_anchor, ext)) = best else { return ReadAlignment::Unaligned };

        // 与最优锚点相距不足一个带宽的候选视作同一位点
        let band = self.extend.band_width as i64;
        let runner_up = candidates
            .iter()
            .filter(|c| (c.anchor - best_anchor).abs() > band)
            .filter_map(|c| c.extension.as_ref().map(|e| e.score))
            .min();
        let mapq = mapping_quality(ext.score, runner_up, read_len, self.extend.mismatch_cost);
        ReadAlignment::Aligned(Alignment { ref_start: ext.ref_start, score: ext.score, ops: ext.ops, nm: ext.nm, mapq })
    }
}

/// 映射质量。`runner_up` 只统计锚点与最优锚点相距超过带宽的候选（带宽内的视作
/// 同一位点）；它与最优同分时记 0，否则按代价占最坏错配代价的比例换算 phred，封顶 60。
pub fn mapping_quality(best: i32, runner_up: Option<i32>, read_len: usize, mismatch_cost: i32) -> u8 {
    if runner_up == Some(best) {
        return 0;
    }
    if best <= 0 {
        return MAX_MAPQ;
    }
    let worst = read_len as f64 * mismatch_cost as f64;
    if worst <= 0.0 {
        return 0;
    }
    let q = -10.0 * (best as f64 / worst).log10();
    q.round().clamp(0.0, MAX_MAPQ as f64) as u8
}
