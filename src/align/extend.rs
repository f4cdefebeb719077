use super::cigar::{EditOp, EditOps};
use crate::error::{Error, Result};

/// 不可达单元的代价。比较越小越好，所以哨兵取一个不会溢出的大正数。
pub const UNREACHABLE: i32 = i32::MAX / 4;

#[inline]
fn add(a: i32, b: i32) -> i32 {
    if a >= UNREACHABLE { UNREACHABLE } else { a.saturating_add(b).min(UNREACHABLE) }
}

/// 带状扩展的代价参数。长度为 L 的 gap 代价为 `gap_open + (L-1) * gap_extend`。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendParams {
    pub mismatch_cost: i32,
    pub gap_open_cost: i32,
    pub gap_extend_cost: i32,
    pub band_width: i32,
}

impl Default for ExtendParams {
    fn default() -> Self {
        Self { mismatch_cost: 2, gap_open_cost: 2, gap_extend_cost: 2, band_width: 10 }
    }
}

impl ExtendParams {
    pub fn validate(&self) -> Result<()> {
        if self.band_width < 0 {
            return Err(Error::InvalidBandWidth(self.band_width as i64));
        }
        for (name, value) in [
            ("mismatch_cost", self.mismatch_cost),
            ("gap_open_cost", self.gap_open_cost),
            ("gap_extend_cost", self.gap_extend_cost),
        ] {
            // 单步代价达到哨兵值会与"不可达"混淆
            if !(0..UNREACHABLE).contains(&value) {
                return Err(Error::InvalidParameter { name, value: value as i64 });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// 比对在参考上的起点（0-based）
    pub ref_start: u32,
    /// 总代价，0 为完全匹配
    pub score: i32,
    pub ops: EditOps,
    /// 编辑距离：错配 + 插入 + 缺失碱基数
    pub nm: u32,
}

/// DP 工作缓冲区，可跨调用复用
#[derive(Debug, Default)]
pub struct BandBuffer {
    h: Vec<i32>,
    e: Vec<i32>,
    f: Vec<i32>,
}

impl BandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn prepare(&mut self, size: usize) {
        for v in [&mut self.h, &mut self.e, &mut self.f] {
            v.clear();
            v.resize(size, UNREACHABLE);
        }
    }
}

/// 把 read 以 `anchor` 为起点全局比对到 `reference[anchor .. anchor + read.len())`。
///
/// 只计算 `|j - i| <= band_width` 的单元。参考窗口越界或带内没有可行路径时
/// 返回 `Ok(None)`，这是常见的正常结果。
pub fn extend(reference: &[u8], read: &[u8], anchor: i64, p: &ExtendParams) -> Result<Option<Extension>> {
    extend_with_buf(reference, read, anchor, p, &mut BandBuffer::new())
}

pub fn extend_with_buf(
    reference: &[u8],
    read: &[u8],
    anchor: i64,
    p: &ExtendParams,
    buf: &mut BandBuffer,
) -> Result<Option<Extension>> {
    p.validate()?;
    let m = read.len();
    if anchor < 0 || anchor as u64 + m as u64 > reference.len() as u64 {
        return Ok(None);
    }
    let start = anchor as usize;
    let window = &reference[start..start + m];

    // 带宽超过 read 长度没有意义
    let w = (p.band_width as usize).min(m);
    let width = 2 * w + 1;
    buf.prepare((m + 1) * width);
    let (h, e, f) = (&mut buf.h, &mut buf.e, &mut buf.f);

    let subst = |i: usize, j: usize| if read[i - 1] == window[j - 1] { 0 } else { p.mismatch_cost };

    // 行 i、对角偏移 d 的单元对应参考列 j = i + d - w
    for i in 0..=m {
        for d in 0..width {
            let Some(j) = (i + d).checked_sub(w) else { continue };
            if j > m {
                break;
            }
            let idx = i * width + d;
            if i == 0 && j == 0 {
                h[idx] = 0;
                continue;
            }
            // 插入：来自 (i-1, j)，即上一行 d+1
            let ev = if i > 0 && d + 1 < width {
                let up = (i - 1) * width + d + 1;
                add(h[up], p.gap_open_cost).min(add(e[up], p.gap_extend_cost))
            } else {
                UNREACHABLE
            };
            // 缺失：来自 (i, j-1)，即本行 d-1
            let fv = if j > 0 && d > 0 {
                let left = idx - 1;
                add(h[left], p.gap_open_cost).min(add(f[left], p.gap_extend_cost))
            } else {
                UNREACHABLE
            };
            let dv = if i > 0 && j > 0 { add(h[(i - 1) * width + d], subst(i, j)) } else { UNREACHABLE };
            e[idx] = ev;
            f[idx] = fv;
            h[idx] = dv.min(ev).min(fv);
        }
    }

    let end = m * width + w;
    let score = h[end];
    if score >= UNREACHABLE {
        return Ok(None);
    }

    // 回溯：对角优先，其次插入，最后缺失；gap 内开启与延伸同分时取开启
    #[derive(Clone, Copy)]
    enum State {
        H,
        E,
        F,
    }
    let mut ops_rev: Vec<EditOp> = Vec::with_capacity(m + w);
    let mut nm = 0u32;
    let (mut i, mut j) = (m, m);
    let mut state = State::H;
    while i > 0 || j > 0 {
        let d = j + w - i;
        let idx = i * width + d;
        match state {
            State::H => {
                if i > 0 && j > 0 && h[idx] == add(h[(i - 1) * width + d], subst(i, j)) {
                    if read[i - 1] != window[j - 1] {
                        nm += 1;
                    }
                    ops_rev.push(EditOp::Match);
                    i -= 1;
                    j -= 1;
                } else if i > 0 && h[idx] == e[idx] {
                    state = State::E;
                } else {
                    state = State::F;
                }
            }
            State::E => {
                let up = (i - 1) * width + d + 1;
                if e[idx] == add(h[up], p.gap_open_cost) {
                    state = State::H;
                }
                ops_rev.push(EditOp::Insertion);
                nm += 1;
                i -= 1;
            }
            State::F => {
                if f[idx] == add(h[idx - 1], p.gap_open_cost) {
                    state = State::H;
                }
                ops_rev.push(EditOp::Deletion);
                nm += 1;
                j -= 1;
            }
        }
    }

    let ops: EditOps = ops_rev.into_iter().rev().collect();
    Ok(Some(Extension { ref_start: start as u32, score, ops, nm }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn params(mismatch: i32, open: i32, ext: i32, band: i32) -> ExtendParams {
        ExtendParams { mismatch_cost: mismatch, gap_open_cost: open, gap_extend_cost: ext, band_width: band }
    }

    /// 不带状的三矩阵全局比对，只求代价
    fn full_global_cost(a: &[u8], b: &[u8], p: &ExtendParams) -> i32 {
        let (m, n) = (a.len(), b.len());
        let inf = UNREACHABLE;
        let mut h = vec![vec![inf; n + 1]; m + 1];
        let mut e = vec![vec![inf; n + 1]; m + 1];
        let mut f = vec![vec![inf; n + 1]; m + 1];
        h[0][0] = 0;
        for i in 0..=m {
            for j in 0..=n {
                if i == 0 && j == 0 {
                    continue;
                }
                if i > 0 {
                    e[i][j] = add(h[i - 1][j], p.gap_open_cost).min(add(e[i - 1][j], p.gap_extend_cost));
                }
                if j > 0 {
                    f[i][j] = add(h[i][j - 1], p.gap_open_cost).min(add(f[i][j - 1], p.gap_extend_cost));
                }
                let diag = if i > 0 && j > 0 {
                    add(h[i - 1][j - 1], if a[i - 1] == b[j - 1] { 0 } else { p.mismatch_cost })
                } else {
                    inf
                };
                h[i][j] = diag.min(e[i][j]).min(f[i][j]);
            }
        }
        h[m][n]
    }

    fn mutate(rng: &mut StdRng, seq: &[u8], edits: usize) -> Vec<u8> {
        let mut out = seq.to_vec();
        for _ in 0..edits {
            let pos = rng.gen_range(0..out.len());
            match rng.gen_range(0..3) {
                0 => out[pos] = b"ACGT"[rng.gen_range(0..4)],
                1 => out.insert(pos, b"ACGT"[rng.gen_range(0..4)]),
                _ => {
                    out.remove(pos);
                }
            }
        }
        // 长度保持与窗口一致
        out.resize(seq.len(), b'A');
        out
    }

    #[test]
    fn perfect_match() {
        let res = extend(b"GATTACA", b"ACA", 4, &params(0, 0, 0, 2)).unwrap().unwrap();
        assert_eq!(res.score, 0);
        assert_eq!(res.ref_start, 4);
        assert_eq!(res.ops.to_string(), "3M");
        assert_eq!(res.nm, 0);
    }

    #[test]
    fn single_mismatch_beats_indel_pair() {
        let res = extend(b"AAAAA", b"AAT", 0, &params(2, 2, 2, 2)).unwrap().unwrap();
        assert_eq!(res.score, 2);
        assert_eq!(res.ops.to_string(), "3M");
        assert_eq!(res.nm, 1);
    }

    #[test]
    fn indel_pair_when_cheaper_than_mismatches() {
        // read 相对窗口左移一位：ACGTACGT vs CGTACGTA
        let p = params(4, 3, 1, 3);
        let res = extend(b"ACGTACGTA", b"CGTACGTA", 0, &p).unwrap().unwrap();
        assert_eq!(res.score, 6);
        assert_eq!(res.ops.to_string(), "1D7M1I");
        assert_eq!(res.ops.read_len(), 8);
        assert_eq!(res.ops.ref_len(), 8);
        assert_eq!(res.nm, 2);
    }

    #[test]
    fn out_of_reference_is_unalignable() {
        let p = params(2, 2, 2, 2);
        assert_eq!(extend(b"AAAAA", b"AAT", 3, &p).unwrap(), None);
        assert_eq!(extend(b"AAAAA", b"AAT", -1, &p).unwrap(), None);
        assert!(extend(b"AAAAA", b"AAT", 2, &p).unwrap().is_some());
    }

    #[test]
    fn zero_band_only_uses_diagonal() {
        let res = extend(b"ACGTACGTA", b"CGTACGTA", 0, &params(4, 3, 1, 0)).unwrap().unwrap();
        assert_eq!(res.ops.to_string(), "8M");
        assert_eq!(res.score, 4 * res.nm as i32);
    }

    #[test]
    fn negative_band_width_is_error() {
        assert_eq!(extend(b"ACGT", b"ACGT", 0, &params(2, 2, 2, -1)), Err(Error::InvalidBandWidth(-1)));
        assert!(matches!(
            extend(b"ACGT", b"ACGT", 0, &params(-2, 2, 2, 1)),
            Err(Error::InvalidParameter { name: "mismatch_cost", .. })
        ));
    }

    #[test]
    fn huge_costs_do_not_overflow() {
        assert_eq!(
            extend(b"GT", b"CA", 0, &params(i32::MAX, 1, 1, 2)),
            Err(Error::InvalidParameter { name: "mismatch_cost", value: i32::MAX as i64 })
        );
        assert!(matches!(
            extend(b"GT", b"CA", 0, &params(1, UNREACHABLE, 1, 2)),
            Err(Error::InvalidParameter { name: "gap_open_cost", .. })
        ));

        // 最大合法代价：两次错配饱和为不可达，只剩纯 gap 路径
        let res = extend(b"GT", b"CA", 0, &params(UNREACHABLE - 1, 1, 1, 2)).unwrap().unwrap();
        assert_eq!(res.score, 4);
        assert!(res.score >= 0);
        assert_eq!(res.ops.read_len(), 2);
        assert_eq!(res.ops.ref_len(), 2);
        assert_eq!(res.nm, 4);
        assert_eq!(add(UNREACHABLE - 1, UNREACHABLE - 1), UNREACHABLE);
    }

    #[test]
    fn empty_read_aligns_trivially() {
        let res = extend(b"ACGT", b"", 2, &params(2, 2, 2, 1)).unwrap().unwrap();
        assert_eq!(res.score, 0);
        assert!(res.ops.is_empty());
    }

    #[test]
    fn tie_prefers_diagonal_then_insertion() {
        // mismatch 代价等于一对 indel 时应选错配
        let res = extend(b"AC", b"AG", 0, &params(4, 2, 2, 1)).unwrap().unwrap();
        assert_eq!(res.score, 4);
        assert_eq!(res.ops.to_string(), "2M");
    }

    #[test]
    fn tie_prefers_insertion_over_deletion() {
        // 末格 h == e == f：先插入后缺失与先缺失后插入同价，回溯取插入
        let p = params(4, 1, 1, 1);
        let res = extend(b"C", b"A", 0, &p).unwrap().unwrap();
        assert_eq!(res.score, 2);
        assert_eq!(res.ops.to_string(), "1D1I");
        assert_eq!(res.nm, 2);
    }

    #[test]
    fn gap_open_extend_tie_keeps_single_runs() {
        // 开启与延伸同价时，两碱基 gap 仍合并为一个 run
        let p = params(10, 1, 1, 2);
        let res = extend(b"CCAAAA", b"AAAAGG", 0, &p).unwrap().unwrap();
        assert_eq!(res.score, 4);
        assert_eq!(res.score, full_global_cost(b"AAAAGG", b"CCAAAA", &p));
        assert_eq!(res.ops.to_string(), "2D4M2I");
        assert_eq!(res.ops.runs().len(), 3);
    }

    #[test]
    fn affine_gap_prefers_one_long_gap() {
        // 两个碱基的缺失 + 两个碱基的插入，开 gap 贵、延伸便宜
        let reference = b"AAAACCGGGGTTTT";
        let read = b"AAAAGGGGTTTTCC";
        let p = params(10, 5, 1, 4);
        let res = extend(reference, read, 0, &p).unwrap().unwrap();
        assert_eq!(res.score, full_global_cost(read, reference, &p));
        assert_eq!(res.score, 12);
        assert_eq!(res.ops.to_string(), "4M2D8M2I");
    }

    #[test]
    fn banded_equals_unbanded_when_band_covers_edits() {
        let mut rng = StdRng::seed_from_u64(2024);
        let p = params(3, 4, 1, 6);
        for _ in 0..200 {
            let len = rng.gen_range(5..60);
            let window: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            let edits = rng.gen_range(0..3);
            let read = mutate(&mut rng, &window, edits);
            let res = extend(&window, &read, 0, &p).unwrap().expect("band covers path");
            assert_eq!(res.score, full_global_cost(&read, &window, &p));
            assert_eq!(res.ops.read_len(), read.len());
            assert_eq!(res.ops.ref_len(), window.len());
        }
    }

    #[test]
    fn traceback_score_is_consistent() {
        let mut rng = StdRng::seed_from_u64(99);
        let p = params(3, 5, 2, 5);
        for _ in 0..100 {
            let len = rng.gen_range(8..40);
            let window: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            let read = mutate(&mut rng, &window, 2);
            let res = extend(&window, &read, 0, &p).unwrap().unwrap();
            // 按操作序列重算代价
            let (mut qi, mut rj, mut cost) = (0usize, 0usize, 0i32);
            for &(op, n) in res.ops.runs() {
                match op {
                    EditOp::Match => {
                        for _ in 0..n {
                            if read[qi] != window[rj] {
                                cost += p.mismatch_cost;
                            }
                            qi += 1;
                            rj += 1;
                        }
                    }
                    EditOp::Insertion => {
                        cost += p.gap_open_cost + (n as i32 - 1) * p.gap_extend_cost;
                        qi += n as usize;
                    }
                    EditOp::Deletion => {
                        cost += p.gap_open_cost + (n as i32 - 1) * p.gap_extend_cost;
                        rj += n as usize;
                    }
                }
            }
            assert_eq!(cost, res.score);
        }
    }

    #[test]
    fn buffer_reuse_gives_same_result() {
        let p = params(2, 3, 1, 4);
        let mut buf = BandBuffer::new();
        let a = extend_with_buf(b"ACGTTGCAACGT", b"ACGTGCAACGTT", 0, &p, &mut buf).unwrap();
        let _ = extend_with_buf(b"AAAA", b"AATA", 0, &p, &mut buf).unwrap();
        let b = extend_with_buf(b"ACGTTGCAACGT", b"ACGTGCAACGTT", 0, &p, &mut buf).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, extend(b"ACGTTGCAACGT", b"ACGTGCAACGTT", 0, &p).unwrap());
    }
}
